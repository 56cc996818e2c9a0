//! # Path Patterns
//!
//! Compiles route templates such as `/users/{id}/posts/{post_id}` into
//! anchored regular expressions.
//!
//! A placeholder is `{` + identifier + `}`, the identifier being
//! `[A-Za-z_][A-Za-z0-9_]*`. Each placeholder matches one or more characters
//! from `[A-Za-z0-9_]`, so values with slashes, dots or hyphens never match.
//! Everything else in the template is matched literally.
//!
//! Patterns test the path only. The HTTP method is compared by the router.

use crate::error::{Error, Result};
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

/// Character class a placeholder value is drawn from
const SEGMENT_CLASS: &str = "([A-Za-z0-9_]+)";

fn placeholder_regex() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| {
        Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("placeholder regex is valid")
    })
}

/// Extract placeholder names from a template, left to right
///
/// Duplicates are kept: `/{a}/{a}` yields `["a", "a"]`.
#[must_use]
pub fn extract_param_names(template: &str) -> Vec<String> {
    placeholder_regex()
        .captures_iter(template)
        .map(|caps| caps[1].to_string())
        .collect()
}

/// Compiled matcher for one path template
#[derive(Clone)]
pub struct PathPattern {
    template: String,
    names: Vec<String>,
    regex: Regex,
}

impl PathPattern {
    /// Compile a template into a matcher
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidRoutePattern` if the resulting expression cannot
    /// be built (in practice only for absurdly large templates).
    pub fn compile(template: &str) -> Result<Self> {
        let mut source = String::with_capacity(template.len() + 16);
        source.push('^');

        let mut names = Vec::new();
        let mut last = 0;
        for caps in placeholder_regex().captures_iter(template) {
            let whole = caps.get(0).expect("group 0 is always present");
            source.push_str(&regex::escape(&template[last..whole.start()]));
            source.push_str(SEGMENT_CLASS);
            names.push(caps[1].to_string());
            last = whole.end();
        }
        source.push_str(&regex::escape(&template[last..]));
        source.push('$');

        let regex = Regex::new(&source).map_err(|e| Error::InvalidRoutePattern {
            pattern: template.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            template: template.to_string(),
            names,
            regex,
        })
    }

    /// The template this pattern was compiled from
    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Placeholder names in template order
    #[must_use]
    pub fn param_names(&self) -> &[String] {
        &self.names
    }

    /// Test a request path, returning the captured parameters on success
    #[must_use]
    pub fn captures(&self, path: &str) -> Option<PathParams> {
        let caps = self.regex.captures(path)?;
        let entries = self
            .names
            .iter()
            .zip(caps.iter().skip(1))
            .filter_map(|(name, value)| value.map(|v| (name.clone(), v.as_str().to_string())))
            .collect();
        Some(PathParams { entries })
    }

    /// Whether the path matches, without building captures
    #[must_use]
    pub fn is_match(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }
}

impl fmt::Debug for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PathPattern")
            .field("template", &self.template)
            .field("regex", &self.regex.as_str())
            .finish()
    }
}

/// Captured path parameters, in template order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams {
    entries: Vec<(String, String)>,
}

impl PathParams {
    /// Look up a capture by name
    ///
    /// When a name occurs more than once in the template the last capture wins.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Iterate over (name, value) pairs in template order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of captures
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the template had no placeholders
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
