//! # Headers
//!
//! Ordered header multidict: lookups ignore ASCII case, a key may hold
//! several values, and `set` appends instead of replacing.

use hyper::body::Bytes;

/// Ordered, case-insensitive header multidict
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    list: Vec<(String, String)>,
}

impl Headers {
    /// Create an empty header list
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a header; existing values for the key are kept
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.list.push((key.into(), value.into()));
    }

    /// First value for `key`
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.list
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// Every value for `key`, in insertion order
    #[must_use]
    pub fn get_all(&self, key: &str) -> Vec<&str> {
        self.list
            .iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// Whether any value exists for `key`
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.list.iter().any(|(k, _)| k.eq_ignore_ascii_case(key))
    }

    /// Keys in insertion order, repeated keys included
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.list.iter().map(|(k, _)| k.as_str())
    }

    /// Values in insertion order
    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.list.iter().map(|(_, v)| v.as_str())
    }

    /// (key, value) pairs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.list.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.list.len()
    }

    /// True when no header is set
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// Render as raw byte pairs for the wire
    #[must_use]
    pub fn to_raw(&self) -> Vec<(Bytes, Bytes)> {
        self.list
            .iter()
            .map(|(k, v)| (Bytes::from(k.clone()), Bytes::from(v.clone())))
            .collect()
    }

    /// Build from raw byte pairs, replacing invalid UTF-8
    #[must_use]
    pub fn from_raw(raw: &[(Bytes, Bytes)]) -> Self {
        raw.iter()
            .map(|(k, v)| {
                (
                    String::from_utf8_lossy(k).into_owned(),
                    String::from_utf8_lossy(v).into_owned(),
                )
            })
            .collect()
    }
}

impl FromIterator<(String, String)> for Headers {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            list: iter.into_iter().collect(),
        }
    }
}

impl From<Vec<(String, String)>> for Headers {
    fn from(list: Vec<(String, String)>) -> Self {
        Self { list }
    }
}
