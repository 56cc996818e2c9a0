//! # Handler Signatures
//!
//! A [`Signature`] is the explicit parameter schema a handler declares: its
//! path parameters (positional, in template order) and its query parameters
//! (keyword, by name). At registration the signature is checked against the
//! route template and compiled into a [`Binder`]; per request the binder
//! turns raw captures and query values into typed [`Arguments`].
//!
//! A signature without path parameters is lenient and binds every template
//! placeholder as a string.

use crate::pattern::PathParams;
use crate::request::QueryParams;
use crate::types::{convert_param, ParamType, ParamValue};
use crate::validation::{FieldError, ValidationErrors, ValidationResult};

/// One declared path parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathParam {
    /// Placeholder name
    pub name: String,
    /// Target type
    pub ty: ParamType,
}

/// One declared query parameter
#[derive(Debug, Clone, PartialEq)]
pub struct QueryParam {
    /// Query key
    pub name: String,
    /// Target type
    pub ty: ParamType,
    /// Whether absence is a binding failure
    pub required: bool,
    /// Value used when the key is absent
    pub default: Option<ParamValue>,
}

/// Parameter schema of a handler
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Signature {
    path: Vec<PathParam>,
    query: Vec<QueryParam>,
    extra_query: bool,
}

impl Signature {
    /// Lenient signature: string path parameters, no query parameters
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare the next path parameter
    #[must_use]
    pub fn path(mut self, name: impl Into<String>, ty: ParamType) -> Self {
        self.path.push(PathParam {
            name: name.into(),
            ty,
        });
        self
    }

    /// Declare a required query parameter
    #[must_use]
    pub fn query(mut self, name: impl Into<String>, ty: ParamType) -> Self {
        self.query.push(QueryParam {
            name: name.into(),
            ty,
            required: true,
            default: None,
        });
        self
    }

    /// Declare an optional query parameter, omitted from the arguments when absent
    #[must_use]
    pub fn optional_query(mut self, name: impl Into<String>, ty: ParamType) -> Self {
        self.query.push(QueryParam {
            name: name.into(),
            ty,
            required: false,
            default: None,
        });
        self
    }

    /// Declare an optional query parameter with a default value
    #[must_use]
    pub fn query_or(
        mut self,
        name: impl Into<String>,
        ty: ParamType,
        default: impl Into<ParamValue>,
    ) -> Self {
        self.query.push(QueryParam {
            name: name.into(),
            ty,
            required: false,
            default: Some(default.into()),
        });
        self
    }

    /// Pass undeclared query keys through as string keyword arguments
    #[must_use]
    pub fn with_extra_query(mut self) -> Self {
        self.extra_query = true;
        self
    }

    /// Declared path parameters
    #[must_use]
    pub fn path_params(&self) -> &[PathParam] {
        &self.path
    }

    /// Declared query parameters
    #[must_use]
    pub fn query_params(&self) -> &[QueryParam] {
        &self.query
    }

    /// Check the signature against a template's placeholders and compile it
    ///
    /// # Errors
    ///
    /// Returns a human-readable reason when the declared path parameters do
    /// not match the template's placeholders in count, name and order, or
    /// when a query default is not of its declared type.
    pub fn compile(&self, template_params: &[String]) -> Result<Binder, String> {
        let path = if self.path.is_empty() {
            template_params
                .iter()
                .map(|name| PathParam {
                    name: name.clone(),
                    ty: ParamType::String,
                })
                .collect()
        } else {
            if self.path.len() != template_params.len() {
                return Err(format!(
                    "template declares {} path parameter(s), handler accepts {}",
                    template_params.len(),
                    self.path.len()
                ));
            }
            if let Some((declared, expected)) = self
                .path
                .iter()
                .zip(template_params)
                .find(|(declared, expected)| declared.name != **expected)
            {
                return Err(format!(
                    "handler parameter '{}' does not match template parameter '{}'",
                    declared.name, expected
                ));
            }
            self.path.clone()
        };

        if let Some(param) = self.query.iter().find(|p| {
            p.default
                .as_ref()
                .is_some_and(|default| default.param_type() != p.ty)
        }) {
            return Err(format!(
                "default for query parameter '{}' is not of type {}",
                param.name, param.ty
            ));
        }

        Ok(Binder {
            path,
            query: self.query.clone(),
            extra_query: self.extra_query,
        })
    }
}

/// Compiled, per-route parameter binding
#[derive(Debug, Clone)]
pub struct Binder {
    path: Vec<PathParam>,
    query: Vec<QueryParam>,
    extra_query: bool,
}

impl Binder {
    /// Bind one request's captures and query values
    ///
    /// Conversion failures are recorded first (path parameters in template
    /// order, then declared query parameters), followed by missing required
    /// query parameters.
    ///
    /// # Errors
    ///
    /// Returns every binding failure found.
    pub fn bind(&self, captures: &PathParams, query: &QueryParams) -> ValidationResult<Arguments> {
        let mut errors = ValidationErrors::new();
        let mut args = Arguments::default();

        for (param, (_, raw)) in self.path.iter().zip(captures.iter()) {
            match convert_param(raw, param.ty) {
                Ok(value) => args.positional.push((param.name.clone(), value)),
                Err(e) => errors.add(FieldError::invalid_type(
                    &param.name,
                    format!("{}: {e}", param.name),
                )),
            }
        }

        let mut missing = Vec::new();
        for param in &self.query {
            match query.get(&param.name) {
                Some(raw) => match convert_param(raw, param.ty) {
                    Ok(value) => args.keyword.push((param.name.clone(), value)),
                    Err(e) => errors.add(FieldError::invalid_type(
                        &param.name,
                        format!("{}: {e}", param.name),
                    )),
                },
                None if param.required => missing.push(FieldError::required(&param.name)),
                None => {
                    if let Some(default) = &param.default {
                        args.keyword.push((param.name.clone(), default.clone()));
                    }
                }
            }
        }
        missing.into_iter().for_each(|e| errors.add(e));

        if self.extra_query {
            for (key, value) in query.iter() {
                if !self.query.iter().any(|p| p.name == key) {
                    args.keyword
                        .push((key.to_string(), ParamValue::String(value.to_string())));
                }
            }
        }

        if errors.is_empty() {
            Ok(args)
        } else {
            Err(errors)
        }
    }
}

/// Bound handler arguments
///
/// Positional arguments are the path parameters in template order; keyword
/// arguments are the query parameters by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    positional: Vec<(String, ParamValue)>,
    keyword: Vec<(String, ParamValue)>,
}

impl Arguments {
    /// Positional argument by index
    #[must_use]
    pub fn arg(&self, index: usize) -> Option<&ParamValue> {
        self.positional.get(index).map(|(_, v)| v)
    }

    /// Positional values in template order
    pub fn positional(&self) -> impl Iterator<Item = &ParamValue> {
        self.positional.iter().map(|(_, v)| v)
    }

    /// Path parameter by name; with duplicate names the last one wins
    #[must_use]
    pub fn path(&self, name: &str) -> Option<&ParamValue> {
        self.positional
            .iter()
            .rev()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v)
    }

    /// Keyword argument by name
    #[must_use]
    pub fn query(&self, name: &str) -> Option<&ParamValue> {
        self.keyword.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    /// Keyword (name, value) pairs
    pub fn keyword(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.keyword.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Path or query argument as string, path first
    #[must_use]
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.path(name)
            .or_else(|| self.query(name))
            .and_then(ParamValue::as_str)
    }

    /// Path or query argument as i64, path first
    #[must_use]
    pub fn get_int(&self, name: &str) -> Option<i64> {
        self.path(name)
            .or_else(|| self.query(name))
            .and_then(ParamValue::as_int)
    }

    /// Path or query argument as f64, path first
    #[must_use]
    pub fn get_float(&self, name: &str) -> Option<f64> {
        self.path(name)
            .or_else(|| self.query(name))
            .and_then(ParamValue::as_float)
    }

    /// Path or query argument as bool, path first
    #[must_use]
    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.path(name)
            .or_else(|| self.query(name))
            .and_then(ParamValue::as_bool)
    }
}
