//! # Route
//!
//! One registered route: a method and path template bound to a handler,
//! with the template's matcher and the handler's binder compiled up front.

use crate::error::{Error, Result};
use crate::handler::Handler;
use crate::pattern::{extract_param_names, PathPattern};
use crate::router::Method;
use crate::signature::Binder;
use std::sync::Arc;

/// An immutable binding of (method, path template) to a handler
///
/// Validation happens once, at construction: the method must be one of the
/// supported set and the handler's signature must fit the template.
#[derive(Clone)]
pub struct Route {
    /// Original path template (e.g., "/users/{id}")
    path: String,
    /// Normalized method
    method: Method,
    /// Shared handler
    handler: Arc<dyn Handler>,
    /// Placeholder names in template order
    path_params: Vec<String>,
    /// Compiled path matcher
    matcher: PathPattern,
    /// Compiled parameter binding
    binder: Binder,
}

impl Route {
    /// Create a route, validating method and handler
    ///
    /// # Arguments
    ///
    /// * `path` - Path template (e.g., "/users/{id}")
    /// * `handler` - The handler serving the route
    /// * `method` - HTTP method, any case
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidMethod` for a method outside the supported set,
    /// `Error::InvalidHandlerKind` when the handler signature does not fit the
    /// template, and `Error::InvalidRoutePattern` if the template cannot be
    /// compiled.
    pub fn new(path: &str, handler: Arc<dyn Handler>, method: &str) -> Result<Self> {
        let method: Method = method.parse()?;
        let path_params = extract_param_names(path);

        let binder = handler
            .signature()
            .compile(&path_params)
            .map_err(|reason| Error::InvalidHandlerKind {
                path: path.to_string(),
                reason,
            })?;
        let matcher = PathPattern::compile(path)?;

        Ok(Self {
            path: path.to_string(),
            method,
            handler,
            path_params,
            matcher,
            binder,
        })
    }

    /// Path template
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Normalized method
    #[must_use]
    pub const fn method(&self) -> Method {
        self.method
    }

    /// Placeholder names in template order
    #[must_use]
    pub fn path_params(&self) -> &[String] {
        &self.path_params
    }

    /// Compiled path matcher
    #[must_use]
    pub const fn matcher(&self) -> &PathPattern {
        &self.matcher
    }

    /// Compiled parameter binding
    #[must_use]
    pub const fn binder(&self) -> &Binder {
        &self.binder
    }

    /// The handler
    #[must_use]
    pub fn handler(&self) -> &Arc<dyn Handler> {
        &self.handler
    }
}

impl PartialEq for Route {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path && self.method == other.method
    }
}

impl Eq for Route {}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("path_params", &self.path_params)
            .finish_non_exhaustive()
    }
}
