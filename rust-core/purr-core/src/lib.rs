//! # Purr Core
//!
//! Core runtime library for purr, a minimal request router.
//! Maps (method, path template) pairs to async handlers and dispatches
//! requests described by a scope/receive/send protocol.
//!
//! ## Architecture
//!
//! Routes are registered on a mutable [`Router`], which is then frozen
//! behind an `Arc` inside an [`App`]. Transports (the Hyper [`Server`], or
//! the in-process [`TestClient`]) turn each request into a [`Scope`] plus a
//! receive/send channel pair and call [`App::call`].
//!
//! ## Modules
//!
//! - `app` - Application entry point owning router and state
//! - `router` - Route table, lookup and dispatch
//! - `route` - One registered route
//! - `pattern` - Path template compilation and matching
//! - `signature` - Handler parameter declarations and binding
//! - `handler` - Handler trait and closure adapter
//! - `request` - Request view handed to handlers, query parsing
//! - `response` - Response value and its protocol messages
//! - `headers` - Ordered, case-insensitive header list
//! - `protocol` - Scope, messages and channel traits
//! - `server` - HTTP server built on Hyper
//! - `testing` - In-process test client
//! - `state` - Thread-safe shared state
//! - `types` - Parameter types and conversion
//! - `validation` - Structured validation errors
//! - `error` - Error types and handling

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod app;
pub mod error;
pub mod handler;
pub mod headers;
pub mod pattern;
pub mod protocol;
pub mod request;
pub mod response;
pub mod route;
pub mod router;
pub mod server;
pub mod signature;
pub mod state;
pub mod testing;
pub mod types;
pub mod validation;

pub use app::App;
pub use async_trait::async_trait;
pub use error::{Error, Result};
pub use handler::{handler_fn, FnHandler, Handler, HandlerResult};
pub use headers::Headers;
pub use pattern::{extract_param_names, PathParams, PathPattern};
pub use protocol::{
    BufferedReceiver, Message, MessageReceiver, MessageSender, RecordingSender, Scope, HTTP,
    WEBSOCKET,
};
pub use request::{QueryParams, Request};
pub use response::Response;
pub use route::Route;
pub use router::{Lookup, Method, Router};
pub use server::{Server, ServerConfig};
pub use signature::{Arguments, Signature};
pub use state::State;
pub use testing::{TestClient, TestResponse};
pub use types::{convert_param, ConversionError, ParamType, ParamValue};
pub use validation::{FieldError, ValidationCode, ValidationErrors, ValidationResult};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert_eq!(VERSION, "0.1.0");
    }
}
