//! # Error Handling
//!
//! Centralized error types for purr core.
//! Uses `thiserror` for ergonomic error definitions.
//!
//! Request-time conditions the router can answer itself (unknown scope type,
//! no matching route, bad parameters) never show up here: they are turned
//! into responses by the dispatcher. What remains are registration mistakes
//! and failures the transport has to deal with.

use thiserror::Error;

/// Result type alias for purr operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for the purr runtime
#[derive(Error, Debug)]
pub enum Error {
    /// Route registered with a method outside the supported set
    #[error("Invalid request method {method}")]
    InvalidMethod {
        /// The rejected method string, as given
        method: String,
    },

    /// Handler cannot serve the route it was registered for
    #[error("Invalid handler for {path}: {reason}")]
    InvalidHandlerKind {
        /// Path template of the route being registered
        path: String,
        /// Why the handler was rejected
        reason: String,
    },

    /// Invalid route pattern provided
    #[error("Invalid route pattern: {pattern}: {reason}")]
    InvalidRoutePattern {
        /// The invalid pattern
        pattern: String,
        /// Reason for invalidity
        reason: String,
    },

    /// A handler failed for a reason other than parameter binding
    #[error("Handler error: {0}")]
    Handler(#[source] anyhow::Error),

    /// The transport dropped its side of the send or receive channel
    #[error("Protocol channel closed")]
    ChannelClosed,

    /// Server failed to bind to the specified address
    #[error("Failed to bind server to {address}: {source}")]
    BindError {
        /// The address we tried to bind to
        address: String,
        /// The underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// HTTP protocol error
    #[error("HTTP error: {0}")]
    Http(#[from] hyper::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Request payload too large
    #[error("Payload too large: limit={limit} bytes, received={actual} bytes")]
    PayloadTooLarge {
        /// Max allowed size
        limit: usize,
        /// Actual size
        actual: usize,
    },
}
