//! # Request
//!
//! What a handler receives: the bound [`Arguments`], the request [`Scope`]
//! and the receive channel for reading the body.
//!
//! Also home of query string parsing. Values are URL-decoded, the first
//! occurrence of a repeated key wins, and keys with blank values are dropped.

use crate::error::{Error, Result};
use crate::protocol::{Message, MessageReceiver, Scope};
use crate::router::Router;
use crate::signature::Arguments;
use crate::state::{State, APP_KEY, ROUTER_KEY};
use crate::types::ParamValue;
use hyper::body::Bytes;
use std::sync::Arc;

/// Parsed query string, first value per key
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    /// Parse a raw `key=value&key=value` query string
    #[must_use]
    pub fn parse(raw: &[u8]) -> Self {
        let mut pairs: Vec<(String, String)> = Vec::new();
        for (key, value) in url::form_urlencoded::parse(raw) {
            if value.is_empty() || pairs.iter().any(|(k, _)| *k == key) {
                continue;
            }
            pairs.push((key.into_owned(), value.into_owned()));
        }
        Self { pairs }
    }

    /// Value for `key`
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// (key, value) pairs in order of first appearance
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of distinct keys
    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// True when the query string carried nothing
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Handler input for one dispatched request
#[derive(Clone)]
pub struct Request {
    scope: Arc<Scope>,
    receive: Arc<dyn MessageReceiver>,
    args: Arguments,
}

impl Request {
    /// Assemble a request from its parts
    pub fn new(scope: Arc<Scope>, receive: Arc<dyn MessageReceiver>, args: Arguments) -> Self {
        Self {
            scope,
            receive,
            args,
        }
    }

    /// The request scope
    #[must_use]
    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// HTTP method as received
    #[must_use]
    pub fn method(&self) -> &str {
        &self.scope.method
    }

    /// Request path
    #[must_use]
    pub fn path(&self) -> &str {
        &self.scope.path
    }

    /// Bound arguments
    #[must_use]
    pub const fn args(&self) -> &Arguments {
        &self.args
    }

    /// Path parameter by name
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&ParamValue> {
        self.args.path(name)
    }

    /// Query (keyword) argument by name
    #[must_use]
    pub fn query(&self, name: &str) -> Option<&ParamValue> {
        self.args.query(name)
    }

    /// First header value as UTF-8, compared case-insensitively
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.scope
            .header(name)
            .and_then(|v| std::str::from_utf8(v).ok())
    }

    /// The router that dispatched this request
    #[must_use]
    pub fn router(&self) -> Option<Arc<Router>> {
        self.scope.state.get::<Arc<Router>>(ROUTER_KEY)
    }

    /// Application-wide state, when dispatched through an `App`
    #[must_use]
    pub fn app_state(&self) -> Option<State> {
        self.scope.state.get::<State>(APP_KEY)
    }

    /// Receive the next raw protocol message
    ///
    /// # Errors
    ///
    /// Returns `Error::ChannelClosed` if the transport is gone.
    pub async fn receive(&self) -> Result<Message> {
        self.receive.receive().await
    }

    /// Read the complete request body
    ///
    /// Collects `http.request` chunks until one arrives without `more_body`.
    /// A disconnect ends the body early.
    ///
    /// # Errors
    ///
    /// Returns `Error::ChannelClosed` if the transport is gone.
    pub async fn body(&self) -> Result<Bytes> {
        let mut collected = Vec::new();
        loop {
            match self.receive.receive().await? {
                Message::HttpRequest { body, more_body } => {
                    collected.extend_from_slice(&body);
                    if !more_body {
                        break;
                    }
                }
                Message::HttpDisconnect | Message::WebsocketDisconnect { .. } => break,
                other => {
                    tracing::debug!(kind = other.kind(), "ignoring message while reading body");
                }
            }
        }
        Ok(Bytes::from(collected))
    }

    /// Read the request body as UTF-8 text
    ///
    /// # Errors
    ///
    /// Returns `Error::ChannelClosed` if the transport is gone, or
    /// `Error::Io` with `InvalidData` if the body is not UTF-8.
    pub async fn text(&self) -> Result<String> {
        let body = self.body().await?;
        String::from_utf8(body.to_vec())
            .map_err(|e| Error::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
    }
}

impl std::fmt::Debug for Request {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Request")
            .field("scope", &self.scope)
            .field("args", &self.args)
            .finish_non_exhaustive()
    }
}
