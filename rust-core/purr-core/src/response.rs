//! # HTTP Response
//!
//! In-memory response value and its translation into protocol messages.
//!
//! [`Response::send`] is the only place the dispatcher writes to the send
//! channel: one `http.response.start` message, then one
//! `http.response.body` message with the whole body. No streaming.

use crate::error::Result;
use crate::headers::Headers;
use crate::protocol::{Message, MessageSender};
use hyper::body::Bytes;
use serde::Serialize;

/// HTTP response produced by a handler or by the router itself
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Raw body bytes
    pub body: Bytes,
    /// HTTP status code
    pub status_code: u16,
    /// Response headers
    pub headers: Headers,
}

impl Default for Response {
    fn default() -> Self {
        Self {
            body: Bytes::new(),
            status_code: 200,
            headers: Headers::new(),
        }
    }
}

impl Response {
    /// Create a 200 response with the given body and no headers
    ///
    /// String bodies are stored as their UTF-8 bytes.
    #[must_use]
    pub fn new(body: impl Into<Bytes>) -> Self {
        Self {
            body: body.into(),
            ..Self::default()
        }
    }

    /// Create a plain text response
    #[must_use]
    pub fn text(body: impl Into<String>) -> Self {
        Self::new(body.into()).with_content_type("text/plain; charset=utf-8")
    }

    /// Create a JSON response from any serializable value
    ///
    /// # Errors
    ///
    /// Returns `Error::Json` if the value cannot be serialized.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        let body = serde_json::to_vec(value)?;
        Ok(Self::new(body).with_content_type("application/json"))
    }

    /// Set status code
    #[must_use]
    pub fn with_status(mut self, status: u16) -> Self {
        self.status_code = status;
        self
    }

    /// Append a header
    #[must_use]
    pub fn with_header(mut self, key: &str, value: &str) -> Self {
        self.headers.set(key, value);
        self
    }

    /// Append a `Content-Type` header
    #[must_use]
    pub fn with_content_type(self, content_type: &str) -> Self {
        self.with_header("Content-Type", content_type)
    }

    /// Replace the header list
    #[must_use]
    pub fn with_headers(mut self, headers: Headers) -> Self {
        self.headers = headers;
        self
    }

    /// Body as UTF-8 text, if it is valid UTF-8
    #[must_use]
    pub fn body_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.body).ok()
    }

    /// Split into the start and body protocol messages
    #[must_use]
    pub fn into_messages(self) -> [Message; 2] {
        [
            Message::ResponseStart {
                status: self.status_code,
                headers: self.headers.to_raw(),
            },
            Message::ResponseBody { body: self.body },
        ]
    }

    /// Emit the response through the send channel
    ///
    /// # Errors
    ///
    /// Propagates the first failure of the send channel; the body message is
    /// not attempted if the start message fails.
    pub async fn send(self, send: &dyn MessageSender) -> Result<()> {
        let [start, body] = self.into_messages();
        send.send(start).await?;
        send.send(body).await
    }
}

impl From<&'static str> for Response {
    fn from(body: &'static str) -> Self {
        Self::new(body)
    }
}

impl From<String> for Response {
    fn from(body: String) -> Self {
        Self::new(body)
    }
}
