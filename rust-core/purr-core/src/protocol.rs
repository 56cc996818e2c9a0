//! # Application-Server Protocol
//!
//! The interface between a transport and the router: a [`Scope`] describing
//! one request, a [`MessageReceiver`] yielding inbound messages, and a
//! [`MessageSender`] accepting outbound ones.
//!
//! Transports implement the two channel traits. Implementations are provided
//! for tokio mpsc channels, plus [`BufferedReceiver`] and [`RecordingSender`]
//! for transports that have the whole request up front and want the whole
//! response back.

use crate::error::{Error, Result};
use crate::state::State;
use async_trait::async_trait;
use hyper::body::Bytes;
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};
use tokio::sync::mpsc;

/// Scope type for plain HTTP requests
pub const HTTP: &str = "http";
/// Scope type for websocket connections
pub const WEBSOCKET: &str = "websocket";

/// Metadata describing one inbound request
#[derive(Debug, Clone)]
pub struct Scope {
    /// Protocol type (`"http"`, `"websocket"`, or whatever the transport sent)
    pub kind: String,
    /// HTTP method as received; compared case-insensitively
    pub method: String,
    /// Request path, without the query string
    pub path: String,
    /// Raw query string, URL-encoded, without the leading `?`
    pub query_string: Bytes,
    /// Raw request headers in arrival order
    pub headers: Vec<(Bytes, Bytes)>,
    /// Request-scoped state (router and app back-references live here)
    pub state: State,
}

impl Scope {
    /// Create a scope of the given protocol type
    pub fn new(kind: impl Into<String>, method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            method: method.into(),
            path: path.into(),
            query_string: Bytes::new(),
            headers: Vec::new(),
            state: State::new(),
        }
    }

    /// Create an HTTP scope from a request target such as `/items/3?limit=5`
    pub fn http(method: impl Into<String>, target: &str) -> Self {
        let (path, query) = target.split_once('?').unwrap_or((target, ""));
        Self::new(HTTP, method, path).with_query(query)
    }

    /// Replace the raw query string
    #[must_use]
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query_string = Bytes::from(query.into());
        self
    }

    /// Append a raw header
    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((
            Bytes::copy_from_slice(name.as_bytes()),
            Bytes::copy_from_slice(value.as_bytes()),
        ));
        self
    }

    /// First header value for `name`, compared case-insensitively
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&[u8]> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name.as_bytes()))
            .map(|(_, v)| v.as_ref())
    }
}

/// A protocol message travelling between transport and application
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// A chunk of the request body
    HttpRequest {
        /// Body bytes
        body: Bytes,
        /// Whether more chunks follow
        more_body: bool,
    },
    /// The client went away
    HttpDisconnect,
    /// A websocket client asked to connect
    WebsocketConnect,
    /// A websocket client disconnected
    WebsocketDisconnect {
        /// Close code
        code: u16,
    },
    /// Status line and headers of the response
    ResponseStart {
        /// Numeric status code
        status: u16,
        /// Headers as raw (name, value) pairs, in order
        headers: Vec<(Bytes, Bytes)>,
    },
    /// The complete response body
    ResponseBody {
        /// Body bytes
        body: Bytes,
    },
}

impl Message {
    /// Protocol name of the message type
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::HttpRequest { .. } => "http.request",
            Self::HttpDisconnect => "http.disconnect",
            Self::WebsocketConnect => "websocket.connect",
            Self::WebsocketDisconnect { .. } => "websocket.disconnect",
            Self::ResponseStart { .. } => "http.response.start",
            Self::ResponseBody { .. } => "http.response.body",
        }
    }
}

/// Source of inbound protocol messages
#[async_trait]
pub trait MessageReceiver: Send + Sync {
    /// Wait for the next inbound message
    async fn receive(&self) -> Result<Message>;
}

/// Sink for outbound protocol messages
#[async_trait]
pub trait MessageSender: Send + Sync {
    /// Hand one message to the transport
    async fn send(&self, message: Message) -> Result<()>;
}

#[async_trait]
impl MessageSender for mpsc::Sender<Message> {
    async fn send(&self, message: Message) -> Result<()> {
        mpsc::Sender::send(self, message)
            .await
            .map_err(|_| Error::ChannelClosed)
    }
}

#[async_trait]
impl MessageSender for mpsc::UnboundedSender<Message> {
    async fn send(&self, message: Message) -> Result<()> {
        mpsc::UnboundedSender::send(self, message).map_err(|_| Error::ChannelClosed)
    }
}

#[async_trait]
impl MessageReceiver for tokio::sync::Mutex<mpsc::Receiver<Message>> {
    async fn receive(&self) -> Result<Message> {
        self.lock().await.recv().await.ok_or(Error::ChannelClosed)
    }
}

#[async_trait]
impl MessageReceiver for tokio::sync::Mutex<mpsc::UnboundedReceiver<Message>> {
    async fn receive(&self) -> Result<Message> {
        self.lock().await.recv().await.ok_or(Error::ChannelClosed)
    }
}

/// Receiver over a fixed list of messages
///
/// Once the list is drained every call yields `http.disconnect`.
#[derive(Debug, Default)]
pub struct BufferedReceiver {
    queue: Mutex<VecDeque<Message>>,
}

impl BufferedReceiver {
    /// Queue the given messages
    #[must_use]
    pub fn new(messages: impl IntoIterator<Item = Message>) -> Self {
        Self {
            queue: Mutex::new(messages.into_iter().collect()),
        }
    }

    /// A receiver carrying a complete request body in one message
    #[must_use]
    pub fn with_body(body: impl Into<Bytes>) -> Self {
        Self::new([Message::HttpRequest {
            body: body.into(),
            more_body: false,
        }])
    }
}

#[async_trait]
impl MessageReceiver for BufferedReceiver {
    async fn receive(&self) -> Result<Message> {
        let next = self
            .queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or(Message::HttpDisconnect);
        Ok(next)
    }
}

/// Sender that keeps every message it is given
#[derive(Debug, Default)]
pub struct RecordingSender {
    messages: Mutex<Vec<Message>>,
}

impl RecordingSender {
    /// Create an empty recorder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the recorded messages, leaving the recorder empty
    pub fn take(&self) -> Vec<Message> {
        std::mem::take(&mut *self.messages.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

#[async_trait]
impl MessageSender for RecordingSender {
    async fn send(&self, message: Message) -> Result<()> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_http_splits_target() {
        let scope = Scope::http("GET", "/items/3?limit=5&q=x");
        assert_eq!(scope.kind, HTTP);
        assert_eq!(scope.path, "/items/3");
        assert_eq!(scope.query_string.as_ref(), b"limit=5&q=x");

        let scope = Scope::http("GET", "/plain");
        assert_eq!(scope.path, "/plain");
        assert!(scope.query_string.is_empty());
    }

    #[test]
    fn test_scope_header_case_insensitive() {
        let scope = Scope::http("GET", "/").with_header("X-Request-Id", "abc");
        assert_eq!(scope.header("x-request-id"), Some(&b"abc"[..]));
        assert_eq!(scope.header("missing"), None);
    }

    #[test]
    fn test_message_kinds() {
        let start = Message::ResponseStart {
            status: 200,
            headers: vec![],
        };
        assert_eq!(start.kind(), "http.response.start");
        assert_eq!(Message::ResponseBody { body: Bytes::new() }.kind(), "http.response.body");
        assert_eq!(Message::HttpDisconnect.kind(), "http.disconnect");
    }

    #[tokio::test]
    async fn test_buffered_receiver_then_disconnect() {
        let receiver = BufferedReceiver::with_body("payload");
        assert_eq!(
            receiver.receive().await.unwrap(),
            Message::HttpRequest {
                body: Bytes::from("payload"),
                more_body: false
            }
        );
        assert_eq!(receiver.receive().await.unwrap(), Message::HttpDisconnect);
        assert_eq!(receiver.receive().await.unwrap(), Message::HttpDisconnect);
    }

    #[tokio::test]
    async fn test_recording_sender_take() {
        let sender = RecordingSender::new();
        sender.send(Message::HttpDisconnect).await.unwrap();
        assert_eq!(sender.take(), vec![Message::HttpDisconnect]);
        assert!(sender.take().is_empty());
    }

    #[tokio::test]
    async fn test_mpsc_channels() {
        let (tx, rx) = mpsc::unbounded_channel();
        MessageSender::send(&tx, Message::WebsocketConnect).await.unwrap();

        let receiver = tokio::sync::Mutex::new(rx);
        assert_eq!(receiver.receive().await.unwrap(), Message::WebsocketConnect);

        drop(tx);
        assert!(matches!(receiver.receive().await, Err(Error::ChannelClosed)));
    }

    #[tokio::test]
    async fn test_closed_bounded_sender() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let result = MessageSender::send(&tx, Message::HttpDisconnect).await;
        assert!(matches!(result, Err(Error::ChannelClosed)));
    }
}
