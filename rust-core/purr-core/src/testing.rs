//! # Test Client
//!
//! Drives an [`App`] in-process, without a socket, and collects what it sends
//! back into a [`TestResponse`].

use crate::app::App;
use crate::error::Result;
use crate::headers::Headers;
use crate::protocol::{BufferedReceiver, Message, RecordingSender, Scope};
use hyper::body::Bytes;
use std::sync::Arc;

/// What the application sent for one request
#[derive(Debug, Clone, Default)]
pub struct TestResponse {
    /// Status from `http.response.start`, 0 if none was sent
    pub status: u16,
    /// Headers from `http.response.start`
    pub headers: Headers,
    /// Concatenated `http.response.body` payloads
    pub body: Bytes,
    /// Every message in the order it was sent
    pub messages: Vec<Message>,
}

impl TestResponse {
    fn from_messages(messages: Vec<Message>) -> Self {
        let mut response = Self::default();
        let mut body = Vec::new();
        for message in &messages {
            match message {
                Message::ResponseStart { status, headers } => {
                    response.status = *status;
                    response.headers = Headers::from_raw(headers);
                }
                Message::ResponseBody { body: chunk } => body.extend_from_slice(chunk),
                _ => {}
            }
        }
        response.body = Bytes::from(body);
        response.messages = messages;
        response
    }

    /// Body as UTF-8, lossily
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// In-process client for an [`App`]
#[derive(Debug, Clone)]
pub struct TestClient {
    app: Arc<App>,
}

impl TestClient {
    /// Wrap an application
    #[must_use]
    pub fn new(app: App) -> Self {
        Self { app: Arc::new(app) }
    }

    /// Send an HTTP request with an empty body
    ///
    /// `target` may carry a query string (`/items/3?limit=5`).
    ///
    /// # Errors
    ///
    /// Returns whatever the application's dispatch returns.
    pub async fn request(&self, method: &str, target: &str) -> Result<TestResponse> {
        self.request_with_body(method, target, Bytes::new()).await
    }

    /// Send an HTTP request carrying `body`
    ///
    /// # Errors
    ///
    /// Returns whatever the application's dispatch returns.
    pub async fn request_with_body(
        &self,
        method: &str,
        target: &str,
        body: impl Into<Bytes>,
    ) -> Result<TestResponse> {
        self.call(Scope::http(method, target), BufferedReceiver::with_body(body))
            .await
    }

    /// Send a request with an explicit scope type (`"websocket"`, `"grpc"`, ...)
    ///
    /// # Errors
    ///
    /// Returns whatever the application's dispatch returns.
    pub async fn request_with_type(
        &self,
        kind: &str,
        method: &str,
        path: &str,
    ) -> Result<TestResponse> {
        self.send_scope(Scope::new(kind, method, path)).await
    }

    /// Send a hand-built scope, e.g. one carrying headers
    ///
    /// # Errors
    ///
    /// Returns whatever the application's dispatch returns.
    pub async fn send_scope(&self, scope: Scope) -> Result<TestResponse> {
        self.call(scope, BufferedReceiver::default()).await
    }

    async fn call(&self, scope: Scope, receive: BufferedReceiver) -> Result<TestResponse> {
        let send = RecordingSender::new();
        self.app.call(scope, Arc::new(receive), &send).await?;
        Ok(TestResponse::from_messages(send.take()))
    }
}
