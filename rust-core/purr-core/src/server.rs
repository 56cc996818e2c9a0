//! # HTTP Server
//!
//! Transport adapter built on Hyper and Tokio. Each HTTP/1.1 request becomes
//! a scope/receive/send triple for [`App::call`]; the two outbound messages
//! are collected back into a hyper response.
//!
//! ## Key Features
//!
//! - Async request handling with Tokio runtime
//! - Graceful shutdown on SIGINT with a drain timeout
//! - Connection keep-alive support
//! - Request body size limit

use crate::app::App;
use crate::error::{Error, Result};
use crate::headers::Headers;
use crate::protocol::{BufferedReceiver, Message, RecordingSender, Scope, HTTP};
use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// HTTP Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the server to
    pub address: SocketAddr,
    /// Enable keep-alive connections
    pub keep_alive: bool,
    /// Shutdown timeout for graceful shutdown (default: 30 seconds)
    pub shutdown_timeout: Duration,
    /// Max request body size in bytes
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: ([127, 0, 0, 1], 8000).into(),
            keep_alive: true,
            shutdown_timeout: Duration::from_secs(30),
            max_body_size: 1024 * 1024,
        }
    }
}

impl ServerConfig {
    /// Defaults overridden by `PURR_ADDRESS`, `PURR_SHUTDOWN_TIMEOUT_SECS`
    /// and `PURR_MAX_BODY_SIZE`
    ///
    /// Unparseable values are logged and ignored.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(raw) = lookup("PURR_ADDRESS") {
            match raw.parse() {
                Ok(address) => config.address = address,
                Err(e) => warn!(value = %raw, error = %e, "ignoring invalid PURR_ADDRESS"),
            }
        }
        if let Some(raw) = lookup("PURR_SHUTDOWN_TIMEOUT_SECS") {
            match raw.parse() {
                Ok(secs) => config.shutdown_timeout = Duration::from_secs(secs),
                Err(e) => warn!(value = %raw, error = %e, "ignoring invalid PURR_SHUTDOWN_TIMEOUT_SECS"),
            }
        }
        if let Some(raw) = lookup("PURR_MAX_BODY_SIZE") {
            match raw.parse() {
                Ok(bytes) => config.max_body_size = bytes,
                Err(e) => warn!(value = %raw, error = %e, "ignoring invalid PURR_MAX_BODY_SIZE"),
            }
        }
        config
    }
}

/// HTTP server driving an [`App`]
#[derive(Debug)]
pub struct Server {
    config: ServerConfig,
    app: Arc<App>,
}

impl Server {
    /// Create a new Server instance with default configuration
    #[must_use]
    pub fn new(app: App) -> Self {
        Self {
            config: ServerConfig::default(),
            app: Arc::new(app),
        }
    }

    /// Replace the whole configuration
    #[must_use]
    pub fn with_config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Bind the server to an address
    #[must_use]
    pub const fn bind(mut self, addr: SocketAddr) -> Self {
        self.config.address = addr;
        self
    }

    /// Set max request body size
    pub fn set_max_body_size(&mut self, bytes: usize) {
        self.config.max_body_size = bytes;
    }

    /// Current configuration
    #[must_use]
    pub const fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Start the server with graceful shutdown
    ///
    /// # Errors
    ///
    /// Returns `Error::BindError` if the listener cannot be set up, or
    /// `Error::Io` if accepting a connection fails.
    pub async fn serve(&self) -> Result<()> {
        let addr = self.config.address;
        let bind_error = |source| Error::BindError {
            address: addr.to_string(),
            source,
        };

        let socket = if addr.is_ipv4() {
            tokio::net::TcpSocket::new_v4()
        } else {
            tokio::net::TcpSocket::new_v6()
        }
        .map_err(bind_error)?;
        socket.set_reuseaddr(true).map_err(bind_error)?;
        #[cfg(not(windows))]
        {
            socket.set_reuseport(true).map_err(bind_error)?;
        }
        socket.bind(addr).map_err(bind_error)?;

        let listener = socket.listen(1024).map_err(bind_error)?;

        info!("Server listening on http://{}", addr);

        let active = Arc::new(AtomicUsize::new(0));
        let max_body_size = self.config.max_body_size;
        let keep_alive = self.config.keep_alive;

        loop {
            tokio::select! {
                accept_result = listener.accept() => {
                    let (stream, remote_addr) = accept_result?;
                    let io = TokioIo::new(stream);

                    let app = Arc::clone(&self.app);
                    let active = Arc::clone(&active);

                    tokio::task::spawn(async move {
                        active.fetch_add(1, Ordering::Relaxed);

                        if let Err(err) = http1::Builder::new()
                            .keep_alive(keep_alive)
                            .serve_connection(io, service_fn(move |req| {
                                let app = Arc::clone(&app);
                                async move {
                                    let method = req.method().clone();
                                    let path = req.uri().path().to_string();
                                    let version = req.version();

                                    let result = handle_request(req, &app, max_body_size).await;
                                    match &result {
                                        Ok(resp) => info!("    {} - \"{} {} {:?}\" {}",
                                            remote_addr, method, path, version, resp.status()),
                                        Err(_) => error!("    {} - \"{} {} {:?}\" ERROR",
                                            remote_addr, method, path, version),
                                    }
                                    result
                                }
                            }))
                            .await
                        {
                            error!("Error serving connection: {:?}", err);
                        }
                        active.fetch_sub(1, Ordering::Relaxed);
                    });
                }
                () = shutdown_signal() => {
                    info!("Shutdown signal received, stopping server...");
                    break;
                }
            }
        }

        let timeout = self.config.shutdown_timeout;
        let drain = async {
            while active.load(Ordering::Relaxed) != 0 {
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
        };
        if tokio::time::timeout(timeout, drain).await.is_err() {
            warn!(
                remaining = active.load(Ordering::Relaxed),
                "shutdown timeout elapsed with connections still open"
            );
        }
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to install CTRL+C signal handler: {}", e);
        std::future::pending::<()>().await;
    }
}

/// Build the protocol scope for a hyper request head
fn scope_from_request<B>(req: &Request<B>) -> Scope {
    let mut scope = Scope::new(HTTP, req.method().as_str(), req.uri().path())
        .with_query(req.uri().query().unwrap_or_default());
    scope.headers = req
        .headers()
        .iter()
        .map(|(name, value)| {
            (
                Bytes::copy_from_slice(name.as_str().as_bytes()),
                Bytes::copy_from_slice(value.as_bytes()),
            )
        })
        .collect();
    scope
}

fn plain_response(status: StatusCode, body: &'static str) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from_static(body.as_bytes())));
    *response.status_mut() = status;
    response
}

fn payload_too_large(limit: usize, actual: usize) -> Response<Full<Bytes>> {
    warn!("{}", Error::PayloadTooLarge { limit, actual });
    plain_response(StatusCode::PAYLOAD_TOO_LARGE, "Payload Too Large")
}

/// Fold the recorded start/body messages into a hyper response
fn into_hyper(messages: Vec<Message>) -> Response<Full<Bytes>> {
    let mut status = None;
    let mut headers = Vec::new();
    let mut body = Vec::new();

    for message in messages {
        match message {
            Message::ResponseStart {
                status: code,
                headers: raw,
            } => {
                status = Some(code);
                headers = raw;
            }
            Message::ResponseBody { body: chunk } => body.extend_from_slice(&chunk),
            other => warn!(kind = other.kind(), "ignoring unexpected outbound message"),
        }
    }

    let Some(status) = status.and_then(|code| StatusCode::from_u16(code).ok()) else {
        error!("application finished without a valid response start");
        return plain_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error");
    };

    let mut builder = Response::builder().status(status);
    for (name, value) in Headers::from_raw(&headers).iter() {
        builder = builder.header(name, value);
    }
    builder.body(Full::new(Bytes::from(body))).unwrap_or_else(|e| {
        error!("invalid response from application: {}", e);
        plain_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
    })
}

async fn handle_request(
    req: Request<hyper::body::Incoming>,
    app: &App,
    max_body_size: usize,
) -> std::result::Result<Response<Full<Bytes>>, hyper::Error> {
    let scope = scope_from_request(&req);
    let declared = req
        .headers()
        .get(hyper::header::CONTENT_LENGTH)
        .and_then(|len| len.to_str().ok())
        .and_then(|len| len.parse::<usize>().ok());
    if let Some(len) = declared.filter(|&len| len > max_body_size) {
        return Ok(payload_too_large(max_body_size, len));
    }

    let body = req.into_body().collect().await?.to_bytes();
    if body.len() > max_body_size {
        return Ok(payload_too_large(max_body_size, body.len()));
    }

    let receive = Arc::new(BufferedReceiver::with_body(body));
    let send = RecordingSender::new();

    if let Err(e) = app.call(scope, receive, &send).await {
        error!("Failed to handle request: {}", e);
        return Ok(plain_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error"));
    }

    Ok(into_hyper(send.take()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_server_config_default() {
        let config = ServerConfig::default();
        assert_eq!(config.address.port(), 8000);
        assert!(config.keep_alive);
        assert_eq!(config.max_body_size, 1024 * 1024);
    }

    #[test]
    fn test_server_builder() {
        let mut server = Server::new(App::new(crate::router::Router::new()))
            .bind(([0, 0, 0, 0], 9100).into());
        server.set_max_body_size(16);

        assert_eq!(server.config().address.port(), 9100);
        assert_eq!(server.config().max_body_size, 16);
        assert!(server.config().keep_alive);
    }

    #[test]
    fn test_config_from_lookup() {
        let env: HashMap<&str, &str> = [
            ("PURR_ADDRESS", "0.0.0.0:9000"),
            ("PURR_SHUTDOWN_TIMEOUT_SECS", "5"),
            ("PURR_MAX_BODY_SIZE", "not-a-number"),
        ]
        .into_iter()
        .collect();

        let config = ServerConfig::from_lookup(|key| env.get(key).map(ToString::to_string));
        assert_eq!(config.address.port(), 9000);
        assert_eq!(config.shutdown_timeout, Duration::from_secs(5));
        assert_eq!(config.max_body_size, 1024 * 1024);
    }

    #[test]
    fn test_scope_from_request() {
        let req = Request::builder()
            .method("POST")
            .uri("/items/3?limit=5")
            .header("X-Trace", "abc")
            .body(())
            .unwrap();

        let scope = scope_from_request(&req);
        assert_eq!(scope.kind, "http");
        assert_eq!(scope.method, "POST");
        assert_eq!(scope.path, "/items/3");
        assert_eq!(scope.query_string.as_ref(), b"limit=5");
        assert_eq!(scope.header("x-trace"), Some(&b"abc"[..]));
    }

    #[test]
    fn test_into_hyper() {
        let response = into_hyper(vec![
            Message::ResponseStart {
                status: 201,
                headers: vec![(Bytes::from("Content-Type"), Bytes::from("text/plain"))],
            },
            Message::ResponseBody {
                body: Bytes::from("created"),
            },
        ]);
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()["content-type"], "text/plain");
    }

    #[test]
    fn test_into_hyper_without_start_is_500() {
        let response = into_hyper(vec![Message::ResponseBody {
            body: Bytes::from("orphan"),
        }]);
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
