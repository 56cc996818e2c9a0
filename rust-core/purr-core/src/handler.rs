//! # Handlers
//!
//! The handler contract: something that declares a [`Signature`] and, given
//! a bound [`Request`], asynchronously produces a [`Response`].
//!
//! Async closures are adapted with [`handler_fn`].

use crate::request::Request;
use crate::response::Response;
use crate::signature::Signature;
use async_trait::async_trait;
use std::future::Future;

/// Result a handler resolves to
///
/// Errors propagate out of dispatch untouched; the transport decides how to
/// answer them.
pub type HandlerResult = anyhow::Result<Response>;

/// Application request handler
#[async_trait]
pub trait Handler: Send + Sync + 'static {
    /// Parameters this handler accepts
    fn signature(&self) -> &Signature;

    /// Produce the response for one request
    async fn call(&self, request: Request) -> HandlerResult;
}

/// Handler backed by an async closure
pub struct FnHandler<F> {
    signature: Signature,
    f: F,
}

impl<F> FnHandler<F> {
    /// Replace the (lenient) default signature
    #[must_use]
    pub fn with_signature(mut self, signature: Signature) -> Self {
        self.signature = signature;
        self
    }
}

impl<F> std::fmt::Debug for FnHandler<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnHandler")
            .field("signature", &self.signature)
            .finish_non_exhaustive()
    }
}

/// Wrap an async closure as a handler with a lenient signature
///
/// ```
/// use purr_core::{handler_fn, ParamType, Response, Signature};
///
/// let hello = handler_fn(|req| async move {
///     let name = req.args().get_str("name").unwrap_or("stranger").to_string();
///     Ok(Response::new(format!("Hi {name}")))
/// });
///
/// let item = handler_fn(|req| async move {
///     Ok(Response::new(format!("item {:?}", req.args().get_int("id"))))
/// })
/// .with_signature(Signature::new().path("id", ParamType::Int));
/// # let _ = (hello, item);
/// ```
pub fn handler_fn<F, Fut>(f: F) -> FnHandler<F>
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    FnHandler {
        signature: Signature::new(),
        f,
    }
}

#[async_trait]
impl<F, Fut> Handler for FnHandler<F>
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    fn signature(&self) -> &Signature {
        &self.signature
    }

    async fn call(&self, request: Request) -> HandlerResult {
        (self.f)(request).await
    }
}
