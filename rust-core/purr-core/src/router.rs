//! # Router
//!
//! Ordered route table and the dispatch algorithm.
//!
//! ## Features
//!
//! - Path parameter extraction (`/users/{id}`)
//! - Typed path and query parameters via handler signatures
//! - First-registered, first-tried precedence
//! - 404 / 405 / 400 / 422 answered by the router itself
//!
//! ## Lifecycle
//!
//! Routes are registered through `&mut Router` while the application is
//! being assembled. The router is then frozen behind an `Arc` and only read
//! during dispatch, so no locking happens on the request path.

use crate::error::{Error, Result};
use crate::handler::Handler;
use crate::pattern::PathParams;
use crate::protocol::{MessageReceiver, MessageSender, Scope, HTTP, WEBSOCKET};
use crate::request::{QueryParams, Request};
use crate::response::Response;
use crate::route::Route;
use crate::state::ROUTER_KEY;
use crate::validation::ValidationCode;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// HTTP methods supported by the router
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// HTTP GET
    Get,
    /// HTTP POST
    Post,
    /// HTTP DELETE
    Delete,
    /// HTTP PUT
    Put,
    /// HTTP HEAD
    Head,
    /// HTTP CONNECT
    Connect,
    /// HTTP OPTIONS
    Options,
    /// HTTP TRACE
    Trace,
    /// HTTP PATCH
    Patch,
}

impl Method {
    /// Lowercase name, as stored on routes
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Post => "post",
            Self::Delete => "delete",
            Self::Put => "put",
            Self::Head => "head",
            Self::Connect => "connect",
            Self::Options => "options",
            Self::Trace => "trace",
            Self::Patch => "patch",
        }
    }

    /// Uppercase name, as used on the wire (e.g. in `Allow`)
    #[must_use]
    pub const fn as_http_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Delete => "DELETE",
            Self::Put => "PUT",
            Self::Head => "HEAD",
            Self::Connect => "CONNECT",
            Self::Options => "OPTIONS",
            Self::Trace => "TRACE",
            Self::Patch => "PATCH",
        }
    }
}

impl FromStr for Method {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "get" => Ok(Self::Get),
            "post" => Ok(Self::Post),
            "delete" => Ok(Self::Delete),
            "put" => Ok(Self::Put),
            "head" => Ok(Self::Head),
            "connect" => Ok(Self::Connect),
            "options" => Ok(Self::Options),
            "trace" => Ok(Self::Trace),
            "patch" => Ok(Self::Patch),
            _ => Err(Error::InvalidMethod {
                method: s.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of the 404 response
pub const NOT_FOUND_BODY: &str = "URL not found";
/// Body of the 405 response
pub const METHOD_NOT_ALLOWED_BODY: &str = "Method not allowed";
/// Body of the 422 response
pub const MISSING_QUERY_BODY: &str = "Missing required query parameters";

/// Outcome of looking a request up in the route table
#[derive(Debug)]
pub enum Lookup<'a> {
    /// A route matched both path and method
    Found(&'a Route, PathParams),
    /// The path matched, but only for these methods
    MethodNotAllowed(Vec<Method>),
    /// Nothing matched the path
    NotFound,
}

/// Ordered route table with dispatch
///
/// Routes are tried in registration order. Dispatch only talks to the
/// transport through `MessageReceiver` and `MessageSender`.
#[derive(Clone, Default)]
pub struct Router {
    /// Routes in registration order
    routes: Vec<Route>,
}

impl Router {
    /// Create a new empty router
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for a method and path template
    ///
    /// A route with the same method and template replaces the earlier one,
    /// keeping the earlier one's position in the table.
    ///
    /// # Errors
    ///
    /// Propagates `Route::new` failures: `Error::InvalidMethod`,
    /// `Error::InvalidHandlerKind`, `Error::InvalidRoutePattern`.
    pub fn register<H: Handler>(&mut self, path: &str, handler: H, method: &str) -> Result<()> {
        self.register_shared(path, Arc::new(handler), method)
    }

    /// Register an already shared handler
    ///
    /// # Errors
    ///
    /// Same as [`Router::register`].
    pub fn register_shared(
        &mut self,
        path: &str,
        handler: Arc<dyn Handler>,
        method: &str,
    ) -> Result<()> {
        let route = Route::new(path, handler, method)?;

        if let Some(existing) = self.routes.iter_mut().find(|r| **r == route) {
            debug!(method = %route.method(), path, "replacing route");
            *existing = route;
        } else {
            debug!(method = %route.method(), path, "registering route");
            self.routes.push(route);
        }
        Ok(())
    }

    /// Convenience method to add a GET route
    ///
    /// # Errors
    ///
    /// Same as [`Router::register`].
    pub fn get<H: Handler>(&mut self, path: &str, handler: H) -> Result<()> {
        self.register(path, handler, "get")
    }

    /// Convenience method to add a POST route
    ///
    /// # Errors
    ///
    /// Same as [`Router::register`].
    pub fn post<H: Handler>(&mut self, path: &str, handler: H) -> Result<()> {
        self.register(path, handler, "post")
    }

    /// Convenience method to add a PUT route
    ///
    /// # Errors
    ///
    /// Same as [`Router::register`].
    pub fn put<H: Handler>(&mut self, path: &str, handler: H) -> Result<()> {
        self.register(path, handler, "put")
    }

    /// Convenience method to add a DELETE route
    ///
    /// # Errors
    ///
    /// Same as [`Router::register`].
    pub fn delete<H: Handler>(&mut self, path: &str, handler: H) -> Result<()> {
        self.register(path, handler, "delete")
    }

    /// Convenience method to add a PATCH route
    ///
    /// # Errors
    ///
    /// Same as [`Router::register`].
    pub fn patch<H: Handler>(&mut self, path: &str, handler: H) -> Result<()> {
        self.register(path, handler, "patch")
    }

    /// Registered routes, in precedence order
    #[must_use]
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Number of registered routes
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// True when no route is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Find the route for a method and path
    ///
    /// The first route matching both wins. Methods of routes whose path
    /// matched but whose method did not are collected for the 405 answer.
    #[must_use]
    pub fn lookup(&self, method: &str, path: &str) -> Lookup<'_> {
        let mut allowed = Vec::new();

        for route in &self.routes {
            if !route.method().as_str().eq_ignore_ascii_case(method) {
                if route.matcher().is_match(path) && !allowed.contains(&route.method()) {
                    allowed.push(route.method());
                }
                continue;
            }
            if let Some(captures) = route.matcher().captures(path) {
                return Lookup::Found(route, captures);
            }
        }

        if allowed.is_empty() {
            Lookup::NotFound
        } else {
            Lookup::MethodNotAllowed(allowed)
        }
    }

    /// Dispatch one request and send the response
    ///
    /// Unknown scope types, unmatched paths, method mismatches and parameter
    /// binding failures are answered with an error response. Handler
    /// failures are returned to the caller without sending anything.
    ///
    /// # Errors
    ///
    /// Returns `Error::Handler` when the handler fails, or the send channel's
    /// error when the response cannot be delivered.
    pub async fn dispatch(
        self: &Arc<Self>,
        scope: Scope,
        receive: Arc<dyn MessageReceiver>,
        send: &dyn MessageSender,
    ) -> Result<()> {
        let method = scope.method.clone();
        let path = scope.path.clone();

        let response = self.respond(scope, receive).await.map_err(|e| {
            error!(%method, %path, error = %e, "handler failed");
            e
        })?;
        debug!(%method, %path, status = response.status_code, "dispatched");

        response.send(send).await
    }

    /// Run the dispatch algorithm up to (not including) sending
    async fn respond(self: &Arc<Self>, scope: Scope, receive: Arc<dyn MessageReceiver>) -> Result<Response> {
        if scope.kind != HTTP && scope.kind != WEBSOCKET {
            warn!(kind = %scope.kind, "rejecting unsupported scope type");
            return Ok(Response::text(format!("Invalid request type {}", scope.kind)).with_status(400));
        }

        scope.state.set_if_absent(ROUTER_KEY, Arc::clone(self));

        // websocket scopes carry no method; the handshake is a GET
        let method = if scope.method.is_empty() { "get" } else { scope.method.as_str() };

        let (route, captures) = match self.lookup(method, &scope.path) {
            Lookup::Found(route, captures) => (route, captures),
            Lookup::MethodNotAllowed(allowed) => {
                warn!(method, path = %scope.path, "method not allowed");
                let allow = allowed
                    .iter()
                    .map(Method::as_http_str)
                    .collect::<Vec<_>>()
                    .join(", ");
                return Ok(Response::text(METHOD_NOT_ALLOWED_BODY)
                    .with_status(405)
                    .with_header("Allow", &allow));
            }
            Lookup::NotFound => {
                warn!(method, path = %scope.path, "no route matched");
                return Ok(Response::text(NOT_FOUND_BODY).with_status(404));
            }
        };
        debug!(template = route.path(), path = %scope.path, "route matched");

        let query = QueryParams::parse(&scope.query_string);
        let args = match route.binder().bind(&captures, &query) {
            Ok(args) => args,
            Err(errors) => {
                if let Some(first) = errors.first_with_code(ValidationCode::InvalidType) {
                    warn!(path = %scope.path, error = %first.message, "parameter conversion failed");
                    return Ok(Response::text(format!(
                        "Bad request, failed to parse parameters: {}",
                        first.message
                    ))
                    .with_status(400));
                }
                warn!(path = %scope.path, errors = %errors.to_json(), "missing query parameters");
                return Ok(Response::text(MISSING_QUERY_BODY).with_status(422));
            }
        };

        let handler = Arc::clone(route.handler());
        let request = Request::new(Arc::new(scope), receive, args);
        handler.call(request).await.map_err(Error::Handler)
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.routes.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::handler_fn;
    use crate::protocol::{BufferedReceiver, Message, RecordingSender};
    use crate::signature::Signature;
    use crate::types::ParamType;
    use hyper::body::Bytes;

    fn reply(text: &'static str) -> impl Handler {
        reply_with(text, Signature::new())
    }

    fn reply_with(text: &'static str, signature: Signature) -> impl Handler {
        handler_fn(move |_req| async move { Ok(Response::new(text)) }).with_signature(signature)
    }

    async fn run(router: &Arc<Router>, scope: Scope) -> (u16, Vec<(Bytes, Bytes)>, Bytes) {
        let sender = RecordingSender::new();
        router
            .dispatch(scope, Arc::new(BufferedReceiver::default()), &sender)
            .await
            .unwrap();

        let messages = sender.take();
        assert_eq!(messages.len(), 2);
        match (&messages[0], &messages[1]) {
            (Message::ResponseStart { status, headers }, Message::ResponseBody { body }) => {
                (*status, headers.clone(), body.clone())
            }
            other => panic!("unexpected messages {other:?}"),
        }
    }

    #[test]
    fn test_method_from_str() {
        assert_eq!("GET".parse::<Method>().unwrap(), Method::Get);
        assert_eq!("Trace".parse::<Method>().unwrap(), Method::Trace);
        assert_eq!("connect".parse::<Method>().unwrap(), Method::Connect);
        assert!("fetch".parse::<Method>().is_err());
        assert_eq!(Method::Options.to_string(), "options");
    }

    #[tokio::test]
    async fn test_hello_scenario() {
        let mut router = Router::new();
        router
            .get(
                "/hello/{name}",
                handler_fn(|req| async move {
                    let name = req.args().get_str("name").unwrap_or_default().to_string();
                    Ok(Response::new("Hi ".to_string() + &name))
                }),
            )
            .unwrap();
        let router = Arc::new(router);

        let (status, _, body) = run(&router, Scope::http("GET", "/hello/Ada")).await;
        assert_eq!(status, 200);
        assert_eq!(body, Bytes::from("Hi Ada"));
    }

    #[tokio::test]
    async fn test_empty_router_not_found() {
        let router = Arc::new(Router::new());
        let (status, _, body) = run(&router, Scope::http("GET", "/anything")).await;
        assert_eq!(status, 404);
        assert_eq!(body, Bytes::from("URL not found"));
    }

    #[tokio::test]
    async fn test_unknown_scope_type_rejected() {
        let mut router = Router::new();
        router.get("/", reply("root")).unwrap();
        let router = Arc::new(router);

        let (status, _, body) = run(&router, Scope::new("grpc", "GET", "/")).await;
        assert_eq!(status, 400);
        assert_eq!(body, Bytes::from("Invalid request type grpc"));
    }

    #[tokio::test]
    async fn test_websocket_scope_is_routed() {
        let mut router = Router::new();
        router.get("/ws", reply("socket")).unwrap();
        let router = Arc::new(router);

        let (status, _, body) = run(&router, Scope::new(WEBSOCKET, "", "/ws")).await;
        assert_eq!(status, 200);
        assert_eq!(body, Bytes::from("socket"));
    }

    #[tokio::test]
    async fn test_wrong_method_is_405() {
        let mut router = Router::new();
        router.get("/widgets/{id}", reply("widget")).unwrap();
        router.put("/widgets/{id}", reply("updated")).unwrap();
        let router = Arc::new(router);

        let (status, headers, body) = run(&router, Scope::http("POST", "/widgets/7")).await;
        assert_eq!(status, 405);
        assert_eq!(body, Bytes::from("Method not allowed"));
        assert!(headers.contains(&(Bytes::from("Allow"), Bytes::from("GET, PUT"))));
    }

    #[tokio::test]
    async fn test_same_path_different_methods() {
        let mut router = Router::new();
        router.get("/items", reply("list")).unwrap();
        router.post("/items", reply("create")).unwrap();
        let router = Arc::new(router);

        let (_, _, body) = run(&router, Scope::http("post", "/items")).await;
        assert_eq!(body, Bytes::from("create"));
        let (_, _, body) = run(&router, Scope::http("GET", "/items")).await;
        assert_eq!(body, Bytes::from("list"));
    }

    #[tokio::test]
    async fn test_reregistration_replaces() {
        let mut router = Router::new();
        router.get("/a/{x}", reply("first")).unwrap();
        router.get("/a/literal", reply("literal")).unwrap();
        router.register("/a/{x}", reply("second"), "GET").unwrap();
        assert_eq!(router.len(), 2);
        let router = Arc::new(router);

        let (_, _, body) = run(&router, Scope::http("GET", "/a/literal")).await;
        assert_eq!(body, Bytes::from("second"));
    }

    #[tokio::test]
    async fn test_first_registered_wins() {
        let mut router = Router::new();
        router.get("/users/me", reply("me")).unwrap();
        router.get("/users/{id}", reply("by id")).unwrap();
        let router = Arc::new(router);

        let (_, _, body) = run(&router, Scope::http("GET", "/users/me")).await;
        assert_eq!(body, Bytes::from("me"));
        let (_, _, body) = run(&router, Scope::http("GET", "/users/42")).await;
        assert_eq!(body, Bytes::from("by id"));
    }

    #[tokio::test]
    async fn test_unmatched_value_class_is_404() {
        let mut router = Router::new();
        router.get("/files/{name}", reply("file")).unwrap();
        let router = Arc::new(router);

        let (status, _, _) = run(&router, Scope::http("GET", "/files/a.txt")).await;
        assert_eq!(status, 404);
    }

    #[tokio::test]
    async fn test_params_bound_in_order() {
        let mut router = Router::new();
        router
            .get(
                "/orders/{order}/lines/{line}",
                handler_fn(|req| async move {
                    let positional: Vec<String> =
                        req.args().positional().map(|v| v.as_string()).collect();
                    let page = req.query("page").map(|v| v.as_string()).unwrap_or_default();
                    Ok(Response::new(format!("{} page={page}", positional.join(","))))
                })
                .with_signature(
                    Signature::new()
                        .path("order", ParamType::Int)
                        .path("line", ParamType::String)
                        .query_or("page", ParamType::Int, 1_i64),
                ),
            )
            .unwrap();
        let router = Arc::new(router);

        let (_, _, body) = run(&router, Scope::http("GET", "/orders/12/lines/ab?page=3")).await;
        assert_eq!(body, Bytes::from("12,ab page=3"));
        let (_, _, body) = run(&router, Scope::http("GET", "/orders/12/lines/ab")).await;
        assert_eq!(body, Bytes::from("12,ab page=1"));
    }

    #[tokio::test]
    async fn test_first_query_value_wins() {
        let mut router = Router::new();
        router
            .get(
                "/search",
                handler_fn(|req| async move {
                    Ok(Response::new(req.args().get_str("x").unwrap_or_default().to_string()))
                })
                .with_signature(Signature::new().query("x", ParamType::String)),
            )
            .unwrap();
        let router = Arc::new(router);

        let (_, _, body) = run(&router, Scope::http("GET", "/search?x=1&x=2")).await;
        assert_eq!(body, Bytes::from("1"));
    }

    #[tokio::test]
    async fn test_conversion_failure_is_400() {
        let mut router = Router::new();
        router
            .get(
                "/items/{id}",
                reply_with("item", Signature::new().path("id", ParamType::Int)),
            )
            .unwrap();
        let router = Arc::new(router);

        let (status, _, body) = run(&router, Scope::http("GET", "/items/abc")).await;
        assert_eq!(status, 400);
        assert_eq!(
            body,
            Bytes::from("Bad request, failed to parse parameters: id: Cannot convert 'abc' to int")
        );
    }

    #[tokio::test]
    async fn test_missing_query_is_422() {
        let mut router = Router::new();
        router
            .get(
                "/items",
                reply_with("items", Signature::new().query("limit", ParamType::Int)),
            )
            .unwrap();
        let router = Arc::new(router);

        let (status, _, body) = run(&router, Scope::http("GET", "/items")).await;
        assert_eq!(status, 422);
        assert_eq!(body, Bytes::from("Missing required query parameters"));
    }

    #[tokio::test]
    async fn test_conversion_beats_missing() {
        let mut router = Router::new();
        router
            .get(
                "/items",
                reply_with(
                    "items",
                    Signature::new()
                        .query("limit", ParamType::Int)
                        .query("page", ParamType::Int),
                ),
            )
            .unwrap();
        let router = Arc::new(router);

        let (status, _, _) = run(&router, Scope::http("GET", "/items?page=two")).await;
        assert_eq!(status, 400);
    }

    #[tokio::test]
    async fn test_router_back_reference_in_scope() {
        let mut router = Router::new();
        router
            .get(
                "/introspect",
                handler_fn(|req| async move {
                    let count = req.router().map_or(0, |r| r.len());
                    Ok(Response::new(count.to_string()))
                }),
            )
            .unwrap();
        let router = Arc::new(router);

        let (_, _, body) = run(&router, Scope::http("GET", "/introspect")).await;
        assert_eq!(body, Bytes::from("1"));
    }

    #[tokio::test]
    async fn test_handler_error_propagates_without_response() {
        let mut router = Router::new();
        router
            .get("/boom", handler_fn(|_req| async { Err(anyhow::anyhow!("boom")) }))
            .unwrap();
        let router = Arc::new(router);

        let sender = RecordingSender::new();
        let result = router
            .dispatch(
                Scope::http("GET", "/boom"),
                Arc::new(BufferedReceiver::default()),
                &sender,
            )
            .await;
        assert!(matches!(result, Err(Error::Handler(_))));
        assert!(sender.take().is_empty());
    }

    #[test]
    fn test_invalid_registration_leaves_table_untouched() {
        let mut router = Router::new();
        assert!(router.register("/x", reply("x"), "fetch").is_err());
        assert!(router.is_empty());
    }
}
