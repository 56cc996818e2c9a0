//! Demo purr application served over HTTP
//!
//! Configuration comes from `PURR_ADDRESS`, `PURR_SHUTDOWN_TIMEOUT_SECS` and
//! `PURR_MAX_BODY_SIZE`; log filtering from `RUST_LOG`.

use purr_core::{handler_fn, App, ParamType, Response, Router, Server, ServerConfig, Signature};
use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("purr=info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).json().try_init();
}

fn routes() -> purr_core::Result<Router> {
    let mut router = Router::new();

    router.get(
        "/hello/{name}",
        handler_fn(|req| async move {
            let name = req.args().get_str("name").unwrap_or_default().to_string();
            Ok(Response::text(format!("Hi {name}")))
        })
        .with_signature(Signature::new().path("name", ParamType::String)),
    )?;

    router.get(
        "/items/{id}",
        handler_fn(|req| async move {
            let id = req.args().get_int("id");
            let limit = req.args().get_int("limit");
            anyhow::Ok(Response::json(&json!({ "id": id, "limit": limit }))?)
        })
        .with_signature(
            Signature::new()
                .path("id", ParamType::Int)
                .query_or("limit", ParamType::Int, 10_i64),
        ),
    )?;

    router.post(
        "/echo",
        handler_fn(|req| async move {
            let body = req.body().await?;
            let content_type = req
                .header("content-type")
                .unwrap_or("application/octet-stream")
                .to_string();
            anyhow::Ok(Response::new(body).with_content_type(&content_type))
        }),
    )?;

    Ok(router)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = ServerConfig::from_env();
    let router = routes()?;
    info!(routes = router.len(), address = %config.address, "starting purr-server");

    Server::new(App::new(router)).with_config(config).serve().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use purr_core::TestClient;

    fn client() -> TestClient {
        TestClient::new(App::new(routes().unwrap()))
    }

    #[tokio::test]
    async fn test_items_default_limit() {
        let response = client().request("GET", "/items/7").await.unwrap();
        assert_eq!(response.status, 200);
        let body: serde_json::Value = serde_json::from_slice(&response.body).unwrap();
        assert_eq!(body, json!({ "id": 7, "limit": 10 }));
    }

    #[tokio::test]
    async fn test_items_bad_id() {
        let response = client().request("GET", "/items/seven").await.unwrap();
        assert_eq!(response.status, 400);
    }

    #[tokio::test]
    async fn test_echo_keeps_content_type() {
        let response = client()
            .send_scope(
                purr_core::Scope::http("POST", "/echo").with_header("Content-Type", "text/csv"),
            )
            .await
            .unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.headers.get("content-type"), Some("text/csv"));
    }
}
