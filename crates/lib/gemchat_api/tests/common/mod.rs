//! Shared helpers for router tests.

#![allow(dead_code)]

use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, header};
use gemchat_api::{AppState, config::ApiConfig};
use gemchat_core::gemini::GeminiConfig;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;

pub const JWT_SECRET: &str = "test-secret";

pub fn config(gemini_base_url: &str, pg_connection_url: &str) -> ApiConfig {
    ApiConfig {
        bind_addr: "127.0.0.1:0".into(),
        pg_connection_url: pg_connection_url.into(),
        jwt_secret: JWT_SECRET.into(),
        secure_cookies: false,
        gemini: GeminiConfig {
            api_key: Some("test-key".into()),
            base_url: gemini_base_url.into(),
            ..GeminiConfig::default()
        },
    }
}

/// Router over a pool that never connects; for routes that stay off the database.
pub fn app_without_db(gemini_base_url: &str) -> Router {
    let url = "postgres://localhost:1/unreachable";
    let pool = PgPoolOptions::new()
        .acquire_timeout(Duration::from_millis(200))
        .connect_lazy(url)
        .expect("lazy pool");
    gemchat_api::router(AppState::new(pool, config(gemini_base_url, url)))
}

pub fn app_with_pool(pool: PgPool, gemini_base_url: &str, pg_connection_url: &str) -> Router {
    gemchat_api::router(AppState::new(
        pool,
        config(gemini_base_url, pg_connection_url),
    ))
}

pub async fn send(app: &Router, req: Request<Body>) -> Response<Body> {
    app.clone().oneshot(req).await.expect("request")
}

pub async fn body_string(resp: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("read body");
    String::from_utf8(bytes.to_vec()).expect("utf-8 body")
}

pub async fn body_json(resp: Response<Body>) -> serde_json::Value {
    serde_json::from_str(&body_string(resp).await).expect("parse JSON")
}

pub fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn form_request(uri: &str, body: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

/// `name=value` pairs of every non-empty `Set-Cookie`, joined for a `Cookie` header.
pub fn cookie_header<B>(resp: &Response<B>) -> String {
    resp.headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| v.split(';').next())
        .filter(|pair| !pair.ends_with('='))
        .collect::<Vec<_>>()
        .join("; ")
}
