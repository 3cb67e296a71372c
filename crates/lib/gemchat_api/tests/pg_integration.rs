//! End-to-end tests against an ephemeral PostgreSQL instance.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use gemchat_core::db::DbManager;
use httpmock::prelude::*;
use serde_json::json;

use common::{
    app_with_pool, body_json, body_string, cookie_header, form_request, json_request, send,
};

const GEMINI_PATH: &str = "/v1beta/models/gemini-1.5-flash:generateContent";

async fn start_db() -> (DbManager, sqlx::PgPool) {
    let mut db = DbManager::ephemeral().await.expect("DbManager::ephemeral");
    db.setup().await.expect("db setup");
    db.start().await.expect("db start");
    let pool = sqlx::PgPool::connect(&db.connection_url())
        .await
        .expect("connect to ephemeral PG");
    gemchat_api::migrate(&pool).await.expect("migrate");
    (db, pool)
}

fn bearer(uri: &str, method: &str, token: &str, body: Option<serde_json::Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"));
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

#[tokio::test]
#[ignore = "requires PostgreSQL binaries on PATH"]
async fn auth_and_message_api_round_trip() {
    let (mut db, pool) = start_db().await;
    let app = app_with_pool(pool.clone(), "http://127.0.0.1:1", &db.connection_url());

    let resp = send(
        &app,
        json_request(
            "POST",
            "/api/auth/register",
            json!({"email": "Ada@Example.com", "password": "correct-horse", "name": "Ada"}),
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let tokens = body_json(resp).await;
    assert_eq!(tokens["user"]["email"], "ada@example.com");
    let access = tokens["accessToken"].as_str().unwrap().to_string();
    let refresh = tokens["refreshToken"].as_str().unwrap().to_string();

    // Duplicate registration is rejected.
    let resp = send(
        &app,
        json_request(
            "POST",
            "/api/auth/register",
            json!({"email": "ada@example.com", "password": "another-pass"}),
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // Wrong password and unknown email look the same.
    for body in [
        json!({"email": "ada@example.com", "password": "wrong-pass"}),
        json!({"email": "nobody@example.com", "password": "wrong-pass"}),
    ] {
        let resp = send(&app, json_request("POST", "/api/auth/login", body)).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(resp).await["message"], "Invalid credentials");
    }

    let resp = send(&app, bearer("/api/auth/me", "GET", &access, None)).await;
    assert_eq!(body_json(resp).await["name"], "Ada");

    for (role, content) in [("user", "2+2?"), ("assistant", "4")] {
        let resp = send(
            &app,
            bearer(
                "/api/messages",
                "POST",
                &access,
                Some(json!({"role": role, "content": content})),
            ),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::CREATED);
    }

    let resp = send(&app, bearer("/api/messages", "GET", &access, None)).await;
    let list = body_json(resp).await;
    let messages = list["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["role"], "user");
    assert_eq!(messages[1]["role"], "assistant");
    assert_eq!(messages[1]["content"], "4");

    // Refresh tokens rotate and are single-use.
    let resp = send(
        &app,
        json_request("POST", "/api/auth/refresh", json!({"refreshToken": refresh})),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let resp = send(
        &app,
        json_request("POST", "/api/auth/refresh", json!({"refreshToken": refresh})),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = send(&app, bearer("/api/messages", "DELETE", &access, None)).await;
    assert_eq!(body_json(resp).await, json!({"deleted": 2}));

    pool.close().await;
    db.stop().await.expect("db stop");
}

#[tokio::test]
#[ignore = "requires PostgreSQL binaries on PATH"]
async fn page_turn_persists_both_messages() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path(GEMINI_PATH);
            then.status(200).json_body(json!({
                "candidates": [{"content": {"parts": [{"text": "4"}]}}]
            }));
        })
        .await;

    let (mut db, pool) = start_db().await;
    let app = app_with_pool(pool.clone(), &server.base_url(), &db.connection_url());

    let resp = send(
        &app,
        form_request(
            "/register",
            "email=grace%40example.com&password=correct-horse&name=Grace",
            None,
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    let cookies = cookie_header(&resp);
    assert!(cookies.contains("gemchat_access="));

    let resp = send(&app, form_request("/chat/send", "message=2%2B2%3F", Some(&cookies))).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);

    let req = Request::builder()
        .uri("/")
        .header(header::COOKIE, &cookies)
        .body(Body::empty())
        .unwrap();
    let html = body_string(send(&app, req).await).await;
    assert!(html.contains("Hi, Grace"));
    assert!(html.contains("2+2?"));
    assert!(html.contains("confirmed\">4"));

    let stored = gemchat_core::messages::list_messages(&pool, "grace@example.com")
        .await
        .unwrap();
    assert_eq!(stored.len(), 2);

    let resp = send(&app, form_request("/chat/clear", "", Some(&cookies))).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    let stored = gemchat_core::messages::list_messages(&pool, "grace@example.com")
        .await
        .unwrap();
    assert!(stored.is_empty());

    pool.close().await;
    db.stop().await.expect("db stop");
}

#[tokio::test]
#[ignore = "requires PostgreSQL binaries on PATH"]
async fn unknown_refresh_cookie_is_cleared() {
    let (mut db, pool) = start_db().await;
    let app = app_with_pool(pool.clone(), "http://127.0.0.1:1", &db.connection_url());

    let req = Request::builder()
        .uri("/")
        .header(header::COOKIE, "gemchat_refresh=not-a-real-token")
        .body(Body::empty())
        .unwrap();
    let resp = send(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let cleared: Vec<_> = resp
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(str::to_string)
        .collect();
    assert!(cleared.iter().any(|c| c.starts_with("gemchat_access=;")));
    assert!(cleared.iter().any(|c| c.starts_with("gemchat_refresh=;")));
    assert!(cookie_header(&resp).is_empty());

    pool.close().await;
    db.stop().await.expect("db stop");
}
