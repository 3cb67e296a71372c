//! # gemchat_api
//!
//! HTTP surface for Gemchat: the Gemini relay endpoint, the server-rendered
//! chat page, and the JSON message/auth API.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod views;

use axum::Router;
use axum::routing::{get, post};
use gemchat_core::gemini::GeminiClient;
use sqlx::PgPool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::ApiConfig;
use crate::handlers::{auth, health, messages, page, relay};

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL connection pool.
    pub pool: PgPool,
    /// API configuration.
    pub config: ApiConfig,
    /// Upstream model client, sharing one HTTP connection pool.
    pub gemini: GeminiClient,
}

impl AppState {
    pub fn new(pool: PgPool, config: ApiConfig) -> Self {
        let gemini = GeminiClient::new(config.gemini.clone());
        Self {
            pool,
            config,
            gemini,
        }
    }
}

/// Run embedded database migrations.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    gemchat_core::migrate::migrate(pool).await
}

/// Builds the Axum router with all routes and shared state.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Public routes; the page handlers resolve the cookie session themselves.
    let public = Router::new()
        .route(routes::INDEX, get(page::index_handler))
        .route(
            routes::LOGIN,
            get(page::login_page_handler).post(page::login_form_handler),
        )
        .route(routes::REGISTER, post(page::register_form_handler))
        .route(routes::LOGOUT, get(page::logout_handler))
        .route(routes::CHAT_SEND, post(page::send_handler))
        .route(routes::CHAT_CLEAR, post(page::clear_handler))
        .route(routes::API_AI, post(relay::relay_handler))
        .route(routes::API_HEALTH, get(health::health_handler))
        .route(routes::API_AUTH_LOGIN, post(auth::login_handler))
        .route(routes::API_AUTH_REGISTER, post(auth::register_handler))
        .route(routes::API_AUTH_REFRESH, post(auth::refresh_handler))
        .route(routes::API_AUTH_LOGOUT, post(auth::logout_handler));

    // Protected routes (require auth)
    let protected = Router::new()
        .route(
            routes::API_MESSAGES,
            get(messages::list_messages_handler)
                .post(messages::create_message_handler)
                .delete(messages::clear_messages_handler),
        )
        .route(routes::API_AUTH_ME, get(auth::me_handler))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_auth,
        ));

    Router::new()
        .merge(public)
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
