//! Server-rendered chat page and its login/logout forms.
//!
//! Every request rebuilds a [`ChatPage`] for the cookie identity, loads its
//! history and runs one operation on it. Successful writes redirect back to
//! `/`; a turn with an unsaved entry is rendered directly so the failure
//! stays visible.

use axum::Form;
use axum::extract::{Query, State};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum_extra::extract::CookieJar;
use gemchat_core::chat::{ChatPage, SendOutcome};
use gemchat_core::messages::PgMessageStore;
use gemchat_core::models::auth::Identity;
use serde::Deserialize;
use tracing::{error, info};

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::routes;
use crate::services::cookies::REFRESH_COOKIE;
use crate::services::{auth, session};
use crate::views;

#[derive(Debug, Deserialize)]
pub struct LoginPageQuery {
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SendForm {
    #[serde(default)]
    pub message: String,
}

/// Page for `identity` with its stored history. A failed load is logged by
/// the page and renders an empty transcript.
async fn loaded_page(state: &AppState, identity: Option<Identity>) -> (ChatPage, PgMessageStore) {
    let store = PgMessageStore::new(state.pool.clone());
    let mut page = ChatPage::new(identity);
    let _ = page.load(&store).await;
    (page, store)
}

fn render(page: &ChatPage) -> AppResult<Html<String>> {
    Ok(Html(views::render_page(&page.view())?))
}

/// Message shown on the login page for a failed form submission.
fn form_error(e: &AppError) -> String {
    match e {
        AppError::Validation(m) | AppError::Unauthorized(m) | AppError::NotFound(m) => m.clone(),
        AppError::Internal(detail) => {
            error!(error = %detail, "login form failed");
            "Something went wrong, please try again".to_string()
        }
    }
}

fn login_redirect_with_error(e: &AppError) -> Redirect {
    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("error", &form_error(e))
        .finish();
    Redirect::to(&format!("{}?{query}", routes::LOGIN))
}

/// `GET /` — the chat page, or the login prompt without a session.
pub async fn index_handler(
    State(state): State<AppState>,
    jar: CookieJar,
) -> AppResult<(CookieJar, Html<String>)> {
    let (identity, jar) = session::resolve(&state, jar).await;
    let (page, _) = loaded_page(&state, identity).await;
    Ok((jar, render(&page)?))
}

/// `POST /chat/send` — run one turn with the submitted message.
pub async fn send_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<SendForm>,
) -> AppResult<Response> {
    let (identity, jar) = session::resolve(&state, jar).await;
    if identity.is_none() {
        return Ok((jar, Redirect::to(routes::INDEX)).into_response());
    }

    let (mut page, store) = loaded_page(&state, identity).await;
    page.set_input(form.message);
    let outcome = page.send(&store, &state.gemini).await;

    match outcome {
        SendOutcome::Ignored
        | SendOutcome::Completed {
            user_saved: true,
            reply_saved: true,
        } => Ok((jar, Redirect::to(routes::INDEX)).into_response()),
        _ => Ok((jar, render(&page)?).into_response()),
    }
}

/// `POST /chat/clear` — delete the caller's history.
pub async fn clear_handler(State(state): State<AppState>, jar: CookieJar) -> Response {
    let (identity, jar) = session::resolve(&state, jar).await;
    if identity.is_some() {
        let store = PgMessageStore::new(state.pool.clone());
        let mut page = ChatPage::new(identity);
        // Failures are logged by the page; the reload shows what is left.
        let _ = page.clear(&store).await;
    }
    (jar, Redirect::to(routes::INDEX)).into_response()
}

/// `GET /login` — login and registration forms.
pub async fn login_page_handler(Query(query): Query<LoginPageQuery>) -> AppResult<Html<String>> {
    Ok(Html(views::render_login(query.error.as_deref())?))
}

/// `POST /login` — form login; sets the session cookies.
pub async fn login_form_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Response {
    match auth::login(
        &state.pool,
        &form.email,
        &form.password,
        state.config.jwt_secret.as_bytes(),
    )
    .await
    {
        Ok(tokens) => {
            info!(email = %tokens.user.email, "signed in");
            let jar = session::with_tokens(jar, &tokens, state.config.secure_cookies);
            (jar, Redirect::to(routes::INDEX)).into_response()
        }
        Err(e) => login_redirect_with_error(&e).into_response(),
    }
}

/// `POST /register` — form registration; signs the new account in.
pub async fn register_form_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<RegisterForm>,
) -> Response {
    match auth::register(
        &state.pool,
        &form.email,
        &form.password,
        form.name.as_deref(),
        state.config.jwt_secret.as_bytes(),
    )
    .await
    {
        Ok(tokens) => {
            let jar = session::with_tokens(jar, &tokens, state.config.secure_cookies);
            (jar, Redirect::to(routes::INDEX)).into_response()
        }
        Err(e) => login_redirect_with_error(&e).into_response(),
    }
}

/// `GET /logout` — revoke the refresh token and drop the cookies.
pub async fn logout_handler(State(state): State<AppState>, jar: CookieJar) -> Response {
    let refresh_token = jar.get(REFRESH_COOKIE).map(|c| c.value().to_string());
    if let Err(e) = auth::logout(&state.pool, refresh_token.as_deref()).await {
        error!(error = %e, "failed to revoke refresh token");
    }
    let jar = session::without_tokens(jar, state.config.secure_cookies);
    (jar, Redirect::to(routes::INDEX)).into_response()
}
