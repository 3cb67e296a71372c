//! HTML views for the chat page, rendered with minijinja.

use gemchat_core::chat::PageView;
use minijinja::{Environment, context};

use crate::routes;

const BASE: &str = include_str!("../templates/base.html");
const CHAT: &str = include_str!("../templates/chat.html");
const LOGIN_PROMPT: &str = include_str!("../templates/login_prompt.html");
const LOGIN: &str = include_str!("../templates/login.html");

/// Template environment. `.html` names get HTML auto-escaping; route
/// constants are marked `safe` in the templates.
fn environment() -> Result<Environment<'static>, minijinja::Error> {
    let mut env = Environment::new();
    env.add_template("base.html", BASE)?;
    env.add_template("chat.html", CHAT)?;
    env.add_template("login_prompt.html", LOGIN_PROMPT)?;
    env.add_template("login.html", LOGIN)?;
    Ok(env)
}

/// Render the chat page, or the login prompt when there is no identity.
pub fn render_page(view: &PageView<'_>) -> Result<String, minijinja::Error> {
    let env = environment()?;
    match view {
        PageView::LoginPrompt => env
            .get_template("login_prompt.html")?
            .render(context! { login_url => routes::LOGIN }),
        PageView::Chat {
            greeting,
            entries,
            loading,
        } => env.get_template("chat.html")?.render(context! {
            greeting => greeting,
            entries => entries,
            loading => loading,
            send_url => routes::CHAT_SEND,
            clear_url => routes::CHAT_CLEAR,
            logout_url => routes::LOGOUT,
        }),
    }
}

/// Render the login/register page with an optional error line.
pub fn render_login(error: Option<&str>) -> Result<String, minijinja::Error> {
    environment()?.get_template("login.html")?.render(context! {
        error => error,
        login_url => routes::LOGIN,
        register_url => routes::REGISTER,
    })
}

#[cfg(test)]
mod tests {
    use gemchat_core::chat::{DeliveryState, TranscriptEntry};
    use gemchat_core::models::message::Role;

    use super::*;

    fn entry(role: Role, content: &str, state: DeliveryState) -> TranscriptEntry {
        TranscriptEntry {
            role,
            content: content.to_string(),
            state,
        }
    }

    #[test]
    fn login_prompt_has_link() {
        let html = render_page(&PageView::LoginPrompt).unwrap();
        assert!(html.contains("Please log in to use the chat"));
        assert!(html.contains(r#"href="/login""#));
        assert!(!html.contains("Clear My Chat"));
    }

    #[test]
    fn chat_lists_entries_in_order() {
        let entries = vec![
            entry(Role::User, "2+2?", DeliveryState::Confirmed),
            entry(Role::Assistant, "4", DeliveryState::Confirmed),
        ];
        let html = render_page(&PageView::Chat {
            greeting: "Hi, Ada".into(),
            entries: &entries,
            loading: false,
        })
        .unwrap();
        assert!(html.contains("Hi, Ada"));
        assert!(html.contains("Ask Gemini anything..."));
        assert!(html.contains("Clear My Chat"));
        assert!(html.contains(r#"id="typing" hidden"#));
        assert!(!html.contains("disabled>Send"));
        let q = html.find("2+2?").unwrap();
        let a = html.find("confirmed\">4").unwrap();
        assert!(q < a);
    }

    #[test]
    fn content_is_escaped() {
        let entries = vec![entry(
            Role::User,
            "<script>alert(1)</script>",
            DeliveryState::Confirmed,
        )];
        let html = render_page(&PageView::Chat {
            greeting: "Hi, <b>".into(),
            entries: &entries,
            loading: false,
        })
        .unwrap();
        assert!(!html.contains("<script>alert(1)</script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("Hi, <b>"));
    }

    #[test]
    fn failed_entries_are_marked() {
        let entries = vec![entry(
            Role::Assistant,
            "Error talking to Gemini API",
            DeliveryState::Failed,
        )];
        let html = render_page(&PageView::Chat {
            greeting: "Hi".into(),
            entries: &entries,
            loading: true,
        })
        .unwrap();
        assert!(html.contains("assistant failed"));
        assert!(html.contains("not saved"));
        assert!(!html.contains(r#"id="typing" hidden"#));
        assert!(html.contains(r#"id="send-button" disabled"#));
    }

    #[test]
    fn login_page_shows_error() {
        let html = render_login(Some("Invalid credentials")).unwrap();
        assert!(html.contains("Invalid credentials"));
        assert!(html.contains(r#"action="/register""#));
        assert!(!render_login(None).unwrap().contains(r#"class="error""#));
    }
}
