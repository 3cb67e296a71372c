//! Route paths.

// Browser page
pub const INDEX: &str = "/";
pub const LOGIN: &str = "/login";
pub const REGISTER: &str = "/register";
pub const LOGOUT: &str = "/logout";
pub const CHAT_SEND: &str = "/chat/send";
pub const CHAT_CLEAR: &str = "/chat/clear";

// JSON API
pub const API_AI: &str = "/api/ai";
pub const API_HEALTH: &str = "/api/health";
pub const API_MESSAGES: &str = "/api/messages";
pub const API_AUTH_LOGIN: &str = "/api/auth/login";
pub const API_AUTH_REGISTER: &str = "/api/auth/register";
pub const API_AUTH_REFRESH: &str = "/api/auth/refresh";
pub const API_AUTH_LOGOUT: &str = "/api/auth/logout";
pub const API_AUTH_ME: &str = "/api/auth/me";
