//! Application-wide constants.
//!
//! Centralizes fixed hosts, URL templates, storage keys, triage keyword
//! lists and configuration defaults.

use std::path::PathBuf;

// ── Navigation ────────────────────────────────────────────────────
/// Base address of the external proxy. Resolved URLs are appended as a
/// single percent-encoded path segment.
pub const DEFAULT_PROXY_BASE: &str = "https://proxy.cloakgate.net";
/// Search engine used when input is not a URL.
pub const DEFAULT_SEARCH_BASE: &str = "https://www.google.com";
/// Path and query prefix appended to the search base.
pub const SEARCH_PATH: &str = "/search?q=";
/// Title used when a URL cannot be parsed.
pub const FALLBACK_TITLE: &str = "Web Page";
/// Category attached to records created from a search rewrite.
pub const SEARCH_CATEGORY: &str = "search";

// ── Storage Keys ──────────────────────────────────────────────────
/// Key holding the navigation history log.
pub const HISTORY_KEY: &str = "history";
/// Key holding the settings object.
pub const SETTINGS_KEY: &str = "settings";
/// Key holding the cloak profile.
pub const CLOAK_KEY: &str = "cloak";

// ── Cloak Defaults ────────────────────────────────────────────────
/// Title shown when no cloak is active.
pub const DEFAULT_CLOAK_TITLE: &str = "Cloakgate";
/// Icon type shown when no cloak is active.
pub const DEFAULT_CLOAK_ICON: &str = "default";

// ── Support Triage ────────────────────────────────────────────────
/// User message length (chars) above which a turn is escalated.
pub const ESCALATION_MESSAGE_LEN: usize = 200;
/// Phrases in a user message that indicate an issue a human should handle.
pub const COMPLEX_ISSUE_KEYWORDS: &[&str] = &[
    "bug",
    "refund",
    "billing",
    "charged twice",
    "payment failed",
    "cancel subscription",
    "account locked",
    "hacked",
    "speak to human",
    "talk to a human",
    "real person",
    "speak to a manager",
];
/// Phrases in an assistant reply that indicate it could not help.
pub const UNCERTAINTY_MARKERS: &[&str] = &[
    "i don't know",
    "i'm not sure",
    "i am not sure",
    "human agent",
    "cannot assist",
    "can't assist",
    "unable to help",
    "contact support",
];

// ── AI / Chat Provider ────────────────────────────────────────────
/// Chat completion API base URL (OpenAI-compatible).
pub const DEFAULT_AI_BASE_URL: &str = "https://api.openai.com/v1";
/// Chat model identifier.
pub const DEFAULT_AI_MODEL: &str = "gpt-3.5-turbo";
/// Maximum tokens for chat replies.
pub const DEFAULT_AI_MAX_TOKENS: u32 = 500;
/// Upper bound accepted from config for max tokens.
pub const MAX_AI_MAX_TOKENS: u32 = 4096;
/// Sampling temperature for chat replies.
pub const DEFAULT_AI_TEMPERATURE: f32 = 0.7;
/// Environment variable carrying the chat provider API key.
pub const AI_API_KEY_ENV: &str = "OPENAI_API_KEY";
/// Reply used when the provider returns no content.
pub const CHAT_FALLBACK_REPLY: &str =
    "Sorry, I couldn't come up with an answer to that. Please try rephrasing your question.";
/// Maximum provider error body length kept in error messages.
pub const PROVIDER_ERROR_BODY_LEN: usize = 300;
/// Column width used when printing chat replies.
pub const CHAT_WRAP_WIDTH: usize = 80;
/// System turn synthesized at the start of every support request.
pub const SUPPORT_SYSTEM_PROMPT: &str = "You are the support assistant for Cloakgate, a web unblocker. \
Help users with navigating through the proxy, search, browsing history, tab cloaking and settings. \
Keep answers short and practical. If an issue involves billing, account security or a bug you \
cannot resolve, say that a human agent will follow up.";

// ── Paths ─────────────────────────────────────────────────────────

/// Returns the user's home directory, falling back to /tmp.
pub fn home_dir() -> PathBuf {
    PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string()))
}

/// Returns `~/.config/cloakgate/`.
pub fn config_dir() -> PathBuf {
    home_dir().join(".config").join("cloakgate")
}

/// Returns `~/.config/cloakgate/config.toml`.
pub fn config_file_path() -> PathBuf {
    config_dir().join("config.toml")
}

/// Returns `~/.config/cloakgate/.env` (API key, never committed).
pub fn env_file_path() -> PathBuf {
    config_dir().join(".env")
}

/// Returns `~/.local/share/cloakgate/`.
pub fn data_dir() -> PathBuf {
    home_dir().join(".local").join("share").join("cloakgate")
}

/// Returns `~/.local/share/cloakgate/state.db`.
pub fn database_path() -> PathBuf {
    data_dir().join("state.db")
}
