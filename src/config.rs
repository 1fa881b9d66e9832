/// Application-level constants
pub const APP_NAME: &str = "docuchat";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment variable holding the Gemini API key.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Base URL of the hosted Gemini service.
pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Model used for document-grounded answering.
pub const GEMINI_MODEL: &str = "gemini-3-pro-preview";

/// Low temperature keeps answers close to the document text.
pub const TEMPERATURE: f64 = 0.2;

/// Internal reasoning budget requested per generation, in tokens.
pub const THINKING_BUDGET: u32 = 2048;

/// Per-request HTTP timeout.
pub const REQUEST_TIMEOUT_SECS: u64 = 120;

/// Default tracing filter when RUST_LOG is not set.
pub fn default_log_filter() -> &'static str {
    "docuchat=info"
}

/// Read the Gemini API key from the process environment.
/// Returns `None` when unset or empty.
pub fn api_key() -> Option<String> {
    std::env::var(API_KEY_ENV).ok().filter(|k| !k.is_empty())
}
