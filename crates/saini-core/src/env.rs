//! Environment variable handling.

use std::env;

/// Get an environment variable, returning None if not set or empty.
pub fn get_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.is_empty())
}

/// Get an environment variable with a default value.
pub fn get_var_or(name: &str, default: &str) -> String {
    get_var(name).unwrap_or_else(|| default.to_string())
}

/// Get an environment variable as a boolean.
pub fn get_bool(name: &str) -> bool {
    get_var(name)
        .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false)
}

/// Get an environment variable as a usize.
pub fn get_usize(name: &str) -> Option<usize> {
    get_var(name).and_then(|v| v.parse().ok())
}

/// Common environment variable names.
pub mod vars {
    /// API key for OpenAI (embeddings and replies).
    pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";

    /// Bearer token for a Titan-compatible embeddings endpoint.
    pub const SAINI_EMBEDDINGS_TOKEN: &str = "SAINI_EMBEDDINGS_TOKEN";

    /// Saini home directory override.
    pub const SAINI_HOME: &str = "SAINI_HOME";

    /// Saini config file override.
    pub const SAINI_CONFIG: &str = "SAINI_CONFIG";

    /// Default retrieval depth override.
    pub const SAINI_TOP_K: &str = "SAINI_TOP_K";

    /// Emit JSON logs.
    pub const SAINI_LOG_JSON: &str = "SAINI_LOG_JSON";
}
