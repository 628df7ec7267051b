//! Remote API configuration.

use std::time::Duration;

/// Configuration for the REST backend.
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    /// Base URL of the API (e.g. `https://api.example.com`).
    pub base_url: String,
    /// Per-request timeout. `None` keeps the HTTP client default.
    pub timeout: Option<Duration>,
    /// Bearer token sent with every request.
    pub bearer_token: Option<String>,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5001".into(),
            timeout: None,
            bearer_token: None,
        }
    }
}
