//! Local inference server connection settings.

use serde::{Deserialize, Serialize};

/// Where the OpenAI-compatible inference server is reachable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub base_url: String,
    /// Seconds (valid range: 1-120).
    pub connect_timeout_secs: u32,
    /// Seconds for a whole streamed reply (valid range: 5-3600).
    pub request_timeout_secs: u32,
    /// Bearer token for servers started with an API key. Never serialized.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".into(),
            connect_timeout_secs: 10,
            request_timeout_secs: 300,
            api_key: None,
        }
    }
}
