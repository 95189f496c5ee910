//! Assistant and generation settings.

use serde::{Deserialize, Serialize};

/// Model the sidebar loads when no override is given.
pub const DEFAULT_MODEL_ID: &str = "Qwen2-0.5B-Instruct-q4f16_1-MLC";

/// Sampling and model selection for the sidebar assistant.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    /// Model identifier handed to the engine at construction time.
    pub model_id: String,
    /// Sampling randomness (valid range: 0.0-2.0).
    pub temperature: f64,
    /// Hard cap on generated length per reply (valid range: 1-32768).
    pub max_tokens: u32,
    /// Log level string forwarded to the engine.
    pub engine_log_level: String,
    /// Seeded as the first turn of every conversation when set.
    pub system_prompt: Option<String>,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            model_id: DEFAULT_MODEL_ID.into(),
            temperature: 0.7,
            max_tokens: 1024,
            engine_log_level: "INFO".into(),
            system_prompt: None,
        }
    }
}
