//! Wiring from loaded config to a ready-to-initialize session.

use std::sync::Arc;
use std::time::Duration;

use lantern_ai::{
    GenerationParams, InferenceSession, LocalServerConfig, LocalServerFactory, SessionSettings,
};
use lantern_config::schema::{AiConfig, EngineConfig};
use lantern_config::LanternConfig;

pub fn server_config(engine: &EngineConfig) -> LocalServerConfig {
    let mut server = LocalServerConfig::new(&engine.base_url)
        .with_connect_timeout(Duration::from_secs(u64::from(engine.connect_timeout_secs)))
        .with_request_timeout(Duration::from_secs(u64::from(engine.request_timeout_secs)));
    if let Some(ref key) = engine.api_key {
        server = server.with_api_key(key);
    }
    server
}

pub fn session_settings(ai: &AiConfig) -> SessionSettings {
    let settings = SessionSettings::new(&ai.model_id)
        .with_engine_log_level(&ai.engine_log_level)
        .with_params(GenerationParams {
            temperature: ai.temperature,
            max_tokens: ai.max_tokens,
        });
    match ai.system_prompt {
        Some(ref prompt) if !prompt.trim().is_empty() => settings.with_system_prompt(prompt),
        _ => settings,
    }
}

/// Build the session the sidebar drives. Nothing is loaded yet.
pub fn build_session(config: &LanternConfig) -> InferenceSession {
    let factory = LocalServerFactory::new(server_config(&config.engine));
    InferenceSession::new(Arc::new(factory), session_settings(&config.ai))
}
