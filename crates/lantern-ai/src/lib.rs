//! Inference core for the Lantern sidebar.
//!
//! Provides:
//! - The engine capability traits (`EngineFactory`, `ChatEngine`)
//! - `InferenceSession`, the lifecycle and chat controller the sidebar drives
//! - A local OpenAI-compatible server engine with SSE streaming

pub mod engine;
pub mod local;
pub mod session;
pub mod streaming;

pub use engine::{
    ChatEngine, ChunkStream, CompletionChunk, CompletionRequest, EngineFactory, EngineOptions,
    InitProgressReport, ProgressCallback,
};
pub use local::{LocalServerConfig, LocalServerEngine, LocalServerFactory};
pub use session::{
    GenerationOutcome, GenerationParams, InferenceSession, InitFailure, LifecycleState,
    SendRejected, SessionSettings, SessionSnapshot,
};

/// One turn of a conversation.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

/// Failures reported by an engine, during construction or generation.
#[derive(Debug, thiserror::Error)]
pub enum AiError {
    #[error("api error: {0}")]
    ApiError(String),
    #[error("rate limited")]
    RateLimited,
    #[error("network error: {0}")]
    NetworkError(String),
    #[error("parse error: {0}")]
    ParseError(String),
    #[error("timeout")]
    Timeout,
}

impl AiError {
    /// The engine's own message, without the variant prefix. This is what
    /// the user sees when a failure is not recognized.
    pub fn message(&self) -> String {
        match self {
            AiError::ApiError(m) | AiError::NetworkError(m) | AiError::ParseError(m) => m.clone(),
            AiError::RateLimited => "rate limited by inference server".to_string(),
            AiError::Timeout => "network request timed out".to_string(),
        }
    }
}
