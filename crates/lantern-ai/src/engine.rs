//! Engine capability boundary.
//!
//! The inference engine is opaque: the sidebar only needs to construct one
//! for a model and then ask it for streamed completions. Both steps are
//! traits so a local server, an embedded runtime, or a test double can sit
//! behind the same controller.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream::BoxStream;

use crate::{AiError, Message};

/// One milestone reported while an engine is being constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct InitProgressReport {
    /// Fraction complete in `[0.0, 1.0]`.
    pub progress: f64,
    /// Human-readable description shown in the sidebar.
    pub text: String,
    /// Time since construction started.
    pub elapsed: Duration,
}

/// Receives construction milestones in the order the engine reports them.
pub type ProgressCallback = Arc<dyn Fn(InitProgressReport) + Send + Sync>;

/// Options passed to [`EngineFactory::create_engine`].
#[derive(Clone)]
pub struct EngineOptions {
    pub progress: ProgressCallback,
    pub log_level: String,
}

impl std::fmt::Debug for EngineOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineOptions")
            .field("progress", &"<callback>")
            .field("log_level", &self.log_level)
            .finish()
    }
}

/// A chat completion request over the full conversation history.
#[derive(Debug, Clone, serde::Serialize)]
pub struct CompletionRequest {
    pub messages: Vec<Message>,
    pub stream: bool,
    pub temperature: f64,
    pub max_tokens: u32,
}

/// One incremental fragment of generated text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletionChunk {
    pub delta: String,
    /// Set on the final chunk when the engine reports why it stopped.
    pub finish_reason: Option<String>,
}

impl CompletionChunk {
    pub fn text(delta: impl Into<String>) -> Self {
        Self {
            delta: delta.into(),
            finish_reason: None,
        }
    }
}

/// Lazy, finite, non-restartable sequence of chunks. An `Err` item ends
/// the generation.
pub type ChunkStream = BoxStream<'static, Result<CompletionChunk, AiError>>;

/// A constructed, ready-to-use engine.
#[async_trait]
pub trait ChatEngine: Send + Sync {
    async fn stream_completion(&self, request: CompletionRequest) -> Result<ChunkStream, AiError>;
}

/// Builds engines for a model identifier.
#[async_trait]
pub trait EngineFactory: Send + Sync {
    async fn create_engine(
        &self,
        model_id: &str,
        options: EngineOptions,
    ) -> Result<Arc<dyn ChatEngine>, AiError>;
}
