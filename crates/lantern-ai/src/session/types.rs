//! Session state types, failure classification, and the generation guard.

use std::sync::Arc;

use serde::Serialize;

use crate::Message;

use super::controller::Shared;

/// Shown in the conversation when a reply fails mid-generation.
pub const GENERATION_FAILED_MESSAGE: &str = "Error generating response. Please try again.";

const NETWORK_KEYWORDS: [&str; 2] = ["Cache", "network"];
const PLATFORM_KEYWORDS: [&str; 2] = ["GPU", "WebGPU"];
const UNKNOWN_FALLBACK: &str = "Unknown error occurred.";

/// Coarse readiness of the inference engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    Uninitialized,
    Loading,
    Ready,
    Error,
}

/// Why engine construction failed, in user-facing terms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum InitFailure {
    #[error("Network error downloading model. Click retry to try again.")]
    NetworkOrCache,
    #[error("WebGPU not supported. Try using Chrome or Edge.")]
    UnsupportedPlatform,
    #[error("{0}")]
    Unknown(String),
}

impl InitFailure {
    /// Classify a construction failure by case-sensitive keyword match on
    /// its message. Network keywords win over platform keywords.
    pub fn classify(message: &str) -> Self {
        if NETWORK_KEYWORDS.iter().any(|k| message.contains(k)) {
            InitFailure::NetworkOrCache
        } else if PLATFORM_KEYWORDS.iter().any(|k| message.contains(k)) {
            InitFailure::UnsupportedPlatform
        } else if message.is_empty() {
            InitFailure::Unknown(UNKNOWN_FALLBACK.to_string())
        } else {
            InitFailure::Unknown(message.to_string())
        }
    }
}

/// Sampling settings applied to every completion request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub temperature: f64,
    pub max_tokens: u32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 1024,
        }
    }
}

/// What the presentation layer may read. Never contains the engine handle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub lifecycle: LifecycleState,
    pub progress_text: String,
    pub messages: Vec<Message>,
    pub generating: bool,
    pub error: Option<InitFailure>,
}

impl SessionSnapshot {
    pub fn is_ready(&self) -> bool {
        self.lifecycle == LifecycleState::Ready
    }

    pub fn is_loading(&self) -> bool {
        self.lifecycle == LifecycleState::Loading
    }

    /// The reply currently being streamed, if any.
    pub fn streaming_reply(&self) -> Option<&str> {
        if self.generating {
            self.messages.last().map(|m| m.content.as_str())
        } else {
            None
        }
    }
}

/// Why `send_message` refused to start a turn. The session is unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SendRejected {
    #[error("engine is not ready")]
    NotReady,
    #[error("a reply is already being generated")]
    Busy,
    #[error("prompt is empty")]
    EmptyPrompt,
}

/// How an accepted turn ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationOutcome {
    Completed,
    /// The failure message was written into the conversation.
    Failed,
}

/// Holds the `generating` reservation for one turn.
///
/// Dropping the guard (including when the `send_message` future is
/// cancelled) clears `generating` and republishes the snapshot.
pub(crate) struct GeneratingGuard {
    shared: Arc<Shared>,
    released: bool,
}

impl GeneratingGuard {
    pub(crate) fn new(shared: Arc<Shared>) -> Self {
        Self {
            shared,
            released: false,
        }
    }

    /// Apply a final mutation and release the reservation in one snapshot.
    pub(crate) fn release_with(mut self, f: impl FnOnce(&mut super::controller::SessionState)) {
        self.released = true;
        self.shared.update(|state| {
            f(state);
            state.generating = false;
        });
    }
}

impl Drop for GeneratingGuard {
    fn drop(&mut self) {
        if !self.released {
            self.shared.update(|state| state.generating = false);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_and_cache_keywords() {
        assert_eq!(
            InitFailure::classify("network error: connection refused"),
            InitFailure::NetworkOrCache
        );
        assert_eq!(
            InitFailure::classify("Cache.add() encountered a network error"),
            InitFailure::NetworkOrCache
        );
    }

    #[test]
    fn gpu_keywords() {
        assert_eq!(
            InitFailure::classify("GPU context lost"),
            InitFailure::UnsupportedPlatform
        );
        assert_eq!(
            InitFailure::classify("WebGPU is not available"),
            InitFailure::UnsupportedPlatform
        );
    }

    #[test]
    fn matching_is_case_sensitive() {
        assert_eq!(
            InitFailure::classify("Network unreachable"),
            InitFailure::Unknown("Network unreachable".into())
        );
        assert_eq!(
            InitFailure::classify("gpu missing"),
            InitFailure::Unknown("gpu missing".into())
        );
    }

    #[test]
    fn network_wins_over_gpu() {
        assert_eq!(
            InitFailure::classify("GPU weights fetch hit a network timeout"),
            InitFailure::NetworkOrCache
        );
    }

    #[test]
    fn unknown_keeps_raw_message() {
        let failure = InitFailure::classify("model c is not served by this engine");
        assert_eq!(failure.to_string(), "model c is not served by this engine");
    }

    #[test]
    fn empty_message_gets_fallback_text() {
        assert_eq!(InitFailure::classify("").to_string(), "Unknown error occurred.");
    }

    #[test]
    fn whitespace_message_is_kept_verbatim() {
        assert_eq!(InitFailure::classify("  "), InitFailure::Unknown("  ".into()));
    }

    #[test]
    fn display_texts() {
        assert_eq!(
            InitFailure::NetworkOrCache.to_string(),
            "Network error downloading model. Click retry to try again."
        );
        assert_eq!(
            InitFailure::UnsupportedPlatform.to_string(),
            "WebGPU not supported. Try using Chrome or Edge."
        );
    }

    #[test]
    fn failure_serializes_with_kind_tag() {
        let json = serde_json::to_value(InitFailure::Unknown("boom".into())).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "unknown", "message": "boom"}));
    }

    #[test]
    fn streaming_reply_only_while_generating() {
        let mut snapshot = SessionSnapshot {
            lifecycle: LifecycleState::Ready,
            progress_text: String::new(),
            messages: vec![Message::user("hi"), Message::assistant("Hel")],
            generating: true,
            error: None,
        };
        assert_eq!(snapshot.streaming_reply(), Some("Hel"));
        snapshot.generating = false;
        assert_eq!(snapshot.streaming_reply(), None);
    }
}
