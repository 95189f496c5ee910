//! Streaming chat turns for InferenceSession.

use std::sync::Arc;

use futures_util::StreamExt;
use tracing::{debug, warn};

use crate::{AiError, ChatEngine, CompletionRequest, Message};

use super::controller::InferenceSession;
use super::types::{GeneratingGuard, GenerationOutcome, LifecycleState, SendRejected};

impl InferenceSession {
    /// Send a user prompt and stream the assistant's reply into the session.
    ///
    /// Before the request goes out the session gains a user turn and an
    /// empty assistant turn. Every chunk is appended to that assistant turn
    /// and republished immediately. A failed generation writes a fixed
    /// message into the conversation and returns
    /// [`GenerationOutcome::Failed`]; it never changes the lifecycle.
    ///
    /// Rejected calls (no engine, a reply already streaming, blank prompt)
    /// leave the session untouched.
    pub async fn send_message(
        &self,
        text: impl Into<String>,
    ) -> Result<GenerationOutcome, SendRejected> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(SendRejected::EmptyPrompt);
        }

        let (engine, history) = self.begin_turn(text)?;
        let guard = GeneratingGuard::new(self.shared.clone());

        let request = CompletionRequest {
            messages: history,
            stream: true,
            temperature: self.shared.settings.params.temperature,
            max_tokens: self.shared.settings.params.max_tokens,
        };

        match self.stream_reply(engine.as_ref(), request).await {
            Ok(chunks) => {
                debug!(session = %self.shared.id.short(), chunks, "reply complete");
                guard.release_with(|_| {});
                Ok(GenerationOutcome::Completed)
            }
            Err(e) => {
                warn!(session = %self.shared.id.short(), error = %e, "generation failed");
                guard.release_with(|state| state.record_generation_failure());
                Ok(GenerationOutcome::Failed)
            }
        }
    }

    /// Reserve `generating` and append the user and placeholder turns in a
    /// single state update. Returns the engine and the history to send,
    /// which ends with the new user turn.
    fn begin_turn(
        &self,
        text: String,
    ) -> Result<(Arc<dyn ChatEngine>, Vec<Message>), SendRejected> {
        self.shared.try_update(|state| {
            let engine = match (&state.engine, state.lifecycle) {
                (Some(engine), LifecycleState::Ready) => engine.clone(),
                _ => return Err(SendRejected::NotReady),
            };
            if state.generating {
                return Err(SendRejected::Busy);
            }

            state.messages.push(Message::user(text));
            let history = state.messages.clone();
            state.messages.push(Message::assistant(""));
            state.generating = true;
            Ok((engine, history))
        })
    }

    /// Drive the chunk stream to completion, applying chunks in arrival
    /// order. Returns the number of chunks applied.
    async fn stream_reply(
        &self,
        engine: &dyn ChatEngine,
        request: CompletionRequest,
    ) -> Result<usize, AiError> {
        let mut stream = engine.stream_completion(request).await?;
        let mut applied = 0;

        while let Some(item) = stream.next().await {
            let chunk = item?;
            if !chunk.delta.is_empty() {
                self.shared.append_reply(&chunk.delta);
                applied += 1;
            }
            if let Some(reason) = chunk.finish_reason {
                debug!(session = %self.shared.id.short(), %reason, "engine finished reply");
            }
        }
        Ok(applied)
    }
}
