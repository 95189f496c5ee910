//! InferenceSession struct, engine lifecycle, and snapshot publishing.

use std::sync::{Arc, Mutex, PoisonError, Weak};

use lantern_common::SessionId;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::{ChatEngine, EngineFactory, EngineOptions, InitProgressReport, Message, Role};

use super::types::{
    GenerationParams, InitFailure, LifecycleState, SessionSnapshot, GENERATION_FAILED_MESSAGE,
};

/// Everything the controller needs besides the engine factory.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub model_id: String,
    pub engine_log_level: String,
    pub params: GenerationParams,
    pub system_prompt: Option<String>,
}

impl SessionSettings {
    pub fn new(model_id: impl Into<String>) -> Self {
        Self {
            model_id: model_id.into(),
            engine_log_level: "INFO".to_string(),
            params: GenerationParams::default(),
            system_prompt: None,
        }
    }

    pub fn with_params(mut self, params: GenerationParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_engine_log_level(mut self, level: impl Into<String>) -> Self {
        self.engine_log_level = level.into();
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }
}

/// Mutable session state. Only touched through [`Shared::update`].
pub(crate) struct SessionState {
    pub(crate) lifecycle: LifecycleState,
    pub(crate) engine: Option<Arc<dyn ChatEngine>>,
    pub(crate) messages: Vec<Message>,
    pub(crate) error: Option<InitFailure>,
    pub(crate) progress_text: String,
    pub(crate) generating: bool,
}

impl SessionState {
    pub(crate) fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            lifecycle: self.lifecycle,
            progress_text: self.progress_text.clone(),
            messages: self.messages.clone(),
            generating: self.generating,
            error: self.error.clone(),
        }
    }

    /// Append streamed text to the trailing assistant turn. Returns false
    /// when there is no such turn.
    pub(crate) fn append_to_reply(&mut self, delta: &str) -> bool {
        match self.messages.last_mut() {
            Some(last) if last.role == Role::Assistant => {
                last.content.push_str(delta);
                true
            }
            _ => false,
        }
    }

    /// Write the failure message into the conversation.
    ///
    /// An empty placeholder is overwritten; partial output is kept and the
    /// message follows it as its own turn.
    pub(crate) fn record_generation_failure(&mut self) {
        match self.messages.last_mut() {
            Some(last) if last.role == Role::Assistant && last.content.is_empty() => {
                last.content.push_str(GENERATION_FAILED_MESSAGE);
            }
            _ => self
                .messages
                .push(Message::assistant(GENERATION_FAILED_MESSAGE)),
        }
    }
}

pub(crate) struct Shared {
    pub(crate) id: SessionId,
    pub(crate) factory: Arc<dyn EngineFactory>,
    pub(crate) settings: SessionSettings,
    state: Mutex<SessionState>,
    snapshot_tx: watch::Sender<SessionSnapshot>,
}

impl Shared {
    /// Mutate state and publish the resulting snapshot under the same lock,
    /// so subscribers see mutations in order and never half-applied.
    pub(crate) fn update<R>(&self, f: impl FnOnce(&mut SessionState) -> R) -> R {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let result = f(&mut state);
        self.snapshot_tx.send_replace(state.snapshot());
        result
    }

    /// Apply one streamed chunk.
    ///
    /// The published snapshot already mirrors the state, so it is patched
    /// in place rather than rebuilt; a chunk costs its own length, not the
    /// length of the conversation.
    pub(crate) fn append_reply(&self, delta: &str) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.append_to_reply(delta) {
            self.snapshot_tx.send_modify(|snapshot| {
                if let Some(last) = snapshot.messages.last_mut() {
                    last.content.push_str(delta);
                }
            });
        }
    }

    /// Like [`update`](Self::update), but publishes only when `f` succeeds.
    pub(crate) fn try_update<T, E>(
        &self,
        f: impl FnOnce(&mut SessionState) -> Result<T, E>,
    ) -> Result<T, E> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let result = f(&mut state)?;
        self.snapshot_tx.send_replace(state.snapshot());
        Ok(result)
    }
}

/// Returns a session stuck in `Loading` to `Uninitialized` if the
/// initializing future is dropped before construction finishes.
struct LoadingGuard<'a> {
    shared: &'a Shared,
    armed: bool,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            warn!(session = %self.shared.id.short(), "engine construction abandoned");
            self.shared.update(|state| {
                if state.lifecycle == LifecycleState::Loading {
                    state.lifecycle = LifecycleState::Uninitialized;
                }
            });
        }
    }
}

/// Mediates between the sidebar UI and an inference engine.
///
/// Owns the engine lifecycle, the conversation, and per-turn generation
/// state. Cloning yields another handle to the same session. The engine
/// handle itself never leaves the controller; the presentation layer reads
/// [`SessionSnapshot`]s and calls the operations below.
#[derive(Clone)]
pub struct InferenceSession {
    pub(crate) shared: Arc<Shared>,
}

impl InferenceSession {
    pub fn new(factory: Arc<dyn EngineFactory>, settings: SessionSettings) -> Self {
        let messages = settings
            .system_prompt
            .iter()
            .map(|prompt| Message::system(prompt.clone()))
            .collect();
        let state = SessionState {
            lifecycle: LifecycleState::Uninitialized,
            engine: None,
            messages,
            error: None,
            progress_text: String::new(),
            generating: false,
        };
        let (snapshot_tx, _) = watch::channel(state.snapshot());

        Self {
            shared: Arc::new(Shared {
                id: SessionId::new(),
                factory,
                settings,
                state: Mutex::new(state),
                snapshot_tx,
            }),
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.shared.id
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.shared.settings
    }

    /// Current state.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.shared.snapshot_tx.borrow().clone()
    }

    /// Receive every republished snapshot (progress, chunks, transitions).
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.shared.snapshot_tx.subscribe()
    }

    /// Construct the engine. No-op unless the session is `Uninitialized`,
    /// so repeated or concurrent calls start at most one construction.
    pub async fn initialize(&self) {
        let began = self.shared.try_update(|state| {
            if state.lifecycle != LifecycleState::Uninitialized || state.engine.is_some() {
                return Err(state.lifecycle);
            }
            state.lifecycle = LifecycleState::Loading;
            state.error = None;
            state.progress_text.clear();
            Ok(())
        });
        if let Err(lifecycle) = began {
            debug!(session = %self.shared.id.short(), ?lifecycle, "initialize ignored");
            return;
        }

        let model_id = self.shared.settings.model_id.clone();
        info!(session = %self.shared.id.short(), model = %model_id, "loading inference engine");

        let mut guard = LoadingGuard {
            shared: &self.shared,
            armed: true,
        };
        let options = EngineOptions {
            progress: progress_callback(Arc::downgrade(&self.shared)),
            log_level: self.shared.settings.engine_log_level.clone(),
        };
        let result = self.shared.factory.create_engine(&model_id, options).await;
        guard.armed = false;

        match result {
            Ok(engine) => {
                self.shared.update(|state| {
                    state.engine = Some(engine);
                    state.lifecycle = LifecycleState::Ready;
                });
                info!(session = %self.shared.id.short(), model = %model_id, "inference engine ready");
            }
            Err(e) => {
                let failure = InitFailure::classify(&e.message());
                warn!(
                    session = %self.shared.id.short(),
                    error = %e,
                    classified = %failure,
                    "failed to load model"
                );
                self.shared.update(|state| {
                    state.error = Some(failure);
                    state.lifecycle = LifecycleState::Error;
                });
            }
        }
    }

    /// Retry after a failed initialization.
    ///
    /// From `Error`: clears the error, discards any handle, and runs
    /// [`initialize`](Self::initialize) again. From any other state this
    /// does nothing, so a second reset while the retry is loading cannot
    /// start another construction.
    pub async fn reset(&self) {
        let retry = self.shared.try_update(|state| {
            if state.lifecycle != LifecycleState::Error {
                return Err(state.lifecycle);
            }
            state.error = None;
            state.engine = None;
            state.progress_text.clear();
            state.lifecycle = LifecycleState::Uninitialized;
            Ok(())
        });
        match retry {
            Ok(()) => {
                info!(session = %self.shared.id.short(), "retrying engine initialization");
                self.initialize().await;
            }
            Err(lifecycle) => {
                debug!(session = %self.shared.id.short(), ?lifecycle, "reset ignored");
            }
        }
    }
}

/// Progress reports update the visible progress text while loading.
/// Holds a weak reference so an engine that keeps the callback alive does
/// not keep the session alive.
fn progress_callback(shared: Weak<Shared>) -> crate::ProgressCallback {
    Arc::new(move |report: InitProgressReport| {
        let Some(shared) = shared.upgrade() else {
            return;
        };
        info!(
            session = %shared.id.short(),
            progress = report.progress,
            "model loading: {}",
            report.text
        );
        shared.update(|state| {
            if state.lifecycle == LifecycleState::Loading {
                state.progress_text = report.text;
            }
        });
    })
}
