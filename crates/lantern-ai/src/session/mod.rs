//! Inference session controller.
//!
//! An `InferenceSession` owns the engine lifecycle
//! (`Uninitialized -> Loading -> Ready | Error`, with `reset` leading from
//! `Error` back through `Loading`), the conversation, and the per-turn
//! `generating` reservation. State changes are published as
//! `SessionSnapshot`s on a `tokio::sync::watch` channel.

mod chat;
mod controller;
mod types;


pub use controller::{InferenceSession, SessionSettings};
pub use types::{
    GenerationOutcome, GenerationParams, InitFailure, LifecycleState, SendRejected,
    SessionSnapshot, GENERATION_FAILED_MESSAGE,
};
