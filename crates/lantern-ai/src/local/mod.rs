//! Engine backed by a locally hosted, OpenAI-compatible inference server.
//!
//! Works with llama.cpp's `llama-server`, Ollama, LM Studio, and anything
//! else that serves `/v1/models` and streaming `/v1/chat/completions`.

mod api;
mod client;
mod config;
mod factory;

#[cfg(test)]
mod tests;

pub use client::LocalServerEngine;
pub use config::LocalServerConfig;
pub use factory::LocalServerFactory;
