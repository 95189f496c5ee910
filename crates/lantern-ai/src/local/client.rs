//! Local server engine struct, request building, and response parsing.

use crate::{AiError, CompletionChunk, CompletionRequest};

use super::config::LocalServerConfig;

pub(crate) const MODELS_PATH: &str = "/v1/models";
pub(crate) const CHAT_COMPLETIONS_PATH: &str = "/v1/chat/completions";
pub(crate) const DONE_SENTINEL: &str = "[DONE]";

/// A constructed engine bound to one model on one server.
pub struct LocalServerEngine {
    pub(crate) config: LocalServerConfig,
    pub(crate) http: reqwest::Client,
    pub(crate) model_id: String,
    /// Log request bodies at debug level (engine log level `DEBUG`).
    pub(crate) verbose: bool,
}

impl LocalServerEngine {
    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    pub(crate) fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        authorize(&self.config, request)
    }

    /// Build the JSON request body for `/v1/chat/completions`.
    pub(crate) fn build_request_body(&self, request: &CompletionRequest) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": self.model_id,
            "messages": request.messages,
            "temperature": request.temperature,
            "max_tokens": request.max_tokens,
        });
        if request.stream {
            body["stream"] = serde_json::json!(true);
        }
        body
    }
}

pub(crate) fn authorize(
    config: &LocalServerConfig,
    request: reqwest::RequestBuilder,
) -> reqwest::RequestBuilder {
    match config.api_key {
        Some(ref key) if !key.is_empty() => request.bearer_auth(key),
        _ => request,
    }
}

/// Parse one SSE `data:` payload into a chunk.
///
/// Returns `Ok(None)` for keep-alive payloads that carry neither text nor
/// a finish reason.
pub(crate) fn parse_chunk(data: &str) -> Result<Option<CompletionChunk>, AiError> {
    let json: serde_json::Value =
        serde_json::from_str(data).map_err(|e| AiError::ParseError(e.to_string()))?;

    if let Some(err) = json.get("error") {
        let message = err["message"]
            .as_str()
            .map(String::from)
            .unwrap_or_else(|| err.to_string());
        return Err(AiError::ApiError(message));
    }

    let choice = &json["choices"][0];
    let delta = choice["delta"]["content"].as_str().unwrap_or("").to_string();
    let finish_reason = choice["finish_reason"].as_str().map(String::from);

    if delta.is_empty() && finish_reason.is_none() {
        return Ok(None);
    }
    Ok(Some(CompletionChunk {
        delta,
        finish_reason,
    }))
}

/// Extract model ids from a `/v1/models` response.
pub(crate) fn parse_model_ids(json: &serde_json::Value) -> Vec<String> {
    json["data"]
        .as_array()
        .map(|models| {
            models
                .iter()
                .filter_map(|m| m["id"].as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default()
}

/// Decide whether the server can serve `model_id`.
///
/// Single-model servers (llama.cpp) list the loaded file under its own
/// name and answer any request with it, so one listed model is accepted.
pub(crate) fn check_model_served(model_id: &str, available: &[String]) -> Result<(), AiError> {
    if available.iter().any(|m| m == model_id) || available.len() == 1 {
        return Ok(());
    }
    let listed = if available.is_empty() {
        "none".to_string()
    } else {
        available.join(", ")
    };
    Err(AiError::ApiError(format!(
        "model {model_id} is not served by this engine (available: {listed})"
    )))
}

/// Map a failed send. Timeouts keep their own variant; anything else is
/// reported as a network failure in `context`.
pub(crate) fn send_error(context: &str, e: reqwest::Error) -> AiError {
    if e.is_timeout() {
        AiError::Timeout
    } else {
        AiError::NetworkError(format!("network request to {context} failed: {e}"))
    }
}

/// Truncate an error body for inclusion in a message.
pub(crate) fn truncate_body(text: &str) -> String {
    text.chars().take(200).collect()
}
