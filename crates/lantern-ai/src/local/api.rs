//! ChatEngine implementation for LocalServerEngine.

use async_trait::async_trait;
use futures_util::future;
use futures_util::StreamExt;
use tracing::debug;

use crate::streaming::sse_events;
use crate::{AiError, ChatEngine, ChunkStream, CompletionRequest};

use super::client::{
    parse_chunk, send_error, truncate_body, LocalServerEngine, CHAT_COMPLETIONS_PATH,
    DONE_SENTINEL,
};

#[async_trait]
impl ChatEngine for LocalServerEngine {
    async fn stream_completion(&self, request: CompletionRequest) -> Result<ChunkStream, AiError> {
        let body = self.build_request_body(&request);

        debug!(
            model = %self.model_id,
            messages = request.messages.len(),
            "local engine streaming request"
        );
        if self.verbose {
            debug!(body = %body, "local engine request body");
        }

        let response = self
            .authorized(self.http.post(self.config.endpoint(CHAT_COMPLETIONS_PATH)))
            .json(&body)
            .send()
            .await
            .map_err(|e| send_error(CHAT_COMPLETIONS_PATH, e))?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(AiError::RateLimited);
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(AiError::ApiError(format!(
                "HTTP {status}: {}",
                truncate_body(&text)
            )));
        }

        let chunks = sse_events(response)
            .take_while(|event| {
                let done = matches!(event, Ok(e) if e.data.trim() == DONE_SENTINEL);
                future::ready(!done)
            })
            .filter_map(|event| {
                future::ready(match event {
                    Ok(e) => parse_chunk(&e.data).transpose(),
                    Err(e) => Some(Err(e)),
                })
            });

        Ok(chunks.boxed())
    }
}
