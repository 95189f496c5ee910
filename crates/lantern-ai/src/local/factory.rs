//! Constructs [`LocalServerEngine`]s, probing the server first.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::{AiError, ChatEngine, EngineFactory, EngineOptions, InitProgressReport};

use super::client::{
    authorize, check_model_served, parse_model_ids, send_error, truncate_body,
    LocalServerEngine, MODELS_PATH,
};
use super::config::LocalServerConfig;

/// Builds engines against one configured server.
#[derive(Debug, Clone, Default)]
pub struct LocalServerFactory {
    config: LocalServerConfig,
}

impl LocalServerFactory {
    pub fn new(config: LocalServerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LocalServerConfig {
        &self.config
    }

    fn build_http(&self) -> Result<reqwest::Client, AiError> {
        reqwest::Client::builder()
            .connect_timeout(self.config.connect_timeout)
            .timeout(self.config.request_timeout)
            .build()
            .map_err(|e| AiError::ApiError(format!("failed to build HTTP client: {e}")))
    }

    async fn list_models(&self, http: &reqwest::Client) -> Result<Vec<String>, AiError> {
        let url = self.config.endpoint(MODELS_PATH);
        let response = authorize(&self.config, http.get(&url))
            .send()
            .await
            .map_err(|e| {
                send_error(&format!("inference server at {}", self.config.base_url), e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(AiError::ApiError(format!(
                "HTTP {status} from {url}: {}",
                truncate_body(&text)
            )));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AiError::ParseError(e.to_string()))?;
        Ok(parse_model_ids(&json))
    }
}

#[async_trait]
impl EngineFactory for LocalServerFactory {
    async fn create_engine(
        &self,
        model_id: &str,
        options: EngineOptions,
    ) -> Result<Arc<dyn ChatEngine>, AiError> {
        let started = Instant::now();
        let report = |progress: f64, text: String| {
            (options.progress)(InitProgressReport {
                progress,
                text,
                elapsed: started.elapsed(),
            });
        };

        debug!(log_level = %options.log_level, "constructing local engine");
        report(
            0.0,
            format!("Connecting to inference server at {}", self.config.base_url),
        );
        let http = self.build_http()?;

        report(0.3, "Fetching model list".to_string());
        let available = self.list_models(&http).await?;
        check_model_served(model_id, &available)?;
        if !available.iter().any(|m| m == model_id) {
            warn!(
                requested = %model_id,
                served = %available.join(", "),
                "server lists a single model under another name, using it"
            );
        }

        report(1.0, format!("Model {model_id} ready"));
        info!(model = %model_id, elapsed_ms = started.elapsed().as_millis() as u64, "local engine ready");

        Ok(Arc::new(LocalServerEngine {
            config: self.config.clone(),
            http,
            model_id: model_id.to_string(),
            verbose: options.log_level.eq_ignore_ascii_case("DEBUG"),
        }))
    }
}
