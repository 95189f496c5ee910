//! Validation for the `[ai]` and `[engine]` sections.

use crate::schema::LanternConfig;

use super::helpers::{validate_non_empty, validate_range, validate_range_f64};

pub(crate) fn validate_ai(errors: &mut Vec<String>, config: &LanternConfig) {
    validate_non_empty(errors, "ai.model_id", &config.ai.model_id);
    validate_range_f64(errors, "ai.temperature", config.ai.temperature, 0.0, 2.0);
    validate_range(errors, "ai.max_tokens", config.ai.max_tokens, 1, 32768);
}

pub(crate) fn validate_engine(errors: &mut Vec<String>, config: &LanternConfig) {
    let url = config.engine.base_url.as_str();
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        errors.push(format!("engine.base_url = {url:?} must start with http:// or https://"));
    }
    validate_range(
        errors,
        "engine.connect_timeout_secs",
        config.engine.connect_timeout_secs,
        1,
        120,
    );
    validate_range(
        errors,
        "engine.request_timeout_secs",
        config.engine.request_timeout_secs,
        5,
        3600,
    );
}
