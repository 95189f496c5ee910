//! Default TOML config template with inline documentation comments.

use crate::schema::CONFIG_SCHEMA_VERSION;

/// Generate the default TOML config content with comments.
pub(crate) fn default_config_toml() -> String {
    format!("# Lantern Configuration\n# Schema version {CONFIG_SCHEMA_VERSION}\n{TEMPLATE_BODY}")
}

const TEMPLATE_BODY: &str = r##"# Only override what you want to change -- missing fields use defaults.

[ai]
# model_id = "Qwen2-0.5B-Instruct-q4f16_1-MLC"
# temperature = 0.7        # 0.0-2.0
# max_tokens = 1024        # 1-32768
# engine_log_level = "INFO"
# system_prompt = "You are a helpful browsing assistant."

[engine]
# base_url = "http://127.0.0.1:8080"   # any OpenAI-compatible server
# connect_timeout_secs = 10            # 1-120
# request_timeout_secs = 300           # 5-3600
# api_key = ""

[logging]
# level = "INFO"           # DEBUG, INFO, WARNING, ERROR
"##;
