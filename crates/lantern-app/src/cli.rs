use std::path::PathBuf;

use clap::Parser;
use lantern_config::LanternConfig;

/// Lantern: a chat sidebar backed by a locally hosted language model.
#[derive(Parser, Debug)]
#[command(name = "lantern", version, about)]
pub struct Args {
    /// Config file path override.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log level override (debug, info, warn, error).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Model identifier to load instead of the configured one.
    #[arg(short = 'm', long)]
    pub model: Option<String>,

    /// Inference server base URL.
    #[arg(long)]
    pub base_url: Option<String>,
}

impl Args {
    /// Apply command-line overrides on top of the loaded config.
    pub fn apply_overrides(&self, config: &mut LanternConfig) {
        if let Some(ref model) = self.model {
            config.ai.model_id = model.clone();
        }
        if let Some(ref url) = self.base_url {
            config.engine.base_url = url.clone();
        }
    }
}

pub fn parse() -> Args {
    Args::parse()
}
