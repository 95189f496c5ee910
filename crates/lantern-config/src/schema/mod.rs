//! Configuration schema types for Lantern.
//!
//! All structs use `serde(default)` so partial configs work correctly.

mod ai;
mod engine;
mod system;

pub use ai::*;
pub use engine::*;
pub use system::*;

use serde::{Deserialize, Serialize};

/// Current config schema version.
pub const CONFIG_SCHEMA_VERSION: u32 = 1;

/// Root configuration for Lantern.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct LanternConfig {
    pub ai: AiConfig,
    pub engine: EngineConfig,
    pub logging: LoggingConfig,
}
