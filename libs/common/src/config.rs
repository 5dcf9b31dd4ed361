//! Configuration loading for netprobe
//!
//! Priority (highest to lowest):
//! 1. Environment variables prefixed with `NETPROBE_` (`__` separates nested keys)
//! 2. YAML config file, when given
//! 3. Default values

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::logging::LoggingConfig;
use errors::{ProbeError, Result};

/// Environment variable prefix
pub const ENV_PREFIX: &str = "NETPROBE_";

/// Per-poll execution limits
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PollSettings {
    /// Deadline for a whole poll in milliseconds, 0 disables it
    pub timeout_ms: u64,
    /// Maximum number of remote reads in flight for one device
    pub max_concurrent_reads: usize,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            timeout_ms: 30_000,
            max_concurrent_reads: 16,
        }
    }
}

impl PollSettings {
    pub fn validate(&self) -> Result<()> {
        if self.max_concurrent_reads == 0 {
            return Err(ProbeError::config(
                "poll.max_concurrent_reads must be greater than 0",
            ));
        }
        Ok(())
    }

    /// Poll deadline, `None` when disabled
    pub fn timeout(&self) -> Option<std::time::Duration> {
        (self.timeout_ms > 0).then(|| std::time::Duration::from_millis(self.timeout_ms))
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct NetprobeConfig {
    pub poll: PollSettings,
    pub logging: LoggingConfig,
}

fn figment(path: Option<&Path>) -> Figment {
    let mut figment = Figment::from(Serialized::defaults(NetprobeConfig::default()));
    if let Some(path) = path {
        figment = figment.merge(Yaml::file(path));
    }
    figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
}

/// Load configuration from defaults, an optional YAML file and the environment
pub fn load_config(path: Option<&Path>) -> Result<NetprobeConfig> {
    if let Some(path) = path {
        if !path.exists() {
            return Err(ProbeError::config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
    }

    let config: NetprobeConfig = figment(path)
        .extract()
        .map_err(|e| ProbeError::config(format!("Failed to load configuration: {}", e)))?;

    config.poll.validate()?;
    Ok(config)
}
