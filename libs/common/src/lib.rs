//! netprobe basic library
//!
//! Provides functions shared by all netprobe crates:
//! - logging bootstrap
//! - configuration loading

pub mod config;
pub mod logging;

pub use config::{load_config, NetprobeConfig, PollSettings};
pub use logging::{init_logging, set_log_level, LoggingConfig};

// Re-export common dependencies
pub use serde;
pub use tokio;
