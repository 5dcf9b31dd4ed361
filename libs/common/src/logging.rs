//! Logging bootstrap for netprobe
//!
//! Installs a `tracing` subscriber with a console layer and an optional
//! daily-rolling file layer. The filter can be changed at runtime.

use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};

use serde::{Deserialize, Serialize};
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt::{self, format::Writer, FmtContext, FormatEvent, FormatFields},
    layer::SubscriberExt,
    registry::LookupSpan,
    reload,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

use errors::{ProbeError, Result};

/// Custom format for log level with brackets: `[INFO]`, `[WARN]`, etc.
fn format_level(level: &Level) -> &'static str {
    match *level {
        Level::TRACE => "[TRACE]",
        Level::DEBUG => "[DEBUG]",
        Level::INFO => "[INFO]",
        Level::WARN => "[WARN]",
        Level::ERROR => "[ERROR]",
    }
}

/// Event formatter that outputs: `timestamp [LEVEL] target: message`
struct BracketedLevelFormat;

impl<S, N> FormatEvent<S, N> for BracketedLevelFormat
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        let now = chrono::Utc::now();
        write!(writer, "{} ", now.format("%Y-%m-%dT%H:%M:%S%.6fZ"))?;

        let level = *event.metadata().level();
        if writer.has_ansi_escapes() {
            let color = match level {
                Level::TRACE => "\x1b[35m",
                Level::DEBUG => "\x1b[34m",
                Level::INFO => "\x1b[32m",
                Level::WARN => "\x1b[33m",
                Level::ERROR => "\x1b[31m",
            };
            write!(writer, "{}{}\x1b[0m ", color, format_level(&level))?;
        } else {
            write!(writer, "{} ", format_level(&level))?;
        }

        write!(writer, "{}: ", event.metadata().target())?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;

        writeln!(writer)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive, overridden by `RUST_LOG`
    pub level: String,
    /// Emit JSON lines instead of the bracketed format
    pub json: bool,
    /// Directory for daily-rolling log files; console only when unset
    pub directory: Option<PathBuf>,
    /// File name prefix for rolling log files
    pub file_prefix: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            directory: None,
            file_prefix: "netprobe".to_string(),
        }
    }
}

type EnvFilterReloadHandle = reload::Handle<EnvFilter, tracing_subscriber::Registry>;

// Keeps the non-blocking file writer alive for the process lifetime
static GUARDS: OnceLock<Mutex<Vec<WorkerGuard>>> = OnceLock::new();
static LOG_FILTER_HANDLE: OnceLock<EnvFilterReloadHandle> = OnceLock::new();

/// Build the effective filter: `RUST_LOG` wins over the configured level
fn build_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    let directive = std::env::var("RUST_LOG").unwrap_or_else(|_| config.level.clone());
    EnvFilter::try_new(&directive)
        .map_err(|e| ProbeError::config(format!("Invalid log filter '{}': {}", directive, e)))
}

/// Initialize the global subscriber
///
/// Fails if a global subscriber is already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let (reload_filter, reload_handle) = reload::Layer::new(build_filter(config)?);

    let console_layer = if config.json {
        fmt::layer().json().with_target(true).boxed()
    } else {
        fmt::layer()
            .with_ansi(true)
            .event_format(BracketedLevelFormat)
            .boxed()
    };

    let file_layer = match &config.directory {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let appender = tracing_appender::rolling::daily(dir, &config.file_prefix);
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);

            let guards = GUARDS.get_or_init(|| Mutex::new(Vec::new()));
            match guards.lock() {
                Ok(mut guards) => guards.push(guard),
                Err(poisoned) => poisoned.into_inner().push(guard),
            }

            Some(
                fmt::layer()
                    .with_writer(non_blocking)
                    .with_ansi(false)
                    .event_format(BracketedLevelFormat)
                    .boxed(),
            )
        },
        None => None,
    };

    tracing_subscriber::registry()
        .with(reload_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| ProbeError::config(format!("Logging already initialized: {}", e)))?;

    let _ = LOG_FILTER_HANDLE.set(reload_handle);

    tracing::debug!(level = %config.level, json = config.json, "Logging initialized");
    Ok(())
}

/// Change the log filter at runtime
///
/// Accepts a level (`"debug"`) or a full directive (`"info,probesrv=trace"`).
pub fn set_log_level(level: &str) -> Result<()> {
    let handle = LOG_FILTER_HANDLE
        .get()
        .ok_or_else(|| ProbeError::config("Logging not initialized"))?;

    let new_filter = EnvFilter::try_new(level)
        .map_err(|e| ProbeError::config(format!("Invalid log level '{}': {}", level, e)))?;

    handle
        .reload(new_filter)
        .map_err(|e| ProbeError::config(format!("Failed to reload log filter: {}", e)))?;

    tracing::info!("Log level changed to: {}", level);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_level() {
        assert_eq!(format_level(&Level::WARN), "[WARN]");
        assert_eq!(format_level(&Level::TRACE), "[TRACE]");
    }

    #[test]
    fn test_default_config() {
        let config = LoggingConfig::default();
        assert_eq!(config.level, "info");
        assert!(!config.json);
        assert!(config.directory.is_none());
    }

    #[test]
    fn test_invalid_filter_rejected() {
        let config = LoggingConfig {
            level: "probesrv=verbose".to_string(),
            ..Default::default()
        };
        if std::env::var("RUST_LOG").is_err() {
            assert!(build_filter(&config).is_err());
        }
    }

    #[test]
    fn test_set_level_before_init_fails() {
        if LOG_FILTER_HANDLE.get().is_none() {
            assert!(set_log_level("debug").is_err());
        }
    }
}
