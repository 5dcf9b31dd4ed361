//! Unified error handling for netprobe crates
//!
//! Every fallible operation in the poll engine returns a [`ProbeError`]. The
//! variants fall into three families that drive control flow:
//!
//! - **NotImplemented**: the source does not define the capability, ask the next source
//! - **NotFound**: the source defines it but the device has no usable value
//! - **Hard failures**: transport, timeout, cancellation, decode, invalid class definitions
//!
//! `ComponentNotFound` is a fourth, caller-facing kind produced when a device does
//! not advertise a component at all.

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// ErrorKind - control-flow classification
// ============================================================================

/// Classification of a [`ProbeError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotImplemented,
    NotFound,
    ComponentNotFound,
    Transport,
    Timeout,
    Cancelled,
    Decode,
    InvalidClass,
    Configuration,
    Internal,
}

impl ErrorKind {
    /// Kinds that callers render as "unavailable" instead of aborting a poll
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            ErrorKind::NotImplemented | ErrorKind::NotFound | ErrorKind::ComponentNotFound
        )
    }

    /// Kinds that must never be masked by falling back to a weaker source
    pub fn is_hard_failure(&self) -> bool {
        !self.is_unavailable()
    }
}

// ============================================================================
// ProbeError - main error type
// ============================================================================

/// Main error type for all netprobe crates
#[derive(Debug, Error)]
pub enum ProbeError {
    // ======================================
    // Resolution outcomes
    // ======================================
    #[error("Not implemented: {0}")]
    NotImplemented(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Component not found: {0}")]
    ComponentNotFound(String),

    // ======================================
    // Remote query errors
    // ======================================
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Cancelled: {0}")]
    Cancelled(String),

    // ======================================
    // Data errors
    // ======================================
    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Data type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },

    #[error("Operator error: {0}")]
    Operator(String),

    // ======================================
    // Definition & configuration errors
    // ======================================
    #[error("Invalid device class: {0}")]
    InvalidClass(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ======================================
    // Wrapping
    // ======================================
    /// Adds context while keeping the kind of the wrapped error
    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<ProbeError>,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using ProbeError
pub type Result<T> = std::result::Result<T, ProbeError>;

impl ProbeError {
    pub fn not_implemented(msg: impl Into<String>) -> Self {
        Self::NotImplemented(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn component_not_found(msg: impl Into<String>) -> Self {
        Self::ComponentNotFound(msg.into())
    }

    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    pub fn cancelled(msg: impl Into<String>) -> Self {
        Self::Cancelled(msg.into())
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    pub fn type_mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::TypeMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub fn operator(msg: impl Into<String>) -> Self {
        Self::Operator(msg.into())
    }

    pub fn invalid_class(msg: impl Into<String>) -> Self {
        Self::InvalidClass(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Wrap this error with a context message, keeping its kind
    pub fn context(self, context: impl Into<String>) -> Self {
        Self::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Control-flow classification of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotImplemented(_) => ErrorKind::NotImplemented,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::ComponentNotFound(_) => ErrorKind::ComponentNotFound,
            Self::Transport(_) => ErrorKind::Transport,
            Self::Timeout(_) => ErrorKind::Timeout,
            Self::Cancelled(_) => ErrorKind::Cancelled,
            Self::Decode(_) | Self::TypeMismatch { .. } | Self::Operator(_) => ErrorKind::Decode,
            Self::InvalidClass(_) => ErrorKind::InvalidClass,
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::Io(_) | Self::Other(_) => ErrorKind::Internal,
            Self::Context { source, .. } => source.kind(),
        }
    }

    pub fn is_not_implemented(&self) -> bool {
        self.kind() == ErrorKind::NotImplemented
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    pub fn is_component_not_found(&self) -> bool {
        self.kind() == ErrorKind::ComponentNotFound
    }

    /// NotImplemented, NotFound or ComponentNotFound
    pub fn is_unavailable(&self) -> bool {
        self.kind().is_unavailable()
    }

    /// Check if retrying the same read could succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Transport | ErrorKind::Timeout)
    }

    /// Stable machine-readable code
    pub fn error_code(&self) -> &'static str {
        match self.kind() {
            ErrorKind::NotImplemented => "NOT_IMPLEMENTED",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::ComponentNotFound => "COMPONENT_NOT_FOUND",
            ErrorKind::Transport => "TRANSPORT_ERROR",
            ErrorKind::Timeout => "TIMEOUT",
            ErrorKind::Cancelled => "CANCELLED",
            ErrorKind::Decode => "DECODE_ERROR",
            ErrorKind::InvalidClass => "INVALID_CLASS",
            ErrorKind::Configuration => "CONFIGURATION_ERROR",
            ErrorKind::Internal => "INTERNAL_ERROR",
        }
    }
}

// Conversion traits for common error types
impl From<serde_json::Error> for ProbeError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

impl From<serde_yaml::Error> for ProbeError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::InvalidClass(err.to_string())
    }
}

impl From<std::num::ParseIntError> for ProbeError {
    fn from(err: std::num::ParseIntError) -> Self {
        Self::Decode(format!("Invalid integer: {}", err))
    }
}

/// Extension for attaching context to a `Result`
pub trait ResultExt<T> {
    fn context(self, context: impl Into<String>) -> Result<T>;

    fn with_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.context(context))
    }

    fn with_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        self.map_err(|e| e.context(f()))
    }
}

// Helper macros for creating errors
#[macro_export]
macro_rules! not_found {
    ($msg:expr) => {
        $crate::ProbeError::NotFound($msg.to_string())
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::ProbeError::NotFound(format!($fmt, $($arg)*))
    };
}

#[macro_export]
macro_rules! not_implemented {
    ($msg:expr) => {
        $crate::ProbeError::NotImplemented($msg.to_string())
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::ProbeError::NotImplemented(format!($fmt, $($arg)*))
    };
}

#[macro_export]
macro_rules! decode_error {
    ($msg:expr) => {
        $crate::ProbeError::Decode($msg.to_string())
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::ProbeError::Decode(format!($fmt, $($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        assert!(ProbeError::not_found("x").is_not_found());
        assert!(ProbeError::not_implemented("x").is_not_implemented());
        assert!(ProbeError::component_not_found("cpu").is_component_not_found());
        assert_eq!(ProbeError::transport("down").kind(), ErrorKind::Transport);
        assert_eq!(
            ProbeError::type_mismatch("u64", "string").kind(),
            ErrorKind::Decode
        );
    }

    #[test]
    fn test_context_keeps_kind() {
        let err = ProbeError::not_found("oid 1.3.6").context("failed to get vendor");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "failed to get vendor: Not found: oid 1.3.6");

        let nested = ProbeError::timeout("walk").context("inner").context("outer");
        assert_eq!(nested.kind(), ErrorKind::Timeout);
    }

    #[test]
    fn test_result_ext() {
        let res: Result<()> = Err(ProbeError::cancelled("poll aborted"));
        let err = res.with_context(|| format!("reading {}", "cpu")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Cancelled);
        assert!(err.to_string().starts_with("reading cpu"));
    }

    #[test]
    fn test_unavailable_vs_hard_failure() {
        assert!(ProbeError::not_found("x").is_unavailable());
        assert!(ProbeError::component_not_found("x").is_unavailable());
        assert!(!ProbeError::transport("x").is_unavailable());
        assert!(ErrorKind::Cancelled.is_hard_failure());
    }

    #[test]
    fn test_retryable() {
        assert!(ProbeError::timeout("x").is_retryable());
        assert!(ProbeError::transport("x").is_retryable());
        assert!(!ProbeError::decode("x").is_retryable());
    }

    #[test]
    fn test_error_macros() {
        let err = not_found!("no value for {}", "vendor");
        assert_eq!(err.to_string(), "Not found: no value for vendor");
        assert_eq!(err.error_code(), "NOT_FOUND");

        let err = decode_error!("index isn't an integer");
        assert_eq!(err.kind(), ErrorKind::Decode);
    }

    #[test]
    fn test_from_conversions() {
        let parse: ProbeError = "abc".parse::<u64>().unwrap_err().into();
        assert_eq!(parse.kind(), ErrorKind::Decode);

        let other: ProbeError = anyhow::anyhow!("boom").into();
        assert_eq!(other.kind(), ErrorKind::Internal);
    }
}
