//! Remote query client contract

use async_trait::async_trait;
use errors::Result;
use netprobe_model::Value;

use super::Oid;

/// One (path, raw value) pair returned by a walk
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    /// Full path of the value, as reported by the device
    pub oid: String,
    pub value: Value,
}

impl Response {
    pub fn new(oid: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            oid: oid.into(),
            value: value.into(),
        }
    }
}

/// Transport-facing client performing walks and gets against one device
///
/// Implementations return `ProbeError::NotFound` when the requested path is not
/// present on the device, and a transport or timeout error for anything else.
/// Cancellation and deadlines are enforced by [`PollContext`](super::PollContext),
/// which drops the returned future.
#[async_trait]
pub trait QueryClient: Send + Sync {
    /// Bulk read of every value below `root`
    async fn walk(&self, root: &Oid) -> Result<Vec<Response>>;

    /// Read the single value at `oid`
    async fn get(&self, oid: &Oid) -> Result<Value>;
}
