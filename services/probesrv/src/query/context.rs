//! Per-poll execution context
//!
//! Every remote read issued while polling one device goes through a
//! [`PollContext`]. The context owns the query client, a cancellation token, an
//! optional deadline, a semaphore bounding in-flight reads, and the identity
//! properties resolved so far.
//!
//! Contexts are cheap to clone and immutable: [`PollContext::with_properties`]
//! returns a new context instead of changing the current one.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use common::PollSettings;
use errors::{ProbeError, Result};
use netprobe_model::{Properties, Value};
use tokio::sync::Semaphore;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::trace;

use super::{Oid, QueryClient, Response};

const DEFAULT_MAX_CONCURRENT_READS: usize = 16;

#[derive(Clone)]
pub struct PollContext {
    client: Arc<dyn QueryClient>,
    cancel: CancellationToken,
    deadline: Option<Instant>,
    limiter: Arc<Semaphore>,
    properties: Arc<Properties>,
}

impl std::fmt::Debug for PollContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollContext")
            .field("cancelled", &self.cancel.is_cancelled())
            .field("deadline", &self.deadline)
            .field("available_permits", &self.limiter.available_permits())
            .field("properties", &self.properties)
            .finish_non_exhaustive()
    }
}

impl PollContext {
    pub fn new(client: Arc<dyn QueryClient>) -> Self {
        Self {
            client,
            cancel: CancellationToken::new(),
            deadline: None,
            limiter: Arc::new(Semaphore::new(DEFAULT_MAX_CONCURRENT_READS)),
            properties: Arc::new(Properties::default()),
        }
    }

    /// Build a context from configured poll limits
    pub fn from_settings(client: Arc<dyn QueryClient>, settings: &PollSettings) -> Result<Self> {
        settings.validate()?;
        let mut ctx = Self::new(client).with_max_concurrent_reads(settings.max_concurrent_reads);
        if let Some(timeout) = settings.timeout() {
            ctx = ctx.with_timeout(timeout);
        }
        Ok(ctx)
    }

    /// Use an externally owned token, e.g. a child of a service shutdown token
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn with_max_concurrent_reads(mut self, permits: usize) -> Self {
        self.limiter = Arc::new(Semaphore::new(permits.max(1)));
        self
    }

    /// New context carrying `properties`; the receiver is left untouched
    pub fn with_properties(&self, properties: Properties) -> Self {
        Self {
            properties: Arc::new(properties),
            ..self.clone()
        }
    }

    /// Identity properties resolved earlier in the same poll
    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub async fn walk(&self, root: &Oid) -> Result<Vec<Response>> {
        trace!(oid = %root, "walk");
        self.guarded(root, self.client.walk(root)).await
    }

    pub async fn get(&self, oid: &Oid) -> Result<Value> {
        trace!(oid = %oid, "get");
        self.guarded(oid, self.client.get(oid)).await
    }

    /// Run one remote read under the limiter, the cancellation token and the deadline
    async fn guarded<T>(&self, oid: &Oid, read: impl Future<Output = Result<T>>) -> Result<T> {
        if self.cancel.is_cancelled() {
            return Err(ProbeError::cancelled(format!("poll cancelled before reading {}", oid)));
        }

        let _permit = tokio::select! {
            permit = self.limiter.acquire() => permit
                .map_err(|_| ProbeError::cancelled("read limiter closed"))?,
            () = self.cancel.cancelled() => {
                return Err(ProbeError::cancelled(format!("poll cancelled while waiting to read {}", oid)));
            }
            () = sleep_until(self.deadline) => {
                return Err(ProbeError::timeout(format!("deadline exceeded while waiting to read {}", oid)));
            }
        };

        tokio::select! {
            res = read => res,
            () = self.cancel.cancelled() => {
                Err(ProbeError::cancelled(format!("poll cancelled while reading {}", oid)))
            }
            () = sleep_until(self.deadline) => {
                Err(ProbeError::timeout(format!("deadline exceeded while reading {}", oid)))
            }
        }
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
