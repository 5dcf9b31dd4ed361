//! Mock query client for testing
//!
//! Serves walks and gets from an in-memory table so resolution logic can be
//! exercised without a device. Supports failure injection per path prefix,
//! artificial latency, call counting, and tracking of reads in flight.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use errors::{ErrorKind, ProbeError, Result};
use netprobe_model::Value;
use tracing::debug;

use super::{Oid, QueryClient, Response};

/// Failure returned for every read under a path prefix
#[derive(Debug, Clone)]
struct InjectedFailure {
    prefix: String,
    kind: ErrorKind,
}

impl InjectedFailure {
    fn to_error(&self, oid: &Oid) -> ProbeError {
        let msg = format!("injected failure for {}", oid);
        match self.kind {
            ErrorKind::NotFound => ProbeError::not_found(msg),
            ErrorKind::NotImplemented => ProbeError::not_implemented(msg),
            ErrorKind::Timeout => ProbeError::timeout(msg),
            ErrorKind::Cancelled => ProbeError::cancelled(msg),
            ErrorKind::Decode => ProbeError::decode(msg),
            _ => ProbeError::transport(msg),
        }
    }
}

/// In-memory [`QueryClient`]
///
/// Entries are kept in insertion order, and walks return them in that order,
/// which lets tests feed rows out of index order.
#[derive(Debug, Default)]
pub struct MockClient {
    entries: Vec<(String, Value)>,
    failures: Vec<InjectedFailure>,
    delay: Option<Duration>,
    walks: Mutex<HashMap<String, usize>>,
    gets: Mutex<HashMap<String, usize>>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

/// Marks one read as outstanding until dropped
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(current: &'a AtomicUsize, peak: &AtomicUsize) -> Self {
        let now = current.fetch_add(1, Ordering::SeqCst) + 1;
        peak.fetch_max(now, Ordering::SeqCst);
        Self(current)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

fn normalize(oid: &str) -> String {
    oid.trim().trim_start_matches('.').to_string()
}

fn bump(counter: &Mutex<HashMap<String, usize>>, key: &str) {
    let mut map = match counter.lock() {
        Ok(map) => map,
        Err(poisoned) => poisoned.into_inner(),
    };
    *map.entry(key.to_string()).or_insert(0) += 1;
}

fn count(counter: &Mutex<HashMap<String, usize>>, key: &str) -> usize {
    let map = match counter.lock() {
        Ok(map) => map,
        Err(poisoned) => poisoned.into_inner(),
    };
    map.get(&normalize(key)).copied().unwrap_or(0)
}

impl MockClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value at `oid`
    pub fn with_value(mut self, oid: &str, value: impl Into<Value>) -> Self {
        self.entries.push((normalize(oid), value.into()));
        self
    }

    /// Add one value per row below `column`, in the given order
    pub fn with_column<V: Into<Value>>(
        mut self,
        column: &str,
        rows: impl IntoIterator<Item = (u64, V)>,
    ) -> Self {
        let column = normalize(column);
        for (index, value) in rows {
            self.entries
                .push((format!("{}.{}", column, index), value.into()));
        }
        self
    }

    /// Fail every read under `prefix` with an error of `kind`
    pub fn with_failure(mut self, prefix: &str, kind: ErrorKind) -> Self {
        self.failures.push(InjectedFailure {
            prefix: normalize(prefix),
            kind,
        });
        self
    }

    /// Delay every read
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of walks issued for `root`
    pub fn walk_count(&self, root: &str) -> usize {
        count(&self.walks, root)
    }

    /// Number of gets issued for `oid`
    pub fn get_count(&self, oid: &str) -> usize {
        count(&self.gets, oid)
    }

    /// Total number of walks and gets
    pub fn total_reads(&self) -> usize {
        let sum = |counter: &Mutex<HashMap<String, usize>>| match counter.lock() {
            Ok(map) => map.values().sum::<usize>(),
            Err(poisoned) => poisoned.into_inner().values().sum(),
        };
        sum(&self.walks) + sum(&self.gets)
    }

    /// Highest number of reads that were outstanding at the same time
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    fn injected(&self, oid: &Oid) -> Option<ProbeError> {
        self.failures
            .iter()
            .find(|f| is_under(oid.as_str(), &f.prefix))
            .map(|f| f.to_error(oid))
    }

    async fn simulate_latency(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

fn is_under(oid: &str, prefix: &str) -> bool {
    oid == prefix
        || oid
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('.'))
}

#[async_trait]
impl QueryClient for MockClient {
    async fn walk(&self, root: &Oid) -> Result<Vec<Response>> {
        bump(&self.walks, root.as_str());
        let _in_flight = InFlight::enter(&self.in_flight, &self.peak_in_flight);
        self.simulate_latency().await;
        if let Some(err) = self.injected(root) {
            return Err(err);
        }

        let responses: Vec<Response> = self
            .entries
            .iter()
            .filter(|(oid, _)| is_under(oid, root.as_str()))
            .map(|(oid, value)| Response::new(format!(".{}", oid), value.clone()))
            .collect();

        debug!(oid = %root, rows = responses.len(), "Mock walk");
        if responses.is_empty() {
            return Err(ProbeError::not_found(format!("no such object: {}", root)));
        }
        Ok(responses)
    }

    async fn get(&self, oid: &Oid) -> Result<Value> {
        bump(&self.gets, oid.as_str());
        let _in_flight = InFlight::enter(&self.in_flight, &self.peak_in_flight);
        self.simulate_latency().await;
        if let Some(err) = self.injected(oid) {
            return Err(err);
        }

        self.entries
            .iter()
            .find(|(key, _)| key == oid.as_str())
            .map(|(_, value)| value.clone())
            .ok_or_else(|| ProbeError::not_found(format!("no such instance: {}", oid)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_walk_keeps_insertion_order() {
        let client = MockClient::new().with_column("1.3.6.1.2.1.2.2.1.2", [
            (5, "eth5"),
            (1, "eth1"),
            (3, "eth3"),
        ]);
        let rows = client
            .walk(&Oid::new("1.3.6.1.2.1.2.2.1.2").unwrap())
            .await
            .unwrap();
        let oids: Vec<_> = rows.iter().map(|r| r.oid.as_str()).collect();
        assert_eq!(
            oids,
            vec![
                ".1.3.6.1.2.1.2.2.1.2.5",
                ".1.3.6.1.2.1.2.2.1.2.1",
                ".1.3.6.1.2.1.2.2.1.2.3"
            ]
        );
        assert_eq!(client.walk_count("1.3.6.1.2.1.2.2.1.2"), 1);
    }

    #[tokio::test]
    async fn test_walk_does_not_match_sibling_prefix() {
        let client = MockClient::new()
            .with_value("1.3.6.1.2.1.2.2.1.20.1", 7u64)
            .with_value("1.3.6.1.2.1.2.2.1.2.1", "eth1");
        let rows = client
            .walk(&Oid::new("1.3.6.1.2.1.2.2.1.2").unwrap())
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_paths_are_not_found() {
        let client = MockClient::new();
        let oid = Oid::new("1.3.6.1.2.1.1.1.0").unwrap();
        assert!(client.walk(&oid).await.unwrap_err().is_not_found());
        assert!(client.get(&oid).await.unwrap_err().is_not_found());
        assert_eq!(client.total_reads(), 2);
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let client = MockClient::new()
            .with_value("1.3.6.1.4.1.9.1", 1i64)
            .with_failure("1.3.6.1.4.1.9", ErrorKind::Transport);
        let err = client
            .get(&Oid::new("1.3.6.1.4.1.9.1").unwrap())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);
    }
}
