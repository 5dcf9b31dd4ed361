//! Query-definition trees and the recursive reader
//!
//! A [`QueryTree`] maps labels to nodes. A node is either a [`QueryLeaf`] (one
//! locator plus an operator pipeline) or a nested tree. Reading a tree walks
//! every leaf on the device and groups the results by row index:
//!
//! ```text
//! interfaces                      read_all
//! ├── ifDescr  -> 1.3.6.1.2.1.2.2.1.2   ──►   { 1: { ifDescr, ifSpeed },
//! └── ifSpeed  -> 1.3.6.1.2.1.2.2.1.5          2: { ifDescr } }
//! ```

use std::collections::{BTreeMap, HashMap};

use errors::{ProbeError, Result};
use futures::future::{try_join_all, BoxFuture, FutureExt};
use netprobe_model::Value;
use serde::Serialize;
use tracing::{trace, warn};

use super::oid::row_index;
use super::{Oid, OperatorPipeline, PollContext};

/// A value inside a row: a scalar from a leaf or a nested row from a subtree
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Scalar(Value),
    Row(Row),
}

impl Cell {
    pub fn as_scalar(&self) -> Option<&Value> {
        match self {
            Cell::Scalar(v) => Some(v),
            Cell::Row(_) => None,
        }
    }
}

/// Label → cell record for one row index
pub type Row = BTreeMap<String, Cell>;

/// Rows keyed by index, in no particular order
pub type GroupedRows = HashMap<u64, Row>;

/// Single addressable value locator
#[derive(Debug, Clone)]
pub struct QueryLeaf {
    pub oid: Oid,
    pub operators: OperatorPipeline,
}

impl QueryLeaf {
    pub fn new(oid: Oid) -> Self {
        Self {
            oid,
            operators: OperatorPipeline::new(),
        }
    }

    pub fn with_operators(mut self, operators: OperatorPipeline) -> Self {
        self.operators = operators;
        self
    }

    /// Walk the locator and return the normalized value per row index
    ///
    /// Empty raw strings are skipped. A failing operator or a non-numeric
    /// trailing path component fails the whole read.
    pub async fn read(&self, ctx: &PollContext) -> Result<HashMap<u64, Value>> {
        let responses = ctx.walk(&self.oid).await?;

        let mut values = HashMap::with_capacity(responses.len());
        for response in responses {
            if response.value.is_empty_string() {
                continue;
            }
            let normalized = self.operators.apply(ctx, response.value).await.map_err(|e| {
                warn!(oid = %response.oid, "Response couldn't be normalized: {}", e);
                e.context(format!("response couldn't be normalized (oid: {})", response.oid))
            })?;
            let index = row_index(&response.oid)?;
            values.insert(index, normalized);
        }
        Ok(values)
    }
}

/// Leaf or nested tree
#[derive(Debug, Clone)]
pub enum QueryNode {
    Leaf(QueryLeaf),
    Group(QueryTree),
}

impl QueryNode {
    pub fn leaf(oid: Oid) -> Self {
        QueryNode::Leaf(QueryLeaf::new(oid))
    }

    fn read<'a>(&'a self, ctx: &'a PollContext) -> BoxFuture<'a, Result<HashMap<u64, Cell>>> {
        async move {
            match self {
                QueryNode::Leaf(leaf) => Ok(leaf
                    .read(ctx)
                    .await?
                    .into_iter()
                    .map(|(index, value)| (index, Cell::Scalar(value)))
                    .collect()),
                QueryNode::Group(tree) => Ok(tree
                    .read_all(ctx)
                    .await?
                    .into_iter()
                    .map(|(index, row)| (index, Cell::Row(row)))
                    .collect()),
            }
        }
        .boxed()
    }
}

/// Labeled tree of query nodes
#[derive(Debug, Clone, Default)]
pub struct QueryTree {
    nodes: BTreeMap<String, QueryNode>,
}

impl QueryTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, label: impl Into<String>, node: QueryNode) -> Option<QueryNode> {
        self.nodes.insert(label.into(), node)
    }

    pub fn with_leaf(mut self, label: impl Into<String>, leaf: QueryLeaf) -> Self {
        self.insert(label, QueryNode::Leaf(leaf));
        self
    }

    pub fn with_group(mut self, label: impl Into<String>, tree: QueryTree) -> Self {
        self.insert(label, QueryNode::Group(tree));
        self
    }

    pub fn get(&self, label: &str) -> Option<&QueryNode> {
        self.nodes.get(label)
    }

    /// Resolve a dotted label path such as `ups.battery_voltage`
    pub fn lookup(&self, path: &str) -> Option<&QueryNode> {
        let mut labels = path.split('.');
        let mut node = self.nodes.get(labels.next()?)?;
        for label in labels {
            match node {
                QueryNode::Group(tree) => node = tree.nodes.get(label)?,
                QueryNode::Leaf(_) => return None,
            }
        }
        Some(node)
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Layer `overlay` on top of this tree
    ///
    /// Where both trees hold a subtree under the same label the subtrees are
    /// merged recursively; in every other case the overlay node replaces the
    /// base node. Neither input is modified.
    pub fn merge(&self, overlay: &QueryTree) -> QueryTree {
        let mut merged = self.nodes.clone();
        for (label, node) in &overlay.nodes {
            let replacement = match (merged.get(label), node) {
                (Some(QueryNode::Group(base)), QueryNode::Group(over)) => {
                    QueryNode::Group(base.merge(over))
                },
                _ => node.clone(),
            };
            merged.insert(label.clone(), replacement);
        }
        QueryTree { nodes: merged }
    }

    /// Read every label concurrently and group the values by row index
    ///
    /// The result holds the union of indices seen across labels; a row only has
    /// the labels that produced a value for it. Labels whose value is absent on
    /// the device are skipped, any other failure aborts the read. An empty
    /// result is valid.
    pub fn read_all<'a>(&'a self, ctx: &'a PollContext) -> BoxFuture<'a, Result<GroupedRows>> {
        async move {
            let reads = self.nodes.iter().map(|(label, node)| async move {
                match node.read(ctx).await {
                    Ok(values) => Ok(Some((label, values))),
                    Err(e) if e.is_not_found() => {
                        trace!(label = %label, "value not found: {}", e);
                        Ok(None)
                    },
                    Err(e) => Err(e.context(format!("failed to get value '{}'", label))),
                }
            });

            let mut grouped = GroupedRows::new();
            for (label, values) in try_join_all(reads).await?.into_iter().flatten() {
                for (index, cell) in values {
                    grouped.entry(index).or_default().insert(label.clone(), cell);
                }
            }
            Ok(grouped)
        }
        .boxed()
    }
}

/// Error for a path that exists but has the wrong shape
pub(crate) fn shape_error(path: &str, expected: &str) -> ProbeError {
    ProbeError::invalid_class(format!("'{}' is not a {}", path, expected))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::mock::MockClient;
    use crate::query::Operator;
    use errors::ErrorKind;
    use std::sync::Arc;
    use tracing_test::traced_test;

    fn leaf(oid: &str) -> QueryLeaf {
        QueryLeaf::new(Oid::new(oid).unwrap())
    }

    fn tree(labels: &[(&str, &str)]) -> QueryTree {
        labels
            .iter()
            .fold(QueryTree::new(), |t, (label, oid)| t.with_leaf(*label, leaf(oid)))
    }

    #[tokio::test]
    async fn test_partial_rows() {
        let client = MockClient::new()
            .with_column("1.1", [(1, "a"), (2, "b")])
            .with_column("1.2", [(2, 20u64)]);
        let ctx = PollContext::new(Arc::new(client));

        let rows = tree(&[("x", "1.1"), ("y", "1.2")]).read_all(&ctx).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[&1].len(), 1);
        assert_eq!(rows[&1]["x"], Cell::Scalar(Value::from("a")));
        assert_eq!(rows[&2].len(), 2);
        assert_eq!(rows[&2]["y"], Cell::Scalar(Value::Unsigned(20)));
    }

    #[tokio::test]
    #[traced_test]
    async fn test_not_found_label_is_skipped() {
        let client = MockClient::new().with_column("1.1", [(1, "a")]);
        let ctx = PollContext::new(Arc::new(client));

        let rows = tree(&[("x", "1.1"), ("missing", "1.9")])
            .read_all(&ctx)
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert!(!rows[&1].contains_key("missing"));
        assert!(logs_contain("value not found"));
    }

    #[tokio::test]
    async fn test_zero_rows_is_ok() {
        let ctx = PollContext::new(Arc::new(MockClient::new()));
        let rows = tree(&[("x", "1.1")]).read_all(&ctx).await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_hard_failure_aborts() {
        let client = MockClient::new()
            .with_column("1.1", [(1, "a")])
            .with_failure("1.2", ErrorKind::Transport);
        let ctx = PollContext::new(Arc::new(client));

        let err = tree(&[("x", "1.1"), ("y", "1.2")])
            .read_all(&ctx)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);
        assert!(err.to_string().contains("failed to get value 'y'"));
    }

    #[tokio::test]
    async fn test_empty_strings_skipped_and_operator_failure_aborts() {
        let client = MockClient::new().with_column("1.1", [(1, ""), (2, "12"), (3, "bad")]);
        let ctx = PollContext::new(Arc::new(client));

        let lenient = QueryLeaf::new(Oid::new("1.1").unwrap());
        let values = lenient.read(&ctx).await.unwrap();
        assert_eq!(values.len(), 2);
        assert!(!values.contains_key(&1));

        let strict = lenient.with_operators(OperatorPipeline::new().with(Operator::ParseNumber));
        let err = strict.read(&ctx).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
    }

    #[tokio::test]
    async fn test_non_numeric_index_fails() {
        let client = MockClient::new().with_value("1.1.abc", "x");
        let ctx = PollContext::new(Arc::new(client));
        let err = leaf("1.1").read(&ctx).await.unwrap_err();
        assert!(err.to_string().contains("index isn't an integer"));
    }

    #[tokio::test]
    async fn test_nested_group_becomes_nested_row() {
        let client = MockClient::new()
            .with_column("1.1", [(4, "eth4")])
            .with_column("1.5", [(4, 100u64)]);
        let ctx = PollContext::new(Arc::new(client));

        let t = tree(&[("name", "1.1")]).with_group("sap", tree(&[("inbound", "1.5")]));
        let rows = t.read_all(&ctx).await.unwrap();
        let Cell::Row(sap) = &rows[&4]["sap"] else {
            panic!("expected nested row");
        };
        assert_eq!(sap["inbound"], Cell::Scalar(Value::Unsigned(100)));
    }

    fn slow_columns() -> MockClient {
        MockClient::new()
            .with_column("1.1", [(1, 10u64)])
            .with_column("1.2", [(1, 20u64)])
            .with_column("1.3", [(1, 30u64)])
            .with_column("1.4", [(1, 40u64)])
            .with_delay(std::time::Duration::from_millis(20))
    }

    fn four_labels() -> QueryTree {
        tree(&[("a", "1.1"), ("b", "1.2"), ("c", "1.3"), ("d", "1.4")])
    }

    #[tokio::test]
    async fn test_labels_read_concurrently() {
        let client = Arc::new(slow_columns());
        let ctx = PollContext::new(client.clone());

        let rows = four_labels().read_all(&ctx).await.unwrap();
        assert_eq!(rows[&1].len(), 4);
        assert_eq!(client.peak_in_flight(), 4);
    }

    #[tokio::test]
    async fn test_read_limit_bounds_reads_in_flight() {
        let client = Arc::new(slow_columns());
        let ctx = PollContext::new(client.clone()).with_max_concurrent_reads(1);

        let rows = four_labels().read_all(&ctx).await.unwrap();
        assert_eq!(rows[&1].len(), 4);
        assert_eq!(client.peak_in_flight(), 1);
        assert_eq!(client.total_reads(), 4);
    }

    #[test]
    fn test_lookup() {
        let t = QueryTree::new().with_group("cpu", tree(&[("load", "1.1")]));
        assert!(matches!(t.lookup("cpu.load"), Some(QueryNode::Leaf(_))));
        assert!(matches!(t.lookup("cpu"), Some(QueryNode::Group(_))));
        assert!(t.lookup("cpu.temperature").is_none());
        assert!(t.lookup("cpu.load.deeper").is_none());
        assert!(t.lookup("memory.usage").is_none());
    }
}
