//! Serializable class definitions
//!
//! A [`ClassOverlay`] describes one class the way it appears in a data file:
//!
//! ```yaml
//! name: timos/sas
//! parent: timos
//! components:
//!   ups: false
//! properties:
//!   cpu:
//!     load:
//!       oid: 1.3.6.1.4.1.6527.3.1.2.1.1.1
//!       operators:
//!         - type: parse_number
//! ```
//!
//! A path the overlay defines is answered by the class step, ahead of any
//! override registered for the class. Defining `interfaces` in the `timos/sas`
//! overlay therefore bypasses the SAP correlation override.
//!
//! Overlays are turned into [`DeviceClass`](super::DeviceClass)es by a catalog.

use std::collections::BTreeMap;

use errors::{ProbeError, Result};
use netprobe_model::ComponentKind;
use serde::{Deserialize, Serialize};

use crate::query::{Oid, Operator, OperatorPipeline, QueryLeaf, QueryNode, QueryTree};

/// Leaf definition: a locator and its operators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LeafSpec {
    pub oid: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub operators: Vec<Operator>,
}

/// Node definition: a leaf or a nested group of labels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeSpec {
    Leaf(LeafSpec),
    Group(BTreeMap<String, NodeSpec>),
}

impl NodeSpec {
    fn build(&self, path: &str) -> Result<QueryNode> {
        match self {
            NodeSpec::Leaf(leaf) => {
                let oid = Oid::new(&leaf.oid).map_err(|e| e.context(format!("label '{}'", path)))?;
                Ok(QueryNode::Leaf(
                    QueryLeaf::new(oid).with_operators(OperatorPipeline::from(leaf.operators.clone())),
                ))
            },
            NodeSpec::Group(children) => Ok(QueryNode::Group(build_tree(children, path)?)),
        }
    }
}

fn build_tree(specs: &BTreeMap<String, NodeSpec>, prefix: &str) -> Result<QueryTree> {
    let mut tree = QueryTree::new();
    for (label, spec) in specs {
        if label.is_empty() || label.contains('.') {
            return Err(ProbeError::invalid_class(format!(
                "invalid label '{}' under '{}'",
                label, prefix
            )));
        }
        let path = if prefix.is_empty() {
            label.clone()
        } else {
            format!("{}.{}", prefix, label)
        };
        tree.insert(label.clone(), spec.build(&path)?);
    }
    Ok(tree)
}

/// One class definition as data
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassOverlay {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    /// Enabled (`true`) or disabled (`false`) components; unlisted ones are inherited
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub components: BTreeMap<ComponentKind, bool>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, NodeSpec>,
}

impl ClassOverlay {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn with_component(mut self, kind: ComponentKind, enabled: bool) -> Self {
        self.components.insert(kind, enabled);
        self
    }

    /// Add a leaf at a dotted path, creating groups on the way
    pub fn with_leaf(mut self, path: &str, oid: &str) -> Self {
        insert_path(&mut self.properties, path, NodeSpec::Leaf(LeafSpec {
            oid: oid.to_string(),
            operators: Vec::new(),
        }));
        self
    }

    /// Add a leaf with operators at a dotted path
    pub fn with_leaf_ops(mut self, path: &str, oid: &str, operators: Vec<Operator>) -> Self {
        insert_path(&mut self.properties, path, NodeSpec::Leaf(LeafSpec {
            oid: oid.to_string(),
            operators,
        }));
        self
    }

    /// Compile the property definitions into a query tree
    pub fn query_tree(&self) -> Result<QueryTree> {
        build_tree(&self.properties, "")
            .map_err(|e| e.context(format!("class '{}'", self.name)))
    }
}

fn insert_path(specs: &mut BTreeMap<String, NodeSpec>, path: &str, node: NodeSpec) {
    match path.split_once('.') {
        None => {
            specs.insert(path.to_string(), node);
        },
        Some((head, rest)) => {
            let entry = specs
                .entry(head.to_string())
                .or_insert_with(|| NodeSpec::Group(BTreeMap::new()));
            if !matches!(entry, NodeSpec::Group(_)) {
                *entry = NodeSpec::Group(BTreeMap::new());
            }
            if let NodeSpec::Group(children) = entry {
                insert_path(children, rest, node);
            }
        },
    }
}
