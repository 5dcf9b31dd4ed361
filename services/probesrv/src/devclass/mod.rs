//! Device classes
//!
//! A [`DeviceClass`] is a named query tree plus the set of components the class
//! advertises. Classes form a single-inheritance tree: a derived class holds
//! its parent and a tree already merged over the parent's tree.
//!
//! The class step of a communicator only answers for paths the class's own
//! overlay defines (read through the merged tree); inherited paths are left to
//! the parent step, so an override registered in between is reached.
//!
//! Component flags follow a union-with-explicit-disable policy: a derived
//! class advertises everything its parent does, plus the components the
//! overlay enables, minus the components the overlay disables.

pub mod catalog;
pub mod overlay;

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use netprobe_model::ComponentKind;

use crate::query::QueryTree;

pub use catalog::{ClassCatalog, MemoryCatalog};
pub use overlay::{ClassOverlay, NodeSpec};

#[derive(Debug, Clone)]
pub struct DeviceClass {
    name: String,
    parent: Option<Arc<DeviceClass>>,
    tree: QueryTree,
    own: QueryTree,
    components: BTreeSet<ComponentKind>,
}

impl DeviceClass {
    /// Class without a parent
    pub fn root(
        name: impl Into<String>,
        tree: QueryTree,
        components: impl IntoIterator<Item = ComponentKind>,
    ) -> Self {
        Self {
            name: name.into(),
            parent: None,
            own: tree.clone(),
            tree,
            components: components.into_iter().collect(),
        }
    }

    /// Layer `tree` and component flags on top of `parent`
    ///
    /// `flags` maps a component to enabled (`true`) or disabled (`false`);
    /// components not listed keep the parent's setting.
    pub fn derive(
        parent: &Arc<DeviceClass>,
        name: impl Into<String>,
        tree: &QueryTree,
        flags: &BTreeMap<ComponentKind, bool>,
    ) -> Self {
        let mut components = parent.components.clone();
        for (kind, enabled) in flags {
            if *enabled {
                components.insert(*kind);
            } else {
                components.remove(kind);
            }
        }

        Self {
            name: name.into(),
            parent: Some(Arc::clone(parent)),
            own: tree.clone(),
            tree: parent.tree.merge(tree),
            components,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<&Arc<DeviceClass>> {
        self.parent.as_ref()
    }

    /// Merged query tree of this class
    pub fn tree(&self) -> &QueryTree {
        &self.tree
    }

    /// Whether this class's own overlay defines the dotted `path`
    pub fn declares(&self, path: &str) -> bool {
        self.own.lookup(path).is_some()
    }

    pub fn has_component(&self, kind: ComponentKind) -> bool {
        self.components.contains(&kind)
    }

    pub fn component_kinds(&self) -> &BTreeSet<ComponentKind> {
        &self.components
    }

    /// Names from this class up to the root
    pub fn lineage(&self) -> Vec<&str> {
        let mut names = vec![self.name.as_str()];
        let mut current = self.parent.as_deref();
        while let Some(class) = current {
            names.push(class.name.as_str());
            current = class.parent.as_deref();
        }
        names
    }
}
