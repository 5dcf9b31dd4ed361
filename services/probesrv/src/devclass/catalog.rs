//! Device class catalogs

use std::collections::HashMap;
use std::sync::Arc;

use errors::{ProbeError, Result};
use tracing::debug;

use super::{ClassOverlay, DeviceClass};

/// Supplies immutable, pre-merged device classes by name
pub trait ClassCatalog: Send + Sync {
    fn class(&self, name: &str) -> Result<Arc<DeviceClass>>;

    fn class_names(&self) -> Vec<String>;
}

/// Catalog held in memory
#[derive(Debug, Default, Clone)]
pub struct MemoryCatalog {
    classes: HashMap<String, Arc<DeviceClass>>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, class: DeviceClass) -> Arc<DeviceClass> {
        let class = Arc::new(class);
        self.classes
            .insert(class.name().to_string(), Arc::clone(&class));
        class
    }

    /// Build every class from its overlay, deriving children from parents
    ///
    /// Overlays may appear in any order. A missing parent or an inheritance
    /// cycle is an invalid class definition.
    pub fn from_overlays(overlays: impl IntoIterator<Item = ClassOverlay>) -> Result<Self> {
        let mut catalog = Self::new();
        let mut pending: Vec<ClassOverlay> = overlays.into_iter().collect();

        while !pending.is_empty() {
            let before = pending.len();
            let mut deferred = Vec::new();

            for overlay in pending {
                if catalog.classes.contains_key(&overlay.name) {
                    return Err(ProbeError::invalid_class(format!(
                        "duplicate class '{}'",
                        overlay.name
                    )));
                }
                let parent = overlay
                    .parent
                    .as_ref()
                    .map(|name| catalog.classes.get(name).cloned());
                match parent {
                    None => {
                        let tree = overlay.query_tree()?;
                        let enabled = overlay
                            .components
                            .iter()
                            .filter(|(_, enabled)| **enabled)
                            .map(|(kind, _)| *kind);
                        catalog.insert(DeviceClass::root(&overlay.name, tree, enabled));
                    },
                    Some(Some(parent)) => {
                        let tree = overlay.query_tree()?;
                        catalog.insert(DeviceClass::derive(
                            &parent,
                            &overlay.name,
                            &tree,
                            &overlay.components,
                        ));
                    },
                    Some(None) => deferred.push(overlay),
                }
            }

            if deferred.len() == before {
                let names: Vec<_> = deferred.iter().map(|o| o.name.as_str()).collect();
                return Err(ProbeError::invalid_class(format!(
                    "unresolvable parents for classes: {}",
                    names.join(", ")
                )));
            }
            pending = deferred;
        }

        debug!(classes = catalog.classes.len(), "Class catalog built");
        Ok(catalog)
    }

    /// Parse a YAML list of class overlays
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let overlays: Vec<ClassOverlay> = serde_yaml::from_str(yaml)?;
        Self::from_overlays(overlays)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl ClassCatalog for MemoryCatalog {
    fn class(&self, name: &str) -> Result<Arc<DeviceClass>> {
        self.classes
            .get(name)
            .cloned()
            .ok_or_else(|| ProbeError::not_found(format!("device class '{}'", name)))
    }

    fn class_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.classes.keys().cloned().collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use netprobe_model::ComponentKind;

    const CLASSES: &str = r#"
- name: timos/sas
  parent: timos
  properties:
    cpu:
      load:
        oid: 1.3.6.1.4.1.6527.3.1.2.1.1.1
- name: generic
  components:
    interfaces: true
  properties:
    identify:
      vendor:
        oid: 1.3.6.1.2.1.1.1.0
- name: timos
  parent: generic
  components:
    cpu: true
"#;

    #[test]
    fn test_out_of_order_overlays() {
        let catalog = MemoryCatalog::from_yaml(CLASSES).unwrap();
        assert_eq!(catalog.class_names(), vec!["generic", "timos", "timos/sas"]);

        let sas = catalog.class("timos/sas").unwrap();
        assert_eq!(sas.lineage(), vec!["timos/sas", "timos", "generic"]);
        assert!(sas.has_component(ComponentKind::Cpu));
        assert!(sas.has_component(ComponentKind::Interfaces));
        assert!(sas.tree().lookup("identify.vendor").is_some());
        assert!(sas.tree().lookup("cpu.load").is_some());

        let timos = catalog.class("timos").unwrap();
        assert!(timos.tree().lookup("cpu.load").is_none());
    }

    #[test]
    fn test_missing_parent() {
        let err = MemoryCatalog::from_overlays([ClassOverlay::new("child").with_parent("ghost")])
            .unwrap_err();
        assert_eq!(err.kind(), errors::ErrorKind::InvalidClass);
        assert!(err.to_string().contains("child"));
    }

    #[test]
    fn test_cycle_is_rejected() {
        let err = MemoryCatalog::from_overlays([
            ClassOverlay::new("a").with_parent("b"),
            ClassOverlay::new("b").with_parent("a"),
        ])
        .unwrap_err();
        assert_eq!(err.kind(), errors::ErrorKind::InvalidClass);
    }

    #[test]
    fn test_unknown_class_is_not_found() {
        let catalog = MemoryCatalog::new();
        assert!(catalog.class("nope").unwrap_err().is_not_found());
        assert!(catalog.is_empty());
    }
}
