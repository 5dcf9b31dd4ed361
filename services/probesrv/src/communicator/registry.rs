//! Hand-written overrides keyed by class name

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use super::{CommunicatorNode, DeviceCommunicator};
use crate::vendors::TimosSasCommunicator;

/// Builds the override for one class, given the parent node it may delegate to
pub type OverrideFactory =
    Arc<dyn Fn(Option<Arc<CommunicatorNode>>) -> Arc<dyn DeviceCommunicator> + Send + Sync>;

/// Override factories by class name
#[derive(Clone, Default)]
pub struct OverrideRegistry {
    factories: HashMap<String, OverrideFactory>,
}

impl std::fmt::Debug for OverrideRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut classes: Vec<_> = self.factories.keys().collect();
        classes.sort();
        f.debug_struct("OverrideRegistry")
            .field("classes", &classes)
            .finish()
    }
}

impl OverrideRegistry {
    /// Registry without any overrides
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in vendor overrides
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("timos/sas", |sub| {
            Arc::new(TimosSasCommunicator::new(sub)) as Arc<dyn DeviceCommunicator>
        });
        registry
    }

    /// Register (or replace) the override for `class`
    pub fn register<F>(&mut self, class: impl Into<String>, factory: F)
    where
        F: Fn(Option<Arc<CommunicatorNode>>) -> Arc<dyn DeviceCommunicator> + Send + Sync + 'static,
    {
        let class = class.into();
        debug!(class = %class, "Override registered");
        self.factories.insert(class, Arc::new(factory));
    }

    pub fn contains(&self, class: &str) -> bool {
        self.factories.contains_key(class)
    }

    /// Instantiate the override for `class`, if one is registered
    pub fn create(
        &self,
        class: &str,
        sub: Option<Arc<CommunicatorNode>>,
    ) -> Option<Arc<dyn DeviceCommunicator>> {
        self.factories.get(class).map(|factory| factory(sub))
    }
}
