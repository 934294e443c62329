//! Mechanism registry
//!
//! Maps mechanism names to factories. A registry is built at start-up,
//! populated by whichever backends the process supports, and handed to
//! [`StorageMuxer::init`](crate::StorageMuxer::init), which reads it once.

use crate::memory::MemoryMechanism;
use cellmux_core::{CellmuxConfig, StorageMechanism, StorageResult};
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Constructs a fresh, uninitialized mechanism instance.
pub type MechanismFactory = Arc<dyn Fn() -> Box<dyn StorageMechanism> + Send + Sync>;

/// Name-keyed table of mechanism factories, in registration order.
#[derive(Clone, Default)]
pub struct MechanismRegistry {
    factories: IndexMap<String, MechanismFactory>,
}

impl MechanismRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the factory for `name`.
    ///
    /// Replacing keeps the name's original position. Muxers that were
    /// already initialized are not affected.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn() -> Box<dyn StorageMechanism> + Send + Sync + 'static,
    {
        let name = name.into();
        debug!(mechanism = %name, "registering storage mechanism");
        self.factories.insert(name, Arc::new(factory));
    }

    /// Remove the factory for `name`, if any.
    pub fn unregister(&mut self, name: &str) {
        if self.factories.shift_remove(name).is_some() {
            debug!(mechanism = %name, "unregistered storage mechanism");
        }
    }

    /// Register a [`MemoryMechanism`] for every `[[memory]]` entry.
    pub fn register_memory_mechanisms(&mut self, config: &CellmuxConfig) -> StorageResult<()> {
        config.validate()?;
        for mechanism in &config.memory {
            let mechanism = mechanism.clone();
            let name = mechanism.name.clone();
            self.register(name, move || {
                Box::new(MemoryMechanism::new(mechanism.clone())) as Box<dyn StorageMechanism>
            });
        }
        Ok(())
    }

    /// Whether `name` is registered
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered names in registration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    /// Number of registered mechanisms
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Whether nothing is registered
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Whether offline storage is available at all
    pub fn is_supported(&self) -> bool {
        !self.is_empty()
    }

    pub(crate) fn entries(&self) -> impl Iterator<Item = (&str, &MechanismFactory)> {
        self.factories.iter().map(|(name, factory)| (name.as_str(), factory))
    }
}

impl fmt::Debug for MechanismRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MechanismRegistry")
            .field("mechanisms", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cellmux_core::{CellConfig, MemoryMechanismConfig};

    fn memory(name: &str) -> impl Fn() -> Box<dyn StorageMechanism> + Send + Sync + 'static {
        let config = MemoryMechanismConfig::new(name).with_cell(CellConfig::writable("c"));
        move || Box::new(MemoryMechanism::new(config.clone())) as Box<dyn StorageMechanism>
    }

    #[test]
    fn test_register_and_unregister() {
        let mut registry = MechanismRegistry::new();
        assert!(!registry.is_supported());

        registry.register("a", memory("a"));
        registry.register("b", memory("b"));
        assert!(registry.contains("a"));
        assert_eq!(registry.names().collect::<Vec<_>>(), ["a", "b"]);

        registry.unregister("a");
        assert!(!registry.contains("a"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_unregister_absent_is_noop() {
        let mut registry = MechanismRegistry::new();
        registry.register("a", memory("a"));
        registry.unregister("zzz");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_reregister_replaces_in_place() {
        let mut registry = MechanismRegistry::new();
        registry.register("a", memory("a"));
        registry.register("b", memory("b"));
        registry.register("a", memory("a"));
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.names().collect::<Vec<_>>(), ["a", "b"]);
    }

    #[test]
    fn test_register_memory_mechanisms_from_config() {
        let config = CellmuxConfig::from_toml_str(
            r#"
            [[memory]]
            name = "scratch"
            cells = [{ name = "v1" }]

            [[memory]]
            name = "archive"
            cells = [{ name = "v0", fixed_key_space = true }]
            "#,
        )
        .unwrap();

        let mut registry = MechanismRegistry::new();
        registry.register_memory_mechanisms(&config).unwrap();
        assert_eq!(registry.names().collect::<Vec<_>>(), ["scratch", "archive"]);
    }

    #[test]
    fn test_clones_are_independent() {
        let mut registry = MechanismRegistry::new();
        registry.register("a", memory("a"));
        let snapshot = registry.clone();
        registry.unregister("a");
        assert!(snapshot.contains("a"));
    }
}
