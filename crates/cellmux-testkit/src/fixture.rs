//! Registry fixtures
//!
//! Builds an isolated [`MechanismRegistry`] of scripted mechanisms together
//! with the probes that observe them.

use crate::mechanism::{MechanismProbe, MechanismSpec, ScriptedMechanism};
use cellmux::MechanismRegistry;
use cellmux_core::StorageMechanism;
use indexmap::IndexMap;
use std::sync::Arc;

/// A registry plus one probe per registered mechanism
#[derive(Debug, Default)]
pub struct RegistryFixture {
    /// Registry to pass to `StorageMuxer::init`
    pub registry: MechanismRegistry,
    probes: IndexMap<String, MechanismProbe>,
}

impl RegistryFixture {
    /// Empty fixture
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a scripted mechanism built from `spec`, replacing any
    /// mechanism of the same name
    pub fn with(mut self, spec: MechanismSpec) -> Self {
        self.add(spec);
        self
    }

    /// Register a scripted mechanism in place
    pub fn add(&mut self, spec: MechanismSpec) -> MechanismProbe {
        let name = spec.name().to_owned();
        let spec = Arc::new(spec);
        let probe = MechanismProbe::default();

        let factory_probe = probe.clone();
        self.registry.register(name.clone(), move || {
            Box::new(ScriptedMechanism::new(Arc::clone(&spec), factory_probe.clone()))
                as Box<dyn StorageMechanism>
        });
        self.probes.insert(name, probe.clone());
        probe
    }

    /// Probe for the mechanism registered as `name`.
    ///
    /// # Panics
    ///
    /// Panics if no mechanism of that name was added; fixtures are test-only.
    #[allow(clippy::expect_used)]
    pub fn probe(&self, name: &str) -> &MechanismProbe {
        self.probes
            .get(name)
            .expect("no scripted mechanism registered under that name")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factories_count_constructions() {
        let fixture = RegistryFixture::new()
            .with(MechanismSpec::new("A").writable_cell("c"))
            .with(MechanismSpec::new("B"));

        assert_eq!(fixture.registry.names().collect::<Vec<_>>(), ["A", "B"]);
        assert_eq!(fixture.probe("A").constructed(), 0);
    }
}
