//! # Cellmux Testkit
//!
//! Test doubles and fixtures for the storage muxer: scripted mechanisms
//! that can fail or stall on demand, probes counting their lifecycle calls,
//! registry fixtures, and test log setup.

#![forbid(unsafe_code)]

/// Registry fixtures
pub mod fixture;

/// Test log output
pub mod logging;

/// Scripted mechanisms and probes
pub mod mechanism;

pub use fixture::RegistryFixture;
pub use logging::init_test_tracing;
pub use mechanism::{Lifecycle, MechanismProbe, MechanismSpec, OpScript, ScriptedMechanism};
