//! # Cellmux - Storage Muxer
//!
//! **Purpose**: Broker addressing and lifecycle across pluggable storage
//! mechanisms, each exposing named cells.
//!
//! A process builds a [`MechanismRegistry`] at start-up, registering a factory
//! per backend it supports. A [`StorageMuxer`] turns that registry into live,
//! initialized mechanisms and then answers:
//!
//! - which cells accept new content ([`StorageMuxer::find_active`])
//! - what cells exist at all ([`StorageMuxer::for_each_cell`])
//! - which live cell a [`StorageCellPath`] names ([`StorageMuxer::get_cell`],
//!   [`StorageMuxer::resolve_path`])
//!
//! Bulk lifecycle operations (`init`, `destroy`, `erase`) fan out to every
//! mechanism concurrently and succeed only if all of them do.
//!
//! ```rust,ignore
//! let mut registry = MechanismRegistry::new();
//! registry.register_memory_mechanisms(&CellmuxConfig::load_from_file(path)?)?;
//!
//! let mut muxer = StorageMuxer::with_config(config.muxer.clone());
//! muxer.init(&registry).await?;
//! let target = muxer.get_active()?;
//! target.cell.add_manifests(vec![manifest]).await?;
//! ```

#![forbid(unsafe_code)]

mod fanout;

/// In-memory storage mechanism
pub mod memory;

/// Storage muxer orchestration
pub mod muxer;

/// Mechanism factory registry
pub mod registry;

pub use memory::{MemoryCell, MemoryMechanism};
pub use muxer::StorageMuxer;
pub use registry::{MechanismFactory, MechanismRegistry};

// Re-export the domain crate so callers need a single dependency
pub use cellmux_core::{
    Category, CellConfig, CellMap, CellRef, CellmuxConfig, ErrorKind, InitFailurePolicy,
    MemoryMechanismConfig, MuxerConfig, Severity, StorageCell, StorageCellHandle,
    StorageCellPath, StorageError, StorageMechanism, StorageResult,
};
