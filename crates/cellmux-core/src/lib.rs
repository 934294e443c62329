//! # Cellmux Core - Storage Cell Domain
//!
//! **Purpose**: Define the addressing types, capability traits and errors
//! shared by the storage muxer and by storage mechanism implementations.
//!
//! # Architecture Constraints
//!
//! - YES Storage cell paths and handles
//! - YES `StorageMechanism` / `StorageCell` capability interfaces
//! - YES Unified storage error type
//! - YES Configuration types
//! - NO mechanism registry or muxer orchestration (that's `cellmux`)
//! - NO test doubles (that's `cellmux-testkit`)

#![forbid(unsafe_code)]

/// Muxer and in-memory mechanism configuration
pub mod config;

/// Unified storage error types
pub mod errors;

/// Storage mechanism and cell capability traits
pub mod mechanism;

/// Stable cell addressing
pub mod path;

pub use config::{
    CellConfig, CellmuxConfig, InitFailurePolicy, MemoryMechanismConfig, MuxerConfig,
};
pub use errors::{Category, ErrorKind, Severity, StorageError, StorageResult};
pub use mechanism::{CellMap, CellRef, StorageCell, StorageCellHandle, StorageMechanism};
pub use path::StorageCellPath;
