//! Capability interfaces for storage backends
//!
//! A [`StorageMechanism`] is a storage backend (a browser database, a
//! directory on disk, process memory) owning one or more named
//! [`StorageCell`]s. These traits are the only contract the muxer relies on;
//! durability and internal concurrency belong to the implementations.

use crate::errors::StorageResult;
use crate::path::StorageCellPath;
use async_trait::async_trait;
use indexmap::IndexMap;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Shared handle to a live cell.
pub type CellRef = Arc<dyn StorageCell>;

/// A mechanism's cells keyed by cell name, in the mechanism's own order.
pub type CellMap = IndexMap<String, CellRef>;

/// A named partition of a mechanism, the unit of read/write access.
///
/// Stored payloads are opaque bytes; encoding them is the caller's concern.
/// Keys are assigned by the cell on insertion.
#[async_trait]
pub trait StorageCell: Send + Sync {
    /// Whether the cell's keys are predetermined.
    ///
    /// Cells with a fixed key space reject `add_*` operations and are never
    /// chosen as targets for new content.
    fn has_fixed_key_space(&self) -> bool;

    /// Store segments, returning their assigned keys in input order.
    async fn add_segments(&self, segments: Vec<Vec<u8>>) -> StorageResult<Vec<u64>>;

    /// Remove segments. Absent keys are ignored.
    async fn remove_segments(&self, keys: &[u64]) -> StorageResult<()>;

    /// Fetch segments in key order given. Fails if any key is absent.
    async fn get_segments(&self, keys: &[u64]) -> StorageResult<Vec<Vec<u8>>>;

    /// Store manifests, returning their assigned keys in input order.
    async fn add_manifests(&self, manifests: Vec<Vec<u8>>) -> StorageResult<Vec<u64>>;

    /// Replace the manifest stored under `key`. Fails if `key` is absent.
    async fn update_manifest(&self, key: u64, manifest: Vec<u8>) -> StorageResult<()>;

    /// Remove manifests. Absent keys are ignored.
    async fn remove_manifests(&self, keys: &[u64]) -> StorageResult<()>;

    /// Fetch manifests in key order given. Fails if any key is absent.
    async fn get_manifests(&self, keys: &[u64]) -> StorageResult<Vec<Vec<u8>>>;

    /// Every manifest in the cell keyed by its key.
    async fn get_all_manifests(&self) -> StorageResult<BTreeMap<u64, Vec<u8>>>;
}

/// A storage backend managing a set of named cells.
///
/// Lifecycle: constructed by a factory, then `init`, then usable. `erase`
/// wipes content and leaves the mechanism usable again once it resolves;
/// `destroy` is terminal and releases in-process resources only.
#[async_trait]
pub trait StorageMechanism: Send + Sync {
    /// Prepare the mechanism for use.
    async fn init(&self) -> StorageResult<()>;

    /// Release in-process resources. Stored content is not affected.
    async fn destroy(&self) -> StorageResult<()>;

    /// Remove all stored content and reinitialize.
    ///
    /// Cell handles obtained before the call may be stale afterwards;
    /// cell names are unchanged.
    async fn erase(&self) -> StorageResult<()>;

    /// Current cells keyed by name.
    fn get_cells(&self) -> CellMap;
}

impl fmt::Debug for dyn StorageCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageCell")
            .field("fixed_key_space", &self.has_fixed_key_space())
            .finish_non_exhaustive()
    }
}

/// A path together with the live cell it resolved to.
#[derive(Debug, Clone)]
pub struct StorageCellHandle {
    /// Stable address of the cell
    pub path: StorageCellPath,
    /// Live cell at the time of resolution
    pub cell: CellRef,
}
