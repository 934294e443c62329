//! In-memory storage mechanism
//!
//! Keeps every cell's content in process memory. Useful where no persistent
//! backend is available and as a reference implementation of the mechanism
//! contract: `erase` swaps in fresh cells under the same names, so handles
//! taken before an erase keep pointing at the old, orphaned content.

use async_trait::async_trait;
use cellmux_core::{
    CellMap, CellRef, MemoryMechanismConfig, StorageCell, StorageError, StorageMechanism,
    StorageResult,
};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock as AsyncRwLock;
use tracing::debug;

type Table = AsyncRwLock<BTreeMap<u64, Vec<u8>>>;

/// A cell whose segments and manifests live in memory
pub struct MemoryCell {
    name: String,
    fixed_key_space: bool,
    next_key: AtomicU64,
    segments: Table,
    manifests: Table,
}

impl MemoryCell {
    /// Create an empty cell
    pub fn new(name: impl Into<String>, fixed_key_space: bool) -> Self {
        Self {
            name: name.into(),
            fixed_key_space,
            next_key: AtomicU64::new(0),
            segments: Table::default(),
            manifests: Table::default(),
        }
    }

    /// Cell name
    pub fn name(&self) -> &str {
        &self.name
    }

    async fn add(&self, table: &Table, values: Vec<Vec<u8>>) -> StorageResult<Vec<u64>> {
        if self.fixed_key_space {
            return Err(StorageError::new_key_operation_not_supported(&self.name));
        }

        let mut entries = table.write().await;
        let keys = values
            .into_iter()
            .map(|value| {
                let key = self.next_key.fetch_add(1, Ordering::Relaxed);
                entries.insert(key, value);
                key
            })
            .collect();
        Ok(keys)
    }

    async fn get(&self, table: &Table, keys: &[u64]) -> StorageResult<Vec<Vec<u8>>> {
        let entries = table.read().await;
        keys.iter()
            .map(|key| {
                entries
                    .get(key)
                    .cloned()
                    .ok_or_else(|| StorageError::key_not_found(&self.name, *key))
            })
            .collect()
    }

    async fn remove(table: &Table, keys: &[u64]) {
        let mut entries = table.write().await;
        for key in keys {
            entries.remove(key);
        }
    }
}

#[async_trait]
impl StorageCell for MemoryCell {
    fn has_fixed_key_space(&self) -> bool {
        self.fixed_key_space
    }

    async fn add_segments(&self, segments: Vec<Vec<u8>>) -> StorageResult<Vec<u64>> {
        self.add(&self.segments, segments).await
    }

    async fn remove_segments(&self, keys: &[u64]) -> StorageResult<()> {
        Self::remove(&self.segments, keys).await;
        Ok(())
    }

    async fn get_segments(&self, keys: &[u64]) -> StorageResult<Vec<Vec<u8>>> {
        self.get(&self.segments, keys).await
    }

    async fn add_manifests(&self, manifests: Vec<Vec<u8>>) -> StorageResult<Vec<u64>> {
        self.add(&self.manifests, manifests).await
    }

    async fn update_manifest(&self, key: u64, manifest: Vec<u8>) -> StorageResult<()> {
        let mut entries = self.manifests.write().await;
        match entries.get_mut(&key) {
            Some(slot) => {
                *slot = manifest;
                Ok(())
            }
            None => Err(StorageError::key_not_found(&self.name, key)),
        }
    }

    async fn remove_manifests(&self, keys: &[u64]) -> StorageResult<()> {
        Self::remove(&self.manifests, keys).await;
        Ok(())
    }

    async fn get_manifests(&self, keys: &[u64]) -> StorageResult<Vec<Vec<u8>>> {
        self.get(&self.manifests, keys).await
    }

    async fn get_all_manifests(&self) -> StorageResult<BTreeMap<u64, Vec<u8>>> {
        Ok(self.manifests.read().await.clone())
    }
}

/// Mechanism whose cells are [`MemoryCell`]s declared by configuration
pub struct MemoryMechanism {
    config: MemoryMechanismConfig,
    cells: RwLock<CellMap>,
}

impl MemoryMechanism {
    /// Create an uninitialized mechanism; cells appear on `init`
    pub fn new(config: MemoryMechanismConfig) -> Self {
        Self {
            config,
            cells: RwLock::new(CellMap::new()),
        }
    }

    /// Mechanism name from configuration
    pub fn name(&self) -> &str {
        &self.config.name
    }

    fn fresh_cells(&self) -> CellMap {
        self.config
            .cells
            .iter()
            .map(|cell| {
                let handle: CellRef = Arc::new(MemoryCell::new(&cell.name, cell.fixed_key_space));
                (cell.name.clone(), handle)
            })
            .collect()
    }
}

#[async_trait]
impl StorageMechanism for MemoryMechanism {
    async fn init(&self) -> StorageResult<()> {
        self.config.validate()?;
        *self.cells.write() = self.fresh_cells();
        debug!(mechanism = %self.name(), cells = self.config.cells.len(), "memory mechanism initialized");
        Ok(())
    }

    async fn destroy(&self) -> StorageResult<()> {
        self.cells.write().clear();
        Ok(())
    }

    async fn erase(&self) -> StorageResult<()> {
        *self.cells.write() = self.fresh_cells();
        debug!(mechanism = %self.name(), "memory mechanism erased");
        Ok(())
    }

    fn get_cells(&self) -> CellMap {
        self.cells.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cellmux_core::{CellConfig, ErrorKind};

    fn mechanism() -> MemoryMechanism {
        MemoryMechanism::new(
            MemoryMechanismConfig::new("memory")
                .with_cell(CellConfig::fixed("v1"))
                .with_cell(CellConfig::writable("v2")),
        )
    }

    #[tokio::test]
    async fn test_cells_appear_on_init() {
        let mechanism = mechanism();
        assert!(mechanism.get_cells().is_empty());

        mechanism.init().await.unwrap();
        let cells = mechanism.get_cells();
        assert_eq!(cells.keys().collect::<Vec<_>>(), ["v1", "v2"]);
        assert!(cells["v1"].has_fixed_key_space());
        assert!(!cells["v2"].has_fixed_key_space());
    }

    #[tokio::test]
    async fn test_segment_and_manifest_storage() {
        let cell = MemoryCell::new("v2", false);

        let keys = cell
            .add_segments(vec![b"seg-a".to_vec(), b"seg-b".to_vec()])
            .await
            .unwrap();
        assert_eq!(keys.len(), 2);
        assert_eq!(
            cell.get_segments(&[keys[1], keys[0]]).await.unwrap(),
            vec![b"seg-b".to_vec(), b"seg-a".to_vec()]
        );

        let manifest = cell.add_manifests(vec![b"m".to_vec()]).await.unwrap()[0];
        cell.update_manifest(manifest, b"m2".to_vec()).await.unwrap();
        let all = cell.get_all_manifests().await.unwrap();
        assert_eq!(all.get(&manifest), Some(&b"m2".to_vec()));

        cell.remove_segments(&[keys[0], 9999]).await.unwrap();
        let err = cell.get_segments(&[keys[0]]).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::KeyNotFound);
    }

    #[tokio::test]
    async fn test_fixed_cell_rejects_new_keys() {
        let cell = MemoryCell::new("v1", true);
        let err = cell.add_manifests(vec![b"m".to_vec()]).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NewKeyOperationNotSupported);

        let err = cell.update_manifest(3, b"m".to_vec()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::KeyNotFound);
    }

    #[tokio::test]
    async fn test_erase_replaces_cells() {
        let mechanism = mechanism();
        mechanism.init().await.unwrap();

        let before = Arc::clone(&mechanism.get_cells()["v2"]);
        before.add_segments(vec![b"x".to_vec()]).await.unwrap();

        mechanism.erase().await.unwrap();
        let after = Arc::clone(&mechanism.get_cells()["v2"]);

        assert!(!Arc::ptr_eq(&before, &after));
        assert!(after.get_all_manifests().await.unwrap().is_empty());
        assert!(after.add_segments(vec![b"y".to_vec()]).await.is_ok());
    }

    #[tokio::test]
    async fn test_destroy_drops_cells() {
        let mechanism = mechanism();
        mechanism.init().await.unwrap();
        mechanism.destroy().await.unwrap();
        assert!(mechanism.get_cells().is_empty());
    }
}
