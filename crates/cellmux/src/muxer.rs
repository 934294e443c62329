//! Storage muxer
//!
//! Owns one live instance per registered mechanism and answers addressing
//! and enumeration queries across all of them.
//!
//! Lifecycle calls (`init`, `destroy`) take `&mut self`, so a single caller
//! drives them sequentially. Queries take `&self` and only read.

use crate::fanout::{settle_all, LifecycleOp, Settlement};
use crate::registry::MechanismRegistry;
use cellmux_core::{
    CellRef, InitFailurePolicy, MuxerConfig, StorageCellHandle, StorageCellPath, StorageError,
    StorageMechanism, StorageResult,
};
use indexmap::IndexMap;
use std::fmt;
use tracing::{debug, info, instrument, warn};

/// Addressing and lifecycle broker over a set of storage mechanisms
#[derive(Default)]
pub struct StorageMuxer {
    config: MuxerConfig,
    mechanisms: IndexMap<String, Box<dyn StorageMechanism>>,
}

impl StorageMuxer {
    /// Create an empty muxer with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty muxer
    pub fn with_config(config: MuxerConfig) -> Self {
        Self {
            config,
            mechanisms: IndexMap::new(),
        }
    }

    /// Active configuration
    pub fn config(&self) -> &MuxerConfig {
        &self.config
    }

    /// Instantiate every mechanism in `registry` and initialize them concurrently.
    ///
    /// The muxer's mechanisms become exactly the registry's entries at the
    /// time of the call; later registry changes do not affect it. Any
    /// previously held instances are dropped without being destroyed, so
    /// call [`destroy`](Self::destroy) first when re-initializing.
    ///
    /// Fails with the first mechanism failure to settle. Under
    /// [`InitFailurePolicy::Retain`] all constructed mechanisms stay in the
    /// muxer; under [`InitFailurePolicy::Teardown`] they are destroyed and
    /// the muxer is left empty.
    #[instrument(skip_all, fields(mechanisms = registry.len()))]
    pub async fn init(&mut self, registry: &MechanismRegistry) -> StorageResult<()> {
        if !self.mechanisms.is_empty() {
            warn!(
                held = self.mechanisms.len(),
                "re-initializing without destroy; dropping held mechanisms"
            );
        }

        self.mechanisms = registry
            .entries()
            .map(|(name, factory)| (name.to_owned(), factory()))
            .collect();

        let settlement = self.fan_out(LifecycleOp::Init).await;
        let Some(error) = settlement.first_failure else {
            info!(launched = settlement.launched, "storage mechanisms initialized");
            return Ok(());
        };

        warn!(
            failed = settlement.failed,
            launched = settlement.launched,
            policy = ?self.config.init_failure,
            "storage mechanism initialization failed"
        );

        if self.config.init_failure == InitFailurePolicy::Teardown {
            if let Err(teardown_error) = self.fan_out(LifecycleOp::Destroy).await.into_result() {
                warn!(%teardown_error, "teardown after failed init also failed");
            }
            self.mechanisms.clear();
        }

        Err(error)
    }

    /// Destroy every held mechanism concurrently, then forget all of them.
    ///
    /// The muxer is empty afterwards even if some destroys failed. Stored
    /// content is untouched. Calling this on an empty muxer is a no-op.
    #[instrument(skip_all, fields(mechanisms = self.mechanisms.len()))]
    pub async fn destroy(&mut self) -> StorageResult<()> {
        let settlement = self.fan_out(LifecycleOp::Destroy).await;
        self.mechanisms.clear();
        info!(
            launched = settlement.launched,
            failed = settlement.failed,
            "storage mechanisms destroyed"
        );
        settlement.into_result()
    }

    /// Erase every held mechanism concurrently.
    ///
    /// Each mechanism is usable again once its erase resolves. Cell handles
    /// taken earlier must be discarded; paths remain valid.
    #[instrument(skip_all, fields(mechanisms = self.mechanisms.len()))]
    pub async fn erase(&self) -> StorageResult<()> {
        let settlement = self.fan_out(LifecycleOp::Erase).await;
        info!(
            launched = settlement.launched,
            failed = settlement.failed,
            "storage mechanisms erased"
        );
        settlement.into_result()
    }

    /// Paths of every cell that accepts new keys, mechanisms then cells in
    /// enumeration order.
    pub fn find_active(&self) -> Vec<StorageCellPath> {
        let mut active = Vec::new();
        self.for_each_cell(|path, cell| {
            if !cell.has_fixed_key_space() {
                active.push(path.clone());
            }
        });
        active
    }

    /// First cell that accepts new keys.
    pub fn get_active(&self) -> StorageResult<StorageCellHandle> {
        for (mechanism_name, mechanism) in &self.mechanisms {
            if let Some((cell_name, cell)) = mechanism
                .get_cells()
                .into_iter()
                .find(|(_, cell)| !cell.has_fixed_key_space())
            {
                return Ok(StorageCellHandle {
                    path: StorageCellPath::new(mechanism_name.as_str(), cell_name),
                    cell,
                });
            }
        }
        Err(StorageError::missing_storage_cell(
            "Could not find a cell that supports add-operations",
        ))
    }

    /// Visit every cell of every mechanism, fixed key space or not.
    pub fn for_each_cell<F>(&self, mut callback: F)
    where
        F: FnMut(&StorageCellPath, &CellRef),
    {
        for (mechanism_name, mechanism) in &self.mechanisms {
            for (cell_name, cell) in &mechanism.get_cells() {
                let path = StorageCellPath::new(mechanism_name.as_str(), cell_name.as_str());
                callback(&path, cell);
            }
        }
    }

    /// Look up a cell that must exist.
    ///
    /// Fails with `MISSING_STORAGE_CELL` naming whichever lookup missed.
    pub fn get_cell(&self, mechanism_name: &str, cell_name: &str) -> StorageResult<CellRef> {
        let Some(mechanism) = self.mechanisms.get(mechanism_name) else {
            debug!(mechanism = mechanism_name, "get_cell: unknown mechanism");
            return Err(StorageError::missing_storage_cell(format!(
                "Could not find mechanism with name {mechanism_name}"
            )));
        };

        mechanism.get_cells().get(cell_name).cloned().ok_or_else(|| {
            debug!(mechanism = mechanism_name, cell = cell_name, "get_cell: unknown cell");
            StorageError::missing_storage_cell(format!(
                "Could not find cell with name {cell_name} in mechanism {mechanism_name}"
            ))
        })
    }

    /// Look up a cell that may have vanished. Never fails.
    pub fn resolve_path(&self, path: &StorageCellPath) -> Option<CellRef> {
        let cell = self
            .mechanisms
            .get(path.mechanism())
            .and_then(|mechanism| mechanism.get_cells().get(path.cell()).cloned());
        if cell.is_none() {
            debug!(%path, "resolve_path: no such cell");
        }
        cell
    }

    /// Names of held mechanisms in enumeration order
    pub fn mechanism_names(&self) -> impl Iterator<Item = &str> {
        self.mechanisms.keys().map(String::as_str)
    }

    /// Held mechanism by name
    pub fn mechanism(&self, name: &str) -> Option<&dyn StorageMechanism> {
        let mechanism = self.mechanisms.get(name)?;
        Some(mechanism.as_ref())
    }

    /// Whether any mechanism is held
    pub fn is_initialized(&self) -> bool {
        !self.mechanisms.is_empty()
    }

    async fn fan_out(&self, op: LifecycleOp) -> Settlement {
        settle_all(
            op,
            self.mechanisms
                .iter()
                .map(|(name, mechanism)| (name.as_str(), mechanism.as_ref())),
        )
        .await
    }
}

impl fmt::Debug for StorageMuxer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageMuxer")
            .field("config", &self.config)
            .field("mechanisms", &self.mechanisms.keys().collect::<Vec<_>>())
            .finish()
    }
}
