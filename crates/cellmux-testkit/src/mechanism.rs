//! Scripted storage mechanisms
//!
//! A [`ScriptedMechanism`] behaves like a real backend (its cells are
//! [`MemoryCell`]s) but each lifecycle operation can be told to fail or to
//! take time, and every call is counted on a shared [`MechanismProbe`].

use async_trait::async_trait;
use cellmux::MemoryCell;
use cellmux_core::{CellConfig, CellMap, CellRef, StorageError, StorageMechanism, StorageResult};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Mechanism lifecycle operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// `StorageMechanism::init`
    Init,
    /// `StorageMechanism::destroy`
    Destroy,
    /// `StorageMechanism::erase`
    Erase,
}

/// How one lifecycle operation behaves
#[derive(Debug, Clone, Default)]
pub struct OpScript {
    /// Time to spend before settling
    pub delay: Option<Duration>,
    /// Error to settle with, if any
    pub failure: Option<StorageError>,
}

/// Blueprint for scripted mechanism instances
#[derive(Debug, Clone)]
pub struct MechanismSpec {
    name: String,
    cells: Vec<CellConfig>,
    init: OpScript,
    destroy: OpScript,
    erase: OpScript,
}

impl MechanismSpec {
    /// Mechanism named `name` with no cells and no failures
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cells: Vec::new(),
            init: OpScript::default(),
            destroy: OpScript::default(),
            erase: OpScript::default(),
        }
    }

    /// Mechanism name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add a cell that accepts new keys
    pub fn writable_cell(mut self, name: impl Into<String>) -> Self {
        self.cells.push(CellConfig::writable(name));
        self
    }

    /// Add a cell with a fixed key space
    pub fn fixed_cell(mut self, name: impl Into<String>) -> Self {
        self.cells.push(CellConfig::fixed(name));
        self
    }

    /// Make `op` settle with a backend error carrying `message`
    pub fn failing(mut self, op: Lifecycle, message: impl Into<String>) -> Self {
        let error = StorageError::backend(self.name.clone(), message);
        self.script_mut(op).failure = Some(error);
        self
    }

    /// Make `op` take `delay` before settling
    pub fn delayed(mut self, op: Lifecycle, delay: Duration) -> Self {
        self.script_mut(op).delay = Some(delay);
        self
    }

    fn script(&self, op: Lifecycle) -> &OpScript {
        match op {
            Lifecycle::Init => &self.init,
            Lifecycle::Destroy => &self.destroy,
            Lifecycle::Erase => &self.erase,
        }
    }

    fn script_mut(&mut self, op: Lifecycle) -> &mut OpScript {
        match op {
            Lifecycle::Init => &mut self.init,
            Lifecycle::Destroy => &mut self.destroy,
            Lifecycle::Erase => &mut self.erase,
        }
    }
}

#[derive(Debug, Default)]
struct OpCounters {
    started: AtomicUsize,
    completed: AtomicUsize,
}

#[derive(Debug, Default)]
struct ProbeState {
    constructed: AtomicUsize,
    init: OpCounters,
    destroy: OpCounters,
    erase: OpCounters,
}

impl ProbeState {
    fn counters(&self, op: Lifecycle) -> &OpCounters {
        match op {
            Lifecycle::Init => &self.init,
            Lifecycle::Destroy => &self.destroy,
            Lifecycle::Erase => &self.erase,
        }
    }
}

/// Call counts shared by every instance built from one spec
#[derive(Debug, Clone, Default)]
pub struct MechanismProbe {
    state: Arc<ProbeState>,
}

impl MechanismProbe {
    /// Instances constructed by the factory
    pub fn constructed(&self) -> usize {
        self.state.constructed.load(Ordering::SeqCst)
    }

    /// Calls of `op` that began
    pub fn started(&self, op: Lifecycle) -> usize {
        self.state.counters(op).started.load(Ordering::SeqCst)
    }

    /// Calls of `op` that ran to settlement, successful or not
    pub fn completed(&self, op: Lifecycle) -> usize {
        self.state.counters(op).completed.load(Ordering::SeqCst)
    }
}

/// Mechanism whose lifecycle follows a [`MechanismSpec`]
pub struct ScriptedMechanism {
    spec: Arc<MechanismSpec>,
    probe: MechanismProbe,
    cells: RwLock<CellMap>,
}

impl ScriptedMechanism {
    /// Construct an instance and count it on `probe`
    pub fn new(spec: Arc<MechanismSpec>, probe: MechanismProbe) -> Self {
        probe.state.constructed.fetch_add(1, Ordering::SeqCst);
        Self {
            spec,
            probe,
            cells: RwLock::new(CellMap::new()),
        }
    }

    fn fresh_cells(&self) -> CellMap {
        self.spec
            .cells
            .iter()
            .map(|cell| {
                let handle: CellRef = Arc::new(MemoryCell::new(&cell.name, cell.fixed_key_space));
                (cell.name.clone(), handle)
            })
            .collect()
    }

    async fn run(&self, op: Lifecycle) -> StorageResult<()> {
        let counters = self.probe.state.counters(op);
        counters.started.fetch_add(1, Ordering::SeqCst);

        let script = self.spec.script(op);
        if let Some(delay) = script.delay {
            tokio::time::sleep(delay).await;
        }

        let outcome = match &script.failure {
            Some(error) => Err(error.clone()),
            None => {
                match op {
                    Lifecycle::Init | Lifecycle::Erase => *self.cells.write() = self.fresh_cells(),
                    Lifecycle::Destroy => self.cells.write().clear(),
                }
                Ok(())
            }
        };

        counters.completed.fetch_add(1, Ordering::SeqCst);
        outcome
    }
}

#[async_trait]
impl StorageMechanism for ScriptedMechanism {
    async fn init(&self) -> StorageResult<()> {
        self.run(Lifecycle::Init).await
    }

    async fn destroy(&self) -> StorageResult<()> {
        self.run(Lifecycle::Destroy).await
    }

    async fn erase(&self) -> StorageResult<()> {
        self.run(Lifecycle::Erase).await
    }

    fn get_cells(&self) -> CellMap {
        self.cells.read().clone()
    }
}
