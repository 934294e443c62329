//! Concurrent lifecycle fan-out across mechanisms
//!
//! Every operation is launched, every operation is driven to settlement, and
//! the first failure to settle is returned. Nothing is cancelled: a mechanism
//! may rely on its operation always running to completion.

use cellmux_core::{StorageError, StorageMechanism, StorageResult};
use futures::stream::{FuturesUnordered, StreamExt};
use std::fmt;
use tracing::{debug, warn};

/// Mechanism-level lifecycle operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LifecycleOp {
    Init,
    Destroy,
    Erase,
}

impl LifecycleOp {
    fn as_str(self) -> &'static str {
        match self {
            LifecycleOp::Init => "init",
            LifecycleOp::Destroy => "destroy",
            LifecycleOp::Erase => "erase",
        }
    }
}

impl fmt::Display for LifecycleOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a settled fan-out
#[derive(Debug)]
pub(crate) struct Settlement {
    pub launched: usize,
    pub failed: usize,
    pub first_failure: Option<StorageError>,
}

impl Settlement {
    pub fn into_result(self) -> StorageResult<()> {
        match self.first_failure {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

/// Run `op` on every mechanism concurrently and wait for all of them.
pub(crate) async fn settle_all<'a, I>(op: LifecycleOp, mechanisms: I) -> Settlement
where
    I: IntoIterator<Item = (&'a str, &'a dyn StorageMechanism)>,
{
    let mut pending: FuturesUnordered<_> = mechanisms
        .into_iter()
        .map(|(name, mechanism)| async move {
            debug!(mechanism = name, %op, "launching mechanism operation");
            let outcome = match op {
                LifecycleOp::Init => mechanism.init().await,
                LifecycleOp::Destroy => mechanism.destroy().await,
                LifecycleOp::Erase => mechanism.erase().await,
            };
            (name, outcome)
        })
        .collect();

    let launched = pending.len();
    let mut failed = 0;
    let mut first_failure = None;

    while let Some((name, outcome)) = pending.next().await {
        match outcome {
            Ok(()) => debug!(mechanism = name, %op, "mechanism operation settled"),
            Err(error) => {
                failed += 1;
                warn!(
                    mechanism = name,
                    %op,
                    %error,
                    first = first_failure.is_none(),
                    "mechanism operation failed"
                );
                if first_failure.is_none() {
                    first_failure = Some(error);
                }
            }
        }
    }

    Settlement {
        launched,
        failed,
        first_failure,
    }
}
