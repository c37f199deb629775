use serde::{Deserialize, Serialize};

use crate::clustering::domain::chinese_whispers::ChineseWhispers;
use crate::clustering::domain::cluster_engine::{ClusterEngine, ConvergenceRule};

use super::snapshot_chinese_whispers::SnapshotChineseWhispers;

/// Label propagation strategy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    /// In-place updates on the calling thread.
    #[default]
    Sequential,
    /// Double-buffered passes spread over worker threads.
    Snapshot,
}

impl std::fmt::Display for EngineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineKind::Sequential => write!(f, "sequential"),
            EngineKind::Snapshot => write!(f, "snapshot"),
        }
    }
}

/// Creates the requested engine. `threads` only applies to
/// [`EngineKind::Snapshot`]; `0` means one thread per available core.
pub fn create_engine(
    kind: EngineKind,
    threads: usize,
    convergence: ConvergenceRule,
) -> Box<dyn ClusterEngine> {
    match kind {
        EngineKind::Sequential => {
            log::info!("Using sequential label propagation ({convergence} convergence)");
            Box::new(ChineseWhispers::new(convergence))
        }
        EngineKind::Snapshot => {
            let threads = if threads == 0 {
                std::thread::available_parallelism()
                    .map(|n| n.get())
                    .unwrap_or(1)
            } else {
                threads
            };
            log::info!(
                "Using snapshot label propagation on {threads} threads ({convergence} convergence)"
            );
            Box::new(SnapshotChineseWhispers::new(threads, convergence))
        }
    }
}
