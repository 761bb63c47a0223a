use serde::{Deserialize, Serialize};

use crate::error::TrackResult;
use crate::selection::IntelligentSelection;

/// Default size of the ingestion worker pool
pub const DEFAULT_WORKERS: usize = 4;

/// Tunables for trajectory construction and marker selection.
///
/// Every field has a default, so a config file only needs the keys it changes:
///
/// ```json
/// { "workers": 8, "selection": { "max_interval_secs": 90.0 } }
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessorConfig {
    /// Ingestion worker threads, clamped to at least 1
    pub workers: usize,
    pub selection: IntelligentSelection,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            selection: IntelligentSelection::default(),
        }
    }
}

impl ProcessorConfig {
    pub fn from_json(json: &str) -> TrackResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Worker count actually used by the pool.
    pub fn effective_workers(&self) -> usize {
        self.workers.max(1)
    }
}
