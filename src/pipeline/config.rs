use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::stage::StageKind;

pub const DEFAULT_WORKERS: usize = 4;
pub const DEFAULT_QUEUE_CAPACITY: usize = 1000;
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 10_000;
pub const DEFAULT_SEPARATOR: &str = " ";

/// What a worker does when a stage fails on a document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageErrorPolicy {
    /// Stop the worker and fail the run.
    #[default]
    Fail,
    /// Log the document's position, drop it, keep going.
    Skip,
}

/// Executor settings. Every field has a default, so a JSON file only needs
/// the keys it changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessorConfig {
    pub workers: usize,
    pub queue_capacity: usize,
    pub parallel: bool,
    pub separator: String,
    pub progress_interval: u64,
    pub on_stage_error: StageErrorPolicy,
    /// Stage names resolved through a [`StageRegistry`](crate::stage::registry::StageRegistry).
    pub stages: Vec<StageKind>,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            parallel: true,
            separator: DEFAULT_SEPARATOR.to_owned(),
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            on_stage_error: StageErrorPolicy::Fail,
            stages: Vec::new(),
        }
    }
}

impl ProcessorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    pub fn progress_interval(mut self, every: u64) -> Self {
        self.progress_interval = every;
        self
    }

    pub fn on_stage_error(mut self, policy: StageErrorPolicy) -> Self {
        self.on_stage_error = policy;
        self
    }

    pub fn stages(mut self, stages: impl IntoIterator<Item = StageKind>) -> Self {
        self.stages = stages.into_iter().collect();
        self
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub async fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = tokio::fs::read_to_string(path).await?;
        Self::from_json_str(&raw)
    }

    /// Worker count actually used: never below one.
    pub fn effective_workers(&self) -> usize {
        self.workers.max(1)
    }

    pub fn effective_queue_capacity(&self) -> usize {
        self.queue_capacity.max(1)
    }

    pub fn effective_progress_interval(&self) -> u64 {
        self.progress_interval.max(1)
    }
}
