//! Planner output types

use chrono::{DateTime, Utc};
use lineage_forest::{ConstructionError, NodeRef};
use lineage_record::{DatasetId, ExecutionId, PluginId, PluginType};
use serde::Serialize;

/// One plugin execution scheduled for removal
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemovalEntry {
    /// Owning dataset
    pub dataset_id: DatasetId,
    /// Owning workflow execution
    pub execution_id: ExecutionId,
    /// Plugin execution to remove
    pub plugin_id: PluginId,
    /// Its kind
    pub plugin_type: PluginType,
    /// Records it processed
    pub processed_records: u64,
    /// When it started
    pub started_date: Option<DateTime<Utc>>,
}

impl RemovalEntry {
    /// Describe a forest node
    #[must_use]
    pub fn from_node(node: NodeRef<'_>) -> Self {
        Self {
            dataset_id: node.forest().dataset_id().clone(),
            execution_id: node.execution_id().clone(),
            plugin_id: node.id().clone(),
            plugin_type: node.plugin_type(),
            processed_records: node.record().processed_records,
            started_date: node.started_date(),
        }
    }
}

/// Totals of one planning iteration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IterationSummary {
    /// 1-based iteration number
    pub iteration: usize,
    /// Datasets still active in this iteration
    pub datasets_processed: usize,
    /// Plugin executions scheduled
    pub removals: usize,
    /// Sum of their processed records
    pub processed_records: u64,
}

impl IterationSummary {
    pub(crate) fn new(iteration: usize, datasets_processed: usize, batch: &[RemovalEntry]) -> Self {
        Self {
            iteration,
            datasets_processed,
            removals: batch.len(),
            processed_records: batch.iter().map(|entry| entry.processed_records).sum(),
        }
    }
}

/// Dataset left out of a run because its history is inconsistent
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedDataset {
    /// Dataset
    pub dataset_id: DatasetId,
    /// Iteration in which construction failed
    pub iteration: usize,
    /// Rendered construction error
    pub reason: String,
    #[serde(skip)]
    pub(crate) error: ConstructionError,
}

impl FailedDataset {
    pub(crate) fn new(dataset_id: DatasetId, iteration: usize, error: ConstructionError) -> Self {
        Self {
            dataset_id,
            iteration,
            reason: error.to_string(),
            error,
        }
    }

    /// The construction error
    #[inline]
    #[must_use]
    pub fn error(&self) -> &ConstructionError {
        &self.error
    }
}

/// Full result of a planning run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PlanReport {
    /// The actionable plan: removals found by the first iteration
    pub first_batch: Vec<RemovalEntry>,
    /// Every iteration that scheduled removals
    pub iterations: Vec<IterationSummary>,
    /// Datasets excluded from the run
    pub failed_datasets: Vec<FailedDataset>,
}

impl PlanReport {
    /// Removals over all iterations
    #[must_use]
    pub fn total_removals(&self) -> usize {
        self.iterations.iter().map(|summary| summary.removals).sum()
    }

    /// Processed records over all iterations
    #[must_use]
    pub fn total_processed_records(&self) -> u64 {
        self.iterations
            .iter()
            .map(|summary| summary.processed_records)
            .sum()
    }
}
