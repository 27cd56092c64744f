//! Point-in-time snapshot of the execution store

use crate::execution::WorkflowExecutionRecord;
use crate::ids::DatasetId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Errors reading or writing snapshots
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    /// Malformed snapshot document
    #[error("invalid snapshot document: {0}")]
    Json(#[from] serde_json::Error),

    /// An execution is filed under a dataset it does not belong to
    #[error("execution {execution_id} belongs to dataset {actual}, filed under {filed}")]
    DatasetMismatch {
        /// Misfiled execution
        execution_id: String,
        /// Dataset it was filed under
        filed: DatasetId,
        /// Dataset named by the execution itself
        actual: DatasetId,
    },
}

/// All workflow executions, grouped by dataset
///
/// Datasets are kept sorted so that every traversal is deterministic.
/// Executions keep the order in which they were read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExecutionSnapshot {
    datasets: BTreeMap<DatasetId, Vec<WorkflowExecutionRecord>>,
}

impl ExecutionSnapshot {
    /// Create empty snapshot
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a snapshot from loose executions
    #[must_use]
    pub fn from_executions(executions: impl IntoIterator<Item = WorkflowExecutionRecord>) -> Self {
        let mut snapshot = Self::new();
        for execution in executions {
            snapshot.push(execution);
        }
        snapshot
    }

    /// Parse a JSON document (`{ "<dataset>": [ <execution>, ... ] }`)
    ///
    /// # Errors
    /// Returns [`SnapshotError`] if the document is malformed or an execution
    /// is listed under a different dataset than its own.
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        let snapshot: Self = serde_json::from_str(json)?;
        snapshot.check_consistency()?;
        Ok(snapshot)
    }

    /// Serialize to pretty JSON
    ///
    /// # Errors
    /// Returns [`SnapshotError::Json`] on serialization failure.
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Add an execution under its own dataset
    pub fn push(&mut self, execution: WorkflowExecutionRecord) {
        self.datasets
            .entry(execution.dataset_id.clone())
            .or_default()
            .push(execution);
    }

    /// Register a dataset that has no executions yet
    pub fn insert_dataset(&mut self, dataset_id: DatasetId) {
        self.datasets.entry(dataset_id).or_default();
    }

    /// Dataset ids in sorted order
    pub fn dataset_ids(&self) -> impl Iterator<Item = &DatasetId> {
        self.datasets.keys()
    }

    /// Executions of one dataset, empty if unknown
    #[must_use]
    pub fn executions(&self, dataset_id: &DatasetId) -> &[WorkflowExecutionRecord] {
        self.datasets.get(dataset_id).map(Vec::as_slice).unwrap_or_default()
    }

    /// Iterate over datasets and their executions
    pub fn iter(&self) -> impl Iterator<Item = (&DatasetId, &[WorkflowExecutionRecord])> {
        self.datasets.iter().map(|(id, executions)| (id, executions.as_slice()))
    }

    /// Number of datasets
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.datasets.len()
    }

    /// Check if snapshot has no datasets
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.datasets.is_empty()
    }

    /// Total number of plugin executions
    #[must_use]
    pub fn plugin_count(&self) -> usize {
        self.datasets
            .values()
            .flatten()
            .map(|execution| execution.plugins.len())
            .sum()
    }

    fn check_consistency(&self) -> Result<(), SnapshotError> {
        for (filed, executions) in &self.datasets {
            if let Some(execution) = executions.iter().find(|e| &e.dataset_id != filed) {
                return Err(SnapshotError::DatasetMismatch {
                    execution_id: execution.id.to_string(),
                    filed: filed.clone(),
                    actual: execution.dataset_id.clone(),
                });
            }
        }
        Ok(())
    }
}

impl FromIterator<WorkflowExecutionRecord> for ExecutionSnapshot {
    fn from_iter<I: IntoIterator<Item = WorkflowExecutionRecord>>(iter: I) -> Self {
        Self::from_executions(iter)
    }
}
