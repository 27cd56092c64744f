//! Access to workflow execution history

use crate::error::RepositoryError;
use lineage_record::{DatasetId, ExecutionSnapshot, WorkflowExecutionRecord};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::debug;

/// Read-only source of workflow execution history
///
/// Implementations own their retry policy; the planner calls each method
/// once per dataset per run.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ExecutionRepository: Send + Sync {
    /// All known datasets
    async fn list_dataset_ids(&self) -> Result<BTreeSet<DatasetId>, RepositoryError>;

    /// Workflow executions of one dataset, in store order
    async fn list_workflow_executions(
        &self,
        dataset_id: &DatasetId,
    ) -> Result<Vec<WorkflowExecutionRecord>, RepositoryError>;
}

/// Read every dataset's history into one snapshot
///
/// # Errors
/// Propagates the first [`RepositoryError`] returned by `repository`.
pub async fn fetch_snapshot<R>(repository: &R) -> Result<ExecutionSnapshot, RepositoryError>
where
    R: ExecutionRepository + ?Sized,
{
    let mut snapshot = ExecutionSnapshot::new();
    for dataset_id in repository.list_dataset_ids().await? {
        let executions = repository.list_workflow_executions(&dataset_id).await?;
        debug!(%dataset_id, executions = executions.len(), "fetched dataset history");
        snapshot.insert_dataset(dataset_id);
        for execution in executions {
            snapshot.push(execution);
        }
    }
    Ok(snapshot)
}

/// Repository over an in-memory [`ExecutionSnapshot`]
#[derive(Debug, Clone, Default)]
pub struct SnapshotRepository {
    snapshot: ExecutionSnapshot,
}

impl SnapshotRepository {
    /// Wrap a snapshot
    #[inline]
    #[must_use]
    pub fn new(snapshot: ExecutionSnapshot) -> Self {
        Self { snapshot }
    }

    /// Load a JSON snapshot file
    ///
    /// # Errors
    /// Returns [`RepositoryError::Io`] if the file cannot be read and
    /// [`RepositoryError::Snapshot`] if it is not a valid snapshot.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, RepositoryError> {
        let path = path.as_ref();
        let json = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| RepositoryError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        let snapshot = ExecutionSnapshot::from_json(&json)?;
        debug!(
            path = %path.display(),
            datasets = snapshot.len(),
            plugins = snapshot.plugin_count(),
            "loaded execution snapshot"
        );
        Ok(Self::new(snapshot))
    }

    /// Underlying snapshot
    #[inline]
    #[must_use]
    pub fn snapshot(&self) -> &ExecutionSnapshot {
        &self.snapshot
    }
}

#[async_trait::async_trait]
impl ExecutionRepository for SnapshotRepository {
    async fn list_dataset_ids(&self) -> Result<BTreeSet<DatasetId>, RepositoryError> {
        Ok(self.snapshot.dataset_ids().cloned().collect())
    }

    async fn list_workflow_executions(
        &self,
        dataset_id: &DatasetId,
    ) -> Result<Vec<WorkflowExecutionRecord>, RepositoryError> {
        Ok(self.snapshot.executions(dataset_id).to_vec())
    }
}
