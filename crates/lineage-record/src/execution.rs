//! Workflow execution records

use crate::ids::{DatasetId, ExecutionId};
use crate::plugin::PluginExecutionRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One workflow run of a dataset
///
/// Owns its plugin executions exclusively. The position of a plugin in
/// [`plugins`](Self::plugins) is its index within the run and is used for
/// positional lineage when no predecessor is declared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowExecutionRecord {
    /// Unique identifier
    pub id: ExecutionId,

    /// Owning dataset
    pub dataset_id: DatasetId,

    /// Creation time of the run
    pub created_date: DateTime<Utc>,

    /// Plugin executions in run order
    #[serde(default)]
    pub plugins: Vec<PluginExecutionRecord>,
}

impl WorkflowExecutionRecord {
    /// Create an execution without plugins
    #[must_use]
    pub fn new(
        id: impl Into<ExecutionId>,
        dataset_id: impl Into<DatasetId>,
        created_date: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            dataset_id: dataset_id.into(),
            created_date,
            plugins: Vec::new(),
        }
    }

    /// Append a plugin execution
    #[inline]
    #[must_use]
    pub fn with_plugin(mut self, plugin: PluginExecutionRecord) -> Self {
        self.plugins.push(plugin);
        self
    }

    /// Append several plugin executions
    #[must_use]
    pub fn with_plugins(mut self, plugins: impl IntoIterator<Item = PluginExecutionRecord>) -> Self {
        self.plugins.extend(plugins);
        self
    }
}
