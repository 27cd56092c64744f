//! Lineage Records
//!
//! Immutable snapshot types describing the execution history of datasets.
//!
//! # Core Concepts
//!
//! - [`WorkflowExecutionRecord`]: One run of a dataset's workflow, owning an
//!   ordered list of plugin executions
//! - [`PluginExecutionRecord`]: One processing step within a workflow execution
//! - [`PluginType`]: Processing kind, with harvest, reindex, depublish and
//!   link-checking kinds singled out
//! - [`ExecutionSnapshot`]: All workflow executions of all datasets, as read
//!   from the execution store at one point in time
//!
//! # Example
//!
//! ```rust
//! use chrono::{TimeZone, Utc};
//! use lineage_record::{PluginExecutionRecord, PluginStatus, PluginType, WorkflowExecutionRecord};
//!
//! let t0 = Utc.with_ymd_and_hms(2021, 3, 1, 9, 0, 0).unwrap();
//! let harvest = PluginExecutionRecord::new("p-1", PluginType::OaipmhHarvest)
//!     .with_status(PluginStatus::Finished)
//!     .started_at(t0);
//!
//! let execution = WorkflowExecutionRecord::new("e-1", "dataset-7", t0).with_plugin(harvest);
//! assert_eq!(execution.plugins.len(), 1);
//! ```

#![warn(unreachable_pub)]

mod execution;
mod ids;
mod plugin;
mod snapshot;

pub use execution::WorkflowExecutionRecord;
pub use ids::{DatasetId, ExecutionId, PluginId};
pub use plugin::{
    DataStatus, DeclaredPredecessor, PluginExecutionRecord, PluginStatus, PluginType,
    PredecessorInfo, UnknownPluginType,
};
pub use snapshot::{ExecutionSnapshot, SnapshotError};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
