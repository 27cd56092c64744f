//! Lineage Planner
//!
//! Computes which plugin executions can be removed from history, across all
//! datasets, without breaking any live lineage.
//!
//! # Core Concepts
//!
//! - [`ExecutionRepository`]: Read-only source of execution history
//! - [`IterativeRemovalPlanner`]: Repeats forest construction and
//!   identification until nothing more is found
//! - [`RemovalEntry`]: One plugin execution of the plan, descendants first
//! - [`PlanReport`]: First batch plus per-iteration totals and failed datasets
//! - [`PlannerConfig`]: TOML-loadable strategy, mode and parallelism
//!
//! # Example
//!
//! ```rust
//! use chrono::{TimeZone, Utc};
//! use lineage_planner::{IterativeRemovalPlanner, PlannerConfig};
//! use lineage_record::{
//!     ExecutionSnapshot, PluginExecutionRecord, PluginStatus, PluginType, WorkflowExecutionRecord,
//! };
//!
//! let t = |m| Utc.with_ymd_and_hms(2021, 1, 1, 0, m, 0).unwrap();
//! let snapshot: ExecutionSnapshot = [WorkflowExecutionRecord::new("e1", "ds", t(0)).with_plugins([
//!     PluginExecutionRecord::new("h", PluginType::HttpHarvest)
//!         .with_status(PluginStatus::Finished)
//!         .started_at(t(1)),
//!     PluginExecutionRecord::new("v", PluginType::ValidationExternal)
//!         .with_status(PluginStatus::Failed)
//!         .started_at(t(2)),
//! ])]
//! .into_iter()
//! .collect();
//!
//! let planner = IterativeRemovalPlanner::from_config(&PlannerConfig::default());
//! let report = planner.plan_snapshot(&snapshot)?;
//! assert_eq!(report.first_batch.len(), 1);
//! assert_eq!(report.first_batch[0].plugin_id.as_str(), "v");
//! # Ok::<(), lineage_planner::PlannerError>(())
//! ```

#![warn(unreachable_pub)]

mod config;
mod entry;
mod error;
mod planner;
mod repository;

pub use config::PlannerConfig;
pub use entry::{FailedDataset, IterationSummary, PlanReport, RemovalEntry};
pub use error::{ConfigError, PlannerError, RepositoryError};
pub use planner::{IterativeRemovalPlanner, PlannerState};
pub use repository::{fetch_snapshot, ExecutionRepository, SnapshotRepository};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
