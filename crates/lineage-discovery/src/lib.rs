//! Lineage Discovery
//!
//! Identification strategies selecting removable subtrees of a lineage
//! forest.
//!
//! # Core Concepts
//!
//! - [`IdentificationStrategy`]: Core trait, forest in, subtree roots out
//! - [`DiscoveryMode`]: Whether a candidate must be childless or may keep
//!   descendants already flagged deleted
//! - [`FailedOrCancelledStrategy`]: Terminally failed or cancelled executions
//! - [`SupersededStrategy`]: Older finished executions of one kind
//! - [`DatasetSpecificStrategy`]: Everything removable in one dataset
//! - [`MigrationCleanupStrategy`]: Failed/cancelled or superseded before a cutoff
//! - [`StrategySpec`]: Serializable strategy selection
//!
//! # Example
//!
//! ```rust
//! use chrono::{TimeZone, Utc};
//! use lineage_discovery::{DiscoveryMode, IdentificationStrategy, StrategySpec};
//! use lineage_forest::LineageForestBuilder;
//! use lineage_record::{PluginExecutionRecord, PluginStatus, PluginType, WorkflowExecutionRecord};
//!
//! let t = |m| Utc.with_ymd_and_hms(2021, 1, 1, 0, m, 0).unwrap();
//! let execution = WorkflowExecutionRecord::new("e1", "ds", t(0)).with_plugins([
//!     PluginExecutionRecord::new("h", PluginType::HttpHarvest)
//!         .with_status(PluginStatus::Finished)
//!         .started_at(t(1)),
//!     PluginExecutionRecord::new("v", PluginType::ValidationExternal)
//!         .with_status(PluginStatus::Failed)
//!         .started_at(t(2)),
//! ]);
//! let forest = LineageForestBuilder::new("ds").build(&[execution]).unwrap();
//!
//! let strategy = StrategySpec::FailedOrCancelled.build();
//! let roots = strategy.identify(&forest, DiscoveryMode::WithoutDescendants);
//! assert_eq!(roots.len(), 1);
//! assert_eq!(roots[0].id().as_str(), "v");
//! ```

#![warn(unreachable_pub)]

mod dataset;
mod failed;
mod migration;
mod mode;
mod spec;
mod strategy;
mod superseded;

pub use dataset::DatasetSpecificStrategy;
pub use failed::FailedOrCancelledStrategy;
pub use migration::MigrationCleanupStrategy;
pub use mode::DiscoveryMode;
pub use spec::{StrategyInfo, StrategySpec, BUILTIN_STRATEGIES};
pub use strategy::{identify_leaf_subtrees, IdentificationStrategy};
pub use superseded::SupersededStrategy;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
