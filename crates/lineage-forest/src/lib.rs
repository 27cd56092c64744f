//! Lineage Forest
//!
//! Reconstructs producer/consumer lineage between plugin executions of one
//! dataset.
//!
//! # Core Concepts
//!
//! - [`LineageForestBuilder`]: Resolves every plugin execution's predecessor,
//!   either declared (kind and start time) or positional
//! - [`Forest`]: Arena of linked nodes with precomputed roots and leafs
//! - [`NodeRef`]: Borrowed node view with subtree search and removal ordering
//! - Structural leaf: topmost node whose descendants are all link checking
//! - Live leaf: the same, once executions with deleted data are disregarded
//!
//! # Example
//!
//! ```rust
//! use chrono::{TimeZone, Utc};
//! use lineage_forest::LineageForestBuilder;
//! use lineage_record::{PluginExecutionRecord, PluginStatus, PluginType, WorkflowExecutionRecord};
//!
//! let t = |m| Utc.with_ymd_and_hms(2021, 1, 1, 0, m, 0).unwrap();
//! let execution = WorkflowExecutionRecord::new("e1", "ds", t(0)).with_plugins([
//!     PluginExecutionRecord::new("h", PluginType::OaipmhHarvest).started_at(t(1)),
//!     PluginExecutionRecord::new("lc", PluginType::LinkChecking).started_at(t(2)),
//!     PluginExecutionRecord::new("p", PluginType::Preview)
//!         .with_status(PluginStatus::Failed)
//!         .started_at(t(3)),
//! ]);
//!
//! let forest = LineageForestBuilder::new("ds").build(&[execution])?;
//! let leaf = forest.leafs().next().unwrap();
//! assert_eq!(leaf.id().as_str(), "p");
//!
//! let harvest = forest.roots().next().unwrap();
//! let order: Vec<_> = harvest.all_in_removal_order().iter().map(|n| n.id().to_string()).collect();
//! assert_eq!(order, ["p", "lc", "h"]);
//! # Ok::<(), lineage_forest::BuildError>(())
//! ```

#![warn(unreachable_pub)]

mod builder;
mod error;
mod forest;
mod node;

pub use builder::LineageForestBuilder;
pub use error::{BuildError, ConstructionError, InvariantViolation};
pub use forest::Forest;
pub use node::{ExecutionPluginNode, NodeIndex, NodeRef};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
