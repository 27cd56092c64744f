//! Error types for forest construction
//!
//! Two families with different handling:
//! - [`ConstructionError`]: the input history of a dataset is inconsistent.
//!   Contained per dataset by callers.
//! - [`InvariantViolation`]: the builder broke its own bookkeeping. Never
//!   caused by input data and never contained.

use chrono::{DateTime, Utc};
use lineage_record::{PluginId, PluginType};

/// Inconsistent or corrupt execution history
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConstructionError {
    /// Same plugin id appears twice
    #[error("duplicate plugin execution id {plugin_id}")]
    DuplicatePlugin {
        /// The repeated id
        plugin_id: PluginId,
    },

    /// Declared predecessor does not match any execution
    #[error("plugin {plugin_id} declares predecessor {predecessor_type} started at {predecessor_started}, which does not exist")]
    UnresolvedPredecessor {
        /// Execution carrying the declaration
        plugin_id: PluginId,
        /// Declared predecessor kind
        predecessor_type: PluginType,
        /// Declared predecessor start time
        predecessor_started: DateTime<Utc>,
    },

    /// Declared predecessor matches more than one execution
    #[error("plugin {plugin_id} declares predecessor {predecessor_type} started at {predecessor_started}, which is ambiguous")]
    AmbiguousPredecessor {
        /// Execution carrying the declaration
        plugin_id: PluginId,
        /// Declared predecessor kind
        predecessor_type: PluginType,
        /// Declared predecessor start time, shared by several executions
        predecessor_started: DateTime<Utc>,
    },

    /// Only one of predecessor kind and start time is present
    #[error("plugin {plugin_id} carries incomplete predecessor metadata")]
    CorruptPredecessor {
        /// Execution with the partial metadata
        plugin_id: PluginId,
    },

    /// A lineage-starting kind resolved to a parent
    #[error("plugin {plugin_id} of type {plugin_type} must not have a predecessor, found {predecessor_id}")]
    UnexpectedPredecessor {
        /// Lineage-starting execution
        plugin_id: PluginId,
        /// Its kind
        plugin_type: PluginType,
        /// The parent it resolved to
        predecessor_id: PluginId,
    },

    /// A derived kind has no parent
    #[error("plugin {plugin_id} of type {plugin_type} has no predecessor")]
    MissingPredecessor {
        /// Orphaned execution
        plugin_id: PluginId,
        /// Its kind
        plugin_type: PluginType,
    },

    /// Declared predecessors form a cycle
    #[error("plugin {plugin_id} would become its own ancestor")]
    CyclicLineage {
        /// An execution on the cycle
        plugin_id: PluginId,
    },
}

impl ConstructionError {
    /// The plugin execution the error was detected on
    #[must_use]
    pub fn plugin_id(&self) -> &PluginId {
        match self {
            Self::DuplicatePlugin { plugin_id }
            | Self::UnresolvedPredecessor { plugin_id, .. }
            | Self::AmbiguousPredecessor { plugin_id, .. }
            | Self::CorruptPredecessor { plugin_id }
            | Self::UnexpectedPredecessor { plugin_id, .. }
            | Self::MissingPredecessor { plugin_id, .. }
            | Self::CyclicLineage { plugin_id } => plugin_id,
        }
    }
}

/// Broken structural invariant (programming error)
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvariantViolation {
    /// A child was attached to a second parent, or twice to the same one
    #[error("plugin {child} is already attached to {existing_parent}")]
    AlreadyAttached {
        /// Node being attached
        child: PluginId,
        /// Parent it already has
        existing_parent: PluginId,
    },
}

/// Any failure of [`LineageForestBuilder::build`](crate::LineageForestBuilder::build)
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    /// Bad input history
    #[error("construction failed: {0}")]
    Construction(#[from] ConstructionError),

    /// Builder bug
    #[error("invariant violated: {0}")]
    Invariant(#[from] InvariantViolation),
}
