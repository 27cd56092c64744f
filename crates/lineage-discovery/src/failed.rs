//! Failed or cancelled executions

use crate::mode::DiscoveryMode;
use crate::strategy::{identify_leaf_subtrees, IdentificationStrategy};
use lineage_forest::{Forest, NodeRef};

/// Selects leaf subtrees headed by a failed or cancelled execution
#[derive(Debug, Clone, Copy, Default)]
pub struct FailedOrCancelledStrategy;

impl FailedOrCancelledStrategy {
    /// Create new strategy
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl IdentificationStrategy for FailedOrCancelledStrategy {
    fn name(&self) -> &'static str {
        "FailedOrCancelled"
    }

    fn identify<'f>(&self, forest: &'f Forest, mode: DiscoveryMode) -> Vec<NodeRef<'f>> {
        identify_leaf_subtrees(forest, mode, |node| node.status().is_failed_or_cancelled())
    }
}
