//! Composite cleanup ahead of a migration

use crate::mode::DiscoveryMode;
use crate::strategy::{identify_leaf_subtrees, IdentificationStrategy};
use crate::superseded::superseded_nodes;
use chrono::{DateTime, Utc};
use lineage_forest::{Forest, NodeIndex, NodeRef};
use lineage_record::PluginType;
use std::collections::HashSet;

/// Union of failed-or-cancelled and superseded executions before a cutoff
///
/// Both rationales are evaluated in a single search so the selected subtrees
/// never overlap. Superseded executions are finished, so no node is selected
/// for both reasons.
#[derive(Debug, Clone)]
pub struct MigrationCleanupStrategy {
    cutoff: DateTime<Utc>,
    superseded_types: Vec<PluginType>,
}

impl MigrationCleanupStrategy {
    /// Create new strategy checking supersession for every plugin kind
    #[must_use]
    pub fn new(cutoff: DateTime<Utc>) -> Self {
        Self {
            cutoff,
            superseded_types: PluginType::ALL.to_vec(),
        }
    }

    /// Restrict supersession checks to the given kinds
    #[must_use]
    pub fn with_superseded_types(mut self, types: impl IntoIterator<Item = PluginType>) -> Self {
        self.superseded_types = types.into_iter().collect();
        self
    }

    /// Cutoff date
    #[inline]
    #[must_use]
    pub fn cutoff(&self) -> DateTime<Utc> {
        self.cutoff
    }

    /// Kinds checked for supersession
    #[inline]
    #[must_use]
    pub fn superseded_types(&self) -> &[PluginType] {
        &self.superseded_types
    }
}

impl IdentificationStrategy for MigrationCleanupStrategy {
    fn name(&self) -> &'static str {
        "MigrationCleanup"
    }

    fn identify<'f>(&self, forest: &'f Forest, mode: DiscoveryMode) -> Vec<NodeRef<'f>> {
        let superseded: HashSet<NodeIndex> = self
            .superseded_types
            .iter()
            .flat_map(|&kind| superseded_nodes(forest, kind, self.cutoff))
            .collect();
        identify_leaf_subtrees(forest, mode, |node| {
            (node.status().is_failed_or_cancelled()
                && node.was_started_or_cancelled_before(self.cutoff))
                || superseded.contains(&node.index())
        })
    }
}
