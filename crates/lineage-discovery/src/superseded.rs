//! Superseded executions

use crate::mode::DiscoveryMode;
use crate::strategy::{identify_leaf_subtrees, IdentificationStrategy};
use chrono::{DateTime, Utc};
use lineage_forest::{Forest, NodeIndex, NodeRef};
use lineage_record::{PluginStatus, PluginType};
use std::collections::HashSet;

/// Selects leaf subtrees headed by a superseded execution of one kind
///
/// Among the finished executions of `plugin_type` that started before
/// `cutoff`, all but the latest-started one are superseded.
///
/// # Known limitation
/// Only executions started before the cutoff take part. An execution started
/// before the cutoff that was superseded by one started after it is not
/// detected, and the latest pre-cutoff execution is never selected.
#[derive(Debug, Clone, Copy)]
pub struct SupersededStrategy {
    plugin_type: PluginType,
    cutoff: DateTime<Utc>,
}

impl SupersededStrategy {
    /// Create new strategy
    #[inline]
    #[must_use]
    pub fn new(plugin_type: PluginType, cutoff: DateTime<Utc>) -> Self {
        Self {
            plugin_type,
            cutoff,
        }
    }

    /// Kind under consideration
    #[inline]
    #[must_use]
    pub fn plugin_type(&self) -> PluginType {
        self.plugin_type
    }

    /// Cutoff date
    #[inline]
    #[must_use]
    pub fn cutoff(&self) -> DateTime<Utc> {
        self.cutoff
    }
}

impl IdentificationStrategy for SupersededStrategy {
    fn name(&self) -> &'static str {
        "Superseded"
    }

    fn identify<'f>(&self, forest: &'f Forest, mode: DiscoveryMode) -> Vec<NodeRef<'f>> {
        let superseded = superseded_nodes(forest, self.plugin_type, self.cutoff);
        if superseded.is_empty() {
            return Vec::new();
        }
        identify_leaf_subtrees(forest, mode, |node| superseded.contains(&node.index()))
    }
}

/// Finished executions of `plugin_type` started before `cutoff`, except the
/// latest-started one
pub(crate) fn superseded_nodes(
    forest: &Forest,
    plugin_type: PluginType,
    cutoff: DateTime<Utc>,
) -> HashSet<NodeIndex> {
    let candidates: Vec<NodeRef<'_>> = forest
        .nodes()
        .filter(|node| {
            node.plugin_type() == plugin_type
                && node.status() == PluginStatus::Finished
                && node.was_started_before(cutoff)
        })
        .collect();
    let Some(latest) = candidates.iter().max_by_key(|node| node.started_date()) else {
        return HashSet::new();
    };
    let latest = latest.index();
    candidates
        .iter()
        .map(|node| node.index())
        .filter(|&index| index != latest)
        .collect()
}
