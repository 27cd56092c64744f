//! Lineage reconstruction from workflow execution history

use crate::error::{BuildError, ConstructionError};
use crate::forest::Forest;
use crate::node::{ExecutionPluginNode, NodeIndex};
use chrono::{DateTime, Utc};
use lineage_record::{DatasetId, DeclaredPredecessor, PluginId, PluginType, WorkflowExecutionRecord};
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use tracing::{debug, trace};

/// Outcome of a composite-key lookup
#[derive(Debug, Clone, Copy)]
enum KeyMatch {
    Unique(NodeIndex),
    Ambiguous,
}

/// Index of started executions by `(kind, start time)`
#[derive(Debug, Default)]
struct StartIndex {
    entries: HashMap<(PluginType, DateTime<Utc>), KeyMatch>,
}

impl StartIndex {
    fn build(forest: &Forest) -> Self {
        let mut entries = HashMap::new();
        for node in forest.nodes() {
            let Some(started) = node.started_date() else {
                continue;
            };
            match entries.entry((node.plugin_type(), started)) {
                Entry::Vacant(slot) => {
                    slot.insert(KeyMatch::Unique(node.index()));
                }
                Entry::Occupied(mut slot) => {
                    slot.insert(KeyMatch::Ambiguous);
                }
            }
        }
        Self { entries }
    }

    fn lookup(&self, plugin_type: PluginType, started: DateTime<Utc>) -> Option<KeyMatch> {
        self.entries.get(&(plugin_type, started)).copied()
    }
}

/// Node awaiting predecessor resolution
#[derive(Debug)]
struct Pending {
    index: NodeIndex,
    positional: Option<NodeIndex>,
}

/// Builds the lineage [`Forest`] of one dataset
///
/// Predecessors are resolved in two ways:
/// - declared: the record names its predecessor by kind and start time, which
///   is looked up among all started executions of the dataset
/// - positional: otherwise the previous non-ignored plugin of the same
///   workflow execution is the predecessor
///
/// # Example
///
/// ```rust
/// use chrono::{TimeZone, Utc};
/// use lineage_forest::LineageForestBuilder;
/// use lineage_record::{PluginExecutionRecord, PluginType, WorkflowExecutionRecord};
///
/// let t0 = Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap();
/// let execution = WorkflowExecutionRecord::new("e1", "ds", t0).with_plugins([
///     PluginExecutionRecord::new("h", PluginType::HttpHarvest).started_at(t0),
///     PluginExecutionRecord::new("t", PluginType::Transformation),
/// ]);
///
/// let forest = LineageForestBuilder::new("ds").build(&[execution]).unwrap();
/// assert_eq!(forest.roots().len(), 1);
/// assert_eq!(forest.leaf_ids().map(|id| id.as_str()).collect::<Vec<_>>(), ["t"]);
/// ```
#[derive(Debug, Clone)]
pub struct LineageForestBuilder<'a> {
    dataset_id: DatasetId,
    ignored: Option<&'a HashSet<PluginId>>,
}

impl<'a> LineageForestBuilder<'a> {
    /// Create a builder for a dataset
    #[must_use]
    pub fn new(dataset_id: impl Into<DatasetId>) -> Self {
        Self {
            dataset_id: dataset_id.into(),
            ignored: None,
        }
    }

    /// Leave out plugin executions already scheduled for removal
    #[inline]
    #[must_use]
    pub fn ignoring(mut self, ignored: &'a HashSet<PluginId>) -> Self {
        self.ignored = Some(ignored);
        self
    }

    /// Dataset being built
    #[inline]
    #[must_use]
    pub fn dataset_id(&self) -> &DatasetId {
        &self.dataset_id
    }

    fn is_ignored(&self, id: &PluginId) -> bool {
        self.ignored.is_some_and(|ignored| ignored.contains(id))
    }

    /// Build the forest
    ///
    /// # Errors
    /// Returns [`BuildError::Construction`] when the history is inconsistent:
    /// duplicate ids, declared predecessors that are missing, ambiguous,
    /// half-present or cyclic, or a plugin whose parent contradicts its kind.
    /// Returns [`BuildError::Invariant`] only on internal bookkeeping errors.
    pub fn build(&self, executions: &[WorkflowExecutionRecord]) -> Result<Forest, BuildError> {
        let mut forest = Forest::new(self.dataset_id.clone());
        let pending = self.create_nodes(&mut forest, executions)?;
        let index = StartIndex::build(&forest);

        for Pending { index: child, positional } in pending {
            let parent = Self::resolve(&forest, &index, child, positional)?;
            Self::validate(&forest, child, parent)?;
            if let Some(parent) = parent {
                Self::check_acyclic(&forest, parent, child)?;
                trace!(
                    dataset_id = %self.dataset_id,
                    plugin_id = %forest.node(child).id(),
                    parent_id = %forest.node(parent).id(),
                    "resolved predecessor"
                );
                forest.add_child(parent, child)?;
            }
        }

        forest.finish();
        debug!(
            dataset_id = %self.dataset_id,
            nodes = forest.len(),
            roots = forest.roots().len(),
            leafs = forest.leafs().len(),
            "built lineage forest"
        );
        Ok(forest)
    }

    fn create_nodes(
        &self,
        forest: &mut Forest,
        executions: &[WorkflowExecutionRecord],
    ) -> Result<Vec<Pending>, ConstructionError> {
        let mut pending = Vec::new();
        for execution in executions {
            let mut previous = None;
            for (position, record) in execution.plugins.iter().enumerate() {
                if self.is_ignored(&record.id) {
                    continue;
                }
                let node = ExecutionPluginNode::new(
                    record.clone(),
                    execution.id.clone(),
                    execution.created_date,
                    position,
                );
                let index = forest
                    .insert(node)
                    .ok_or_else(|| ConstructionError::DuplicatePlugin {
                        plugin_id: record.id.clone(),
                    })?;
                pending.push(Pending {
                    index,
                    positional: previous,
                });
                previous = Some(index);
            }
        }
        Ok(pending)
    }

    fn resolve(
        forest: &Forest,
        index: &StartIndex,
        child: NodeIndex,
        positional: Option<NodeIndex>,
    ) -> Result<Option<NodeIndex>, ConstructionError> {
        let node = forest.node(child);
        match node.record().predecessor.declared() {
            DeclaredPredecessor::Absent => Ok(positional),
            DeclaredPredecessor::Partial => Err(ConstructionError::CorruptPredecessor {
                plugin_id: node.id().clone(),
            }),
            DeclaredPredecessor::Present {
                plugin_type,
                started_date,
            } => match index.lookup(plugin_type, started_date) {
                Some(KeyMatch::Unique(parent)) => Ok(Some(parent)),
                Some(KeyMatch::Ambiguous) => Err(ConstructionError::AmbiguousPredecessor {
                    plugin_id: node.id().clone(),
                    predecessor_type: plugin_type,
                    predecessor_started: started_date,
                }),
                None => Err(ConstructionError::UnresolvedPredecessor {
                    plugin_id: node.id().clone(),
                    predecessor_type: plugin_type,
                    predecessor_started: started_date,
                }),
            },
        }
    }

    fn validate(
        forest: &Forest,
        child: NodeIndex,
        parent: Option<NodeIndex>,
    ) -> Result<(), ConstructionError> {
        let node = forest.node(child);
        match (node.plugin_type().requires_predecessor(), parent) {
            (false, Some(parent)) => Err(ConstructionError::UnexpectedPredecessor {
                plugin_id: node.id().clone(),
                plugin_type: node.plugin_type(),
                predecessor_id: forest.node(parent).id().clone(),
            }),
            (true, None) => Err(ConstructionError::MissingPredecessor {
                plugin_id: node.id().clone(),
                plugin_type: node.plugin_type(),
            }),
            _ => Ok(()),
        }
    }

    fn check_acyclic(
        forest: &Forest,
        parent: NodeIndex,
        child: NodeIndex,
    ) -> Result<(), ConstructionError> {
        let parent = forest.node(parent);
        let closes_cycle =
            parent.index() == child || parent.ancestors().any(|ancestor| ancestor.index() == child);
        if closes_cycle {
            return Err(ConstructionError::CyclicLineage {
                plugin_id: forest.node(child).id().clone(),
            });
        }
        Ok(())
    }
}
