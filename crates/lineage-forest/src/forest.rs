//! Per-dataset lineage forest

use crate::error::InvariantViolation;
use crate::node::{ExecutionPluginNode, NodeIndex, NodeRef};
use indexmap::IndexSet;
use lineage_record::{DataStatus, DatasetId, PluginId};
use std::collections::HashMap;

/// All plugin executions of one dataset, linked by lineage
///
/// Built by [`LineageForestBuilder`](crate::LineageForestBuilder). Immutable
/// once built; a new forest is constructed for every planning pass.
#[derive(Debug, Clone)]
pub struct Forest {
    dataset_id: DatasetId,
    nodes: Vec<ExecutionPluginNode>,
    by_id: HashMap<PluginId, NodeIndex>,
    roots: Vec<NodeIndex>,
    leafs: IndexSet<NodeIndex>,
    live_leafs: IndexSet<NodeIndex>,
}

impl Forest {
    pub(crate) fn new(dataset_id: DatasetId) -> Self {
        Self {
            dataset_id,
            nodes: Vec::new(),
            by_id: HashMap::new(),
            roots: Vec::new(),
            leafs: IndexSet::new(),
            live_leafs: IndexSet::new(),
        }
    }

    /// Dataset this forest describes
    #[inline]
    #[must_use]
    pub fn dataset_id(&self) -> &DatasetId {
        &self.dataset_id
    }

    /// Number of nodes
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if forest has no nodes
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// View of the node at `index`
    ///
    /// # Panics
    /// Panics if `index` does not belong to this forest.
    #[inline]
    #[must_use]
    pub fn node(&self, index: NodeIndex) -> NodeRef<'_> {
        assert!(index.0 < self.nodes.len(), "node index out of range");
        NodeRef::new(self, index)
    }

    pub(crate) fn node_at(&self, index: NodeIndex) -> &ExecutionPluginNode {
        &self.nodes[index.0]
    }

    /// Look up a node by plugin id
    #[must_use]
    pub fn get(&self, id: &PluginId) -> Option<NodeRef<'_>> {
        self.by_id.get(id).map(|&index| NodeRef::new(self, index))
    }

    /// Check if a plugin id belongs to this forest
    #[inline]
    #[must_use]
    pub fn contains(&self, id: &PluginId) -> bool {
        self.by_id.contains_key(id)
    }

    /// All nodes in insertion order
    pub fn nodes(&self) -> impl ExactSizeIterator<Item = NodeRef<'_>> {
        (0..self.nodes.len()).map(move |i| NodeRef::new(self, NodeIndex(i)))
    }

    /// Nodes without a parent
    pub fn roots(&self) -> impl ExactSizeIterator<Item = NodeRef<'_>> {
        self.roots.iter().map(move |&index| NodeRef::new(self, index))
    }

    /// Structural leafs
    pub fn leafs(&self) -> impl ExactSizeIterator<Item = NodeRef<'_>> {
        self.leafs.iter().map(move |&index| NodeRef::new(self, index))
    }

    /// Leafs computed as if executions with deleted data were absent
    ///
    /// These head the subtrees searched when descendants flagged deleted may
    /// stay in place.
    pub fn live_leafs(&self) -> impl ExactSizeIterator<Item = NodeRef<'_>> {
        self.live_leafs.iter().map(move |&index| NodeRef::new(self, index))
    }

    /// Plugin ids of the structural leafs
    pub fn leaf_ids(&self) -> impl Iterator<Item = &PluginId> {
        self.leafs.iter().map(move |&index| self.node_at(index).id())
    }

    /// Length of the longest root-to-node path, counted in nodes
    #[must_use]
    pub fn max_depth(&self) -> usize {
        let mut depths = vec![0usize; self.nodes.len()];
        let mut stack: Vec<(NodeIndex, usize)> = self.roots.iter().map(|&r| (r, 1)).collect();
        while let Some((index, depth)) = stack.pop() {
            depths[index.0] = depth;
            stack.extend(self.node_at(index).child_indices().iter().map(|&c| (c, depth + 1)));
        }
        depths.into_iter().max().unwrap_or(0)
    }

    /// Add a detached node, returning its index or `None` if the id is taken
    pub(crate) fn insert(&mut self, node: ExecutionPluginNode) -> Option<NodeIndex> {
        if self.by_id.contains_key(node.id()) {
            return None;
        }
        let index = NodeIndex(self.nodes.len());
        self.by_id.insert(node.id().clone(), index);
        self.nodes.push(node);
        Some(index)
    }

    /// Link `child` under `parent` and propagate the descendant flags
    ///
    /// Each flag walk stops at the first ancestor that already carries it, so
    /// each node is flagged at most once per flag over the whole construction.
    ///
    /// # Errors
    /// Returns [`InvariantViolation::AlreadyAttached`] if `child` already has
    /// a parent.
    pub(crate) fn add_child(
        &mut self,
        parent: NodeIndex,
        child: NodeIndex,
    ) -> Result<(), InvariantViolation> {
        if let Some(existing) = self.nodes[child.0].parent_index() {
            return Err(InvariantViolation::AlreadyAttached {
                child: self.nodes[child.0].id().clone(),
                existing_parent: self.nodes[existing.0].id().clone(),
            });
        }
        if !self.nodes[parent.0].insert_child(child) {
            return Err(InvariantViolation::AlreadyAttached {
                child: self.nodes[child.0].id().clone(),
                existing_parent: self.nodes[parent.0].id().clone(),
            });
        }
        self.nodes[child.0].set_parent(parent);

        let child_node = &self.nodes[child.0];
        let counts = !child_node.plugin_type().is_link_checking();
        let flag = counts || child_node.has_non_link_checking_descendant();
        let live_flag = (counts && child_node.data_status() != DataStatus::Deleted)
            || child_node.has_live_non_link_checking_descendant();
        if flag {
            self.mark_ancestors(parent, ExecutionPluginNode::mark_non_link_checking_descendant);
        }
        if live_flag {
            self.mark_ancestors(parent, ExecutionPluginNode::mark_live_non_link_checking_descendant);
        }
        Ok(())
    }

    /// Apply `mark` from `from` upwards until it reports an already set flag
    fn mark_ancestors(&mut self, from: NodeIndex, mark: fn(&mut ExecutionPluginNode) -> bool) {
        let mut current = Some(from);
        while let Some(index) = current {
            let node = &mut self.nodes[index.0];
            if !mark(node) {
                break;
            }
            current = node.parent_index();
        }
    }

    /// Derive roots and leafs once all edges are in place
    pub(crate) fn finish(&mut self) {
        self.roots = (0..self.nodes.len())
            .map(NodeIndex)
            .filter(|&index| self.node_at(index).parent_index().is_none())
            .collect();
        let leafs: IndexSet<NodeIndex> = self
            .nodes()
            .filter(|node| node.is_leaf())
            .map(NodeRef::index)
            .collect();
        let live_leafs: IndexSet<NodeIndex> = self
            .nodes()
            .filter(|node| node.is_live_leaf())
            .map(NodeRef::index)
            .collect();
        self.leafs = leafs;
        self.live_leafs = live_leafs;
    }
}
