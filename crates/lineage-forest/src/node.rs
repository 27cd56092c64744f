//! Plugin execution nodes
//!
//! [`ExecutionPluginNode`] is the arena-stored node; [`NodeRef`] is a cheap,
//! copyable view pairing a node with its [`Forest`] so that parent and child
//! links can be followed.

use crate::forest::Forest;
use chrono::{DateTime, Utc};
use indexmap::IndexSet;
use lineage_record::{
    DataStatus, ExecutionId, PluginExecutionRecord, PluginId, PluginStatus, PluginType,
};
use std::collections::VecDeque;
use std::hash::{Hash, Hasher};

/// Position of a node in its forest's arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeIndex(pub(crate) usize);

impl NodeIndex {
    /// Raw arena position
    #[inline]
    #[must_use]
    pub fn get(self) -> usize {
        self.0
    }
}

/// One plugin execution with its lineage links
#[derive(Debug, Clone)]
pub struct ExecutionPluginNode {
    record: PluginExecutionRecord,
    execution_id: ExecutionId,
    execution_created_date: DateTime<Utc>,
    position: usize,
    parent: Option<NodeIndex>,
    children: IndexSet<NodeIndex>,
    has_non_link_checking_descendant: bool,
    has_live_non_link_checking_descendant: bool,
}

impl ExecutionPluginNode {
    pub(crate) fn new(
        record: PluginExecutionRecord,
        execution_id: ExecutionId,
        execution_created_date: DateTime<Utc>,
        position: usize,
    ) -> Self {
        Self {
            record,
            execution_id,
            execution_created_date,
            position,
            parent: None,
            children: IndexSet::new(),
            has_non_link_checking_descendant: false,
            has_live_non_link_checking_descendant: false,
        }
    }

    /// Plugin execution id
    #[inline]
    #[must_use]
    pub fn id(&self) -> &PluginId {
        &self.record.id
    }

    /// Processing kind
    #[inline]
    #[must_use]
    pub fn plugin_type(&self) -> PluginType {
        self.record.plugin_type
    }

    /// Lifecycle status
    #[inline]
    #[must_use]
    pub fn status(&self) -> PluginStatus {
        self.record.status
    }

    /// Status of the produced data
    #[inline]
    #[must_use]
    pub fn data_status(&self) -> DataStatus {
        self.record.data_status
    }

    /// Start time, absent if never started
    #[inline]
    #[must_use]
    pub fn started_date(&self) -> Option<DateTime<Utc>> {
        self.record.started_date
    }

    /// Underlying record
    #[inline]
    #[must_use]
    pub fn record(&self) -> &PluginExecutionRecord {
        &self.record
    }

    /// Owning workflow execution
    #[inline]
    #[must_use]
    pub fn execution_id(&self) -> &ExecutionId {
        &self.execution_id
    }

    /// Creation time of the owning workflow execution
    #[inline]
    #[must_use]
    pub fn execution_created_date(&self) -> DateTime<Utc> {
        self.execution_created_date
    }

    /// Index within the owning execution's plugin list
    #[inline]
    #[must_use]
    pub fn position(&self) -> usize {
        self.position
    }

    /// Parent position, if any
    #[inline]
    #[must_use]
    pub fn parent_index(&self) -> Option<NodeIndex> {
        self.parent
    }

    /// Child positions in attachment order
    #[inline]
    #[must_use]
    pub fn child_indices(&self) -> &IndexSet<NodeIndex> {
        &self.children
    }

    /// Check if some descendant is not a link-checking execution
    #[inline]
    #[must_use]
    pub fn has_non_link_checking_descendant(&self) -> bool {
        self.has_non_link_checking_descendant
    }

    /// Like [`has_non_link_checking_descendant`](Self::has_non_link_checking_descendant),
    /// but descendants whose data is flagged deleted do not count
    #[inline]
    #[must_use]
    pub fn has_live_non_link_checking_descendant(&self) -> bool {
        self.has_live_non_link_checking_descendant
    }

    /// Check if this execution started strictly before `cutoff`
    #[inline]
    #[must_use]
    pub fn was_started_before(&self, cutoff: DateTime<Utc>) -> bool {
        self.record.started_date.is_some_and(|started| started < cutoff)
    }

    pub(crate) fn set_parent(&mut self, parent: NodeIndex) {
        self.parent = Some(parent);
    }

    /// Returns `false` if the child was already present
    pub(crate) fn insert_child(&mut self, child: NodeIndex) -> bool {
        self.children.insert(child)
    }

    /// Returns `false` if the flag was already set
    pub(crate) fn mark_non_link_checking_descendant(&mut self) -> bool {
        !std::mem::replace(&mut self.has_non_link_checking_descendant, true)
    }

    /// Returns `false` if the flag was already set
    pub(crate) fn mark_live_non_link_checking_descendant(&mut self) -> bool {
        !std::mem::replace(&mut self.has_live_non_link_checking_descendant, true)
    }
}

/// Borrowed view of a node inside its forest
///
/// Dereferences to [`ExecutionPluginNode`] for plain accessors.
#[derive(Clone, Copy)]
pub struct NodeRef<'f> {
    forest: &'f Forest,
    index: NodeIndex,
}

impl<'f> NodeRef<'f> {
    pub(crate) fn new(forest: &'f Forest, index: NodeIndex) -> Self {
        Self { forest, index }
    }

    /// Arena position
    #[inline]
    #[must_use]
    pub fn index(self) -> NodeIndex {
        self.index
    }

    /// Owning forest
    #[inline]
    #[must_use]
    pub fn forest(self) -> &'f Forest {
        self.forest
    }

    /// Underlying node
    #[inline]
    #[must_use]
    pub fn node(self) -> &'f ExecutionPluginNode {
        self.forest.node_at(self.index)
    }

    /// Parent node, `None` for roots
    #[inline]
    #[must_use]
    pub fn parent(self) -> Option<NodeRef<'f>> {
        self.node().parent.map(|index| NodeRef::new(self.forest, index))
    }

    /// Children in attachment order
    pub fn children(self) -> impl DoubleEndedIterator<Item = NodeRef<'f>> + ExactSizeIterator {
        let forest = self.forest;
        self.node()
            .children
            .iter()
            .map(move |&index| NodeRef::new(forest, index))
    }

    /// Check if node has no children
    #[inline]
    #[must_use]
    pub fn is_childless(self) -> bool {
        self.node().children.is_empty()
    }

    /// Ancestors from the parent up to the root
    pub fn ancestors(self) -> impl Iterator<Item = NodeRef<'f>> {
        std::iter::successors(self.parent(), |node| node.parent())
    }

    /// Number of ancestors
    #[must_use]
    pub fn depth(self) -> usize {
        self.ancestors().count()
    }

    /// Check if `self` is a proper ancestor of `other`
    #[must_use]
    pub fn is_ancestor_of(self, other: NodeRef<'_>) -> bool {
        other.ancestors().any(|ancestor| ancestor.index == self.index)
    }

    /// Check if this node is a structural leaf
    ///
    /// A leaf has only link-checking descendants (or none), and is the
    /// topmost such node: it is a root, or its parent has a descendant that is
    /// not link checking. Leafs are never ancestors of one another.
    #[must_use]
    pub fn is_leaf(self) -> bool {
        if self.has_non_link_checking_descendant() {
            return false;
        }
        self.parent()
            .map_or(true, |parent| parent.has_non_link_checking_descendant())
    }

    /// Check if this node is a leaf once deleted data is disregarded
    ///
    /// Same shape as [`is_leaf`](Self::is_leaf) over
    /// [`has_live_non_link_checking_descendant`](ExecutionPluginNode::has_live_non_link_checking_descendant).
    /// Every structural leaf lies inside the subtree of some live leaf.
    #[must_use]
    pub fn is_live_leaf(self) -> bool {
        if self.has_live_non_link_checking_descendant() {
            return false;
        }
        self.parent()
            .map_or(true, |parent| parent.has_live_non_link_checking_descendant())
    }

    /// Emit every maximal node of this subtree that satisfies `predicate`
    ///
    /// Descends top-down; once a node matches it is passed to `sink` and its
    /// subtree is not searched further. The emitted nodes therefore never
    /// overlap.
    pub fn find_subtrees<P, S>(self, mut predicate: P, sink: &mut S)
    where
        P: FnMut(NodeRef<'f>) -> bool,
        S: FnMut(NodeRef<'f>),
    {
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            if predicate(node) {
                sink(node);
            } else {
                stack.extend(node.children().rev());
            }
        }
    }

    /// Collecting variant of [`find_subtrees`](Self::find_subtrees)
    #[must_use]
    pub fn subtrees_matching<P>(self, predicate: P) -> Vec<NodeRef<'f>>
    where
        P: FnMut(NodeRef<'f>) -> bool,
    {
        let mut found = Vec::new();
        self.find_subtrees(predicate, &mut |node| found.push(node));
        found
    }

    /// This node and all descendants, every descendant before its ancestors
    #[must_use]
    pub fn all_in_removal_order(self) -> Vec<NodeRef<'f>> {
        let mut visited = Vec::new();
        let mut queue = VecDeque::from([self]);
        while let Some(node) = queue.pop_front() {
            visited.push(node);
            queue.extend(node.children());
        }
        visited.reverse();
        visited
    }

    /// Proper descendants in breadth-first order
    #[must_use]
    pub fn descendants(self) -> Vec<NodeRef<'f>> {
        let mut found = Vec::new();
        let mut queue: VecDeque<_> = self.children().collect();
        while let Some(node) = queue.pop_front() {
            found.push(node);
            queue.extend(node.children());
        }
        found
    }

    /// Check if this execution (or the run it waited on) predates `cutoff`
    ///
    /// Cancelled executions that never started borrow the start time of the
    /// nearest ancestor that did. When no start time is found, the creation
    /// date of the workflow execution where the walk stopped decides.
    #[must_use]
    pub fn was_started_or_cancelled_before(self, cutoff: DateTime<Utc>) -> bool {
        let mut current = self;
        loop {
            if let Some(started) = current.started_date() {
                return started < cutoff;
            }
            match (current.status(), current.parent()) {
                (PluginStatus::Cancelled, Some(parent)) => current = parent,
                _ => return current.execution_created_date() < cutoff,
            }
        }
    }
}

impl<'f> std::ops::Deref for NodeRef<'f> {
    type Target = ExecutionPluginNode;

    fn deref(&self) -> &Self::Target {
        self.node()
    }
}

impl std::fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeRef")
            .field("id", self.id())
            .field("plugin_type", &self.plugin_type())
            .field("status", &self.status())
            .finish()
    }
}

impl PartialEq for NodeRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.forest, other.forest) && self.index == other.index
    }
}

impl Eq for NodeRef<'_> {}

impl Hash for NodeRef<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
    }
}
