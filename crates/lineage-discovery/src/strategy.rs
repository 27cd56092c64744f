//! Identification strategy trait and shared leaf-subtree search

use crate::mode::DiscoveryMode;
use lineage_forest::{Forest, NodeRef};
use tracing::trace;

/// Removal rationale selecting candidate subtree roots from a forest
///
/// # Contract
/// Returned nodes never overlap: no returned node is an ancestor of another.
/// Each one heads a whole subtree to be removed; callers expand it with
/// [`NodeRef::all_in_removal_order`].
pub trait IdentificationStrategy: Send + Sync + std::fmt::Debug {
    /// Strategy name (for logging/configuration)
    fn name(&self) -> &'static str;

    /// Select removal subtree roots
    fn identify<'f>(&self, forest: &'f Forest, mode: DiscoveryMode) -> Vec<NodeRef<'f>>;
}

impl<S: IdentificationStrategy + ?Sized> IdentificationStrategy for Box<S> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn identify<'f>(&self, forest: &'f Forest, mode: DiscoveryMode) -> Vec<NodeRef<'f>> {
        (**self).identify(forest, mode)
    }
}

/// Search every leaf subtree for maximal nodes matching `predicate` and `mode`
///
/// The leafs searched are [`DiscoveryMode::search_roots`]. They never nest, so
/// the subtrees searched are disjoint and the result inherits the non-overlap
/// guarantee of [`NodeRef::find_subtrees`].
pub fn identify_leaf_subtrees<'f, P>(
    forest: &'f Forest,
    mode: DiscoveryMode,
    mut predicate: P,
) -> Vec<NodeRef<'f>>
where
    P: FnMut(NodeRef<'f>) -> bool,
{
    let mut found = Vec::new();
    for leaf in mode.search_roots(forest) {
        leaf.find_subtrees(
            |node| predicate(node) && mode.admits(node),
            &mut |node| found.push(node),
        );
    }
    trace!(
        dataset_id = %forest.dataset_id(),
        %mode,
        candidates = found.len(),
        "searched leaf subtrees"
    );
    found
}
