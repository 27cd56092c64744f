//! Dataset-specific removal

use crate::mode::DiscoveryMode;
use crate::strategy::{identify_leaf_subtrees, IdentificationStrategy};
use lineage_forest::{Forest, NodeRef};
use lineage_record::DatasetId;

/// Selects every leaf subtree of one dataset, and nothing elsewhere
#[derive(Debug, Clone)]
pub struct DatasetSpecificStrategy {
    dataset_id: DatasetId,
}

impl DatasetSpecificStrategy {
    /// Create new strategy for a dataset
    #[inline]
    #[must_use]
    pub fn new(dataset_id: impl Into<DatasetId>) -> Self {
        Self {
            dataset_id: dataset_id.into(),
        }
    }

    /// Targeted dataset
    #[inline]
    #[must_use]
    pub fn dataset_id(&self) -> &DatasetId {
        &self.dataset_id
    }
}

impl IdentificationStrategy for DatasetSpecificStrategy {
    fn name(&self) -> &'static str {
        "DatasetSpecific"
    }

    fn identify<'f>(&self, forest: &'f Forest, mode: DiscoveryMode) -> Vec<NodeRef<'f>> {
        if forest.dataset_id() != &self.dataset_id {
            return Vec::new();
        }
        identify_leaf_subtrees(forest, mode, |_| true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lineage_forest::LineageForestBuilder;
    use lineage_record::PluginType;
    use lineage_test_utils::{deleted, execution, finished, scenario_a, scenario_b};
    use pretty_assertions::assert_eq;

    #[test]
    fn other_datasets_are_untouched() {
        let forest = LineageForestBuilder::new("Y").build(&scenario_b()).unwrap();
        let strategy = DatasetSpecificStrategy::new("X");
        assert!(strategy.identify(&forest, DiscoveryMode::WithoutDescendants).is_empty());
    }

    #[test]
    fn selects_all_leaf_subtrees_of_dataset() {
        let forest = LineageForestBuilder::new("Y").build(&scenario_b()).unwrap();
        let strategy = DatasetSpecificStrategy::new("Y");

        let found: Vec<_> = strategy
            .identify(&forest, DiscoveryMode::WithoutDescendants)
            .iter()
            .map(|n| n.id().to_string())
            .collect();
        assert_eq!(found, vec!["y-pub1", "y-pub2"]);
    }

    #[test]
    fn link_checking_is_not_a_leaf_while_preview_hangs_below() {
        let forest = LineageForestBuilder::new("X").build(&scenario_a(false)).unwrap();
        let strategy = DatasetSpecificStrategy::new("X");

        let found = strategy.identify(&forest, DiscoveryMode::WithoutDescendants);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id().as_str(), "x-pv");
        assert_eq!(strategy.dataset_id().as_str(), "X");
    }

    #[test]
    fn harvest_over_deleted_data_is_selected_in_deleted_mode() {
        let history = [execution(
            "e1",
            "d",
            0,
            [
                finished("h", PluginType::HttpHarvest, 0),
                deleted(finished("t", PluginType::Transformation, 1)),
            ],
        )];
        let forest = LineageForestBuilder::new("d").build(&history).unwrap();
        let strategy = DatasetSpecificStrategy::new("d");

        let found = strategy.identify(&forest, DiscoveryMode::WithOnlyDeletedDescendants);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id().as_str(), "h");

        let found = strategy.identify(&forest, DiscoveryMode::WithoutDescendants);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id().as_str(), "t");
    }
}
