//! Discovery modes

use lineage_forest::{Forest, NodeRef};
use lineage_record::DataStatus;
use serde::{Deserialize, Serialize};

/// Which nodes may head a removal subtree
///
/// The mode reflects what removal will actually do downstream: physically
/// delete history, or only flag data as deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoveryMode {
    /// Node must be childless
    #[default]
    WithoutDescendants,

    /// Every descendant must already be flagged deleted, and the node
    /// itself must not be
    WithOnlyDeletedDescendants,
}

impl DiscoveryMode {
    /// All modes
    pub const ALL: [DiscoveryMode; 2] = [
        DiscoveryMode::WithoutDescendants,
        DiscoveryMode::WithOnlyDeletedDescendants,
    ];

    /// Check if `node` may be selected under this mode
    #[must_use]
    pub fn admits(self, node: NodeRef<'_>) -> bool {
        match self {
            Self::WithoutDescendants => node.is_childless(),
            Self::WithOnlyDeletedDescendants => {
                if node.data_status() == DataStatus::Deleted {
                    return false;
                }
                let mut stack: Vec<NodeRef<'_>> = node.children().collect();
                while let Some(descendant) = stack.pop() {
                    if descendant.data_status() != DataStatus::Deleted {
                        return false;
                    }
                    stack.extend(descendant.children());
                }
                true
            }
        }
    }

    /// Leafs whose subtrees hold every node this mode can admit
    ///
    /// Without descendants these are the structural leafs. When deleted
    /// descendants may stay, a node above flagged data can qualify, so the
    /// search starts from the leafs computed with deleted data disregarded.
    #[must_use]
    pub fn search_roots(self, forest: &Forest) -> Vec<NodeRef<'_>> {
        match self {
            Self::WithoutDescendants => forest.leafs().collect(),
            Self::WithOnlyDeletedDescendants => forest.live_leafs().collect(),
        }
    }

    /// Configuration name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::WithoutDescendants => "without_descendants",
            Self::WithOnlyDeletedDescendants => "with_only_deleted_descendants",
        }
    }
}

impl std::fmt::Display for DiscoveryMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lineage_forest::LineageForestBuilder;
    use lineage_record::{PluginId, PluginType};
    use lineage_test_utils::{deleted, execution, failed, finished};

    #[test]
    fn without_descendants_needs_childless_node() {
        let history = [execution(
            "e1",
            "d",
            0,
            [
                finished("h", PluginType::HttpHarvest, 0),
                failed("t", PluginType::Transformation, 1),
            ],
        )];
        let forest = LineageForestBuilder::new("d").build(&history).unwrap();
        let get = |id: &str| forest.get(&PluginId::from(id)).unwrap();

        assert!(DiscoveryMode::WithoutDescendants.admits(get("t")));
        assert!(!DiscoveryMode::WithoutDescendants.admits(get("h")));
    }

    #[test]
    fn deleted_descendants_mode() {
        let history = [execution(
            "e1",
            "d",
            0,
            [
                finished("h", PluginType::HttpHarvest, 0),
                deleted(finished("v", PluginType::ValidationExternal, 1)),
                deleted(failed("t", PluginType::Transformation, 2)),
            ],
        )];
        let forest = LineageForestBuilder::new("d").build(&history).unwrap();
        let get = |id: &str| forest.get(&PluginId::from(id)).unwrap();
        let mode = DiscoveryMode::WithOnlyDeletedDescendants;

        assert!(mode.admits(get("h")));
        // Already flagged nodes are not selected again
        assert!(!mode.admits(get("v")));
        assert!(!mode.admits(get("t")));
    }

    #[test]
    fn live_descendant_blocks_deleted_descendants_mode() {
        let history = [execution(
            "e1",
            "d",
            0,
            [
                finished("h", PluginType::HttpHarvest, 0),
                deleted(finished("v", PluginType::ValidationExternal, 1)),
                finished("t", PluginType::Transformation, 2),
            ],
        )];
        let forest = LineageForestBuilder::new("d").build(&history).unwrap();
        let get = |id: &str| forest.get(&PluginId::from(id)).unwrap();
        let mode = DiscoveryMode::WithOnlyDeletedDescendants;

        assert!(!mode.admits(get("h")));
        assert!(mode.admits(get("t")));
    }

    #[test]
    fn deleted_mode_searches_above_flagged_data() {
        let history = [execution(
            "e1",
            "d",
            0,
            [
                finished("h", PluginType::HttpHarvest, 0),
                failed("t", PluginType::Transformation, 1),
                deleted(finished("n", PluginType::Normalization, 2)),
            ],
        )];
        let forest = LineageForestBuilder::new("d").build(&history).unwrap();
        let roots = |mode: DiscoveryMode| {
            mode.search_roots(&forest)
                .iter()
                .map(|n| n.id().to_string())
                .collect::<Vec<_>>()
        };

        assert_eq!(roots(DiscoveryMode::WithoutDescendants), vec!["n"]);
        assert_eq!(roots(DiscoveryMode::WithOnlyDeletedDescendants), vec!["t"]);
    }

    #[test]
    fn mode_serde_names() {
        for mode in DiscoveryMode::ALL {
            let json = serde_json::to_string(&mode).unwrap();
            assert_eq!(json, format!("\"{mode}\""));
        }
    }
}
