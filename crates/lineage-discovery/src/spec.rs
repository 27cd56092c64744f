//! Configurable strategy selection

use crate::dataset::DatasetSpecificStrategy;
use crate::failed::FailedOrCancelledStrategy;
use crate::migration::MigrationCleanupStrategy;
use crate::strategy::IdentificationStrategy;
use crate::superseded::SupersededStrategy;
use chrono::{DateTime, Utc};
use lineage_record::{DatasetId, PluginType};
use serde::{Deserialize, Serialize};

fn all_plugin_types() -> Vec<PluginType> {
    PluginType::ALL.to_vec()
}

/// Serializable description of an identification strategy
///
/// Tagged by `kind`, e.g. in TOML:
///
/// ```toml
/// [strategy]
/// kind = "superseded"
/// plugin_type = "PUBLISH"
/// cutoff = "2021-06-01T00:00:00Z"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StrategySpec {
    /// [`FailedOrCancelledStrategy`]
    #[default]
    FailedOrCancelled,

    /// [`SupersededStrategy`]
    Superseded {
        /// Kind to check
        plugin_type: PluginType,
        /// Only executions started before this take part
        cutoff: DateTime<Utc>,
    },

    /// [`DatasetSpecificStrategy`]
    DatasetSpecific {
        /// Dataset to clear
        dataset_id: DatasetId,
    },

    /// [`MigrationCleanupStrategy`]
    MigrationCleanup {
        /// Cutoff for both rationales
        cutoff: DateTime<Utc>,
        /// Kinds checked for supersession
        #[serde(default = "all_plugin_types")]
        superseded_types: Vec<PluginType>,
    },
}

impl StrategySpec {
    /// Configuration tag
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::FailedOrCancelled => "failed_or_cancelled",
            Self::Superseded { .. } => "superseded",
            Self::DatasetSpecific { .. } => "dataset_specific",
            Self::MigrationCleanup { .. } => "migration_cleanup",
        }
    }

    /// Instantiate the described strategy
    #[must_use]
    pub fn build(&self) -> Box<dyn IdentificationStrategy> {
        match self {
            Self::FailedOrCancelled => Box::new(FailedOrCancelledStrategy::new()),
            Self::Superseded {
                plugin_type,
                cutoff,
            } => Box::new(SupersededStrategy::new(*plugin_type, *cutoff)),
            Self::DatasetSpecific { dataset_id } => {
                Box::new(DatasetSpecificStrategy::new(dataset_id.clone()))
            }
            Self::MigrationCleanup {
                cutoff,
                superseded_types,
            } => Box::new(
                MigrationCleanupStrategy::new(*cutoff)
                    .with_superseded_types(superseded_types.iter().copied()),
            ),
        }
    }
}

/// Description of a built-in strategy kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrategyInfo {
    /// Configuration tag
    pub kind: &'static str,
    /// Required parameters
    pub parameters: &'static str,
    /// One-line summary
    pub summary: &'static str,
}

/// Built-in strategy kinds
pub const BUILTIN_STRATEGIES: [StrategyInfo; 4] = [
    StrategyInfo {
        kind: "failed_or_cancelled",
        parameters: "",
        summary: "leaf subtrees headed by a failed or cancelled execution",
    },
    StrategyInfo {
        kind: "superseded",
        parameters: "plugin_type, cutoff",
        summary: "finished executions of one kind started before the cutoff, except the latest",
    },
    StrategyInfo {
        kind: "dataset_specific",
        parameters: "dataset_id",
        summary: "every leaf subtree of one dataset",
    },
    StrategyInfo {
        kind: "migration_cleanup",
        parameters: "cutoff, superseded_types (optional)",
        summary: "failed/cancelled or superseded before the cutoff",
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use lineage_test_utils::ts;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_is_failed_or_cancelled() {
        let spec = StrategySpec::default();
        assert_eq!(spec.kind(), "failed_or_cancelled");
        assert_eq!(spec.build().name(), "FailedOrCancelled");
    }

    #[test]
    fn parses_tagged_toml() {
        let spec: StrategySpec = toml::from_str(
            r#"
            kind = "superseded"
            plugin_type = "PUBLISH"
            cutoff = "2021-01-01T00:10:00Z"
            "#,
        )
        .unwrap();
        assert_eq!(
            spec,
            StrategySpec::Superseded {
                plugin_type: PluginType::Publish,
                cutoff: ts(10),
            }
        );
        assert_eq!(spec.build().name(), "Superseded");
    }

    #[test]
    fn migration_cleanup_defaults_to_all_types() {
        let spec: StrategySpec =
            serde_json::from_str(r#"{"kind":"migration_cleanup","cutoff":"2021-01-01T00:00:00Z"}"#)
                .unwrap();
        match &spec {
            StrategySpec::MigrationCleanup {
                superseded_types, ..
            } => assert_eq!(superseded_types.len(), PluginType::ALL.len()),
            other => panic!("unexpected spec {other:?}"),
        }
        assert_eq!(spec.build().name(), "MigrationCleanup");
    }

    #[test]
    fn dataset_specific_round_trips_through_json() {
        let spec = StrategySpec::DatasetSpecific {
            dataset_id: DatasetId::from("42"),
        };
        let json = serde_json::to_string(&spec).unwrap();
        assert_eq!(json, r#"{"kind":"dataset_specific","dataset_id":"42"}"#);
        assert_eq!(serde_json::from_str::<StrategySpec>(&json).unwrap(), spec);
    }

    #[test]
    fn builtin_kinds_match_config_tags() {
        let specs = [
            StrategySpec::FailedOrCancelled,
            StrategySpec::Superseded {
                plugin_type: PluginType::Preview,
                cutoff: ts(0),
            },
            StrategySpec::DatasetSpecific {
                dataset_id: DatasetId::from("d"),
            },
            StrategySpec::MigrationCleanup {
                cutoff: ts(0),
                superseded_types: Vec::new(),
            },
        ];
        let kinds: Vec<_> = specs.iter().map(StrategySpec::kind).collect();
        let builtin: Vec<_> = BUILTIN_STRATEGIES.iter().map(|info| info.kind).collect();
        assert_eq!(kinds, builtin);
    }
}
