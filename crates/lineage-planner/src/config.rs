//! Planner configuration

use crate::error::ConfigError;
use lineage_discovery::{DiscoveryMode, StrategySpec};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Planner configuration
///
/// Every field is optional in TOML; missing fields take their defaults.
///
/// ```toml
/// mode = "with_only_deleted_descendants"
/// parallel = true
///
/// [strategy]
/// kind = "migration_cleanup"
/// cutoff = "2021-06-01T00:00:00Z"
/// superseded_types = ["PUBLISH", "PREVIEW"]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Which nodes may head a removal subtree
    pub mode: DiscoveryMode,
    /// Process datasets of one iteration in parallel
    pub parallel: bool,
    /// Removal rationale
    pub strategy: StrategySpec,
}

impl PlannerConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With strategy
    #[inline]
    #[must_use]
    pub fn with_strategy(mut self, strategy: StrategySpec) -> Self {
        self.strategy = strategy;
        self
    }

    /// With discovery mode
    #[inline]
    #[must_use]
    pub fn with_mode(mut self, mode: DiscoveryMode) -> Self {
        self.mode = mode;
        self
    }

    /// With inter-dataset parallelism
    #[inline]
    #[must_use]
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Parse a TOML document
    ///
    /// # Errors
    /// Returns [`ConfigError::Parse`] on malformed input.
    pub fn from_toml_str(toml: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml)?)
    }

    /// Render as TOML
    ///
    /// # Errors
    /// Returns [`ConfigError::Render`] if serialization fails.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string(self)?)
    }

    /// Load a TOML file
    ///
    /// # Errors
    /// Returns [`ConfigError::Io`] if the file cannot be read and
    /// [`ConfigError::Parse`] if it is malformed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let toml = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&toml)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lineage_record::PluginType;
    use lineage_test_utils::ts;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn empty_document_gives_defaults() {
        let config = PlannerConfig::from_toml_str("").unwrap();
        assert_eq!(config, PlannerConfig::default());
        assert_eq!(config.strategy, StrategySpec::FailedOrCancelled);
        assert_eq!(config.mode, DiscoveryMode::WithoutDescendants);
        assert!(!config.parallel);
    }

    #[test]
    fn parses_full_document() {
        let config = PlannerConfig::from_toml_str(
            r#"
            mode = "with_only_deleted_descendants"
            parallel = true

            [strategy]
            kind = "migration_cleanup"
            cutoff = "2021-01-01T00:20:00Z"
            superseded_types = ["PUBLISH", "PREVIEW"]
            "#,
        )
        .unwrap();

        let expected = PlannerConfig::new()
            .with_mode(DiscoveryMode::WithOnlyDeletedDescendants)
            .with_parallel(true)
            .with_strategy(StrategySpec::MigrationCleanup {
                cutoff: ts(20),
                superseded_types: vec![PluginType::Publish, PluginType::Preview],
            });
        assert_eq!(config, expected);
    }

    #[test]
    fn rejects_unknown_strategy_kind() {
        let err = PlannerConfig::from_toml_str("[strategy]\nkind = \"everything\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn toml_round_trip() {
        let config = PlannerConfig::new().with_strategy(StrategySpec::Superseded {
            plugin_type: PluginType::Enrichment,
            cutoff: ts(5),
        });
        let rendered = config.to_toml_string().unwrap();
        assert_eq!(PlannerConfig::from_toml_str(&rendered).unwrap(), config);
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "parallel = true").unwrap();
        let config = PlannerConfig::load(file.path()).unwrap();
        assert!(config.parallel);

        let err = PlannerConfig::load(file.path().with_extension("absent")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
