//! Planner error types

use lineage_forest::InvariantViolation;
use lineage_record::{DatasetId, SnapshotError};
use std::path::PathBuf;

/// Failure reading from the execution store
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// Snapshot file could not be read
    #[error("failed to read snapshot {}: {source}", path.display())]
    Io {
        /// File that was read
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// Snapshot document is malformed
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    /// Backing store refused or failed the query
    #[error("execution store unavailable: {0}")]
    Unavailable(String),
}

/// Failure loading planner configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("failed to read config {}: {source}", path.display())]
    Io {
        /// File that was read
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// Config document is malformed
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config could not be rendered
    #[error("failed to render config: {0}")]
    Render(#[from] toml::ser::Error),
}

/// Failure of a planning run
///
/// Inconsistent dataset histories are not errors here: they are reported in
/// [`PlanReport::failed_datasets`](crate::PlanReport::failed_datasets) and
/// the run continues without them.
#[derive(Debug, thiserror::Error)]
pub enum PlannerError {
    /// Snapshot could not be fetched
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// Forest construction broke an internal invariant
    #[error("lineage forest of dataset {dataset_id} is corrupt: {source}")]
    Invariant {
        /// Dataset whose forest was being built
        dataset_id: DatasetId,
        /// The broken invariant
        #[source]
        source: InvariantViolation,
    },
}
