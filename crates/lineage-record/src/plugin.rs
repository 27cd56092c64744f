//! Plugin execution records
//!
//! A plugin execution is one processing step (harvest, transformation,
//! link checking, publication, ...) of a workflow execution.

use crate::ids::PluginId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Processing kind of a plugin execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PluginType {
    /// OAI-PMH harvest
    OaipmhHarvest,
    /// HTTP (file) harvest
    HttpHarvest,
    /// Validation against the external schema
    ValidationExternal,
    /// XSLT transformation
    Transformation,
    /// Validation against the internal schema
    ValidationInternal,
    /// Normalization
    Normalization,
    /// Enrichment
    Enrichment,
    /// Media processing
    MediaProcess,
    /// Link checking, auxiliary and not load-bearing for lineage
    LinkChecking,
    /// Index to preview
    Preview,
    /// Index to publish
    Publish,
    /// Depublication
    Depublish,
    /// Reindex to preview
    ReindexToPreview,
    /// Reindex to publish
    ReindexToPublish,
}

impl PluginType {
    /// All plugin kinds in pipeline order
    pub const ALL: [PluginType; 14] = [
        PluginType::OaipmhHarvest,
        PluginType::HttpHarvest,
        PluginType::ValidationExternal,
        PluginType::Transformation,
        PluginType::ValidationInternal,
        PluginType::Normalization,
        PluginType::Enrichment,
        PluginType::MediaProcess,
        PluginType::LinkChecking,
        PluginType::Preview,
        PluginType::Publish,
        PluginType::Depublish,
        PluginType::ReindexToPreview,
        PluginType::ReindexToPublish,
    ];

    /// Check if this kind harvests new data
    #[inline]
    #[must_use]
    pub fn is_harvest(self) -> bool {
        matches!(self, Self::OaipmhHarvest | Self::HttpHarvest)
    }

    /// Check if this kind is a reindex
    #[inline]
    #[must_use]
    pub fn is_reindex(self) -> bool {
        matches!(self, Self::ReindexToPreview | Self::ReindexToPublish)
    }

    /// Check if this kind is a depublication
    #[inline]
    #[must_use]
    pub fn is_depublish(self) -> bool {
        matches!(self, Self::Depublish)
    }

    /// Check if this kind is link checking
    #[inline]
    #[must_use]
    pub fn is_link_checking(self) -> bool {
        matches!(self, Self::LinkChecking)
    }

    /// Check if an execution of this kind must descend from another execution
    ///
    /// Harvest, reindex and depublish executions start a lineage of their own.
    #[inline]
    #[must_use]
    pub fn requires_predecessor(self) -> bool {
        !(self.is_harvest() || self.is_reindex() || self.is_depublish())
    }

    /// Wire name (e.g. `LINK_CHECKING`)
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OaipmhHarvest => "OAIPMH_HARVEST",
            Self::HttpHarvest => "HTTP_HARVEST",
            Self::ValidationExternal => "VALIDATION_EXTERNAL",
            Self::Transformation => "TRANSFORMATION",
            Self::ValidationInternal => "VALIDATION_INTERNAL",
            Self::Normalization => "NORMALIZATION",
            Self::Enrichment => "ENRICHMENT",
            Self::MediaProcess => "MEDIA_PROCESS",
            Self::LinkChecking => "LINK_CHECKING",
            Self::Preview => "PREVIEW",
            Self::Publish => "PUBLISH",
            Self::Depublish => "DEPUBLISH",
            Self::ReindexToPreview => "REINDEX_TO_PREVIEW",
            Self::ReindexToPublish => "REINDEX_TO_PUBLISH",
        }
    }
}

impl std::fmt::Display for PluginType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for unrecognised plugin kind names
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown plugin type: {0}")]
pub struct UnknownPluginType(pub String);

impl FromStr for PluginType {
    type Err = UnknownPluginType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownPluginType(s.to_string()))
    }
}

/// Lifecycle status of a plugin execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PluginStatus {
    /// Waiting to be picked up
    InQueue,
    /// Currently running
    Running,
    /// Cleaning up after itself
    Cleaning,
    /// Waiting on an external resource
    Pending,
    /// Running the deleted-record detection phase
    IdentifyingDeletedRecords,
    /// Completed successfully
    Finished,
    /// Terminated with an error
    Failed,
    /// Cancelled, possibly before ever starting
    Cancelled,
}

impl PluginStatus {
    /// Check if status is failed or cancelled
    #[inline]
    #[must_use]
    pub fn is_failed_or_cancelled(self) -> bool {
        matches!(self, Self::Failed | Self::Cancelled)
    }
}

/// Status of the data produced by a plugin execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DataStatus {
    /// Data is live
    #[default]
    Normal,
    /// Data is superseded but kept
    Deprecated,
    /// Data has been flagged as deleted
    Deleted,
}

/// Declared-predecessor metadata as stored on the record
///
/// Both halves are kept independently so that records carrying only one of
/// them can be recognised as corrupt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PredecessorInfo {
    /// Kind of the predecessor execution
    #[serde(default)]
    pub plugin_type: Option<PluginType>,

    /// Start time of the predecessor execution
    #[serde(default)]
    pub started_date: Option<DateTime<Utc>>,
}

/// Interpretation of [`PredecessorInfo`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclaredPredecessor {
    /// No predecessor declared; lineage falls back to list position
    Absent,

    /// Complete declaration
    Present {
        /// Predecessor kind
        plugin_type: PluginType,
        /// Predecessor start time
        started_date: DateTime<Utc>,
    },

    /// Only one of kind and start time is present
    Partial,
}

impl PredecessorInfo {
    /// Create complete predecessor metadata
    #[inline]
    #[must_use]
    pub fn new(plugin_type: PluginType, started_date: DateTime<Utc>) -> Self {
        Self {
            plugin_type: Some(plugin_type),
            started_date: Some(started_date),
        }
    }

    /// Interpret the stored halves
    #[must_use]
    pub fn declared(&self) -> DeclaredPredecessor {
        match (self.plugin_type, self.started_date) {
            (None, None) => DeclaredPredecessor::Absent,
            (Some(plugin_type), Some(started_date)) => DeclaredPredecessor::Present {
                plugin_type,
                started_date,
            },
            _ => DeclaredPredecessor::Partial,
        }
    }
}

/// One plugin execution within a workflow execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginExecutionRecord {
    /// Unique identifier
    pub id: PluginId,

    /// Processing kind
    pub plugin_type: PluginType,

    /// Lifecycle status
    pub status: PluginStatus,

    /// Start time, absent if never started
    #[serde(default)]
    pub started_date: Option<DateTime<Utc>>,

    /// Completion time
    #[serde(default)]
    pub finished_date: Option<DateTime<Utc>>,

    /// Last update time
    #[serde(default)]
    pub updated_date: Option<DateTime<Utc>>,

    /// Status of produced data
    #[serde(default)]
    pub data_status: DataStatus,

    /// Number of records processed
    #[serde(default)]
    pub processed_records: u64,

    /// Declared predecessor, if any
    #[serde(default)]
    pub predecessor: PredecessorInfo,
}

impl PluginExecutionRecord {
    /// Create a queued, never-started record
    #[must_use]
    pub fn new(id: impl Into<PluginId>, plugin_type: PluginType) -> Self {
        Self {
            id: id.into(),
            plugin_type,
            status: PluginStatus::InQueue,
            started_date: None,
            finished_date: None,
            updated_date: None,
            data_status: DataStatus::Normal,
            processed_records: 0,
            predecessor: PredecessorInfo::default(),
        }
    }

    /// With status
    #[inline]
    #[must_use]
    pub fn with_status(mut self, status: PluginStatus) -> Self {
        self.status = status;
        self
    }

    /// With start time
    #[inline]
    #[must_use]
    pub fn started_at(mut self, started: DateTime<Utc>) -> Self {
        self.started_date = Some(started);
        self
    }

    /// With completion time
    #[inline]
    #[must_use]
    pub fn finished_at(mut self, finished: DateTime<Utc>) -> Self {
        self.finished_date = Some(finished);
        self
    }

    /// With data status
    #[inline]
    #[must_use]
    pub fn with_data_status(mut self, data_status: DataStatus) -> Self {
        self.data_status = data_status;
        self
    }

    /// With processed record count
    #[inline]
    #[must_use]
    pub fn with_processed_records(mut self, count: u64) -> Self {
        self.processed_records = count;
        self
    }

    /// Declare the predecessor by kind and start time
    #[inline]
    #[must_use]
    pub fn with_predecessor(mut self, plugin_type: PluginType, started: DateTime<Utc>) -> Self {
        self.predecessor = PredecessorInfo::new(plugin_type, started);
        self
    }

    /// With raw predecessor metadata
    #[inline]
    #[must_use]
    pub fn with_predecessor_info(mut self, info: PredecessorInfo) -> Self {
        self.predecessor = info;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2022, 1, 1, 0, minute, 0).unwrap()
    }

    #[test]
    fn root_kinds_do_not_require_predecessor() {
        for kind in PluginType::ALL {
            let root = kind.is_harvest() || kind.is_reindex() || kind.is_depublish();
            assert_eq!(kind.requires_predecessor(), !root, "{kind}");
        }
    }

    #[test]
    fn plugin_type_round_trips_through_wire_name() {
        for kind in PluginType::ALL {
            assert_eq!(kind.as_str().parse::<PluginType>().unwrap(), kind);
        }
        assert_eq!("link_checking".parse::<PluginType>().unwrap(), PluginType::LinkChecking);
        assert!("NOPE".parse::<PluginType>().is_err());
    }

    #[test]
    fn plugin_type_serde_matches_display() {
        let json = serde_json::to_string(&PluginType::ReindexToPublish).unwrap();
        assert_eq!(json, "\"REINDEX_TO_PUBLISH\"");
    }

    #[test]
    fn declared_predecessor_variants() {
        assert_eq!(PredecessorInfo::default().declared(), DeclaredPredecessor::Absent);

        let full = PredecessorInfo::new(PluginType::Enrichment, t(3));
        assert!(matches!(full.declared(), DeclaredPredecessor::Present { .. }));

        let half = PredecessorInfo {
            plugin_type: Some(PluginType::Enrichment),
            started_date: None,
        };
        assert_eq!(half.declared(), DeclaredPredecessor::Partial);

        let other_half = PredecessorInfo {
            plugin_type: None,
            started_date: Some(t(3)),
        };
        assert_eq!(other_half.declared(), DeclaredPredecessor::Partial);
    }

    #[test]
    fn record_builder_defaults() {
        let record = PluginExecutionRecord::new("p", PluginType::Preview);
        assert_eq!(record.status, PluginStatus::InQueue);
        assert_eq!(record.data_status, DataStatus::Normal);
        assert!(record.started_date.is_none());

        let record = record
            .with_status(PluginStatus::Failed)
            .started_at(t(1))
            .with_processed_records(12);
        assert_eq!(record.status, PluginStatus::Failed);
        assert_eq!(record.started_date, Some(t(1)));
        assert_eq!(record.processed_records, 12);
    }

    #[test]
    fn record_deserializes_with_defaults() {
        let json = r#"{"id":"p1","plugin_type":"PUBLISH","status":"FINISHED"}"#;
        let record: PluginExecutionRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.plugin_type, PluginType::Publish);
        assert_eq!(record.data_status, DataStatus::Normal);
        assert_eq!(record.predecessor.declared(), DeclaredPredecessor::Absent);
    }

    #[test]
    fn status_classification() {
        assert!(PluginStatus::Cancelled.is_failed_or_cancelled());
        assert!(!PluginStatus::Finished.is_failed_or_cancelled());
        assert!(PluginStatus::Failed.is_failed_or_cancelled());
        assert!(!PluginStatus::Running.is_failed_or_cancelled());
    }
}
