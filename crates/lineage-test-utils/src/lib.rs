//! Testing utilities for the lineage workspace
//!
//! Shared fixtures for the documented planning scenarios and proptest
//! generators for random, structurally valid dataset histories.

#![allow(missing_docs)]

mod generators;

pub use generators::{
    arb_execution_shape, arb_history, arb_plugin_shape, arb_snapshot, history_from_shapes,
    ExecutionShape, PluginShape,
};

use chrono::{DateTime, Duration, TimeZone, Utc};
use lineage_record::{
    DataStatus, ExecutionSnapshot, PluginExecutionRecord, PluginStatus, PluginType,
    WorkflowExecutionRecord,
};

/// Fixed origin for all fixture timestamps
pub fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap()
}

/// `minutes` after [`epoch`]
pub fn ts(minutes: i64) -> DateTime<Utc> {
    epoch() + Duration::minutes(minutes)
}

pub fn finished(id: &str, kind: PluginType, minute: i64) -> PluginExecutionRecord {
    PluginExecutionRecord::new(id, kind)
        .with_status(PluginStatus::Finished)
        .started_at(ts(minute))
        .finished_at(ts(minute) + Duration::seconds(30))
        .with_processed_records(100)
}

pub fn failed(id: &str, kind: PluginType, minute: i64) -> PluginExecutionRecord {
    PluginExecutionRecord::new(id, kind)
        .with_status(PluginStatus::Failed)
        .started_at(ts(minute))
        .with_processed_records(10)
}

/// Cancelled while still queued, so it never started
pub fn cancelled_unstarted(id: &str, kind: PluginType) -> PluginExecutionRecord {
    PluginExecutionRecord::new(id, kind).with_status(PluginStatus::Cancelled)
}

pub fn deleted(record: PluginExecutionRecord) -> PluginExecutionRecord {
    record.with_data_status(DataStatus::Deleted)
}

pub fn execution(
    id: &str,
    dataset: &str,
    created_minute: i64,
    plugins: impl IntoIterator<Item = PluginExecutionRecord>,
) -> WorkflowExecutionRecord {
    WorkflowExecutionRecord::new(id, dataset, ts(created_minute)).with_plugins(plugins)
}

/// Dataset `X`: harvest, link check, failed preview
///
/// With `link_check_failed` the link check fails too, so it becomes
/// removable once the preview is gone.
pub fn scenario_a(link_check_failed: bool) -> Vec<WorkflowExecutionRecord> {
    let link_check = if link_check_failed {
        failed("x-lc", PluginType::LinkChecking, 1)
    } else {
        finished("x-lc", PluginType::LinkChecking, 1)
    };
    vec![execution(
        "x-e1",
        "X",
        0,
        [
            finished("x-h", PluginType::OaipmhHarvest, 0),
            link_check,
            failed("x-pv", PluginType::Preview, 2),
        ],
    )]
}

/// Cutoff used with [`scenario_b`]
pub fn scenario_b_cutoff() -> DateTime<Utc> {
    ts(10)
}

/// Dataset `Y`: two finished publications at minutes 1 and 5
pub fn scenario_b() -> Vec<WorkflowExecutionRecord> {
    vec![
        execution(
            "y-e1",
            "Y",
            0,
            [
                finished("y-h1", PluginType::HttpHarvest, 0),
                finished("y-pub1", PluginType::Publish, 1),
            ],
        ),
        execution(
            "y-e2",
            "Y",
            4,
            [
                finished("y-h2", PluginType::HttpHarvest, 4),
                finished("y-pub2", PluginType::Publish, 5),
            ],
        ),
    ]
}

/// Dataset `broken` with a dangling declared predecessor next to the
/// healthy dataset `X` of [`scenario_a`]
pub fn scenario_c() -> ExecutionSnapshot {
    let broken = execution(
        "b-e1",
        "broken",
        0,
        [
            finished("b-h", PluginType::HttpHarvest, 0),
            failed("b-t", PluginType::Transformation, 3)
                .with_predecessor(PluginType::HttpHarvest, ts(99)),
        ],
    );
    scenario_a(false).into_iter().chain([broken]).collect()
}
