//! Proptest generators for dataset histories
//!
//! Histories are generated as abstract shapes first and then materialised,
//! so shrinking works on small integers rather than on records. Every
//! generated history builds into a forest without construction errors:
//! start times are unique, declared predecessors always point at an earlier
//! started execution, and lineage-starting kinds are always first in their
//! workflow execution.

use crate::ts;
use chrono::{DateTime, Duration, Utc};
use lineage_record::{
    DataStatus, ExecutionSnapshot, PluginExecutionRecord, PluginStatus, PluginType,
    WorkflowExecutionRecord,
};
use proptest::prelude::*;
use proptest::sample::Index;

const ROOT_KINDS: [PluginType; 5] = [
    PluginType::OaipmhHarvest,
    PluginType::HttpHarvest,
    PluginType::ReindexToPreview,
    PluginType::ReindexToPublish,
    PluginType::Depublish,
];

// Link checking is over-represented to exercise the leaf frontier.
const DERIVED_KINDS: [PluginType; 11] = [
    PluginType::ValidationExternal,
    PluginType::Transformation,
    PluginType::ValidationInternal,
    PluginType::Normalization,
    PluginType::Enrichment,
    PluginType::MediaProcess,
    PluginType::LinkChecking,
    PluginType::LinkChecking,
    PluginType::LinkChecking,
    PluginType::Preview,
    PluginType::Publish,
];

/// Abstract plugin execution
#[derive(Debug, Clone)]
pub struct PluginShape {
    pub kind: u8,
    pub status: u8,
    pub data: u8,
}

/// Abstract workflow execution
///
/// With an `anchor`, the first plugin is a derived kind declaring one of the
/// earlier started plugins as its predecessor; otherwise the execution starts
/// a new lineage.
#[derive(Debug, Clone)]
pub struct ExecutionShape {
    pub anchor: Option<Index>,
    pub root: u8,
    pub head: PluginShape,
    pub tail: Vec<PluginShape>,
}

pub fn arb_plugin_shape() -> impl Strategy<Value = PluginShape> {
    (any::<u8>(), 0u8..5, 0u8..8).prop_map(|(kind, status, data)| PluginShape { kind, status, data })
}

pub fn arb_execution_shape() -> impl Strategy<Value = ExecutionShape> {
    (
        proptest::option::of(any::<Index>()),
        any::<u8>(),
        arb_plugin_shape(),
        proptest::collection::vec(arb_plugin_shape(), 0..5),
    )
        .prop_map(|(anchor, root, head, tail)| ExecutionShape {
            anchor,
            root,
            head,
            tail,
        })
}

/// Random valid history of one dataset
pub fn arb_history(dataset: &'static str) -> impl Strategy<Value = Vec<WorkflowExecutionRecord>> {
    proptest::collection::vec(arb_execution_shape(), 1..6)
        .prop_map(move |shapes| history_from_shapes(dataset, &shapes))
}

/// Random valid snapshot of one to three datasets
pub fn arb_snapshot() -> impl Strategy<Value = ExecutionSnapshot> {
    proptest::collection::vec(proptest::collection::vec(arb_execution_shape(), 1..6), 1..4)
        .prop_map(|datasets| {
            datasets
                .iter()
                .enumerate()
                .flat_map(|(i, shapes)| history_from_shapes(&format!("ds{i}"), shapes))
                .collect()
        })
}

/// Materialise shapes into workflow executions
pub fn history_from_shapes(dataset: &str, shapes: &[ExecutionShape]) -> Vec<WorkflowExecutionRecord> {
    let mut clock = 0i64;
    let mut started: Vec<(PluginType, DateTime<Utc>)> = Vec::new();
    let mut executions = Vec::with_capacity(shapes.len());

    for (e, shape) in shapes.iter().enumerate() {
        clock += 1;
        let mut execution =
            WorkflowExecutionRecord::new(format!("{dataset}-e{e}"), dataset, ts(clock));

        let anchor = shape
            .anchor
            .filter(|_| !started.is_empty())
            .map(|index| started[index.index(started.len())]);
        let head_kind = if anchor.is_some() {
            DERIVED_KINDS[usize::from(shape.head.kind) % DERIVED_KINDS.len()]
        } else {
            ROOT_KINDS[usize::from(shape.root) % ROOT_KINDS.len()]
        };

        let mut kinds = vec![head_kind];
        kinds.extend(
            shape
                .tail
                .iter()
                .map(|p| DERIVED_KINDS[usize::from(p.kind) % DERIVED_KINDS.len()]),
        );

        for (position, (kind, plugin)) in kinds
            .into_iter()
            .zip(std::iter::once(&shape.head).chain(&shape.tail))
            .enumerate()
        {
            clock += 1;
            let mut record = materialise(format!("{dataset}-e{e}-p{position}"), kind, plugin, clock);
            if position == 0 {
                if let Some((predecessor_type, predecessor_started)) = anchor {
                    record = record.with_predecessor(predecessor_type, predecessor_started);
                }
            }
            if let Some(started_date) = record.started_date {
                started.push((kind, started_date));
            }
            execution.plugins.push(record);
        }
        executions.push(execution);
    }
    executions
}

fn materialise(id: String, kind: PluginType, shape: &PluginShape, minute: i64) -> PluginExecutionRecord {
    let status = match shape.status {
        0 | 1 => PluginStatus::Finished,
        2 => PluginStatus::Failed,
        3 => PluginStatus::Cancelled,
        _ => PluginStatus::Running,
    };
    let data_status = match shape.data {
        0 | 1 => DataStatus::Deleted,
        2 => DataStatus::Deprecated,
        _ => DataStatus::Normal,
    };
    let record = PluginExecutionRecord::new(id, kind)
        .with_status(status)
        .with_data_status(data_status)
        .with_processed_records(u64::from(shape.data) * 10);

    // Some cancellations happen before the plugin ever started
    if status == PluginStatus::Cancelled && shape.data % 2 == 0 {
        return record;
    }
    let started = ts(minute);
    match status {
        PluginStatus::Finished => record
            .started_at(started)
            .finished_at(started + Duration::seconds(30)),
        _ => record.started_at(started),
    }
}
