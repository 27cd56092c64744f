use lineage_discovery::{DiscoveryMode, StrategySpec};
use lineage_forest::LineageForestBuilder;
use lineage_planner::{IterativeRemovalPlanner, PlannerConfig, RemovalEntry, SnapshotRepository};
use lineage_record::{ExecutionSnapshot, PluginId};
use lineage_test_utils::{arb_snapshot, scenario_b, scenario_b_cutoff, scenario_c, ts};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::collections::HashSet;

fn config(choice: u8) -> PlannerConfig {
    let mode = if choice % 2 == 0 {
        DiscoveryMode::WithoutDescendants
    } else {
        DiscoveryMode::WithOnlyDeletedDescendants
    };
    let strategy = match choice / 2 {
        0 => StrategySpec::FailedOrCancelled,
        1 => StrategySpec::MigrationCleanup {
            cutoff: ts(20),
            superseded_types: lineage_record::PluginType::ALL.to_vec(),
        },
        _ => StrategySpec::DatasetSpecific {
            dataset_id: "ds0".into(),
        },
    };
    PlannerConfig::new().with_strategy(strategy).with_mode(mode)
}

/// Snapshot with the given plugin executions deleted from history
fn without(snapshot: &ExecutionSnapshot, removed: &HashSet<PluginId>) -> ExecutionSnapshot {
    let mut remaining = ExecutionSnapshot::new();
    for (dataset_id, executions) in snapshot.iter() {
        remaining.insert_dataset(dataset_id.clone());
        for execution in executions {
            let mut execution = execution.clone();
            execution.plugins.retain(|plugin| !removed.contains(&plugin.id));
            remaining.push(execution);
        }
    }
    remaining
}

fn max_depth(snapshot: &ExecutionSnapshot) -> usize {
    snapshot
        .iter()
        .map(|(dataset_id, executions)| {
            LineageForestBuilder::new(dataset_id.clone())
                .build(executions)
                .unwrap()
                .max_depth()
        })
        .max()
        .unwrap_or(0)
}

fn ids(entries: &[RemovalEntry]) -> HashSet<PluginId> {
    entries.iter().map(|entry| entry.plugin_id.clone()).collect()
}

proptest! {
    #[test]
    fn prop_reapplication_converges_within_depth(snapshot in arb_snapshot(), choice in 0u8..6) {
        let planner = IterativeRemovalPlanner::from_config(&config(choice));
        let depth = max_depth(&snapshot);

        let mut current = snapshot;
        let mut previous: HashSet<PluginId> = HashSet::new();
        let mut rounds = 0;
        loop {
            let batch = planner.plan_snapshot(&current).unwrap().first_batch;
            if batch.is_empty() {
                break;
            }
            rounds += 1;
            prop_assert!(rounds <= depth, "{} rounds for depth {}", rounds, depth);

            let batch_ids = ids(&batch);
            prop_assert_eq!(batch_ids.len(), batch.len());
            prop_assert!(batch_ids.is_disjoint(&previous));
            current = without(&current, &batch_ids);
            previous = batch_ids;
        }
    }

    #[test]
    fn prop_iterations_bounded_and_disjoint(snapshot in arb_snapshot(), choice in 0u8..6) {
        let report = IterativeRemovalPlanner::from_config(&config(choice))
            .plan_snapshot(&snapshot)
            .unwrap();
        prop_assert!(report.iterations.len() <= max_depth(&snapshot));
        prop_assert!(report.failed_datasets.is_empty());
        if let Some(first) = report.iterations.first() {
            prop_assert_eq!(first.removals, report.first_batch.len());
        }
    }

    #[test]
    fn prop_first_batch_is_descendants_first(snapshot in arb_snapshot(), choice in 0u8..6) {
        let batch = IterativeRemovalPlanner::from_config(&config(choice))
            .plan_snapshot(&snapshot)
            .unwrap()
            .first_batch;

        for (dataset_id, executions) in snapshot.iter() {
            let forest = LineageForestBuilder::new(dataset_id.clone()).build(executions).unwrap();
            let nodes: Vec<_> = batch
                .iter()
                .filter(|entry| &entry.dataset_id == dataset_id)
                .map(|entry| forest.get(&entry.plugin_id).unwrap())
                .collect();
            for (i, earlier) in nodes.iter().enumerate() {
                for later in &nodes[i + 1..] {
                    prop_assert!(!earlier.is_ancestor_of(*later));
                }
            }
        }
    }

    #[test]
    fn prop_first_batch_holds_every_eligible_node(snapshot in arb_snapshot(), choice in 0u8..2) {
        let config = config(choice);
        let planned = ids(
            &IterativeRemovalPlanner::from_config(&config)
                .plan_snapshot(&snapshot)
                .unwrap()
                .first_batch,
        );

        for (dataset_id, executions) in snapshot.iter() {
            let forest = LineageForestBuilder::new(dataset_id.clone()).build(executions).unwrap();
            for node in forest.nodes() {
                if node.status().is_failed_or_cancelled() && config.mode.admits(node) {
                    prop_assert!(planned.contains(node.id()), "{} not planned under {}", node.id(), config.mode);
                }
            }
        }
    }

    #[test]
    fn prop_parallel_matches_sequential(snapshot in arb_snapshot(), choice in 0u8..6) {
        let config = config(choice);
        let sequential = IterativeRemovalPlanner::from_config(&config).plan_snapshot(&snapshot).unwrap();
        let parallel = IterativeRemovalPlanner::from_config(&config.with_parallel(true))
            .plan_snapshot(&snapshot)
            .unwrap();
        prop_assert_eq!(sequential, parallel);
    }
}

#[tokio::test]
async fn scenario_b_plan_from_snapshot_file() {
    let snapshot: ExecutionSnapshot = scenario_b().into_iter().collect();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("snapshot.json");
    std::fs::write(&path, snapshot.to_json().unwrap()).unwrap();

    let config = PlannerConfig::from_toml_str(&format!(
        "[strategy]\nkind = \"superseded\"\nplugin_type = \"PUBLISH\"\ncutoff = \"{}\"\n",
        scenario_b_cutoff().to_rfc3339()
    ))
    .unwrap();
    let repository = SnapshotRepository::load(&path).await.unwrap();
    let plan = IterativeRemovalPlanner::from_config(&config)
        .plan(&repository)
        .await
        .unwrap();

    let plugin_ids: Vec<_> = plan.iter().map(|entry| entry.plugin_id.as_str()).collect();
    assert_eq!(plugin_ids, vec!["y-pub1"]);
}

#[tokio::test]
async fn scenario_c_healthy_dataset_still_planned() {
    let repository = SnapshotRepository::new(scenario_c());
    let report = IterativeRemovalPlanner::from_config(&PlannerConfig::default())
        .plan_report(&repository)
        .await
        .unwrap();

    let plugin_ids: Vec<_> = report
        .first_batch
        .iter()
        .map(|entry| entry.plugin_id.as_str())
        .collect();
    assert_eq!(plugin_ids, vec!["x-pv"]);
    assert_eq!(report.failed_datasets.len(), 1);
    assert_eq!(report.failed_datasets[0].dataset_id.as_str(), "broken");
}
