//! Iterative removal planning
//!
//! Removing a subtree can turn its parent into a removal candidate, so a
//! single pass does not find everything. The planner repeats forest
//! construction and identification, each time leaving out what earlier
//! passes scheduled, until a pass schedules nothing.

use crate::config::PlannerConfig;
use crate::entry::{FailedDataset, IterationSummary, PlanReport, RemovalEntry};
use crate::error::PlannerError;
use crate::repository::{fetch_snapshot, ExecutionRepository};
use lineage_discovery::{DiscoveryMode, IdentificationStrategy};
use lineage_forest::{BuildError, LineageForestBuilder};
use lineage_record::{DatasetId, ExecutionSnapshot, PluginId, WorkflowExecutionRecord};
use rayon::prelude::*;
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Planner state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlannerState {
    /// More passes needed
    Iterating,
    /// Last pass scheduled nothing
    Done,
}

/// Repeats identification over all datasets until a fixed point
///
/// All bookkeeping (removed ids, exhausted and failed datasets) lives on the
/// stack of a single run; nothing carries over between runs.
#[derive(Debug)]
pub struct IterativeRemovalPlanner {
    strategy: Box<dyn IdentificationStrategy>,
    mode: DiscoveryMode,
    parallel: bool,
}

impl IterativeRemovalPlanner {
    /// Create a sequential planner
    #[must_use]
    pub fn new(strategy: Box<dyn IdentificationStrategy>, mode: DiscoveryMode) -> Self {
        Self {
            strategy,
            mode,
            parallel: false,
        }
    }

    /// Create a planner from configuration
    #[must_use]
    pub fn from_config(config: &PlannerConfig) -> Self {
        Self::new(config.strategy.build(), config.mode).with_parallel(config.parallel)
    }

    /// Process datasets of one iteration in parallel
    #[inline]
    #[must_use]
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Active strategy
    #[inline]
    #[must_use]
    pub fn strategy(&self) -> &dyn IdentificationStrategy {
        self.strategy.as_ref()
    }

    /// Active discovery mode
    #[inline]
    #[must_use]
    pub fn mode(&self) -> DiscoveryMode {
        self.mode
    }

    /// Compute the actionable removal plan
    ///
    /// Entries are grouped by dataset in dataset order; within each removed
    /// subtree every descendant precedes its ancestors.
    ///
    /// # Errors
    /// Returns [`PlannerError::Repository`] if history cannot be fetched and
    /// [`PlannerError::Invariant`] if forest construction breaks an internal
    /// invariant.
    pub async fn plan<R>(&self, repository: &R) -> Result<Vec<RemovalEntry>, PlannerError>
    where
        R: ExecutionRepository + ?Sized,
    {
        Ok(self.plan_report(repository).await?.first_batch)
    }

    /// Like [`plan`](Self::plan), with per-iteration totals and failures
    ///
    /// # Errors
    /// Same as [`plan`](Self::plan).
    pub async fn plan_report<R>(&self, repository: &R) -> Result<PlanReport, PlannerError>
    where
        R: ExecutionRepository + ?Sized,
    {
        let snapshot = fetch_snapshot(repository).await?;
        self.plan_snapshot(&snapshot)
    }

    /// Run all iterations over a fetched snapshot
    ///
    /// # Errors
    /// Returns [`PlannerError::Invariant`] if forest construction breaks an
    /// internal invariant.
    pub fn plan_snapshot(&self, snapshot: &ExecutionSnapshot) -> Result<PlanReport, PlannerError> {
        let mut report = PlanReport::default();
        let mut removed: HashSet<PluginId> = HashSet::new();
        let mut exhausted: HashSet<&DatasetId> = HashSet::new();
        let mut failed: HashSet<&DatasetId> = HashSet::new();
        let mut state = PlannerState::Iterating;
        let mut iteration = 0;

        info!(
            strategy = self.strategy.name(),
            mode = %self.mode,
            datasets = snapshot.len(),
            parallel = self.parallel,
            "planning removals"
        );

        while state == PlannerState::Iterating {
            iteration += 1;
            let active: Vec<(&DatasetId, &[WorkflowExecutionRecord])> = snapshot
                .iter()
                .filter(|(id, _)| !exhausted.contains(id) && !failed.contains(id))
                .collect();

            let outcomes = self.run_iteration(&active, &removed);

            let mut batch = Vec::new();
            for (dataset_id, outcome) in outcomes {
                match outcome {
                    Ok(entries) if entries.is_empty() => {
                        debug!(%dataset_id, iteration, "dataset exhausted");
                        exhausted.insert(dataset_id);
                    }
                    Ok(entries) => {
                        debug!(%dataset_id, iteration, removals = entries.len(), "dataset candidates");
                        batch.extend(entries);
                    }
                    Err(BuildError::Construction(error)) => {
                        warn!(
                            %dataset_id,
                            iteration,
                            plugin_id = %error.plugin_id(),
                            %error,
                            "skipping dataset with inconsistent history"
                        );
                        failed.insert(dataset_id);
                        report
                            .failed_datasets
                            .push(FailedDataset::new(dataset_id.clone(), iteration, error));
                    }
                    Err(BuildError::Invariant(source)) => {
                        return Err(PlannerError::Invariant {
                            dataset_id: dataset_id.clone(),
                            source,
                        });
                    }
                }
            }

            if batch.is_empty() {
                info!(iteration, "no further removals");
                state = PlannerState::Done;
                continue;
            }

            let summary = IterationSummary::new(iteration, active.len(), &batch);
            info!(
                iteration,
                datasets = summary.datasets_processed,
                removals = summary.removals,
                processed_records = summary.processed_records,
                "iteration complete"
            );
            report.iterations.push(summary);
            removed.extend(batch.iter().map(|entry| entry.plugin_id.clone()));
            if iteration == 1 {
                report.first_batch = batch;
            }
        }

        info!(
            iterations = report.iterations.len(),
            total_removals = report.total_removals(),
            total_processed_records = report.total_processed_records(),
            failed_datasets = report.failed_datasets.len(),
            first_batch = report.first_batch.len(),
            "planning finished"
        );
        Ok(report)
    }

    /// Process every active dataset, results in dataset order
    fn run_iteration<'s>(
        &self,
        active: &[(&'s DatasetId, &'s [WorkflowExecutionRecord])],
        removed: &HashSet<PluginId>,
    ) -> Vec<(&'s DatasetId, Result<Vec<RemovalEntry>, BuildError>)> {
        let run = |&(dataset_id, executions): &(&'s DatasetId, &'s [WorkflowExecutionRecord])| {
            (dataset_id, self.run_dataset(dataset_id, executions, removed))
        };
        if self.parallel {
            active.par_iter().map(run).collect()
        } else {
            active.iter().map(run).collect()
        }
    }

    fn run_dataset(
        &self,
        dataset_id: &DatasetId,
        executions: &[WorkflowExecutionRecord],
        removed: &HashSet<PluginId>,
    ) -> Result<Vec<RemovalEntry>, BuildError> {
        let forest = LineageForestBuilder::new(dataset_id.clone())
            .ignoring(removed)
            .build(executions)?;
        let entries = self
            .strategy
            .identify(&forest, self.mode)
            .into_iter()
            .flat_map(|root| root.all_in_removal_order())
            .map(RemovalEntry::from_node)
            .collect();
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RepositoryError;
    use crate::repository::MockExecutionRepository;
    use lineage_discovery::{FailedOrCancelledStrategy, StrategySpec};
    use lineage_record::PluginType;
    use lineage_test_utils::{deleted, execution, failed, finished, scenario_a, scenario_c};
    use pretty_assertions::assert_eq;
    use std::collections::BTreeSet;

    fn planner() -> IterativeRemovalPlanner {
        IterativeRemovalPlanner::new(
            Box::new(FailedOrCancelledStrategy::new()),
            DiscoveryMode::WithoutDescendants,
        )
    }

    fn plugin_ids(entries: &[RemovalEntry]) -> Vec<&str> {
        entries.iter().map(|entry| entry.plugin_id.as_str()).collect()
    }

    #[test]
    fn scenario_a_first_batch_is_preview() {
        let snapshot: ExecutionSnapshot = scenario_a(true).into_iter().collect();
        let report = planner().plan_snapshot(&snapshot).unwrap();

        assert_eq!(plugin_ids(&report.first_batch), vec!["x-pv"]);
        assert_eq!(report.iterations.len(), 2);
        assert_eq!(report.iterations[1].removals, 1);
        assert_eq!(report.total_removals(), 2);
    }

    #[test]
    fn scenario_a_stops_after_one_iteration_when_link_check_finished() {
        let snapshot: ExecutionSnapshot = scenario_a(false).into_iter().collect();
        let report = planner().plan_snapshot(&snapshot).unwrap();

        assert_eq!(plugin_ids(&report.first_batch), vec!["x-pv"]);
        assert_eq!(report.iterations.len(), 1);
        assert_eq!(report.total_processed_records(), 10);
    }

    #[test]
    fn scenario_c_isolates_broken_dataset() {
        let report = planner().plan_snapshot(&scenario_c()).unwrap();

        assert_eq!(plugin_ids(&report.first_batch), vec!["x-pv"]);
        assert_eq!(report.failed_datasets.len(), 1);
        let failure = &report.failed_datasets[0];
        assert_eq!(failure.dataset_id.as_str(), "broken");
        assert_eq!(failure.iteration, 1);
        assert_eq!(failure.error().plugin_id().as_str(), "b-t");
        // Broken dataset is not retried in later iterations
        assert_eq!(report.iterations[0].datasets_processed, 2);
    }

    #[test]
    fn removal_entries_are_descendants_first() {
        let history = [execution(
            "e1",
            "d",
            0,
            [
                finished("h", PluginType::HttpHarvest, 0),
                failed("t", PluginType::Transformation, 1),
                failed("n", PluginType::Normalization, 2),
            ],
        )];
        let snapshot: ExecutionSnapshot = history.into_iter().collect();
        let planner = IterativeRemovalPlanner::new(
            Box::new(FailedOrCancelledStrategy::new()),
            DiscoveryMode::WithOnlyDeletedDescendants,
        );
        let report = planner.plan_snapshot(&snapshot).unwrap();

        // n is selected first; once gone, t has no descendants left
        assert_eq!(plugin_ids(&report.first_batch), vec!["n"]);
        assert_eq!(report.total_removals(), 2);
    }

    #[test]
    fn deleted_mode_plans_failed_run_above_flagged_data() {
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
        let snapshot: ExecutionSnapshot = history.into_iter().collect();
        let planner = IterativeRemovalPlanner::new(
            Box::new(FailedOrCancelledStrategy::new()),
            DiscoveryMode::WithOnlyDeletedDescendants,
        );
        let report = planner.plan_snapshot(&snapshot).unwrap();

        assert_eq!(plugin_ids(&report.first_batch), vec!["n", "t"]);
        assert_eq!(report.iterations.len(), 1);
    }

    #[test]
    fn parallel_run_matches_sequential() {
        let mut snapshot = scenario_c();
        for mut copy in scenario_a(true) {
            copy.dataset_id = "X2".into();
            for plugin in &mut copy.plugins {
                plugin.id = format!("{}-2", plugin.id).into();
            }
            snapshot.push(copy);
        }

        let sequential = planner().plan_snapshot(&snapshot).unwrap();
        let parallel = planner().with_parallel(true).plan_snapshot(&snapshot).unwrap();
        assert_eq!(sequential, parallel);
        assert_eq!(plugin_ids(&parallel.first_batch), vec!["x-pv", "x-pv-2"]);
    }

    #[test]
    fn empty_snapshot_is_done_immediately() {
        let report = planner().plan_snapshot(&ExecutionSnapshot::new()).unwrap();
        assert_eq!(report, PlanReport::default());
    }

    #[test]
    fn from_config_uses_configured_strategy() {
        let config = PlannerConfig::new()
            .with_strategy(StrategySpec::DatasetSpecific {
                dataset_id: "X".into(),
            })
            .with_parallel(true);
        let planner = IterativeRemovalPlanner::from_config(&config);
        assert_eq!(planner.strategy().name(), "DatasetSpecific");
        assert_eq!(planner.mode(), DiscoveryMode::WithoutDescendants);

        let snapshot: ExecutionSnapshot = scenario_a(false).into_iter().collect();
        let report = planner.plan_snapshot(&snapshot).unwrap();
        // Removes the whole dataset, one layer per iteration
        assert_eq!(report.total_removals(), 3);
    }

    #[tokio::test]
    async fn plan_reads_from_repository() {
        let mut repository = MockExecutionRepository::new();
        repository
            .expect_list_dataset_ids()
            .times(1)
            .returning(|| Ok(BTreeSet::from([DatasetId::from("X")])));
        repository
            .expect_list_workflow_executions()
            .times(1)
            .returning(|_| Ok(scenario_a(true)));

        let plan = planner().plan(&repository).await.unwrap();
        assert_eq!(plugin_ids(&plan), vec!["x-pv"]);
        assert_eq!(plan[0].execution_id.as_str(), "x-e1");
        assert_eq!(plan[0].plugin_type, PluginType::Preview);
    }

    #[tokio::test]
    async fn repository_failure_aborts_plan() {
        let mut repository = MockExecutionRepository::new();
        repository
            .expect_list_dataset_ids()
            .returning(|| Err(RepositoryError::Unavailable("timeout".into())));

        let err = planner().plan(&repository).await.unwrap_err();
        assert!(matches!(err, PlannerError::Repository(RepositoryError::Unavailable(_))));
    }
}
