//! Human-readable output

use lineage_discovery::StrategyInfo;
use lineage_planner::{PlanReport, PlannerConfig};
use std::io::{self, Write};

/// Print the plan as a tab-separated table followed by run totals
pub(crate) fn write_text<W: Write>(
    out: &mut W,
    config: &PlannerConfig,
    report: &PlanReport,
) -> io::Result<()> {
    writeln!(
        out,
        "# strategy: {}, mode: {}",
        config.strategy.kind(),
        config.mode
    )?;
    writeln!(out, "dataset\texecution\tplugin\ttype\tprocessed_records\tstarted")?;
    for entry in &report.first_batch {
        let started = entry
            .started_date
            .map_or_else(|| "-".to_string(), |date| date.to_rfc3339());
        writeln!(
            out,
            "{}\t{}\t{}\t{}\t{}\t{}",
            entry.dataset_id,
            entry.execution_id,
            entry.plugin_id,
            entry.plugin_type,
            entry.processed_records,
            started
        )?;
    }

    writeln!(out)?;
    for summary in &report.iterations {
        writeln!(
            out,
            "# iteration {}: {} removals, {} records, {} datasets",
            summary.iteration, summary.removals, summary.processed_records, summary.datasets_processed
        )?;
    }
    writeln!(
        out,
        "# total: {} removals, {} records over {} iterations",
        report.total_removals(),
        report.total_processed_records(),
        report.iterations.len()
    )?;
    for failure in &report.failed_datasets {
        writeln!(out, "# skipped dataset {}: {}", failure.dataset_id, failure.reason)?;
    }
    Ok(())
}

/// Print the built-in strategy kinds
pub(crate) fn write_strategies<W: Write>(out: &mut W, strategies: &[StrategyInfo]) -> io::Result<()> {
    for info in strategies {
        if info.parameters.is_empty() {
            writeln!(out, "{:<22}{}", info.kind, info.summary)?;
        } else {
            writeln!(out, "{:<22}{} [{}]", info.kind, info.summary, info.parameters)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lineage_discovery::BUILTIN_STRATEGIES;
    use lineage_planner::IterativeRemovalPlanner;
    use lineage_test_utils::scenario_c;

    fn render(report: &PlanReport) -> String {
        let mut buffer = Vec::new();
        write_text(&mut buffer, &PlannerConfig::default(), report).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn text_output_lists_plan_and_failures() {
        let report = IterativeRemovalPlanner::from_config(&PlannerConfig::default())
            .plan_snapshot(&scenario_c())
            .unwrap();
        let text = render(&report);

        assert!(text.starts_with("# strategy: failed_or_cancelled, mode: without_descendants\n"));
        assert!(text.contains("X\tx-e1\tx-pv\tPREVIEW\t10\t"));
        assert!(text.contains("# iteration 1: 1 removals, 10 records, 2 datasets"));
        assert!(text.contains("# skipped dataset broken:"));
    }

    #[test]
    fn strategies_listing_names_every_kind() {
        let mut buffer = Vec::new();
        write_strategies(&mut buffer, &BUILTIN_STRATEGIES).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        for info in BUILTIN_STRATEGIES {
            assert!(text.contains(info.kind));
        }
        assert_eq!(text.lines().count(), BUILTIN_STRATEGIES.len());
    }
}
