//! Per-node metrics calculation
//!
//! The core of the engine: given one node plus the plan-wide stats
//! established by the aggregator, derive the normalized percentages and
//! flags that drive the visual encoding. Absent telemetry always yields an
//! undefined metric, never a zero; `0` means "measured and found to be
//! zero".

use super::models::{
    BufferSummary, DerivedMetrics, EstimateDirection, PlanNode, PlanTree, Worker,
};
use super::props::keys;

/// Compute the derived metrics for one node.
///
/// Pure and per-node independent: a defect in one node's data cannot
/// prevent computing any other node.
pub fn get_derived_metrics(node: &PlanNode, tree: &PlanTree) -> DerivedMetrics {
    let stats = &tree.stats;

    let duration_percent = node.num(keys::EXCLUSIVE_DURATION).and_then(|exclusive| {
        let execution_time = stats.execution_time?;
        ratio_percent(exclusive, execution_time).map(|p| p.round() as u32)
    });

    let cost_percent = node
        .num(keys::EXCLUSIVE_COST)
        .and_then(|exclusive| ratio_percent(exclusive, stats.max_total_cost))
        .map(|p| p.round() as u32);

    // At most one of the two removal keys exists per node.
    let rows_removed = node
        .uint(keys::ROWS_REMOVED_BY_FILTER)
        .or_else(|| node.uint(keys::ROWS_REMOVED_BY_JOIN_FILTER));

    let rows_removed_ratio = rows_removed.and_then(|removed| {
        let actual = node.uint(keys::ACTUAL_ROWS)?;
        let total = removed + actual;
        if total == 0 {
            return None;
        }
        Some((removed as f64 / total as f64) * 100.0)
    });
    // floor, not round: biases the ratio down so a very large filter never
    // reads as a perfect 100.
    let rows_removed_percent = rows_removed_ratio.map(|r| r.floor() as u32);

    let (estimation_factor, estimation_direction) = estimation(node);

    let heap_fetch_percent = node.uint(keys::HEAP_FETCHES).and_then(|fetches| {
        let produced = node.total_rows()? as u64;
        let total = fetches + produced;
        if total == 0 {
            return None;
        }
        Some(((fetches as f64 / total as f64) * 100.0).round() as u32)
    });

    let workers_planned = node.uint(keys::WORKERS_PLANNED).map(|n| n as u32);
    // The worker record list wins when present; plans from engines that only
    // report a launched count fall back to it. Absent both is undefined, not
    // zero: no worker telemetry is different from zero workers.
    let workers_launched = node
        .workers
        .as_ref()
        .map(|w| w.len() as u32)
        .or_else(|| node.uint(keys::WORKERS_LAUNCHED).map(|n| n as u32));
    let all_workers_launched = match workers_launched {
        None | Some(0) => true,
        Some(launched) => workers_planned == Some(launched),
    };

    let loops = node.num(keys::ACTUAL_LOOPS);
    let never_executed = stats.execution_time.is_some() && loops.unwrap_or(0.0) == 0.0;
    let has_several_loops = loops.is_some_and(|l| l > 1.0);

    DerivedMetrics {
        duration_percent,
        cost_percent,
        rows_removed,
        rows_removed_percent,
        rows_removed_ratio,
        estimation_factor,
        estimation_direction,
        heap_fetch_percent,
        workers_planned,
        workers_launched,
        all_workers_launched,
        never_executed,
        has_several_loops,
        buffers: buffer_summary(node),
    }
}

fn ratio_percent(value: f64, denominator: f64) -> Option<f64> {
    if denominator <= 0.0 {
        return None;
    }
    Some((value / denominator) * 100.0)
}

/// Estimation error between planned and actual row counts.
///
/// Actual rows are totalled across loops before comparing. A zero on either
/// side leaves the factor undefined rather than infinite; an infinite
/// factor would pin the severity ladder off a trivially empty node.
fn estimation(node: &PlanNode) -> (Option<f64>, EstimateDirection) {
    let (Some(planned), Some(actual)) = (node.num(keys::PLAN_ROWS), node.total_rows()) else {
        return (None, EstimateDirection::None);
    };
    if planned <= 0.0 || actual <= 0.0 {
        return (None, EstimateDirection::None);
    }
    if planned > actual {
        (Some(planned / actual), EstimateDirection::Over)
    } else if planned < actual {
        (Some(actual / planned), EstimateDirection::Under)
    } else {
        (Some(1.0), EstimateDirection::None)
    }
}

/// Sum buffer counters over the node's own properties and its worker
/// records. `None` when the node carries no buffer telemetry at all.
fn buffer_summary(node: &PlanNode) -> Option<BufferSummary> {
    const FIELDS: &[(&str, fn(&mut BufferSummary) -> &mut u64)] = &[
        (keys::SHARED_HIT_BLOCKS, |b| &mut b.shared_hit),
        (keys::SHARED_READ_BLOCKS, |b| &mut b.shared_read),
        (keys::SHARED_DIRTIED_BLOCKS, |b| &mut b.shared_dirtied),
        (keys::SHARED_WRITTEN_BLOCKS, |b| &mut b.shared_written),
        (keys::LOCAL_HIT_BLOCKS, |b| &mut b.local_hit),
        (keys::LOCAL_READ_BLOCKS, |b| &mut b.local_read),
        (keys::LOCAL_DIRTIED_BLOCKS, |b| &mut b.local_dirtied),
        (keys::LOCAL_WRITTEN_BLOCKS, |b| &mut b.local_written),
        (keys::TEMP_READ_BLOCKS, |b| &mut b.temp_read),
        (keys::TEMP_WRITTEN_BLOCKS, |b| &mut b.temp_written),
    ];

    let mut summary = BufferSummary::default();
    let mut present = false;

    for (key, field) in FIELDS {
        if let Some(blocks) = node.uint(key) {
            *field(&mut summary) += blocks;
            present = true;
        }
        for worker in node.workers.as_deref().unwrap_or(&[]) {
            if let Some(blocks) = worker_uint(worker, key) {
                *field(&mut summary) += blocks;
                present = true;
            }
        }
    }

    present.then_some(summary)
}

fn worker_uint(worker: &Worker, key: &str) -> Option<u64> {
    let n = worker.num(key)?;
    if n < 0.0 { None } else { Some(n as u64) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::tests::support::{leaf, node, tree_with_execution_time};
    use serde_json::json;

    #[test]
    fn duration_percent_undefined_without_exclusive_duration() {
        let tree = tree_with_execution_time(
            node(1, json!({"Node Type": "Result", "Actual Loops": 1}), vec![]),
            Some(100.0),
        );
        let m = get_derived_metrics(&tree.root, &tree);
        assert_eq!(m.duration_percent, None);
    }

    #[test]
    fn duration_percent_rounds_against_execution_time() {
        let tree = tree_with_execution_time(
            leaf(1, json!({"Exclusive Duration": 33.4, "Actual Loops": 1})),
            Some(100.0),
        );
        let m = get_derived_metrics(&tree.root, &tree);
        assert_eq!(m.duration_percent, Some(33));
    }

    #[test]
    fn rows_removed_prefers_whichever_key_exists() {
        let tree = tree_with_execution_time(
            leaf(
                1,
                json!({"Rows Removed by Join Filter": 40, "Actual Rows": 60, "Actual Loops": 1}),
            ),
            Some(10.0),
        );
        let m = get_derived_metrics(&tree.root, &tree);
        assert_eq!(m.rows_removed, Some(40));
        assert_eq!(m.rows_removed_percent, Some(40));
    }

    #[test]
    fn rows_removed_undefined_when_both_keys_absent() {
        let tree = tree_with_execution_time(
            leaf(1, json!({"Actual Rows": 60, "Actual Loops": 1})),
            Some(10.0),
        );
        let m = get_derived_metrics(&tree.root, &tree);
        assert_eq!(m.rows_removed, None);
        assert_eq!(m.rows_removed_percent, None);
    }

    #[test]
    fn estimation_factor_and_direction() {
        let tree = tree_with_execution_time(
            leaf(
                1,
                json!({"Plan Rows": 1000, "Actual Rows": 10, "Actual Loops": 1}),
            ),
            Some(10.0),
        );
        let m = get_derived_metrics(&tree.root, &tree);
        assert_eq!(m.estimation_factor, Some(100.0));
        assert_eq!(m.estimation_direction, EstimateDirection::Over);

        let tree = tree_with_execution_time(
            leaf(
                1,
                json!({"Plan Rows": 10, "Actual Rows": 500, "Actual Loops": 2}),
            ),
            Some(10.0),
        );
        let m = get_derived_metrics(&tree.root, &tree);
        // 500 rows/loop * 2 loops = 1000 total vs 10 planned
        assert_eq!(m.estimation_factor, Some(100.0));
        assert_eq!(m.estimation_direction, EstimateDirection::Under);
    }

    #[test]
    fn estimation_undefined_on_zero_rows() {
        let tree = tree_with_execution_time(
            leaf(
                1,
                json!({"Plan Rows": 100, "Actual Rows": 0, "Actual Loops": 1}),
            ),
            Some(10.0),
        );
        let m = get_derived_metrics(&tree.root, &tree);
        assert_eq!(m.estimation_factor, None);
        assert_eq!(m.estimation_direction, EstimateDirection::None);
    }

    #[test]
    fn never_executed_requires_execution_telemetry() {
        let with_time = tree_with_execution_time(
            leaf(1, json!({"Node Type": "Seq Scan"})),
            Some(25.0),
        );
        let m = get_derived_metrics(&with_time.root, &with_time);
        assert!(m.never_executed);

        let zero_loops = tree_with_execution_time(
            leaf(1, json!({"Node Type": "Seq Scan", "Actual Loops": 0})),
            Some(25.0),
        );
        let m = get_derived_metrics(&zero_loops.root, &zero_loops);
        assert!(m.never_executed);

        // Plan-only mode: no execution time anywhere, never-executed must
        // not fire.
        let plan_only = tree_with_execution_time(leaf(1, json!({"Node Type": "Seq Scan"})), None);
        let m = get_derived_metrics(&plan_only.root, &plan_only);
        assert!(!m.never_executed);
    }

    #[test]
    fn worker_list_length_wins_over_launched_property() {
        let mut n = leaf(
            1,
            json!({"Workers Planned": 4, "Workers Launched": 4, "Actual Loops": 1}),
        );
        n.workers = Some(
            (0..3)
                .map(|i| Worker {
                    worker_number: i,
                    props: Default::default(),
                })
                .collect(),
        );
        let tree = tree_with_execution_time(n, Some(10.0));
        let m = get_derived_metrics(&tree.root, &tree);
        assert_eq!(m.workers_planned, Some(4));
        assert_eq!(m.workers_launched, Some(3));
        assert!(!m.all_workers_launched);
    }

    #[test]
    fn missing_worker_telemetry_is_undefined_not_zero() {
        let tree = tree_with_execution_time(
            leaf(1, json!({"Workers Planned": 2, "Actual Loops": 1})),
            Some(10.0),
        );
        let m = get_derived_metrics(&tree.root, &tree);
        assert_eq!(m.workers_launched, None);
        assert!(m.all_workers_launched);
    }

    #[test]
    fn buffers_include_worker_fanout() {
        let mut n = leaf(
            1,
            json!({"Shared Hit Blocks": 100, "Shared Read Blocks": 10, "Actual Loops": 1}),
        );
        n.workers = Some(vec![
            Worker {
                worker_number: 0,
                props: serde_json::from_value(json!({"Shared Hit Blocks": 40})).unwrap(),
            },
            Worker {
                worker_number: 1,
                props: serde_json::from_value(json!({"Shared Hit Blocks": 60})).unwrap(),
            },
        ]);
        let tree = tree_with_execution_time(n, Some(10.0));
        let m = get_derived_metrics(&tree.root, &tree);
        let buffers = m.buffers.unwrap();
        assert_eq!(buffers.shared_hit, 200);
        assert_eq!(buffers.shared_read, 10);
    }

    #[test]
    fn no_buffer_telemetry_yields_none() {
        let tree = tree_with_execution_time(leaf(1, json!({"Actual Loops": 1})), Some(10.0));
        let m = get_derived_metrics(&tree.root, &tree);
        assert!(m.buffers.is_none());
    }
}
