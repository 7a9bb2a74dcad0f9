//! Plan-wide aggregation
//!
//! One bottom-up pass over the whole tree establishes the maxima every
//! per-node percentage is normalized against. The pass is standalone: it
//! operates on a plain tree and has no coupling to any rendering lifecycle.

use super::models::constants::time_thresholds;
use super::models::{PlanNode, PlanStats, PlanTree, TopNode};
use super::props::keys;

/// Compute plan-wide stats for a tree.
///
/// `execution_time` is the plan-level wall time when the source reported
/// one; otherwise the root node's own total time is used. A plan with
/// neither is in plan-only mode and keeps `execution_time = None`.
pub fn aggregate_stats(root: &PlanNode, execution_time: Option<f64>) -> PlanStats {
    let mut stats = PlanStats {
        execution_time: execution_time.or_else(|| root.num(keys::ACTUAL_TOTAL_TIME)),
        ..PlanStats::default()
    };

    let mut node_count = 0usize;
    visit(root, &mut stats, &mut node_count);

    tracing::debug!(
        node_count,
        max_duration = stats.max_duration,
        max_rows = stats.max_rows,
        max_total_cost = stats.max_total_cost,
        execution_time = stats.execution_time,
        "aggregated plan-wide stats"
    );

    stats
}

fn visit(node: &PlanNode, stats: &mut PlanStats, node_count: &mut usize) {
    *node_count += 1;

    if let Some(duration) = node.num(keys::EXCLUSIVE_DURATION) {
        stats.max_duration = stats.max_duration.max(duration);
    }
    if let Some(rows) = node.total_rows() {
        stats.max_rows = stats.max_rows.max(rows);
    }
    if let Some(cost) = node.num(keys::TOTAL_COST) {
        stats.max_total_cost = stats.max_total_cost.max(cost);
    }

    for child in &node.children {
        visit(child, stats, node_count);
    }
}

/// Rank nodes by duration percentage for the plan overview.
///
/// Flags the most-consuming (> 30%) and second-most-consuming (> 15%) nodes.
/// Plans without execution telemetry produce an empty overview.
pub fn top_nodes(tree: &PlanTree, limit: usize) -> Vec<TopNode> {
    let mut ranked: Vec<(u32, String, u32)> = Vec::new();
    collect_durations(&tree.root, tree, &mut ranked);

    ranked.sort_by(|a, b| b.2.cmp(&a.2).then(a.0.cmp(&b.0)));
    ranked.truncate(limit);

    ranked
        .into_iter()
        .enumerate()
        .map(|(i, (node_id, operator_name, duration_percent))| TopNode {
            rank: i as u32 + 1,
            node_id,
            operator_name,
            duration_percent,
            is_most_consuming: duration_percent > time_thresholds::MOST_CONSUMING_THRESHOLD,
            is_second_most_consuming: duration_percent
                > time_thresholds::SECOND_CONSUMING_THRESHOLD
                && duration_percent <= time_thresholds::MOST_CONSUMING_THRESHOLD,
        })
        .collect()
}

fn collect_durations(node: &PlanNode, tree: &PlanTree, out: &mut Vec<(u32, String, u32)>) {
    let metrics = super::metrics::get_derived_metrics(node, tree);
    if let Some(percent) = metrics.duration_percent {
        let name = node.text(keys::NODE_TYPE).unwrap_or("Unknown").to_string();
        out.push((node.node_id, name, percent));
    }
    for child in &node.children {
        collect_durations(child, tree, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::tests::support::node;
    use serde_json::json;

    #[test]
    fn maxima_cover_every_node() {
        let root = node(
            1,
            json!({
                "Node Type": "Sort",
                "Actual Total Time": 100.0,
                "Exclusive Duration": 20.0,
                "Actual Rows": 10, "Actual Loops": 1,
                "Total Cost": 500.0,
            }),
            vec![node(
                2,
                json!({
                    "Node Type": "Seq Scan",
                    "Exclusive Duration": 80.0,
                    "Actual Rows": 5000, "Actual Loops": 2,
                    "Total Cost": 480.0,
                }),
                vec![],
            )],
        );

        let stats = aggregate_stats(&root, None);
        assert_eq!(stats.max_duration, 80.0);
        assert_eq!(stats.max_rows, 10_000.0);
        assert_eq!(stats.max_total_cost, 500.0);
        // No plan-level execution time: falls back to the root total time.
        assert_eq!(stats.execution_time, Some(100.0));
    }

    #[test]
    fn plan_only_mode_has_no_execution_time() {
        let root = node(1, json!({"Node Type": "Result", "Total Cost": 1.0}), vec![]);
        let stats = aggregate_stats(&root, None);
        assert_eq!(stats.execution_time, None);
        assert_eq!(stats.max_duration, 0.0);
    }
}
