//! Plan data models
//!
//! These models represent the operator tree handed over by the external plan
//! parser, plus the derived records this engine hands back to the rendering
//! layer. Everything is serializable: the raw tree arrives as JSON and the
//! derived metrics go back out as JSON.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use super::props;

// ============================================================================
// Raw plan tree (parser output, read-only here)
// ============================================================================

/// One operator in a query execution plan tree.
///
/// Properties are a loose bag: fields differ across engines, plan-format
/// versions, and EXPLAIN options, so every accessor returns `Option` and
/// absence is never coerced to zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanNode {
    /// Stable identifier assigned at parse time, unique within a tree.
    pub node_id: u32,

    #[serde(default)]
    pub props: HashMap<String, Value>,

    /// Sub-plans; ownership is strictly tree-shaped.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<PlanNode>,

    /// Parallel worker records. `None` means the plan carries no worker
    /// telemetry, which is different from an empty list (zero launched).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workers: Option<Vec<Worker>>,
}

impl PlanNode {
    /// Numeric property lookup, tolerating numbers serialized as strings.
    pub fn num(&self, key: &str) -> Option<f64> {
        value_as_f64(self.props.get(key)?)
    }

    /// Integer property lookup; fractional values are truncated.
    pub fn uint(&self, key: &str) -> Option<u64> {
        let n = self.num(key)?;
        if n < 0.0 { None } else { Some(n as u64) }
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        self.props.get(key)?.as_str()
    }

    /// Total rows produced across all loops, when measured.
    pub fn total_rows(&self) -> Option<f64> {
        let rows = self.num(props::keys::ACTUAL_ROWS)?;
        let loops = self.num(props::keys::ACTUAL_LOOPS).unwrap_or(1.0).max(1.0);
        Some(rows * loops)
    }
}

/// A parallel execution participant contributing partial counters to a node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Worker {
    pub worker_number: i32,
    #[serde(default)]
    pub props: HashMap<String, Value>,
}

impl Worker {
    pub fn num(&self, key: &str) -> Option<f64> {
        value_as_f64(self.props.get(key)?)
    }
}

fn value_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', "").parse().ok(),
        _ => None,
    }
}

// ============================================================================
// Plan-wide statistics
// ============================================================================

/// Plan-wide maxima and timing, established by one aggregator pass before
/// any per-node calculation runs. Maxima are never smaller than any
/// individual node's corresponding value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlanStats {
    /// Largest exclusive duration of any node, in ms.
    pub max_duration: f64,
    /// Largest total row count produced by any node.
    pub max_rows: f64,
    /// Largest total cost of any node.
    pub max_total_cost: f64,
    /// Whole-plan execution time in ms. Falls back to the root node's total
    /// time; `None` means the plan carries no execution telemetry at all.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_time: Option<f64>,
}

/// A fully loaded plan: root operator plus precomputed plan-wide stats.
///
/// Built once when a plan is submitted or loaded and treated as read-only by
/// every consumer; a reload replaces the whole tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanTree {
    pub root: PlanNode,
    pub stats: PlanStats,
}

impl PlanTree {
    /// Build a tree, deriving plan-wide stats with the aggregator.
    ///
    /// `execution_time` is the plan-level wall time when the source reported
    /// one; otherwise the root node's total time is used.
    pub fn new(root: PlanNode, execution_time: Option<f64>) -> Self {
        let stats = super::aggregator::aggregate_stats(&root, execution_time);
        Self { root, stats }
    }

    /// Adopt stats precomputed by the parser without re-deriving them.
    pub fn from_parts(root: PlanNode, stats: PlanStats) -> Self {
        Self { root, stats }
    }
}

// ============================================================================
// Derived metrics (calculator output)
// ============================================================================

/// Direction of a row-count estimation error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EstimateDirection {
    #[default]
    None,
    Over,
    Under,
}

/// Per-node derived numbers computed from one node plus plan-wide stats.
///
/// `None` always means "not measured", never zero; downstream consumers
/// render undefined metrics as tier none / omitted bar / blank text.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DerivedMetrics {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_percent: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_percent: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows_removed: Option<u64>,
    /// Floored percentage; the severity classifier's input.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows_removed_percent: Option<u32>,
    /// Exact percentage, kept so the display boundaries (`"<1"` / `">99"`)
    /// can distinguish a true 99% from 99.9999%.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows_removed_ratio: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimation_factor: Option<f64>,
    #[serde(default)]
    pub estimation_direction: EstimateDirection,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heap_fetch_percent: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workers_planned: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workers_launched: Option<u32>,
    pub all_workers_launched: bool,
    /// Present in the plan but never run (short-circuited branch). Only
    /// meaningful when the plan has execution telemetry.
    pub never_executed: bool,
    /// Per-loop values reported by the source are averages when true; the
    /// detail view prefixes them with [`DerivedMetrics::approx_prefix`].
    pub has_several_loops: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buffers: Option<BufferSummary>,
}

impl DerivedMetrics {
    /// Display form of the rows-removed ratio.
    ///
    /// The boundary values are re-expressed so the UI never claims a
    /// perfect 0% or 100% filter: a floor of `0` renders `"<1"` and a true
    /// ratio above 99% renders `">99"`.
    pub fn rows_removed_display(&self) -> Option<String> {
        let floored = self.rows_removed_percent?;
        if floored == 0 {
            return Some("<1".to_string());
        }
        let ratio = self.rows_removed_ratio.unwrap_or(f64::from(floored));
        if ratio > 99.0 {
            return Some(">99".to_string());
        }
        Some(floored.to_string())
    }

    /// Approximation marker for per-loop averaged values.
    pub fn approx_prefix(&self) -> &'static str {
        if self.has_several_loops { "~" } else { "" }
    }
}

/// Buffer counters summed over the node's own properties and its worker
/// records, in 8 KiB blocks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BufferSummary {
    pub shared_hit: u64,
    pub shared_read: u64,
    pub shared_dirtied: u64,
    pub shared_written: u64,
    pub local_hit: u64,
    pub local_read: u64,
    pub local_dirtied: u64,
    pub local_written: u64,
    pub temp_read: u64,
    pub temp_written: u64,
}

impl BufferSummary {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

// ============================================================================
// Severity and highlight enumerations
// ============================================================================

/// Discrete severity classification derived from a continuous metric.
///
/// Ordered: `Critical > High > Medium > Low > None`. The built-in threshold
/// tables top out at `High`; `Critical` is reachable through custom tables.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    #[default]
    None,
    Low,
    Medium,
    High,
    Critical,
}

/// Metrics with an associated severity ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Duration,
    Cost,
    EstimationFactor,
    HeapFetches,
    RowsRemoved,
}

/// The currently selected metric used to size and label the visual bar on
/// each node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HighlightDimension {
    #[default]
    None,
    Duration,
    Rows,
    Cost,
}

/// Bar encoding for one node under the active highlight dimension.
///
/// `label: None` signals the node lacks the relevant raw metric and the
/// caller omits the bar; it is not an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Highlight {
    /// Bar fill, clamped to `0..=100`.
    pub bar_fraction: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

// ============================================================================
// Plan overview
// ============================================================================

/// Top time-consuming node for quick performance overview.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopNode {
    pub rank: u32,
    pub node_id: u32,
    pub operator_name: String,
    pub duration_percent: u32,
    pub is_most_consuming: bool,
    pub is_second_most_consuming: bool,
}

/// Per-node report bundled for the rendering layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeReport {
    pub node_id: u32,
    pub metrics: DerivedMetrics,
    pub duration_tier: Tier,
    pub cost_tier: Tier,
    pub estimation_tier: Tier,
    pub heap_fetch_tier: Tier,
    pub rows_removed_tier: Tier,
}

/// Complete analysis of one plan tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanAnalysis {
    pub stats: PlanStats,
    /// Reports keyed by `node_id`.
    pub reports: HashMap<u32, NodeReport>,
    pub top_nodes: Vec<TopNode>,
}

// ============================================================================
// Constants
// ============================================================================

pub mod constants {
    /// Time thresholds for the plan overview flags.
    pub mod time_thresholds {
        /// Threshold for the "most consuming" node (> 30%).
        pub const MOST_CONSUMING_THRESHOLD: u32 = 30;
        /// Threshold for the "second most consuming" node (> 15%).
        pub const SECOND_CONSUMING_THRESHOLD: u32 = 15;
    }

    /// Size of one buffer block in bytes.
    pub const BLOCK_SIZE: u64 = 8192;
}
