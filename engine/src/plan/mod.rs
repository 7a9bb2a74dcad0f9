//! Plan Node Metrics & Visual-Encoding Engine
//!
//! Derives the numbers behind an interactive query-plan diagram: normalized
//! percentages, severity tiers, and bar/label encodings per operator node,
//! tolerant of the heterogeneous, optional fields found across plan-format
//! variants.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                       analyze_plan()                       │
//! │                            │                               │
//! │      ┌─────────────────────┼─────────────────────┐         │
//! │      ▼                     ▼                     ▼         │
//! │ ┌──────────┐        ┌────────────┐        ┌───────────┐    │
//! │ │Aggregator│──stats→│  Metrics   │──────→ │ Severity  │    │
//! │ │(one pass)│        │ Calculator │        │Classifier │    │
//! │ └──────────┘        └────────────┘        └───────────┘    │
//! │      │                     │                               │
//! │      ▼                     ▼                               │
//! │ ┌──────────┐        ┌────────────┐                         │
//! │ │ Highlight│        │ Formatter  │                         │
//! │ │ Encoder  │        │ (display)  │                         │
//! │ └──────────┘        └────────────┘                         │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! The aggregator runs once per loaded plan and establishes plan-wide
//! maxima; every per-node computation is a pure function over those stats
//! and the immutable tree. Recomputation is caller-driven: pass the current
//! highlight dimension explicitly, there are no ambient subscriptions.
//!
//! # Usage
//!
//! ```ignore
//! use planview_engine::plan::{analyze_plan, PlanTree};
//!
//! let root = serde_json::from_str(parser_output)?;
//! let tree = PlanTree::new(root, execution_time);
//! let analysis = analyze_plan(&tree);
//!
//! for report in analysis.reports.values() {
//!     println!("node {}: {:?}", report.node_id, report.duration_tier);
//! }
//! ```

pub mod aggregator;
pub mod formatter;
pub mod highlight;
pub mod metrics;
pub mod models;
pub mod props;
pub mod severity;


pub use aggregator::{aggregate_stats, top_nodes};
pub use formatter::{EMPTY_MARKER, format, ordered_key_set};
pub use highlight::encode_highlight;
pub use metrics::get_derived_metrics;
pub use models::*;
pub use severity::{classify, classify_value};

use std::collections::HashMap;

/// Number of entries in the plan overview ranking.
const TOP_NODE_LIMIT: usize = 5;

/// Analyze a whole plan tree and return per-node reports plus the overview.
///
/// Convenience over the individual entry points for callers that render
/// every node at once; per-node consumers can call [`get_derived_metrics`],
/// [`classify`], and [`encode_highlight`] directly.
pub fn analyze_plan(tree: &PlanTree) -> PlanAnalysis {
    let mut reports = HashMap::new();
    collect_reports(&tree.root, tree, &mut reports);

    tracing::debug!(nodes = reports.len(), "analyzed plan tree");

    PlanAnalysis {
        stats: tree.stats.clone(),
        reports,
        top_nodes: top_nodes(tree, TOP_NODE_LIMIT),
    }
}

fn collect_reports(node: &PlanNode, tree: &PlanTree, out: &mut HashMap<u32, NodeReport>) {
    let derived = get_derived_metrics(node, tree);
    let report = NodeReport {
        node_id: node.node_id,
        duration_tier: classify(Metric::Duration, &derived),
        cost_tier: classify(Metric::Cost, &derived),
        estimation_tier: classify(Metric::EstimationFactor, &derived),
        heap_fetch_tier: classify(Metric::HeapFetches, &derived),
        rows_removed_tier: classify(Metric::RowsRemoved, &derived),
        metrics: derived,
    };
    out.insert(node.node_id, report);

    for child in &node.children {
        collect_reports(child, tree, out);
    }
}
