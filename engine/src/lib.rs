//! planview-engine
//!
//! Rendering-side engine for a database query-plan viewer: per-node derived
//! metrics, threshold-based severity tiers, highlight-bar encodings, and
//! property-value formatting over an immutable operator tree.
//!
//! The engine neither parses plan text nor persists anything; it consumes a
//! fully-built [`plan::PlanTree`] from the external parser and exposes pure
//! functions to the rendering layer. No tracing subscriber is installed
//! here; the embedding application owns that.

pub mod plan;
pub mod utils;

pub use plan::{
    DerivedMetrics, Highlight, HighlightDimension, Metric, PlanAnalysis, PlanNode, PlanStats,
    PlanTree, Tier, Worker, analyze_plan, classify, encode_highlight, format,
    get_derived_metrics,
};
pub use utils::{FormatError, FormatResult};
