//! Highlight bar encoding
//!
//! Maps the selected highlight dimension to a bar-fill fraction and label
//! for one node. A node lacking the relevant raw metric yields no label and
//! the caller omits the bar; that is a signal, not an error.

use super::formatter;
use super::models::{Highlight, HighlightDimension, PlanNode, PlanStats};
use super::props::keys;

/// Encode the highlight bar for one node.
///
/// Fractions are computed against the same per-dimension plan-wide maxima
/// the calculator normalizes with, clamped to `0..=100` to stay defensive
/// against stale maxima, and guarded against zero maxima (fraction 0, never
/// NaN).
pub fn encode_highlight(
    dimension: HighlightDimension,
    node: &PlanNode,
    stats: &PlanStats,
) -> Highlight {
    let encoded = match dimension {
        HighlightDimension::None => None,
        HighlightDimension::Duration => node
            .num(keys::EXCLUSIVE_DURATION)
            .map(|v| (v, stats.max_duration, formatter::format_duration(v))),
        HighlightDimension::Rows => node
            .total_rows()
            .map(|v| (v, stats.max_rows, formatter::group_digits(v.round() as u64))),
        // Total cost, not exclusive: the bar ranks nodes by how expensive
        // their whole subtree is, and the costliest node fills the bar.
        HighlightDimension::Cost => node
            .num(keys::TOTAL_COST)
            .map(|v| (v, stats.max_total_cost, formatter::format_cost(v))),
    };

    match encoded {
        Some((value, max, label)) => Highlight {
            bar_fraction: fraction(value, max),
            label: Some(label),
        },
        None => Highlight {
            bar_fraction: 0.0,
            label: None,
        },
    }
}

fn fraction(value: f64, max: f64) -> f64 {
    if max <= 0.0 {
        return 0.0;
    }
    ((value / max) * 100.0).clamp(0.0, 100.0)
}
