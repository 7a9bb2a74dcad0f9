//! Severity classification
//!
//! Threshold ladders as data, not code: each metric owns an ordered table of
//! `(threshold, tier)` rungs checked with strictly-greater-than comparisons,
//! descending, first match wins. Undefined metrics classify [`Tier::None`];
//! a tier is never fabricated from missing telemetry.

use super::models::{DerivedMetrics, Metric, Tier};

/// One severity ladder: rungs ordered from highest threshold down.
pub type Ladder = &'static [(f64, Tier)];

/// Shared ladder for percentage metrics (duration, cost, heap fetches).
pub const PERCENT_LADDER: Ladder = &[
    (90.0, Tier::High),
    (40.0, Tier::Medium),
    (10.0, Tier::Low),
];

/// Estimation factor ladder; the factor is unbounded above.
pub const FACTOR_LADDER: Ladder = &[
    (1000.0, Tier::High),
    (100.0, Tier::Medium),
    (10.0, Tier::Low),
];

/// Rows-removed composite ladder over `rows_removed_percent x
/// duration_percent`. Multiplying the two percentages means heavy filtering
/// only flags when the node's duration share is also non-trivial.
pub const ROWS_REMOVED_LADDER: Ladder = &[
    (2000.0, Tier::High),
    (500.0, Tier::Medium),
];

/// Classify a raw value against a ladder.
pub fn classify_value(ladder: Ladder, value: f64) -> Tier {
    for &(threshold, tier) in ladder {
        if value > threshold {
            return tier;
        }
    }
    Tier::None
}

/// Classify one metric from a node's derived record.
pub fn classify(metric: Metric, derived: &DerivedMetrics) -> Tier {
    let value = match metric {
        Metric::Duration => derived.duration_percent.map(f64::from),
        Metric::Cost => derived.cost_percent.map(f64::from),
        Metric::EstimationFactor => derived.estimation_factor,
        Metric::HeapFetches => derived.heap_fetch_percent.map(f64::from),
        Metric::RowsRemoved => match (derived.rows_removed_percent, derived.duration_percent) {
            (Some(removed), Some(duration)) => Some(f64::from(removed) * f64::from(duration)),
            _ => None,
        },
    };

    match value {
        Some(v) => classify_value(ladder_for(metric), v),
        None => Tier::None,
    }
}

fn ladder_for(metric: Metric) -> Ladder {
    match metric {
        Metric::Duration | Metric::Cost | Metric::HeapFetches => PERCENT_LADDER,
        Metric::EstimationFactor => FACTOR_LADDER,
        Metric::RowsRemoved => ROWS_REMOVED_LADDER,
    }
}
