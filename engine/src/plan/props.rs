//! Node property model
//!
//! The closed set of recognized plan-node property keys and their display
//! types. Raw nodes arrive as loose property bags; every key the calculator
//! or formatter touches resolves through [`type_of`], and anything outside
//! the known set degrades to [`PropertyType::Text`] so partial or
//! engine-specific plans never fail to render.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Well-known property keys, as emitted by the upstream plan parser.
pub mod keys {
    pub const NODE_TYPE: &str = "Node Type";
    pub const RELATION_NAME: &str = "Relation Name";
    pub const SCHEMA: &str = "Schema";
    pub const ALIAS: &str = "Alias";
    pub const INDEX_NAME: &str = "Index Name";
    pub const STRATEGY: &str = "Strategy";
    pub const JOIN_TYPE: &str = "Join Type";
    pub const PARENT_RELATIONSHIP: &str = "Parent Relationship";

    // Timing
    pub const ACTUAL_STARTUP_TIME: &str = "Actual Startup Time";
    pub const ACTUAL_TOTAL_TIME: &str = "Actual Total Time";
    pub const EXCLUSIVE_DURATION: &str = "Exclusive Duration";
    pub const EXECUTION_TIME: &str = "Execution Time";
    pub const PLANNING_TIME: &str = "Planning Time";
    pub const IO_READ_TIME: &str = "I/O Read Time";
    pub const IO_WRITE_TIME: &str = "I/O Write Time";

    // Cost estimates
    pub const STARTUP_COST: &str = "Startup Cost";
    pub const TOTAL_COST: &str = "Total Cost";
    pub const EXCLUSIVE_COST: &str = "Exclusive Cost";

    // Row counts
    pub const PLAN_ROWS: &str = "Plan Rows";
    pub const ACTUAL_ROWS: &str = "Actual Rows";
    pub const ACTUAL_LOOPS: &str = "Actual Loops";
    pub const ROWS_REMOVED_BY_FILTER: &str = "Rows Removed by Filter";
    pub const ROWS_REMOVED_BY_JOIN_FILTER: &str = "Rows Removed by Join Filter";
    pub const ROWS_REMOVED_BY_INDEX_RECHECK: &str = "Rows Removed by Index Recheck";
    pub const HEAP_FETCHES: &str = "Heap Fetches";

    // Parallelism
    pub const WORKERS_PLANNED: &str = "Workers Planned";
    pub const WORKERS_LAUNCHED: &str = "Workers Launched";
    pub const WORKERS: &str = "Workers";
    pub const PARALLEL_AWARE: &str = "Parallel Aware";

    // Buffer counters (shared/local/temp), in 8 KiB blocks
    pub const SHARED_HIT_BLOCKS: &str = "Shared Hit Blocks";
    pub const SHARED_READ_BLOCKS: &str = "Shared Read Blocks";
    pub const SHARED_DIRTIED_BLOCKS: &str = "Shared Dirtied Blocks";
    pub const SHARED_WRITTEN_BLOCKS: &str = "Shared Written Blocks";
    pub const LOCAL_HIT_BLOCKS: &str = "Local Hit Blocks";
    pub const LOCAL_READ_BLOCKS: &str = "Local Read Blocks";
    pub const LOCAL_DIRTIED_BLOCKS: &str = "Local Dirtied Blocks";
    pub const LOCAL_WRITTEN_BLOCKS: &str = "Local Written Blocks";
    pub const TEMP_READ_BLOCKS: &str = "Temp Read Blocks";
    pub const TEMP_WRITTEN_BLOCKS: &str = "Temp Written Blocks";
    pub const EXACT_HEAP_BLOCKS: &str = "Exact Heap Blocks";
    pub const LOSSY_HEAP_BLOCKS: &str = "Lossy Heap Blocks";

    // Memory / spill (normalized to bytes by the parser)
    pub const SORT_SPACE_USED: &str = "Sort Space Used";
    pub const SORT_SPACE_TYPE: &str = "Sort Space Type";
    pub const SORT_METHOD: &str = "Sort Method";
    pub const PEAK_MEMORY_USAGE: &str = "Peak Memory Usage";

    // Predicates and key sets
    pub const FILTER: &str = "Filter";
    pub const JOIN_FILTER: &str = "Join Filter";
    pub const HASH_CONDITION: &str = "Hash Cond";
    pub const INDEX_CONDITION: &str = "Index Cond";
    pub const RECHECK_CONDITION: &str = "Recheck Cond";
    pub const GROUP_KEY: &str = "Group Key";
    pub const SORT_KEY: &str = "Sort Key";
    pub const PRESORTED_KEY: &str = "Presorted Key";
    pub const OUTPUT: &str = "Output";

    // Derived by the calculator, re-exposed for the detail view
    pub const ESTIMATION_FACTOR: &str = "Estimation Factor";
    pub const HEAP_FETCH_PERCENT: &str = "Heap Fetch Percent";
}

/// Display type tag for a property value.
///
/// The tag drives formatting and whether a zero or absent value is
/// meaningful: counters (rows, blocks, bytes, duration) display `0`, while
/// an absent boolean suppresses the row entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyType {
    Duration,
    Cost,
    Rows,
    Bytes,
    Factor,
    Percent,
    List,
    Keys,
    Blocks,
    Boolean,
    Text,
}

static PROPERTY_TYPES: Lazy<HashMap<&'static str, PropertyType>> = Lazy::new(|| {
    use PropertyType::*;
    let mut m = HashMap::new();

    m.insert(keys::ACTUAL_STARTUP_TIME, Duration);
    m.insert(keys::ACTUAL_TOTAL_TIME, Duration);
    m.insert(keys::EXCLUSIVE_DURATION, Duration);
    m.insert(keys::EXECUTION_TIME, Duration);
    m.insert(keys::PLANNING_TIME, Duration);
    m.insert(keys::IO_READ_TIME, Duration);
    m.insert(keys::IO_WRITE_TIME, Duration);

    m.insert(keys::STARTUP_COST, Cost);
    m.insert(keys::TOTAL_COST, Cost);
    m.insert(keys::EXCLUSIVE_COST, Cost);

    m.insert(keys::PLAN_ROWS, Rows);
    m.insert(keys::ACTUAL_ROWS, Rows);
    m.insert(keys::ACTUAL_LOOPS, Rows);
    m.insert(keys::ROWS_REMOVED_BY_FILTER, Rows);
    m.insert(keys::ROWS_REMOVED_BY_JOIN_FILTER, Rows);
    m.insert(keys::ROWS_REMOVED_BY_INDEX_RECHECK, Rows);
    m.insert(keys::HEAP_FETCHES, Rows);
    m.insert(keys::WORKERS_PLANNED, Rows);
    m.insert(keys::WORKERS_LAUNCHED, Rows);

    m.insert(keys::SHARED_HIT_BLOCKS, Blocks);
    m.insert(keys::SHARED_READ_BLOCKS, Blocks);
    m.insert(keys::SHARED_DIRTIED_BLOCKS, Blocks);
    m.insert(keys::SHARED_WRITTEN_BLOCKS, Blocks);
    m.insert(keys::LOCAL_HIT_BLOCKS, Blocks);
    m.insert(keys::LOCAL_READ_BLOCKS, Blocks);
    m.insert(keys::LOCAL_DIRTIED_BLOCKS, Blocks);
    m.insert(keys::LOCAL_WRITTEN_BLOCKS, Blocks);
    m.insert(keys::TEMP_READ_BLOCKS, Blocks);
    m.insert(keys::TEMP_WRITTEN_BLOCKS, Blocks);
    m.insert(keys::EXACT_HEAP_BLOCKS, Blocks);
    m.insert(keys::LOSSY_HEAP_BLOCKS, Blocks);

    m.insert(keys::SORT_SPACE_USED, Bytes);
    m.insert(keys::PEAK_MEMORY_USAGE, Bytes);

    m.insert(keys::ESTIMATION_FACTOR, Factor);
    m.insert(keys::HEAP_FETCH_PERCENT, Percent);

    m.insert(keys::OUTPUT, List);
    m.insert(keys::GROUP_KEY, Keys);
    m.insert(keys::SORT_KEY, Keys);
    m.insert(keys::PRESORTED_KEY, Keys);

    m.insert(keys::PARALLEL_AWARE, Boolean);

    m.insert(keys::NODE_TYPE, Text);
    m.insert(keys::RELATION_NAME, Text);
    m.insert(keys::SCHEMA, Text);
    m.insert(keys::ALIAS, Text);
    m.insert(keys::INDEX_NAME, Text);
    m.insert(keys::STRATEGY, Text);
    m.insert(keys::JOIN_TYPE, Text);
    m.insert(keys::PARENT_RELATIONSHIP, Text);
    m.insert(keys::SORT_SPACE_TYPE, Text);
    m.insert(keys::SORT_METHOD, Text);
    m.insert(keys::FILTER, Text);
    m.insert(keys::JOIN_FILTER, Text);
    m.insert(keys::HASH_CONDITION, Text);
    m.insert(keys::INDEX_CONDITION, Text);
    m.insert(keys::RECHECK_CONDITION, Text);

    m
});

/// Resolve the display type of a property key.
///
/// Unknown keys resolve to [`PropertyType::Text`] and are displayed
/// verbatim; the model is exhaustive for everything the calculator reads.
pub fn type_of(key: &str) -> PropertyType {
    PROPERTY_TYPES
        .get(key)
        .copied()
        .unwrap_or(PropertyType::Text)
}

impl PropertyType {
    /// Whether a measured zero is meaningful for this type.
    ///
    /// Counters show `0` (a scan that removed zero rows is information);
    /// text-like and boolean properties suppress it.
    pub fn displays_zero(self) -> bool {
        matches!(
            self,
            PropertyType::Duration
                | PropertyType::Cost
                | PropertyType::Rows
                | PropertyType::Bytes
                | PropertyType::Blocks
                | PropertyType::Percent
        )
    }
}

/// Whether the detail view should render a row for this key/value pair.
///
/// Absent values are suppressed; zero values are kept only for counter
/// types (see [`PropertyType::displays_zero`]).
pub fn should_display(key: &str, value: Option<&serde_json::Value>) -> bool {
    let Some(value) = value else { return false };
    if value.is_null() {
        return false;
    }
    match value.as_f64() {
        Some(n) if n == 0.0 => type_of(key).displays_zero(),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn known_keys_resolve() {
        assert_eq!(type_of(keys::ACTUAL_TOTAL_TIME), PropertyType::Duration);
        assert_eq!(type_of(keys::TOTAL_COST), PropertyType::Cost);
        assert_eq!(type_of(keys::SHARED_HIT_BLOCKS), PropertyType::Blocks);
        assert_eq!(type_of(keys::GROUP_KEY), PropertyType::Keys);
    }

    #[test]
    fn unknown_keys_fall_back_to_text() {
        assert_eq!(type_of("Custom Engine Counter"), PropertyType::Text);
    }

    #[test]
    fn zero_counter_displays_but_absent_boolean_does_not() {
        assert!(should_display(keys::ROWS_REMOVED_BY_FILTER, Some(&json!(0))));
        assert!(!should_display(keys::PARALLEL_AWARE, None));
        assert!(!should_display(keys::NODE_TYPE, Some(&json!(null))));
    }
}
