//! Aggregation of the event forest into collapsed stacks.
//!
//! This module transforms decoded captures into the collapsed stack
//! format used for flamegraph generation.

pub mod stack_builder;

// Re-export main types and functions
pub use stack_builder::{build_collapsed_stacks, total_weight, CollapsedStack};
