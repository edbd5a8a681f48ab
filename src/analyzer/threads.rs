//! Per-thread load statistics.
//!
//! A thread's total duration is the sum of its top-level events only.
//! Nested events are counted in `block_count` but their time is not added
//! again, and the issue thresholds are tuned against this definition.

use crate::parser::schema::{Capture, Thread};
use crate::utils::duration;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Load summary for one thread
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreadStats {
    pub thread_id: u64,
    pub thread_name: String,

    #[serde(rename = "total_duration_ns", with = "duration::nanos")]
    pub total_duration: Duration,

    /// Events in the thread's forest, nested ones included
    pub block_count: usize,

    /// Context switches decoded for this thread
    pub context_switches: usize,

    /// `total_duration / block_count`
    #[serde(rename = "avg_block_duration_ns", with = "duration::nanos")]
    pub avg_block_duration: Duration,

    /// Share of the capture's wall time
    pub percent_of_total: f64,
}

/// Statistics for every thread, busiest first
///
/// **Public** - backs `Analyzer::thread_statistics`
pub fn thread_statistics(capture: &Capture) -> Vec<ThreadStats> {
    let capture_duration = capture.total_duration();

    let mut stats: Vec<ThreadStats> = capture
        .threads
        .values()
        .map(|thread| thread_stats(thread, capture_duration))
        .collect();

    stats.sort_by(|a, b| b.total_duration.cmp(&a.total_duration));
    stats
}

fn thread_stats(thread: &Thread, capture_duration: Duration) -> ThreadStats {
    let total_duration: Duration = thread.blocks.iter().map(|b| b.duration()).sum();
    let block_count = thread.block_count();

    ThreadStats {
        thread_id: thread.id,
        thread_name: thread.name.clone(),
        total_duration,
        block_count,
        context_switches: thread.context_switches.len(),
        avg_block_duration: duration::average(total_duration, block_count),
        percent_of_total: duration::percent_of(total_duration, capture_duration),
    }
}
