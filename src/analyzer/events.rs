//! Slowest individual events.

use super::Resolved;
use crate::parser::schema::{walk_blocks, Capture};
use crate::utils::duration;
use log::debug;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One event with its resolved name and owning thread
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventInfo {
    pub name: String,
    pub file: String,
    pub line: i32,

    #[serde(rename = "duration_ns", with = "duration::nanos")]
    pub duration: Duration,

    pub thread_id: u64,
    pub thread_name: String,

    /// Nesting level, 0 for top-level events
    pub depth: usize,
}

/// Flatten every event tree and keep the `limit` longest
///
/// **Public** - backs `Analyzer::slowest_events`
///
/// Events are collected pre-order (parent before children) per thread;
/// the sort is stable, so equal durations keep that order.
pub fn slowest_events(capture: &Capture, limit: usize) -> Vec<EventInfo> {
    let mut events = Vec::with_capacity(capture.total_blocks_count);

    for thread in capture.threads.values() {
        walk_blocks(&thread.blocks, &mut |block, depth| {
            let resolved = Resolved::of(capture, block);
            events.push(EventInfo {
                name: resolved.name.to_string(),
                file: resolved.file().to_string(),
                line: resolved.line(),
                duration: block.duration(),
                thread_id: thread.id,
                thread_name: thread.name.clone(),
                depth,
            });
        });
    }

    events.sort_by(|a, b| b.duration.cmp(&a.duration));
    events.truncate(limit);

    debug!("Selected {} slowest events", events.len());
    events
}
