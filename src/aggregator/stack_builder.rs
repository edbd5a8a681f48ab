//! Build collapsed stack format from the decoded event forest.
//!
//! Collapsed stacks are the input format for flamegraph generation.
//! Format: "thread;outer;inner weight"
//!
//! Example: "main;frame;physics 1200"
//! This means: on thread "main", `physics` ran inside `frame` for 1200 ns
//! of self time (its own duration minus the time spent in its children).

use crate::analyzer::Resolved;
use crate::parser::schema::{walk_blocks, Block, Capture, Thread};
use log::debug;
use std::collections::HashMap;

/// A single collapsed stack entry
///
/// **Public** - used by flamegraph generator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollapsedStack {
    /// Stack trace as semicolon-separated string
    pub stack: String,

    /// Self time in nanoseconds accumulated on this path
    pub weight: u64,
}

impl CollapsedStack {
    /// Create a new collapsed stack
    ///
    /// **Public** - constructor
    pub fn new(stack: String, weight: u64) -> Self {
        Self { stack, weight }
    }

    /// One line of the collapsed format, as consumed by inferno
    pub fn to_line(&self) -> String {
        format!("{} {}", self.stack, self.weight)
    }

    /// Innermost frame of the stack
    pub fn leaf(&self) -> &str {
        self.stack.rsplit(';').next().unwrap_or(&self.stack)
    }
}

/// Build collapsed stacks from a decoded capture
///
/// **Public** - main entry point for stack building
///
/// # Arguments
/// * `capture` - Decoded capture
///
/// # Returns
/// Vector of collapsed stacks, one per unique call path with non-zero
/// self time, heaviest first (ties ordered by stack text)
///
/// # Algorithm
/// 1. Walk each thread's event forest depth-first
/// 2. Keep the path of resolved event names from the thread root
/// 3. Charge each event its self time on the current path
/// 4. Aggregate by unique path (sum weights)
pub fn build_collapsed_stacks(capture: &Capture) -> Vec<CollapsedStack> {
    debug!(
        "Building collapsed stacks from {} events on {} threads",
        capture.total_blocks_count,
        capture.thread_count()
    );

    let mut stack_map: HashMap<String, u64> = HashMap::new();

    for thread in capture.threads.values() {
        let mut path = vec![thread_frame(thread)];
        walk_blocks(&thread.blocks, &mut |block, depth| {
            path.truncate(depth + 1);
            path.push(frame_name(Resolved::of(capture, block).name, block.descriptor_id));
            *stack_map.entry(path.join(";")).or_insert(0) += self_time(block);
        });
    }

    let mut stacks: Vec<CollapsedStack> = stack_map
        .into_iter()
        .filter(|(_, weight)| *weight > 0)
        .map(|(stack, weight)| CollapsedStack::new(stack, weight))
        .collect();

    stacks.sort_by(|a, b| b.weight.cmp(&a.weight).then_with(|| a.stack.cmp(&b.stack)));

    debug!("Built {} unique collapsed stacks", stacks.len());

    stacks
}

/// Sum of all stack weights
pub fn total_weight(stacks: &[CollapsedStack]) -> u64 {
    stacks.iter().map(|s| s.weight).sum()
}

/// Own duration minus the children's durations, saturating at zero
fn self_time(block: &Block) -> u64 {
    let total = block.end.saturating_sub(block.begin);
    let children: u64 = block
        .children
        .iter()
        .map(|c| c.end.saturating_sub(c.begin))
        .sum();
    total.saturating_sub(children)
}

fn thread_frame(thread: &Thread) -> String {
    if thread.name.is_empty() {
        format!("thread {}", thread.id)
    } else {
        sanitize(&thread.name)
    }
}

fn frame_name(name: &str, descriptor_id: u32) -> String {
    if name.is_empty() {
        format!("block {}", descriptor_id)
    } else {
        sanitize(name)
    }
}

/// `;` separates frames and a newline ends a record in the collapsed format
fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            ';' => ':',
            '\n' | '\r' => ' ',
            other => other,
        })
        .collect()
}
