//! In-memory capture model.
//!
//! Built once by the decoder in a single pass and read-only afterwards.
//! Timestamps are nanoseconds as stored on disk.

use crate::utils::duration;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

/// Decoded file header
///
/// `threads_count` and `bookmarks_count` only exist in v2.1.0+ captures.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub signature: u32,
    pub version: u32,
    pub pid: u64,
    /// Ticks per second, 0 when the capture stores nanoseconds directly
    pub cpu_frequency: i64,
    pub begin_time: u64,
    pub end_time: u64,
    pub memory_size: u64,
    pub descriptors_memory_size: u64,
    pub blocks_count: u32,
    pub descriptors_count: u32,
    pub threads_count: Option<u32>,
    pub bookmarks_count: Option<u16>,
    pub padding: u16,
}

impl Header {
    /// Wall time covered by the capture
    pub fn total_duration(&self) -> Duration {
        duration::between(self.begin_time, self.end_time)
    }
}

/// Kind of a registered block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    Event,
    Block,
    Value,
    /// Kind byte this decoder does not know about
    Other(u8),
}

impl From<u8> for BlockKind {
    fn from(raw: u8) -> Self {
        match raw {
            0 => BlockKind::Event,
            1 => BlockKind::Block,
            2 => BlockKind::Value,
            other => BlockKind::Other(other),
        }
    }
}

/// Static description of a block, referenced by id from every event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Descriptor {
    pub id: u32,
    pub line: i32,
    pub color: u32,
    pub kind: BlockKind,
    pub status: u8,
    pub name: String,
    pub file: String,
}

/// A timed event and the events nested inside it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub begin: u64,
    pub end: u64,
    pub descriptor_id: u32,
    /// Runtime name, overrides the descriptor name when non-empty
    pub name: String,
    pub children: Vec<Block>,
}

impl Block {
    pub fn new(begin: u64, end: u64, descriptor_id: u32) -> Self {
        Self {
            begin,
            end,
            descriptor_id,
            name: String::new(),
            children: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_children(mut self, children: Vec<Block>) -> Self {
        self.children = children;
        self
    }

    /// `end - begin`, clamped at zero for malformed records
    pub fn duration(&self) -> Duration {
        duration::between(self.begin, self.end)
    }

    /// True when `other` lies strictly within this block's time range
    ///
    /// A zero-length block never encloses anything, and two blocks with the
    /// same range are siblings rather than parent and child.
    pub fn encloses(&self, other: &Block) -> bool {
        self.begin < self.end
            && self.begin <= other.begin
            && other.end <= self.end
            && (self.begin, self.end) != (other.begin, other.end)
    }

    /// Number of nodes in this subtree, including `self`
    pub fn subtree_len(&self) -> usize {
        1 + count_blocks(&self.children)
    }
}

// Trees can nest far deeper than the call stack allows, so teardown is
// iterative as well.
impl Drop for Block {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut block) = pending.pop() {
            pending.append(&mut block.children);
        }
    }
}

/// Total nodes in a forest
pub fn count_blocks(blocks: &[Block]) -> usize {
    let mut count = 0;
    walk_blocks(blocks, &mut |_, _| count += 1);
    count
}

/// Pre-order walk (parent before children) over a forest
///
/// Uses an explicit stack of sibling iterators, so depth is bounded by
/// memory rather than by the call stack.
pub fn walk_blocks<'a>(blocks: &'a [Block], visit: &mut impl FnMut(&'a Block, usize)) {
    let mut levels = vec![blocks.iter()];
    while let Some(level) = levels.last_mut() {
        match level.next() {
            Some(block) => {
                visit(block, levels.len() - 1);
                if !block.children.is_empty() {
                    levels.push(block.children.iter());
                }
            }
            None => {
                levels.pop();
            }
        }
    }
}

/// OS-level deschedule/reschedule pair
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextSwitch {
    pub thread_id: u64,
    pub begin: u64,
    pub end: u64,
    pub name: String,
}

impl ContextSwitch {
    pub fn duration(&self) -> Duration {
        duration::between(self.begin, self.end)
    }
}

/// All data recorded for one thread
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thread {
    pub id: u64,
    pub name: String,
    pub context_switches: Vec<ContextSwitch>,
    /// Top-level events; nested events live in `Block::children`
    pub blocks: Vec<Block>,
}

impl Thread {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn block_count(&self) -> usize {
        count_blocks(&self.blocks)
    }
}

/// User annotation at a single instant
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
    pub position: u64,
    pub color: u32,
    pub text: String,
}

/// A fully decoded capture
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Capture {
    pub header: Header,
    pub descriptors: HashMap<u32, Descriptor>,
    /// Keyed by thread id; duplicate ids in a capture keep the last record
    pub threads: BTreeMap<u64, Thread>,
    pub bookmarks: Vec<Bookmark>,
    pub total_blocks_count: usize,
    pub memory_used_bytes: u64,
}

impl Capture {
    pub fn total_duration(&self) -> Duration {
        self.header.total_duration()
    }

    pub fn thread_count(&self) -> usize {
        self.threads.len()
    }

    /// Events across all threads, counting every nested node
    pub fn blocks_count(&self) -> usize {
        self.threads.values().map(Thread::block_count).sum()
    }

    pub fn descriptor(&self, id: u32) -> Option<&Descriptor> {
        self.descriptors.get(&id)
    }

    /// Recompute the derived counters after the sections are in place
    pub(crate) fn finalize(&mut self) {
        self.total_blocks_count = self.blocks_count();
        self.memory_used_bytes = self.header.memory_size;
    }
}

/// Dotted form of a packed version, e.g. `0x02010000` -> `2.1.0`
pub fn format_version(version: u32) -> String {
    format!(
        "{}.{}.{}",
        version >> 24,
        (version >> 16) & 0xff,
        version & 0xffff
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nested() -> Vec<Block> {
        vec![
            Block::new(0, 100, 1).with_children(vec![
                Block::new(10, 20, 2),
                Block::new(30, 60, 2).with_children(vec![Block::new(40, 50, 3)]),
            ]),
            Block::new(200, 250, 1),
        ]
    }

    #[test]
    fn test_count_blocks_includes_nested() {
        assert_eq!(count_blocks(&nested()), 5);
        assert_eq!(count_blocks(&[]), 0);
    }

    #[test]
    fn test_walk_is_pre_order() {
        let blocks = nested();
        let mut seen = Vec::new();
        walk_blocks(&blocks, &mut |b, depth| seen.push((b.begin, depth)));
        assert_eq!(seen, vec![(0, 0), (10, 1), (30, 1), (40, 2), (200, 0)]);
    }

    #[test]
    fn test_encloses_is_strict() {
        let parent = Block::new(0, 100, 1);
        assert!(parent.encloses(&Block::new(10, 20, 2)));
        assert!(parent.encloses(&Block::new(0, 50, 2)));
        assert!(parent.encloses(&Block::new(100, 100, 2)));
        assert!(!parent.encloses(&Block::new(0, 100, 2)));
        assert!(!parent.encloses(&Block::new(50, 150, 2)));

        let instant = Block::new(5, 5, 1);
        assert!(!instant.encloses(&Block::new(5, 5, 1)));
    }

    #[test]
    fn test_deep_chain_walks_and_drops() {
        let depth = 100_000;
        let mut chain = Block::new(0, 2 * depth, 1);
        for i in 1..depth {
            chain = Block::new(0, 2 * depth + i, 1).with_children(vec![chain]);
        }
        let forest = vec![chain];

        assert_eq!(count_blocks(&forest), depth as usize);
        let mut deepest = 0;
        walk_blocks(&forest, &mut |_, d| deepest = deepest.max(d));
        assert_eq!(deepest, depth as usize - 1);
    }

    #[test]
    fn test_negative_duration_clamps() {
        assert_eq!(Block::new(50, 10, 0).duration(), Duration::ZERO);
    }

    #[test]
    fn test_finalize_counts() {
        let mut capture = Capture::default();
        capture.header.memory_size = 4096;
        let mut thread = Thread::new(1, "main");
        thread.blocks = nested();
        capture.threads.insert(1, thread);
        capture.finalize();
        assert_eq!(capture.total_blocks_count, 5);
        assert_eq!(capture.memory_used_bytes, 4096);
    }

    #[test]
    fn test_format_version() {
        assert_eq!(format_version(0x0201_0000), "2.1.0");
        assert_eq!(format_version(0x0103_0002), "1.3.2");
    }

    #[test]
    fn test_block_kind_from_raw() {
        assert_eq!(BlockKind::from(1), BlockKind::Block);
        assert_eq!(BlockKind::from(9), BlockKind::Other(9));
    }
}
