//! Configuration and constants for the decoder, analyzer and CLI.

use std::time::Duration;

/// Current JSON report schema version
pub const SCHEMA_VERSION: &str = "1.0.0";

// Format constants
// Every capture starts with "Easy" read as a little-endian u32, and the
// same value closes the thread section.
pub const CAPTURE_SIGNATURE: u32 = 0x4561_7379;
pub const BOOKMARKS_TERMINATOR: u32 = CAPTURE_SIGNATURE;

// Format version thresholds (major << 24 | minor << 16 | patch)
pub const MIN_COMPATIBLE_VERSION: u32 = 0x0001_0000; // v0.1.0
pub const VERSION_1_3_0: u32 = 0x0103_0000;
pub const VERSION_2_0_0: u32 = 0x0200_0000;
pub const VERSION_2_1_0: u32 = 0x0201_0000;

// Fixed field widths inside size-prefixed records
pub const DESCRIPTOR_FIXED_BYTES: u32 = 4 + 4 + 4 + 1 + 1 + 2;
pub const CONTEXT_SWITCH_FIXED_BYTES: u32 = 8 + 8 + 8;
pub const EVENT_FIXED_BYTES: u32 = 8 + 8 + 4;
pub const BOOKMARK_FIXED_BYTES: u32 = 8 + 4;

/// Files above this size get a hint to use the fast read options
pub const LARGE_CAPTURE_BYTES: u64 = 100 * 1024 * 1024;

// Fast read preset
pub const FAST_MAX_DEPTH: usize = 5;
pub const FAST_SAMPLE_EVERY: usize = 10;

// Issue detection thresholds
pub const LONG_BLOCK_THRESHOLD: Duration = Duration::from_millis(100);
pub const LONG_BLOCK_HIGH_THRESHOLD: Duration = Duration::from_millis(500);
pub const THREAD_IMBALANCE_RATIO: f64 = 2.0;
pub const CONTEXT_SWITCH_THRESHOLD: usize = 1000;
pub const HOT_FUNCTION_CANDIDATES: usize = 10;
pub const HOT_FUNCTION_SHARE: f64 = 0.10;
pub const HOT_FUNCTION_MEDIUM_SHARE: f64 = 0.20;
pub const HOT_FUNCTION_HIGH_SHARE: f64 = 0.30;

/// Default number of rows for ranked queries
pub const DEFAULT_LIMIT: usize = 10;
