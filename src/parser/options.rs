//! Read options trading completeness for bounded time and memory.

use crate::utils::config::{FAST_MAX_DEPTH, FAST_SAMPLE_EVERY};
use serde::{Deserialize, Serialize};

/// Controls how much of a capture is materialised
///
/// Every record is still consumed from the stream; the options only decide
/// what ends up in the model. Skipped threads, context switches and
/// bookmarks are stepped over without decoding. `max_depth` and
/// `sample_every` need the rebuilt event tree, so they apply once a
/// thread's events are all decoded: they bound the model and every later
/// analysis, not the peak memory of decoding the largest thread.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadOptions {
    /// Deepest nesting level kept (1 = top-level events only), `None` = unlimited
    #[serde(default)]
    pub max_depth: Option<usize>,

    /// Keep every Nth top-level event of each thread, `None` = keep all
    #[serde(default)]
    pub sample_every: Option<usize>,

    /// Consume context switches without decoding them
    #[serde(default)]
    pub skip_context_switches: bool,

    /// Consume bookmarks without decoding them
    #[serde(default)]
    pub skip_bookmarks: bool,

    /// Decode at most this many threads, `None` = all
    #[serde(default)]
    pub max_threads: Option<usize>,
}

impl ReadOptions {
    /// Read everything
    pub fn new() -> Self {
        Self::default()
    }

    /// Preset for very large captures
    pub fn fast() -> Self {
        Self {
            max_depth: Some(FAST_MAX_DEPTH),
            sample_every: Some(FAST_SAMPLE_EVERY),
            skip_context_switches: true,
            skip_bookmarks: true,
            max_threads: None,
        }
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn with_sample_every(mut self, n: usize) -> Self {
        self.sample_every = Some(n);
        self
    }

    pub fn with_max_threads(mut self, n: usize) -> Self {
        self.max_threads = Some(n);
        self
    }

    /// True when every record is decoded in full
    pub fn is_complete(&self) -> bool {
        self.effective_max_depth().is_none()
            && self.effective_sample_every().is_none()
            && !self.skip_context_switches
            && !self.skip_bookmarks
            && self.effective_max_threads().is_none()
    }

    // Zero means "no limit", matching the CLI convention
    pub(crate) fn effective_max_depth(&self) -> Option<usize> {
        self.max_depth.filter(|d| *d > 0)
    }

    pub(crate) fn effective_sample_every(&self) -> Option<usize> {
        self.sample_every.filter(|n| *n > 1)
    }

    pub(crate) fn effective_max_threads(&self) -> Option<usize> {
        self.max_threads.filter(|n| *n > 0)
    }
}
