//! Headline figures for a freshly loaded capture.

use crate::parser::options::ReadOptions;
use crate::parser::schema::{format_version, Capture};
use crate::utils::duration;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// What a load reports back before any query runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureSummary {
    /// Raw format version, e.g. `0x2010000`
    pub version: String,
    /// Dotted form of `version`, e.g. `2.1.0`
    pub version_name: String,
    pub pid: u64,

    #[serde(rename = "total_duration_ns", with = "duration::nanos")]
    pub total_duration: Duration,

    pub threads_count: usize,
    pub blocks_count: usize,
    pub descriptors_count: usize,
    pub bookmarks_count: usize,
    pub memory_mb: f64,
    pub cpu_frequency: i64,

    /// Whether any reduced-fidelity read option was active
    pub fast_mode: bool,
}

impl CaptureSummary {
    pub fn new(capture: &Capture, options: &ReadOptions) -> Self {
        let header = &capture.header;
        Self {
            version: format!("0x{:X}", header.version),
            version_name: format_version(header.version),
            pid: header.pid,
            total_duration: capture.total_duration(),
            threads_count: capture.thread_count(),
            blocks_count: capture.blocks_count(),
            descriptors_count: capture.descriptors.len(),
            bookmarks_count: capture.bookmarks.len(),
            memory_mb: header.memory_size as f64 / (1024.0 * 1024.0),
            cpu_frequency: header.cpu_frequency,
            fast_mode: !options.is_complete(),
        }
    }

    /// Multi-line text block for the terminal
    pub fn render(&self) -> String {
        [
            format!("Version:      {} ({})", self.version_name, self.version),
            format!("PID:          {}", self.pid),
            format!("Duration:     {}", duration::display(self.total_duration)),
            format!("Threads:      {}", self.threads_count),
            format!("Events:       {}", self.blocks_count),
            format!("Descriptors:  {}", self.descriptors_count),
            format!("Bookmarks:    {}", self.bookmarks_count),
            format!("Memory:       {:.2} MiB", self.memory_mb),
            format!("CPU freq:     {}", self.cpu_frequency),
            format!("Fast mode:    {}", self.fast_mode),
        ]
        .join("\n")
    }
}
