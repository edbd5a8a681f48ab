//! Performance analysis over a decoded capture.
//!
//! Every query walks the read-only capture model and returns an owned,
//! ranked result, so queries can be repeated and interleaved freely.
//!
//! - `events` - slowest individual events
//! - `threads` - per-thread load
//! - `hotspots` - events aggregated by name and source location
//! - `issues` - heuristic problem detection on top of the above
//! - `summary` - headline figures reported on load

pub mod events;
pub mod hotspots;
pub mod issues;
pub mod summary;
pub mod threads;

pub use events::{slowest_events, EventInfo};
pub use hotspots::{hotspots, Hotspot};
pub use issues::{detect_issues, IssueKind, IssueReport, PerformanceIssue, Severity};
pub use summary::CaptureSummary;
pub use threads::{thread_statistics, ThreadStats};

use crate::parser::schema::{Block, Capture, Descriptor};

/// Query handle over one capture
///
/// **Public** - created by the session after a successful decode
#[derive(Debug, Clone, Copy)]
pub struct Analyzer<'a> {
    capture: &'a Capture,
}

impl<'a> Analyzer<'a> {
    pub fn new(capture: &'a Capture) -> Self {
        Self { capture }
    }

    pub fn capture(&self) -> &'a Capture {
        self.capture
    }

    /// The `limit` longest events, nested ones included
    pub fn slowest_events(&self, limit: usize) -> Vec<EventInfo> {
        slowest_events(self.capture, limit)
    }

    /// One row per thread, busiest first
    pub fn thread_statistics(&self) -> Vec<ThreadStats> {
        thread_statistics(self.capture)
    }

    /// The `limit` call sites with the most cumulative time
    pub fn hotspots(&self, limit: usize) -> Vec<Hotspot> {
        hotspots(self.capture, limit)
    }

    /// All heuristic findings, high severity first
    pub fn issues(&self) -> Vec<PerformanceIssue> {
        detect_issues(self.capture)
    }

    /// Findings grouped by severity
    pub fn issue_report(&self) -> IssueReport {
        IssueReport::from_issues(self.issues())
    }
}

/// Display name and source location of an event
#[derive(Debug, Clone, Copy)]
pub(crate) struct Resolved<'a> {
    pub name: &'a str,
    pub descriptor: Option<&'a Descriptor>,
}

impl<'a> Resolved<'a> {
    /// Runtime name wins over the descriptor name; a missing descriptor is
    /// normal for dynamically named events
    pub fn of(capture: &'a Capture, block: &'a Block) -> Self {
        let descriptor = capture.descriptor(block.descriptor_id);
        let name = if block.name.is_empty() {
            descriptor.map_or("", |d| d.name.as_str())
        } else {
            block.name.as_str()
        };
        Self { name, descriptor }
    }

    pub fn file(&self) -> &'a str {
        self.descriptor.map_or("", |d| d.file.as_str())
    }

    pub fn line(&self) -> i32 {
        self.descriptor.map_or(0, |d| d.line)
    }
}
