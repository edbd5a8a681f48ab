//! Heuristic performance issue detection.
//!
//! Four independent rules, merged and ordered by severity:
//! - long blocking operations (any single event over 100 ms)
//! - thread imbalance (busiest / least busy thread over 2x)
//! - excessive context switches (over 1000 on one thread)
//! - hot functions (a top-10 hotspot over 10% of capture time)

use super::hotspots::hotspots;
use super::threads::thread_statistics;
use super::Resolved;
use crate::parser::schema::{walk_blocks, Capture};
use crate::utils::config::{
    CONTEXT_SWITCH_THRESHOLD, HOT_FUNCTION_CANDIDATES, HOT_FUNCTION_HIGH_SHARE,
    HOT_FUNCTION_MEDIUM_SHARE, HOT_FUNCTION_SHARE, LONG_BLOCK_HIGH_THRESHOLD,
    LONG_BLOCK_THRESHOLD, THREAD_IMBALANCE_RATIO,
};
use crate::utils::duration;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Issue severity, ordered high to low
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
    Low,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
        })
    }
}

/// Which rule produced an issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    LongBlockingOperation,
    ThreadImbalance,
    ExcessiveContextSwitches,
    HotFunction,
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            IssueKind::LongBlockingOperation => "Long Blocking Operation",
            IssueKind::ThreadImbalance => "Thread Imbalance",
            IssueKind::ExcessiveContextSwitches => "Excessive Context Switches",
            IssueKind::HotFunction => "Hot Function",
        })
    }
}

/// A detected performance problem
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceIssue {
    pub kind: IssueKind,
    pub severity: Severity,
    pub description: String,
    pub location: String,

    #[serde(
        rename = "duration_ns",
        with = "duration::opt_nanos",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub duration: Option<Duration>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_name: Option<String>,
}

/// Run every rule and order the findings high, medium, low
///
/// **Public** - backs `Analyzer::issues`
///
/// The sort is stable, so findings of equal severity keep rule order.
pub fn detect_issues(capture: &Capture) -> Vec<PerformanceIssue> {
    let mut issues = Vec::new();
    issues.extend(detect_long_blocks(capture));
    issues.extend(detect_thread_imbalance(capture));
    issues.extend(detect_excessive_context_switches(capture));
    issues.extend(detect_hot_functions(capture));

    issues.sort_by_key(|issue| issue.severity);
    issues
}

/// Any single event over the long-block threshold, searched at every depth
pub fn detect_long_blocks(capture: &Capture) -> Vec<PerformanceIssue> {
    let mut issues = Vec::new();

    for thread in capture.threads.values() {
        walk_blocks(&thread.blocks, &mut |block, _| {
            let elapsed = block.duration();
            if elapsed <= LONG_BLOCK_THRESHOLD {
                return;
            }

            let resolved = Resolved::of(capture, block);
            let location = match resolved.descriptor {
                Some(d) => format!("{}:{}", d.file, d.line),
                None => "unknown".to_string(),
            };
            let severity = if elapsed > LONG_BLOCK_HIGH_THRESHOLD {
                Severity::High
            } else {
                Severity::Medium
            };

            issues.push(PerformanceIssue {
                kind: IssueKind::LongBlockingOperation,
                severity,
                description: format!(
                    "Block '{}' took {}",
                    resolved.name,
                    duration::display(elapsed)
                ),
                location,
                duration: Some(elapsed),
                thread_id: Some(thread.id),
                thread_name: Some(thread.name.clone()),
            });
        });
    }

    issues
}

/// Busiest thread doing more than twice the work of the least busy one
pub fn detect_thread_imbalance(capture: &Capture) -> Vec<PerformanceIssue> {
    let stats = thread_statistics(capture);
    let (Some(busiest), Some(idlest)) = (stats.first(), stats.last()) else {
        return Vec::new();
    };
    if stats.len() < 2 || idlest.total_duration.is_zero() {
        return Vec::new();
    }

    let max = busiest.total_duration;
    let min = idlest.total_duration;
    let ratio = max.as_nanos() as f64 / min.as_nanos() as f64;
    if ratio <= THREAD_IMBALANCE_RATIO {
        return Vec::new();
    }

    vec![PerformanceIssue {
        kind: IssueKind::ThreadImbalance,
        severity: Severity::Medium,
        description: format!(
            "Thread workload imbalance detected: max={}, min={} (ratio={:.2}x)",
            duration::display(max),
            duration::display(min),
            ratio
        ),
        location: "across all threads".to_string(),
        duration: Some(max - min),
        thread_id: None,
        thread_name: None,
    }]
}

/// Threads descheduled more often than the context-switch threshold
pub fn detect_excessive_context_switches(capture: &Capture) -> Vec<PerformanceIssue> {
    capture
        .threads
        .values()
        .filter(|thread| thread.context_switches.len() > CONTEXT_SWITCH_THRESHOLD)
        .map(|thread| PerformanceIssue {
            kind: IssueKind::ExcessiveContextSwitches,
            severity: Severity::Medium,
            description: format!(
                "Thread has {} context switches (threshold: {})",
                thread.context_switches.len(),
                CONTEXT_SWITCH_THRESHOLD
            ),
            location: thread.name.clone(),
            duration: None,
            thread_id: Some(thread.id),
            thread_name: Some(thread.name.clone()),
        })
        .collect()
}

/// Top hotspots taking a large share of the capture's wall time
pub fn detect_hot_functions(capture: &Capture) -> Vec<PerformanceIssue> {
    if capture.total_duration().is_zero() {
        return Vec::new();
    }

    hotspots(capture, HOT_FUNCTION_CANDIDATES)
        .into_iter()
        .filter_map(|spot| {
            let share = spot.percent_of_total / 100.0;
            if share <= HOT_FUNCTION_SHARE {
                return None;
            }

            let severity = if share > HOT_FUNCTION_HIGH_SHARE {
                Severity::High
            } else if share > HOT_FUNCTION_MEDIUM_SHARE {
                Severity::Medium
            } else {
                Severity::Low
            };

            Some(PerformanceIssue {
                kind: IssueKind::HotFunction,
                severity,
                description: format!(
                    "Function '{}' consumes {:.1}% of total time ({} total, {} calls, avg {})",
                    spot.name,
                    spot.percent_of_total,
                    duration::display(spot.total_duration),
                    spot.call_count,
                    duration::display(spot.avg_duration)
                ),
                location: spot.location(),
                duration: Some(spot.total_duration),
                thread_id: None,
                thread_name: None,
            })
        })
        .collect()
}

/// Findings grouped by severity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeverityGroups {
    pub high: Vec<PerformanceIssue>,
    pub medium: Vec<PerformanceIssue>,
    pub low: Vec<PerformanceIssue>,
}

/// Grouped view of `detect_issues`, as shown to users
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IssueReport {
    pub total_issues: usize,
    pub by_severity: SeverityGroups,
    pub summary: String,
}

impl IssueReport {
    pub fn from_issues(issues: Vec<PerformanceIssue>) -> Self {
        let total_issues = issues.len();
        let mut groups = SeverityGroups::default();
        for issue in issues {
            match issue.severity {
                Severity::High => groups.high.push(issue),
                Severity::Medium => groups.medium.push(issue),
                Severity::Low => groups.low.push(issue),
            }
        }

        let summary = format!(
            "Found {} performance issues ({} high, {} medium, {} low)",
            total_issues,
            groups.high.len(),
            groups.medium.len(),
            groups.low.len()
        );

        Self {
            total_issues,
            by_severity: groups,
            summary,
        }
    }
}
