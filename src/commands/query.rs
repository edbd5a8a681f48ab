//! Single-query commands: summary, slowest, threads, hotspots, issues.
//!
//! Each command loads the capture into a fresh session, runs one query,
//! and prints either a text table or pretty JSON.

use super::models::QueryArgs;
use crate::analyzer::{EventInfo, Hotspot, IssueReport, PerformanceIssue, ThreadStats};
use crate::output::to_json_string;
use crate::session::Session;
use crate::utils::duration;
use anyhow::{Context, Result};
use log::debug;

/// Which query a command runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Query {
    Summary,
    Slowest,
    Threads,
    Hotspots,
    Issues,
}

/// Load a capture into a new session
///
/// **Public** - shared by every command that reads a capture
pub fn open_session(args: &QueryArgs) -> Result<Session> {
    let options = args.decode.read_options();
    debug!("Read options: {:?}", options);

    let mut session = Session::new();
    session
        .load(&args.capture, &options)
        .with_context(|| format!("Failed to load capture {}", args.capture.display()))?;
    Ok(session)
}

/// Execute one query command
///
/// **Public** - main entry point called from main.rs
pub fn execute_query(query: Query, args: QueryArgs) -> Result<()> {
    let session = open_session(&args)?;
    println!("{}", run_query(&session, query, &args)?);
    Ok(())
}

/// Render a query against a loaded session
///
/// **Public** - separated from printing so it can be tested
pub fn run_query(session: &Session, query: Query, args: &QueryArgs) -> Result<String> {
    let analyzer = session.analyzer()?;

    let text = match (query, args.json) {
        (Query::Summary, true) => to_json_string(&session.summary()?)?,
        (Query::Summary, false) => session.summary()?.render(),
        (Query::Slowest, true) => to_json_string(&analyzer.slowest_events(args.limit))?,
        (Query::Slowest, false) => render_events(&analyzer.slowest_events(args.limit)),
        (Query::Threads, true) => to_json_string(&analyzer.thread_statistics())?,
        (Query::Threads, false) => render_threads(&analyzer.thread_statistics()),
        (Query::Hotspots, true) => to_json_string(&analyzer.hotspots(args.limit))?,
        (Query::Hotspots, false) => render_hotspots(&analyzer.hotspots(args.limit)),
        (Query::Issues, true) => to_json_string(&analyzer.issue_report())?,
        (Query::Issues, false) => render_issues(&analyzer.issue_report()),
    };
    Ok(text)
}

fn render_events(events: &[EventInfo]) -> String {
    let mut lines = vec![format!(
        "{:>4}  {:<32} {:>14}  {:<20} {}",
        "#", "EVENT", "DURATION", "THREAD", "LOCATION"
    )];
    for (rank, event) in events.iter().enumerate() {
        lines.push(format!(
            "{:>4}  {:<32} {:>14}  {:<20} {}",
            rank + 1,
            event.name,
            duration::display(event.duration),
            event.thread_name,
            location(&event.file, event.line)
        ));
    }
    lines.join("\n")
}

fn render_threads(stats: &[ThreadStats]) -> String {
    let mut lines = vec![format!(
        "{:<12} {:<24} {:>14} {:>8} {:>10} {:>12} {:>8}",
        "ID", "THREAD", "TOTAL", "EVENTS", "SWITCHES", "AVG", "%"
    )];
    for s in stats {
        lines.push(format!(
            "{:<12} {:<24} {:>14} {:>8} {:>10} {:>12} {:>7.2}%",
            s.thread_id,
            s.thread_name,
            duration::display(s.total_duration),
            s.block_count,
            s.context_switches,
            duration::display(s.avg_block_duration),
            s.percent_of_total
        ));
    }
    lines.join("\n")
}

fn render_hotspots(spots: &[Hotspot]) -> String {
    let mut lines = vec![format!(
        "{:>4}  {:<32} {:>14} {:>8} {:>12} {:>8}  {}",
        "#", "NAME", "TOTAL", "CALLS", "AVG", "%", "LOCATION"
    )];
    for (rank, spot) in spots.iter().enumerate() {
        lines.push(format!(
            "{:>4}  {:<32} {:>14} {:>8} {:>12} {:>7.2}%  {}",
            rank + 1,
            spot.name,
            duration::display(spot.total_duration),
            spot.call_count,
            duration::display(spot.avg_duration),
            spot.percent_of_total,
            location(&spot.file, spot.line)
        ));
    }
    lines.join("\n")
}

fn render_issues(report: &IssueReport) -> String {
    let mut lines = vec![report.summary.clone()];
    let groups = [
        ("HIGH", &report.by_severity.high),
        ("MEDIUM", &report.by_severity.medium),
        ("LOW", &report.by_severity.low),
    ];
    for (label, issues) in groups {
        if issues.is_empty() {
            continue;
        }
        lines.push(String::new());
        lines.push(format!("[{}]", label));
        lines.extend(issues.iter().map(render_issue));
    }
    lines.join("\n")
}

fn render_issue(issue: &PerformanceIssue) -> String {
    format!("  {}: {} @ {}", issue.kind, issue.description, issue.location)
}

fn location(file: &str, line: i32) -> String {
    if file.is_empty() {
        "-".to_string()
    } else {
        format!("{}:{}", file, line)
    }
}
