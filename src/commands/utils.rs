use crate::output::read_report;
use crate::utils::config::SCHEMA_VERSION;
use anyhow::{Context, Result};
use std::path::Path;

/// Validate a report JSON file
pub fn validate_report_file(file_path: &Path) -> Result<()> {
    println!("Validating report: {}", file_path.display());

    let report = read_report(file_path)
        .with_context(|| format!("Not a valid report: {}", file_path.display()))?;

    if report.version != SCHEMA_VERSION {
        log::warn!(
            "Report schema v{} differs from current v{}",
            report.version,
            SCHEMA_VERSION
        );
    }

    println!("✓ Valid report JSON");
    println!("  Version: {}", report.version);
    println!("  Source: {}", report.source);
    println!("  Generated: {}", report.generated_at);
    println!("  Capture format: {}", report.summary.version_name);
    println!("  Threads: {}", report.summary.threads_count);
    println!("  Events: {}", report.summary.blocks_count);
    println!("  Hotspots: {}", report.hotspots.len());
    println!("  {}", report.issues.summary);

    Ok(())
}

/// Display schema information
pub fn display_schema(show_details: bool) {
    println!("EasyProf Studio Report Schema");
    println!("Current Version: {}", SCHEMA_VERSION);
    println!();

    if show_details {
        println!("Schema Structure:");
        println!("  version: string            - Schema version (e.g., '1.0.0')");
        println!("  source: string             - Capture file the report was built from");
        println!("  generated_at: string       - RFC 3339 timestamp");
        println!("  read_options: object      - Decode options used");
        println!("  summary: object            - Capture header figures");
        println!("  slowest_events: array      - Longest individual events");
        println!("    duration_ns: number      - Event duration in nanoseconds");
        println!("    depth: number            - Nesting level (0 = top level)");
        println!("  threads: array             - Per-thread load, busiest first");
        println!("  hotspots: array            - Events aggregated by name and location");
        println!("    total_duration_ns: number");
        println!("    call_count: number");
        println!("    percent_of_total: number");
        println!("  issues: object             - Findings grouped by severity");
        println!("    total_issues: number");
        println!("    by_severity: {{high, medium, low}}");
        println!("    summary: string");
    } else {
        println!("Use --show for detailed schema information");
    }
}

/// Display version information
pub fn display_version() {
    println!("EasyProf Studio v{}", env!("CARGO_PKG_VERSION"));
    println!("Report Schema: v{}", SCHEMA_VERSION);
    println!();
    println!("Decoder and performance analysis for easy_profiler captures.");
}
