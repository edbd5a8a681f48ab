//! Report command implementation.
//!
//! The report command:
//! 1. Decodes the capture
//! 2. Runs every analyzer query
//! 3. Builds collapsed stacks
//! 4. Generates flamegraph (optional)
//! 5. Writes output files

use super::models::ReportArgs;
use crate::aggregator::build_collapsed_stacks;
use crate::flamegraph::{generate_flamegraph, generate_text_summary};
use crate::output::{write_report, write_svg, AnalysisReport};
use crate::session::Session;
use anyhow::{Context, Result};
use log::{debug, info};
use std::time::Instant;

/// Execute the report command
///
/// **Public** - main entry point called from main.rs
///
/// # Errors
/// * Capture open or decode failures
/// * Flamegraph rendering failures (only when an SVG path is given)
/// * File write errors
pub fn execute_report(args: ReportArgs) -> Result<()> {
    let start_time = Instant::now();
    let options = args.decode.read_options();

    info!("Step 1/5: Decoding capture {}...", args.capture.display());
    let mut session = Session::new();
    session
        .load(&args.capture, &options)
        .with_context(|| format!("Failed to load capture {}", args.capture.display()))?;
    let analyzer = session.analyzer()?;

    info!("Step 2/5: Running analysis...");
    let report = AnalysisReport::build(
        &analyzer,
        args.capture.display().to_string(),
        &options,
        args.limit,
    );
    debug!("{}", report.issues.summary);

    info!("Step 3/5: Building collapsed stacks...");
    let stacks = build_collapsed_stacks(analyzer.capture());
    debug!("Built {} unique stacks", stacks.len());

    let svg_content = match &args.output_svg {
        Some(_) => {
            info!("Step 4/5: Generating flamegraph...");
            let svg = generate_flamegraph(&stacks, args.flamegraph_config.as_ref())
                .context("Failed to generate flamegraph")?;
            Some(svg)
        }
        None => {
            info!("Step 4/5: Skipping flamegraph generation (not requested)");
            None
        }
    };

    info!("Step 5/5: Writing output files...");
    write_report(&report, &args.output_json).context("Failed to write report JSON")?;
    info!("✓ Report written to: {}", args.output_json.display());

    if let (Some(svg), Some(svg_path)) = (svg_content, &args.output_svg) {
        write_svg(&svg, svg_path).context("Failed to write flamegraph SVG")?;
        info!("✓ Flamegraph written to: {}", svg_path.display());
    }

    if args.print_summary {
        println!("\n{}", "=".repeat(80));
        println!("CAPTURE SUMMARY");
        println!("{}", "=".repeat(80));
        println!("{}", report.summary.render());
        println!("Unique Stacks: {}", stacks.len());
        println!("{}", report.issues.summary);
        println!("\n{}", generate_text_summary(&stacks, args.limit));
        println!("{}", "=".repeat(80));
    }

    info!("Report completed in {:.2}s", start_time.elapsed().as_secs_f64());

    Ok(())
}

/// Check report arguments before doing any work
///
/// **Public** - called by main.rs ahead of execute_report
pub fn validate_args(args: &ReportArgs) -> Result<()> {
    if args.capture.as_os_str().is_empty() {
        anyhow::bail!("Capture path cannot be empty");
    }

    if !args.capture.is_file() {
        anyhow::bail!("Capture file not found: {}", args.capture.display());
    }

    if args.limit == 0 {
        anyhow::bail!("limit must be greater than 0");
    }

    if args.output_svg.as_ref() == Some(&args.output_json) {
        anyhow::bail!("JSON report and flamegraph cannot share an output path");
    }

    Ok(())
}
