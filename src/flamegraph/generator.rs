//! SVG flamegraph generation using inferno.
//!
//! Collapsed stacks are weighted by self time in nanoseconds, so frame
//! widths are proportional to wall time spent on each call path.

use crate::aggregator::stack_builder::{total_weight, CollapsedStack};
use crate::utils::duration;
use crate::utils::error::FlamegraphError;
use inferno::flamegraph::{self, Options};
use log::info;
use std::time::Duration;

/// Flamegraph configuration
#[derive(Debug, Clone)]
pub struct FlamegraphConfig {
    pub title: String,
    pub subtitle: Option<String>,
    pub width: usize,
}

impl Default for FlamegraphConfig {
    fn default() -> Self {
        Self {
            title: "Capture Profile".to_string(),
            subtitle: None,
            width: 1200,
        }
    }
}

impl FlamegraphConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = Some(subtitle.into());
        self
    }

    pub fn with_width(mut self, width: usize) -> Self {
        self.width = width;
        self
    }
}

/// Generate SVG flamegraph from collapsed stacks
///
/// **Public** - main entry point for flamegraph rendering
///
/// # Errors
/// * `FlamegraphError::EmptyStacks` - nothing to draw
/// * `FlamegraphError::RenderFailed` - inferno failed to render
pub fn generate_flamegraph(
    stacks: &[CollapsedStack],
    config: Option<&FlamegraphConfig>,
) -> Result<String, FlamegraphError> {
    if stacks.is_empty() {
        return Err(FlamegraphError::EmptyStacks);
    }

    let config = config.cloned().unwrap_or_default();
    info!("Generating flamegraph with {} stacks", stacks.len());

    let mut options = Options::default();
    options.title = config.title;
    options.subtitle = config.subtitle;
    options.count_name = "ns".to_string();
    options.image_width = Some(config.width);

    let lines: Vec<String> = stacks.iter().map(CollapsedStack::to_line).collect();
    let mut svg = Vec::new();
    flamegraph::from_lines(&mut options, lines.iter().map(String::as_str), &mut svg)
        .map_err(|e| FlamegraphError::RenderFailed(e.to_string()))?;

    let svg = String::from_utf8_lossy(&svg).into_owned();
    info!("Flamegraph generated successfully ({} bytes)", svg.len());
    Ok(svg)
}

/// Create a text summary table of the heaviest call paths
///
/// **Public** - printed by the `report` command
pub fn generate_text_summary(stacks: &[CollapsedStack], max_lines: usize) -> String {
    let total = total_weight(stacks).max(1);
    let mut lines = Vec::new();

    lines.push("  HOT CALL PATHS (self time)".to_string());
    lines.push(format!("  ┏{}┳{}┳{}┓", "━".repeat(52), "━".repeat(14), "━".repeat(9)));
    lines.push(format!("  ┃ {:<50} ┃ {:^12} ┃ {:^7} ┃", "Call Path (Hottest First)", "TIME", "%"));
    lines.push(format!("  ┣{}╋{}╋{}┫", "━".repeat(52), "━".repeat(14), "━".repeat(9)));

    for stack in stacks.iter().take(max_lines) {
        let percentage = stack.weight as f64 * 100.0 / total as f64;
        lines.push(format!(
            "  ┃ {:<50} ┃ {:>12} ┃ {:>6.1}% ┃",
            truncate_left(&stack.stack, 50),
            duration::display(Duration::from_nanos(stack.weight)),
            percentage
        ));
    }

    lines.push(format!("  ┗{}┻{}┻{}┛", "━".repeat(52), "━".repeat(14), "━".repeat(9)));

    if stacks.len() > max_lines {
        lines.push(String::new());
        lines.push(format!("   (Showing top {} of {} unique paths)", max_lines, stacks.len()));
    }

    lines.join("\n")
}

/// Keep the innermost frames of a long path
fn truncate_left(text: &str, width: usize) -> String {
    let count = text.chars().count();
    if count <= width {
        return text.to_string();
    }
    let tail: String = text.chars().skip(count - (width - 3)).collect();
    format!("...{}", tail)
}
