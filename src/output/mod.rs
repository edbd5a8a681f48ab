//! Output writers for analysis reports and flamegraphs.
//!
//! This module handles writing data to disk:
//! - JSON analysis reports (and reading them back)
//! - SVG flamegraphs

pub mod json;
pub mod svg;

// Re-export main functions
pub use json::{read_report, to_json_string, write_report, AnalysisReport};
pub use svg::write_svg;
