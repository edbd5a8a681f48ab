use crate::flamegraph::FlamegraphConfig;
use crate::parser::ReadOptions;
use crate::utils::config::DEFAULT_LIMIT;
use clap::Args;
use std::path::PathBuf;

/// Decode options shared by every command that loads a capture
///
/// **Public** - flattened into each subcommand by main.rs
#[derive(Args, Debug, Clone, Default)]
pub struct DecodeArgs {
    /// Fast preset for large captures (depth 5, every 10th event, no context switches or bookmarks)
    #[arg(long)]
    pub fast: bool,

    /// Deepest nesting level to keep (1 = top-level events only, 0 = unlimited)
    #[arg(long)]
    pub max_depth: Option<usize>,

    /// Keep every Nth top-level event per thread (0 or 1 = all)
    #[arg(long)]
    pub sample_every: Option<usize>,

    /// Consume context switches without decoding them
    #[arg(long)]
    pub skip_context_switches: bool,

    /// Consume bookmarks without decoding them
    #[arg(long)]
    pub skip_bookmarks: bool,

    /// Decode at most this many threads (0 = all)
    #[arg(long)]
    pub max_threads: Option<usize>,
}

impl DecodeArgs {
    /// Start from the preset, then apply explicit flags on top
    pub fn read_options(&self) -> ReadOptions {
        let mut options = if self.fast {
            ReadOptions::fast()
        } else {
            ReadOptions::default()
        };

        if let Some(depth) = self.max_depth {
            options.max_depth = Some(depth);
        }
        if let Some(n) = self.sample_every {
            options.sample_every = Some(n);
        }
        if let Some(n) = self.max_threads {
            options.max_threads = Some(n);
        }
        options.skip_context_switches |= self.skip_context_switches;
        options.skip_bookmarks |= self.skip_bookmarks;
        options
    }
}

/// Arguments for the single-query commands
#[derive(Debug, Clone)]
pub struct QueryArgs {
    /// Capture file to analyze
    pub capture: PathBuf,

    pub decode: DecodeArgs,

    /// Rows for ranked queries
    pub limit: usize,

    /// Print JSON instead of a text table
    pub json: bool,
}

/// Arguments for the report command
///
/// **Public** - used by main.rs to construct from CLI args
#[derive(Debug, Clone)]
pub struct ReportArgs {
    /// Capture file to analyze
    pub capture: PathBuf,

    pub decode: DecodeArgs,

    /// Output path for the JSON report
    pub output_json: PathBuf,

    /// Output path for SVG flamegraph (optional)
    pub output_svg: Option<PathBuf>,

    /// Rows for ranked sections
    pub limit: usize,

    /// Flamegraph configuration
    pub flamegraph_config: Option<FlamegraphConfig>,

    /// Print text summary to stdout
    pub print_summary: bool,
}

impl Default for ReportArgs {
    fn default() -> Self {
        Self {
            capture: PathBuf::new(),
            decode: DecodeArgs::default(),
            output_json: PathBuf::from("report.json"),
            output_svg: None,
            limit: DEFAULT_LIMIT,
            flamegraph_config: None,
            print_summary: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_flags_override_preset() {
        let args = DecodeArgs {
            fast: true,
            max_depth: Some(0),
            max_threads: Some(4),
            ..Default::default()
        };
        let options = args.read_options();
        assert_eq!(options.max_depth, Some(0));
        assert_eq!(options.sample_every, ReadOptions::fast().sample_every);
        assert_eq!(options.max_threads, Some(4));
        assert!(options.skip_context_switches);
    }

    #[test]
    fn test_default_reads_everything() {
        assert!(DecodeArgs::default().read_options().is_complete());

        let args = DecodeArgs {
            skip_bookmarks: true,
            ..Default::default()
        };
        assert!(!args.read_options().is_complete());
    }
}
