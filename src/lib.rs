//! EasyProf Studio
//!
//! Decoder and performance analysis for easy_profiler binary captures.
//!
//! This crate provides the core implementation for the `easyprof` CLI:
//!
//! - `parser` decodes all four historical capture layouts into a
//!   read-only `Capture`
//! - `analyzer` answers slowest-event, thread, hotspot and issue queries
//! - `session` holds the one capture currently loaded
//! - `aggregator`, `flamegraph` and `output` produce reports and SVGs
//!
//! ```ignore
//! use easyprof_studio::{session::Session, parser::ReadOptions};
//!
//! let mut session = Session::new();
//! session.load("frame.prof", &ReadOptions::default())?;
//! for event in session.analyzer()?.slowest_events(5) {
//!     println!("{} {:?}", event.name, event.duration);
//! }
//! ```

pub mod aggregator;
pub mod analyzer;
pub mod commands;
pub mod flamegraph;
pub mod output;
pub mod parser;
pub mod session;
pub mod utils;
