//! Single-capture analysis session.
//!
//! A session holds at most one decoded capture. Loading replaces it
//! wholesale, and only once the new capture has decoded successfully;
//! a failed load leaves the previous capture in place.

use crate::analyzer::{Analyzer, CaptureSummary};
use crate::parser::{decode, decode_file, Capture, ReadOptions};
use crate::utils::error::SessionError;
use log::info;
use std::io::{Read, Seek};
use std::path::{Path, PathBuf};

#[derive(Debug)]
struct Loaded {
    source: PathBuf,
    options: ReadOptions,
    capture: Capture,
}

/// Owner of the currently loaded capture
#[derive(Debug, Default)]
pub struct Session {
    loaded: Option<Loaded>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a capture file and make it the current capture
    ///
    /// **Public** - the load operation
    ///
    /// # Errors
    /// * `SessionError::Decode` - the file could not be opened or decoded;
    ///   the previously loaded capture (if any) is kept
    pub fn load(
        &mut self,
        path: impl AsRef<Path>,
        options: &ReadOptions,
    ) -> Result<CaptureSummary, SessionError> {
        let path = path.as_ref();
        let capture = decode_file(path, options)?;
        Ok(self.replace(path.to_path_buf(), options, capture))
    }

    /// Same as `load`, from an already open stream
    pub fn load_from<R: Read + Seek>(
        &mut self,
        source: R,
        name: impl Into<PathBuf>,
        options: &ReadOptions,
    ) -> Result<CaptureSummary, SessionError> {
        let capture = decode(source, options)?;
        Ok(self.replace(name.into(), options, capture))
    }

    fn replace(&mut self, source: PathBuf, options: &ReadOptions, capture: Capture) -> CaptureSummary {
        let summary = CaptureSummary::new(&capture, options);
        info!(
            "Loaded {}: {} threads, {} events",
            source.display(),
            summary.threads_count,
            summary.blocks_count
        );

        self.loaded = Some(Loaded {
            source,
            options: options.clone(),
            capture,
        });
        summary
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.is_some()
    }

    /// Drop the current capture
    pub fn unload(&mut self) {
        self.loaded = None;
    }

    pub fn capture(&self) -> Result<&Capture, SessionError> {
        self.current().map(|l| &l.capture)
    }

    /// Query handle over the current capture
    pub fn analyzer(&self) -> Result<Analyzer<'_>, SessionError> {
        self.capture().map(Analyzer::new)
    }

    /// Path (or name) the current capture was loaded from
    pub fn source(&self) -> Result<&Path, SessionError> {
        self.current().map(|l| l.source.as_path())
    }

    pub fn options(&self) -> Result<&ReadOptions, SessionError> {
        self.current().map(|l| &l.options)
    }

    /// Summary of the current capture
    pub fn summary(&self) -> Result<CaptureSummary, SessionError> {
        self.current()
            .map(|l| CaptureSummary::new(&l.capture, &l.options))
    }

    fn current(&self) -> Result<&Loaded, SessionError> {
        self.loaded.as_ref().ok_or(SessionError::NotLoaded)
    }
}
