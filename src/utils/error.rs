//! Error types for the entire application.
//!
//! We use `thiserror` for library-style errors with custom types,
//! and `anyhow` for application-level error propagation in main.rs and commands.

use thiserror::Error;

/// Errors that can occur while decoding a capture
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unexpected end of stream at offset {offset}: needed {needed} bytes, {available} available")]
    ShortRead {
        offset: u64,
        needed: u64,
        available: u64,
    },

    #[error("invalid capture signature 0x{found:08X} (expected 0x{expected:08X})")]
    InvalidSignature { found: u32, expected: u32 },

    #[error("unsupported format version 0x{0:08X}")]
    UnsupportedVersion(u32),

    #[error("inconsistent {record} size: declared {declared} bytes, fixed fields need {required}")]
    InconsistentSize {
        record: &'static str,
        declared: u16,
        required: u32,
    },

    #[error("invalid {section} terminator 0x{found:08X}")]
    InvalidTerminator { section: &'static str, found: u32 },

    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<DecodeError>,
    },
}

impl DecodeError {
    /// Wrap this error with the section or record that was being decoded
    pub fn within(self, context: impl Into<String>) -> Self {
        DecodeError::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Innermost error, skipping any `Context` layers
    pub fn root_cause(&self) -> &DecodeError {
        match self {
            DecodeError::Context { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

/// Attach decoding context to a fallible step
pub trait DecodeContext<T> {
    fn within<C, F>(self, context: F) -> Result<T, DecodeError>
    where
        C: Into<String>,
        F: FnOnce() -> C;
}

impl<T> DecodeContext<T> for Result<T, DecodeError> {
    fn within<C, F>(self, context: F) -> Result<T, DecodeError>
    where
        C: Into<String>,
        F: FnOnce() -> C,
    {
        self.map_err(|e| e.within(context()))
    }
}

/// Errors raised by the loaded-capture session
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("No capture loaded. Load a capture first.")]
    NotLoaded,

    #[error("Failed to decode capture: {0}")]
    Decode(#[from] DecodeError),
}

/// Errors that can occur during flamegraph generation
#[derive(Error, Debug)]
pub enum FlamegraphError {
    #[error("Empty stack data")]
    EmptyStacks,

    #[error("Failed to render flamegraph: {0}")]
    RenderFailed(String),
}

/// Errors that can occur during file output
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to write file: {0}")]
    WriteFailed(#[from] std::io::Error),

    #[error("Failed to serialize JSON: {0}")]
    SerializationFailed(#[from] serde_json::Error),

    #[error("Invalid output path: {0}")]
    InvalidPath(String),
}
