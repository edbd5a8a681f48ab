//! Sequential little-endian reader over a seekable byte source.
//!
//! The stream length is measured once up front so every read and skip can
//! check the remaining byte count before touching the source. A request for
//! more bytes than remain fails with `DecodeError::ShortRead` without
//! consuming anything, and `skip` never seeks past the end.

use crate::utils::error::DecodeError;
use std::io::{Read, Seek, SeekFrom};

/// Little-endian cursor over `R`
#[derive(Debug)]
pub struct ByteCursor<R> {
    inner: R,
    position: u64,
    len: u64,
}

macro_rules! read_le {
    ($($name:ident => $ty:ty),* $(,)?) => {
        $(
            #[doc = concat!("Read a little-endian `", stringify!($ty), "`")]
            pub fn $name(&mut self) -> Result<$ty, DecodeError> {
                let mut buf = [0u8; std::mem::size_of::<$ty>()];
                self.fill(&mut buf)?;
                Ok(<$ty>::from_le_bytes(buf))
            }
        )*
    };
}

impl<R: Read + Seek> ByteCursor<R> {
    /// Wrap a source, measuring its length from the current position
    pub fn new(mut inner: R) -> Result<Self, DecodeError> {
        let position = inner.stream_position()?;
        let len = inner.seek(SeekFrom::End(0))?;
        inner.seek(SeekFrom::Start(position))?;
        Ok(Self {
            inner,
            position,
            len,
        })
    }

    /// Bytes consumed from the start of the source
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Bytes left before end-of-stream
    pub fn remaining(&self) -> u64 {
        self.len.saturating_sub(self.position)
    }

    /// True once every byte has been consumed
    pub fn is_at_end(&self) -> bool {
        self.remaining() == 0
    }

    read_le! {
        read_u8 => u8,
        read_u16 => u16,
        read_u32 => u32,
        read_i32 => i32,
        read_u64 => u64,
        read_i64 => i64,
    }

    /// Read a `u32`, or `None` when the stream ends exactly here
    pub fn try_read_u32(&mut self) -> Result<Option<u32>, DecodeError> {
        if self.is_at_end() {
            return Ok(None);
        }
        self.read_u32().map(Some)
    }

    /// Read a `u64`, or `None` when the stream ends exactly here
    pub fn try_read_u64(&mut self) -> Result<Option<u64>, DecodeError> {
        if self.is_at_end() {
            return Ok(None);
        }
        self.read_u64().map(Some)
    }

    /// Read exactly `n` raw bytes
    pub fn read_bytes(&mut self, n: usize) -> Result<Vec<u8>, DecodeError> {
        self.ensure(n as u64)?;
        let mut buf = vec![0u8; n];
        self.inner.read_exact(&mut buf)?;
        self.position += n as u64;
        Ok(buf)
    }

    /// Advance `n` bytes without materialising them
    pub fn skip(&mut self, n: u64) -> Result<(), DecodeError> {
        self.ensure(n)?;
        let offset = i64::try_from(n).map_err(|_| DecodeError::ShortRead {
            offset: self.position,
            needed: n,
            available: self.remaining(),
        })?;
        self.inner.seek(SeekFrom::Current(offset))?;
        self.position += n;
        Ok(())
    }

    fn fill(&mut self, buf: &mut [u8]) -> Result<(), DecodeError> {
        self.ensure(buf.len() as u64)?;
        self.inner.read_exact(buf)?;
        self.position += buf.len() as u64;
        Ok(())
    }

    fn ensure(&self, needed: u64) -> Result<(), DecodeError> {
        let available = self.remaining();
        if needed > available {
            return Err(DecodeError::ShortRead {
                offset: self.position,
                needed,
                available,
            });
        }
        Ok(())
    }
}
