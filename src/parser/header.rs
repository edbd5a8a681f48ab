//! File header decoding.
//!
//! Four historical header layouts exist. The version read right after the
//! signature selects a `FormatTier`, and each tier is a static list of
//! fields decoded in order. Everything downstream (thread id width,
//! presence of a thread count, bookmarks) asks the tier instead of
//! comparing raw versions.

use super::cursor::ByteCursor;
use super::schema::Header;
use crate::utils::config::{
    CAPTURE_SIGNATURE, MIN_COMPATIBLE_VERSION, VERSION_1_3_0, VERSION_2_0_0, VERSION_2_1_0,
};
use crate::utils::error::DecodeError;
use log::{debug, warn};
use std::io::{Read, Seek};

/// Header layout family
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FormatTier {
    /// v0.1.0 up to v1.3.0: 32-bit pid and thread ids
    Legacy,
    /// v1.3.0 up to v2.0.0: 64-bit pid and thread ids
    Wide,
    /// v2.0.0 up to v2.1.0: memory sizes move ahead of the counts
    Reordered,
    /// v2.1.0+: thread and bookmark counts in the header
    Counted,
}

/// One field of the header, in on-disk order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HeaderField {
    Pid32,
    Pid64,
    CpuFrequency,
    BeginTime,
    EndTime,
    MemorySize,
    DescriptorsMemorySize,
    BlocksCount,
    DescriptorsCount,
    ThreadsCount,
    BookmarksCount,
    Padding,
}

use HeaderField::*;

const LEGACY_LAYOUT: &[HeaderField] = &[
    Pid32,
    CpuFrequency,
    BeginTime,
    EndTime,
    BlocksCount,
    MemorySize,
    DescriptorsCount,
    DescriptorsMemorySize,
];

const WIDE_LAYOUT: &[HeaderField] = &[
    Pid64,
    CpuFrequency,
    BeginTime,
    EndTime,
    BlocksCount,
    MemorySize,
    DescriptorsCount,
    DescriptorsMemorySize,
];

const REORDERED_LAYOUT: &[HeaderField] = &[
    Pid64,
    CpuFrequency,
    BeginTime,
    EndTime,
    MemorySize,
    DescriptorsMemorySize,
    BlocksCount,
    DescriptorsCount,
];

const COUNTED_LAYOUT: &[HeaderField] = &[
    Pid64,
    CpuFrequency,
    BeginTime,
    EndTime,
    MemorySize,
    DescriptorsMemorySize,
    BlocksCount,
    DescriptorsCount,
    ThreadsCount,
    BookmarksCount,
    Padding,
];

impl FormatTier {
    /// Tier for a packed version, or `UnsupportedVersion` below the floor
    pub fn from_version(version: u32) -> Result<Self, DecodeError> {
        match version {
            v if v < MIN_COMPATIBLE_VERSION => Err(DecodeError::UnsupportedVersion(v)),
            v if v < VERSION_1_3_0 => Ok(FormatTier::Legacy),
            v if v < VERSION_2_0_0 => Ok(FormatTier::Wide),
            v if v < VERSION_2_1_0 => Ok(FormatTier::Reordered),
            _ => Ok(FormatTier::Counted),
        }
    }

    fn layout(self) -> &'static [HeaderField] {
        match self {
            FormatTier::Legacy => LEGACY_LAYOUT,
            FormatTier::Wide => WIDE_LAYOUT,
            FormatTier::Reordered => REORDERED_LAYOUT,
            FormatTier::Counted => COUNTED_LAYOUT,
        }
    }

    /// Thread ids are 64-bit from v1.3.0 on
    pub fn wide_thread_ids(self) -> bool {
        self >= FormatTier::Wide
    }

    /// Only v2.1.0+ declares thread and bookmark counts
    pub fn has_counts(self) -> bool {
        self == FormatTier::Counted
    }
}

/// Read signature, version and the tier's field list
pub fn read_header<R: Read + Seek>(
    cursor: &mut ByteCursor<R>,
) -> Result<(Header, FormatTier), DecodeError> {
    let signature = cursor.read_u32()?;
    if signature != CAPTURE_SIGNATURE {
        return Err(DecodeError::InvalidSignature {
            found: signature,
            expected: CAPTURE_SIGNATURE,
        });
    }

    let version = cursor.read_u32()?;
    let tier = FormatTier::from_version(version)?;
    debug!("Capture version 0x{:08X} uses {:?} header layout", version, tier);

    let mut header = Header {
        signature,
        version,
        ..Default::default()
    };

    for &field in tier.layout() {
        match field {
            Pid32 => header.pid = u64::from(cursor.read_u32()?),
            Pid64 => header.pid = cursor.read_u64()?,
            CpuFrequency => header.cpu_frequency = cursor.read_i64()?,
            BeginTime => header.begin_time = cursor.read_u64()?,
            EndTime => header.end_time = cursor.read_u64()?,
            MemorySize => header.memory_size = cursor.read_u64()?,
            DescriptorsMemorySize => header.descriptors_memory_size = cursor.read_u64()?,
            BlocksCount => header.blocks_count = cursor.read_u32()?,
            DescriptorsCount => header.descriptors_count = cursor.read_u32()?,
            ThreadsCount => header.threads_count = Some(cursor.read_u32()?),
            BookmarksCount => header.bookmarks_count = Some(cursor.read_u16()?),
            Padding => header.padding = cursor.read_u16()?,
        }
    }

    if header.padding != 0 {
        warn!("Header padding is 0x{:04X}, expected zero", header.padding);
    }

    Ok((header, tier))
}
