//! Capture decoder.
//!
//! Decodes a capture in one pass: header, descriptor table, thread
//! section, bookmarks. Any failure aborts the whole decode and the partial
//! model is dropped; errors carry the section and record that failed.
//!
//! Thread section quirks:
//! - Before v2.1.0 the header carries no thread count. Thread ids are read
//!   until one whose low 32 bits equal the capture signature (the section
//!   terminator read through the id field), or until the stream ends at an
//!   id boundary. A real thread whose id collides with the signature ends
//!   the list early; that is how the format behaves and is kept as is.
//! - Thread names are raw bytes without a terminator, unlike every other
//!   string in the file.
//! - Events are stored as a flat, size-prefixed sequence per thread. Nesting
//!   is rebuilt from time containment (see `ForestBuilder`).

use super::cursor::ByteCursor;
use super::header::{read_header, FormatTier};
use super::options::ReadOptions;
use super::schema::{Block, BlockKind, Bookmark, Capture, ContextSwitch, Descriptor, Thread};
use crate::utils::config::{
    BOOKMARKS_TERMINATOR, BOOKMARK_FIXED_BYTES, CAPTURE_SIGNATURE, CONTEXT_SWITCH_FIXED_BYTES,
    DESCRIPTOR_FIXED_BYTES, EVENT_FIXED_BYTES, LARGE_CAPTURE_BYTES,
};
use crate::utils::error::{DecodeContext, DecodeError};
use log::{debug, info, warn};
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

/// Decode a capture from any seekable source
///
/// **Public** - main entry point for decoding
///
/// # Errors
/// * `DecodeError::ShortRead` - a field or record runs past the end of the stream
/// * `DecodeError::InvalidSignature` / `UnsupportedVersion` - not a readable capture
/// * `DecodeError::InconsistentSize` - a record's declared size is smaller than its fields
/// * `DecodeError::InvalidTerminator` - a section does not end with the signature
pub fn decode<R: Read + Seek>(source: R, options: &ReadOptions) -> Result<Capture, DecodeError> {
    let mut cursor = ByteCursor::new(source)?;
    let (header, tier) = read_header(&mut cursor).within(|| "header")?;

    let mut decoder = CaptureDecoder {
        cursor,
        options,
        tier,
        capture: Capture {
            header,
            ..Default::default()
        },
        threads_decoded: 0,
        threads_skipped: 0,
        negative_durations: 0,
    };

    decoder.read_descriptors().within(|| "descriptors")?;
    decoder.read_threads().within(|| "threads")?;
    decoder.read_bookmarks().within(|| "bookmarks")?;

    Ok(decoder.finish())
}

/// Open and decode a capture file
///
/// **Public** - convenience wrapper around `decode`
pub fn decode_file(path: impl AsRef<Path>, options: &ReadOptions) -> Result<Capture, DecodeError> {
    let path = path.as_ref();
    info!("Decoding capture: {}", path.display());

    let file = File::open(path)
        .map_err(|e| DecodeError::from(e).within(format!("open {}", path.display())))?;

    let size = file.metadata()?.len();
    if size > LARGE_CAPTURE_BYTES && options.is_complete() {
        info!(
            "Capture is {:.1} MiB; fast read options (--fast) bound decode time and memory",
            size as f64 / (1024.0 * 1024.0)
        );
    }

    decode(BufReader::new(file), options)
}

/// Single-use decoding state
struct CaptureDecoder<'o, R> {
    cursor: ByteCursor<R>,
    options: &'o ReadOptions,
    tier: FormatTier,
    capture: Capture,
    threads_decoded: usize,
    threads_skipped: usize,
    negative_durations: usize,
}

impl<R: Read + Seek> CaptureDecoder<'_, R> {
    fn finish(mut self) -> Capture {
        if self.negative_durations > 0 {
            warn!(
                "{} events end before they begin; their durations read as zero",
                self.negative_durations
            );
        }
        if self.threads_skipped > 0 {
            info!(
                "Thread limit reached: decoded {} threads, skipped {}",
                self.threads_decoded, self.threads_skipped
            );
        }

        self.capture.finalize();
        debug!(
            "Decoded {} threads, {} events, {} descriptors, {} bookmarks",
            self.capture.threads.len(),
            self.capture.total_blocks_count,
            self.capture.descriptors.len(),
            self.capture.bookmarks.len()
        );
        self.capture
    }

    // ---------------------------------------------------------------------
    // Descriptors
    // ---------------------------------------------------------------------

    fn read_descriptors(&mut self) -> Result<(), DecodeError> {
        let count = self.capture.header.descriptors_count;
        debug!("Reading {} descriptors", count);

        for i in 0..count {
            let descriptor = self
                .read_descriptor()
                .within(|| format!("descriptor {}", i))?;
            self.capture.descriptors.insert(descriptor.id, descriptor);
        }
        Ok(())
    }

    fn read_descriptor(&mut self) -> Result<Descriptor, DecodeError> {
        let size = self.cursor.read_u16()?;
        let id = self.cursor.read_u32()?;
        let line = self.cursor.read_i32()?;
        let color = self.cursor.read_u32()?;
        let kind = BlockKind::from(self.cursor.read_u8()?);
        let status = self.cursor.read_u8()?;
        let name_length = self.cursor.read_u16()?;

        let file_length = remaining_size(
            "descriptor",
            size,
            DESCRIPTOR_FIXED_BYTES + u32::from(name_length),
        )?;
        let name = terminated_text(self.cursor.read_bytes(usize::from(name_length))?);
        let file = terminated_text(self.cursor.read_bytes(file_length)?);

        Ok(Descriptor {
            id,
            line,
            color,
            kind,
            status,
            name,
            file,
        })
    }

    // ---------------------------------------------------------------------
    // Threads
    // ---------------------------------------------------------------------

    fn read_threads(&mut self) -> Result<(), DecodeError> {
        match self.capture.header.threads_count {
            Some(count) => self.read_counted_threads(count),
            None => self.read_sentinel_threads(),
        }
    }

    /// v2.1.0+: declared count, then the signature as terminator
    fn read_counted_threads(&mut self, count: u32) -> Result<(), DecodeError> {
        debug!("Reading {} threads", count);

        for i in 0..count {
            let id = self
                .cursor
                .read_u64()
                .within(|| format!("thread {} of {}", i, count))?;
            self.read_thread(id)?;
        }

        // A stream that ends right after the last declared thread is complete
        match self.cursor.try_read_u32()? {
            None => {
                debug!("Thread section ends at end of stream");
                Ok(())
            }
            Some(CAPTURE_SIGNATURE) => Ok(()),
            Some(found) => Err(DecodeError::InvalidTerminator {
                section: "thread",
                found,
            }),
        }
    }

    /// Pre-v2.1.0: ids until the signature sentinel or end of stream
    fn read_sentinel_threads(&mut self) -> Result<(), DecodeError> {
        debug!("Reading threads until signature sentinel");

        while let Some(id) = self.next_thread_id()? {
            if id as u32 == CAPTURE_SIGNATURE {
                debug!("Thread list terminated by signature sentinel");
                return Ok(());
            }
            self.read_thread(id)?;
        }

        debug!("Thread list ended at end of stream");
        Ok(())
    }

    fn next_thread_id(&mut self) -> Result<Option<u64>, DecodeError> {
        if !self.tier.wide_thread_ids() {
            return Ok(self.cursor.try_read_u32()?.map(u64::from));
        }

        // Some writers end a wide-id list with a bare 32-bit signature
        if self.cursor.remaining() == 4 {
            let tail = self.cursor.read_u32()?;
            if tail == CAPTURE_SIGNATURE {
                debug!("Thread list terminated by 32-bit signature at end of stream");
                return Ok(Some(u64::from(tail)));
            }
            return Err(DecodeError::ShortRead {
                offset: self.cursor.position() - 4,
                needed: 8,
                available: 4,
            });
        }
        self.cursor.try_read_u64()
    }

    fn read_thread(&mut self, id: u64) -> Result<(), DecodeError> {
        let keep = self
            .options
            .effective_max_threads()
            .map_or(true, |cap| self.threads_decoded < cap);

        if !keep {
            self.threads_skipped += 1;
            return self.skip_thread().within(|| format!("thread {}", id));
        }

        let thread = self.decode_thread(id).within(|| format!("thread {}", id))?;
        debug!(
            "Thread {} '{}': {} events, {} context switches",
            id,
            thread.name,
            thread.block_count(),
            thread.context_switches.len()
        );

        if self.capture.threads.insert(id, thread).is_some() {
            warn!("Duplicate thread id {}; keeping the later record", id);
        }
        self.threads_decoded += 1;
        Ok(())
    }

    fn decode_thread(&mut self, id: u64) -> Result<Thread, DecodeError> {
        let name_length = self.cursor.read_u16()?;
        let name = String::from_utf8_lossy(&self.cursor.read_bytes(usize::from(name_length))?)
            .into_owned();

        let switches_count = self.cursor.read_u32()?;
        let mut context_switches = Vec::new();
        if self.options.skip_context_switches {
            self.skip_records(switches_count)
                .within(|| "context switches")?;
        } else {
            for i in 0..switches_count {
                let switch = self
                    .read_context_switch()
                    .within(|| format!("context switch {}", i))?;
                context_switches.push(switch);
            }
        }

        let blocks_count = self.cursor.read_u32()?;
        let mut forest = ForestBuilder::default();
        for i in 0..blocks_count {
            let block = self.read_block().within(|| format!("event {}", i))?;
            forest.push(block);
        }

        Ok(Thread {
            id,
            name,
            context_switches,
            blocks: self.shape(forest.finish()),
        })
    }

    fn skip_thread(&mut self) -> Result<(), DecodeError> {
        let name_length = self.cursor.read_u16()?;
        self.cursor.skip(u64::from(name_length))?;

        let switches_count = self.cursor.read_u32()?;
        self.skip_records(switches_count)
            .within(|| "context switches")?;

        let blocks_count = self.cursor.read_u32()?;
        self.skip_records(blocks_count).within(|| "events")
    }

    fn read_context_switch(&mut self) -> Result<ContextSwitch, DecodeError> {
        let size = self.cursor.read_u16()?;
        let name_length = remaining_size("context switch", size, CONTEXT_SWITCH_FIXED_BYTES)?;

        Ok(ContextSwitch {
            thread_id: self.cursor.read_u64()?,
            begin: self.cursor.read_u64()?,
            end: self.cursor.read_u64()?,
            name: terminated_text(self.cursor.read_bytes(name_length)?),
        })
    }

    fn read_block(&mut self) -> Result<Block, DecodeError> {
        let size = self.cursor.read_u16()?;
        let name_length = remaining_size("event", size, EVENT_FIXED_BYTES)?;

        let begin = self.cursor.read_u64()?;
        let end = self.cursor.read_u64()?;
        let descriptor_id = self.cursor.read_u32()?;
        // Non-terminated runtime names are kept verbatim
        let name = terminated_text(self.cursor.read_bytes(name_length)?);

        if end < begin {
            self.negative_durations += 1;
        }

        Ok(Block::new(begin, end, descriptor_id).with_name(name))
    }

    /// Apply sampling and depth limits to a rebuilt forest
    fn shape(&self, mut blocks: Vec<Block>) -> Vec<Block> {
        if let Some(n) = self.options.effective_sample_every() {
            blocks = blocks.into_iter().step_by(n).collect();
        }
        if let Some(depth) = self.options.effective_max_depth() {
            prune_depth(&mut blocks, depth);
        }
        blocks
    }

    // ---------------------------------------------------------------------
    // Bookmarks
    // ---------------------------------------------------------------------

    fn read_bookmarks(&mut self) -> Result<(), DecodeError> {
        let count = match self.capture.header.bookmarks_count {
            Some(count) if count > 0 => count,
            _ => return Ok(()),
        };

        if self.options.skip_bookmarks {
            debug!("Skipping {} bookmarks", count);
            return self.skip_records(u32::from(count));
        }

        debug!("Reading {} bookmarks", count);
        for i in 0..count {
            let bookmark = self.read_bookmark().within(|| format!("bookmark {}", i))?;
            self.capture.bookmarks.push(bookmark);
        }

        let found = self.cursor.read_u32()?;
        if found != BOOKMARKS_TERMINATOR {
            return Err(DecodeError::InvalidTerminator {
                section: "bookmarks",
                found,
            });
        }
        Ok(())
    }

    fn read_bookmark(&mut self) -> Result<Bookmark, DecodeError> {
        let size = self.cursor.read_u16()?;
        let text_length = remaining_size("bookmark", size, BOOKMARK_FIXED_BYTES)?;

        Ok(Bookmark {
            position: self.cursor.read_u64()?,
            color: self.cursor.read_u32()?,
            text: terminated_text(self.cursor.read_bytes(text_length)?),
        })
    }

    /// Consume `count` size-prefixed records without decoding them
    fn skip_records(&mut self, count: u32) -> Result<(), DecodeError> {
        for i in 0..count {
            let size = self.cursor.read_u16()?;
            self.cursor
                .skip(u64::from(size))
                .within(|| format!("record {}", i))?;
        }
        Ok(())
    }
}

/// Bytes left in a record after its fixed fields
fn remaining_size(record: &'static str, declared: u16, required: u32) -> Result<usize, DecodeError> {
    u32::from(declared)
        .checked_sub(required)
        .map(|n| n as usize)
        .ok_or(DecodeError::InconsistentSize {
            record,
            declared,
            required,
        })
}

/// Decode a string stored with a trailing NUL, tolerating a missing one
fn terminated_text(mut bytes: Vec<u8>) -> String {
    if bytes.last() == Some(&0) {
        bytes.pop();
    }
    String::from_utf8_lossy(&bytes).into_owned()
}

/// Drop everything nested deeper than `depth` levels (1 = roots only)
fn prune_depth(blocks: &mut [Block], depth: usize) {
    let mut pending: Vec<(&mut Block, usize)> = blocks.iter_mut().map(|b| (b, 1)).collect();
    while let Some((block, level)) = pending.pop() {
        if level >= depth {
            block.children.clear();
        } else {
            pending.extend(block.children.iter_mut().map(|c| (c, level + 1)));
        }
    }
}

/// Rebuilds event nesting from a thread's flat record sequence
///
/// Writers that emit a block when it closes put children before their
/// parent, so a new event adopts the trailing roots it encloses. Writers
/// that emit on open put the parent first, so an event enclosed by the
/// latest root is nested under that root's deepest enclosing descendant.
/// Events that do not overlap stay siblings, and so do events with
/// identical ranges (see `Block::encloses`).
#[derive(Debug, Default)]
struct ForestBuilder {
    roots: Vec<Block>,
}

impl ForestBuilder {
    fn push(&mut self, mut block: Block) {
        let mut split = self.roots.len();
        while split > 0 && block.encloses(&self.roots[split - 1]) {
            split -= 1;
        }
        if split < self.roots.len() {
            block.children.extend(self.roots.drain(split..));
            self.roots.push(block);
            return;
        }

        match self.roots.last_mut() {
            Some(last) if last.encloses(&block) => nest_under(last, block),
            _ => self.roots.push(block),
        }
    }

    fn finish(self) -> Vec<Block> {
        self.roots
    }
}

/// Follow the chain of last children that enclose `block`, then attach it
fn nest_under(mut parent: &mut Block, block: Block) {
    while parent
        .children
        .last()
        .map_or(false, |last| last.encloses(&block))
    {
        let last = parent.children.len() - 1;
        parent = &mut parent.children[last];
    }
    parent.children.push(block);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::schema::count_blocks;

    fn rebuild(blocks: Vec<Block>) -> Vec<Block> {
        let mut forest = ForestBuilder::default();
        for block in blocks {
            forest.push(block);
        }
        forest.finish()
    }

    #[test]
    fn test_disjoint_events_stay_flat() {
        let roots = rebuild(vec![
            Block::new(0, 10, 1),
            Block::new(10, 20, 1),
            Block::new(25, 30, 1),
        ]);
        assert_eq!(roots.len(), 3);
        assert!(roots.iter().all(|b| b.children.is_empty()));
    }

    #[test]
    fn test_close_order_children_first() {
        // grandchild, child, sibling child, parent
        let roots = rebuild(vec![
            Block::new(40, 50, 3),
            Block::new(30, 60, 2),
            Block::new(70, 80, 2),
            Block::new(0, 100, 1),
        ]);
        assert_eq!(roots.len(), 1);
        assert_eq!(roots[0].children.len(), 2);
        assert_eq!(roots[0].children[0].children[0].begin, 40);
        assert_eq!(count_blocks(&roots), 4);
    }

    #[test]
    fn test_open_order_parent_first() {
        let roots = rebuild(vec![
            Block::new(0, 100, 1),
            Block::new(30, 60, 2),
            Block::new(40, 50, 3),
            Block::new(70, 80, 2),
            Block::new(200, 210, 1),
        ]);
        assert_eq!(roots.len(), 2);
        assert_eq!(roots[0].children.len(), 2);
        assert_eq!(roots[0].children[0].children.len(), 1);
        assert_eq!(count_blocks(&roots), 5);
    }

    #[test]
    fn test_coincident_instants_stay_siblings() {
        let roots = rebuild((0..5).map(|_| Block::new(5, 5, 1)).collect());
        assert_eq!(roots.len(), 5);
        assert!(roots.iter().all(|b| b.children.is_empty()));
    }

    #[test]
    fn test_identical_ranges_stay_siblings() {
        let roots = rebuild(vec![
            Block::new(0, 10, 1),
            Block::new(0, 10, 2),
            Block::new(2, 4, 3),
        ]);
        assert_eq!(roots.len(), 2);
        assert!(roots[0].children.is_empty());
        assert_eq!(roots[1].children.len(), 1);
    }

    #[test]
    fn test_instant_inside_span_nests() {
        let roots = rebuild(vec![
            Block::new(0, 10, 1),
            Block::new(5, 5, 2),
            Block::new(5, 5, 2),
        ]);
        assert_eq!(roots.len(), 1);
        assert_eq!(roots[0].children.len(), 2);
        assert!(roots[0].children.iter().all(|b| b.children.is_empty()));
    }

    #[test]
    fn test_deep_open_order_nesting() {
        let depth = 5_000u64;
        let roots = rebuild((0..depth).map(|i| Block::new(i, 2 * depth - i, 1)).collect());
        assert_eq!(roots.len(), 1);
        assert_eq!(count_blocks(&roots), depth as usize);
    }

    #[test]
    fn test_deep_close_order_prunes() {
        let depth = 100_000u64;
        let mut roots = rebuild((1..=depth).map(|i| Block::new(depth - i, depth + i, 1)).collect());
        assert_eq!(roots.len(), 1);
        assert_eq!(count_blocks(&roots), depth as usize);

        prune_depth(&mut roots, 3);
        assert_eq!(count_blocks(&roots), 3);
    }

    #[test]
    fn test_prune_depth() {
        let mut roots = rebuild(vec![
            Block::new(40, 50, 3),
            Block::new(30, 60, 2),
            Block::new(0, 100, 1),
        ]);
        prune_depth(&mut roots, 2);
        assert_eq!(count_blocks(&roots), 2);
        prune_depth(&mut roots, 1);
        assert_eq!(count_blocks(&roots), 1);
    }

    #[test]
    fn test_terminated_text() {
        assert_eq!(terminated_text(b"main\0".to_vec()), "main");
        assert_eq!(terminated_text(b"raw".to_vec()), "raw");
        assert_eq!(terminated_text(Vec::new()), "");
    }

    #[test]
    fn test_remaining_size_rejects_underflow() {
        assert_eq!(remaining_size("event", 25, 20).unwrap(), 5);
        assert!(matches!(
            remaining_size("descriptor", 10, 16),
            Err(DecodeError::InconsistentSize {
                record: "descriptor",
                declared: 10,
                required: 16
            })
        ));
    }
}
