//! Synthetic capture writer shared by the integration tests.
//!
//! Produces byte-exact captures for every header layout so the decoder can
//! be exercised without real profiler output.

#![allow(dead_code)]

use easyprof_studio::utils::config::CAPTURE_SIGNATURE;
use std::io::Write;
use tempfile::NamedTempFile;

pub const V0_1_0: u32 = 0x0001_0000;
pub const V1_3_0: u32 = 0x0103_0000;
pub const V2_0_0: u32 = 0x0200_0000;
pub const V2_1_0: u32 = 0x0201_0000;

pub const MS: u64 = 1_000_000;

/// Size of a v2.1.0 header in bytes
pub const COUNTED_HEADER_BYTES: usize = 4 + 4 + 8 + 8 + 8 + 8 + 8 + 8 + 4 + 4 + 4 + 2 + 2;

#[derive(Debug, Clone)]
pub struct EventSpec {
    pub begin: u64,
    pub end: u64,
    pub descriptor_id: u32,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct ThreadSpec {
    pub id: u64,
    pub name: String,
    pub switches: Vec<(u64, u64, u64, String)>,
    pub events: Vec<EventSpec>,
}

impl ThreadSpec {
    pub fn new(id: u64, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            switches: Vec::new(),
            events: Vec::new(),
        }
    }

    pub fn event(mut self, begin: u64, end: u64, descriptor_id: u32) -> Self {
        self.events.push(EventSpec {
            begin,
            end,
            descriptor_id,
            name: String::new(),
        });
        self
    }

    pub fn named_event(mut self, begin: u64, end: u64, descriptor_id: u32, name: &str) -> Self {
        self.events.push(EventSpec {
            begin,
            end,
            descriptor_id,
            name: name.to_string(),
        });
        self
    }

    pub fn switch(mut self, target: u64, begin: u64, end: u64, name: &str) -> Self {
        self.switches.push((target, begin, end, name.to_string()));
        self
    }

    pub fn switches(mut self, count: u64) -> Self {
        let id = self.id;
        for i in 0..count {
            self = self.switch(id, i * 10, i * 10 + 5, "");
        }
        self
    }
}

#[derive(Debug, Clone)]
pub struct CaptureWriter {
    pub version: u32,
    pub pid: u64,
    pub cpu_frequency: i64,
    pub begin: u64,
    pub end: u64,
    pub memory_size: u64,
    pub padding: u16,
    descriptors: Vec<(u32, String, String, i32, u8)>,
    threads: Vec<ThreadSpec>,
    bookmarks: Vec<(u64, u32, String)>,
    thread_terminator: Option<u32>,
    bookmark_terminator: u32,
}

impl CaptureWriter {
    pub fn new(version: u32) -> Self {
        Self {
            version,
            pid: 1234,
            cpu_frequency: 1_000_000_000,
            begin: 0,
            end: 1000 * MS,
            memory_size: 2 * 1024 * 1024,
            padding: 0,
            descriptors: Vec::new(),
            threads: Vec::new(),
            bookmarks: Vec::new(),
            thread_terminator: Some(CAPTURE_SIGNATURE),
            bookmark_terminator: CAPTURE_SIGNATURE,
        }
    }

    pub fn span(mut self, begin: u64, end: u64) -> Self {
        self.begin = begin;
        self.end = end;
        self
    }

    pub fn descriptor(mut self, id: u32, name: &str, file: &str, line: i32) -> Self {
        self.descriptors
            .push((id, name.to_string(), file.to_string(), line, 1));
        self
    }

    pub fn descriptor_kind(mut self, id: u32, name: &str, kind: u8) -> Self {
        self.descriptors
            .push((id, name.to_string(), String::new(), 0, kind));
        self
    }

    pub fn thread(mut self, thread: ThreadSpec) -> Self {
        self.threads.push(thread);
        self
    }

    pub fn bookmark(mut self, position: u64, color: u32, text: &str) -> Self {
        self.bookmarks.push((position, color, text.to_string()));
        self
    }

    /// End the thread section at end of stream instead of the signature
    pub fn without_thread_terminator(mut self) -> Self {
        self.thread_terminator = None;
        self
    }

    pub fn thread_terminator(mut self, value: u32) -> Self {
        self.thread_terminator = Some(value);
        self
    }

    pub fn bookmark_terminator(mut self, value: u32) -> Self {
        self.bookmark_terminator = value;
        self
    }

    pub fn events_count(&self) -> usize {
        self.threads.iter().map(|t| t.events.len()).sum()
    }

    pub fn bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.write_header(&mut out);

        for (id, name, file, line, kind) in &self.descriptors {
            let name = terminated(name);
            let file = terminated(file);
            put_u16(&mut out, (16 + name.len() + file.len()) as u16);
            put_u32(&mut out, *id);
            out.extend_from_slice(&line.to_le_bytes());
            put_u32(&mut out, 0xff00_ff00); // color
            out.push(*kind);
            out.push(1); // status
            put_u16(&mut out, name.len() as u16);
            out.extend_from_slice(&name);
            out.extend_from_slice(&file);
        }

        let wide = self.version >= V1_3_0;
        for thread in &self.threads {
            if wide {
                put_u64(&mut out, thread.id);
            } else {
                put_u32(&mut out, thread.id as u32);
            }

            put_u16(&mut out, thread.name.len() as u16);
            out.extend_from_slice(thread.name.as_bytes());

            put_u32(&mut out, thread.switches.len() as u32);
            for (target, begin, end, name) in &thread.switches {
                let name = terminated(name);
                put_u16(&mut out, (24 + name.len()) as u16);
                put_u64(&mut out, *target);
                put_u64(&mut out, *begin);
                put_u64(&mut out, *end);
                out.extend_from_slice(&name);
            }

            put_u32(&mut out, thread.events.len() as u32);
            for event in &thread.events {
                let name = terminated(&event.name);
                put_u16(&mut out, (20 + name.len()) as u16);
                put_u64(&mut out, event.begin);
                put_u64(&mut out, event.end);
                put_u32(&mut out, event.descriptor_id);
                out.extend_from_slice(&name);
            }
        }

        if let Some(terminator) = self.thread_terminator {
            if self.version >= V2_1_0 || !wide {
                put_u32(&mut out, terminator);
            } else {
                put_u64(&mut out, u64::from(terminator));
            }
        }

        if self.version >= V2_1_0 && !self.bookmarks.is_empty() {
            for (position, color, text) in &self.bookmarks {
                let text = terminated(text);
                put_u16(&mut out, (12 + text.len()) as u16);
                put_u64(&mut out, *position);
                put_u32(&mut out, *color);
                out.extend_from_slice(&text);
            }
            put_u32(&mut out, self.bookmark_terminator);
        }

        out
    }

    /// Write the capture to a temporary `.prof` file
    pub fn write_temp(&self) -> NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".prof")
            .tempfile()
            .expect("create temp capture");
        file.write_all(&self.bytes()).expect("write temp capture");
        file.flush().expect("flush temp capture");
        file
    }

    fn write_header(&self, out: &mut Vec<u8>) {
        let blocks = self.events_count() as u32;
        let descriptors = self.descriptors.len() as u32;

        put_u32(out, CAPTURE_SIGNATURE);
        put_u32(out, self.version);

        if self.version < V1_3_0 {
            put_u32(out, self.pid as u32);
        } else {
            put_u64(out, self.pid);
        }
        out.extend_from_slice(&self.cpu_frequency.to_le_bytes());
        put_u64(out, self.begin);
        put_u64(out, self.end);

        if self.version < V2_0_0 {
            put_u32(out, blocks);
            put_u64(out, self.memory_size);
            put_u32(out, descriptors);
            put_u64(out, 0); // descriptors memory size
        } else {
            put_u64(out, self.memory_size);
            put_u64(out, 0);
            put_u32(out, blocks);
            put_u32(out, descriptors);
        }

        if self.version >= V2_1_0 {
            put_u32(out, self.threads.len() as u32);
            put_u16(out, self.bookmarks.len() as u16);
            put_u16(out, self.padding);
        }
    }
}

fn terminated(text: &str) -> Vec<u8> {
    if text.is_empty() {
        return Vec::new();
    }
    let mut bytes = text.as_bytes().to_vec();
    bytes.push(0);
    bytes
}

fn put_u16(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn put_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn put_u64(out: &mut Vec<u8>, value: u64) {
    out.extend_from_slice(&value.to_le_bytes());
}
