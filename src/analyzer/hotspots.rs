//! Hotspot aggregation.
//!
//! Every event (nested ones included) is bucketed by resolved name plus
//! descriptor file and line. Events without a descriptor are bucketed by
//! name alone, so they never merge with a located bucket of the same name.

use super::Resolved;
use crate::parser::schema::{walk_blocks, Capture};
use crate::utils::duration;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Cumulative time for one call site
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hotspot {
    pub name: String,
    pub file: String,
    pub line: i32,

    #[serde(rename = "total_duration_ns", with = "duration::nanos")]
    pub total_duration: Duration,

    pub call_count: usize,

    /// `total_duration / call_count`, rounded down
    #[serde(rename = "avg_duration_ns", with = "duration::nanos")]
    pub avg_duration: Duration,

    /// Share of the capture's wall time, 0 when the capture has no duration
    pub percent_of_total: f64,
}

impl Hotspot {
    /// `name (file:line)` when located, otherwise the bare name
    pub fn location(&self) -> String {
        if self.file.is_empty() {
            self.name.clone()
        } else {
            format!("{} ({}:{})", self.name, self.file, self.line)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum BucketKey<'a> {
    Site {
        name: &'a str,
        file: &'a str,
        line: i32,
    },
    Name(&'a str),
}

/// Aggregate all events and keep the `limit` most expensive buckets
///
/// **Public** - backs `Analyzer::hotspots`
///
/// Buckets are ranked by total duration; equal totals keep first-seen order.
pub fn hotspots(capture: &Capture, limit: usize) -> Vec<Hotspot> {
    let capture_duration = capture.total_duration();
    let mut index: HashMap<BucketKey<'_>, usize> = HashMap::new();
    let mut buckets: Vec<Hotspot> = Vec::new();

    for thread in capture.threads.values() {
        walk_blocks(&thread.blocks, &mut |block, _| {
            let resolved = Resolved::of(capture, block);
            let key = match resolved.descriptor {
                Some(d) => BucketKey::Site {
                    name: resolved.name,
                    file: d.file.as_str(),
                    line: d.line,
                },
                None => BucketKey::Name(resolved.name),
            };

            let slot = *index.entry(key).or_insert_with(|| {
                buckets.push(Hotspot {
                    name: resolved.name.to_string(),
                    file: resolved.file().to_string(),
                    line: resolved.line(),
                    total_duration: Duration::ZERO,
                    call_count: 0,
                    avg_duration: Duration::ZERO,
                    percent_of_total: 0.0,
                });
                buckets.len() - 1
            });

            let bucket = &mut buckets[slot];
            bucket.total_duration += block.duration();
            bucket.call_count += 1;
        });
    }

    for bucket in &mut buckets {
        bucket.avg_duration = duration::average(bucket.total_duration, bucket.call_count);
        bucket.percent_of_total = duration::percent_of(bucket.total_duration, capture_duration);
    }

    debug!("Aggregated {} hotspot buckets", buckets.len());

    buckets.sort_by(|a, b| b.total_duration.cmp(&a.total_duration));
    buckets.truncate(limit);
    buckets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::test_support::*;
    use crate::parser::schema::Block;

    fn sample() -> Capture {
        capture(
            0,
            100 * MS,
            vec![
                descriptor(1, "tick", "loop.cpp", 5),
                descriptor(2, "tick", "other.cpp", 9),
            ],
            vec![
                thread(
                    1,
                    "main",
                    vec![
                        Block::new(0, 10 * MS, 1).with_children(vec![Block::new(0, 5 * MS, 1)]),
                        Block::new(20 * MS, 27 * MS, 2),
                    ],
                ),
                thread(2, "io", vec![Block::new(0, 4 * MS, 42).with_name("tick")]),
            ],
        )
    }

    #[test]
    fn test_buckets_by_name_file_line() {
        let spots = hotspots(&sample(), 10);
        assert_eq!(spots.len(), 3);

        assert_eq!(spots[0].location(), "tick (loop.cpp:5)");
        assert_eq!(spots[0].call_count, 2);
        assert_eq!(spots[0].total_duration, Duration::from_millis(15));
        assert_eq!(spots[0].avg_duration, Duration::from_nanos(15 * MS / 2));
        assert_eq!(spots[0].percent_of_total, 15.0);

        assert_eq!(spots[1].file, "other.cpp");
        // No descriptor for id 42: bucketed by name alone
        assert_eq!(spots[2].location(), "tick");
        assert_eq!(spots[2].call_count, 1);
    }

    #[test]
    fn test_average_times_count_within_total() {
        let mut capture = sample();
        capture
            .threads
            .get_mut(&1)
            .unwrap()
            .blocks
            .push(Block::new(30 * MS, 30 * MS + 1, 1));

        for spot in hotspots(&capture, 10) {
            let count = spot.call_count as u128;
            let total = spot.total_duration.as_nanos();
            let avg = spot.avg_duration.as_nanos();
            assert!(avg * count <= total && total < (avg + 1) * count);
        }
    }

    #[test]
    fn test_limit() {
        assert_eq!(hotspots(&sample(), 1).len(), 1);
        assert!(hotspots(&Capture::default(), 5).is_empty());
    }
}
