//! Duration helpers shared by the analyzer and the report schema.
//!
//! Durations stay `std::time::Duration` in memory and travel as integer
//! nanoseconds in JSON.

use serde::{Deserialize, Deserializer, Serializer};
use std::time::Duration;

/// Duration between two nanosecond timestamps, clamped at zero
pub fn between(begin: u64, end: u64) -> Duration {
    Duration::from_nanos(end.saturating_sub(begin))
}

/// Integer average, zero when `count` is zero
pub fn average(total: Duration, count: usize) -> Duration {
    if count == 0 {
        return Duration::ZERO;
    }
    let nanos = total.as_nanos() / count as u128;
    Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
}

/// `part / whole * 100`, zero when `whole` is zero
pub fn percent_of(part: Duration, whole: Duration) -> f64 {
    if whole.is_zero() {
        0.0
    } else {
        part.as_nanos() as f64 * 100.0 / whole.as_nanos() as f64
    }
}

/// Human-readable rendering ("16ns", "1.5ms", "2.000001s")
pub fn display(duration: Duration) -> String {
    format!("{:?}", duration)
}

/// Serde adapter: `Duration` as integer nanoseconds
pub mod nanos {
    use super::*;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_nanos()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_nanos)
    }
}

/// Serde adapter: `Option<Duration>` as optional integer nanoseconds
pub mod opt_nanos {
    use super::*;

    pub fn serialize<S: Serializer>(
        value: &Option<Duration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => nanos::serialize(d, serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_nanos))
    }
}
