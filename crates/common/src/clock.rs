//! Clock utilities for the two independently-clocked streams.
//!
//! Coordinate samples carry milliseconds relative to the first raw sample.
//! Event logs carry seconds on their own clock. The only anchor shared by
//! both is the end of the recording: the last coordinate sample and the
//! last log line are taken to be simultaneous.

use chrono::NaiveTime;

use crate::error::{ScopetraceError, ScopetraceResult};

/// Milliseconds per second.
pub const MS_PER_SEC: f64 = 1000.0;

/// Convert log-clock seconds to milliseconds.
pub fn secs_to_ms(secs: f64) -> f64 {
    secs * MS_PER_SEC
}

/// Parse a raw sensor timestamp of the form `HH:MM:SS:ffffff`.
///
/// The trailing field is a decimal fraction of a second, so `"12:00:01:5"`
/// is half a second past `12:00:01`.
pub fn parse_sample_time(raw: &str) -> ScopetraceResult<NaiveTime> {
    let raw = raw.trim();
    let (hms, fraction) = raw
        .rsplit_once(':')
        .ok_or_else(|| ScopetraceError::parse(format!("malformed sample time {raw:?}")))?;
    if fraction.is_empty() || !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ScopetraceError::parse(format!(
            "malformed fractional seconds in {raw:?}"
        )));
    }
    NaiveTime::parse_from_str(&format!("{hms}.{fraction}"), "%H:%M:%S%.f")
        .map_err(|e| ScopetraceError::parse(format!("invalid sample time {raw:?}: {e}")))
}

/// Milliseconds elapsed from `first` to `current`.
///
/// Negative when `current` precedes `first` (e.g. across midnight).
pub fn relative_ms(first: NaiveTime, current: NaiveTime) -> f64 {
    let delta = current.signed_duration_since(first);
    match delta.num_microseconds() {
        Some(us) => us as f64 / 1000.0,
        None => delta.num_milliseconds() as f64,
    }
}

/// Affine map from the event-log clock into the coordinate clock.
///
/// `adjusted = coordinate_end_ms - (log_end_ms - event_secs * 1000)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClockOffset {
    /// Last timestamp of the coordinate series (ms).
    pub coordinate_end_ms: f64,
    /// Timestamp of the last log line (ms).
    pub log_end_ms: f64,
}

impl ClockOffset {
    pub fn new(coordinate_end_ms: f64, log_end_ms: f64) -> Self {
        Self {
            coordinate_end_ms,
            log_end_ms,
        }
    }

    /// Map an event-log time (seconds) to the coordinate clock (ms).
    pub fn adjust(&self, event_secs: f64) -> f64 {
        self.coordinate_end_ms - (self.log_end_ms - secs_to_ms(event_secs))
    }

    /// Offset in milliseconds added to a log time to land on the coordinate clock.
    pub fn shift_ms(&self) -> f64 {
        self.coordinate_end_ms - self.log_end_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sample_time_microseconds() {
        let t = parse_sample_time("10:15:30:250000").unwrap();
        let base = parse_sample_time("10:15:30:000000").unwrap();
        assert!((relative_ms(base, t) - 250.0).abs() < 1e-9);
    }

    #[test]
    fn test_parse_sample_time_short_fraction_is_decimal() {
        let a = parse_sample_time("00:00:01:5").unwrap();
        let b = parse_sample_time("00:00:00:0").unwrap();
        assert!((relative_ms(b, a) - 1500.0).abs() < 1e-9);
    }

    #[test]
    fn test_parse_sample_time_rejects_garbage() {
        assert!(parse_sample_time("not a time").is_err());
        assert!(parse_sample_time("10:15:30:").is_err());
        assert!(parse_sample_time("10:15:30:12a").is_err());
    }

    #[test]
    fn test_clock_offset_adjust() {
        // Log ends at 100 s, coordinates end at 60_000 ms.
        let offset = ClockOffset::new(60_000.0, secs_to_ms(100.0));
        assert!((offset.adjust(100.0) - 60_000.0).abs() < 1e-9);
        assert!((offset.adjust(70.0) - 30_000.0).abs() < 1e-9);
        assert!((offset.shift_ms() + 40_000.0).abs() < 1e-9);
    }
}
