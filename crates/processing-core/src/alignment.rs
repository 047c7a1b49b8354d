//! Timestamp reconciliation between the event-log clock and the
//! coordinate clock.
//!
//! An event at `event_secs` on the log clock is mapped onto the coordinate
//! clock through [`ClockOffset`] and then resolved to the index of the
//! nearest coordinate sample. Ties go to the lowest index.

use scopetrace_common::clock::ClockOffset;
use scopetrace_common::error::{ScopetraceError, ScopetraceResult};

/// How the nearest sample is located.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStrategy {
    /// Scan every sample. Works on any series.
    Linear,
    /// Binary search. Only valid on non-decreasing series.
    Binary,
}

/// Index of the sample closest to `target`, first minimum wins.
///
/// Returns `None` for an empty slice.
pub fn nearest_index(times: &[f64], target: f64) -> Option<usize> {
    let mut iter = times.iter().enumerate();
    let (_, first) = iter.next()?;
    let mut best = (0, (first - target).abs());
    for (i, t) in iter {
        let distance = (t - target).abs();
        if distance < best.1 {
            best = (i, distance);
        }
    }
    Some(best.0)
}

/// Binary-search equivalent of [`nearest_index`] for non-decreasing `times`.
///
/// Gives the same index as the linear scan, including the lowest-index
/// tie-break across equidistant neighbours, duplicate values and distinct
/// samples whose distances round to the same float.
pub fn nearest_index_sorted(times: &[f64], target: f64) -> Option<usize> {
    if times.is_empty() {
        return None;
    }
    let upper = times.partition_point(|t| *t < target);
    let chosen = if upper == 0 {
        0
    } else if upper == times.len() {
        upper - 1
    } else {
        let below = (times[upper - 1] - target).abs();
        let above = (times[upper] - target).abs();
        if below <= above {
            upper - 1
        } else {
            upper
        }
    };
    // Distances are non-increasing up to `chosen`, so the first sample at
    // the minimum distance is a partition point too.
    let best = (times[chosen] - target).abs();
    Some(times[..chosen].partition_point(|t| (t - target).abs() > best))
}

/// Resolve one event time without building a reconciler.
///
/// `adjusted = coordinate_end - (log_end_ms - event_secs * 1000)`, then
/// the index of the nearest sample in `times`.
pub fn calculate_index(
    event_secs: f64,
    coordinate_end: f64,
    log_end_ms: f64,
    times: &[f64],
) -> ScopetraceResult<usize> {
    let adjusted = ClockOffset::new(coordinate_end, log_end_ms).adjust(event_secs);
    nearest_index(times, adjusted)
        .ok_or_else(|| ScopetraceError::empty_series("cannot resolve event index"))
}

/// Resolves event-log times to coordinate-series indices.
#[derive(Debug, Clone)]
pub struct TimestampReconciler<'a> {
    times: &'a [f64],
    offset: ClockOffset,
    strategy: SearchStrategy,
}

impl<'a> TimestampReconciler<'a> {
    /// Anchor the log end (ms) to the last sample of `times`.
    ///
    /// Picks binary search when `times` is non-decreasing, linear otherwise.
    pub fn new(times: &'a [f64], log_end_ms: f64) -> ScopetraceResult<Self> {
        let coordinate_end = *times
            .last()
            .ok_or_else(|| ScopetraceError::empty_series("T has no samples"))?;
        let strategy = if is_non_decreasing(times) {
            SearchStrategy::Binary
        } else {
            tracing::warn!(
                samples = times.len(),
                "Coordinate times are not monotonic; using linear search"
            );
            SearchStrategy::Linear
        };
        Ok(Self {
            times,
            offset: ClockOffset::new(coordinate_end, log_end_ms),
            strategy,
        })
    }

    /// Override the search strategy. Binary is refused on unsorted times.
    pub fn with_strategy(mut self, strategy: SearchStrategy) -> Self {
        self.strategy = match strategy {
            SearchStrategy::Binary if !is_non_decreasing(self.times) => SearchStrategy::Linear,
            other => other,
        };
        self
    }

    pub fn strategy(&self) -> SearchStrategy {
        self.strategy
    }

    pub fn offset(&self) -> ClockOffset {
        self.offset
    }

    /// Event time (seconds, log clock) on the coordinate clock (ms).
    pub fn adjusted_time(&self, event_secs: f64) -> f64 {
        self.offset.adjust(event_secs)
    }

    /// Index of the sample nearest an already-adjusted time.
    pub fn index_at(&self, adjusted_ms: f64) -> usize {
        let found = match self.strategy {
            SearchStrategy::Linear => nearest_index(self.times, adjusted_ms),
            SearchStrategy::Binary => nearest_index_sorted(self.times, adjusted_ms),
        };
        // `times` is non-empty by construction.
        found.unwrap_or(0)
    }

    /// Index of the sample nearest an event-log time.
    pub fn index_for(&self, event_secs: f64) -> usize {
        self.index_at(self.adjusted_time(event_secs))
    }
}

fn is_non_decreasing(times: &[f64]) -> bool {
    times.windows(2).all(|w| w[0] <= w[1])
}
