//! Landmark and discrete-event indexing.
//!
//! Landmarks are resolved once per recording from the event log:
//! - Start: first `Endoscopy started`
//! - Cecum: first `Cecum`
//! - Flexure L / R: first occurrence, only before Cecum is reached
//! - End: last `Recording ended` / `Endoscopy ended`
//!
//! Unresolved landmarks stay at index 0.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use scopetrace_common::config::LandmarkLabels;
use scopetrace_common::error::ScopetraceResult;
use scopetrace_trace_model::event_log::{EventLog, ProcedureEvent};

use crate::alignment::TimestampReconciler;

/// Coordinate-series indices of the procedural landmarks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LandmarkIndexes {
    pub start: usize,
    pub cecum: usize,
    pub flexure_left: usize,
    pub flexure_right: usize,
    pub end: usize,
}

impl LandmarkIndexes {
    /// `(cecum, flexure_left, flexure_right, end, start)`, the order the
    /// report scripts consume.
    pub fn as_tuple(&self) -> (usize, usize, usize, usize, usize) {
        (
            self.cecum,
            self.flexure_left,
            self.flexure_right,
            self.end,
            self.start,
        )
    }

    /// Named landmarks in procedural order.
    pub fn named(&self) -> [(&'static str, usize); 5] {
        [
            ("Start", self.start),
            ("Flexure L", self.flexure_left),
            ("Flexure R", self.flexure_right),
            ("Cecum", self.cecum),
            ("End", self.end),
        ]
    }
}

/// Indices of every tracked discrete event, keyed by event kind.
///
/// Every [`ProcedureEvent`] is present, possibly with an empty list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventIndexes {
    pub events: BTreeMap<ProcedureEvent, Vec<usize>>,
}

impl Default for EventIndexes {
    fn default() -> Self {
        Self {
            events: ProcedureEvent::ALL
                .into_iter()
                .map(|e| (e, Vec::new()))
                .collect(),
        }
    }
}

impl EventIndexes {
    pub fn get(&self, event: ProcedureEvent) -> &[usize] {
        self.events.get(&event).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Total number of resolved events.
    pub fn total(&self) -> usize {
        self.events.values().map(Vec::len).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ProcedureEvent, &[usize])> {
        self.events.iter().map(|(e, idx)| (*e, idx.as_slice()))
    }
}

/// Resolve landmark indices for a recording.
///
/// `times` is the coordinate series' T column. Every line is scanned,
/// header included; a header never carries a landmark label.
pub fn extract_landmarks(
    log: &EventLog,
    times: &[f64],
    labels: &LandmarkLabels,
) -> ScopetraceResult<LandmarkIndexes> {
    let reconciler = TimestampReconciler::new(times, log.end_ms())?;
    let mut landmarks = LandmarkIndexes::default();

    let mut start_found = false;
    let mut cecum_found = false;
    let mut flexure_left_found = false;
    let mut flexure_right_found = false;

    for line in &log.lines {
        if !start_found && line.mentions(&labels.start) {
            landmarks.start = reconciler.index_for(log.timestamp_of(line)?);
            start_found = true;
        }

        if !cecum_found && line.mentions(&labels.cecum) {
            landmarks.cecum = reconciler.index_for(log.timestamp_of(line)?);
            cecum_found = true;
        }

        if !cecum_found && !flexure_left_found && line.mentions(&labels.flexure_left) {
            landmarks.flexure_left = reconciler.index_for(log.timestamp_of(line)?);
            flexure_left_found = true;
        }

        if !cecum_found && !flexure_right_found && line.mentions(&labels.flexure_right) {
            landmarks.flexure_right = reconciler.index_for(log.timestamp_of(line)?);
            flexure_right_found = true;
        }

        if labels.end.iter().any(|label| line.mentions(label)) {
            landmarks.end = reconciler.index_for(log.timestamp_of(line)?);
        }
    }

    tracing::debug!(
        start = landmarks.start,
        cecum = landmarks.cecum,
        flexure_left = landmarks.flexure_left,
        flexure_right = landmarks.flexure_right,
        end = landmarks.end,
        cecum_found,
        "Resolved landmarks"
    );
    Ok(landmarks)
}

/// Resolve every discrete event after the header line.
pub fn extract_events(log: &EventLog, times: &[f64]) -> ScopetraceResult<EventIndexes> {
    let reconciler = TimestampReconciler::new(times, log.end_ms())?;
    let mut indexes = EventIndexes::default();

    for line in log.body() {
        let Some(event) = ProcedureEvent::from_label(&line.label) else {
            continue;
        };
        let index = reconciler.index_for(log.timestamp_of(line)?);
        indexes.events.entry(event).or_default().push(index);
    }

    tracing::debug!(total = indexes.total(), "Resolved discrete events");
    Ok(indexes)
}
