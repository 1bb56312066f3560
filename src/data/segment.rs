//! Splitting a folded light curve into individual eclipse events.
//!
//! Steps, per phase window:
//! 1. keep samples whose phase lies in `[min, max]`
//! 2. stable-sort them by time
//! 3. cut wherever two time-adjacent samples are more than the gap threshold apart
//! 4. drop runs shorter than `min_points`, number the survivors from 1

use crate::domain::{Event, ObservationTable, PhaseWindow, Sample};

/// Largest time step (days) allowed inside one event.
///
/// Not configurable yet; a candidate for a CLI flag.
pub const GAP_THRESHOLD: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesSegmenter {
    pub gap_threshold: f64,
    pub min_points: usize,
}

impl SeriesSegmenter {
    pub fn new(min_points: usize) -> Self {
        Self {
            gap_threshold: GAP_THRESHOLD,
            min_points,
        }
    }

    pub fn with_gap(mut self, gap_threshold: f64) -> Self {
        self.gap_threshold = gap_threshold;
        self
    }

    /// Events found in `window`, in time order. An empty selection is not an error.
    pub fn segment(&self, table: &ObservationTable, window: &PhaseWindow) -> Vec<Event> {
        let mut selected: Vec<Sample> = (0..table.len())
            .map(|i| table.sample(i))
            .filter(|s| window.contains(s.phase))
            .collect();
        selected.sort_by(|a, b| a.time.total_cmp(&b.time));

        let mut events = Vec::new();
        for run in split_runs(&selected, self.gap_threshold) {
            if run.len() < self.min_points {
                continue;
            }
            events.push(Event {
                label: window.label.clone(),
                index: events.len() + 1,
                samples: run.to_vec(),
            });
        }
        events
    }
}

fn split_runs(samples: &[Sample], gap: f64) -> Vec<&[Sample]> {
    let mut runs = Vec::new();
    let mut start = 0;
    for i in 1..samples.len() {
        if samples[i].time - samples[i - 1].time > gap {
            runs.push(&samples[start..i]);
            start = i;
        }
    }
    if start < samples.len() {
        runs.push(&samples[start..]);
    }
    runs
}
