use crate::models::Counters;
use crate::utils::format_count;
use tracing::info;

/// Periodic progress line keyed on the `records` counter.
///
/// A line is emitted once when `records` reaches a new positive multiple of
/// the interval. Polling again while `records` stays on that multiple (other
/// elements pass in between) emits nothing. Purely observational: it only
/// reads the counters.
#[derive(Debug, Clone)]
pub struct ProgressReporter {
    every: u64,
    last_reported: u64,
}

impl ProgressReporter {
    /// `every == 0` disables reporting.
    pub fn new(every: u64) -> Self {
        Self {
            every,
            last_reported: 0,
        }
    }

    /// Returns the progress line when `records` has just reached a new multiple of the interval.
    pub fn poll(&mut self, counters: &Counters) -> Option<String> {
        let records = counters.records;
        if self.every == 0 || records == 0 || records % self.every != 0 {
            return None;
        }
        if records == self.last_reported {
            return None;
        }
        self.last_reported = records;
        Some(format!(
            "...parsed {} <Record> elements; steps so far: {}",
            format_count(records),
            format_count(counters.steps)
        ))
    }

    /// Called after every element; logs the progress line when one is due.
    pub fn observe(&mut self, counters: &Counters) {
        if let Some(line) = self.poll(counters) {
            info!(records = counters.records, steps = counters.steps, "{line}");
        }
    }
}
