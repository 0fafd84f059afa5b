//! Optimization ranking
//!
//! Filters events down to the falling edges of queue-depth spikes (the spans
//! where accumulated device work drains back toward zero) and ranks the
//! survivors by a heuristic combining idle-time fraction and self time. The
//! handful of top-ranked events are the ones most worth a user's attention.

use crate::analysis::TraceAnalysis;
use crate::event::{EventKey, Interval};
use crate::stats::{argmax, index_of_first_match, standardize};

/// Queue depth at or below this value counts as drained.
const BOTTOM_THRESHOLD: u64 = 0;
/// Minimum peak depth for a falling edge to be worth attention.
const TOP_THRESHOLD: u64 = 4;
/// Weight of the self-time z-score in the heuristic.
const SELF_TIME_WEIGHT: f64 = 0.6;

impl TraceAnalysis<'_> {
    /// Rank events by optimization potential and return up to `length` keys.
    ///
    /// Only events overlapping a decrease interval (a falling edge whose
    /// peak depth reached [`TOP_THRESHOLD`]) survive the filter. Survivors
    /// are scored `z(fraction_idle_time) + 0.6 * z(self_time_ns)` and sorted
    /// descending. When the survivor sample is degenerate (fewer than two
    /// events, or zero variance in a feature) scoring is skipped and the
    /// survivors come back in event-start order instead.
    pub fn rank_events(&self, length: usize) -> Vec<EventKey> {
        // Newest-first scan of the queue-depth series.
        let queue_depth_list: Vec<Interval> = self.queue_depth_list.iter().rev().copied().collect();
        let qd_values: Vec<u64> = queue_depth_list.iter().map(|iv| iv.queue_depth).collect();

        let mut decrease_intervals: Vec<Interval> = Vec::new();
        let mut i = 0usize;
        while i < qd_values.len() {
            if qd_values[i] > BOTTOM_THRESHOLD {
                i += 1;
                continue;
            }
            for j in (i + 1)..qd_values.len() {
                // Find the next drain point and the peak before it; a peak
                // clearing the threshold marks a falling edge from that peak
                // back to the scan's start position.
                let next_minimum_idx =
                    index_of_first_match(&qd_values, |v| *v <= BOTTOM_THRESHOLD, j, None);
                let peak_idx = argmax(&qd_values, j, next_minimum_idx);
                if let Some(peak) = peak_idx {
                    if qd_values[peak] >= TOP_THRESHOLD {
                        decrease_intervals.push(Interval::new(
                            queue_depth_list[peak].start,
                            queue_depth_list[i].start,
                        ));
                        if let Some(next) = next_minimum_idx {
                            i = next;
                        }
                        break;
                    }
                }
            }
            i += 1;
        }
        tracing::debug!(
            decrease_intervals = decrease_intervals.len(),
            "scanned queue depth falling edges"
        );

        // Keep only events that overlap a falling edge.
        let survivors: Vec<EventKey> = self
            .event_keys
            .iter()
            .copied()
            .filter(|key| key.intervals_overlap(&decrease_intervals) > 0)
            .collect();
        if survivors.is_empty() {
            return Vec::new();
        }

        let idle_fractions: Vec<f64> = survivors
            .iter()
            .map(|key| self.metrics[key].fraction_idle_time())
            .collect();
        let self_times: Vec<f64> = survivors
            .iter()
            .map(|key| self.metrics[key].self_time_ns as f64)
            .collect();

        let (z_idle, z_self) = match (standardize(&idle_fractions), standardize(&self_times)) {
            (Some(z_idle), Some(z_self)) => (z_idle, z_self),
            // Degenerate sample: scoring would divide by zero, so skip the
            // ranking step and keep event-start order.
            _ => {
                let mut unscored = survivors;
                unscored.truncate(length);
                return unscored;
            }
        };

        let mut scored: Vec<(f64, EventKey)> = survivors
            .into_iter()
            .enumerate()
            .map(|(idx, key)| (z_idle[idx] + SELF_TIME_WEIGHT * z_self[idx], key))
            .collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        scored.into_iter().take(length).map(|(_, key)| key).collect()
    }

    /// Rank events and optionally print a human-readable report.
    ///
    /// Prints "No events to optimize" when nothing qualifies. Returns the
    /// ranked keys either way.
    pub fn get_optimizable_events(&self, length: usize, print_enable: bool) -> Vec<EventKey> {
        let event_list = self.rank_events(length);
        if print_enable {
            println!("{}", self.format_optimizable_events(&event_list));
        }
        event_list
    }

    /// The report text for a ranked event list.
    pub fn format_optimizable_events(&self, events: &[EventKey]) -> String {
        if events.is_empty() {
            return "No events to optimize".to_string();
        }
        let rule = "-".repeat(80);
        let mut output = String::from("Optimizable events:\n");
        let blocks: Vec<String> = events
            .iter()
            .map(|key| {
                let idle_percent = self
                    .metrics_for(key)
                    .map(|metrics| metrics.fraction_idle_time() * 100.0)
                    .unwrap_or(0.0);
                format!(
                    "{rule}\nEvent:                {}\nSource code location: {}\nPercentage idle time: {:.2}%\n{rule}",
                    self.event_name(key),
                    self.source_code_location(key),
                    idle_percent,
                )
            })
            .collect();
        output.push_str(&blocks.join("\n"));
        output
    }
}
