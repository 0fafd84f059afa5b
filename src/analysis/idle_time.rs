//! Idle-time derivation
//!
//! Converts the queue-depth time series into idle intervals (spans with no
//! outstanding device work) and attributes to every CPU event how much of
//! its own duration overlaps them.

use crate::analysis::TraceAnalysis;
use crate::event::Interval;

impl TraceAnalysis<'_> {
    /// Derive idle intervals and per-event idle time.
    ///
    /// Two boundary intervals (before the first and after the last
    /// queue-depth interval, clipped to the CPU events' extent) are pushed
    /// first; time outside the device timeline's observed span counts as
    /// idle. The list is deliberately kept in construction order rather than
    /// re-sorted.
    pub fn compute_idle_time(&mut self) {
        let mut idle_intervals: Vec<Interval> = Vec::new();
        if let (Some(first_depth), Some(last_depth), Some(first_key), Some(last_key)) = (
            self.queue_depth_list.first(),
            self.queue_depth_list.last(),
            self.event_keys.first(),
            self.event_keys.last(),
        ) {
            idle_intervals.push(Interval::new(first_key.start_time_ns, first_depth.start));
            idle_intervals.push(Interval::new(last_depth.end, last_key.end_time_ns));
        }

        // A run of consecutive depth-0 intervals becomes one idle interval
        // from the run's first end to where depth next exceeds zero.
        let mut idle = false;
        let mut idle_start = 0u64;
        for interval in &self.queue_depth_list {
            if interval.queue_depth == 0 && !idle {
                idle_start = interval.end;
                idle = true;
            }
            if interval.queue_depth > 0 && idle {
                idle_intervals.push(Interval::new(idle_start, interval.start));
                idle = false;
            }
        }

        for key in &self.event_keys {
            if let Some(metrics) = self.metrics.get_mut(key) {
                metrics.idle_time_ns = key.intervals_overlap(&idle_intervals);
            }
        }
        self.idle_intervals = idle_intervals;
        tracing::debug!(intervals = self.idle_intervals.len(), "derived idle intervals");
    }
}
