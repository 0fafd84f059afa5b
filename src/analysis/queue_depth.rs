//! Queue-depth reconstruction
//!
//! Correlates `cnInvokeKernel` launch records with the MLU kernel executions
//! they spawn, then sweeps one merged, time-ordered sequence of launch,
//! kernel, and CPU events to recover how many kernels were issued but not yet
//! executing at every point in time.
//!
//! Correlation uses a forward-only cursor: each launch searches for its
//! correlation id starting at the position of the previously matched kernel,
//! never re-scanning earlier kernels. That keeps correlation linear but means
//! a launch can never match a kernel that precedes the previous match; see
//! DESIGN.md for the interleaving caveat.

use crate::analysis::TraceAnalysis;
use crate::error::AnalysisError;
use crate::event::{DeviceEvent, DeviceType, EventKey, Interval};
use crate::stats::index_of_first_match;

/// Runtime primitive that enqueues a kernel on the MLU.
pub const KERNEL_LAUNCH_NAME: &str = "cnInvokeKernel";

fn is_kernel_launch(event: &DeviceEvent) -> bool {
    event.name == KERNEL_LAUNCH_NAME
}

/// Kernel executions carry the MLU device tag; memory operations share it
/// and are excluded by name.
fn is_mlu_kernel(event: &DeviceEvent) -> bool {
    event.device_type == DeviceType::Mlu && !event.name.to_ascii_lowercase().contains("mem")
}

/// One entry of the merged timeline. Tags the two event shapes explicitly so
/// ordering never has to probe which timestamp fields exist.
enum TimelineEvent<'a> {
    Launch {
        event: &'a DeviceEvent,
        /// Index of the correlated kernel execution, if one was found.
        kernel_index: Option<usize>,
    },
    Kernel(&'a DeviceEvent),
    Cpu(EventKey),
}

impl TimelineEvent<'_> {
    fn start_time_ns(&self) -> u64 {
        match self {
            TimelineEvent::Launch { event, .. } | TimelineEvent::Kernel(event) => {
                event.start_time_ns()
            }
            TimelineEvent::Cpu(key) => key.start_time_ns,
        }
    }
}

impl<'a> TraceAnalysis<'a> {
    /// Reconstruct the queue-depth time series from the device timeline.
    ///
    /// Appends one [`Interval`] per device event to the queue-depth list and
    /// snapshots the depth at the start of every CPU event into its metrics
    /// record. Requires a populated trace and a prior self-time pass.
    pub fn compute_queue_depth(&mut self) -> Result<(), AnalysisError> {
        let trace = self.trace;
        trace.event_tree()?;
        let device_events = trace.device_events()?;

        let mut launch_events: Vec<&'a DeviceEvent> =
            device_events.iter().filter(|e| is_kernel_launch(e)).collect();
        launch_events.sort_by_key(|e| e.start_us);
        let mut kernel_events: Vec<&'a DeviceEvent> =
            device_events.iter().filter(|e| is_mlu_kernel(e)).collect();
        kernel_events.sort_by_key(|e| e.start_us);

        // Combined, time-sorted device list kept for external use.
        let mut combined: Vec<&'a DeviceEvent> = launch_events
            .iter()
            .chain(kernel_events.iter())
            .copied()
            .collect();
        combined.sort_by_key(|e| e.start_us);
        self.device_timeline = combined;

        // Forward-only correlation: the cursor holds the index of the last
        // matched kernel and never moves backwards. An unmatched launch maps
        // to no index and leaves the cursor where it was.
        let mut kernel_mapping: Vec<Option<usize>> = Vec::with_capacity(launch_events.len());
        let mut last_mapped_kernel = 0usize;
        for launch in &launch_events {
            let index = index_of_first_match(
                &kernel_events,
                |kernel| kernel.correlation_id == launch.correlation_id,
                last_mapped_kernel,
                None,
            );
            if index.is_none() {
                tracing::warn!(
                    correlation_id = launch.correlation_id,
                    start_us = launch.start_us,
                    "kernel launch has no matching kernel execution"
                );
            }
            kernel_mapping.push(index);
            last_mapped_kernel = index.unwrap_or(last_mapped_kernel);
        }
        tracing::debug!(
            launches = launch_events.len(),
            kernels = kernel_events.len(),
            matched = kernel_mapping.iter().filter(|m| m.is_some()).count(),
            "correlated launch events"
        );

        // Merge launches, kernels and CPU events into one global sequence
        // ordered by nanosecond start time (stable, so the launch < kernel <
        // CPU concatenation order breaks ties).
        let mut timeline: Vec<TimelineEvent<'a>> =
            Vec::with_capacity(launch_events.len() + kernel_events.len() + self.event_keys.len());
        timeline.extend(
            launch_events
                .iter()
                .copied()
                .zip(kernel_mapping.iter().copied())
                .map(|(event, kernel_index)| TimelineEvent::Launch {
                    event,
                    kernel_index,
                }),
        );
        timeline.extend(kernel_events.iter().copied().map(TimelineEvent::Kernel));
        timeline.extend(self.event_keys.iter().copied().map(TimelineEvent::Cpu));
        timeline.sort_by_key(TimelineEvent::start_time_ns);

        // current_kernel_index counts kernels whose start is <= the current
        // event's start; spawned_kernel_index tracks the most recent launch's
        // correlated kernel. Their difference is the outstanding queue depth.
        let mut current_kernel_index = 0usize;
        let mut spawned_kernel_index: i64 = -1;
        let mut queue_depth_list: Vec<Interval> = Vec::new();

        for event in &timeline {
            let start_time = event.start_time_ns();
            if let TimelineEvent::Launch {
                kernel_index: Some(index),
                ..
            } = event
            {
                spawned_kernel_index = *index as i64;
            }
            while current_kernel_index < kernel_events.len()
                && kernel_events[current_kernel_index].start_time_ns() <= start_time
            {
                current_kernel_index += 1;
            }
            let depth = (spawned_kernel_index - current_kernel_index as i64 + 1).max(0) as u64;

            match event {
                TimelineEvent::Launch { event, .. } | TimelineEvent::Kernel(event) => {
                    queue_depth_list.push(Interval::with_depth(
                        event.start_time_ns(),
                        event.end_time_ns(),
                        depth,
                    ));
                }
                TimelineEvent::Cpu(key) => {
                    if let Some(metrics) = self.metrics.get_mut(key) {
                        metrics.queue_depth = depth;
                    }
                }
            }
        }

        self.queue_depth_list = queue_depth_list;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventTree;
    use crate::trace::Trace;

    fn launch(start_us: u64, correlation_id: u64) -> DeviceEvent {
        DeviceEvent {
            name: KERNEL_LAUNCH_NAME.to_string(),
            device_type: DeviceType::Cpu,
            correlation_id,
            start_us,
            duration_us: 1,
        }
    }

    fn kernel(start_us: u64, correlation_id: u64) -> DeviceEvent {
        DeviceEvent {
            name: "mlu_fused_kernel".to_string(),
            device_type: DeviceType::Mlu,
            correlation_id,
            start_us,
            duration_us: 2,
        }
    }

    fn empty_tree_trace(device_events: Vec<DeviceEvent>) -> Trace {
        Trace::new(EventTree::default(), device_events)
    }

    #[test]
    fn test_single_launch_kernel_pair() {
        // Launch at 10us, kernel at 12us, same correlation id: depth is 1
        // between the launch and the kernel start, 0 from the kernel on.
        let trace = empty_tree_trace(vec![launch(10, 1), kernel(12, 1)]);
        let analysis = TraceAnalysis::new(&trace).unwrap();

        let depths = analysis.queue_depth_list();
        assert_eq!(depths.len(), 2);
        assert_eq!(depths[0].start, 10_000);
        assert_eq!(depths[0].queue_depth, 1);
        assert_eq!(depths[1].start, 12_000);
        assert_eq!(depths[1].queue_depth, 0);
    }

    #[test]
    fn test_unmatched_launch_adds_no_depth() {
        let trace = empty_tree_trace(vec![launch(10, 1), kernel(12, 99)]);
        let analysis = TraceAnalysis::new(&trace).unwrap();

        for interval in analysis.queue_depth_list() {
            assert_eq!(interval.queue_depth, 0);
        }
    }

    #[test]
    fn test_memory_operations_are_not_kernels() {
        let mut memcpy = kernel(12, 1);
        memcpy.name = "MemcpyHtoD".to_string();
        let trace = empty_tree_trace(vec![launch(10, 1), memcpy]);
        let analysis = TraceAnalysis::new(&trace).unwrap();

        // The memcpy is filtered out of the kernel partition entirely, so the
        // launch never finds a match and only the launch interval is emitted.
        assert_eq!(analysis.queue_depth_list().len(), 1);
        assert_eq!(analysis.queue_depth_list()[0].queue_depth, 0);
    }

    #[test]
    fn test_depth_accumulates_across_back_to_back_launches() {
        let trace = empty_tree_trace(vec![
            launch(10, 1),
            launch(11, 2),
            launch(12, 3),
            kernel(20, 1),
            kernel(23, 2),
            kernel(26, 3),
        ]);
        let analysis = TraceAnalysis::new(&trace).unwrap();

        let depths: Vec<u64> = analysis
            .queue_depth_list()
            .iter()
            .map(|iv| iv.queue_depth)
            .collect();
        // Three launches before any kernel starts: depth climbs 1, 2, 3,
        // then drains 2, 1, 0 as each kernel begins.
        assert_eq!(depths, vec![1, 2, 3, 2, 1, 0]);
    }

    #[test]
    fn test_depth_never_negative_with_kernels_only() {
        let trace = empty_tree_trace(vec![kernel(10, 1), kernel(15, 2)]);
        let analysis = TraceAnalysis::new(&trace).unwrap();

        for interval in analysis.queue_depth_list() {
            assert_eq!(interval.queue_depth, 0);
        }
    }

    #[test]
    fn test_forward_only_cursor_skips_earlier_kernel() {
        // Second launch correlates with a kernel that starts before the
        // first launch's match. The forward-only cursor refuses to look back,
        // so the second launch stays unmatched.
        let trace = empty_tree_trace(vec![
            launch(10, 1),
            launch(11, 2),
            kernel(20, 2),
            kernel(25, 1),
        ]);
        let analysis = TraceAnalysis::new(&trace).unwrap();

        let depths: Vec<u64> = analysis
            .queue_depth_list()
            .iter()
            .map(|iv| iv.queue_depth)
            .collect();
        // launch(1) maps to kernel index 1 (the 25us kernel); launch(2) finds
        // nothing at or after that cursor.
        assert_eq!(depths, vec![2, 2, 1, 0]);
    }

    #[test]
    fn test_cpu_events_snapshot_depth_into_metrics() {
        let mut builder = EventTree::builder();
        // Starts after the launch and before the kernel: sees depth 1.
        let during = builder.add_root("during", 10_500, 11_000);
        // Starts after the kernel has begun: sees depth 0.
        let after = builder.add_root("after", 13_000, 14_000);
        let tree = builder.build();
        let during_key = tree.key(during);
        let after_key = tree.key(after);
        let trace = Trace::new(tree, vec![launch(10, 1), kernel(12, 1)]);

        let analysis = TraceAnalysis::new(&trace).unwrap();
        assert_eq!(analysis.metrics_for(&during_key).unwrap().queue_depth, 1);
        assert_eq!(analysis.metrics_for(&after_key).unwrap().queue_depth, 0);
    }

    #[test]
    fn test_device_timeline_is_time_sorted() {
        let trace = empty_tree_trace(vec![kernel(30, 2), launch(10, 1), kernel(20, 1), launch(15, 2)]);
        let analysis = TraceAnalysis::new(&trace).unwrap();

        let starts: Vec<u64> = analysis
            .device_timeline()
            .iter()
            .map(|e| e.start_us)
            .collect();
        assert_eq!(starts, vec![10, 15, 20, 30]);
    }

    #[test]
    fn test_missing_device_timeline_is_fatal() {
        let trace = Trace::with_event_tree(EventTree::default());
        assert_eq!(
            TraceAnalysis::new(&trace).unwrap_err(),
            AnalysisError::MissingDeviceTimeline
        );
    }
}
