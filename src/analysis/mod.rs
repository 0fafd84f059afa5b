//! Trace analysis passes
//!
//! [`TraceAnalysis`] is the owner object for one analysis run over a recorded
//! trace. Its constructor runs the derivation passes in their required order:
//!
//! 1. self time ([`self_time`]) - exclusive durations over the event tree,
//! 2. queue depth ([`queue_depth`]) - launch/kernel correlation and the
//!    in-flight-work time series,
//! 3. idle time ([`idle_time`]) - idle intervals and per-event attribution.
//!
//! Ranking ([`ranking`]) runs on demand afterwards. Later passes mutate the
//! metric records created by earlier ones, so the order is load-bearing; call
//! the pass methods directly only if you preserve it.

pub mod idle_time;
pub mod queue_depth;
pub mod ranking;
pub mod self_time;

use crate::error::AnalysisError;
use crate::event::{DeviceEvent, EventKey, EventMetrics, Interval};
use crate::source_location::{FrameNameLocator, SourceLocator, NO_SOURCE_LOCATION};
use crate::trace::Trace;
use fnv::FnvHashMap;

/// One analysis run over a read-only trace.
///
/// Holds the shared mutable metric records written by the passes. The trace
/// itself is never modified.
pub struct TraceAnalysis<'a> {
    pub(crate) trace: &'a Trace,
    pub(crate) locator: Box<dyn SourceLocator>,
    /// One record per CPU-tree event, keyed by stable identity.
    pub(crate) metrics: FnvHashMap<EventKey, EventMetrics>,
    /// All CPU event keys, sorted by start time.
    pub(crate) event_keys: Vec<EventKey>,
    /// Combined launch + kernel events, sorted by start time.
    pub(crate) device_timeline: Vec<&'a DeviceEvent>,
    /// Queue depth over the span of the device timeline.
    pub(crate) queue_depth_list: Vec<Interval>,
    /// Spans with no outstanding device work, in construction order.
    pub(crate) idle_intervals: Vec<Interval>,
}

impl<'a> TraceAnalysis<'a> {
    /// Run the full analysis over `trace` with the default source locator.
    pub fn new(trace: &'a Trace) -> Result<Self, AnalysisError> {
        Self::with_locator(trace, Box::new(FrameNameLocator::new()))
    }

    /// Run the full analysis with a caller-supplied source locator.
    pub fn with_locator(
        trace: &'a Trace,
        locator: Box<dyn SourceLocator>,
    ) -> Result<Self, AnalysisError> {
        let mut analysis = TraceAnalysis {
            trace,
            locator,
            metrics: FnvHashMap::default(),
            event_keys: Vec::new(),
            device_timeline: Vec::new(),
            queue_depth_list: Vec::new(),
            idle_intervals: Vec::new(),
        };
        analysis.compute_self_time()?;
        analysis.compute_queue_depth()?;
        analysis.compute_idle_time();
        Ok(analysis)
    }

    /// Per-event derived metrics, keyed by event identity.
    pub fn metrics(&self) -> &FnvHashMap<EventKey, EventMetrics> {
        &self.metrics
    }

    /// Metrics for one event, if it exists in the analyzed tree.
    pub fn metrics_for(&self, key: &EventKey) -> Option<&EventMetrics> {
        self.metrics.get(key)
    }

    /// All CPU event keys, sorted by start time.
    pub fn event_keys(&self) -> &[EventKey] {
        &self.event_keys
    }

    /// Combined launch + kernel device events, sorted by start time.
    pub fn device_timeline(&self) -> &[&'a DeviceEvent] {
        &self.device_timeline
    }

    /// The derived queue-depth time series.
    pub fn queue_depth_list(&self) -> &[Interval] {
        &self.queue_depth_list
    }

    /// The derived idle intervals, in construction order.
    pub fn idle_intervals(&self) -> &[Interval] {
        &self.idle_intervals
    }

    /// Display name of an event, for reports.
    pub(crate) fn event_name(&self, key: &EventKey) -> String {
        self.trace
            .event_tree()
            .map(|tree| tree.node(key.id).name.clone())
            .unwrap_or_else(|_| format!("<event {}>", key.id))
    }

    /// Source-code location of an event via the configured locator.
    pub fn source_code_location(&self, key: &EventKey) -> String {
        match self.trace.event_tree() {
            Ok(tree) => self.locator.locate(tree, key.id),
            Err(_) => NO_SOURCE_LOCATION.to_string(),
        }
    }
}

impl std::fmt::Debug for TraceAnalysis<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TraceAnalysis")
            .field("events", &self.event_keys.len())
            .field("device_timeline", &self.device_timeline.len())
            .field("queue_depth_list", &self.queue_depth_list.len())
            .field("idle_intervals", &self.idle_intervals.len())
            .finish()
    }
}
