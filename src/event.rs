//! Trace event data model
//!
//! Two disjoint event shapes exist in a recorded trace:
//!
//! - [`CpuEvent`]: a CPU-side operation span with nanosecond timestamps,
//!   living in the profiler's operation tree ([`EventTree`]).
//! - [`DeviceEvent`]: a device-timeline record with microsecond timestamps,
//!   covering both runtime launch calls (`cnInvokeKernel`) and the MLU kernel
//!   executions they spawn, linked by a correlation id.
//!
//! CPU events are keyed for metric aggregation by [`EventKey`], a small `Copy`
//! value wrapping the event's stable identity and span. Identity is a
//! monotonically assigned integer captured at tree-construction time
//! ([`EventId`]), so keying never depends on reference equality.

use serde::{Deserialize, Serialize};

/// Stable identity of a CPU-tree event, assigned monotonically by
/// [`EventTreeBuilder`] in construction order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventId(pub u64);

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A CPU-side operation event recorded by the profiler.
///
/// Timestamps are nanoseconds. Children are ordered as recorded; the parent
/// link is used for source-code-location lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CpuEvent {
    pub id: EventId,
    pub name: String,
    pub start_time_ns: u64,
    pub end_time_ns: u64,
    pub parent: Option<EventId>,
    pub children: Vec<EventId>,
}

impl CpuEvent {
    /// Total (inclusive) duration of the event in nanoseconds.
    pub fn duration_time_ns(&self) -> u64 {
        self.end_time_ns.saturating_sub(self.start_time_ns)
    }
}

/// The operation tree recorded for the CPU side of a trace.
///
/// Nodes live in an arena indexed by [`EventId`]; roots are the top-level
/// operations. The tree is read-only during analysis.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventTree {
    nodes: Vec<CpuEvent>,
    roots: Vec<EventId>,
}

impl EventTree {
    pub fn builder() -> EventTreeBuilder {
        EventTreeBuilder::default()
    }

    /// Assemble a tree from externally built parts.
    ///
    /// Tree construction normally happens upstream in the profiler; this
    /// performs no validation, so malformed input (repeated ids, cycles) is
    /// only caught later by the analysis passes that care.
    pub fn from_parts(nodes: Vec<CpuEvent>, roots: Vec<EventId>) -> Self {
        EventTree { nodes, roots }
    }

    pub fn roots(&self) -> &[EventId] {
        &self.roots
    }

    /// Look up a node by id, returning `None` for ids this tree never issued.
    pub fn get(&self, id: EventId) -> Option<&CpuEvent> {
        self.nodes.get(id.0 as usize)
    }

    /// Infallible lookup for ids handed out by this tree's builder.
    pub(crate) fn node(&self, id: EventId) -> &CpuEvent {
        &self.nodes[id.0 as usize]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Key for a node, carrying its identity and span.
    ///
    /// `id` must come from this tree's builder; use [`EventTree::get`] when
    /// the id's provenance is unknown.
    pub fn key(&self, id: EventId) -> EventKey {
        let node = self.node(id);
        EventKey {
            id: node.id,
            start_time_ns: node.start_time_ns,
            end_time_ns: node.end_time_ns,
        }
    }
}

/// Builds an [`EventTree`], assigning each node a monotonically increasing
/// [`EventId`] at insertion time.
#[derive(Debug, Default)]
pub struct EventTreeBuilder {
    nodes: Vec<CpuEvent>,
    roots: Vec<EventId>,
}

impl EventTreeBuilder {
    /// Add a top-level operation.
    pub fn add_root(&mut self, name: impl Into<String>, start_time_ns: u64, end_time_ns: u64) -> EventId {
        let id = self.push(name.into(), start_time_ns, end_time_ns, None);
        self.roots.push(id);
        id
    }

    /// Add a child operation under `parent`, appended after its siblings.
    pub fn add_child(
        &mut self,
        parent: EventId,
        name: impl Into<String>,
        start_time_ns: u64,
        end_time_ns: u64,
    ) -> EventId {
        let id = self.push(name.into(), start_time_ns, end_time_ns, Some(parent));
        self.nodes[parent.0 as usize].children.push(id);
        id
    }

    fn push(&mut self, name: String, start_time_ns: u64, end_time_ns: u64, parent: Option<EventId>) -> EventId {
        let id = EventId(self.nodes.len() as u64);
        self.nodes.push(CpuEvent {
            id,
            name,
            start_time_ns,
            end_time_ns,
            parent,
            children: Vec::new(),
        });
        id
    }

    pub fn build(self) -> EventTree {
        EventTree {
            nodes: self.nodes,
            roots: self.roots,
        }
    }
}

/// Device tag carried by device-timeline records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceType {
    /// Runtime-side record (launch calls run on the host).
    Cpu,
    /// MLU-side record (kernel executions, memory operations).
    Mlu,
}

/// A device-timeline record: either a kernel-launch runtime call or the
/// device-side execution it spawned.
///
/// Timestamps are microseconds, the recorder's native resolution for the
/// device timeline; the nanosecond accessors convert for comparability with
/// the CPU tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceEvent {
    pub name: String,
    pub device_type: DeviceType,
    /// Links a launch record to its kernel-execution record.
    pub correlation_id: u64,
    pub start_us: u64,
    pub duration_us: u64,
}

impl DeviceEvent {
    pub fn start_time_ns(&self) -> u64 {
        self.start_us * 1000
    }

    pub fn end_time_ns(&self) -> u64 {
        (self.start_us + self.duration_us) * 1000
    }
}

/// Value key for a CPU-tree event: its stable identity plus `[start, end)`
/// span, hashable and comparable without touching the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventKey {
    pub id: EventId,
    pub start_time_ns: u64,
    pub end_time_ns: u64,
}

impl EventKey {
    pub fn duration_time_ns(&self) -> u64 {
        self.end_time_ns.saturating_sub(self.start_time_ns)
    }

    /// Total nanoseconds of overlap between this event's `[start, end)` span
    /// and the union of the supplied intervals.
    ///
    /// Intervals may arrive unsorted and overlapping; they are merged into a
    /// union internally so shared time is never counted twice. Inverted or
    /// empty intervals contribute nothing.
    pub fn intervals_overlap(&self, intervals: &[Interval]) -> u64 {
        let mut spans: Vec<(u64, u64)> = intervals
            .iter()
            .filter(|iv| iv.end > iv.start)
            .map(|iv| (iv.start, iv.end))
            .collect();
        spans.sort_unstable();

        let mut overlap = 0u64;
        let mut covered_until = 0u64;
        for (start, end) in spans {
            let start = start.max(covered_until);
            if start >= end {
                continue;
            }
            covered_until = end;
            let lo = start.max(self.start_time_ns);
            let hi = end.min(self.end_time_ns);
            if lo < hi {
                overlap += hi - lo;
            }
        }
        overlap
    }
}

/// Derived metrics for one CPU-tree event.
///
/// Created by the self-time pass and mutated in place by the queue-depth and
/// idle-time passes, in that order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventMetrics {
    /// Exclusive duration: total duration minus direct children's durations.
    /// Signed, since a malformed tree can report children longer than their
    /// parent.
    pub self_time_ns: i64,
    pub duration_time_ns: u64,
    /// Overlap of the event's span with the idle intervals of the device.
    pub idle_time_ns: u64,
    /// Device queue depth observed at the event's start.
    pub queue_depth: u64,
}

impl EventMetrics {
    /// Fraction of the event's duration the device spent idle, in `[0, 1]`.
    /// Zero-duration events report 0.0.
    pub fn fraction_idle_time(&self) -> f64 {
        if self.duration_time_ns == 0 {
            return 0.0;
        }
        self.idle_time_ns as f64 / self.duration_time_ns as f64
    }
}

/// A closed-open `[start, end)` span of nanoseconds with the queue depth
/// observed over it. Immutable once constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interval {
    pub start: u64,
    pub end: u64,
    pub queue_depth: u64,
}

impl Interval {
    /// Interval with no depth payload (depth 0).
    pub fn new(start: u64, end: u64) -> Self {
        Interval {
            start,
            end,
            queue_depth: 0,
        }
    }

    pub fn with_depth(start: u64, end: u64, queue_depth: u64) -> Self {
        Interval {
            start,
            end,
            queue_depth,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(start: u64, end: u64) -> EventKey {
        EventKey {
            id: EventId(0),
            start_time_ns: start,
            end_time_ns: end,
        }
    }

    #[test]
    fn test_tree_builder_assigns_monotonic_ids() {
        let mut builder = EventTree::builder();
        let root = builder.add_root("aten::mm", 0, 100);
        let child = builder.add_child(root, "aten::copy_", 10, 40);
        let sibling = builder.add_child(root, "aten::add", 50, 90);
        let tree = builder.build();

        assert_eq!(root, EventId(0));
        assert_eq!(child, EventId(1));
        assert_eq!(sibling, EventId(2));
        assert_eq!(tree.node(root).children, vec![child, sibling]);
        assert_eq!(tree.node(child).parent, Some(root));
        assert_eq!(tree.roots(), &[root]);
    }

    #[test]
    fn test_get_rejects_foreign_id() {
        let mut small = EventTree::builder();
        let only = small.add_root("aten::mm", 0, 100);
        let small = small.build();

        let mut other = EventTree::builder();
        let root = other.add_root("step", 0, 100);
        other.add_child(root, "fwd", 10, 40);
        let foreign = other.add_child(root, "bwd", 50, 90);

        assert!(small.get(only).is_some());
        assert!(small.get(foreign).is_none());
    }

    #[test]
    fn test_cpu_event_duration() {
        let mut builder = EventTree::builder();
        let id = builder.add_root("op", 100, 350);
        let tree = builder.build();
        assert_eq!(tree.node(id).duration_time_ns(), 250);
    }

    #[test]
    fn test_device_event_ns_conversion() {
        let event = DeviceEvent {
            name: "cnInvokeKernel".to_string(),
            device_type: DeviceType::Cpu,
            correlation_id: 7,
            start_us: 10,
            duration_us: 2,
        };
        assert_eq!(event.start_time_ns(), 10_000);
        assert_eq!(event.end_time_ns(), 12_000);
    }

    #[test]
    fn test_intervals_overlap_disjoint() {
        let k = key(0, 100);
        let intervals = vec![Interval::new(10, 20), Interval::new(40, 60)];
        assert_eq!(k.intervals_overlap(&intervals), 30);
    }

    #[test]
    fn test_intervals_overlap_union_not_double_counted() {
        let k = key(0, 100);
        // Two overlapping intervals cover [10, 50) once.
        let intervals = vec![Interval::new(10, 40), Interval::new(30, 50)];
        assert_eq!(k.intervals_overlap(&intervals), 40);
    }

    #[test]
    fn test_intervals_overlap_clipped_to_span() {
        let k = key(50, 100);
        let intervals = vec![Interval::new(0, 60), Interval::new(90, 200)];
        assert_eq!(k.intervals_overlap(&intervals), 20);
    }

    #[test]
    fn test_intervals_overlap_unsorted_input() {
        let k = key(0, 100);
        let intervals = vec![Interval::new(40, 60), Interval::new(10, 20)];
        assert_eq!(k.intervals_overlap(&intervals), 30);
    }

    #[test]
    fn test_intervals_overlap_inverted_interval_ignored() {
        let k = key(0, 100);
        let intervals = vec![Interval::new(60, 40)];
        assert_eq!(k.intervals_overlap(&intervals), 0);
    }

    #[test]
    fn test_fraction_idle_time_zero_duration() {
        let metrics = EventMetrics {
            duration_time_ns: 0,
            idle_time_ns: 0,
            ..Default::default()
        };
        assert_eq!(metrics.fraction_idle_time(), 0.0);
    }

    #[test]
    fn test_fraction_idle_time_half() {
        let metrics = EventMetrics {
            duration_time_ns: 100,
            idle_time_ns: 50,
            ..Default::default()
        };
        assert!((metrics.fraction_idle_time() - 0.5).abs() < f64::EPSILON);
    }
}
