//! Self-time computation
//!
//! Walks the event tree once, depth-first, recording each event's exclusive
//! duration (total duration minus the durations of its direct children) in a
//! fresh [`EventMetrics`] record. Also establishes the start-time-sorted key
//! list the later passes iterate over.

use crate::analysis::TraceAnalysis;
use crate::error::AnalysisError;
use crate::event::{EventId, EventMetrics};
use crate::traverse::traverse_dfs;

impl TraceAnalysis<'_> {
    /// Compute self time for every event in the tree.
    ///
    /// Fails with [`AnalysisError::MissingEventTree`] on an unpopulated trace
    /// and with [`AnalysisError::DuplicateEventId`] when the same event
    /// identity is reachable twice - a malformed tree must abort rather than
    /// have its metrics silently overwritten.
    pub fn compute_self_time(&mut self) -> Result<(), AnalysisError> {
        let trace = self.trace;
        let tree = trace.event_tree()?;

        let walk = traverse_dfs(tree.roots().to_vec(), |id: &EventId| {
            tree.node(*id).children.clone()
        });
        for id in walk {
            let event = tree.node(id);
            let children_time: i64 = event
                .children
                .iter()
                .map(|child| tree.node(*child).duration_time_ns() as i64)
                .sum();
            // Signed: malformed trees can report children longer than their
            // parent, and that must survive to the ranking features.
            let self_time_ns = event.duration_time_ns() as i64 - children_time;

            let key = tree.key(id);
            if self.metrics.contains_key(&key) {
                return Err(AnalysisError::DuplicateEventId {
                    id: event.id,
                    name: event.name.clone(),
                });
            }
            self.metrics.insert(
                key,
                EventMetrics {
                    self_time_ns,
                    duration_time_ns: event.duration_time_ns(),
                    ..Default::default()
                },
            );
        }

        self.event_keys = self.metrics.keys().copied().collect();
        self.event_keys.sort_by_key(|key| key.start_time_ns);
        tracing::debug!(events = self.event_keys.len(), "computed self time");
        Ok(())
    }
}
