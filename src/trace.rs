//! Recorded trace input
//!
//! [`Trace`] is the read-only collaborator handed to the analysis: the CPU
//! operation tree plus the flat device-event timeline, both produced upstream
//! by the profiler. Either side may be absent when the recording never
//! completed; the accessors turn that into the fatal precondition errors the
//! passes require.

use crate::error::AnalysisError;
use crate::event::{DeviceEvent, EventTree};
use serde::{Deserialize, Serialize};

/// A fully-materialized profiler recording.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Trace {
    event_tree: Option<EventTree>,
    device_events: Option<Vec<DeviceEvent>>,
}

impl Trace {
    /// A populated recording with both the CPU tree and the device timeline.
    pub fn new(event_tree: EventTree, device_events: Vec<DeviceEvent>) -> Self {
        Trace {
            event_tree: Some(event_tree),
            device_events: Some(device_events),
        }
    }

    /// A recording with only the CPU tree: the device timeline was never
    /// captured. Queue-depth computation on it fails.
    pub fn with_event_tree(event_tree: EventTree) -> Self {
        Trace {
            event_tree: Some(event_tree),
            device_events: None,
        }
    }

    /// A recording that never captured anything. Analysis on it fails with
    /// the corresponding precondition error.
    pub fn unpopulated() -> Self {
        Trace::default()
    }

    pub fn event_tree(&self) -> Result<&EventTree, AnalysisError> {
        self.event_tree.as_ref().ok_or(AnalysisError::MissingEventTree)
    }

    pub fn device_events(&self) -> Result<&[DeviceEvent], AnalysisError> {
        self.device_events
            .as_deref()
            .ok_or(AnalysisError::MissingDeviceTimeline)
    }
}
