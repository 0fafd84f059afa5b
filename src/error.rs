//! Analysis error types
//!
//! All failures are local precondition or invariant violations reported
//! synchronously to the caller. Analysis either completes fully or aborts;
//! there is no retry or partial-result recovery.

use crate::event::EventId;
use thiserror::Error;

/// Fatal precondition/invariant failures raised by the analysis passes.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AnalysisError {
    /// Self-time or queue-depth computation was requested on a trace whose
    /// event tree was never populated.
    #[error("trace has no populated event tree")]
    MissingEventTree,

    /// Queue-depth computation was requested on a trace whose flat
    /// device-event timeline was never recorded.
    #[error("trace has no recorded device timeline")]
    MissingDeviceTimeline,

    /// The same event identity was visited twice during self-time
    /// computation. Indicates a malformed or double-counted tree; metrics are
    /// never silently overwritten.
    #[error("duplicate event id {id} ({name}) in event tree")]
    DuplicateEventId { id: EventId, name: String },
}
