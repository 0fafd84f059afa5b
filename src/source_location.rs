//! Source code location lookup
//!
//! Maps a CPU-tree event back to a human-readable code location. The
//! profiler's tree builder records interpreter frames as plain events whose
//! names carry a `file.py(line): function` suffix, so the default lookup
//! walks the parent chain upward and returns the first frame-shaped name.
//!
//! [`SourceLocator`] is the seam for traces whose frame naming differs.

use crate::event::{EventId, EventTree};
use regex::Regex;

/// Fallback text when no enclosing frame event exists.
pub const NO_SOURCE_LOCATION: &str = "No source code location found";

/// Resolves a CPU event to a human-readable code-location string.
pub trait SourceLocator {
    fn locate(&self, tree: &EventTree, id: EventId) -> String;
}

/// Default locator: scans the event and its ancestors for a name matching a
/// frame pattern (`.py(...)`) and returns that name verbatim.
#[derive(Debug)]
pub struct FrameNameLocator {
    pattern: Regex,
}

impl FrameNameLocator {
    pub fn new() -> Self {
        FrameNameLocator {
            // Matches the profiler's frame naming, e.g. "train.py(57): step".
            pattern: Regex::new(r"\.py\(.*\)").unwrap(),
        }
    }
}

impl Default for FrameNameLocator {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceLocator for FrameNameLocator {
    fn locate(&self, tree: &EventTree, id: EventId) -> String {
        let mut current = Some(id);
        while let Some(event) = current.and_then(|id| tree.get(id)) {
            if self.pattern.is_match(&event.name) {
                return event.name.clone();
            }
            current = event.parent;
        }
        NO_SOURCE_LOCATION.to_string()
    }
}
