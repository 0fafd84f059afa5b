//! Tracetriage - post-hoc analysis of deep-learning profiler traces
//!
//! This library consumes a fully-materialized profiler trace (a tree of CPU
//! operation events plus a flat MLU device-event timeline) and derives the
//! metrics needed to point a user at the few operations most worth optimizing:
//! per-event self time, a queue-depth time series, idle-time attribution, and
//! a heuristic optimization ranking.

pub mod analysis;
pub mod error;
pub mod event;
pub mod source_location;
pub mod stats;
pub mod trace;
pub mod traverse;
