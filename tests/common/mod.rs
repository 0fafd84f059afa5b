//! Shared fixtures for the integration suites.
#![allow(dead_code)] // Not every suite uses every fixture.

use std::sync::Once;

use tracetriage::event::{DeviceEvent, DeviceType};
use tracing_subscriber::EnvFilter;

static TRACING: Once = Once::new();

/// Route analysis diagnostics to stderr, filtered by `RUST_LOG`.
///
/// Safe to call from every test; only the first caller in the process
/// installs the subscriber.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

pub const LAUNCH_NAME: &str = "cnInvokeKernel";

pub fn launch(start_us: u64, correlation_id: u64) -> DeviceEvent {
    DeviceEvent {
        name: LAUNCH_NAME.to_string(),
        device_type: DeviceType::Cpu,
        correlation_id,
        start_us,
        duration_us: 1,
    }
}

pub fn kernel(start_us: u64, duration_us: u64, correlation_id: u64) -> DeviceEvent {
    DeviceEvent {
        name: "mlu_conv_fwd".to_string(),
        device_type: DeviceType::Mlu,
        correlation_id,
        start_us,
        duration_us,
    }
}

/// Five launches queue up before their kernels drain: depth spikes to 5 and
/// falls back to zero, producing one qualifying decrease interval.
pub fn spike_device_events() -> Vec<DeviceEvent> {
    let mut events = Vec::new();
    for n in 0..5 {
        events.push(launch(10 + n, n));
    }
    for n in 0..5 {
        events.push(kernel(30 + 4 * n, 2, n));
    }
    events
}
