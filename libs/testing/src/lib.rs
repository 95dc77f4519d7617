//! Test fixtures shared by the workspace crates.
//!
//! Builders return plain objects; tests decide whether they go through the
//! informer path (`on_add`) or the ledger.

use std::sync::Once;

use dra_api::{
    AllocationMode, AllocationResult, DeviceAllocationResult, DeviceClass, DeviceRequest,
    DeviceRequestAllocationResult, ResourceClaim, ResourceSlice,
};
use dra_id::ResourceVersion;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Driver name used by every fixture.
pub const TEST_DRIVER: &str = "gpu.example.com";

static TRACING: Once = Once::new();

/// Install a test-friendly tracing subscriber once per test binary.
///
/// Honors `RUST_LOG`; defaults to `debug` for the workspace crates.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("dra_assume_cache=debug,dra_tracker=debug"));
        // Another test harness may already own the global subscriber.
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_test_writer())
            .try_init();
    });
}

/// An unallocated claim requesting one device of the test class.
pub fn claim(namespace: &str, name: &str, resource_version: u64) -> ResourceClaim {
    let mut claim = ResourceClaim::new(namespace, name, ResourceVersion::new(resource_version));
    claim.spec.devices.requests.push(DeviceRequest {
        name: "gpu".to_string(),
        device_class_name: TEST_DRIVER.to_string(),
        allocation_mode: AllocationMode::ExactCount,
        count: 1,
    });
    claim
}

/// An allocation of a single device on `node`.
pub fn allocation(node: &str, device: &str) -> AllocationResult {
    AllocationResult {
        devices: DeviceAllocationResult {
            results: vec![DeviceRequestAllocationResult {
                request: "gpu".to_string(),
                driver: TEST_DRIVER.to_string(),
                pool: node.to_string(),
                device: device.to_string(),
            }],
        },
        node_name: Some(node.to_string()),
    }
}

/// A claim already allocated to `device` on `node`.
pub fn allocated_claim(
    namespace: &str,
    name: &str,
    resource_version: u64,
    node: &str,
    device: &str,
) -> ResourceClaim {
    claim(namespace, name, resource_version).with_allocation(allocation(node, device))
}

/// The device class all fixture claims request.
pub fn device_class(name: &str) -> DeviceClass {
    DeviceClass::new(name, ResourceVersion::new(1))
}

/// A slice publishing `count` devices named `gpu-<n>` on `node`.
pub fn resource_slice(node: &str, count: usize) -> ResourceSlice {
    ResourceSlice::for_node(
        format!("{node}-{TEST_DRIVER}"),
        TEST_DRIVER,
        node,
        (0..count).map(|i| format!("gpu-{i}")),
        ResourceVersion::new(1),
    )
}
