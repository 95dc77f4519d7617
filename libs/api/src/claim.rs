//! Resource claims.
//!
//! A claim requests one or more devices. Once the scheduler has picked
//! devices and the store has accepted the update, `status.allocation` is set
//! and `status.reservedFor` lists the consumers currently using the claim.

use dra_id::{ClaimUid, ObjectKey, PodUid, ResourceVersion};
use serde::{Deserialize, Serialize};

use crate::meta::{Object, ObjectMeta};

/// Maximum number of consumers that may reserve a single claim.
pub const RESOURCE_CLAIM_RESERVED_FOR_MAX_SIZE: usize = 32;

/// A request for devices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceClaim {
    pub metadata: ObjectMeta<ClaimUid>,

    #[serde(default)]
    pub spec: ResourceClaimSpec,

    #[serde(default)]
    pub status: ResourceClaimStatus,
}

/// What the claim asks for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceClaimSpec {
    #[serde(default)]
    pub devices: DeviceClaim,
}

/// Device requests of a claim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceClaim {
    #[serde(default)]
    pub requests: Vec<DeviceRequest>,
}

/// One named request for devices of a class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceRequest {
    pub name: String,
    pub device_class_name: String,

    #[serde(default)]
    pub allocation_mode: AllocationMode,

    /// Number of devices for [`AllocationMode::ExactCount`].
    #[serde(default = "default_count")]
    pub count: u32,
}

fn default_count() -> u32 {
    1
}

/// How many devices a request wants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AllocationMode {
    #[default]
    ExactCount,
    All,
}

/// Observed state of a claim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceClaimStatus {
    /// Set once devices are committed to the claim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allocation: Option<AllocationResult>,

    /// Consumers currently allowed to use the claim.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reserved_for: Vec<ResourceClaimConsumerReference>,
}

/// Devices committed to a claim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationResult {
    #[serde(default)]
    pub devices: DeviceAllocationResult,

    /// Node the allocated devices are reachable from, if node-local.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_name: Option<String>,
}

/// Per-request device results.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceAllocationResult {
    #[serde(default)]
    pub results: Vec<DeviceRequestAllocationResult>,
}

/// One device picked for one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceRequestAllocationResult {
    pub request: String,
    pub driver: String,
    pub pool: String,
    pub device: String,
}

impl DeviceRequestAllocationResult {
    /// Fully qualified device identity (`driver/pool/device`).
    pub fn device_id(&self) -> String {
        format!("{}/{}/{}", self.driver, self.pool, self.device)
    }
}

/// A consumer (usually a pod) reserving a claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceClaimConsumerReference {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub api_group: String,
    pub resource: String,
    pub name: String,
    pub uid: PodUid,
}

impl ResourceClaimConsumerReference {
    /// Reference to a pod.
    pub fn pod(name: impl Into<String>, uid: PodUid) -> Self {
        Self {
            api_group: String::new(),
            resource: "pods".to_string(),
            name: name.into(),
            uid,
        }
    }
}

impl ResourceClaim {
    /// A new, unallocated claim.
    pub fn new(
        namespace: impl Into<String>,
        name: impl Into<String>,
        resource_version: ResourceVersion,
    ) -> Self {
        Self {
            metadata: ObjectMeta {
                name: name.into(),
                namespace: Some(namespace.into()),
                uid: ClaimUid::new(),
                resource_version,
                creation_timestamp: None,
            },
            spec: ResourceClaimSpec::default(),
            status: ResourceClaimStatus::default(),
        }
    }

    pub fn uid(&self) -> ClaimUid {
        self.metadata.uid
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn namespace(&self) -> &str {
        self.metadata.namespace.as_deref().unwrap_or_default()
    }

    /// True when devices are committed to the claim.
    pub fn is_allocated(&self) -> bool {
        self.status.allocation.is_some()
    }

    /// True when the given consumer holds a reservation.
    pub fn is_reserved_for(&self, consumer: PodUid) -> bool {
        self.status.reserved_for.iter().any(|r| r.uid == consumer)
    }

    /// True when no further consumers can be added.
    pub fn reserved_for_full(&self) -> bool {
        self.status.reserved_for.len() >= RESOURCE_CLAIM_RESERVED_FOR_MAX_SIZE
    }

    /// Copy of this claim carrying `allocation`.
    ///
    /// The resource version is kept: a locally built allocation is not a new
    /// store revision until the store has accepted it.
    #[must_use]
    pub fn with_allocation(&self, allocation: AllocationResult) -> Self {
        let mut claim = self.clone();
        claim.status.allocation = Some(allocation);
        claim
    }

    /// Copy of this claim with the allocation and reservations cleared.
    #[must_use]
    pub fn deallocated(&self) -> Self {
        let mut claim = self.clone();
        claim.status.allocation = None;
        claim.status.reserved_for.clear();
        claim
    }

    /// Copy of this claim with `consumer` added to `reservedFor`.
    #[must_use]
    pub fn with_reservation(&self, consumer: ResourceClaimConsumerReference) -> Self {
        let mut claim = self.clone();
        if !claim.is_reserved_for(consumer.uid) {
            claim.status.reserved_for.push(consumer);
        }
        claim
    }

    /// Copy of this claim stamped with a store-assigned version.
    #[must_use]
    pub fn with_resource_version(&self, resource_version: ResourceVersion) -> Self {
        let mut claim = self.clone();
        claim.metadata.resource_version = resource_version;
        claim
    }
}

impl Object for ResourceClaim {
    const KIND: &'static str = "ResourceClaim";

    fn key(&self) -> ObjectKey {
        self.metadata.key()
    }

    fn resource_version(&self) -> ResourceVersion {
        self.metadata.resource_version
    }
}
