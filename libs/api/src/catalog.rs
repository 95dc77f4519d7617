//! Device classes and resource slices.
//!
//! Both kinds are cluster-scoped reference data. The scheduler only reads
//! them; it never records allocation state here.

use std::collections::BTreeMap;

use dra_id::{DeviceClassUid, ObjectKey, ResourceSliceUid, ResourceVersion};
use serde::{Deserialize, Serialize};

use crate::meta::{Object, ObjectMeta};

/// A class of devices that claims can request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceClass {
    pub metadata: ObjectMeta<DeviceClassUid>,

    #[serde(default)]
    pub spec: DeviceClassSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceClassSpec {
    /// Selector expressions a device must satisfy to belong to the class.
    #[serde(default)]
    pub selectors: Vec<DeviceSelector>,

    /// Opaque driver configuration passed along with allocated devices.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub config: Vec<DeviceClassConfiguration>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceSelector {
    /// CEL expression, evaluated by the allocator.
    pub expression: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceClassConfiguration {
    pub driver: String,
    pub parameters: serde_json::Value,
}

/// Devices published by one driver for one pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceSlice {
    pub metadata: ObjectMeta<ResourceSliceUid>,
    pub spec: ResourceSliceSpec,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceSliceSpec {
    pub driver: String,
    pub pool: ResourcePool,

    /// Set when the devices are local to a single node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_name: Option<String>,

    #[serde(default)]
    pub all_nodes: bool,

    #[serde(default)]
    pub devices: Vec<Device>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourcePool {
    pub name: String,
    pub generation: i64,
    pub resource_slice_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub name: String,

    #[serde(default)]
    pub attributes: BTreeMap<String, serde_json::Value>,
}

impl DeviceClass {
    /// A device class with no selectors.
    pub fn new(name: impl Into<String>, resource_version: ResourceVersion) -> Self {
        Self {
            metadata: ObjectMeta {
                name: name.into(),
                namespace: None,
                uid: DeviceClassUid::new(),
                resource_version,
                creation_timestamp: None,
            },
            spec: DeviceClassSpec::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }
}

impl Object for DeviceClass {
    const KIND: &'static str = "DeviceClass";

    fn key(&self) -> ObjectKey {
        self.metadata.key()
    }

    fn resource_version(&self) -> ResourceVersion {
        self.metadata.resource_version
    }
}

impl ResourceSlice {
    /// A single-slice pool of node-local devices.
    pub fn for_node(
        name: impl Into<String>,
        driver: impl Into<String>,
        node_name: impl Into<String>,
        devices: impl IntoIterator<Item = String>,
        resource_version: ResourceVersion,
    ) -> Self {
        let node_name = node_name.into();
        Self {
            metadata: ObjectMeta {
                name: name.into(),
                namespace: None,
                uid: ResourceSliceUid::new(),
                resource_version,
                creation_timestamp: None,
            },
            spec: ResourceSliceSpec {
                driver: driver.into(),
                pool: ResourcePool {
                    name: node_name.clone(),
                    generation: 1,
                    resource_slice_count: 1,
                },
                node_name: Some(node_name),
                all_nodes: false,
                devices: devices
                    .into_iter()
                    .map(|name| Device {
                        name,
                        attributes: BTreeMap::new(),
                    })
                    .collect(),
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }
}

impl Object for ResourceSlice {
    const KIND: &'static str = "ResourceSlice";

    fn key(&self) -> ObjectKey {
        self.metadata.key()
    }

    fn resource_version(&self) -> ResourceVersion {
        self.metadata.resource_version
    }
}
