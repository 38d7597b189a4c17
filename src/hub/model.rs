// Copyright (c) 2024 Jens Obermayer <jens@ds-intg.dev>
// SPDX-License-Identifier: MPL-2.0

//! Entity model shared between the sensor wrappers, the registry and the HTTP API.

use derive_more::Constructor;
use serde::Serialize;
use serde_json::{Map, Value};
use strum::Display;

use crate::sensor::descriptors::{DeviceClass, StateClass};

/// Registration batch category, in registration order.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EntityCategory {
    CircuitSensor,
    DeviceSensor,
    ModbusSensor,
}

/// Connection state of the driver towards the dSS.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum DriverState {
    Disconnected,
    Connecting,
    Connected,
    Error,
}

/// Grouping device shown for a set of related sensor entities.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct DeviceIdentity {
    pub identifier: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serial_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hw_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sw_version: Option<String>,
}

/// Registration record for one sensor entity.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SensorEntity {
    pub unique_id: String,
    pub name: String,
    pub category: EntityCategory,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_class: Option<DeviceClass>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_class: Option<StateClass>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_precision: Option<u8>,
    pub enabled_by_default: bool,
    pub device: DeviceIdentity,
    /// Additional vendor attributes, e.g. modbus origin details.
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub attributes: Map<String, Value>,
}

/// State write for one entity.
#[derive(Clone, Constructor, Debug, PartialEq)]
pub struct StateUpdate {
    pub unique_id: String,
    pub value: f64,
}

/// One registered entity with its live state, as exposed on the HTTP API.
#[derive(Clone, Debug, Serialize)]
pub struct EntityView {
    #[serde(flatten)]
    pub entity: SensorEntity,
    pub value: Option<f64>,
    pub available: bool,
}

/// Registry summary for the status endpoint.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct DriverStatus {
    pub state: DriverState,
    pub entity_count: usize,
}
