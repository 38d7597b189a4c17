// Copyright (c) 2024 Jens Obermayer <jens@ds-intg.dev>
// SPDX-License-Identifier: MPL-2.0

//! Notification frame payload models.

use serde::Deserialize;

/// Payload of a `deviceSensorValue` notification.
///
/// `sensorType` and `sensorValueFloat` are optional on the wire, older dSS
/// versions omit them for invalid readings.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceSensorValue {
    pub dsuid: String,
    pub sensor_index: u8,
    #[serde(default)]
    pub sensor_type: Option<i32>,
    #[serde(default)]
    pub sensor_value_float: Option<f64>,
}
