// Copyright (c) 2024 Jens Obermayer <jens@ds-intg.dev>
// SPDX-License-Identifier: MPL-2.0

//! Apartment model: circuits, devices and their telemetry channels,
//! hydrated once at startup from `apartment/structure`.

use std::collections::HashMap;
use std::rc::Rc;

use log::{info, warn};
use serde_json::Value;

use crate::api::channel::{CircuitMeterChannel, DeviceSensorChannel};
use crate::api::circuit::Circuit;
use crate::api::client::ApiClient;
use crate::api::device::Device;
use crate::api::meterings::MeterKind;
use crate::errors::ServiceError;
use crate::util::json::{bool_value, f64_value};

pub struct Apartment {
    circuits: Vec<Rc<Circuit>>,
    /// Two channels per circuit (power, energy), in structure order.
    circuit_channels: Vec<Rc<CircuitMeterChannel>>,
    /// All device sensor channels, in structure order.
    sensor_channels: Vec<Rc<DeviceSensorChannel>>,
    channels_by_device: HashMap<String, Vec<Rc<DeviceSensorChannel>>>,
}

impl Apartment {
    /// Fetch the structure endpoint and hydrate the model. The model must
    /// exist before anything else runs, callers treat an `Err` as fatal.
    pub async fn fetch(api: &ApiClient) -> Result<Self, ServiceError> {
        let structure = api.request("apartment/structure").await?;
        Ok(Self::from_structure(&structure))
    }

    /// Hydrate from a structure response. Tolerant: missing or malformed
    /// sections yield an empty model section, entries without id are
    /// skipped.
    pub fn from_structure(structure: &Value) -> Self {
        let mut circuits = Vec::new();
        let mut circuit_channels = Vec::new();
        if let Some(entries) = structure.pointer("/data/circuits").and_then(Value::as_array) {
            for entry in entries {
                let Some(circuit) = Circuit::from_json(entry) else {
                    warn!("Skipping circuit entry without id");
                    continue;
                };
                let circuit = Rc::new(circuit);
                for kind in [MeterKind::Power, MeterKind::EnergyConsumed] {
                    circuit_channels
                        .push(Rc::new(CircuitMeterChannel::new(Rc::clone(&circuit), kind)));
                }
                circuits.push(circuit);
            }
        }

        let mut sensor_channels: Vec<Rc<DeviceSensorChannel>> = Vec::new();
        let mut channels_by_device: HashMap<String, Vec<Rc<DeviceSensorChannel>>> = HashMap::new();
        if let Some(entries) = structure.pointer("/data/devices").and_then(Value::as_array) {
            for entry in entries {
                let Some(device) = Device::from_json(entry) else {
                    warn!("Skipping device entry without id");
                    continue;
                };
                let Some(sensors) = entry.get("sensors").and_then(Value::as_array) else {
                    continue;
                };
                for (index, sensor) in sensors.iter().enumerate() {
                    let Ok(index) = u8::try_from(index) else {
                        warn!("Device {} has too many sensors, truncating", device.dsuid);
                        break;
                    };
                    let sensor_type = sensor
                        .get("type")
                        .and_then(Value::as_i64)
                        .map(|t| t as i32)
                        .unwrap_or(-1);
                    // only a valid reading seeds the cached value
                    let seeded = if bool_value(sensor, "valid") {
                        f64_value(sensor, "value")
                    } else {
                        None
                    };
                    let channel = Rc::new(DeviceSensorChannel::new(
                        device.clone(),
                        index,
                        sensor_type,
                        seeded,
                    ));
                    sensor_channels.push(Rc::clone(&channel));
                    channels_by_device
                        .entry(device.dsuid.clone())
                        .or_default()
                        .push(channel);
                }
            }
        }

        info!(
            "Apartment structure: {} circuits, {} devices, {} sensor channels",
            circuits.len(),
            channels_by_device.len(),
            sensor_channels.len()
        );

        Self {
            circuits,
            circuit_channels,
            sensor_channels,
            channels_by_device,
        }
    }

    pub fn circuits(&self) -> &[Rc<Circuit>] {
        &self.circuits
    }

    pub fn circuit_channels(&self) -> &[Rc<CircuitMeterChannel>] {
        &self.circuit_channels
    }

    pub fn sensor_channels(&self) -> &[Rc<DeviceSensorChannel>] {
        &self.sensor_channels
    }

    /// Find the sensor channel a pushed notification addresses.
    pub fn sensor_channel(&self, dsuid: &str, index: u8) -> Option<&Rc<DeviceSensorChannel>> {
        self.channels_by_device
            .get(dsuid)?
            .iter()
            .find(|channel| channel.index() == index)
    }
}
