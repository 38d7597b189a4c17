// Copyright (c) 2024 Jens Obermayer <jens@ds-intg.dev>
// SPDX-License-Identifier: MPL-2.0

//! One-shot entity discovery over the hydrated apartment and the
//! meterings endpoint.

use std::rc::Rc;

use log::{info, warn};

use crate::api::channel::ModbusMeterChannel;
use crate::api::client::ApiClient;
use crate::api::meterings::{ModbusMeterSpec, fetch_meterings};
use crate::api::Apartment;
use crate::sensor::meter::{CircuitMeterSensor, ModbusMeterSensor};
use crate::sensor::push::DeviceSensor;

/// Every sensor wrapper the driver serves, grouped by family.
pub struct Discovered {
    pub circuit_sensors: Vec<Rc<CircuitMeterSensor>>,
    pub device_sensors: Vec<Rc<DeviceSensor>>,
    pub modbus_sensors: Vec<Rc<ModbusMeterSensor>>,
}

/// Builds the wrapper set. Modbus metering discovery is best effort:
/// installations without the meterings endpoint still get circuit and
/// device sensors.
pub async fn discover_sensors(apartment: &Apartment, api: &ApiClient) -> Discovered {
    let circuit_sensors = circuit_sensors(apartment);
    let device_sensors = device_sensors(apartment);
    let modbus_sensors = match fetch_meterings(api).await {
        Ok(specs) => modbus_sensors(specs),
        Err(e) => {
            warn!("Modbus metering discovery failed, continuing without modbus sensors: {e}");
            Vec::new()
        }
    };

    info!(
        "Discovered {} circuit, {} device and {} modbus sensor entities",
        circuit_sensors.len(),
        device_sensors.len(),
        modbus_sensors.len()
    );

    Discovered {
        circuit_sensors,
        device_sensors,
        modbus_sensors,
    }
}

fn circuit_sensors(apartment: &Apartment) -> Vec<Rc<CircuitMeterSensor>> {
    apartment
        .circuit_channels()
        .iter()
        .map(|channel| Rc::new(CircuitMeterSensor::new(channel.clone())))
        .collect()
}

fn device_sensors(apartment: &Apartment) -> Vec<Rc<DeviceSensor>> {
    apartment
        .sensor_channels()
        .iter()
        .map(|channel| Rc::new(DeviceSensor::new(channel.clone())))
        .collect()
}

fn modbus_sensors(specs: Vec<ModbusMeterSpec>) -> Vec<Rc<ModbusMeterSensor>> {
    specs
        .into_iter()
        .map(|spec| Rc::new(ModbusMeterSensor::new(Rc::new(ModbusMeterChannel::new(spec)))))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::meterings::parse_meterings;
    use serde_json::json;

    #[test]
    fn structure_yields_circuit_and_device_wrappers() {
        let structure = json!({
            "data": {
                "circuits": [
                    {"id": "dsm1", "name": "Basement", "isPresent": true}
                ],
                "devices": [
                    {
                        "id": "dev1",
                        "name": "Climate sensor",
                        "sensors": [
                            {"type": 9, "valid": true, "value": 21.5},
                            {"type": 13, "valid": false, "value": 0.0}
                        ]
                    }
                ]
            }
        });
        let apartment = Apartment::from_structure(&structure);

        let circuits = circuit_sensors(&apartment);
        let ids: Vec<String> = circuits.iter().map(|s| s.unique_id()).collect();
        assert_eq!(vec!["dsm1_power", "dsm1_energy"], ids);

        let devices = device_sensors(&apartment);
        let ids: Vec<String> = devices.iter().map(|s| s.unique_id()).collect();
        assert_eq!(vec!["dev1_S0", "dev1_S1"], ids);
    }

    #[test]
    fn one_modbus_meter_with_two_quantities() {
        let response = json!({
            "data": {
                "meterings": [
                    {
                        "id": "em24-power",
                        "type": "powerMetering",
                        "attributes": {
                            "technicalName": "EM24 power",
                            "unit": "W",
                            "origin": {
                                "type": "modbus",
                                "serialNumber": "SN-100",
                                "slaveAddress": 7,
                                "application": "heating",
                                "isGlobal": false
                            }
                        }
                    },
                    {
                        "id": "em24-energy",
                        "type": "energyMetering",
                        "attributes": {
                            "technicalName": "EM24 energy",
                            "unit": "Wh",
                            "origin": {
                                "type": "modbus",
                                "serialNumber": "SN-100",
                                "slaveAddress": 7,
                                "application": "heating",
                                "isGlobal": false
                            }
                        }
                    }
                ]
            }
        });

        let sensors = modbus_sensors(parse_meterings(&response));
        assert_eq!(2, sensors.len());

        let entities: Vec<_> = sensors.iter().map(|s| s.entity()).collect();
        assert_eq!("Power", entities[0].name);
        assert_eq!("Energy Consumed", entities[1].name);
        assert_eq!("modbus_em24-power_power", entities[0].unique_id);
        assert_eq!("modbus_em24-energy_energy_consumed", entities[1].unique_id);
        assert_eq!(entities[0].device.identifier, entities[1].device.identifier);
    }
}
