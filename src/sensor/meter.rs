// Copyright (c) 2024 Jens Obermayer <jens@ds-intg.dev>
// SPDX-License-Identifier: MPL-2.0

//! Poll-based meter wrappers for circuit (dSM) and modbus meterings.
//!
//! Display metadata is selected by the kind table below, units and
//! precision depend on the wrapper family: circuit energy accumulators
//! arrive in watt-seconds and are shown in kWh, modbus meterings report
//! watt-hours natively and pass through.

use std::rc::Rc;

use serde_json::{Map, json};

use crate::api::channel::{CircuitMeterChannel, ModbusMeterChannel};
use crate::api::client::ApiClient;
use crate::api::meterings::MeterKind;
use crate::errors::ServiceError;
use crate::hub::{DeviceIdentity, EntityCategory, SensorEntity, StateUpdate};
use crate::sensor::descriptors::{DeviceClass, StateClass};

/// Watt-seconds per kilowatt-hour, the circuit energy accumulator unit.
pub const WS_PER_KWH: f64 = 3_600_000.0;

/// Display metadata of one meter kind.
#[derive(Clone, Debug, PartialEq)]
pub struct MeterKindMeta {
    pub name: String,
    pub device_class: Option<DeviceClass>,
    pub state_class: Option<StateClass>,
}

/// Kind key to display metadata. Unrecognized keys get a title-cased name
/// with measurement semantics so future metering types surface usable
/// entities.
pub fn kind_meta(key: &str) -> MeterKindMeta {
    let (name, device_class, state_class) = match key {
        "power" => ("Power", Some(DeviceClass::Power), Some(StateClass::Measurement)),
        "energy_consumed" => (
            "Energy Consumed",
            Some(DeviceClass::Energy),
            Some(StateClass::TotalIncreasing),
        ),
        "power_produced" => (
            "Power Produced",
            Some(DeviceClass::Power),
            Some(StateClass::Measurement),
        ),
        "energy_produced" => (
            "Energy Produced",
            Some(DeviceClass::Energy),
            Some(StateClass::TotalIncreasing),
        ),
        other => {
            return MeterKindMeta {
                name: title_case(other),
                device_class: None,
                state_class: Some(StateClass::Measurement),
            };
        }
    };
    MeterKindMeta {
        name: name.to_string(),
        device_class,
        state_class,
    }
}

fn title_case(key: &str) -> String {
    key.split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Polled power/energy entity of one circuit.
pub struct CircuitMeterSensor {
    channel: Rc<CircuitMeterChannel>,
}

impl CircuitMeterSensor {
    pub fn new(channel: Rc<CircuitMeterChannel>) -> Self {
        Self { channel }
    }

    /// Short historical keys (`power`, `energy`) keep ids stable across
    /// versions.
    pub fn unique_id(&self) -> String {
        format!(
            "{}_{}",
            self.channel.circuit().dsuid,
            self.channel.kind().circuit_key()
        )
    }

    /// Mirrors the owning circuit's `isPresent` flag.
    pub fn available(&self) -> bool {
        self.channel.circuit().available
    }

    pub fn entity(&self) -> SensorEntity {
        let kind = self.channel.kind();
        let meta = kind_meta(kind.key());
        let circuit = self.channel.circuit();
        let (unit, display_precision) = match kind {
            MeterKind::Power | MeterKind::PowerProduced => (Some("W"), Some(0)),
            MeterKind::EnergyConsumed | MeterKind::EnergyProduced => (Some("kWh"), Some(3)),
        };

        SensorEntity {
            unique_id: self.unique_id(),
            name: meta.name,
            category: EntityCategory::CircuitSensor,
            unit,
            device_class: meta.device_class,
            state_class: meta.state_class,
            display_precision,
            enabled_by_default: true,
            device: DeviceIdentity {
                identifier: circuit.dsuid.clone(),
                name: circuit.name.clone(),
                manufacturer: circuit.manufacturer.clone(),
                model: circuit.hw_name.clone(),
                serial_number: None,
                hw_version: circuit.hw_version.clone(),
                sw_version: circuit.sw_version.clone(),
            },
            attributes: Map::new(),
        }
    }

    /// Pure poll transition: energy accumulators convert Ws to kWh, power
    /// passes through.
    pub fn apply_poll(&self, raw: f64) -> StateUpdate {
        let value = match self.channel.kind() {
            MeterKind::EnergyConsumed | MeterKind::EnergyProduced => raw / WS_PER_KWH,
            MeterKind::Power | MeterKind::PowerProduced => raw,
        };
        StateUpdate::new(self.unique_id(), value)
    }

    /// One read and conversion, driven by the poll cycle.
    pub async fn poll(&self, api: &ApiClient) -> Result<StateUpdate, ServiceError> {
        let raw = self.channel.read(api).await?;
        Ok(self.apply_poll(raw))
    }
}

/// Polled entity of one modbus metering. Always available, no upstream
/// liveness signal exists for modbus meters.
pub struct ModbusMeterSensor {
    channel: Rc<ModbusMeterChannel>,
}

impl ModbusMeterSensor {
    pub fn new(channel: Rc<ModbusMeterChannel>) -> Self {
        Self { channel }
    }

    pub fn unique_id(&self) -> String {
        let spec = self.channel.spec();
        format!("modbus_{}_{}", spec.metering_id, spec.kind.key())
    }

    /// Grouping identifier: all quantities of one physical meter share the
    /// (serial number, slave address) pair.
    pub fn group_id(&self) -> String {
        let origin = &self.channel.spec().origin;
        format!("modbus_{}_{}", origin.serial_number, origin.slave_address)
    }

    pub fn entity(&self) -> SensorEntity {
        let spec = self.channel.spec();
        let meta = kind_meta(spec.kind.key());
        let (unit, display_precision) = match spec.kind {
            MeterKind::Power | MeterKind::PowerProduced => (Some("W"), Some(0)),
            MeterKind::EnergyConsumed | MeterKind::EnergyProduced => (Some("Wh"), Some(0)),
        };

        let origin = &spec.origin;
        let mut device_name = if origin.application != "none" {
            format!("Modbus Meter ({})", title_case(&origin.application))
        } else {
            "Modbus Meter".to_string()
        };
        if origin.is_global {
            device_name.push_str(" - Global");
        } else {
            device_name.push_str(&format!(" - Local {}", origin.slave_address));
        }
        device_name.push_str(&format!(" SN:{}", origin.serial_number));

        let mut attributes = Map::new();
        attributes.insert("meter_id".into(), json!(spec.metering_id));
        attributes.insert("serial_number".into(), json!(origin.serial_number));
        attributes.insert("slave_address".into(), json!(origin.slave_address));
        attributes.insert("application".into(), json!(origin.application));
        attributes.insert("is_global".into(), json!(origin.is_global));
        attributes.insert("meter_type".into(), json!(spec.kind.key()));
        attributes.insert("unit".into(), json!(spec.unit));

        SensorEntity {
            unique_id: self.unique_id(),
            name: meta.name,
            category: EntityCategory::ModbusSensor,
            unit,
            device_class: meta.device_class,
            state_class: meta.state_class,
            display_precision,
            enabled_by_default: true,
            device: DeviceIdentity {
                identifier: self.group_id(),
                name: device_name,
                manufacturer: Some("Digitalstrom".into()),
                model: Some("Modbus Energy Meter".into()),
                serial_number: Some(origin.serial_number.clone()),
                hw_version: None,
                sw_version: None,
            },
            attributes,
        }
    }

    /// Pure poll transition: modbus values pass through in their native
    /// unit.
    pub fn apply_poll(&self, raw: f64) -> StateUpdate {
        StateUpdate::new(self.unique_id(), raw)
    }

    /// One read, driven by the poll cycle.
    pub async fn poll(&self, api: &ApiClient) -> Result<StateUpdate, ServiceError> {
        let raw = self.channel.read(api).await?;
        Ok(self.apply_poll(raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::circuit::Circuit;
    use crate::api::meterings::{ModbusMeterSpec, ModbusOrigin};
    use rstest::rstest;

    fn circuit(available: bool) -> Rc<Circuit> {
        Rc::new(Circuit {
            dsuid: "302ed89fdsm1".into(),
            name: "Main distribution".into(),
            manufacturer: Some("digitalSTROM AG".into()),
            hw_name: Some("dSM12".into()),
            hw_version: Some("12.1.1".into()),
            sw_version: Some("1.34.0".into()),
            available,
        })
    }

    fn circuit_sensor(kind: MeterKind, available: bool) -> CircuitMeterSensor {
        CircuitMeterSensor::new(Rc::new(CircuitMeterChannel::new(circuit(available), kind)))
    }

    fn modbus_sensor(kind: MeterKind, origin: ModbusOrigin) -> ModbusMeterSensor {
        ModbusMeterSensor::new(Rc::new(ModbusMeterChannel::new(ModbusMeterSpec {
            metering_id: "m42".into(),
            kind,
            technical_name: "EM24 main".into(),
            unit: "Wh".into(),
            origin,
        })))
    }

    fn local_origin(serial: &str, slave: &str) -> ModbusOrigin {
        ModbusOrigin {
            serial_number: serial.into(),
            slave_address: slave.into(),
            application: "heating".into(),
            is_global: false,
        }
    }

    #[test]
    fn circuit_energy_converts_watt_seconds() {
        let sensor = circuit_sensor(MeterKind::EnergyConsumed, true);
        let update = sensor.apply_poll(3_600_000.0);
        assert_eq!(1.0, update.value);
        assert_eq!("302ed89fdsm1_energy", update.unique_id);
    }

    #[test]
    fn circuit_power_passes_through() {
        let sensor = circuit_sensor(MeterKind::Power, true);
        let update = sensor.apply_poll(235.0);
        assert_eq!(235.0, update.value);
        assert_eq!("302ed89fdsm1_power", update.unique_id);
    }

    #[test]
    fn modbus_energy_passes_through() {
        let sensor = modbus_sensor(MeterKind::EnergyConsumed, local_origin("SN1", "7"));
        let update = sensor.apply_poll(500.0);
        assert_eq!(500.0, update.value);
        assert_eq!("modbus_m42_energy_consumed", update.unique_id);
    }

    #[test]
    fn circuit_availability_mirrors_circuit_flag() {
        assert!(circuit_sensor(MeterKind::Power, true).available());
        assert!(!circuit_sensor(MeterKind::Power, false).available());
    }

    #[test]
    fn circuit_entity_metadata() {
        let entity = circuit_sensor(MeterKind::EnergyConsumed, true).entity();

        assert_eq!("Energy Consumed", entity.name);
        assert_eq!(EntityCategory::CircuitSensor, entity.category);
        assert_eq!(Some("kWh"), entity.unit);
        assert_eq!(Some(DeviceClass::Energy), entity.device_class);
        assert_eq!(Some(StateClass::TotalIncreasing), entity.state_class);
        assert_eq!(Some(3), entity.display_precision);
        assert_eq!("302ed89fdsm1", entity.device.identifier);
        assert_eq!("Main distribution", entity.device.name);
        assert_eq!(Some("dSM12".into()), entity.device.model);
    }

    #[rstest]
    #[case("power", "Power", Some(DeviceClass::Power), Some(StateClass::Measurement))]
    #[case(
        "energy_consumed",
        "Energy Consumed",
        Some(DeviceClass::Energy),
        Some(StateClass::TotalIncreasing)
    )]
    #[case(
        "power_produced",
        "Power Produced",
        Some(DeviceClass::Power),
        Some(StateClass::Measurement)
    )]
    #[case(
        "energy_produced",
        "Energy Produced",
        Some(DeviceClass::Energy),
        Some(StateClass::TotalIncreasing)
    )]
    fn kind_table(
        #[case] key: &str,
        #[case] name: &str,
        #[case] device_class: Option<DeviceClass>,
        #[case] state_class: Option<StateClass>,
    ) {
        let meta = kind_meta(key);
        assert_eq!(name, meta.name);
        assert_eq!(device_class, meta.device_class);
        assert_eq!(state_class, meta.state_class);
    }

    #[test]
    fn unknown_kind_falls_back_to_title_case() {
        let meta = kind_meta("reactive_power");
        assert_eq!("Reactive Power", meta.name);
        assert_eq!(None, meta.device_class);
        assert_eq!(Some(StateClass::Measurement), meta.state_class);
    }

    #[test]
    fn grouping_follows_serial_and_slave() {
        let a = modbus_sensor(MeterKind::Power, local_origin("SN1", "7"));
        let b = modbus_sensor(MeterKind::EnergyConsumed, local_origin("SN1", "7"));
        let c = modbus_sensor(MeterKind::Power, local_origin("SN1", "8"));

        assert_eq!(a.entity().device.identifier, b.entity().device.identifier);
        assert_ne!(a.entity().device.identifier, c.entity().device.identifier);
    }

    #[test]
    fn modbus_device_naming() {
        let local = modbus_sensor(MeterKind::Power, local_origin("A1B2C3", "12"));
        assert_eq!(
            "Modbus Meter (Heating) - Local 12 SN:A1B2C3",
            local.entity().device.name
        );

        let global = modbus_sensor(
            MeterKind::Power,
            ModbusOrigin {
                serial_number: "X9".into(),
                slave_address: "unknown".into(),
                application: "none".into(),
                is_global: true,
            },
        );
        assert_eq!("Modbus Meter - Global SN:X9", global.entity().device.name);
    }

    #[test]
    fn modbus_entity_attributes() {
        let entity = modbus_sensor(MeterKind::EnergyConsumed, local_origin("SN1", "7")).entity();

        assert_eq!(Some("Wh"), entity.unit);
        assert_eq!(Some(0), entity.display_precision);
        assert_eq!(json!("m42"), entity.attributes["meter_id"]);
        assert_eq!(json!("7"), entity.attributes["slave_address"]);
        assert_eq!(json!("energy_consumed"), entity.attributes["meter_type"]);
        assert_eq!(json!(false), entity.attributes["is_global"]);
        assert_eq!(Some("Digitalstrom".into()), entity.device.manufacturer);
        assert_eq!(Some("SN1".into()), entity.device.serial_number);
    }
}
