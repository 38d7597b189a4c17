// Copyright (c) 2024 Jens Obermayer <jens@ds-intg.dev>
// SPDX-License-Identifier: MPL-2.0

//! Metering list (`apartment/meterings`) parsing.
//!
//! The endpoint lists every metering the dSS knows about; only entries with
//! a modbus origin become entities here. Parsing is tolerant: a response of
//! unexpected shape yields an empty list, never an error. Expected shape:
//!
//! ```json
//! {"data": {"meterings": [{
//!     "id": "...", "type": "powerMetering",
//!     "attributes": {
//!         "technicalName": "...", "unit": "W",
//!         "origin": {"type": "modbus", "serialNumber": "...",
//!                    "slaveAddress": 12, "application": "heating",
//!                    "isGlobal": false}
//!     }
//! }]}}
//! ```

use log::debug;
use serde_json::Value;
use strum::{Display, IntoStaticStr};

use crate::api::client::ApiClient;
use crate::errors::ServiceError;
use crate::util::json::{bool_value, non_empty_str, str_value};

/// Meter quantity kinds, shared by circuit and modbus meters.
#[derive(Clone, Copy, Debug, Display, IntoStaticStr, PartialEq, Eq, Hash)]
#[strum(serialize_all = "snake_case")]
pub enum MeterKind {
    Power,
    EnergyConsumed,
    PowerProduced,
    EnergyProduced,
}

impl MeterKind {
    /// Map the `type` field of a metering entry.
    pub fn from_metering_type(metering_type: &str) -> Option<Self> {
        match metering_type {
            "powerMetering" => Some(Self::Power),
            "energyMetering" => Some(Self::EnergyConsumed),
            "powerProducedMetering" => Some(Self::PowerProduced),
            "energyProducedMetering" => Some(Self::EnergyProduced),
            _ => None,
        }
    }

    /// Key used in modbus unique ids, e.g. `energy_consumed`.
    pub fn key(self) -> &'static str {
        self.into()
    }

    /// Short key used in circuit meter unique ids and read paths. Circuit
    /// meters only exist in the consumed variants.
    pub fn circuit_key(self) -> &'static str {
        match self {
            Self::Power | Self::PowerProduced => "power",
            Self::EnergyConsumed | Self::EnergyProduced => "energy",
        }
    }
}

/// Origin metadata of a modbus metering, used for device grouping.
#[derive(Clone, Debug, PartialEq)]
pub struct ModbusOrigin {
    pub serial_number: String,
    pub slave_address: String,
    pub application: String,
    pub is_global: bool,
}

/// One modbus metering to build an entity for.
#[derive(Clone, Debug, PartialEq)]
pub struct ModbusMeterSpec {
    pub metering_id: String,
    pub kind: MeterKind,
    pub technical_name: String,
    pub unit: String,
    pub origin: ModbusOrigin,
}

/// Fetch and parse the metering list.
pub async fn fetch_meterings(api: &ApiClient) -> Result<Vec<ModbusMeterSpec>, ServiceError> {
    let response = api.request("apartment/meterings").await?;
    Ok(parse_meterings(&response))
}

/// Extract the modbus metering specs from a metering-list response.
pub fn parse_meterings(response: &Value) -> Vec<ModbusMeterSpec> {
    let Some(meterings) = response
        .pointer("/data/meterings")
        .and_then(Value::as_array)
    else {
        debug!("No meterings in response");
        return Vec::new();
    };
    meterings.iter().filter_map(spec_from_entry).collect()
}

fn spec_from_entry(entry: &Value) -> Option<ModbusMeterSpec> {
    let metering_id = non_empty_str(entry, "id")?;

    let origin = entry.pointer("/attributes/origin")?;
    if str_value(origin, "type") != Some("modbus") {
        debug!("Skipping non-modbus metering {metering_id}");
        return None;
    }

    let kind = match str_value(entry, "type").and_then(MeterKind::from_metering_type) {
        Some(kind) => kind,
        None => {
            debug!("Skipping modbus metering {metering_id} with unsupported type");
            return None;
        }
    };

    let attributes = entry.get("attributes")?;
    Some(ModbusMeterSpec {
        technical_name: non_empty_str(attributes, "technicalName")
            .unwrap_or_else(|| format!("Meter {metering_id}")),
        unit: non_empty_str(attributes, "unit").unwrap_or_default(),
        origin: ModbusOrigin {
            serial_number: origin_field(origin, "serialNumber", "unknown"),
            slave_address: origin_field(origin, "slaveAddress", "unknown"),
            application: origin_field(origin, "application", "none"),
            is_global: bool_value(origin, "isGlobal"),
        },
        metering_id,
        kind,
    })
}

/// Origin fields hold strings or numbers depending on firmware.
fn origin_field(origin: &Value, key: &str, fallback: &str) -> String {
    match origin.get(key) {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => fallback.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn modbus_entry(id: &str, metering_type: &str) -> Value {
        json!({
            "id": id,
            "type": metering_type,
            "attributes": {
                "technicalName": "EM24 main",
                "unit": "W",
                "origin": {
                    "type": "modbus",
                    "serialNumber": "A1B2C3",
                    "slaveAddress": 12,
                    "application": "heating",
                    "isGlobal": false
                }
            }
        })
    }

    #[test]
    fn two_modbus_entries_yield_two_specs() {
        let response = json!({"data": {"meterings": [
            modbus_entry("m1", "powerMetering"),
            modbus_entry("m2", "energyMetering"),
        ]}});

        let specs = parse_meterings(&response);
        assert_eq!(2, specs.len());
        assert_eq!(MeterKind::Power, specs[0].kind);
        assert_eq!(MeterKind::EnergyConsumed, specs[1].kind);
        assert_eq!("A1B2C3", specs[0].origin.serial_number);
        assert_eq!("12", specs[0].origin.slave_address);
    }

    #[test]
    fn non_modbus_origin_is_skipped() {
        let mut entry = modbus_entry("m1", "powerMetering");
        entry["attributes"]["origin"]["type"] = json!("dsm");
        let response = json!({"data": {"meterings": [entry]}});
        assert!(parse_meterings(&response).is_empty());
    }

    #[rstest]
    #[case::missing_data(json!({}))]
    #[case::data_not_object(json!({"data": 42}))]
    #[case::missing_meterings(json!({"data": {}}))]
    #[case::meterings_not_array(json!({"data": {"meterings": {}}}))]
    fn malformed_response_yields_empty_list(#[case] response: Value) {
        assert!(parse_meterings(&response).is_empty());
    }

    #[test]
    fn unsupported_metering_type_is_skipped() {
        let response = json!({"data": {"meterings": [
            modbus_entry("m1", "reactivePowerMetering"),
            modbus_entry("m2", "energyProducedMetering"),
        ]}});

        let specs = parse_meterings(&response);
        assert_eq!(1, specs.len());
        assert_eq!(MeterKind::EnergyProduced, specs[0].kind);
    }

    #[test]
    fn origin_fields_fall_back_when_missing() {
        let response = json!({"data": {"meterings": [{
            "id": "m9",
            "type": "powerMetering",
            "attributes": {"origin": {"type": "modbus"}}
        }]}});

        let specs = parse_meterings(&response);
        assert_eq!(1, specs.len());
        assert_eq!("unknown", specs[0].origin.serial_number);
        assert_eq!("unknown", specs[0].origin.slave_address);
        assert_eq!("none", specs[0].origin.application);
        assert!(!specs[0].origin.is_global);
        assert_eq!("Meter m9", specs[0].technical_name);
        assert_eq!("", specs[0].unit);
    }

    #[rstest]
    #[case("powerMetering", MeterKind::Power, "power")]
    #[case("energyMetering", MeterKind::EnergyConsumed, "energy_consumed")]
    #[case("powerProducedMetering", MeterKind::PowerProduced, "power_produced")]
    #[case("energyProducedMetering", MeterKind::EnergyProduced, "energy_produced")]
    fn kind_keys(#[case] metering_type: &str, #[case] kind: MeterKind, #[case] key: &str) {
        assert_eq!(Some(kind), MeterKind::from_metering_type(metering_type));
        assert_eq!(key, kind.key());
    }

    #[rstest]
    #[case(MeterKind::Power, "power")]
    #[case(MeterKind::EnergyConsumed, "energy")]
    fn circuit_keys(#[case] kind: MeterKind, #[case] key: &str) {
        assert_eq!(key, kind.circuit_key());
    }
}
