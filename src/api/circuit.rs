// Copyright (c) 2024 Jens Obermayer <jens@ds-intg.dev>
// SPDX-License-Identifier: MPL-2.0

//! Circuit (dSM) model hydrated from the `apartment/structure` endpoint.

use serde_json::Value;

use crate::util::json::non_empty_str;

/// One digitalSTROM meter and the circuit it powers.
///
/// The dSS pads missing structure fields with empty strings, those are
/// treated as absent.
#[derive(Debug, PartialEq)]
pub struct Circuit {
    pub dsuid: String,
    pub name: String,
    pub manufacturer: Option<String>,
    pub hw_name: Option<String>,
    pub hw_version: Option<String>,
    pub sw_version: Option<String>,
    /// `isPresent` flag from the structure data. Circuits missing the flag
    /// count as present.
    pub available: bool,
}

impl Circuit {
    /// Build a circuit from one entry of the structure `circuits` array.
    ///
    /// Returns `None` if the entry has no usable id.
    pub fn from_json(obj: &Value) -> Option<Self> {
        let dsuid = non_empty_str(obj, "id")?;
        let name = non_empty_str(obj, "name").unwrap_or_else(|| dsuid.clone());
        Some(Self {
            dsuid,
            name,
            manufacturer: non_empty_str(obj, "manufacturer"),
            hw_name: non_empty_str(obj, "hardwareName"),
            hw_version: non_empty_str(obj, "hardwareVersion"),
            sw_version: non_empty_str(obj, "softwareVersion"),
            available: obj
                .get("isPresent")
                .and_then(Value::as_bool)
                .unwrap_or(true),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn from_json_reads_all_fields() {
        let circuit = Circuit::from_json(&json!({
            "id": "302ed89f43f00e40000dsm1",
            "name": "Kitchen",
            "manufacturer": "digitalSTROM AG",
            "hardwareName": "dSM12",
            "hardwareVersion": "12.1.1",
            "softwareVersion": "1.34.0",
            "isPresent": true
        }))
        .expect("circuit");

        assert_eq!("302ed89f43f00e40000dsm1", circuit.dsuid);
        assert_eq!("Kitchen", circuit.name);
        assert_eq!(Some("dSM12".into()), circuit.hw_name);
        assert!(circuit.available);
    }

    #[test]
    fn missing_id_yields_none() {
        assert!(Circuit::from_json(&json!({ "name": "orphan" })).is_none());
        assert!(Circuit::from_json(&json!({ "id": "" })).is_none());
    }

    #[test]
    fn empty_strings_are_absent_and_name_falls_back_to_dsuid() {
        let circuit = Circuit::from_json(&json!({
            "id": "dsm2",
            "name": "",
            "manufacturer": ""
        }))
        .expect("circuit");

        assert_eq!("dsm2", circuit.name);
        assert_eq!(None, circuit.manufacturer);
        // missing isPresent counts as present
        assert!(circuit.available);
    }

    #[test]
    fn absent_circuit_is_unavailable() {
        let circuit = Circuit::from_json(&json!({
            "id": "dsm3",
            "isPresent": false
        }))
        .expect("circuit");
        assert!(!circuit.available);
    }
}
