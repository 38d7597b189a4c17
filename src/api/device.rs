// Copyright (c) 2024 Jens Obermayer <jens@ds-intg.dev>
// SPDX-License-Identifier: MPL-2.0

//! Terminal-block device model hydrated from `apartment/structure`.

use serde_json::Value;

use crate::util::json::non_empty_str;

/// One digitalSTROM terminal device. Plain value type, sensor channels keep
/// their own copy as owner snapshot.
#[derive(Clone, Debug, PartialEq)]
pub struct Device {
    pub dsuid: String,
    pub name: String,
    pub manufacturer: Option<String>,
    pub hw_info: Option<String>,
}

impl Device {
    /// Build a device from one entry of the structure `devices` array.
    ///
    /// Returns `None` if the entry has no usable id.
    pub fn from_json(obj: &Value) -> Option<Self> {
        let dsuid = non_empty_str(obj, "id")?;
        let name = non_empty_str(obj, "name").unwrap_or_else(|| dsuid.clone());
        Some(Self {
            dsuid,
            name,
            manufacturer: non_empty_str(obj, "manufacturer"),
            hw_info: non_empty_str(obj, "hardwareInfo"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn from_json_reads_fields() {
        let device = Device::from_json(&json!({
            "id": "302ed89f43f0000000000dev1",
            "name": "Ceiling light",
            "manufacturer": "digitalSTROM AG",
            "hardwareInfo": "GE-KM200"
        }))
        .expect("device");

        assert_eq!("302ed89f43f0000000000dev1", device.dsuid);
        assert_eq!("Ceiling light", device.name);
        assert_eq!(Some("GE-KM200".into()), device.hw_info);
    }

    #[test]
    fn unnamed_device_uses_dsuid() {
        let device = Device::from_json(&json!({ "id": "dev2" })).expect("device");
        assert_eq!("dev2", device.name);
        assert_eq!(None, device.manufacturer);
    }

    #[test]
    fn missing_id_yields_none() {
        assert!(Device::from_json(&json!({ "name": "ghost" })).is_none());
    }
}
