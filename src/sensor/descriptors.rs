// Copyright (c) 2024 Jens Obermayer <jens@ds-intg.dev>
// SPDX-License-Identifier: MPL-2.0

//! Static lookup table mapping digitalSTROM sensor type codes to display metadata.

use std::collections::HashMap;

use lazy_static::lazy_static;
use serde::Serialize;
use strum::Display;

/// Semantic classification of a sensor entity.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DeviceClass {
    ApparentPower,
    AtmosphericPressure,
    CarbonDioxide,
    CarbonMonoxide,
    Current,
    Distance,
    Duration,
    Energy,
    Humidity,
    Illuminance,
    Power,
    PrecipitationIntensity,
    SoundPressure,
    Temperature,
    Water,
    Weight,
    WindSpeed,
}

/// How a sensor value behaves over time, used for long-term statistics.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StateClass {
    /// Point-in-time reading.
    Measurement,
    /// Accumulated amount that may reset or decrease.
    Total,
    /// Monotonically increasing accumulator.
    TotalIncreasing,
}

/// Display metadata for one numeric digitalSTROM sensor type code.
///
/// `scale` converts the raw channel value into the display unit. All types
/// report in their display unit except the flow rate type 72, which delivers
/// L/s and is shown in m³/h.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SensorTypeDescriptor {
    pub code: i32,
    pub name: &'static str,
    pub unit: Option<&'static str>,
    pub device_class: Option<DeviceClass>,
    pub state_class: Option<StateClass>,
    pub scale: f64,
}

impl SensorTypeDescriptor {
    const fn new(
        code: i32,
        name: &'static str,
        unit: Option<&'static str>,
        device_class: Option<DeviceClass>,
        state_class: Option<StateClass>,
    ) -> Self {
        Self {
            code,
            name,
            unit,
            device_class,
            state_class,
            scale: 1.0,
        }
    }

    const fn scaled(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    /// True for the fallback descriptor of unrecognized type codes.
    pub fn is_unknown(&self) -> bool {
        self.code == UNKNOWN_SENSOR_TYPE.code
    }
}

/// Fallback descriptor for sensor type codes not in the table.
pub static UNKNOWN_SENSOR_TYPE: SensorTypeDescriptor =
    SensorTypeDescriptor::new(-1, "Unknown sensor", None, None, None);

/// All known digitalSTROM sensor types, ordered by code.
///
/// Codes follow the ds-basics sensor type enumeration. 4..=25 are zone and
/// climate sensors, 50/51 are heating controller values, 64..=77 are device
/// output and weather station sensors.
pub static SENSOR_TYPES: [SensorTypeDescriptor; 34] = [
    SensorTypeDescriptor::new(
        4,
        "Active Power",
        Some("W"),
        Some(DeviceClass::Power),
        Some(StateClass::Measurement),
    ),
    SensorTypeDescriptor::new(
        5,
        "Output Current",
        Some("mA"),
        Some(DeviceClass::Current),
        Some(StateClass::Measurement),
    ),
    SensorTypeDescriptor::new(
        6,
        "Energy",
        Some("kWh"),
        Some(DeviceClass::Energy),
        Some(StateClass::TotalIncreasing),
    ),
    SensorTypeDescriptor::new(
        9,
        "Room Temperature",
        Some("°C"),
        Some(DeviceClass::Temperature),
        Some(StateClass::Measurement),
    ),
    SensorTypeDescriptor::new(
        10,
        "Outdoor Temperature",
        Some("°C"),
        Some(DeviceClass::Temperature),
        Some(StateClass::Measurement),
    ),
    SensorTypeDescriptor::new(
        11,
        "Room Brightness",
        Some("lx"),
        Some(DeviceClass::Illuminance),
        Some(StateClass::Measurement),
    ),
    SensorTypeDescriptor::new(
        12,
        "Outdoor Brightness",
        Some("lx"),
        Some(DeviceClass::Illuminance),
        Some(StateClass::Measurement),
    ),
    SensorTypeDescriptor::new(
        13,
        "Room Relative Humidity",
        Some("%"),
        Some(DeviceClass::Humidity),
        Some(StateClass::Measurement),
    ),
    SensorTypeDescriptor::new(
        14,
        "Outdoor Relative Humidity",
        Some("%"),
        Some(DeviceClass::Humidity),
        Some(StateClass::Measurement),
    ),
    SensorTypeDescriptor::new(
        15,
        "Air pressure",
        Some("hPa"),
        Some(DeviceClass::AtmosphericPressure),
        Some(StateClass::Measurement),
    ),
    SensorTypeDescriptor::new(
        16,
        "Wind gust speed",
        Some("m/s"),
        Some(DeviceClass::WindSpeed),
        Some(StateClass::Measurement),
    ),
    SensorTypeDescriptor::new(
        17,
        "Wind gust direction",
        Some("°"),
        None,
        Some(StateClass::Measurement),
    ),
    SensorTypeDescriptor::new(
        18,
        "Wind speed average",
        Some("m/s"),
        Some(DeviceClass::WindSpeed),
        Some(StateClass::Measurement),
    ),
    SensorTypeDescriptor::new(
        19,
        "Wind direction",
        Some("°"),
        None,
        Some(StateClass::Measurement),
    ),
    SensorTypeDescriptor::new(
        20,
        "Precipitation intensity of last hour",
        Some("mm/h"),
        Some(DeviceClass::PrecipitationIntensity),
        Some(StateClass::Measurement),
    ),
    SensorTypeDescriptor::new(
        21,
        "Room Carbon Dioxide Concentration",
        Some("ppm"),
        Some(DeviceClass::CarbonDioxide),
        Some(StateClass::Measurement),
    ),
    SensorTypeDescriptor::new(
        22,
        "Room Carbon Monoxide Concentration",
        Some("ppm"),
        Some(DeviceClass::CarbonMonoxide),
        Some(StateClass::Measurement),
    ),
    SensorTypeDescriptor::new(
        25,
        "Sound Pressure Level",
        Some("dB"),
        Some(DeviceClass::SoundPressure),
        Some(StateClass::Measurement),
    ),
    SensorTypeDescriptor::new(
        50,
        "Room Temperature Set Point",
        Some("°C"),
        Some(DeviceClass::Temperature),
        Some(StateClass::Measurement),
    ),
    SensorTypeDescriptor::new(
        51,
        "Room Temperature Control Variable",
        Some("%"),
        None,
        Some(StateClass::Measurement),
    ),
    SensorTypeDescriptor::new(
        64,
        "Output Current",
        Some("mA"),
        Some(DeviceClass::Current),
        Some(StateClass::Measurement),
    ),
    SensorTypeDescriptor::new(
        65,
        "Apparent Power",
        Some("VA"),
        Some(DeviceClass::ApparentPower),
        Some(StateClass::Measurement),
    ),
    SensorTypeDescriptor::new(
        66,
        "Temperature",
        Some("°C"),
        Some(DeviceClass::Temperature),
        Some(StateClass::Measurement),
    ),
    SensorTypeDescriptor::new(
        67,
        "Brightness",
        Some("lx"),
        Some(DeviceClass::Illuminance),
        Some(StateClass::Measurement),
    ),
    SensorTypeDescriptor::new(
        68,
        "Relative Humidity",
        Some("%"),
        Some(DeviceClass::Humidity),
        Some(StateClass::Measurement),
    ),
    SensorTypeDescriptor::new(
        69,
        "Generated Active Power",
        Some("W"),
        Some(DeviceClass::Power),
        Some(StateClass::Measurement),
    ),
    SensorTypeDescriptor::new(
        70,
        "Generated Energy",
        Some("kWh"),
        Some(DeviceClass::Energy),
        Some(StateClass::TotalIncreasing),
    ),
    SensorTypeDescriptor::new(
        71,
        "Water Quantity",
        Some("L"),
        Some(DeviceClass::Water),
        Some(StateClass::Measurement),
    ),
    // delivered as L/s, shown as m³/h
    SensorTypeDescriptor::new(
        72,
        "Water Flow Rate",
        Some("m³/h"),
        None,
        Some(StateClass::Measurement),
    )
    .scaled(M3H_PER_LS),
    SensorTypeDescriptor::new(
        73,
        "Length",
        Some("m"),
        Some(DeviceClass::Distance),
        Some(StateClass::Measurement),
    ),
    SensorTypeDescriptor::new(
        74,
        "Mass",
        Some("g"),
        Some(DeviceClass::Weight),
        Some(StateClass::Measurement),
    ),
    SensorTypeDescriptor::new(
        75,
        "Time",
        Some("s"),
        Some(DeviceClass::Duration),
        Some(StateClass::Measurement),
    ),
    SensorTypeDescriptor::new(
        76,
        "Sun azimuth",
        Some("°"),
        None,
        Some(StateClass::Measurement),
    ),
    SensorTypeDescriptor::new(
        77,
        "Sun elevation",
        Some("°"),
        None,
        Some(StateClass::Measurement),
    ),
];

/// 1 L/s = 3.6 m³/h.
pub const M3H_PER_LS: f64 = 3.6;

lazy_static! {
    static ref SENSOR_TYPES_BY_CODE: HashMap<i32, &'static SensorTypeDescriptor> =
        SENSOR_TYPES.iter().map(|d| (d.code, d)).collect();
}

/// Look up the descriptor for a sensor type code.
///
/// Unknown codes resolve to [`UNKNOWN_SENSOR_TYPE`], never to an error.
pub fn lookup(code: i32) -> &'static SensorTypeDescriptor {
    SENSOR_TYPES_BY_CODE
        .get(&code)
        .copied()
        .unwrap_or(&UNKNOWN_SENSOR_TYPE)
}
