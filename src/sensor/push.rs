// Copyright (c) 2024 Jens Obermayer <jens@ds-intg.dev>
// SPDX-License-Identifier: MPL-2.0

//! Push-based device sensor wrapper.
//!
//! Mirrors one device sensor channel as an entity: metadata comes from the
//! type-code descriptor table, values arrive through the channel's push
//! subscription. The only conversion on this path is the descriptor's
//! `scale` factor.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use serde_json::Map;

use crate::api::channel::{DeviceSensorChannel, SensorSubscription};
use crate::hub::{DeviceIdentity, EntityCategory, SensorEntity, StateUpdate};
use crate::sensor::descriptors::{SensorTypeDescriptor, lookup};

pub struct DeviceSensor {
    channel: Rc<DeviceSensorChannel>,
    sensor_type: Cell<i32>,
    descriptor: Cell<&'static SensorTypeDescriptor>,
    subscription: RefCell<Option<SensorSubscription>>,
}

impl DeviceSensor {
    pub fn new(channel: Rc<DeviceSensorChannel>) -> Self {
        let sensor_type = channel.sensor_type();
        Self {
            channel,
            sensor_type: Cell::new(sensor_type),
            descriptor: Cell::new(lookup(sensor_type)),
            subscription: RefCell::new(None),
        }
    }

    pub fn unique_id(&self) -> String {
        format!(
            "{}_S{}",
            self.channel.device().dsuid,
            self.channel.index()
        )
    }

    pub fn sensor_type(&self) -> i32 {
        self.sensor_type.get()
    }

    /// Re-bind the descriptor after late type discovery. The caller
    /// re-registers the entity afterwards so the new metadata is visible.
    pub fn set_type(&self, sensor_type: i32) {
        self.sensor_type.set(sensor_type);
        self.descriptor.set(lookup(sensor_type));
    }

    /// Registration record with the current descriptor metadata.
    pub fn entity(&self) -> SensorEntity {
        let descriptor = self.descriptor.get();
        let device = self.channel.device();

        let mut name = descriptor.name.to_string();
        if descriptor.is_unknown() {
            name = format!("{name} (type {})", self.sensor_type.get());
        }

        SensorEntity {
            unique_id: self.unique_id(),
            name,
            category: EntityCategory::DeviceSensor,
            unit: descriptor.unit,
            device_class: descriptor.device_class,
            state_class: descriptor.state_class,
            display_precision: Some(1),
            enabled_by_default: !descriptor.is_unknown(),
            device: DeviceIdentity {
                identifier: device.dsuid.clone(),
                name: device.name.clone(),
                manufacturer: device.manufacturer.clone(),
                model: device.hw_info.clone(),
                ..Default::default()
            },
            attributes: Map::new(),
        }
    }

    /// Pure push transition: `None` is ignored, a value is scaled by the
    /// descriptor and becomes exactly one state write.
    pub fn apply_push(&self, value: Option<f64>) -> Option<StateUpdate> {
        let value = value?;
        Some(StateUpdate::new(
            self.unique_id(),
            value * self.descriptor.get().scale,
        ))
    }

    /// Replay the channel's last known value, then subscribe for pushes.
    /// The subscription lives as long as the wrapper.
    pub fn activate(self: &Rc<Self>, write: Rc<dyn Fn(StateUpdate)>) {
        if let Some(update) = self.apply_push(self.channel.last_value()) {
            write(update);
        }

        let wrapper = Rc::clone(self);
        let sink = Rc::clone(&write);
        let subscription = self.channel.subscribe(Rc::new(move |value| {
            if let Some(update) = wrapper.apply_push(value) {
                sink(update);
            }
        }));
        *self.subscription.borrow_mut() = Some(subscription);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::device::Device;
    use rstest::rstest;

    fn channel(sensor_type: i32, last_value: Option<f64>) -> Rc<DeviceSensorChannel> {
        let device = Device {
            dsuid: "302ed89f0000dev1".into(),
            name: "Weather station".into(),
            manufacturer: Some("digitalSTROM AG".into()),
            hw_info: None,
        };
        Rc::new(DeviceSensorChannel::new(device, 3, sensor_type, last_value))
    }

    fn collector() -> (Rc<dyn Fn(StateUpdate)>, Rc<RefCell<Vec<StateUpdate>>>) {
        let updates: Rc<RefCell<Vec<StateUpdate>>> = Rc::default();
        let sink = Rc::clone(&updates);
        (
            Rc::new(move |update| sink.borrow_mut().push(update)),
            updates,
        )
    }

    #[test]
    fn none_push_produces_no_write() {
        let sensor = DeviceSensor::new(channel(9, None));
        assert_eq!(None, sensor.apply_push(None));
    }

    #[rstest]
    #[case::flow_rate_is_scaled(72, 12.5, 45.0)]
    #[case::temperature_passes_through(9, 12.5, 12.5)]
    #[case::power_passes_through(4, 230.0, 230.0)]
    fn push_conversion(#[case] sensor_type: i32, #[case] raw: f64, #[case] displayed: f64) {
        let sensor = DeviceSensor::new(channel(sensor_type, None));
        let update = sensor.apply_push(Some(raw)).expect("state write");
        assert_eq!(displayed, update.value);
        assert_eq!("302ed89f0000dev1_S3", update.unique_id);
    }

    #[test]
    fn unknown_type_is_annotated_and_disabled() {
        let sensor = DeviceSensor::new(channel(1234, None));
        let entity = sensor.entity();

        assert_eq!("Unknown sensor (type 1234)", entity.name);
        assert!(!entity.enabled_by_default);
        assert_eq!(None, entity.unit);
        assert_eq!(Some(1), entity.display_precision);
    }

    #[test]
    fn set_type_rebinds_descriptor() {
        let sensor = DeviceSensor::new(channel(-1, None));
        sensor.set_type(66);
        let entity = sensor.entity();

        assert_eq!("Temperature", entity.name);
        assert_eq!(Some("°C"), entity.unit);
        assert!(entity.enabled_by_default);
    }

    #[test]
    fn activate_replays_cached_value_then_pushes() {
        let channel = channel(9, Some(20.5));
        let sensor = Rc::new(DeviceSensor::new(Rc::clone(&channel)));
        let (write, updates) = collector();

        sensor.activate(write);
        assert_eq!(1, updates.borrow().len());
        assert_eq!(20.5, updates.borrow()[0].value);

        channel.push(Some(21.0));
        assert_eq!(2, updates.borrow().len());
        assert_eq!(21.0, updates.borrow()[1].value);
    }

    #[test]
    fn activate_without_cached_value_replays_nothing() {
        let channel = channel(9, None);
        let sensor = Rc::new(DeviceSensor::new(Rc::clone(&channel)));
        let (write, updates) = collector();

        sensor.activate(write);
        assert!(updates.borrow().is_empty());

        channel.push(None);
        assert!(updates.borrow().is_empty());
    }

    #[test]
    fn entity_carries_device_identity() {
        let sensor = DeviceSensor::new(channel(4, None));
        let entity = sensor.entity();

        assert_eq!(EntityCategory::DeviceSensor, entity.category);
        assert_eq!("302ed89f0000dev1", entity.device.identifier);
        assert_eq!("Weather station", entity.device.name);
        assert_eq!(Some("digitalSTROM AG".into()), entity.device.manufacturer);
    }
}
