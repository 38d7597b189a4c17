// Copyright (c) 2024 Jens Obermayer <jens@ds-intg.dev>
// SPDX-License-Identifier: MPL-2.0

//! Telemetry channels of the building model.
//!
//! All channels are single-threaded values living on the system arbiter,
//! interior mutability via `Cell`/`RefCell` only.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::api::circuit::Circuit;
use crate::api::client::ApiClient;
use crate::api::device::Device;
use crate::api::meterings::{MeterKind, ModbusMeterSpec};
use crate::errors::ServiceError;

/// Push-delivery callback. `None` means the notification carried no value.
pub type PushCallback = dyn Fn(Option<f64>);

/// One sensor channel on a terminal device, fed by pushed notifications.
pub struct DeviceSensorChannel {
    device: Device,
    index: u8,
    sensor_type: Cell<i32>,
    last_value: Cell<Option<f64>>,
    subscribers: RefCell<Vec<(u64, Rc<PushCallback>)>>,
    next_subscription: Cell<u64>,
}

impl DeviceSensorChannel {
    pub fn new(device: Device, index: u8, sensor_type: i32, last_value: Option<f64>) -> Self {
        Self {
            device,
            index,
            sensor_type: Cell::new(sensor_type),
            last_value: Cell::new(last_value),
            subscribers: RefCell::new(Vec::new()),
            next_subscription: Cell::new(0),
        }
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn index(&self) -> u8 {
        self.index
    }

    pub fn sensor_type(&self) -> i32 {
        self.sensor_type.get()
    }

    /// Re-declare the channel's type code (late type discovery).
    pub fn set_sensor_type(&self, sensor_type: i32) {
        self.sensor_type.set(sensor_type);
    }

    pub fn last_value(&self) -> Option<f64> {
        self.last_value.get()
    }

    /// Deliver a pushed value to all subscribers.
    ///
    /// A `None` value is forwarded but does not overwrite the cached last
    /// value. The subscriber list is snapshotted before dispatch so a
    /// callback may subscribe or unsubscribe while being invoked.
    pub fn push(&self, value: Option<f64>) {
        if value.is_some() {
            self.last_value.set(value);
        }
        let snapshot: Vec<_> = self
            .subscribers
            .borrow()
            .iter()
            .map(|(_, callback)| Rc::clone(callback))
            .collect();
        for callback in snapshot {
            callback(value);
        }
    }

    /// Install a push subscription. The returned handle unsubscribes when
    /// dropped.
    pub fn subscribe(self: &Rc<Self>, callback: Rc<PushCallback>) -> SensorSubscription {
        let id = self.next_subscription.get();
        self.next_subscription.set(id + 1);
        self.subscribers.borrow_mut().push((id, callback));
        SensorSubscription {
            channel: Rc::downgrade(self),
            id,
        }
    }

    fn unsubscribe(&self, id: u64) {
        self.subscribers
            .borrow_mut()
            .retain(|(subscription, _)| *subscription != id);
    }
}

/// Subscription handle of a [`DeviceSensorChannel`].
pub struct SensorSubscription {
    channel: Weak<DeviceSensorChannel>,
    id: u64,
}

impl Drop for SensorSubscription {
    fn drop(&mut self) {
        if let Some(channel) = self.channel.upgrade() {
            channel.unsubscribe(self.id);
        }
    }
}

/// Power or energy accumulator channel of a circuit (dSM), polled.
pub struct CircuitMeterChannel {
    circuit: Rc<Circuit>,
    kind: MeterKind,
}

impl CircuitMeterChannel {
    pub fn new(circuit: Rc<Circuit>, kind: MeterKind) -> Self {
        Self { circuit, kind }
    }

    pub fn circuit(&self) -> &Circuit {
        &self.circuit
    }

    pub fn kind(&self) -> MeterKind {
        self.kind
    }

    pub fn read_path(&self) -> String {
        format!(
            "apartment/dsMeters/{}/metering/{}",
            self.circuit.dsuid,
            self.kind.circuit_key()
        )
    }

    /// Issue one read, returning the raw accumulator value.
    pub async fn read(&self, api: &ApiClient) -> Result<f64, ServiceError> {
        api.metering_value(&self.read_path()).await
    }
}

/// Modbus metering channel, polled via the metering value endpoint.
pub struct ModbusMeterChannel {
    spec: ModbusMeterSpec,
}

impl ModbusMeterChannel {
    pub fn new(spec: ModbusMeterSpec) -> Self {
        Self { spec }
    }

    pub fn spec(&self) -> &ModbusMeterSpec {
        &self.spec
    }

    pub fn kind(&self) -> MeterKind {
        self.spec.kind
    }

    pub fn read_path(&self) -> String {
        format!("apartment/meterings/{}/value", self.spec.metering_id)
    }

    /// Issue one read, values arrive in the metering's native unit.
    pub async fn read(&self, api: &ApiClient) -> Result<f64, ServiceError> {
        api.metering_value(&self.read_path()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device() -> Device {
        Device {
            dsuid: "dev1".into(),
            name: "Test device".into(),
            manufacturer: None,
            hw_info: None,
        }
    }

    #[test]
    fn push_updates_last_value_and_dispatches() {
        let channel = Rc::new(DeviceSensorChannel::new(device(), 0, 9, None));
        let seen = Rc::new(Cell::new(None));
        let sink = Rc::clone(&seen);
        let _sub = channel.subscribe(Rc::new(move |value| sink.set(value)));

        channel.push(Some(21.5));
        assert_eq!(Some(21.5), channel.last_value());
        assert_eq!(Some(21.5), seen.get());
    }

    #[test]
    fn none_push_keeps_last_value() {
        let channel = Rc::new(DeviceSensorChannel::new(device(), 0, 9, Some(20.0)));
        channel.push(None);
        assert_eq!(Some(20.0), channel.last_value());
    }

    #[test]
    fn dropping_subscription_unsubscribes() {
        let channel = Rc::new(DeviceSensorChannel::new(device(), 0, 9, None));
        let calls = Rc::new(Cell::new(0));
        let sink = Rc::clone(&calls);
        let subscription = channel.subscribe(Rc::new(move |_| sink.set(sink.get() + 1)));

        channel.push(Some(1.0));
        drop(subscription);
        channel.push(Some(2.0));

        assert_eq!(1, calls.get());
    }

    #[test]
    fn callback_may_unsubscribe_another_during_dispatch() {
        let channel = Rc::new(DeviceSensorChannel::new(device(), 0, 9, None));
        let calls = Rc::new(Cell::new(0));
        let stash: Rc<RefCell<Option<SensorSubscription>>> = Rc::default();

        let dropper = Rc::clone(&stash);
        let _killer = channel.subscribe(Rc::new(move |_| {
            dropper.borrow_mut().take();
        }));
        let sink = Rc::clone(&calls);
        *stash.borrow_mut() = Some(channel.subscribe(Rc::new(move |_| sink.set(sink.get() + 1))));

        // first push still reaches the snapshotted subscriber, later ones
        // do not
        channel.push(Some(1.0));
        channel.push(Some(2.0));
        assert_eq!(1, calls.get());
    }

    #[test]
    fn set_sensor_type_rebinds_code() {
        let channel = DeviceSensorChannel::new(device(), 2, -1, None);
        channel.set_sensor_type(66);
        assert_eq!(66, channel.sensor_type());
    }

    #[test]
    fn circuit_read_path_uses_short_keys() {
        let circuit = Rc::new(Circuit {
            dsuid: "dsm1".into(),
            name: "Main".into(),
            manufacturer: None,
            hw_name: None,
            hw_version: None,
            sw_version: None,
            available: true,
        });
        let power = CircuitMeterChannel::new(Rc::clone(&circuit), MeterKind::Power);
        let energy = CircuitMeterChannel::new(circuit, MeterKind::EnergyConsumed);

        assert_eq!("apartment/dsMeters/dsm1/metering/power", power.read_path());
        assert_eq!("apartment/dsMeters/dsm1/metering/energy", energy.read_path());
    }

    #[test]
    fn modbus_read_path_uses_metering_id() {
        use crate::api::meterings::ModbusOrigin;
        let channel = ModbusMeterChannel::new(ModbusMeterSpec {
            metering_id: "m42".into(),
            kind: MeterKind::EnergyConsumed,
            technical_name: "EM24".into(),
            unit: "Wh".into(),
            origin: ModbusOrigin {
                serial_number: "SN1".into(),
                slave_address: "7".into(),
                application: "none".into(),
                is_global: false,
            },
        });
        assert_eq!("apartment/meterings/m42/value", channel.read_path());
    }
}
