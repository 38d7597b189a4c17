// Copyright (c) 2024 Jens Obermayer <jens@ds-intg.dev>
// SPDX-License-Identifier: MPL-2.0

//! Central controller driving the dSS notification connection, the poll
//! cycle and the entity registry.

mod handler;

use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use actix::prelude::{Actor, AsyncContext, Context};
use actix::Addr;
use log::info;

use crate::api::events::NotificationClient;
use crate::api::{Apartment, ApiClient};
use crate::configuration::DssSettings;
use crate::hub::messages::{AddEntities, SetAvailability, SetDriverState, WriteState};
use crate::hub::{DriverState, EntityCategory, EntityRegistry, StateUpdate};
use crate::sensor::meter::{CircuitMeterSensor, ModbusMeterSensor};
use crate::sensor::push::DeviceSensor;
use crate::sensor::Discovered;
use handler::{ConnectMsg, PollTick};

pub struct Controller {
    settings: DssSettings,
    api: ApiClient,
    apartment: Rc<Apartment>,
    /// Polled wrappers in registration order.
    circuit_sensors: Vec<Rc<CircuitMeterSensor>>,
    modbus_sensors: Vec<Rc<ModbusMeterSensor>>,
    /// Push wrappers in registration order.
    device_sensors: Vec<Rc<DeviceSensor>>,
    /// Push wrapper lookup for notification routing, keyed by unique_id.
    device_index: HashMap<String, Rc<DeviceSensor>>,
    registry: Addr<EntityRegistry>,
    /// dSS notification listener actor
    notification_client: Option<Addr<NotificationClient>>,
    /// dSS connection state, mirrored into the registry.
    driver_state: DriverState,
    reconnect_duration: Duration,
    reconnect_attempt: u32,
    /// Poll cycle overrun guard: a tick is skipped while the previous one
    /// still runs.
    poll_in_flight: bool,
}

impl Controller {
    pub fn new(
        settings: DssSettings,
        api: ApiClient,
        apartment: Rc<Apartment>,
        discovered: Discovered,
        registry: Addr<EntityRegistry>,
    ) -> Self {
        let device_index = discovered
            .device_sensors
            .iter()
            .map(|sensor| (sensor.unique_id(), Rc::clone(sensor)))
            .collect();

        Self {
            reconnect_duration: settings.reconnect.duration,
            settings,
            api,
            apartment,
            circuit_sensors: discovered.circuit_sensors,
            modbus_sensors: discovered.modbus_sensors,
            device_sensors: discovered.device_sensors,
            device_index,
            registry,
            notification_client: None,
            driver_state: DriverState::Connecting,
            reconnect_attempt: 0,
            poll_in_flight: false,
        }
    }

    fn set_driver_state(&mut self, state: DriverState) {
        self.driver_state = state;
        self.registry.do_send(SetDriverState { state });
    }

    /// Register all discovered entities, mark absent circuits and wire the
    /// push wrappers to the registry.
    fn register_entities(&self) {
        self.registry.do_send(AddEntities::new(
            EntityCategory::CircuitSensor,
            self.circuit_sensors.iter().map(|s| s.entity()).collect(),
        ));
        self.registry.do_send(AddEntities::new(
            EntityCategory::DeviceSensor,
            self.device_sensors.iter().map(|s| s.entity()).collect(),
        ));
        self.registry.do_send(AddEntities::new(
            EntityCategory::ModbusSensor,
            self.modbus_sensors.iter().map(|s| s.entity()).collect(),
        ));

        for sensor in &self.circuit_sensors {
            if !sensor.available() {
                self.registry
                    .do_send(SetAvailability::new(sensor.unique_id(), false));
            }
        }

        let registry = self.registry.clone();
        let write: Rc<dyn Fn(StateUpdate)> =
            Rc::new(move |update| registry.do_send(WriteState::new(update)));
        for sensor in &self.device_sensors {
            sensor.activate(Rc::clone(&write));
        }
    }

    fn increment_reconnect_timeout(&mut self) {
        let new_timeout = Duration::from_millis(
            (self.reconnect_duration.as_millis() as f32 * self.settings.reconnect.backoff_factor)
                as u64,
        );

        self.reconnect_duration = if new_timeout.gt(&self.settings.reconnect.duration_max) {
            self.settings.reconnect.duration_max
        } else {
            new_timeout
        };
        info!(
            "New reconnect timeout: {}",
            self.reconnect_duration.as_millis()
        )
    }
}

impl Actor for Controller {
    type Context = Context<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        info!(
            "Controller started, poll interval {:?}",
            self.settings.poll_interval
        );
        self.register_entities();
        self.set_driver_state(DriverState::Connecting);

        ctx.notify(ConnectMsg {});
        ctx.notify(PollTick {});
        ctx.run_interval(self.settings.poll_interval, |_act, ctx| {
            ctx.notify(PollTick {});
        });
    }
}
