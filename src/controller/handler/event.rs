// Copyright (c) 2024 Jens Obermayer <jens@ds-intg.dev>
// SPDX-License-Identifier: MPL-2.0

//! Actix message handler for pushed dSS sensor values.

use actix::Handler;
use log::{debug, info};

use crate::api::events::messages::SensorValueEvent;
use crate::controller::Controller;
use crate::hub::messages::AddEntities;
use crate::hub::EntityCategory;

impl Handler<SensorValueEvent> for Controller {
    type Result = ();

    fn handle(&mut self, msg: SensorValueEvent, _ctx: &mut Self::Context) -> Self::Result {
        let unique_id = format!("{}_S{}", msg.dsuid, msg.index);
        let (Some(sensor), Some(channel)) = (
            self.device_index.get(&unique_id),
            self.apartment.sensor_channel(&msg.dsuid, msg.index),
        ) else {
            debug!("Ignoring pushed value for unknown sensor {unique_id}");
            return;
        };

        // Structures hydrated before the device announced its type carry a
        // placeholder descriptor. The first typed notification corrects it.
        if let Some(sensor_type) = msg.sensor_type {
            if sensor_type != sensor.sensor_type() {
                info!("Sensor {unique_id} declared type {sensor_type}, re-registering");
                sensor.set_type(sensor_type);
                channel.set_sensor_type(sensor_type);
                self.registry.do_send(AddEntities::new(
                    EntityCategory::DeviceSensor,
                    vec![sensor.entity()],
                ));
            }
        }

        channel.push(msg.value);
    }
}
