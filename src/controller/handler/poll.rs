// Copyright (c) 2024 Jens Obermayer <jens@ds-intg.dev>
// SPDX-License-Identifier: MPL-2.0

//! Actix message handler for the metering poll cycle.

use actix::{ActorFutureExt, AsyncContext, Handler, WrapFuture};
use log::{debug, warn};

use crate::controller::handler::PollTick;
use crate::controller::Controller;
use crate::hub::messages::WriteState;

impl Handler<PollTick> for Controller {
    type Result = ();

    fn handle(&mut self, _msg: PollTick, ctx: &mut Self::Context) -> Self::Result {
        if self.poll_in_flight {
            debug!("Skipping poll tick, previous cycle still running");
            return;
        }
        self.poll_in_flight = true;

        let api = self.api.clone();
        let circuit_sensors = self.circuit_sensors.clone();
        let modbus_sensors = self.modbus_sensors.clone();

        ctx.spawn(
            async move {
                let mut updates = Vec::with_capacity(circuit_sensors.len() + modbus_sensors.len());

                // A failed read keeps the previous value, availability only
                // follows the circuit presence flag.
                for sensor in &circuit_sensors {
                    match sensor.poll(&api).await {
                        Ok(update) => updates.push(update),
                        Err(e) => warn!("Poll failed for {}: {e}", sensor.unique_id()),
                    }
                }
                for sensor in &modbus_sensors {
                    match sensor.poll(&api).await {
                        Ok(update) => updates.push(update),
                        Err(e) => warn!("Poll failed for {}: {e}", sensor.unique_id()),
                    }
                }

                updates
            }
            .into_actor(self)
            .map(|updates, act, _ctx| {
                act.poll_in_flight = false;
                debug!("Poll cycle finished with {} readings", updates.len());
                for update in updates {
                    act.registry.do_send(WriteState::new(update));
                }
            }),
        );
    }
}
