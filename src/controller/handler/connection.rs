// Copyright (c) 2024 Jens Obermayer <jens@ds-intg.dev>
// SPDX-License-Identifier: MPL-2.0

//! Actix message handlers for dSS notification connection messages.

use std::io::Error;

use actix::{fut, ActorFutureExt, AsyncContext, Handler, ResponseActFuture, WrapFuture};
use futures::StreamExt;
use log::{debug, info, warn};

use crate::api::events::messages::{ConnectionEvent, ConnectionState};
use crate::api::events::NotificationClient;
use crate::controller::handler::ConnectMsg;
use crate::controller::Controller;
use crate::hub::DriverState;

impl Handler<ConnectionEvent> for Controller {
    type Result = ();

    fn handle(&mut self, msg: ConnectionEvent, ctx: &mut Self::Context) -> Self::Result {
        match msg.state {
            ConnectionState::Connected => {
                self.set_driver_state(DriverState::Connected);
            }
            ConnectionState::Closed => {
                info!("dSS notification listener disconnected: {}", msg.client_id);
                self.notification_client = None;

                if matches!(
                    self.driver_state,
                    DriverState::Connecting | DriverState::Connected
                ) {
                    info!("Start reconnecting to dSS: {}", msg.client_id);
                    self.set_driver_state(DriverState::Connecting);

                    ctx.notify(ConnectMsg {});
                }
            }
        };
    }
}

impl Handler<ConnectMsg> for Controller {
    type Result = ResponseActFuture<Self, Result<(), Error>>;

    fn handle(&mut self, _msg: ConnectMsg, ctx: &mut Self::Context) -> Self::Result {
        if self.notification_client.is_some() {
            debug!("Notification listener already connected");
            return Box::pin(fut::result(Ok(())));
        }

        let url = self.settings.notification_url();
        let api = self.api.clone();
        let max_frame_size = self.settings.max_frame_size_kb * 1024;
        let controller = ctx.address();
        let heartbeat = self.settings.heartbeat;

        Box::pin(
            async move {
                debug!("Connecting to: {url}");

                let framed = match api.ws(&url, max_frame_size).await {
                    Ok((_, framed)) => framed,
                    Err(e) => {
                        warn!("Could not connect to {url}: {e:?}");
                        return Err(Error::other(e.to_string()));
                    }
                };
                info!("Connected to: {url} ({heartbeat})");

                let (sink, stream) = framed.split();
                let addr = NotificationClient::start(url, controller, sink, stream, heartbeat);

                Ok(addr)
            }
            .into_actor(self) // converts future to ActorFuture
            .map(move |result, act, ctx| match result {
                Ok(addr) => {
                    act.notification_client = Some(addr);
                    act.reconnect_duration = act.settings.reconnect.duration;
                    act.reconnect_attempt = 0;
                    Ok(())
                }
                Err(e) => {
                    if act.driver_state != DriverState::Disconnected {
                        act.reconnect_attempt += 1;
                        if act.settings.reconnect.attempts > 0
                            && act.reconnect_attempt > act.settings.reconnect.attempts
                        {
                            info!(
                                "Max reconnect attempts reached ({}). Giving up!",
                                act.settings.reconnect.attempts
                            );
                            act.set_driver_state(DriverState::Error);
                        } else {
                            ctx.notify_later(ConnectMsg {}, act.reconnect_duration);
                            act.increment_reconnect_timeout();
                        }
                    }
                    Err(e)
                }
            }),
        )
    }
}
