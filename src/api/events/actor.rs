// Copyright (c) 2024 Jens Obermayer <jens@ds-intg.dev>
// SPDX-License-Identifier: MPL-2.0

//! Actix `Actor` trait implementation.

use actix::{Actor, Context};
use log::debug;

use crate::api::events::NotificationClient;
use crate::api::events::messages::{ConnectionEvent, ConnectionState};

impl Actor for NotificationClient {
    type Context = Context<Self>;

    fn started(&mut self, ctx: &mut Context<Self>) {
        debug!("[{}] Notification listener started", self.id);
        self.heartbeat(ctx);
        // authentication happened during the upgrade request, the socket is
        // live once the actor runs
        self.controller_actor.do_send(ConnectionEvent {
            client_id: self.id.clone(),
            state: ConnectionState::Connected,
        });
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        debug!("[{}] Notification listener stopped", self.id);
        self.controller_actor.do_send(ConnectionEvent {
            client_id: self.id.clone(),
            state: ConnectionState::Closed,
        });
    }
}
