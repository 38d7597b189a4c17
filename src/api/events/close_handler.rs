// Copyright (c) 2024 Jens Obermayer <jens@ds-intg.dev>
// SPDX-License-Identifier: MPL-2.0

//! Actix actor handler implementation for the `Close` message

use std::time::Duration;

use actix::{ActorContext, AsyncContext, Handler};
use awc::ws;
use awc::ws::CloseReason;
use log::info;

use crate::api::events::NotificationClient;
use crate::api::events::messages::Close;

impl Handler<Close> for NotificationClient {
    type Result = ();

    fn handle(&mut self, msg: Close, ctx: &mut Self::Context) -> Self::Result {
        info!("[{}] Close msg: sending Close to dSS", self.id);
        // Graceful shutdown first: the server answers with a Close frame
        // which stops the context. If send_message fails the actor is
        // already closed.
        if self
            .send_message(
                ws::Message::Close(Some(CloseReason {
                    code: msg.code,
                    description: msg.description,
                })),
                "Close",
                ctx,
            )
            .is_ok()
        {
            // Hard disconnect as safety net if the connection is stale
            ctx.run_later(Duration::from_millis(100), move |act, ctx| {
                info!("[{}] Force stopping actor", act.id);
                act.sink.close();
                ctx.stop();
            });
        }
    }
}
