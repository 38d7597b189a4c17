// Copyright (c) 2024 Jens Obermayer <jens@ds-intg.dev>
// SPDX-License-Identifier: MPL-2.0

//! dSS notification WebSocket listener implemented with Actix actors.
//!
//! The dSS streams JSON frames `{"type": "...", "data": {...}}` over
//! `/api/v1/apartment/notifications` once the upgrade request carried a
//! valid bearer token. Only `deviceSensorValue` notifications are of
//! interest here, every other type is ignored.

use std::time::Instant;

use actix::io::SinkWrite;
use actix::{Actor, ActorContext, Addr, AsyncContext, Context};
use actix_codec::Framed;
use awc::ws::Codec;
use awc::{BoxedSocket, ws};
use bytes::Bytes;
use futures::stream::{SplitSink, SplitStream};
use log::{debug, warn};
use serde::de::Error;
use serde_json::Value;
use url::Url;

use crate::Controller;
use crate::api::events::messages::{Close, SensorValueEvent};
use crate::api::events::model::DeviceSensorValue;
use crate::configuration::{ENV_DSS_MSG_TRACING, HeartbeatSettings};
use crate::errors::ServiceError;
use crate::util::msg_tracing_from_env;

mod actor;
mod close_handler;
pub mod messages;
mod model;
mod streamhandler;

pub struct NotificationClient {
    /// Server id (host:port) for log correlation
    id: String,
    sink: SinkWrite<ws::Message, SplitSink<Framed<BoxedSocket, Codec>, ws::Message>>,
    controller_actor: Addr<Controller>,
    /// Last heart beat timestamp.
    last_hb: Instant,
    heartbeat: HeartbeatSettings,
    msg_tracing_in: bool,
    msg_tracing_out: bool,
}

impl NotificationClient {
    pub fn start(
        url: Url,
        controller_actor: Addr<Controller>,
        sink: SplitSink<Framed<BoxedSocket, Codec>, ws::Message>,
        stream: SplitStream<Framed<BoxedSocket, Codec>>,
        heartbeat: HeartbeatSettings,
    ) -> Addr<Self> {
        let (msg_tracing_in, msg_tracing_out) = msg_tracing_from_env(ENV_DSS_MSG_TRACING);
        NotificationClient::create(|ctx| {
            ctx.add_stream(stream);
            let host = url.host_str().unwrap_or(url.as_str());
            let port = url.port_or_known_default().unwrap_or_default();
            NotificationClient {
                id: format!("{host}:{port}"),
                sink: SinkWrite::new(sink, ctx),
                controller_actor,
                last_hb: Instant::now(),
                heartbeat,
                msg_tracing_in,
                msg_tracing_out,
            }
        })
    }

    fn heartbeat(&self, ctx: &mut Context<Self>) {
        ctx.run_later(self.heartbeat.interval, |act, ctx| {
            // check server heartbeats
            if Instant::now().duration_since(act.last_hb) > act.heartbeat.timeout {
                log::error!(
                    "[{}] WebSocket server heartbeat failed, disconnecting!",
                    act.id
                );

                // Stop sending pings & stop actor
                ctx.stop();
                return;
            }

            if act
                .send_message(ws::Message::Ping(Bytes::new()), "Ping", ctx)
                .is_ok()
            {
                act.heartbeat(ctx);
            }
        });
    }

    fn on_text_message(&mut self, txt: Bytes, ctx: &mut Context<NotificationClient>) {
        if self.msg_tracing_in {
            debug!("[{}] -> {:?}", self.id, txt);
        }

        let mut msg = match json_object_from_text_msg(&self.id, txt.as_ref()) {
            Ok(m) => m,
            Err(_) => {
                ctx.notify(Close::invalid());
                return;
            }
        };

        match msg.get("type").and_then(Value::as_str).unwrap_or_default() {
            "deviceSensorValue" => {
                let data = msg.get_mut("data").map(Value::take).unwrap_or(Value::Null);
                match serde_json::from_value::<DeviceSensorValue>(data) {
                    Ok(event) => self.controller_actor.do_send(SensorValueEvent::new(
                        event.dsuid,
                        event.sensor_index,
                        event.sensor_type,
                        event.sensor_value_float,
                    )),
                    Err(e) => {
                        warn!("[{}] Ignoring malformed deviceSensorValue: {e}", self.id);
                    }
                }
            }
            other => {
                debug!("[{}] Ignoring notification type '{other}'", self.id);
            }
        }
    }

    fn on_binary_message(&mut self, _: Bytes, ctx: &mut Context<NotificationClient>) {
        log::error!("[{}] Binary messages not supported! Disconnecting", self.id);
        ctx.notify(Close::unsupported());
    }

    fn on_ping_message(&mut self, bytes: Bytes, ctx: &mut Context<NotificationClient>) {
        debug!("[{}] -> Ping", self.id);
        self.last_hb = Instant::now();
        let _ = self.send_message(ws::Message::Pong(bytes), "Pong", ctx);
    }

    fn on_pong_message(&mut self, _: Bytes, _: &mut Context<NotificationClient>) {
        debug!("[{}] -> Pong", self.id);
        self.last_hb = Instant::now();
    }

    fn send_message(
        &mut self,
        msg: ws::Message,
        name: &str,
        ctx: &mut Context<NotificationClient>,
    ) -> Result<(), ServiceError> {
        if self.msg_tracing_out {
            debug!("[{}] <- {:?}", self.id, msg);
        } else {
            debug!("[{}] <- {}", self.id, name);
        }
        if self.sink.write(msg).is_err() {
            // sink is closed or closing, no chance to send a Close message
            warn!("[{}] Could not send {}, closing connection", self.id, name);
            ctx.stop();
            return Err(ServiceError::NotConnected);
        }
        Ok(())
    }
}

pub fn json_object_from_text_msg(id: &str, txt: &[u8]) -> Result<Value, serde_json::Error> {
    let msg: Value = match serde_json::from_slice(txt) {
        Ok(v) => v,
        Err(e) => {
            warn!("[{id}] Error parsing json message: {e:?}");
            return Err(e);
        }
    };

    if !msg.is_object() {
        warn!("[{id}] Expected json object but got: {msg:?}");
        return Err(serde_json::Error::custom("expected json object in root"));
    }

    Ok(msg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_object_from_text_msg_accepts_objects() {
        let msg = json_object_from_text_msg("test", br#"{"type": "hello"}"#).expect("object");
        assert_eq!(Some("hello"), msg.get("type").and_then(Value::as_str));
    }

    #[test]
    fn json_object_from_text_msg_rejects_non_objects() {
        assert!(json_object_from_text_msg("test", b"[1, 2]").is_err());
        assert!(json_object_from_text_msg("test", b"not json").is_err());
    }
}
