// Copyright (c) 2024 Jens Obermayer <jens@ds-intg.dev>
// SPDX-License-Identifier: MPL-2.0

//! Actix actor message definitions for the notification listener.

use actix::prelude::Message;
use awc::ws::CloseCode;
use derive_more::Constructor;

/// Notification socket connection states
pub enum ConnectionState {
    Connected,
    Closed,
}

/// Notification socket connection events
#[derive(Message)]
#[rtype(result = "()")]
pub struct ConnectionEvent {
    pub client_id: String,
    pub state: ConnectionState,
}

/// Pushed device sensor value, forwarded to the controller.
#[derive(Constructor, Message)]
#[rtype(result = "()")]
pub struct SensorValueEvent {
    pub dsuid: String,
    pub index: u8,
    /// Declared type code, if the notification carried one.
    pub sensor_type: Option<i32>,
    pub value: Option<f64>,
}

/// Listener request: disconnect and close the session.
// Used internally by the listener and from the controller.
#[derive(Message)]
#[rtype(result = "()")]
pub struct Close {
    /// WebSocket close code
    pub code: CloseCode,
    pub description: Option<String>,
}

impl Default for Close {
    fn default() -> Self {
        Self {
            code: CloseCode::Normal,
            description: None,
        }
    }
}

impl Close {
    pub fn invalid() -> Self {
        Self {
            code: CloseCode::Invalid,
            description: None,
        }
    }
    pub fn unsupported() -> Self {
        Self {
            code: CloseCode::Unsupported,
            description: None,
        }
    }
}
