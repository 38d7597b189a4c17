// Copyright (c) 2024 Jens Obermayer <jens@ds-intg.dev>
// SPDX-License-Identifier: MPL-2.0

//! Actix message handlers.

mod connection;
mod event;
mod poll;

use actix::Message;

/// Internal message to connect to the dSS notification socket.
#[derive(Message, Default)]
#[rtype(result = "Result<(), std::io::Error>")]
pub(crate) struct ConnectMsg {}

/// Internal message starting one poll cycle over all metered channels.
#[derive(Message, Default)]
#[rtype(result = "()")]
pub(crate) struct PollTick {}
