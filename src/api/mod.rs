// Copyright (c) 2024 Jens Obermayer <jens@ds-intg.dev>
// SPDX-License-Identifier: MPL-2.0

//! dSS vendor API: HTTPS client, building model and notification listener.

pub mod apartment;
pub mod channel;
pub mod circuit;
pub mod client;
pub mod device;
pub mod events;
pub mod meterings;

pub use apartment::Apartment;
pub use client::ApiClient;
