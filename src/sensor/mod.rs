// Copyright (c) 2024 Jens Obermayer <jens@ds-intg.dev>
// SPDX-License-Identifier: MPL-2.0

//! Sensor entity layer: descriptor tables and the wrappers that turn
//! apartment channels into registry entities.

pub mod descriptors;
pub mod discovery;
pub mod meter;
pub mod push;

pub use discovery::{Discovered, discover_sensors};
