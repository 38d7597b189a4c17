// Copyright (c) 2024 Jens Obermayer <jens@ds-intg.dev>
// SPDX-License-Identifier: MPL-2.0

//! Local REST API exposing driver status and discovered entities.

mod api;
pub mod web_model;

pub use api::{entities, status};
