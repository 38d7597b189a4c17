// Copyright (c) 2024 Jens Obermayer <jens@ds-intg.dev>
// SPDX-License-Identifier: MPL-2.0

//! Entity hub: registry actor, entity model and registry messages.

pub mod messages;
mod model;
mod registry;

pub use model::*;
pub use registry::EntityRegistry;
