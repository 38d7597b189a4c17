// Copyright (c) 2024 Jens Obermayer <jens@ds-intg.dev>
// SPDX-License-Identifier: MPL-2.0

//! Actix Actor message definitions for the entity registry.

use actix::prelude::Message;
use derive_more::Constructor;

use crate::errors::ServiceError;
use crate::hub::model::{
    DriverState, DriverStatus, EntityCategory, EntityView, SensorEntity, StateUpdate,
};

/// Register a batch of entities.
///
/// Re-registering a known `unique_id` replaces the entity metadata and keeps
/// the stored value and availability.
#[derive(Constructor, Message)]
#[rtype(result = "()")]
pub struct AddEntities {
    pub category: EntityCategory,
    pub entities: Vec<SensorEntity>,
}

/// Write a new state value for one entity.
#[derive(Constructor, Message)]
#[rtype(result = "()")]
pub struct WriteState {
    pub update: StateUpdate,
}

/// Availability change for one entity.
#[derive(Constructor, Message)]
#[rtype(result = "()")]
pub struct SetAvailability {
    pub unique_id: String,
    pub available: bool,
}

/// Snapshot of all registered entities in registration order.
#[derive(Message)]
#[rtype(result = "Result<Vec<EntityView>, ServiceError>")]
pub struct GetEntities;

/// Registry summary for the status endpoint.
#[derive(Message)]
#[rtype(result = "Result<DriverStatus, ServiceError>")]
pub struct GetDriverStatus;

/// dSS connection state change, published by the controller.
#[derive(Message)]
#[rtype(result = "()")]
pub struct SetDriverState {
    pub state: DriverState,
}
