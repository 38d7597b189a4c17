// Copyright (c) 2024 Jens Obermayer <jens@ds-intg.dev>
// SPDX-License-Identifier: MPL-2.0

//! REST API endpoints backed by the entity registry.

use actix::Addr;
use actix_web::{get, web, HttpResponse};

use crate::errors::ServiceError;
use crate::hub::messages::{GetDriverStatus, GetEntities};
use crate::hub::EntityRegistry;
use crate::server::web_model::StatusResponse;
use crate::startup::{built_info, APP_VERSION};

#[get("/api/status")]
pub async fn status(
    registry: web::Data<Addr<EntityRegistry>>,
) -> Result<HttpResponse, ServiceError> {
    let status = registry.send(GetDriverStatus).await??;

    Ok(HttpResponse::Ok().json(StatusResponse {
        name: built_info::PKG_NAME,
        version: APP_VERSION,
        state: status.state,
        entity_count: status.entity_count,
    }))
}

#[get("/api/entities")]
pub async fn entities(
    registry: web::Data<Addr<EntityRegistry>>,
) -> Result<HttpResponse, ServiceError> {
    let entities = registry.send(GetEntities).await??;

    Ok(HttpResponse::Ok().json(entities))
}
