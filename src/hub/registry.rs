// Copyright (c) 2024 Jens Obermayer <jens@ds-intg.dev>
// SPDX-License-Identifier: MPL-2.0

//! In-process entity registry.
//!
//! Stand-in for a host platform's entity machinery: holds the registered
//! entities with their current value and availability, and answers the
//! queries of the HTTP status API.

use std::collections::HashMap;

use actix::prelude::{Actor, Context, Handler};
use log::{debug, info, warn};

use crate::errors::ServiceError;
use crate::hub::messages::{
    AddEntities, GetDriverStatus, GetEntities, SetAvailability, SetDriverState, WriteState,
};
use crate::hub::model::{
    DriverState, DriverStatus, EntityCategory, EntityView, SensorEntity, StateUpdate,
};

struct EntityRecord {
    entity: SensorEntity,
    value: Option<f64>,
    available: bool,
}

pub struct EntityRegistry {
    entities: HashMap<String, EntityRecord>,
    /// Registration order, for stable listings.
    order: Vec<String>,
    driver_state: DriverState,
}

impl Default for EntityRegistry {
    fn default() -> Self {
        Self {
            entities: HashMap::new(),
            order: Vec::new(),
            driver_state: DriverState::Disconnected,
        }
    }
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn add_batch(&mut self, category: EntityCategory, entities: Vec<SensorEntity>) {
        info!("Adding {} {category} entities", entities.len());
        for entity in entities {
            match self.entities.get_mut(&entity.unique_id) {
                Some(record) => {
                    debug!("Replacing metadata of {}", entity.unique_id);
                    record.entity = entity;
                }
                None => {
                    self.order.push(entity.unique_id.clone());
                    self.entities.insert(
                        entity.unique_id.clone(),
                        EntityRecord {
                            entity,
                            value: None,
                            available: true,
                        },
                    );
                }
            }
        }
    }

    fn write_state(&mut self, update: StateUpdate) {
        match self.entities.get_mut(&update.unique_id) {
            Some(record) => record.value = Some(update.value),
            None => warn!("State write for unknown entity {}", update.unique_id),
        }
    }

    fn set_availability(&mut self, unique_id: &str, available: bool) {
        match self.entities.get_mut(unique_id) {
            Some(record) => record.available = available,
            None => warn!("Availability change for unknown entity {unique_id}"),
        }
    }

    fn views(&self) -> Vec<EntityView> {
        self.order
            .iter()
            .filter_map(|id| self.entities.get(id))
            .map(|record| EntityView {
                entity: record.entity.clone(),
                value: record.value,
                available: record.available,
            })
            .collect()
    }

    fn status(&self) -> DriverStatus {
        DriverStatus {
            state: self.driver_state,
            entity_count: self.entities.len(),
        }
    }
}

impl Actor for EntityRegistry {
    type Context = Context<Self>;
}

impl Handler<AddEntities> for EntityRegistry {
    type Result = ();

    fn handle(&mut self, msg: AddEntities, _ctx: &mut Self::Context) -> Self::Result {
        self.add_batch(msg.category, msg.entities);
    }
}

impl Handler<WriteState> for EntityRegistry {
    type Result = ();

    fn handle(&mut self, msg: WriteState, _ctx: &mut Self::Context) -> Self::Result {
        self.write_state(msg.update);
    }
}

impl Handler<SetAvailability> for EntityRegistry {
    type Result = ();

    fn handle(&mut self, msg: SetAvailability, _ctx: &mut Self::Context) -> Self::Result {
        self.set_availability(&msg.unique_id, msg.available);
    }
}

impl Handler<GetEntities> for EntityRegistry {
    type Result = Result<Vec<EntityView>, ServiceError>;

    fn handle(&mut self, _msg: GetEntities, _ctx: &mut Self::Context) -> Self::Result {
        Ok(self.views())
    }
}

impl Handler<GetDriverStatus> for EntityRegistry {
    type Result = Result<DriverStatus, ServiceError>;

    fn handle(&mut self, _msg: GetDriverStatus, _ctx: &mut Self::Context) -> Self::Result {
        Ok(self.status())
    }
}

impl Handler<SetDriverState> for EntityRegistry {
    type Result = ();

    fn handle(&mut self, msg: SetDriverState, _ctx: &mut Self::Context) -> Self::Result {
        if self.driver_state != msg.state {
            info!("Driver state: {} -> {}", self.driver_state, msg.state);
            self.driver_state = msg.state;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hub::model::DeviceIdentity;

    fn entity(unique_id: &str, category: EntityCategory) -> SensorEntity {
        SensorEntity {
            unique_id: unique_id.into(),
            name: "Test".into(),
            category,
            unit: Some("W"),
            device_class: None,
            state_class: None,
            display_precision: Some(0),
            enabled_by_default: true,
            device: DeviceIdentity {
                identifier: "dev1".into(),
                name: "Device 1".into(),
                ..Default::default()
            },
            attributes: Default::default(),
        }
    }

    #[test]
    fn listing_keeps_registration_order() {
        let mut registry = EntityRegistry::new();
        registry.add_batch(
            EntityCategory::CircuitSensor,
            vec![entity("c1", EntityCategory::CircuitSensor)],
        );
        registry.add_batch(
            EntityCategory::DeviceSensor,
            vec![
                entity("d1", EntityCategory::DeviceSensor),
                entity("d2", EntityCategory::DeviceSensor),
            ],
        );

        let ids: Vec<String> = registry
            .views()
            .into_iter()
            .map(|v| v.entity.unique_id)
            .collect();
        assert_eq!(vec!["c1", "d1", "d2"], ids);
    }

    #[test]
    fn write_state_updates_value() {
        let mut registry = EntityRegistry::new();
        registry.add_batch(
            EntityCategory::DeviceSensor,
            vec![entity("d1", EntityCategory::DeviceSensor)],
        );

        registry.write_state(StateUpdate::new("d1".into(), 42.5));
        assert_eq!(Some(42.5), registry.views()[0].value);

        // unknown ids are ignored
        registry.write_state(StateUpdate::new("nope".into(), 1.0));
        assert_eq!(1, registry.views().len());
    }

    #[test]
    fn re_registration_replaces_metadata_and_keeps_value() {
        let mut registry = EntityRegistry::new();
        registry.add_batch(
            EntityCategory::DeviceSensor,
            vec![entity("d1", EntityCategory::DeviceSensor)],
        );
        registry.write_state(StateUpdate::new("d1".into(), 7.0));

        let mut renamed = entity("d1", EntityCategory::DeviceSensor);
        renamed.name = "Renamed".into();
        registry.add_batch(EntityCategory::DeviceSensor, vec![renamed]);

        let views = registry.views();
        assert_eq!(1, views.len());
        assert_eq!("Renamed", views[0].entity.name);
        assert_eq!(Some(7.0), views[0].value);
    }

    #[test]
    fn availability_toggles_per_entity() {
        let mut registry = EntityRegistry::new();
        registry.add_batch(
            EntityCategory::CircuitSensor,
            vec![entity("c1", EntityCategory::CircuitSensor)],
        );
        assert!(registry.views()[0].available);

        registry.set_availability("c1", false);
        assert!(!registry.views()[0].available);
    }

    #[test]
    fn status_reports_state_and_count() {
        let mut registry = EntityRegistry::new();
        assert_eq!(DriverState::Disconnected, registry.status().state);

        registry.driver_state = DriverState::Connected;
        registry.add_batch(
            EntityCategory::ModbusSensor,
            vec![entity("m1", EntityCategory::ModbusSensor)],
        );
        let status = registry.status();
        assert_eq!(DriverState::Connected, status.state);
        assert_eq!(1, status.entity_count);
    }
}
