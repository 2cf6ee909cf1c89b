//! Fixtures for use case unit tests: an in-memory store with its unit of
//! work, a staff execution context and seeded aggregates.

use std::sync::Arc;

use serde::Serialize;

use crate::customer::entity::Customer;
use crate::store::{DocumentStore, InMemoryStore};
use crate::usecase::{ExecutionContext, HasId, InMemoryUnitOfWork};
use crate::vehicle::entity::{Vehicle, VehicleCondition};

pub(crate) struct Memory {
    pub store: Arc<InMemoryStore>,
    pub uow: Arc<InMemoryUnitOfWork>,
}

impl Memory {
    pub fn new() -> Self {
        let store = Arc::new(InMemoryStore::new());
        let uow = Arc::new(InMemoryUnitOfWork::new(store.clone()));
        Self { store, uow }
    }

    pub fn dyn_store(&self) -> Arc<dyn DocumentStore> {
        self.store.clone()
    }

    /// Write an entity directly, bypassing the unit of work.
    pub async fn put<T: HasId + Serialize>(&self, entity: &T) {
        let document = bson::to_document(entity).expect("serializable entity");
        self.store
            .replace(T::collection_name(), entity.id(), document)
            .await
            .expect("in-memory write");
    }

    /// Number of stored events whose type ends with `type_suffix`, e.g. `vehicle:created`.
    pub async fn event_count(&self, type_suffix: &str) -> usize {
        let events = self
            .store
            .find("events", bson::Document::new(), Default::default())
            .await
            .unwrap_or_default();
        events
            .iter()
            .filter(|e| e.get_str("eventType").map(|t| t.ends_with(type_suffix)).unwrap_or(false))
            .count()
    }
}

pub(crate) fn ctx() -> ExecutionContext {
    ExecutionContext::create("staff-1")
}

/// An available 2021 Toyota Corolla priced at 20,000.00.
pub(crate) async fn seed_vehicle(mem: &Memory, vin: &str) -> Vehicle {
    let vehicle = Vehicle::new(vin, "Toyota", "Corolla", 2021, VehicleCondition::Used, 2_000_000);
    mem.put(&vehicle).await;
    vehicle
}

pub(crate) async fn seed_customer(mem: &Memory, email: &str) -> Customer {
    let customer = Customer::new("Ada", "Lovelace", email);
    mem.put(&customer).await;
    customer
}
