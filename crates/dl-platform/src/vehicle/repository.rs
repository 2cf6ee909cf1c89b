//! Vehicle Repository

use std::sync::Arc;

use bson::{doc, Bson, Document};

use super::entity::{Vehicle, VehicleCondition, VehicleStatus};
use crate::customer::repository::contains_pattern;
use crate::shared::error::Result;
use crate::store::{DocumentStore, FindOptions, Page, TypedCollection};
use crate::usecase::HasId;

/// Inventory search criteria. Every field is optional.
#[derive(Debug, Clone, Default)]
pub struct VehicleFilter {
    pub status: Option<VehicleStatus>,
    pub make: Option<String>,
    pub model: Option<String>,
    pub condition: Option<VehicleCondition>,
    pub min_price_cents: Option<i64>,
    pub max_price_cents: Option<i64>,
    pub min_year: Option<i32>,
    pub max_year: Option<i32>,
    /// Fragment of make, model, trim, VIN or stock number
    pub search: Option<String>,
}

fn exact_ignore_case(value: &str) -> Document {
    doc! { "$regex": format!("^{}$", regex::escape(value.trim())), "$options": "i" }
}

impl VehicleFilter {
    pub fn to_document(&self) -> Document {
        let mut filter = Document::new();
        if let Some(status) = self.status {
            filter.insert("status", status.as_str());
        }
        if let Some(make) = self.make.as_deref().filter(|m| !m.trim().is_empty()) {
            filter.insert("make", exact_ignore_case(make));
        }
        if let Some(model) = self.model.as_deref().filter(|m| !m.trim().is_empty()) {
            filter.insert("model", exact_ignore_case(model));
        }
        if let Some(condition) = self.condition {
            filter.insert("condition", condition.as_str());
        }

        let mut price = Document::new();
        if let Some(min) = self.min_price_cents {
            price.insert("$gte", min);
        }
        if let Some(max) = self.max_price_cents {
            price.insert("$lte", max);
        }
        if !price.is_empty() {
            filter.insert("priceCents", price);
        }

        let mut year = Document::new();
        if let Some(min) = self.min_year {
            year.insert("$gte", min);
        }
        if let Some(max) = self.max_year {
            year.insert("$lte", max);
        }
        if !year.is_empty() {
            filter.insert("year", year);
        }

        if let Some(term) = self.search.as_deref().filter(|s| !s.trim().is_empty()) {
            let pattern = contains_pattern(term);
            let clauses: Vec<Bson> = ["make", "model", "trim", "vin", "stockNumber"]
                .iter()
                .map(|field| {
                    let mut clause = Document::new();
                    clause.insert(*field, pattern.clone());
                    Bson::Document(clause)
                })
                .collect();
            filter.insert("$or", clauses);
        }
        filter
    }
}

pub struct VehicleRepository {
    collection: TypedCollection<Vehicle>,
}

impl VehicleRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            collection: TypedCollection::new(store, Vehicle::collection_name()),
        }
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Vehicle>> {
        self.collection.find_by_id(id).await
    }

    pub async fn find_by_vin(&self, vin: &str) -> Result<Option<Vehicle>> {
        self.collection.find_one(doc! { "vin": vin.trim().to_uppercase() }).await
    }

    pub async fn exists_by_vin(&self, vin: &str) -> Result<bool> {
        self.collection.exists(doc! { "vin": vin.trim().to_uppercase() }).await
    }

    pub async fn search(&self, filter: &VehicleFilter, page: u32, size: u32) -> Result<Page<Vehicle>> {
        self.collection
            .find_page(filter.to_document(), doc! { "createdAt": -1 }, page, size)
            .await
    }

    pub async fn find_by_status(&self, status: VehicleStatus) -> Result<Vec<Vehicle>> {
        self.collection
            .find(doc! { "status": status.as_str() }, FindOptions::default())
            .await
    }

    pub async fn count_by_status(&self, status: VehicleStatus) -> Result<u64> {
        self.collection.count(doc! { "status": status.as_str() }).await
    }

    /// Direct write used by seeding; domain changes go through the unit of work.
    pub async fn insert(&self, vehicle: &Vehicle) -> Result<()> {
        self.collection.insert(vehicle).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;

    fn vehicle(vin: &str, make: &str, model: &str, year: i32, price: i64) -> Vehicle {
        Vehicle::new(vin, make, model, year, VehicleCondition::Used, price)
    }

    #[tokio::test]
    async fn test_filtering() {
        let repo = VehicleRepository::new(Arc::new(InMemoryStore::new()));
        let mut sold = vehicle("1HGCM82633A004352", "Honda", "Accord", 2018, 1_500_000);
        sold.mark_sold();
        repo.insert(&sold).await.unwrap();
        repo.insert(&vehicle("2T1BURHE0JC074587", "Toyota", "Corolla", 2020, 1_800_000)).await.unwrap();
        repo.insert(&vehicle("5YJ3E1EA7KF317000", "Tesla", "Model 3", 2022, 3_900_000)).await.unwrap();

        let available = VehicleFilter {
            status: Some(VehicleStatus::Available),
            ..Default::default()
        };
        assert_eq!(repo.search(&available, 0, 20).await.unwrap().total, 2);

        let toyota = VehicleFilter {
            make: Some("toyota".into()),
            ..Default::default()
        };
        assert_eq!(repo.search(&toyota, 0, 20).await.unwrap().items[0].model, "Corolla");

        let range = VehicleFilter {
            min_price_cents: Some(1_600_000),
            max_year: Some(2021),
            ..Default::default()
        };
        assert_eq!(repo.search(&range, 0, 20).await.unwrap().total, 1);

        let search = VehicleFilter {
            search: Some("model 3".into()),
            ..Default::default()
        };
        assert_eq!(repo.search(&search, 0, 20).await.unwrap().items[0].make, "Tesla");

        assert!(repo.exists_by_vin("1hgcm82633a004352").await.unwrap());
        assert_eq!(repo.count_by_status(VehicleStatus::Sold).await.unwrap(), 1);
    }
}
