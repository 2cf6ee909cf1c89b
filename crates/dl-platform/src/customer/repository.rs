//! Customer Repository

use std::sync::Arc;

use bson::{doc, Bson, Document};

use super::entity::Customer;
use crate::shared::error::Result;
use crate::store::{DocumentStore, Page, TypedCollection};
use crate::usecase::HasId;

pub struct CustomerRepository {
    collection: TypedCollection<Customer>,
}

/// Case-insensitive literal match for `$regex`.
pub(crate) fn contains_pattern(term: &str) -> Document {
    doc! { "$regex": regex::escape(term.trim()), "$options": "i" }
}

impl CustomerRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            collection: TypedCollection::new(store, Customer::collection_name()),
        }
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Customer>> {
        self.collection.find_by_id(id).await
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<Customer>> {
        self.collection
            .find_one(doc! { "email": email.trim().to_lowercase() })
            .await
    }

    pub async fn exists_by_email(&self, email: &str) -> Result<bool> {
        self.collection
            .exists(doc! { "email": email.trim().to_lowercase() })
            .await
    }

    pub async fn find_by_user_id(&self, user_id: &str) -> Result<Option<Customer>> {
        self.collection.find_one(doc! { "userId": user_id }).await
    }

    /// Search by name, email or phone fragment.
    pub async fn search(&self, term: Option<&str>, page: u32, size: u32) -> Result<Page<Customer>> {
        let filter = match term.map(str::trim).filter(|t| !t.is_empty()) {
            Some(term) => {
                let pattern = contains_pattern(term);
                let fields = ["firstName", "lastName", "email", "phone"];
                let clauses: Vec<Bson> = fields
                    .iter()
                    .map(|field| {
                        let mut clause = Document::new();
                        clause.insert(*field, pattern.clone());
                        Bson::Document(clause)
                    })
                    .collect();
                doc! { "$or": clauses }
            }
            None => Document::new(),
        };
        self.collection
            .find_page(filter, doc! { "lastName": 1, "firstName": 1 }, page, size)
            .await
    }

    pub async fn count(&self) -> Result<u64> {
        self.collection.count(Document::new()).await
    }

    pub async fn save(&self, customer: &Customer) -> Result<()> {
        self.collection.save(&customer.id, customer).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;

    #[tokio::test]
    async fn test_search_matches_any_field() {
        let repo = CustomerRepository::new(Arc::new(InMemoryStore::new()));
        let mut ada = Customer::new("Ada", "Lovelace", "ada@example.com");
        ada.phone = Some("555-0101".into());
        repo.save(&ada).await.unwrap();
        repo.save(&Customer::new("Alan", "Turing", "alan@example.com")).await.unwrap();

        assert_eq!(repo.search(Some("love"), 0, 20).await.unwrap().total, 1);
        assert_eq!(repo.search(Some("EXAMPLE"), 0, 20).await.unwrap().total, 2);
        assert_eq!(repo.search(Some("0101"), 0, 20).await.unwrap().items[0].id, ada.id);
        assert_eq!(repo.search(None, 0, 20).await.unwrap().total, 2);
        assert!(repo.exists_by_email("ADA@example.com").await.unwrap());
    }
}
