//! Typed view over one collection of a `DocumentStore`.

use std::marker::PhantomData;
use std::sync::Arc;

use bson::Document;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{DocumentStore, FindOptions};
use crate::shared::error::Result;

/// One page of results.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub size: u32,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            size: self.size,
        }
    }
}

/// Repository base: converts between `T` and BSON for a single collection.
pub struct TypedCollection<T> {
    store: Arc<dyn DocumentStore>,
    name: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for TypedCollection<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            name: self.name,
            _marker: PhantomData,
        }
    }
}

impl<T> TypedCollection<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(store: Arc<dyn DocumentStore>, name: &'static str) -> Self {
        Self {
            store,
            name,
            _marker: PhantomData,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub async fn insert(&self, entity: &T) -> Result<()> {
        self.store.insert(self.name, bson::to_document(entity)?).await
    }

    pub async fn save(&self, id: &str, entity: &T) -> Result<()> {
        self.store.replace(self.name, id, bson::to_document(entity)?).await
    }

    pub async fn delete(&self, id: &str) -> Result<bool> {
        self.store.delete(self.name, id).await
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<T>> {
        match self.store.find_by_id(self.name, id).await? {
            Some(doc) => Ok(Some(bson::from_document(doc)?)),
            None => Ok(None),
        }
    }

    pub async fn find_one(&self, filter: Document) -> Result<Option<T>> {
        match self.store.find_one(self.name, filter).await? {
            Some(doc) => Ok(Some(bson::from_document(doc)?)),
            None => Ok(None),
        }
    }

    pub async fn find(&self, filter: Document, options: FindOptions) -> Result<Vec<T>> {
        self.store
            .find(self.name, filter, options)
            .await?
            .into_iter()
            .map(|doc| bson::from_document(doc).map_err(Into::into))
            .collect()
    }

    pub async fn count(&self, filter: Document) -> Result<u64> {
        self.store.count(self.name, filter).await
    }

    pub async fn exists(&self, filter: Document) -> Result<bool> {
        Ok(self.count(filter).await? > 0)
    }

    /// Zero-based `page` of `size` items, ordered by `sort`.
    pub async fn find_page(&self, filter: Document, sort: Document, page: u32, size: u32) -> Result<Page<T>> {
        let size = size.clamp(1, 200);
        let total = self.count(filter.clone()).await?;
        let options = FindOptions::sorted(sort).paged(page as u64 * size as u64, size as i64);
        let items = self.find(filter, options).await?;
        Ok(Page { items, total, page, size })
    }

    pub async fn update_many(&self, filter: Document, set: Document) -> Result<u64> {
        self.store.update_many(self.name, filter, set).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;
    use bson::doc;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Note {
        #[serde(rename = "_id")]
        id: String,
        text: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        pinned_by: Option<String>,
    }

    fn notes() -> TypedCollection<Note> {
        TypedCollection::new(Arc::new(InMemoryStore::new()), "notes")
    }

    #[tokio::test]
    async fn test_save_clears_removed_optional_fields() {
        let notes = notes();
        let mut note = Note { id: "N1".into(), text: "hi".into(), pinned_by: Some("u1".into()) };
        notes.insert(&note).await.unwrap();

        note.pinned_by = None;
        notes.save("N1", &note).await.unwrap();
        assert_eq!(notes.find_by_id("N1").await.unwrap(), Some(note));
    }

    #[tokio::test]
    async fn test_find_page() {
        let notes = notes();
        for i in 0..5 {
            let note = Note { id: format!("N{}", i), text: format!("t{}", i), pinned_by: None };
            notes.insert(&note).await.unwrap();
        }

        let page = notes.find_page(doc! {}, doc! { "_id": -1 }, 1, 2).await.unwrap();
        assert_eq!(page.total, 5);
        assert_eq!(page.size, 2);
        let ids: Vec<String> = page.items.into_iter().map(|n| n.id).collect();
        assert_eq!(ids, vec!["N2", "N1"]);
    }
}
