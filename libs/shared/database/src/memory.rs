use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::store::{Collection, Filter, RecordStore, StoreError, ID_FIELD};

/// Process-local store. Every operation runs under one lock, so the
/// composite operations are atomic. Used in tests and when no hosted
/// database is configured.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    collections: RwLock<HashMap<Collection, Vec<Value>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a collection. Records without an `_id` get one.
    pub fn with_records(mut self, collection: Collection, records: Vec<Value>) -> Self {
        let entries = self.collections.get_mut().entry(collection).or_default();
        for record in records {
            if let Value::Object(mut object) = record {
                object
                    .entry(ID_FIELD)
                    .or_insert_with(|| Value::String(Uuid::new_v4().to_string()));
                entries.push(Value::Object(object));
            }
        }
        self
    }
}

fn into_object(doc: Value) -> Result<Map<String, Value>, StoreError> {
    match doc {
        Value::Object(object) => Ok(object),
        other => Err(StoreError::InvalidRecord(format!("expected a JSON object, got {}", other))),
    }
}

fn with_new_id(doc: Value) -> Result<Value, StoreError> {
    let mut object = into_object(doc)?;
    object.insert(ID_FIELD.to_string(), Value::String(Uuid::new_v4().to_string()));
    Ok(Value::Object(object))
}

fn merge(target: &mut Value, patch: Map<String, Value>) {
    if let Value::Object(object) = target {
        for (key, value) in patch {
            if key != ID_FIELD {
                object.insert(key, value);
            }
        }
    }
}

fn position_of(records: &[Value], id: &str) -> Option<usize> {
    records
        .iter()
        .position(|record| record.get(ID_FIELD).and_then(Value::as_str) == Some(id))
}

#[async_trait]
impl RecordStore for InMemoryStore {
    async fn find(&self, collection: Collection, filter: &Filter) -> Result<Vec<Value>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(&collection)
            .map(|records| records.iter().filter(|r| filter.matches(r)).cloned().collect())
            .unwrap_or_default())
    }

    async fn insert(&self, collection: Collection, doc: Value) -> Result<Value, StoreError> {
        let record = with_new_id(doc)?;
        let mut collections = self.collections.write().await;
        collections.entry(collection).or_default().push(record.clone());
        debug!("Inserted record into {}", collection);
        Ok(record)
    }

    async fn insert_unique(
        &self,
        collection: Collection,
        doc: Value,
        key_fields: &[&str],
    ) -> Result<Value, StoreError> {
        let record = with_new_id(doc)?;
        let key = Filter::from_fields(&record, key_fields);

        let mut collections = self.collections.write().await;
        let records = collections.entry(collection).or_default();
        if records.iter().any(|existing| key.matches(existing)) {
            return Err(StoreError::Conflict(collection));
        }
        records.push(record.clone());
        Ok(record)
    }

    async fn update_by_id(&self, collection: Collection, id: &str, patch: Value) -> Result<u64, StoreError> {
        let patch = into_object(patch)?;
        let mut collections = self.collections.write().await;
        let Some(records) = collections.get_mut(&collection) else {
            return Ok(0);
        };
        match position_of(records, id) {
            Some(index) => {
                merge(&mut records[index], patch);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete_by_id(&self, collection: Collection, id: &str) -> Result<u64, StoreError> {
        let mut collections = self.collections.write().await;
        let Some(records) = collections.get_mut(&collection) else {
            return Ok(0);
        };
        let before = records.len();
        records.retain(|record| record.get(ID_FIELD).and_then(Value::as_str) != Some(id));
        Ok((before - records.len()) as u64)
    }

    async fn insert_and_update(
        &self,
        insert_into: Collection,
        doc: Value,
        update_in: Collection,
        id: &str,
        patch: Value,
    ) -> Result<Value, StoreError> {
        let record = with_new_id(doc)?;
        let patch = into_object(patch)?;

        let mut collections = self.collections.write().await;
        let target = collections
            .get(&update_in)
            .and_then(|records| position_of(records, id))
            .ok_or(StoreError::NotFound(update_in))?;

        if let Some(records) = collections.get_mut(&update_in) {
            merge(&mut records[target], patch);
        }
        collections.entry(insert_into).or_default().push(record.clone());
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    #[tokio::test]
    async fn test_insert_assigns_fresh_id() {
        let store = InMemoryStore::new();
        let stored = store
            .insert(Collection::Doctors, json!({ "_id": "client-chosen", "name": "Dr. A" }))
            .await
            .unwrap();

        let id = stored[ID_FIELD].as_str().unwrap();
        assert_ne!(id, "client-chosen");
        assert!(store.find_by_id(Collection::Doctors, id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_insert_rejects_non_objects() {
        let store = InMemoryStore::new();
        let result = store.insert(Collection::Doctors, json!(["not", "an", "object"])).await;
        assert_matches!(result, Err(StoreError::InvalidRecord(_)));
    }

    #[tokio::test]
    async fn test_insert_unique_conflicts_on_key() {
        let store = InMemoryStore::new();
        let key = ["email", "treatment"];

        store
            .insert_unique(Collection::Bookings, json!({ "email": "a@x.com", "treatment": "Braces", "slot": "9am" }), &key)
            .await
            .unwrap();

        let duplicate = store
            .insert_unique(Collection::Bookings, json!({ "email": "a@x.com", "treatment": "Braces", "slot": "10am" }), &key)
            .await;
        assert_matches!(duplicate, Err(StoreError::Conflict(Collection::Bookings)));

        store
            .insert_unique(Collection::Bookings, json!({ "email": "a@x.com", "treatment": "Cavity", "slot": "9am" }), &key)
            .await
            .unwrap();

        assert_eq!(store.find(Collection::Bookings, &Filter::new()).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_insert_unique_admits_one() {
        let store = std::sync::Arc::new(InMemoryStore::new());
        let mut handles = Vec::new();
        for slot in ["9am", "10am", "11am", "12pm"] {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .insert_unique(
                        Collection::Bookings,
                        json!({ "email": "a@x.com", "treatment": "Braces", "slot": slot }),
                        &["email", "treatment"],
                    )
                    .await
                    .is_ok()
            }));
        }

        let mut admitted = 0;
        for handle in handles {
            if handle.await.unwrap() {
                admitted += 1;
            }
        }
        assert_eq!(admitted, 1);
    }

    #[tokio::test]
    async fn test_update_merges_and_keeps_id() {
        let store = InMemoryStore::new()
            .with_records(Collection::Users, vec![json!({ "_id": "u1", "email": "a@x.com" })]);

        let matched = store
            .update_by_id(Collection::Users, "u1", json!({ "role": "admin", "_id": "hijack" }))
            .await
            .unwrap();
        assert_eq!(matched, 1);

        let user = store.find_by_id(Collection::Users, "u1").await.unwrap().unwrap();
        assert_eq!(user["role"], "admin");
        assert_eq!(user["email"], "a@x.com");

        assert_eq!(store.update_by_id(Collection::Users, "missing", json!({})).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_delete_by_id_reports_count() {
        let store = InMemoryStore::new()
            .with_records(Collection::Doctors, vec![json!({ "_id": "d1" }), json!({ "_id": "d2" })]);

        assert_eq!(store.delete_by_id(Collection::Doctors, "d1").await.unwrap(), 1);
        assert_eq!(store.delete_by_id(Collection::Doctors, "d1").await.unwrap(), 0);
        assert_eq!(store.find(Collection::Doctors, &Filter::new()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_insert_and_update_writes_nothing_without_target() {
        let store = InMemoryStore::new();
        let result = store
            .insert_and_update(
                Collection::Payments,
                json!({ "bookingId": "missing" }),
                Collection::Bookings,
                "missing",
                json!({ "paid": true }),
            )
            .await;

        assert_matches!(result, Err(StoreError::NotFound(Collection::Bookings)));
        assert!(store.find(Collection::Payments, &Filter::new()).await.unwrap().is_empty());
    }
}
