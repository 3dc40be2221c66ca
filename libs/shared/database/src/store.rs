use std::fmt;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Identity key of every stored record.
pub const ID_FIELD: &str = "_id";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    AppointmentOptions,
    Bookings,
    Users,
    Doctors,
    Payments,
}

impl Collection {
    pub fn table_name(&self) -> &'static str {
        match self {
            Collection::AppointmentOptions => "appointment_options",
            Collection::Bookings => "bookings",
            Collection::Users => "users",
            Collection::Doctors => "doctors",
            Collection::Payments => "payments",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table_name())
    }
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Record conflicts with an existing entry in {0}")]
    Conflict(Collection),

    #[error("Record not found in {0}")]
    NotFound(Collection),

    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Store misconfigured: {0}")]
    Configuration(String),

    #[error("Store API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Store transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Store serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Equality predicate over top-level record fields. An empty filter
/// matches every record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<(String, Value)>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push((field.into(), value.into()));
        self
    }

    pub fn by_id(id: &str) -> Self {
        Self::new().eq(ID_FIELD, id)
    }

    /// Filter on `fields` taking their values from `doc`. Missing fields
    /// compare as null.
    pub fn from_fields(doc: &Value, fields: &[&str]) -> Self {
        fields.iter().fold(Self::new(), |filter, field| {
            filter.eq(*field, doc.get(*field).cloned().unwrap_or(Value::Null))
        })
    }

    pub fn conditions(&self) -> &[(String, Value)] {
        &self.conditions
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn matches(&self, doc: &Value) -> bool {
        self.conditions
            .iter()
            .all(|(field, expected)| doc.get(field).unwrap_or(&Value::Null) == expected)
    }
}

pub fn decode<T: DeserializeOwned>(record: Value) -> Result<T, StoreError> {
    Ok(serde_json::from_value(record)?)
}

pub fn decode_all<T: DeserializeOwned>(records: Vec<Value>) -> Result<Vec<T>, StoreError> {
    records.into_iter().map(decode).collect()
}

/// Serializes a typed record for writing, dropping any client-supplied id.
pub fn encode<T: Serialize>(record: &T) -> Result<Value, StoreError> {
    let mut value = serde_json::to_value(record)?;
    if let Value::Object(object) = &mut value {
        object.remove(ID_FIELD);
    }
    Ok(value)
}

/// Persistence seam shared by every cell. Records travel as JSON objects;
/// each cell owns the typed view of its collections.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn find(&self, collection: Collection, filter: &Filter) -> Result<Vec<Value>, StoreError>;

    async fn find_one(&self, collection: Collection, filter: &Filter) -> Result<Option<Value>, StoreError> {
        Ok(self.find(collection, filter).await?.into_iter().next())
    }

    async fn find_by_id(&self, collection: Collection, id: &str) -> Result<Option<Value>, StoreError> {
        self.find_one(collection, &Filter::by_id(id)).await
    }

    /// Stores `doc` under a freshly assigned id and returns the stored record.
    async fn insert(&self, collection: Collection, doc: Value) -> Result<Value, StoreError>;

    /// Like `insert`, but fails with `StoreError::Conflict` when a record
    /// with the same values for all `key_fields` exists. Check and write
    /// are a single atomic step.
    async fn insert_unique(
        &self,
        collection: Collection,
        doc: Value,
        key_fields: &[&str],
    ) -> Result<Value, StoreError>;

    /// Shallow-merges `patch` into the record. Returns the matched count.
    async fn update_by_id(&self, collection: Collection, id: &str, patch: Value) -> Result<u64, StoreError>;

    async fn delete_by_id(&self, collection: Collection, id: &str) -> Result<u64, StoreError>;

    /// Inserts `doc` into `insert_into` and patches record `id` of
    /// `update_in` as one unit. Nothing is written when the update target
    /// is missing (`StoreError::NotFound`).
    async fn insert_and_update(
        &self,
        insert_into: Collection,
        doc: Value,
        update_in: Collection,
        id: &str,
        patch: Value,
    ) -> Result<Value, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_filter_matches_all_conditions() {
        let doc = json!({ "email": "a@x.com", "treatment": "Braces", "slot": "9am" });

        assert!(Filter::new().matches(&doc));
        assert!(Filter::new().eq("email", "a@x.com").eq("treatment", "Braces").matches(&doc));
        assert!(!Filter::new().eq("email", "a@x.com").eq("treatment", "Cavity").matches(&doc));
        assert!(!Filter::new().eq("appointmentDate", "1-1-2024").matches(&doc));
    }

    #[test]
    fn test_filter_from_fields_uses_null_for_missing() {
        let doc = json!({ "email": "a@x.com" });
        let filter = Filter::from_fields(&doc, &["email", "treatment"]);

        assert_eq!(filter.conditions()[1], ("treatment".to_string(), Value::Null));
        assert!(filter.matches(&json!({ "email": "a@x.com" })));
    }
}
