use async_trait::async_trait;
use reqwest::{
    Client,
    header::{HeaderMap, HeaderValue, CONTENT_TYPE, AUTHORIZATION},
    Method, StatusCode,
};
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use tracing::{debug, error};
use uuid::Uuid;

use shared_config::AppConfig;

use crate::store::{Collection, Filter, RecordStore, StoreError, ID_FIELD};

/// Thin PostgREST client authenticated with the project key.
pub struct SupabaseClient {
    client: Client,
    base_url: String,
    anon_key: String,
}

impl SupabaseClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.supabase_url.trim_end_matches('/').to_string(),
            anon_key: config.supabase_anon_key.clone(),
        }
    }

    fn get_headers(&self, return_representation: bool) -> Result<HeaderMap, StoreError> {
        let mut headers = HeaderMap::new();

        let key = HeaderValue::from_str(&self.anon_key)
            .map_err(|e| StoreError::Configuration(format!("invalid project key: {}", e)))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.anon_key))
            .map_err(|e| StoreError::Configuration(format!("invalid project key: {}", e)))?;

        headers.insert("apikey", key);
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if return_representation {
            headers.insert("Prefer", HeaderValue::from_static("return=representation"));
        }

        Ok(headers)
    }

    pub async fn request<T>(&self, method: Method, path: &str, body: Option<Value>) -> Result<T, StoreError>
    where T: DeserializeOwned {
        let return_representation = method != Method::GET;
        let url = format!("{}{}", self.base_url, path);
        debug!("Making {} request to {}", method, url);

        let mut req = self.client.request(method, &url)
            .headers(self.get_headers(return_representation)?);

        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await?;
            error!("Store API error ({}): {}", status, error_text);

            return Err(StoreError::Api {
                status: status.as_u16(),
                message: error_text,
            });
        }

        let data = response.json::<T>().await?;
        Ok(data)
    }
}

/// Client fields without a column of their own live in this jsonb column.
const EXTRA_COLUMN: &str = "extra";

const BOOKING_COLUMNS: &[&str] = &[
    ID_FIELD, "appointmentDate", "email", "treatment", "slot", "price", "paid", "transactionId", "patient", "phone",
];
const USER_COLUMNS: &[&str] = &[ID_FIELD, "email", "name", "role"];
const DOCTOR_COLUMNS: &[&str] = &[ID_FIELD, "name", "specialty", "email", "image"];
const PAYMENT_COLUMNS: &[&str] = &[ID_FIELD, "bookingId", "transactionId", "price", "email"];

/// Fixed columns of tables that also carry `extra`. Appointment options
/// have a closed shape and are stored as-is.
fn columns(collection: Collection) -> Option<&'static [&'static str]> {
    match collection {
        Collection::AppointmentOptions => None,
        Collection::Bookings => Some(BOOKING_COLUMNS),
        Collection::Users => Some(USER_COLUMNS),
        Collection::Doctors => Some(DOCTOR_COLUMNS),
        Collection::Payments => Some(PAYMENT_COLUMNS),
    }
}

/// Moves every field without a column into `extra`.
fn fold_extra(collection: Collection, doc: Value) -> Result<Value, StoreError> {
    let Some(columns) = columns(collection) else {
        return Ok(doc);
    };
    let Value::Object(fields) = doc else {
        return Err(StoreError::InvalidRecord(format!("expected a JSON object for {}", collection)));
    };

    let mut row = Map::new();
    let mut extra = Map::new();
    for (key, value) in fields {
        if columns.contains(&key.as_str()) {
            row.insert(key, value);
        } else {
            extra.insert(key, value);
        }
    }
    row.insert(EXTRA_COLUMN.to_string(), Value::Object(extra));
    Ok(Value::Object(row))
}

/// Inverse of `fold_extra`. Null columns were never supplied and are dropped.
fn unfold_extra(collection: Collection, row: Value) -> Value {
    if columns(collection).is_none() {
        return row;
    }
    match row {
        Value::Object(mut fields) => {
            let extra = fields.remove(EXTRA_COLUMN);
            fields.retain(|_, value| !value.is_null());
            if let Some(Value::Object(extra)) = extra {
                for (key, value) in extra {
                    fields.entry(key).or_insert(value);
                }
            }
            Value::Object(fields)
        }
        other => other,
    }
}

/// Patches may only touch real columns; `extra` is written whole on insert.
fn check_patch(collection: Collection, patch: &Value) -> Result<(), StoreError> {
    if let (Some(columns), Value::Object(fields)) = (columns(collection), patch) {
        if let Some(key) = fields.keys().find(|key| !columns.contains(&key.as_str())) {
            return Err(StoreError::InvalidRecord(format!("{} has no column {}", collection, key)));
        }
    }
    Ok(())
}

/// `RecordStore` backed by a Supabase/PostgREST database. Uniqueness is
/// enforced by unique indexes, and `insert_and_update` runs inside the
/// `insert_and_update` database function (see `sql/schema.sql`).
pub struct SupabaseStore {
    client: SupabaseClient,
}

impl SupabaseStore {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: SupabaseClient::new(config),
        }
    }

    fn table_path(collection: Collection, filter: &Filter) -> String {
        let mut path = format!("/rest/v1/{}", collection.table_name());
        let query: Vec<String> = filter
            .conditions()
            .iter()
            .map(|(field, value)| {
                let raw = match value {
                    Value::String(s) => s.clone(),
                    Value::Null => "null".to_string(),
                    other => other.to_string(),
                };
                let op = if value.is_null() { "is" } else { "eq" };
                format!("{}={}.{}", urlencoding::encode(field), op, urlencoding::encode(&raw))
            })
            .collect();

        if !query.is_empty() {
            path.push('?');
            path.push_str(&query.join("&"));
        }
        path
    }

    fn with_new_id(doc: Value) -> Result<Value, StoreError> {
        match doc {
            Value::Object(mut object) => {
                object.insert(ID_FIELD.to_string(), Value::String(Uuid::new_v4().to_string()));
                Ok(Value::Object(object))
            }
            other => Err(StoreError::InvalidRecord(format!("expected a JSON object, got {}", other))),
        }
    }

    fn first_row(collection: Collection, rows: Vec<Value>) -> Result<Value, StoreError> {
        rows.into_iter()
            .next()
            .ok_or_else(|| StoreError::InvalidRecord(format!("{} insert returned no rows", collection)))
    }
}

#[async_trait]
impl RecordStore for SupabaseStore {
    async fn find(&self, collection: Collection, filter: &Filter) -> Result<Vec<Value>, StoreError> {
        let path = Self::table_path(collection, filter);
        let rows: Vec<Value> = self.client.request(Method::GET, &path, None).await?;
        Ok(rows.into_iter().map(|row| unfold_extra(collection, row)).collect())
    }

    async fn insert(&self, collection: Collection, doc: Value) -> Result<Value, StoreError> {
        let path = Self::table_path(collection, &Filter::new());
        let row = fold_extra(collection, Self::with_new_id(doc)?)?;
        let rows: Vec<Value> = self.client.request(Method::POST, &path, Some(row)).await?;
        Ok(unfold_extra(collection, Self::first_row(collection, rows)?))
    }

    async fn insert_unique(
        &self,
        collection: Collection,
        doc: Value,
        key_fields: &[&str],
    ) -> Result<Value, StoreError> {
        debug!("Unique insert into {} on {:?}", collection, key_fields);
        match self.insert(collection, doc).await {
            Err(StoreError::Api { status, .. }) if status == StatusCode::CONFLICT.as_u16() => {
                Err(StoreError::Conflict(collection))
            }
            other => other,
        }
    }

    async fn update_by_id(&self, collection: Collection, id: &str, patch: Value) -> Result<u64, StoreError> {
        let mut patch = patch;
        if let Value::Object(object) = &mut patch {
            object.remove(ID_FIELD);
        }
        check_patch(collection, &patch)?;
        let path = Self::table_path(collection, &Filter::by_id(id));
        let rows: Vec<Value> = self.client.request(Method::PATCH, &path, Some(patch)).await?;
        Ok(rows.len() as u64)
    }

    async fn delete_by_id(&self, collection: Collection, id: &str) -> Result<u64, StoreError> {
        let path = Self::table_path(collection, &Filter::by_id(id));
        let rows: Vec<Value> = self.client.request(Method::DELETE, &path, None).await?;
        Ok(rows.len() as u64)
    }

    async fn insert_and_update(
        &self,
        insert_into: Collection,
        doc: Value,
        update_in: Collection,
        id: &str,
        patch: Value,
    ) -> Result<Value, StoreError> {
        check_patch(update_in, &patch)?;
        let body = json!({
            "insert_table": insert_into.table_name(),
            "record": fold_extra(insert_into, Self::with_new_id(doc)?)?,
            "update_table": update_in.table_name(),
            "target_id": id,
            "patch": patch,
        });

        // The function returns null, having written nothing, when the
        // target row does not exist.
        let stored: Value = self.client
            .request(Method::POST, "/rest/v1/rpc/insert_and_update", Some(body))
            .await?;

        if stored.is_null() {
            return Err(StoreError::NotFound(update_in));
        }
        Ok(unfold_extra(insert_into, stored))
    }
}
