use serde::{Deserialize, Serialize};

/// Write acknowledgements, shaped like the document-store results the web
/// client already consumes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertResult {
    pub acknowledged: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inserted_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl InsertResult {
    pub fn inserted(id: Option<String>) -> Self {
        Self { acknowledged: true, inserted_id: id, message: None }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self { acknowledged: false, inserted_id: None, message: Some(message.into()) }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResult {
    pub acknowledged: bool,
    pub matched_count: u64,
    pub modified_count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResult {
    pub acknowledged: bool,
    pub deleted_count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminStatus {
    pub is_admin: bool,
}
