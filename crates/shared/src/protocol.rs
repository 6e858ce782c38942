use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::EncounterId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRequest {
    pub phone_number: String,
    pub year_of_birth: String,
}

/// One record produced by a successful transfer. Fields beyond `id` are
/// passed through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferResult {
    pub id: EncounterId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_date: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl TransferResult {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: EncounterId(id.into()),
            created_date: None,
            extra: serde_json::Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TransferResponse {
    #[serde(default)]
    pub results: Vec<TransferResult>,
}
