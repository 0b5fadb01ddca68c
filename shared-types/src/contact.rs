use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Broadcast delivery state of a contact, stored and sent as 0/1/2.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(into = "u8", try_from = "u8")]
pub enum SendStatus {
    #[default]
    Pending,
    Sent,
    Failed,
}

impl From<SendStatus> for u8 {
    fn from(status: SendStatus) -> Self {
        match status {
            SendStatus::Pending => 0,
            SendStatus::Sent => 1,
            SendStatus::Failed => 2,
        }
    }
}

impl TryFrom<u8> for SendStatus {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(SendStatus::Pending),
            1 => Ok(SendStatus::Sent),
            2 => Ok(SendStatus::Failed),
            other => Err(format!("invalid send status {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Contact {
    pub id: i64,
    /// Canonical `03XXXXXXXXX` number, unique across contacts
    pub number: String,
    pub category: Option<i64>,
    pub is_active: bool,
    #[ts(type = "0 | 1 | 2")]
    pub send_status: SendStatus,
    pub note: String,
    pub source: String,
    pub last_message_date: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Category references arrive as ids, id strings, blank strings or null.
#[derive(Debug, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CreateContactRequest {
    pub number: String,
    #[serde(default)]
    #[ts(type = "string | number | null")]
    pub category: Option<serde_json::Value>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Default, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UpdateContactRequest {
    pub number: Option<String>,
    #[serde(default)]
    #[ts(type = "string | number | null")]
    pub category: Option<serde_json::Value>,
    pub is_active: Option<bool>,
}

/// `numbers` is kept as raw JSON so that a non-list payload can be rejected
/// with a proper error instead of a deserializer failure.
#[derive(Debug, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct BulkAddContactsRequest {
    #[serde(default)]
    #[ts(type = "Array<string | number | null>")]
    pub numbers: serde_json::Value,
    #[serde(default)]
    #[ts(type = "string | number | null")]
    pub category: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct BulkAddSummary {
    pub received: usize,
    pub total_rows: usize,
    pub valid: usize,
    pub skipped_invalid: usize,
    pub skipped_duplicate_in_payload: usize,
    pub duplicates_in_db: usize,
    pub inserted: usize,
    pub failed: usize,
    pub limit_applied: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct BulkAddContactsData {
    pub inserted_count: usize,
    pub inserted_ids: Vec<i64>,
    #[serde(rename = "duplicatesInDB")]
    pub duplicates_in_db: Vec<String>,
    pub summary: BulkAddSummary,
}
