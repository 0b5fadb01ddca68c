use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Error block of the response envelope.
#[derive(Debug, Clone, Serialize, Deserialize, TS, PartialEq, Eq)]
#[ts(export)]
pub struct ApiErrorBody {
    /// HTTP status code
    pub code: u16,
    /// Machine readable reason, e.g. `CATEGORY_ENTITY_MISMATCH`
    pub kind: String,
    pub details: String,
}

/// `{ success, message?, count?, total?, data, error }` wrapper used by every
/// `/api` route.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<i64>,
    pub data: Option<T>,
    pub error: Option<ApiErrorBody>,
}

impl<T> ApiEnvelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            message: None,
            count: None,
            total: None,
            data: Some(data),
            error: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }

    pub fn with_total(mut self, total: i64) -> Self {
        self.total = Some(total);
        self
    }
}

impl ApiEnvelope<()> {
    /// Success without a payload, serialized as `data: null`.
    pub fn empty(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            count: None,
            total: None,
            data: None,
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>, error: ApiErrorBody) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            count: None,
            total: None,
            data: None,
            error: Some(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_shape() {
        let envelope = ApiEnvelope::failure(
            "Category is not valid for contacts",
            ApiErrorBody {
                code: 400,
                kind: "CATEGORY_ENTITY_MISMATCH".to_string(),
                details: "entityType=email".to_string(),
            },
        );
        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(value["success"], false);
        assert_eq!(value["data"], serde_json::Value::Null);
        assert_eq!(value["error"]["code"], 400);
        assert_eq!(value["error"]["details"], "entityType=email");
        assert!(value.get("count").is_none());
    }

    #[test]
    fn test_ok_with_count() {
        let envelope = ApiEnvelope::ok(vec![1, 2, 3]).with_count(3);
        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(value["success"], true);
        assert_eq!(value["count"], 3);
        assert_eq!(value["error"], serde_json::Value::Null);
    }
}
