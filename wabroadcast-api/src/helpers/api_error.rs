use crate::database::DbError;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::Value;
use shared_types::{ApiEnvelope, ApiErrorBody};

/// Error rendered as a failed response envelope.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct ApiError {
    status: StatusCode,
    kind: &'static str,
    message: String,
    details: String,
}

impl ApiError {
    fn new(status: StatusCode, kind: &'static str, message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            status,
            kind,
            details: message.clone(),
            message,
        }
    }

    pub fn bad_request(kind: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, kind, message)
    }

    pub fn not_found(kind: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, kind, message)
    }

    pub fn internal(message: impl Into<String>, details: impl ToString) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", message)
            .with_details(details.to_string())
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = details.into();
        self
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound => ApiError::not_found("NOT_FOUND", "Record not found"),
            DbError::Duplicate("number") => {
                ApiError::bad_request("DUPLICATE_CONTACT", "Contact with this number already exists")
            }
            DbError::Duplicate(field) => ApiError::bad_request(
                "DUPLICATE_CATEGORY",
                format!("Category with this {} already exists", field),
            ),
            DbError::CategoryNotFound => {
                ApiError::bad_request("CATEGORY_NOT_FOUND", "Category not found")
            }
            DbError::CategoryNotForContacts(entity_type) => ApiError::bad_request(
                "CATEGORY_ENTITY_MISMATCH",
                "Category is not valid for contacts",
            )
            .with_details(format!("entityType={}", entity_type)),
            DbError::Pool(_) | DbError::Sqlite(_) => {
                tracing::error!("Database error: {}", err);
                ApiError::internal("Database error", err)
            }
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        self.status
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status).json(ApiEnvelope::failure(
            self.message.clone(),
            ApiErrorBody {
                code: self.status.as_u16(),
                kind: self.kind.to_string(),
                details: self.details.clone(),
            },
        ))
    }
}

/// Reads a category reference: null, missing or blank means none; an integer
/// or an integer string is an id.
pub fn parse_category_ref(value: Option<&Value>) -> Result<Option<i64>, ApiError> {
    let invalid = || ApiError::bad_request("INVALID_CATEGORY_ID", "Invalid category id");

    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => s.trim().parse::<i64>().map(Some).map_err(|_| invalid()),
        Some(Value::Number(n)) => n.as_i64().map(Some).ok_or_else(invalid),
        Some(_) => Err(invalid()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;
    use serde_json::json;
    use shared_types::EntityType;

    #[test]
    fn test_parse_category_ref() {
        assert_eq!(parse_category_ref(None).unwrap(), None);
        assert_eq!(parse_category_ref(Some(&json!(null))).unwrap(), None);
        assert_eq!(parse_category_ref(Some(&json!("  "))).unwrap(), None);
        assert_eq!(parse_category_ref(Some(&json!("12"))).unwrap(), Some(12));
        assert_eq!(parse_category_ref(Some(&json!(7))).unwrap(), Some(7));

        for bad in [json!("abc"), json!(1.5), json!([1]), json!(true)] {
            let err = parse_category_ref(Some(&bad)).unwrap_err();
            assert_eq!(err.kind(), "INVALID_CATEGORY_ID");
        }
    }

    #[actix_web::test]
    async fn test_entity_mismatch_envelope() {
        let err = ApiError::from(DbError::CategoryNotForContacts(EntityType::Email));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let body = to_bytes(err.error_response().into_body()).await.unwrap();
        let value: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["success"], false);
        assert_eq!(value["data"], Value::Null);
        assert_eq!(value["error"]["code"], 400);
        assert_eq!(value["error"]["kind"], "CATEGORY_ENTITY_MISMATCH");
        assert_eq!(value["error"]["details"], "entityType=email");
    }

    #[test]
    fn test_duplicate_mapping() {
        assert_eq!(
            ApiError::from(DbError::Duplicate("number")).kind(),
            "DUPLICATE_CONTACT"
        );
        assert_eq!(
            ApiError::from(DbError::Duplicate("name")).kind(),
            "DUPLICATE_CATEGORY"
        );
        assert_eq!(
            ApiError::from(DbError::NotFound).status_code(),
            StatusCode::NOT_FOUND
        );
    }
}
