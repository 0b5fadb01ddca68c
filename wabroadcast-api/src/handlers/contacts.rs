use crate::database::categories as categories_db;
use crate::database::contacts::{self as contacts_db, ContactChanges, ContactFilter};
use crate::database::{Database, DbError};
use crate::handlers::ImportSettings;
use crate::helpers::{parse_category_ref, ApiError};
use actix_web::{web, HttpResponse};
use contact_import::{
    build_preview, existing_from_strings, normalize_str, process_values, ImportOptions, Msisdn,
    RawCell, TableReader,
};
use serde::Deserialize;
use serde_json::Value;
use shared_types::{
    ApiEnvelope, BulkAddContactsData, BulkAddContactsRequest, BulkAddSummary,
    CreateContactRequest, PreviewImportRequest, UpdateContactRequest,
};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;

const DEFAULT_PAGE_SIZE: usize = 50;
const MAX_PAGE_SIZE: usize = 500;

fn parse_number(raw: &str) -> Result<Msisdn, ApiError> {
    normalize_str(raw).ok_or_else(|| {
        ApiError::bad_request("INVALID_NUMBER", "Invalid phone number")
            .with_details(format!("Expected 03XXXXXXXXX, got {:?}", raw))
    })
}

fn contact_not_found(err: DbError) -> ApiError {
    match err {
        DbError::NotFound => ApiError::not_found("CONTACT_NOT_FOUND", "Contact not found"),
        other => other.into(),
    }
}

/// Fails unless the category exists and may be used for contacts.
async fn check_contact_category(db: &Database, id: i64) -> Result<(), ApiError> {
    let category = categories_db::get_category(db.async_connection.clone(), id)
        .await
        .map_err(|e| match e {
            DbError::NotFound => DbError::CategoryNotFound,
            other => other,
        })?;

    if !category.entity_type.allows_contacts() {
        return Err(DbError::CategoryNotForContacts(category.entity_type).into());
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListContactsQuery {
    page: Option<usize>,
    limit: Option<usize>,
    category: Option<i64>,
    is_active: Option<bool>,
    search: Option<String>,
}

pub async fn list_contacts(
    db: web::Data<Arc<Database>>,
    query: web::Query<ListContactsQuery>,
) -> Result<HttpResponse, ApiError> {
    let query = query.into_inner();
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let page = query.page.unwrap_or(1).max(1);

    let filter = ContactFilter {
        category: query.category,
        is_active: query.is_active,
        search: query.search,
    };

    let (contacts, total) =
        contacts_db::list_contacts(db.async_connection.clone(), &filter, limit, (page - 1) * limit)
            .await?;

    let count = contacts.len();
    Ok(HttpResponse::Ok().json(ApiEnvelope::ok(contacts).with_count(count).with_total(total)))
}

pub async fn add_contact(
    db: web::Data<Arc<Database>>,
    request: web::Json<CreateContactRequest>,
) -> Result<HttpResponse, ApiError> {
    let request = request.into_inner();
    let number = parse_number(&request.number)?;
    let category = parse_category_ref(request.category.as_ref())?;

    let contact = contacts_db::insert_contact(
        db.async_connection.clone(),
        &number,
        category,
        request.is_active.unwrap_or(true),
        "manual",
    )
    .await?;

    info!("Created contact {} ({})", contact.id, contact.number);

    Ok(HttpResponse::Created()
        .json(ApiEnvelope::ok(contact).with_message("Contact created successfully")))
}

pub async fn update_contact(
    db: web::Data<Arc<Database>>,
    path: web::Path<i64>,
    request: web::Json<UpdateContactRequest>,
) -> Result<HttpResponse, ApiError> {
    let contact_id = path.into_inner();
    let request = request.into_inner();

    let changes = ContactChanges {
        number: request.number.as_deref().map(parse_number).transpose()?,
        // A blank string clears the category; an absent field keeps it
        category: request
            .category
            .as_ref()
            .map(|value| parse_category_ref(Some(value)))
            .transpose()?,
        is_active: request.is_active,
    };

    let contact = contacts_db::update_contact(db.async_connection.clone(), contact_id, changes)
        .await
        .map_err(contact_not_found)?;

    Ok(HttpResponse::Ok().json(ApiEnvelope::ok(contact).with_message("Contact updated")))
}

pub async fn delete_contact(
    db: web::Data<Arc<Database>>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let contact_id = path.into_inner();

    let contact = contacts_db::delete_contact(db.async_connection.clone(), contact_id)
        .await
        .map_err(contact_not_found)?;

    info!("Deleted contact {} ({})", contact.id, contact.number);

    Ok(HttpResponse::Ok().json(ApiEnvelope::ok(contact).with_message("Contact deleted")))
}

/// Authoritative write of an uploaded number list. Every batch-level check
/// runs before anything is written.
pub async fn bulk_add_contacts(
    db: web::Data<Arc<Database>>,
    settings: web::Data<ImportSettings>,
    request: web::Json<BulkAddContactsRequest>,
) -> Result<HttpResponse, ApiError> {
    let BulkAddContactsRequest { numbers, category } = request.into_inner();

    let Value::Array(values) = numbers else {
        return Err(ApiError::bad_request(
            "INVALID_PAYLOAD",
            "numbers must be an array",
        ));
    };

    let category = parse_category_ref(category.as_ref())?;
    if let Some(id) = category {
        check_contact_category(&db, id).await?;
    }

    let cells: Vec<RawCell> = values.iter().map(RawCell::from_json).collect();
    let outcome = process_values(
        &cells,
        &HashSet::new(),
        ImportOptions::with_limit(settings.limit),
    );

    let existing =
        contacts_db::find_existing_numbers(db.async_connection.clone(), &outcome.clean).await?;
    let (duplicates, to_insert): (Vec<Msisdn>, Vec<Msisdn>) = outcome
        .clean
        .iter()
        .cloned()
        .partition(|number| existing.contains(number.as_str()));

    let inserted =
        contacts_db::insert_many(db.async_connection.clone(), &to_insert, category, "bulk")
            .await?;

    let inserted_count = inserted.inserted_ids.len();
    let summary = BulkAddSummary {
        received: values.len(),
        total_rows: outcome.stats.total_rows,
        valid: outcome.stats.valid,
        skipped_invalid: outcome.stats.skipped_invalid,
        skipped_duplicate_in_payload: outcome.stats.skipped_duplicate,
        duplicates_in_db: duplicates.len(),
        inserted: inserted_count,
        failed: inserted.failed.len(),
        limit_applied: outcome.stats.limit_applied,
    };

    info!(
        "Bulk add: received={}, valid={}, inserted={}, duplicates_in_db={}, failed={}",
        summary.received, summary.valid, summary.inserted, summary.duplicates_in_db, summary.failed
    );

    let data = BulkAddContactsData {
        inserted_count,
        inserted_ids: inserted.inserted_ids,
        duplicates_in_db: duplicates.into_iter().map(Msisdn::into_string).collect(),
        summary,
    };
    let envelope = ApiEnvelope::ok(data)
        .with_message(format!("{} contacts added", inserted_count))
        .with_count(inserted_count);

    if inserted_count > 0 {
        Ok(HttpResponse::Created().json(envelope))
    } else {
        Ok(HttpResponse::Ok().json(envelope))
    }
}

/// Same pass as the bulk commit, without touching the store.
pub async fn preview_import(
    settings: web::Data<ImportSettings>,
    request: web::Json<PreviewImportRequest>,
) -> Result<HttpResponse, ApiError> {
    let request = request.into_inner();

    let rows: Vec<Vec<RawCell>> = match (request.rows, request.csv) {
        (Some(rows), _) => rows
            .iter()
            .map(|row| row.iter().map(RawCell::from_json).collect())
            .collect(),
        (None, Some(csv)) => TableReader::new().read(csv.as_bytes()).map_err(|e| {
            ApiError::bad_request("INVALID_PAYLOAD", "Could not read CSV").with_details(e.to_string())
        })?,
        (None, None) => {
            return Err(ApiError::bad_request(
                "INVALID_PAYLOAD",
                "Either rows or csv is required",
            ))
        }
    };

    let category = parse_category_ref(request.category.as_ref())?.map(|id| id.to_string());
    let existing = existing_from_strings(&request.existing_numbers);

    let limit = request.limit.unwrap_or(settings.limit).min(settings.limit);
    let mut options = ImportOptions::with_limit(limit);
    if request.classify_remaining {
        options = options.classify_remaining();
    }

    let preview = build_preview(&rows, request.column_index, &existing, category, options);
    let count = preview.clean.len();

    Ok(HttpResponse::Ok().json(ApiEnvelope::ok(preview).with_count(count)))
}
