use crate::database::categories::find_category;
use crate::database::{is_unique_violation, AsyncDbConnection, DbError, DbResult};
use contact_import::Msisdn;
use rusqlite::{params_from_iter, types::Type, types::Value, Connection, OptionalExtension, Row};
use shared_types::{Contact, SendStatus};
use std::collections::HashSet;

const CONTACT_COLUMNS: &str = "id, number, category_id, is_active, send_status, note, source,
                               last_message_date, created_at, updated_at";

/// SQLite's default bound-parameter ceiling
const MAX_BOUND_PARAMS: usize = 32_766;

#[derive(Debug, Clone, Default)]
pub struct ContactFilter {
    pub category: Option<i64>,
    pub is_active: Option<bool>,
    /// Substring match on the number
    pub search: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ContactChanges {
    pub number: Option<Msisdn>,
    /// `Some(None)` clears the category
    pub category: Option<Option<i64>>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Default)]
pub struct BulkInsertOutcome {
    pub inserted_ids: Vec<i64>,
    /// Numbers whose insert failed, with the reason
    pub failed: Vec<(String, String)>,
}

fn row_to_contact(row: &Row) -> rusqlite::Result<Contact> {
    let send_status: u8 = row.get(4)?;
    let send_status = SendStatus::try_from(send_status)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Integer, e.into()))?;

    Ok(Contact {
        id: row.get(0)?,
        number: row.get(1)?,
        category: row.get(2)?,
        is_active: row.get(3)?,
        send_status,
        note: row.get(5)?,
        source: row.get(6)?,
        last_message_date: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

/// Rejects references to missing categories and categories not meant for contacts.
fn ensure_contact_category(conn: &Connection, category: Option<i64>) -> DbResult<()> {
    let Some(id) = category else {
        return Ok(());
    };

    let category = find_category(conn, id)?.ok_or(DbError::CategoryNotFound)?;
    if !category.entity_type.allows_contacts() {
        return Err(DbError::CategoryNotForContacts(category.entity_type));
    }
    Ok(())
}

fn find_contact(conn: &Connection, id: i64) -> DbResult<Option<Contact>> {
    Ok(conn
        .query_row(
            &format!("SELECT {} FROM contacts WHERE id = ?", CONTACT_COLUMNS),
            [id],
            row_to_contact,
        )
        .optional()?)
}

fn filter_clause(filter: &ContactFilter) -> (String, Vec<Value>) {
    let mut conditions = Vec::new();
    let mut params = Vec::new();

    if let Some(category) = filter.category {
        conditions.push("category_id = ?");
        params.push(Value::Integer(category));
    }
    if let Some(is_active) = filter.is_active {
        conditions.push("is_active = ?");
        params.push(Value::Integer(is_active as i64));
    }
    if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        conditions.push("instr(number, ?) > 0");
        params.push(Value::Text(search.to_string()));
    }

    if conditions.is_empty() {
        (String::new(), params)
    } else {
        (format!("WHERE {}", conditions.join(" AND ")), params)
    }
}

/// One page of contacts, newest first, plus the total matching the filter.
pub async fn list_contacts(
    conn: AsyncDbConnection,
    filter: &ContactFilter,
    limit: usize,
    offset: usize,
) -> DbResult<(Vec<Contact>, i64)> {
    let conn = conn.lock().await?;
    let (where_clause, params) = filter_clause(filter);

    let total: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM contacts {}", where_clause),
        params_from_iter(params.iter()),
        |row| row.get(0),
    )?;

    let mut page_params = params;
    page_params.push(Value::Integer(limit as i64));
    page_params.push(Value::Integer(offset as i64));

    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM contacts {} ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
        CONTACT_COLUMNS, where_clause
    ))?;
    let contacts = stmt
        .query_map(params_from_iter(page_params.iter()), row_to_contact)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok((contacts, total))
}

pub async fn get_contact(conn: AsyncDbConnection, id: i64) -> DbResult<Contact> {
    let conn = conn.lock().await?;
    find_contact(&conn, id)?.ok_or(DbError::NotFound)
}

pub async fn insert_contact(
    conn: AsyncDbConnection,
    number: &Msisdn,
    category: Option<i64>,
    is_active: bool,
    source: &str,
) -> DbResult<Contact> {
    let conn = conn.lock().await?;
    ensure_contact_category(&conn, category)?;
    let now = chrono::Utc::now().timestamp();

    let result = conn.query_row(
        &format!(
            "INSERT INTO contacts (number, category_id, is_active, source, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)
             RETURNING {}",
            CONTACT_COLUMNS
        ),
        rusqlite::params![number.as_str(), category, is_active, source, now, now],
        row_to_contact,
    );

    match result {
        Ok(contact) => Ok(contact),
        Err(e) if is_unique_violation(&e) => Err(DbError::Duplicate("number")),
        Err(e) => Err(e.into()),
    }
}

pub async fn update_contact(
    conn: AsyncDbConnection,
    id: i64,
    changes: ContactChanges,
) -> DbResult<Contact> {
    let conn = conn.lock().await?;
    let current = find_contact(&conn, id)?.ok_or(DbError::NotFound)?;

    let category = changes.category.unwrap_or(current.category);
    ensure_contact_category(&conn, category)?;

    let number = changes
        .number
        .map(Msisdn::into_string)
        .unwrap_or(current.number);
    let now = chrono::Utc::now().timestamp();

    let result = conn.query_row(
        &format!(
            "UPDATE contacts
             SET number = ?, category_id = ?, is_active = ?, updated_at = ?
             WHERE id = ?
             RETURNING {}",
            CONTACT_COLUMNS
        ),
        rusqlite::params![
            number,
            category,
            changes.is_active.unwrap_or(current.is_active),
            now,
            id
        ],
        row_to_contact,
    );

    match result {
        Ok(contact) => Ok(contact),
        Err(e) if is_unique_violation(&e) => Err(DbError::Duplicate("number")),
        Err(e) => Err(e.into()),
    }
}

/// Deletes the contact and hands back the row as it was.
pub async fn delete_contact(conn: AsyncDbConnection, id: i64) -> DbResult<Contact> {
    let conn = conn.lock().await?;

    conn.query_row(
        &format!("DELETE FROM contacts WHERE id = ? RETURNING {}", CONTACT_COLUMNS),
        [id],
        row_to_contact,
    )
    .optional()?
    .ok_or(DbError::NotFound)
}

/// Which of `numbers` are already stored. Issues a single `IN (...)` query
/// unless the list exceeds SQLite's parameter ceiling.
pub async fn find_existing_numbers(
    conn: AsyncDbConnection,
    numbers: &[Msisdn],
) -> DbResult<HashSet<String>> {
    let mut existing = HashSet::new();
    if numbers.is_empty() {
        return Ok(existing);
    }

    let conn = conn.lock().await?;
    for chunk in numbers.chunks(MAX_BOUND_PARAMS) {
        let placeholders = vec!["?"; chunk.len()].join(", ");
        let mut stmt = conn.prepare(&format!(
            "SELECT number FROM contacts WHERE number IN ({})",
            placeholders
        ))?;
        let rows = stmt.query_map(params_from_iter(chunk.iter().map(Msisdn::as_str)), |row| {
            row.get::<_, String>(0)
        })?;
        for number in rows {
            existing.insert(number?);
        }
    }

    Ok(existing)
}

/// Inserts every number in one transaction. A row that fails is recorded and
/// the rest still go in; the category is checked once up front.
pub async fn insert_many(
    conn: AsyncDbConnection,
    numbers: &[Msisdn],
    category: Option<i64>,
    source: &str,
) -> DbResult<BulkInsertOutcome> {
    let mut conn = conn.lock().await?;
    ensure_contact_category(&conn, category)?;

    let mut outcome = BulkInsertOutcome::default();
    if numbers.is_empty() {
        return Ok(outcome);
    }

    let now = chrono::Utc::now().timestamp();
    let tx = conn.transaction()?;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO contacts (number, category_id, is_active, source, created_at, updated_at)
             VALUES (?, ?, 1, ?, ?, ?)
             RETURNING id",
        )?;

        for number in numbers {
            match stmt.query_row(
                rusqlite::params![number.as_str(), category, source, now, now],
                |row| row.get::<_, i64>(0),
            ) {
                Ok(id) => outcome.inserted_ids.push(id),
                Err(e) => {
                    tracing::warn!("Failed to insert contact {}: {}", number, e);
                    outcome.failed.push((number.to_string(), e.to_string()));
                }
            }
        }
    }
    tx.commit()?;

    Ok(outcome)
}
