use crate::database::{is_unique_violation, AsyncDbConnection, DbError, DbResult};
use rusqlite::{types::Type, Connection, OptionalExtension, Row};
use shared_types::{Category, EntityType};

const CATEGORY_COLUMNS: &str = "id, name, entity_type, is_active, created_at, updated_at";

fn row_to_category(row: &Row) -> rusqlite::Result<Category> {
    let entity_type: String = row.get(2)?;
    let entity_type = entity_type
        .parse::<EntityType>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e)))?;

    Ok(Category {
        id: row.get(0)?,
        name: row.get(1)?,
        entity_type,
        is_active: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

pub(crate) fn find_category(conn: &Connection, id: i64) -> DbResult<Option<Category>> {
    Ok(conn
        .query_row(
            &format!("SELECT {} FROM categories WHERE id = ?", CATEGORY_COLUMNS),
            [id],
            row_to_category,
        )
        .optional()?)
}

pub async fn list_categories(
    conn: AsyncDbConnection,
    entity_type: Option<EntityType>,
) -> DbResult<Vec<Category>> {
    let conn = conn.lock().await?;

    let categories = match entity_type {
        Some(entity_type) => {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM categories WHERE entity_type = ? ORDER BY name ASC",
                CATEGORY_COLUMNS
            ))?;
            let rows = stmt.query_map([entity_type.as_str()], row_to_category)?;
            rows.collect::<Result<Vec<_>, _>>()?
        }
        None => {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM categories ORDER BY name ASC",
                CATEGORY_COLUMNS
            ))?;
            let rows = stmt.query_map([], row_to_category)?;
            rows.collect::<Result<Vec<_>, _>>()?
        }
    };

    Ok(categories)
}

pub async fn get_category(conn: AsyncDbConnection, id: i64) -> DbResult<Category> {
    let conn = conn.lock().await?;
    find_category(&conn, id)?.ok_or(DbError::NotFound)
}

pub async fn insert_category(
    conn: AsyncDbConnection,
    name: &str,
    entity_type: EntityType,
) -> DbResult<Category> {
    let conn = conn.lock().await?;
    let now = chrono::Utc::now().timestamp();

    let result = conn.query_row(
        &format!(
            "INSERT INTO categories (name, entity_type, is_active, created_at, updated_at)
             VALUES (?, ?, 1, ?, ?)
             RETURNING {}",
            CATEGORY_COLUMNS
        ),
        rusqlite::params![name, entity_type.as_str(), now, now],
        row_to_category,
    );

    match result {
        Ok(category) => Ok(category),
        Err(e) if is_unique_violation(&e) => Err(DbError::Duplicate("name")),
        Err(e) => Err(e.into()),
    }
}

pub async fn update_category(
    conn: AsyncDbConnection,
    id: i64,
    name: Option<&str>,
    entity_type: Option<EntityType>,
    is_active: Option<bool>,
) -> DbResult<Category> {
    let conn = conn.lock().await?;
    let current = find_category(&conn, id)?.ok_or(DbError::NotFound)?;
    let now = chrono::Utc::now().timestamp();

    let result = conn.query_row(
        &format!(
            "UPDATE categories
             SET name = ?, entity_type = ?, is_active = ?, updated_at = ?
             WHERE id = ?
             RETURNING {}",
            CATEGORY_COLUMNS
        ),
        rusqlite::params![
            name.unwrap_or(&current.name),
            entity_type.unwrap_or(current.entity_type).as_str(),
            is_active.unwrap_or(current.is_active),
            now,
            id
        ],
        row_to_category,
    );

    match result {
        Ok(category) => Ok(category),
        Err(e) if is_unique_violation(&e) => Err(DbError::Duplicate("name")),
        Err(e) => Err(e.into()),
    }
}

/// Contacts pointing at the category keep existing with no category.
pub async fn delete_category(conn: AsyncDbConnection, id: i64) -> DbResult<()> {
    let conn = conn.lock().await?;
    let deleted = conn.execute("DELETE FROM categories WHERE id = ?", [id])?;

    if deleted == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_support::temp_database;

    #[tokio::test]
    async fn test_insert_and_list_sorted_by_name() {
        let (db, _dir) = temp_database();
        let conn = db.async_connection.clone();

        insert_category(conn.clone(), "Wholesale", EntityType::Contact)
            .await
            .unwrap();
        insert_category(conn.clone(), "Newsletter", EntityType::Email)
            .await
            .unwrap();
        insert_category(conn.clone(), "Customers", EntityType::Both)
            .await
            .unwrap();

        let all = list_categories(conn.clone(), None).await.unwrap();
        let names: Vec<_> = all.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Customers", "Newsletter", "Wholesale"]);
        assert!(all.iter().all(|c| c.is_active));

        let emails = list_categories(conn, Some(EntityType::Email)).await.unwrap();
        assert_eq!(emails.len(), 1);
        assert_eq!(emails[0].name, "Newsletter");
    }

    #[tokio::test]
    async fn test_duplicate_name_is_rejected() {
        let (db, _dir) = temp_database();
        let conn = db.async_connection.clone();

        insert_category(conn.clone(), "VIP", EntityType::Contact)
            .await
            .unwrap();
        let err = insert_category(conn, "VIP", EntityType::Email)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Duplicate("name")));
    }

    #[tokio::test]
    async fn test_update_keeps_absent_fields() {
        let (db, _dir) = temp_database();
        let conn = db.async_connection.clone();

        let created = insert_category(conn.clone(), "Leads", EntityType::Contact)
            .await
            .unwrap();
        let updated = update_category(conn.clone(), created.id, None, None, Some(false))
            .await
            .unwrap();

        assert_eq!(updated.name, "Leads");
        assert_eq!(updated.entity_type, EntityType::Contact);
        assert!(!updated.is_active);

        let missing = update_category(conn, 9999, Some("x"), None, None).await;
        assert!(matches!(missing, Err(DbError::NotFound)));
    }

    #[tokio::test]
    async fn test_delete_missing_category() {
        let (db, _dir) = temp_database();
        let conn = db.async_connection.clone();

        let created = insert_category(conn.clone(), "Temp", EntityType::Contact)
            .await
            .unwrap();
        delete_category(conn.clone(), created.id).await.unwrap();

        assert!(matches!(
            delete_category(conn.clone(), created.id).await,
            Err(DbError::NotFound)
        ));
        assert!(matches!(
            get_category(conn, created.id).await,
            Err(DbError::NotFound)
        ));
    }
}
