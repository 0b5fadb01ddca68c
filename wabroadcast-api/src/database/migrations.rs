use rusqlite::Connection;

/// Run all database migrations
pub fn run_migrations(conn: &Connection) -> anyhow::Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS categories (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name VARCHAR NOT NULL UNIQUE,
            entity_type VARCHAR NOT NULL DEFAULT 'contact'
                CHECK (entity_type IN ('contact', 'email', 'both')),
            is_active BOOLEAN NOT NULL DEFAULT true,
            created_at BIGINT NOT NULL,
            updated_at BIGINT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_categories_active
            ON categories(is_active)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_categories_entity_type
            ON categories(entity_type)",
        [],
    )?;

    // UNIQUE(number) is the backstop for application-level dedupe
    conn.execute(
        "CREATE TABLE IF NOT EXISTS contacts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            number VARCHAR NOT NULL UNIQUE CHECK (length(number) = 11),
            send_status INTEGER NOT NULL DEFAULT 0 CHECK (send_status IN (0, 1, 2)),
            is_active BOOLEAN NOT NULL DEFAULT true,
            category_id INTEGER REFERENCES categories(id) ON DELETE SET NULL,
            note VARCHAR NOT NULL DEFAULT '',
            last_message_date BIGINT,
            source VARCHAR NOT NULL DEFAULT '',
            created_at BIGINT NOT NULL,
            updated_at BIGINT NOT NULL
        )",
        [],
    )?;

    // Common broadcast filter
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_contacts_broadcast
            ON contacts(category_id, is_active, send_status)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_contacts_last_message
            ON contacts(last_message_date DESC)",
        [],
    )?;

    Ok(())
}
