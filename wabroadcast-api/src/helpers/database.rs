use crate::config::ApiConfig;
use crate::database::Database;
use std::path::PathBuf;
use std::sync::Arc;

/// Returns the path to the contacts database
///
/// Uses `[database] path` from the config when set, otherwise the platform
/// data directory:
///
/// - **macOS**: `~/Library/Application Support/wabroadcast/contacts.sqlite3`
/// - **Linux**: `~/.local/share/wabroadcast/contacts.sqlite3`
/// - **Windows**: `%LOCALAPPDATA%\wabroadcast\contacts.sqlite3`
pub fn get_db_path(config: &ApiConfig) -> anyhow::Result<PathBuf> {
    if let Some(path) = config.database_path() {
        return Ok(path.to_path_buf());
    }

    let data_dir = dirs::data_local_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not determine local data directory"))?;

    Ok(data_dir.join("wabroadcast").join("contacts.sqlite3"))
}

/// Open the database, creating it and its directory on first run
pub fn initialize_database(config: &ApiConfig) -> anyhow::Result<(Arc<Database>, PathBuf)> {
    let db_path = get_db_path(config)?;
    let db = Database::new(&db_path)?;
    Ok((Arc::new(db), db_path))
}
