#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("Failed to read table: {0}")]
    Table(String),

    #[error("Unsupported file type: {0} (expected .csv, .xlsx or .xls)")]
    UnsupportedFormat(String),

    #[error("Failed to read spreadsheet: {0}")]
    Spreadsheet(#[from] calamine::Error),

    #[error("Invalid phone number: {0}")]
    InvalidNumber(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}
