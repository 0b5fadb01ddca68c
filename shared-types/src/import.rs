use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Counters produced by one pass of the import normalizer.
#[derive(Debug, Clone, Serialize, Deserialize, TS, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ImportStats {
    pub total_rows: usize,
    pub valid: usize,
    pub skipped_invalid: usize,
    pub skipped_duplicate: usize,
    pub limit_applied: usize,
    /// Valid, unseen numbers that were turned away by the cap. Only tracked
    /// when the remaining rows are classified instead of dropped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub over_cap: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, PartialEq, Eq)]
#[ts(export)]
pub struct ImportResult {
    pub clean: Vec<String>,
    pub stats: ImportStats,
}

/// Document handed back to the user for manual reuse of a previewed import.
#[derive(Debug, Clone, Serialize, Deserialize, TS, PartialEq, Eq)]
#[ts(export)]
pub struct ImportPayload {
    pub category: Option<String>,
    pub numbers: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ImportPreview {
    pub clean: Vec<String>,
    pub stats: ImportStats,
    pub limit_reached: bool,
    pub payload: ImportPayload,
}

#[derive(Debug, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PreviewImportRequest {
    /// Rows already split into cells by the caller
    #[ts(type = "Array<Array<string | number | null>> | null")]
    pub rows: Option<Vec<Vec<serde_json::Value>>>,
    /// Raw CSV text, used when `rows` is absent
    pub csv: Option<String>,
    #[serde(default)]
    pub column_index: usize,
    #[serde(default)]
    pub existing_numbers: Vec<String>,
    #[serde(default)]
    #[ts(type = "string | number | null")]
    pub category: Option<serde_json::Value>,
    pub limit: Option<usize>,
    #[serde(default)]
    pub classify_remaining: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_wire_format() {
        let stats = ImportStats {
            total_rows: 4,
            valid: 2,
            skipped_invalid: 1,
            skipped_duplicate: 1,
            limit_applied: 1000,
            over_cap: None,
        };
        let value = serde_json::to_value(&stats).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "totalRows": 4,
                "valid": 2,
                "skippedInvalid": 1,
                "skippedDuplicate": 1,
                "limitApplied": 1000
            })
        );
    }

    #[test]
    fn test_preview_request_defaults() {
        let req: PreviewImportRequest =
            serde_json::from_str(r#"{"csv":"03001234567\n"}"#).unwrap();
        assert_eq!(req.column_index, 0);
        assert!(req.existing_numbers.is_empty());
        assert!(req.rows.is_none());
        assert!(!req.classify_remaining);
    }
}
