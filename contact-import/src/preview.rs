use crate::batch::{process_import, ImportOptions};
use crate::cell::RawCell;
use crate::error::ImportError;
use crate::msisdn::{normalize_str, Msisdn};
use shared_types::{ImportPayload, ImportPreview};
use std::collections::HashSet;
use std::path::Path;

pub const DEFAULT_PAYLOAD_FILE: &str = "contacts_payload.json";

/// Runs the import pass for a preview. Nothing is written anywhere; the
/// returned payload is what the user may export or send to the bulk endpoint.
pub fn build_preview<R: AsRef<[RawCell]>>(
    rows: &[R],
    column_index: usize,
    existing: &HashSet<Msisdn>,
    category: Option<String>,
    options: ImportOptions,
) -> ImportPreview {
    let outcome = process_import(rows, column_index, existing, options);
    let limit_reached = outcome.limit_reached();
    let clean = outcome.numbers();

    ImportPreview {
        payload: ImportPayload {
            category,
            numbers: clean.clone(),
        },
        clean,
        stats: outcome.stats,
        limit_reached,
    }
}

/// Known numbers as the caller has them; entries that do not normalize are
/// ignored since they could never match a clean number anyway.
pub fn existing_from_strings<I, S>(values: I) -> HashSet<Msisdn>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    values
        .into_iter()
        .filter_map(|v| normalize_str(v.as_ref()))
        .collect()
}

pub fn write_payload(payload: &ImportPayload, path: &Path) -> Result<(), ImportError> {
    let json = serde_json::to_string_pretty(payload)?;
    std::fs::write(path, json)?;
    Ok(())
}

pub fn render_summary(preview: &ImportPreview) -> String {
    let stats = &preview.stats;
    let mut lines = vec![
        format!("{:<21}{}", "Total rows:", stats.total_rows),
        format!("{:<21}{}", "Valid:", stats.valid),
        format!("{:<21}{}", "Skipped (invalid):", stats.skipped_invalid),
        format!("{:<21}{}", "Skipped (duplicate):", stats.skipped_duplicate),
    ];

    if let Some(over_cap) = stats.over_cap {
        lines.push(format!("{:<21}{}", "Over the limit:", over_cap));
    }

    if preview.limit_reached {
        lines.push(format!(
            "Warning: only the first {} valid numbers were kept. Extra rows beyond this limit were skipped.",
            stats.limit_applied
        ));
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_rows() -> Vec<Vec<RawCell>> {
        ["phone", "03001111111", "0300-222-2222", "03001111111", "n/a"]
            .iter()
            .map(|v| vec![RawCell::from(*v)])
            .collect()
    }

    #[test]
    fn test_preview_payload_matches_clean_list() {
        let preview = build_preview(
            &sample_rows(),
            0,
            &HashSet::new(),
            Some("7".to_string()),
            ImportOptions::default(),
        );

        assert_eq!(preview.clean, vec!["03001111111", "03002222222"]);
        assert_eq!(preview.payload.numbers, preview.clean);
        assert_eq!(preview.payload.category.as_deref(), Some("7"));
        assert_eq!(preview.stats.skipped_invalid, 2);
        assert!(!preview.limit_reached);
    }

    #[test]
    fn test_existing_numbers_are_normalized() {
        let existing = existing_from_strings(["3002222222", "not a number"]);
        assert_eq!(existing.len(), 1);

        let preview = build_preview(&sample_rows(), 0, &existing, None, ImportOptions::default());
        assert_eq!(preview.clean, vec!["03001111111"]);
        assert_eq!(preview.stats.skipped_duplicate, 2);
    }

    #[test]
    fn test_summary_warns_when_limit_reached() {
        let preview = build_preview(
            &sample_rows(),
            0,
            &HashSet::new(),
            None,
            ImportOptions::with_limit(1),
        );
        assert!(preview.limit_reached);

        let summary = render_summary(&preview);
        assert!(summary
            .lines()
            .any(|line| line.starts_with("Valid:") && line.ends_with(" 1")));
        assert!(summary.contains("only the first 1 valid numbers"));
    }

    #[test]
    fn test_write_payload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_PAYLOAD_FILE);
        let payload = ImportPayload {
            category: None,
            numbers: vec!["03001111111".to_string()],
        };

        write_payload(&payload, &path).unwrap();

        let written: ImportPayload =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written, payload);
    }
}
