use crate::cell::RawCell;
use crate::msisdn::{normalize, Msisdn};
use shared_types::{ImportResult, ImportStats};
use std::collections::HashSet;

pub const DEFAULT_IMPORT_LIMIT: usize = 1000;

/// What happens to rows that arrive once the cap is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverflowPolicy {
    /// Stop scanning at the first admissible row past the cap. That row is
    /// counted in `total_rows` only; later rows are not counted at all.
    #[default]
    Stop,
    /// Keep scanning and classifying, without admitting anything.
    ClassifyRemaining,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportOptions {
    pub limit: usize,
    pub overflow: OverflowPolicy,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            limit: DEFAULT_IMPORT_LIMIT,
            overflow: OverflowPolicy::Stop,
        }
    }
}

impl ImportOptions {
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }

    pub fn classify_remaining(mut self) -> Self {
        self.overflow = OverflowPolicy::ClassifyRemaining;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportOutcome {
    pub clean: Vec<Msisdn>,
    pub stats: ImportStats,
}

impl ImportOutcome {
    pub fn limit_reached(&self) -> bool {
        self.stats.valid >= self.stats.limit_applied
    }

    pub fn numbers(&self) -> Vec<String> {
        self.clean.iter().map(|n| n.as_str().to_string()).collect()
    }
}

impl From<ImportOutcome> for ImportResult {
    fn from(outcome: ImportOutcome) -> Self {
        ImportResult {
            clean: outcome.clean.into_iter().map(Msisdn::into_string).collect(),
            stats: outcome.stats,
        }
    }
}

/// Runs the import pass over one column of `rows`. A row shorter than
/// `column_index` counts as an invalid value.
pub fn process_import<R: AsRef<[RawCell]>>(
    rows: &[R],
    column_index: usize,
    existing: &HashSet<Msisdn>,
    options: ImportOptions,
) -> ImportOutcome {
    process_cells(
        rows.iter().map(|row| row.as_ref().get(column_index)),
        existing,
        options,
    )
}

/// Same pass over a flat list of values, as posted to the bulk endpoint.
pub fn process_values(
    values: &[RawCell],
    existing: &HashSet<Msisdn>,
    options: ImportOptions,
) -> ImportOutcome {
    process_cells(values.iter().map(Some), existing, options)
}

fn process_cells<'a, I>(cells: I, existing: &HashSet<Msisdn>, options: ImportOptions) -> ImportOutcome
where
    I: IntoIterator<Item = Option<&'a RawCell>>,
{
    let mut seen: HashSet<Msisdn> = HashSet::new();
    let mut clean: Vec<Msisdn> = Vec::new();
    let mut stats = ImportStats {
        limit_applied: options.limit,
        ..ImportStats::default()
    };
    let mut over_cap = 0usize;

    for cell in cells {
        stats.total_rows += 1;

        let Some(number) = cell.and_then(normalize) else {
            stats.skipped_invalid += 1;
            continue;
        };

        if seen.contains(&number) || existing.contains(&number) {
            stats.skipped_duplicate += 1;
            continue;
        }

        if clean.len() < options.limit {
            seen.insert(number.clone());
            clean.push(number);
            stats.valid += 1;
            continue;
        }

        match options.overflow {
            OverflowPolicy::Stop => break,
            OverflowPolicy::ClassifyRemaining => {
                // repeats of a turned-away number still count as duplicates
                seen.insert(number);
                over_cap += 1;
            }
        }
    }

    if options.overflow == OverflowPolicy::ClassifyRemaining {
        stats.over_cap = Some(over_cap);
    }

    ImportOutcome { clean, stats }
}
