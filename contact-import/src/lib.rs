//! Contact Import Crate
//!
//! Turns raw tabular input into a deduplicated list of canonical mobile numbers
//! plus an accept/reject summary. The same pass backs the interactive preview
//! (`import-preview` CLI and the preview endpoint) and the server bulk commit,
//! so a previewed file yields the exact list the server would write.
//!
//! # Architecture
//!
//! - **Wire types**: `ImportStats`, `ImportResult`, `ImportPayload` live in `shared-types`
//! - **msisdn**: the normalizer and the `Msisdn` newtype
//! - **batch**: the single-pass cap/dedupe processor
//! - **table**: CSV bytes or the first workbook sheet to rows of `RawCell`
//! - **preview**: summary and exportable payload for a processed batch
//!
//! # Example
//!
//! ```rust,ignore
//! use contact_import::{process_import, ImportOptions, TableReader};
//! use std::collections::HashSet;
//!
//! let rows = TableReader::new().read(csv_bytes)?;
//! let outcome = process_import(&rows, 0, &HashSet::new(), ImportOptions::default());
//! println!("{} valid of {}", outcome.stats.valid, outcome.stats.total_rows);
//! ```

pub mod batch;
pub mod cell;
pub mod error;
pub mod msisdn;
pub mod preview;
pub mod table;

pub use batch::{
    process_import, process_values, ImportOptions, ImportOutcome, OverflowPolicy,
    DEFAULT_IMPORT_LIMIT,
};
pub use cell::RawCell;
pub use error::ImportError;
pub use msisdn::{normalize, normalize_str, Msisdn};
pub use preview::{build_preview, existing_from_strings, render_summary, write_payload};
pub use table::{TableFormat, TableReader};
