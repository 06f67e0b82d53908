//! Work entries: one (local id, application number, publication number) triple per row.
//!
//! Entry sources are spreadsheet exports, so numeric cells often arrive as
//! `2024147578.0`. Every cell is trimmed and a trailing `.0` is dropped before
//! validation.
//!
//! # Row rules
//!
//! - The first column empty → end of table, loading stops.
//! - Second or third column empty → [`EntryError::MissingField`]; the whole
//!   source is rejected before any entry is processed.
//! - No rows at all → [`EntryError::NoEntries`].

use std::io::Read;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum EntryError {
    #[error("row {row} (local id {local_id}): {field} is empty")]
    MissingField {
        row: usize,
        local_id: String,
        field: &'static str,
    },
    #[error("entry source contains no entries")]
    NoEntries,
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// One application to process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub local_id: String,
    pub application_number: String,
    pub publication_number: String,
}

impl Entry {
    /// Key used in logs so a failed entry can be re-run by hand.
    pub fn key(&self) -> String {
        format!("{}_{}", self.local_id, self.application_number)
    }
}

/// Trim a cell and strip the `.0` a spreadsheet adds to integer-valued numbers.
pub fn normalize_cell(raw: &str) -> String {
    let s = raw.trim();
    s.strip_suffix(".0").unwrap_or(s).to_string()
}

fn cell(raw: Option<&str>) -> Option<String> {
    raw.map(normalize_cell).filter(|s| !s.is_empty())
}

/// Validate raw rows (header already removed) into entries.
///
/// `row` numbers in errors are 1-based data rows, so a header line is not counted.
pub fn entries_from_rows<'a, I>(rows: I) -> Result<Vec<Entry>, EntryError>
where
    I: IntoIterator<Item = [Option<&'a str>; 3]>,
{
    let mut out = Vec::new();
    for (idx, [a, b, c]) in rows.into_iter().enumerate() {
        let Some(local_id) = cell(a) else {
            break;
        };
        let row = idx + 1;
        let application_number = cell(b).ok_or_else(|| EntryError::MissingField {
            row,
            local_id: local_id.clone(),
            field: "application number",
        })?;
        let publication_number = cell(c).ok_or_else(|| EntryError::MissingField {
            row,
            local_id: local_id.clone(),
            field: "publication number",
        })?;
        out.push(Entry {
            local_id,
            application_number,
            publication_number,
        });
    }

    if out.is_empty() {
        return Err(EntryError::NoEntries);
    }
    info!(count = out.len(), "loaded entries");
    Ok(out)
}

/// Load entries from CSV. The first record is a header and is skipped;
/// columns beyond the third are ignored.
pub fn load_entries_csv<R: Read>(reader: R) -> Result<Vec<Entry>, EntryError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let mut records = Vec::new();
    for record in rdr.records() {
        records.push(record?);
    }

    entries_from_rows(
        records
            .iter()
            .map(|r| [r.get(0), r.get(1), r.get(2)]),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_cell_strips_float_suffix() {
        assert_eq!(normalize_cell("2024147578.0"), "2024147578");
        assert_eq!(normalize_cell(" 12 "), "12");
        assert_eq!(normalize_cell("1.05"), "1.05");
        assert_eq!(normalize_cell("A-7"), "A-7");
    }

    #[test]
    fn loads_csv_with_header() {
        let csv = "id,application,publication\n\
                   1.0,2024147578.0,2025012345.0\n\
                   2,2023000001,2024000002\n";
        let entries = load_entries_csv(csv.as_bytes()).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(
            entries[0],
            Entry {
                local_id: "1".into(),
                application_number: "2024147578".into(),
                publication_number: "2025012345".into(),
            }
        );
        assert_eq!(entries[1].key(), "2_2023000001");
    }

    #[test]
    fn empty_local_id_ends_table() {
        let csv = "id,application,publication\n\
                   1,2024147578,2025012345\n\
                   ,,\n\
                   3,2023000001,\n";
        let entries = load_entries_csv(csv.as_bytes()).unwrap();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn missing_application_number_is_fatal() {
        let csv = "id,application,publication\n\
                   1,2024147578,2025012345\n\
                   2,,2024000002\n";
        let err = load_entries_csv(csv.as_bytes()).unwrap_err();
        match err {
            EntryError::MissingField {
                row,
                local_id,
                field,
            } => {
                assert_eq!(row, 2);
                assert_eq!(local_id, "2");
                assert_eq!(field, "application number");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_publication_number_is_fatal() {
        let rows = vec![[Some("1"), Some("2024147578"), Some("  ")]];
        assert!(matches!(
            entries_from_rows(rows),
            Err(EntryError::MissingField {
                field: "publication number",
                ..
            })
        ));
    }

    #[test]
    fn short_row_counts_as_missing() {
        let csv = "id,application,publication\n7,2024147578\n";
        assert!(matches!(
            load_entries_csv(csv.as_bytes()),
            Err(EntryError::MissingField { .. })
        ));
    }

    #[test]
    fn header_only_has_no_entries() {
        let csv = "id,application,publication\n";
        assert!(matches!(
            load_entries_csv(csv.as_bytes()),
            Err(EntryError::NoEntries)
        ));
    }
}
