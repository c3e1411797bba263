// Splits data rows into per-group record lists.
//
// Each group later becomes one "ANEXO" section of the document, so group
// order and row order inside a group must match the sheet.

use std::fmt;
use std::str::FromStr;

use super::row_filter::should_exclude;
use super::sheet_models::{ColumnSpec, GroupedRecords, Record, FALLBACK_GROUP};
use crate::core::errors::ExportError;

/// The column whose value names a row's group, addressed by letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupKeyColumn(usize);

impl GroupKeyColumn {
    /// Parses a column letter (`"A"` → 0, `"c"` → 2). Surrounding whitespace
    /// is ignored; anything other than one ASCII letter is rejected.
    pub fn from_letter(letter: &str) -> Result<Self, ExportError> {
        let mut chars = letter.trim().chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if c.is_ascii_alphabetic() => {
                Ok(Self((c.to_ascii_uppercase() as u8 - b'A') as usize))
            }
            _ => Err(ExportError::InvalidGroupKey(letter.to_string())),
        }
    }

    pub fn index(self) -> usize {
        self.0
    }
}

impl FromStr for GroupKeyColumn {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_letter(s)
    }
}

impl fmt::Display for GroupKeyColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", (b'A' + self.0 as u8) as char)
    }
}

/// Projects a data row onto the kept columns by their source index.
/// Missing cells become empty text; every value is trimmed.
pub fn project_record(row: &[String], columns: &[ColumnSpec]) -> Record {
    columns
        .iter()
        .map(|column| {
            row.get(column.source_index)
                .map(|cell| cell.trim())
                .unwrap_or_default()
        })
        .collect()
}

/// Groups data rows by the value in `group_key`'s column.
///
/// Rows with no cells and rows matching `exclusion_needle` are skipped. A row
/// too short to reach the key column lands in the `GERAL` group.
pub fn group_rows(
    data_rows: &[Vec<String>],
    columns: &[ColumnSpec],
    group_key: GroupKeyColumn,
    exclusion_needle: &str,
) -> GroupedRecords {
    let mut groups = GroupedRecords::new();

    for row in data_rows {
        if row.is_empty() || should_exclude(row, exclusion_needle) {
            continue;
        }

        let group = row
            .get(group_key.index())
            .map(|cell| cell.trim())
            .unwrap_or(FALLBACK_GROUP);

        groups.push(group, project_record(row, columns));
    }

    groups
}
