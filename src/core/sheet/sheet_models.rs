// Plain data types for the sheet-to-records pipeline.
//
// Nothing in here knows where the grid came from. The infra layer turns a
// Google Sheets response into a `RawGrid`; everything after that works on
// these types only.

use std::collections::HashMap;

use serde::Serialize;

/// Group name used when a row is too short to reach the group key column.
pub const FALLBACK_GROUP: &str = "GERAL";

/// Index of the header row inside a full-range grid. Row 0 is left unused.
pub const HEADER_ROW: usize = 1;

/// First data row inside a full-range grid.
pub const FIRST_DATA_ROW: usize = 2;

// ============================================================================
// RAW GRID
// ============================================================================

/// Rows of text cells exactly as the spreadsheet returned them.
///
/// Rows are ragged: a row may be shorter than the header, and missing cells
/// read as empty text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawGrid {
    rows: Vec<Vec<String>>,
}

impl RawGrid {
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, index: usize) -> Option<&[String]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    /// The header row of a full-range read (second row), if present.
    pub fn header_row(&self) -> Option<&[String]> {
        self.row(HEADER_ROW)
    }

    /// Everything after the header row.
    pub fn data_rows(&self) -> &[Vec<String>] {
        self.rows.get(FIRST_DATA_ROW..).unwrap_or(&[])
    }
}

impl From<Vec<Vec<String>>> for RawGrid {
    fn from(rows: Vec<Vec<String>>) -> Self {
        Self::new(rows)
    }
}

// ============================================================================
// COLUMNS
// ============================================================================

/// A kept column: where it lives in the grid and what the header calls it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    /// Position in the original grid, not in the filtered column list.
    pub source_index: usize,
    pub label: String,
}

impl ColumnSpec {
    pub fn new(source_index: usize, label: impl Into<String>) -> Self {
        Self {
            source_index,
            label: label.into(),
        }
    }
}

/// One entry of the column picker shown before an export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeaderPreview {
    pub index: usize,
    pub name: String,
}

// ============================================================================
// RECORDS & GROUPS
// ============================================================================

/// A data row projected onto the kept columns, one trimmed value per column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    values: Vec<String>,
}

impl Record {
    pub fn new(values: Vec<String>) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for Record {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(Into::into).collect())
    }
}

/// All records of one group, in original row order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub name: String,
    pub records: Vec<Record>,
}

/// Records partitioned by group name.
///
/// Iteration follows first-seen group order: the first data row that names a
/// group fixes that group's position.
#[derive(Debug, Clone, Default)]
pub struct GroupedRecords {
    groups: Vec<Group>,
    positions: HashMap<String, usize>,
}

impl GroupedRecords {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a record to `group`, creating the group at the end if unseen.
    pub fn push(&mut self, group: &str, record: Record) {
        match self.positions.get(group) {
            Some(&position) => self.groups[position].records.push(record),
            None => {
                self.positions.insert(group.to_string(), self.groups.len());
                self.groups.push(Group {
                    name: group.to_string(),
                    records: vec![record],
                });
            }
        }
    }

    pub fn get(&self, group: &str) -> Option<&Group> {
        self.positions.get(group).map(|&position| &self.groups[position])
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Group> {
        self.groups.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.groups.iter().map(|g| g.name.as_str()).collect()
    }

    pub fn last(&self) -> Option<&Group> {
        self.groups.last()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Total number of records across every group.
    pub fn record_count(&self) -> usize {
        self.groups.iter().map(|g| g.records.len()).sum()
    }
}

impl<'a> IntoIterator for &'a GroupedRecords {
    type Item = &'a Group;
    type IntoIter = std::slice::Iter<'a, Group>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
