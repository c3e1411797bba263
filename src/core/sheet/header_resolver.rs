// Header handling: decides which grid columns end up in the document.

use std::collections::HashSet;

use super::sheet_models::{ColumnSpec, HeaderPreview, RawGrid};
use crate::core::errors::ExportError;

/// Fails unless the grid holds at least a reserved row and a header row.
pub fn ensure_has_header(grid: &RawGrid) -> Result<&[String], ExportError> {
    grid.header_row()
        .ok_or(ExportError::InsufficientData { rows: grid.len() })
}

/// Resolves the kept columns from the header row (grid row 1).
///
/// A column is kept when its index is not in `excluded` and its trimmed
/// header text is non-empty. Output is in left-to-right order; duplicate
/// labels are kept as-is.
pub fn resolve_columns(
    grid: &RawGrid,
    excluded: &HashSet<usize>,
) -> Result<Vec<ColumnSpec>, ExportError> {
    let header = ensure_has_header(grid)?;

    Ok(header
        .iter()
        .enumerate()
        .filter(|(index, _)| !excluded.contains(index))
        .filter_map(|(index, cell)| {
            let label = cell.trim();
            (!label.is_empty()).then(|| ColumnSpec::new(index, label))
        })
        .collect())
}

/// Lists the non-blank header names of a single-row header read.
///
/// Used by the column picker before an export, so no exclusions apply here.
pub fn peek_header_preview(grid: &RawGrid) -> Vec<HeaderPreview> {
    let Some(header) = grid.row(0) else {
        return Vec::new();
    };

    header
        .iter()
        .enumerate()
        .filter_map(|(index, cell)| {
            let name = cell.trim();
            (!name.is_empty()).then(|| HeaderPreview {
                index,
                name: name.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(rows: &[&[&str]]) -> RawGrid {
        rows.iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect::<Vec<Vec<String>>>()
            .into()
    }

    #[test]
    fn test_blank_header_columns_are_dropped() {
        let g = grid(&[&[], &["", "Nome", "Escola"]]);
        let columns = resolve_columns(&g, &HashSet::new()).unwrap();
        assert_eq!(
            columns,
            vec![ColumnSpec::new(1, "Nome"), ColumnSpec::new(2, "Escola")]
        );
    }

    #[test]
    fn test_excluded_indices_keep_original_positions() {
        let g = grid(&[&[], &["OBS", " INEP ", "Nome", "  ", "Cargo"]]);
        let excluded: HashSet<usize> = [0, 2].into_iter().collect();
        let columns = resolve_columns(&g, &excluded).unwrap();

        assert_eq!(
            columns,
            vec![ColumnSpec::new(1, "INEP"), ColumnSpec::new(4, "Cargo")]
        );
    }

    #[test]
    fn test_resolved_indices_are_increasing_and_valid() {
        let g = grid(&[&[], &["a", "", "b", "c", " ", "d", "e"]]);
        let excluded: HashSet<usize> = [3].into_iter().collect();
        let columns = resolve_columns(&g, &excluded).unwrap();

        assert!(columns
            .windows(2)
            .all(|pair| pair[0].source_index < pair[1].source_index));
        for column in &columns {
            assert!(!excluded.contains(&column.source_index));
            assert!(!g.header_row().unwrap()[column.source_index].trim().is_empty());
        }
    }

    #[test]
    fn test_duplicate_labels_are_not_merged() {
        let g = grid(&[&[], &["Nome", "Nome"]]);
        let columns = resolve_columns(&g, &HashSet::new()).unwrap();
        assert_eq!(columns.len(), 2);
    }

    #[test]
    fn test_fewer_than_two_rows_is_insufficient() {
        let g = grid(&[&["only row"]]);
        let err = resolve_columns(&g, &HashSet::new()).unwrap_err();
        assert!(matches!(err, ExportError::InsufficientData { rows: 1 }));

        let err = resolve_columns(&RawGrid::default(), &HashSet::new()).unwrap_err();
        assert!(matches!(err, ExportError::InsufficientData { rows: 0 }));
    }

    #[test]
    fn test_preview_lists_non_blank_names() {
        let g = grid(&[&["OBS", "", " INEP "]]);
        let preview = peek_header_preview(&g);
        assert_eq!(
            preview,
            vec![
                HeaderPreview {
                    index: 0,
                    name: "OBS".to_string()
                },
                HeaderPreview {
                    index: 2,
                    name: "INEP".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_preview_of_empty_grid() {
        assert!(peek_header_preview(&RawGrid::default()).is_empty());
    }
}
