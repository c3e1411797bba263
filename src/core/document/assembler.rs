use super::document_models::{AssembledDocument, Section, Table, TitleBlock};
use crate::core::errors::ExportError;
use crate::core::sheet::{ColumnSpec, GroupedRecords};

/// Builds the document: title block, then one section per group in group order.
///
/// Every record must have exactly one value per column; a ragged record
/// fails with `ColumnCountMismatch` instead of producing a misaligned table.
pub fn assemble(
    groups: &GroupedRecords,
    columns: &[ColumnSpec],
    title: &str,
    body: &str,
) -> Result<AssembledDocument, ExportError> {
    let header: Vec<String> = columns.iter().map(|c| c.label.clone()).collect();

    let sections = groups
        .iter()
        .map(|group| {
            let rows = group
                .records
                .iter()
                .map(|record| {
                    if record.len() != header.len() {
                        return Err(ExportError::ColumnCountMismatch {
                            group: group.name.clone(),
                            expected: header.len(),
                            found: record.len(),
                        });
                    }
                    Ok(record.values().to_vec())
                })
                .collect::<Result<Vec<_>, _>>()?;

            Ok(Section {
                group: group.name.clone(),
                table: Table {
                    header: header.clone(),
                    rows,
                },
            })
        })
        .collect::<Result<Vec<_>, ExportError>>()?;

    Ok(AssembledDocument {
        title_block: TitleBlock {
            title: title.to_string(),
            body: body.to_string(),
        },
        sections,
    })
}
