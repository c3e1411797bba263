// Sheet pipeline: reference → header → filter → groups.
//
// Pure functions over in-memory rows. No I/O happens in this module.

pub mod grouping;
pub mod header_resolver;
pub mod identifier;
pub mod row_filter;
pub mod sheet_models;

pub use grouping::{group_rows, GroupKeyColumn};
pub use header_resolver::{peek_header_preview, resolve_columns};
pub use identifier::extract_identifier;
pub use sheet_models::{ColumnSpec, GroupedRecords, HeaderPreview, RawGrid};
