pub mod export_models;
pub mod export_ports;
pub mod export_service;

#[cfg(test)]
pub mod test_support;

pub use export_models::{ExportRequest, ExportResult, ExportSettings, OutputFormat, RetryPolicy};
pub use export_ports::{
    DocumentRenderer, DocumentStore, NewDocument, RenderError, SpreadsheetReader, StoredDocument,
};
pub use export_service::ExportService;
