// Collaborator traits the export pipeline depends on.
//
// The core defines WHAT it needs from the outside world; the infra layer
// provides Google-backed implementations and the tests provide fakes.

use async_trait::async_trait;
use thiserror::Error;

use crate::core::document::AssembledDocument;
use crate::core::errors::UpstreamError;
use crate::core::sheet::RawGrid;

/// Reads a rectangular range of cells as text.
#[async_trait]
pub trait SpreadsheetReader: Send + Sync {
    /// `range` is in A1 notation, e.g. `'Base A'!A:Z`.
    async fn read_range(&self, spreadsheet_id: &str, range: &str)
        -> Result<RawGrid, UpstreamError>;
}

/// A rendered document waiting to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDocument {
    pub name: String,
    pub content: Vec<u8>,
    pub mime_type: &'static str,
}

/// Handle to a document the store accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredDocument {
    pub id: String,
    pub link: String,
}

/// Where generated documents live.
///
/// Uploads are converted into the store's own word-processing format, which
/// is what `export_as` converts from.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn create_from_bytes(&self, document: NewDocument)
        -> Result<StoredDocument, UpstreamError>;

    async fn export_as(&self, document_id: &str, mime_type: &str)
        -> Result<Vec<u8>, UpstreamError>;

    async fn delete(&self, document_id: &str) -> Result<(), UpstreamError>;
}

#[derive(Debug, Error)]
#[error("{0}")]
pub struct RenderError(pub String);

/// Serializes an assembled document into a file format.
pub trait DocumentRenderer: Send + Sync {
    fn mime_type(&self) -> &'static str;

    fn render(&self, document: &AssembledDocument) -> Result<Vec<u8>, RenderError>;
}
