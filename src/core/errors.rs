// Error types shared by the whole export pipeline.
//
// `UpstreamError` is what the collaborator traits (spreadsheet reader,
// document store) return. `ExportError` is what callers of the pipeline see.

use thiserror::Error;

// ============================================================================
// COLLABORATOR ERRORS
// ============================================================================

/// Failure reported by an external collaborator (Sheets, Drive, token endpoint).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UpstreamError {
    #[error("credentials unavailable: {0}")]
    Credentials(String),

    #[error("{service} request failed: {message}")]
    Transport {
        service: &'static str,
        message: String,
    },

    #[error("{service} returned HTTP {status}: {body}")]
    Status {
        service: &'static str,
        status: u16,
        body: String,
    },

    #[error("{service} sent an unreadable response: {message}")]
    Decode {
        service: &'static str,
        message: String,
    },
}

impl UpstreamError {
    /// Whether the same request may succeed if sent again.
    pub fn is_transient(&self) -> bool {
        match self {
            UpstreamError::Transport { .. } => true,
            UpstreamError::Status { status, .. } => *status == 429 || *status >= 500,
            UpstreamError::Credentials(_) | UpstreamError::Decode { .. } => false,
        }
    }
}

// ============================================================================
// PIPELINE ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("spreadsheet has no data: expected at least 2 rows, found {rows}")]
    InsufficientData { rows: usize },

    #[error("invalid group column {0:?}: expected a single letter A-Z")]
    InvalidGroupKey(String),

    #[error("group {group:?} has a row with {found} cells, expected {expected}")]
    ColumnCountMismatch {
        group: String,
        expected: usize,
        found: usize,
    },

    #[error("upstream service error: {0}")]
    Upstream(UpstreamError),

    #[error("format conversion failed: {0}")]
    Conversion(UpstreamError),

    #[error("could not render document: {0}")]
    Render(String),
}

impl From<UpstreamError> for ExportError {
    fn from(err: UpstreamError) -> Self {
        match err {
            UpstreamError::Credentials(msg) => ExportError::Configuration(msg),
            other => ExportError::Upstream(other),
        }
    }
}

impl ExportError {
    /// Errors caused by what the caller sent rather than by the service.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            ExportError::InsufficientData { .. } | ExportError::InvalidGroupKey(_)
        )
    }
}
