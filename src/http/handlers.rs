// Request handlers. Each one deserializes the body, calls the export
// service and shapes the result.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::header::{HeaderValue, CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use super::api_error::{ApiError, LegacyApiError};
use crate::core::export::{
    DocumentRenderer, DocumentStore, ExportRequest, ExportResult, ExportService, OutputFormat,
    SpreadsheetReader,
};
use crate::core::sheet::HeaderPreview;

/// Set when the intermediate document of a PDF export could not be deleted.
pub const ORPHANED_DOCUMENT_HEADER: &str = "x-orphaned-document";

// ============================================================================
// BODIES
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnsBody {
    #[serde(alias = "link")]
    pub reference: String,
    #[serde(alias = "aba")]
    pub sheet_tab: String,
}

#[derive(Debug, Serialize)]
pub struct ColumnsResponse {
    pub columns: Vec<HeaderPreview>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportBody {
    #[serde(alias = "link")]
    pub reference: String,
    #[serde(alias = "aba")]
    pub sheet_tab: String,
    #[serde(default = "default_group_key", alias = "letra_escola")]
    pub group_key_letter: String,
    #[serde(default, alias = "filtro_exclusao")]
    pub exclusion_needle: String,
    #[serde(default, alias = "indices_excluir")]
    pub excluded_column_indices: Vec<usize>,
    #[serde(default, alias = "formato")]
    pub output_format: OutputFormat,
}

fn default_group_key() -> String {
    "A".to_string()
}

impl From<ExportBody> for ExportRequest {
    fn from(body: ExportBody) -> Self {
        ExportRequest {
            reference: body.reference,
            sheet_tab: body.sheet_tab,
            group_key_letter: body.group_key_letter,
            exclusion_needle: body.exclusion_needle,
            excluded_columns: body.excluded_column_indices,
            format: body.output_format,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkResponse {
    pub status: &'static str,
    pub link: String,
    pub document_id: String,
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

// ============================================================================
// HANDLERS
// ============================================================================

/// `GET /health`
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// `POST /columns`: header names for the column picker.
pub async fn columns<R, S, W>(
    State(service): State<Arc<ExportService<R, S, W>>>,
    body: Result<Json<ColumnsBody>, JsonRejection>,
) -> Result<Json<ColumnsResponse>, ApiError>
where
    R: SpreadsheetReader,
    S: DocumentStore,
    W: DocumentRenderer,
{
    let Json(body) = body?;
    let columns = service
        .list_columns(&body.reference, &body.sheet_tab)
        .await?;

    Ok(Json(ColumnsResponse { columns }))
}

/// `POST /export`: JSON with a link for NATIVE, a file download for PDF.
pub async fn export<R, S, W>(
    State(service): State<Arc<ExportService<R, S, W>>>,
    body: Result<Json<ExportBody>, JsonRejection>,
) -> Result<Response, ApiError>
where
    R: SpreadsheetReader,
    S: DocumentStore,
    W: DocumentRenderer,
{
    let Json(body) = body?;
    let request = ExportRequest::from(body);

    match service.export(&request).await? {
        ExportResult::Link { document_id, url } => Ok(Json(LinkResponse {
            status: "success",
            link: url,
            document_id,
            message: "Documento gerado com sucesso",
        })
        .into_response()),
        ExportResult::Bytes {
            content,
            filename,
            mime_type,
            orphaned_document,
        } => Ok(attachment_response(
            content,
            &filename,
            mime_type,
            orphaned_document,
        )),
    }
}

// ============================================================================
// LEGACY FRONT-END
// ============================================================================
//
// `/api/obter_colunas` and `/api/processar` accept the same bodies as the
// routes above but answer in the shapes the original front-end reads:
// a bare `[{id, nome}]` array, `{status: "sucesso", link, mensagem}` and
// `{erro}` on failure. PDF downloads are identical.

#[derive(Debug, Serialize)]
pub struct LegacyColumn {
    pub id: usize,
    pub nome: String,
}

#[derive(Debug, Serialize)]
pub struct LegacyLinkResponse {
    pub status: &'static str,
    pub link: String,
    pub mensagem: String,
}

/// `POST /api/obter_colunas`
pub async fn legacy_columns<R, S, W>(
    State(service): State<Arc<ExportService<R, S, W>>>,
    body: Result<Json<ColumnsBody>, JsonRejection>,
) -> Result<Json<Vec<LegacyColumn>>, LegacyApiError>
where
    R: SpreadsheetReader,
    S: DocumentStore,
    W: DocumentRenderer,
{
    let Json(body) = body?;
    let columns = service
        .list_columns(&body.reference, &body.sheet_tab)
        .await?;

    Ok(Json(
        columns
            .into_iter()
            .map(|column| LegacyColumn {
                id: column.index,
                nome: column.name,
            })
            .collect(),
    ))
}

/// `POST /api/processar`
pub async fn legacy_export<R, S, W>(
    State(service): State<Arc<ExportService<R, S, W>>>,
    body: Result<Json<ExportBody>, JsonRejection>,
) -> Result<Response, LegacyApiError>
where
    R: SpreadsheetReader,
    S: DocumentStore,
    W: DocumentRenderer,
{
    let Json(body) = body?;
    let request = ExportRequest::from(body);

    match service.export(&request).await? {
        ExportResult::Link { document_id, url } => Ok(Json(LegacyLinkResponse {
            status: "sucesso",
            link: url,
            mensagem: format!("✅ Google Docs criado! ID: {document_id}"),
        })
        .into_response()),
        ExportResult::Bytes {
            content,
            filename,
            mime_type,
            orphaned_document,
        } => Ok(attachment_response(
            content,
            &filename,
            mime_type,
            orphaned_document,
        )),
    }
}

// ============================================================================
// HELPERS
// ============================================================================

fn attachment_response(
    content: Vec<u8>,
    filename: &str,
    mime_type: &'static str,
    orphaned_document: Option<String>,
) -> Response {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(mime_type));
    headers.insert(CONTENT_DISPOSITION, attachment_disposition(filename));
    if let Some(id) = orphaned_document.and_then(|id| HeaderValue::from_str(&id).ok()) {
        headers.insert(ORPHANED_DOCUMENT_HEADER, id);
    }

    (headers, content).into_response()
}

/// `attachment; filename="<ascii>"; filename*=UTF-8''<percent-encoded>`.
///
/// Group names often carry accents, which are not valid in a plain header
/// value, so the ASCII form replaces them with `_`.
fn attachment_disposition(filename: &str) -> HeaderValue {
    let ascii: String = filename
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_ascii() && !c.is_ascii_control() => c,
            _ => '_',
        })
        .collect();

    let value = format!(
        "attachment; filename=\"{ascii}\"; filename*=UTF-8''{}",
        percent_encode(filename)
    );
    HeaderValue::from_str(&value).unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}

fn percent_encode(value: &str) -> String {
    let mut encoded = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                encoded.push(byte as char)
            }
            _ => encoded.push_str(&format!("%{byte:02X}")),
        }
    }
    encoded
}
