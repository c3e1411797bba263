// The export coordinator.
//
// Runs one export start to finish:
//   reference → grid → columns → groups → document → store → (convert → delete)
//
// This is the only piece that talks to collaborators. Both the HTTP handlers
// and the CLI call into it, so there is exactly one copy of the pipeline.

use std::collections::HashSet;

use super::export_models::{
    full_range, header_range, ExportRequest, ExportResult, ExportSettings, OutputFormat,
};
use super::export_ports::{DocumentRenderer, DocumentStore, NewDocument, SpreadsheetReader};
use crate::core::document::assemble;
use crate::core::errors::ExportError;
use crate::core::sheet::{
    extract_identifier, group_rows, peek_header_preview, resolve_columns, GroupKeyColumn,
    GroupedRecords, HeaderPreview, RawGrid,
};

/// How many characters of the last group name go into the document name.
const NAME_GROUP_CHARS: usize = 10;

const PDF_MIME: &str = "application/pdf";

pub struct ExportService<R, S, W>
where
    R: SpreadsheetReader,
    S: DocumentStore,
    W: DocumentRenderer,
{
    reader: R,
    store: S,
    renderer: W,
    settings: ExportSettings,
}

impl<R, S, W> ExportService<R, S, W>
where
    R: SpreadsheetReader,
    S: DocumentStore,
    W: DocumentRenderer,
{
    pub fn new(reader: R, store: S, renderer: W, settings: ExportSettings) -> Self {
        Self {
            reader,
            store,
            renderer,
            settings,
        }
    }

    /// Lists the header names a user can pick from before exporting.
    pub async fn list_columns(
        &self,
        reference: &str,
        sheet_tab: &str,
    ) -> Result<Vec<HeaderPreview>, ExportError> {
        let spreadsheet_id = extract_identifier(reference);
        let grid = self
            .read_with_retry(&spreadsheet_id, &header_range(sheet_tab))
            .await?;

        Ok(peek_header_preview(&grid))
    }

    /// Runs a full export. Either everything succeeds or an error is returned;
    /// there are no partial results.
    pub async fn export(&self, request: &ExportRequest) -> Result<ExportResult, ExportError> {
        let spreadsheet_id = extract_identifier(&request.reference);
        let grid = self
            .read_with_retry(&spreadsheet_id, &full_range(&request.sheet_tab))
            .await?;

        tracing::info!(
            spreadsheet_id = %spreadsheet_id,
            sheet_tab = %request.sheet_tab,
            rows = grid.len(),
            "Fetched sheet"
        );

        let excluded: HashSet<usize> = request.excluded_columns.iter().copied().collect();
        let columns = resolve_columns(&grid, &excluded)?;
        let group_key = GroupKeyColumn::from_letter(&request.group_key_letter)?;

        let groups = group_rows(
            grid.data_rows(),
            &columns,
            group_key,
            &request.exclusion_needle,
        );

        tracing::info!(
            columns = columns.len(),
            groups = groups.len(),
            records = groups.record_count(),
            group_key = %group_key,
            "Grouped rows"
        );

        let document = assemble(&groups, &columns, &self.settings.title, &self.settings.body)?;
        let content = self
            .renderer
            .render(&document)
            .map_err(|e| ExportError::Render(e.to_string()))?;

        let name = self.document_name(&groups);

        // Uploads are never retried: a blind retry could leave duplicates behind.
        let stored = self
            .store
            .create_from_bytes(NewDocument {
                name: name.clone(),
                content,
                mime_type: self.renderer.mime_type(),
            })
            .await?;

        tracing::info!(
            document_id = %stored.id,
            name = %name,
            format = %request.format,
            "Stored generated document"
        );

        match request.format {
            OutputFormat::Native => Ok(ExportResult::Link {
                document_id: stored.id,
                url: stored.link,
            }),
            OutputFormat::Pdf => {
                let mime_type = PDF_MIME;
                let converted = self.store.export_as(&stored.id, mime_type).await;
                let orphaned_document = self.discard(&stored.id).await;
                let content = converted.map_err(ExportError::Conversion)?;

                Ok(ExportResult::Bytes {
                    content,
                    filename: format!("{name}.pdf"),
                    mime_type,
                    orphaned_document,
                })
            }
        }
    }

    async fn read_with_retry(
        &self,
        spreadsheet_id: &str,
        range: &str,
    ) -> Result<RawGrid, ExportError> {
        let policy = self.settings.retry;
        let attempts = policy.attempts.max(1);
        let mut attempt = 1;

        loop {
            match self.reader.read_range(spreadsheet_id, range).await {
                Ok(grid) => return Ok(grid),
                Err(err) if err.is_transient() && attempt < attempts => {
                    tracing::warn!(attempt, attempts, error = %err, "Sheet read failed, retrying");
                    tokio::time::sleep(policy.backoff * attempt).await;
                    attempt += 1;
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Deletes an intermediate document. Failure does not fail the export;
    /// the id of the orphaned document is logged and returned instead.
    async fn discard(&self, document_id: &str) -> Option<String> {
        match self.store.delete(document_id).await {
            Ok(()) => None,
            Err(err) => {
                tracing::warn!(
                    document_id,
                    error = %err,
                    "Could not delete intermediate document; it is left orphaned in storage"
                );
                Some(document_id.to_string())
            }
        }
    }

    fn document_name(&self, groups: &GroupedRecords) -> String {
        let prefix = &self.settings.document_prefix;
        match groups.last() {
            Some(group) => {
                let short: String = group.name.chars().take(NAME_GROUP_CHARS).collect();
                format!("{prefix}_{short}")
            }
            None => prefix.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::errors::UpstreamError;
    use crate::core::export::export_models::RetryPolicy;
    use crate::core::export::test_support::{sample_grid, FakeSheets, FakeStore, TextRenderer};
    use std::time::Duration;

    fn settings() -> ExportSettings {
        ExportSettings {
            title: "PORTARIA".to_string(),
            body: "Preambulo".to_string(),
            document_prefix: "PORTARIA_GERADA".to_string(),
            retry: RetryPolicy {
                attempts: 3,
                backoff: Duration::ZERO,
            },
        }
    }

    fn request(format: OutputFormat) -> ExportRequest {
        ExportRequest {
            reference: "https://docs.google.com/spreadsheets/d/sheet-1/edit".to_string(),
            sheet_tab: "Base".to_string(),
            group_key_letter: "b".to_string(),
            exclusion_needle: "suspenso".to_string(),
            excluded_columns: vec![],
            format,
        }
    }

    fn service(
        sheets: FakeSheets,
        store: FakeStore,
    ) -> ExportService<FakeSheets, FakeStore, TextRenderer> {
        ExportService::new(sheets, store, TextRenderer, settings())
    }

    #[tokio::test]
    async fn test_native_export_returns_link() {
        let svc = service(FakeSheets::with_grid(sample_grid()), FakeStore::new());

        let result = svc.export(&request(OutputFormat::Native)).await.unwrap();

        match result {
            ExportResult::Link { url, document_id } => {
                assert_eq!(document_id, "doc-1");
                assert_eq!(url, "https://store.test/doc-1");
            }
            other => panic!("expected link, got {other:?}"),
        }

        let created = svc.store.created();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].name, "PORTARIA_GERADA_EMEF B");
        assert!(svc.store.deleted().is_empty());
        assert_eq!(
            svc.reader.ranges(),
            vec![("sheet-1".to_string(), "'Base'!A:Z".to_string())]
        );
    }

    #[tokio::test]
    async fn test_rendered_document_reflects_pipeline() {
        let svc = service(FakeSheets::with_grid(sample_grid()), FakeStore::new());
        svc.export(&request(OutputFormat::Native)).await.unwrap();

        let text = String::from_utf8(svc.store.created()[0].content.clone()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "PORTARIA",
                "Preambulo",
                "ANEXO - EMEF A",
                "Nome|Escola",
                "Ana|EMEF A",
                "Caio|EMEF A",
                "ANEXO - EMEF B",
                "Nome|Escola",
                "Beto|EMEF B",
            ]
        );
    }

    #[tokio::test]
    async fn test_pdf_export_returns_bytes_and_cleans_up() {
        let svc = service(FakeSheets::with_grid(sample_grid()), FakeStore::new());

        let result = svc.export(&request(OutputFormat::Pdf)).await.unwrap();

        match result {
            ExportResult::Bytes {
                content,
                filename,
                mime_type,
                orphaned_document,
            } => {
                assert_eq!(content, b"%PDF-fake doc-1".to_vec());
                assert_eq!(filename, "PORTARIA_GERADA_EMEF B.pdf");
                assert_eq!(mime_type, "application/pdf");
                assert_eq!(orphaned_document, None);
            }
            other => panic!("expected bytes, got {other:?}"),
        }
        assert_eq!(svc.store.deleted(), vec!["doc-1".to_string()]);
    }

    #[tokio::test]
    async fn test_failed_cleanup_is_reported_not_raised() {
        let store = FakeStore::new().failing_delete();
        let svc = service(FakeSheets::with_grid(sample_grid()), store);

        let result = svc.export(&request(OutputFormat::Pdf)).await.unwrap();

        assert!(matches!(
            result,
            ExportResult::Bytes { orphaned_document: Some(ref id), .. } if id == "doc-1"
        ));
    }

    #[tokio::test]
    async fn test_failed_conversion_surfaces_conversion_error() {
        let store = FakeStore::new().failing_export();
        let svc = service(FakeSheets::with_grid(sample_grid()), store);

        let err = svc.export(&request(OutputFormat::Pdf)).await.unwrap_err();

        assert!(matches!(err, ExportError::Conversion(_)));
        assert_eq!(svc.store.created().len(), 1);
        assert_eq!(svc.store.deleted(), vec!["doc-1".to_string()]);
    }

    #[tokio::test]
    async fn test_short_sheet_fails_before_storing() {
        let grid = RawGrid::new(vec![vec!["Titulo".to_string()]]);
        let svc = service(FakeSheets::with_grid(grid), FakeStore::new());

        let err = svc.export(&request(OutputFormat::Native)).await.unwrap_err();

        assert!(matches!(err, ExportError::InsufficientData { rows: 1 }));
        assert!(svc.store.created().is_empty());
    }

    #[tokio::test]
    async fn test_bad_group_letter_fails_before_storing() {
        let svc = service(FakeSheets::with_grid(sample_grid()), FakeStore::new());
        let mut req = request(OutputFormat::Native);
        req.group_key_letter = "BB".to_string();

        let err = svc.export(&req).await.unwrap_err();

        assert!(matches!(err, ExportError::InvalidGroupKey(_)));
        assert!(svc.store.created().is_empty());
    }

    #[tokio::test]
    async fn test_transient_read_failures_are_retried() {
        let transient = UpstreamError::Status {
            service: "sheets",
            status: 503,
            body: "unavailable".to_string(),
        };
        let sheets = FakeSheets::with_grid(sample_grid()).failing_first(vec![transient.clone(), transient]);
        let svc = service(sheets, FakeStore::new());

        svc.export(&request(OutputFormat::Native)).await.unwrap();

        assert_eq!(svc.reader.ranges().len(), 3);
    }

    #[tokio::test]
    async fn test_retries_stop_after_policy_attempts() {
        let transient = UpstreamError::Transport {
            service: "sheets",
            message: "reset".to_string(),
        };
        let sheets = FakeSheets::with_grid(sample_grid()).failing_first(vec![transient; 5]);
        let svc = service(sheets, FakeStore::new());

        let err = svc.export(&request(OutputFormat::Native)).await.unwrap_err();

        assert!(matches!(err, ExportError::Upstream(_)));
        assert_eq!(svc.reader.ranges().len(), 3);
    }

    #[tokio::test]
    async fn test_permanent_read_failures_are_not_retried() {
        let denied = UpstreamError::Status {
            service: "sheets",
            status: 403,
            body: "forbidden".to_string(),
        };
        let sheets = FakeSheets::with_grid(sample_grid()).failing_first(vec![denied]);
        let svc = service(sheets, FakeStore::new());

        let err = svc.export(&request(OutputFormat::Native)).await.unwrap_err();

        assert!(matches!(err, ExportError::Upstream(_)));
        assert_eq!(svc.reader.ranges().len(), 1);
    }

    #[tokio::test]
    async fn test_credential_failure_is_a_configuration_error() {
        let sheets = FakeSheets::with_grid(sample_grid())
            .failing_first(vec![UpstreamError::Credentials("no key".to_string())]);
        let svc = service(sheets, FakeStore::new());

        let err = svc.export(&request(OutputFormat::Native)).await.unwrap_err();

        assert!(matches!(err, ExportError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_upload_failure_is_not_retried() {
        let store = FakeStore::new().failing_create();
        let svc = service(FakeSheets::with_grid(sample_grid()), store);

        let err = svc.export(&request(OutputFormat::Native)).await.unwrap_err();

        assert!(matches!(err, ExportError::Upstream(_)));
        assert_eq!(svc.store.create_attempts(), 1);
    }

    #[tokio::test]
    async fn test_everything_filtered_still_produces_document() {
        let svc = service(FakeSheets::with_grid(sample_grid()), FakeStore::new());
        let mut req = request(OutputFormat::Native);
        req.exclusion_needle = "emef".to_string();

        svc.export(&req).await.unwrap();

        assert_eq!(svc.store.created()[0].name, "PORTARIA_GERADA");
    }

    #[tokio::test]
    async fn test_list_columns_reads_header_row_only() {
        let header = RawGrid::new(vec![vec![
            "OBS".to_string(),
            "".to_string(),
            " Nome ".to_string(),
        ]]);
        let svc = service(FakeSheets::with_grid(header), FakeStore::new());

        let columns = svc.list_columns("sheet-1", "Base").await.unwrap();

        assert_eq!(
            columns,
            vec![
                HeaderPreview {
                    index: 0,
                    name: "OBS".to_string()
                },
                HeaderPreview {
                    index: 2,
                    name: "Nome".to_string()
                },
            ]
        );
        assert_eq!(svc.reader.ranges()[0].1, "'Base'!A2:Z2");
    }

    #[test]
    fn test_document_name_truncates_by_characters() {
        let svc = service(FakeSheets::with_grid(RawGrid::default()), FakeStore::new());
        let mut groups = GroupedRecords::new();
        groups.push("A", Default::default());
        groups.push("ESCOLA ESTADUAL SÃO JOSÉ", Default::default());

        assert_eq!(svc.document_name(&groups), "PORTARIA_GERADA_ESCOLA EST");
    }
}
