// In-memory collaborators for exercising the pipeline without Google.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use super::export_ports::{
    DocumentRenderer, DocumentStore, NewDocument, RenderError, SpreadsheetReader, StoredDocument,
};
use crate::core::document::AssembledDocument;
use crate::core::errors::UpstreamError;
use crate::core::sheet::RawGrid;

fn strings(cells: &[&str]) -> Vec<String> {
    cells.iter().map(|c| c.to_string()).collect()
}

/// Two schools, one suspended row, one blank row.
pub fn sample_grid() -> RawGrid {
    RawGrid::new(vec![
        strings(&["Lotação 2026"]),
        strings(&["Nome", "Escola", ""]),
        strings(&["Ana", "EMEF A"]),
        strings(&["Beto", "EMEF B"]),
        vec![],
        strings(&["Caio", "EMEF A"]),
        strings(&["Davi", "EMEF A", "Suspenso"]),
    ])
}

// ============================================================================
// SPREADSHEET
// ============================================================================

pub struct FakeSheets {
    grid: RawGrid,
    failures: Mutex<VecDeque<UpstreamError>>,
    ranges: Mutex<Vec<(String, String)>>,
}

impl FakeSheets {
    pub fn with_grid(grid: RawGrid) -> Self {
        Self {
            grid,
            failures: Mutex::new(VecDeque::new()),
            ranges: Mutex::new(Vec::new()),
        }
    }

    /// The next reads fail with these errors, in order, before succeeding.
    pub fn failing_first(self, failures: Vec<UpstreamError>) -> Self {
        *self.failures.lock().unwrap() = failures.into();
        self
    }

    /// Every `(spreadsheet_id, range)` read so far, including failed ones.
    pub fn ranges(&self) -> Vec<(String, String)> {
        self.ranges.lock().unwrap().clone()
    }
}

#[async_trait]
impl SpreadsheetReader for FakeSheets {
    async fn read_range(
        &self,
        spreadsheet_id: &str,
        range: &str,
    ) -> Result<RawGrid, UpstreamError> {
        self.ranges
            .lock()
            .unwrap()
            .push((spreadsheet_id.to_string(), range.to_string()));

        match self.failures.lock().unwrap().pop_front() {
            Some(err) => Err(err),
            None => Ok(self.grid.clone()),
        }
    }
}

// ============================================================================
// STORAGE
// ============================================================================

#[derive(Default)]
pub struct FakeStore {
    created: Mutex<Vec<NewDocument>>,
    deleted: Mutex<Vec<String>>,
    create_attempts: Mutex<usize>,
    fail_create: bool,
    fail_export: bool,
    fail_delete: bool,
}

impl FakeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_create(mut self) -> Self {
        self.fail_create = true;
        self
    }

    pub fn failing_export(mut self) -> Self {
        self.fail_export = true;
        self
    }

    pub fn failing_delete(mut self) -> Self {
        self.fail_delete = true;
        self
    }

    pub fn created(&self) -> Vec<NewDocument> {
        self.created.lock().unwrap().clone()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }

    pub fn create_attempts(&self) -> usize {
        *self.create_attempts.lock().unwrap()
    }

    fn unavailable() -> UpstreamError {
        UpstreamError::Status {
            service: "store",
            status: 503,
            body: "unavailable".to_string(),
        }
    }
}

#[async_trait]
impl DocumentStore for FakeStore {
    async fn create_from_bytes(
        &self,
        document: NewDocument,
    ) -> Result<StoredDocument, UpstreamError> {
        *self.create_attempts.lock().unwrap() += 1;
        if self.fail_create {
            return Err(Self::unavailable());
        }

        let mut created = self.created.lock().unwrap();
        created.push(document);
        let id = format!("doc-{}", created.len());
        Ok(StoredDocument {
            link: format!("https://store.test/{id}"),
            id,
        })
    }

    async fn export_as(&self, document_id: &str, _mime_type: &str) -> Result<Vec<u8>, UpstreamError> {
        if self.fail_export {
            return Err(Self::unavailable());
        }
        Ok(format!("%PDF-fake {document_id}").into_bytes())
    }

    async fn delete(&self, document_id: &str) -> Result<(), UpstreamError> {
        self.deleted.lock().unwrap().push(document_id.to_string());
        if self.fail_delete {
            return Err(Self::unavailable());
        }
        Ok(())
    }
}

// ============================================================================
// RENDERER
// ============================================================================

/// Renders one line per paragraph and per table row, cells joined by `|`.
pub struct TextRenderer;

impl DocumentRenderer for TextRenderer {
    fn mime_type(&self) -> &'static str {
        "text/plain"
    }

    fn render(&self, document: &AssembledDocument) -> Result<Vec<u8>, RenderError> {
        let mut lines = vec![
            document.title_block.title.clone(),
            document.title_block.body.clone(),
        ];
        for section in &document.sections {
            lines.push(section.heading());
            lines.push(section.table.header.join("|"));
            lines.extend(section.table.rows.iter().map(|row| row.join("|")));
        }
        Ok(lines.join("\n").into_bytes())
    }
}
