use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

// ============================================================================
// REQUEST
// ============================================================================

/// What the caller gets back: a link to the stored document, or the bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum OutputFormat {
    /// Word-processing document kept in storage; the caller receives a link.
    #[default]
    Native,
    /// PDF bytes; the stored intermediate document is deleted afterwards.
    Pdf,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NATIVE" | "DOCS" => Ok(OutputFormat::Native),
            "PDF" => Ok(OutputFormat::Pdf),
            other => Err(format!("unknown output format: {other}")),
        }
    }
}

impl TryFrom<String> for OutputFormat {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Native => write!(f, "NATIVE"),
            OutputFormat::Pdf => write!(f, "PDF"),
        }
    }
}

/// Everything one export needs from the caller.
#[derive(Debug, Clone)]
pub struct ExportRequest {
    pub reference: String,
    pub sheet_tab: String,
    pub group_key_letter: String,
    pub exclusion_needle: String,
    pub excluded_columns: Vec<usize>,
    pub format: OutputFormat,
}

// ============================================================================
// RESULT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportResult {
    Link {
        document_id: String,
        url: String,
    },
    Bytes {
        content: Vec<u8>,
        filename: String,
        mime_type: &'static str,
        /// Id of the intermediate document when its cleanup failed.
        orphaned_document: Option<String>,
    },
}

// ============================================================================
// SETTINGS
// ============================================================================

/// How often a failed grid read is retried. Only reads are retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            backoff: Duration::from_millis(500),
        }
    }
}

/// Fixed text and naming used for every generated document.
#[derive(Debug, Clone)]
pub struct ExportSettings {
    pub title: String,
    pub body: String,
    pub document_prefix: String,
    pub retry: RetryPolicy,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            title: "PORTARIA N° XXXX/2026-GS/SEDUC".to_string(),
            body: "O(A) SECRETÁRIO(A) DE ESTADO DE EDUCAÇÃO DO PARÁ, no uso de suas atribuições..."
                .to_string(),
            document_prefix: "PORTARIA_GERADA".to_string(),
            retry: RetryPolicy::default(),
        }
    }
}

// ============================================================================
// RANGES
// ============================================================================

/// Quotes a tab name for A1 notation; embedded quotes are doubled.
fn quote_tab(sheet_tab: &str) -> String {
    format!("'{}'", sheet_tab.replace('\'', "''"))
}

/// Range covering every row of columns A to Z.
pub fn full_range(sheet_tab: &str) -> String {
    format!("{}!A:Z", quote_tab(sheet_tab))
}

/// Range covering only the header row (row 2) of columns A to Z.
pub fn header_range(sheet_tab: &str) -> String {
    format!("{}!A2:Z2", quote_tab(sheet_tab))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_parsing() {
        assert_eq!("PDF".parse::<OutputFormat>().unwrap(), OutputFormat::Pdf);
        assert_eq!("pdf".parse::<OutputFormat>().unwrap(), OutputFormat::Pdf);
        assert_eq!("DOCS".parse::<OutputFormat>().unwrap(), OutputFormat::Native);
        assert_eq!("native".parse::<OutputFormat>().unwrap(), OutputFormat::Native);
        assert!("html".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_output_format_from_json() {
        let format: OutputFormat = serde_json::from_str("\"Pdf\"").unwrap();
        assert_eq!(format, OutputFormat::Pdf);
        assert!(serde_json::from_str::<OutputFormat>("\"xls\"").is_err());
    }

    #[test]
    fn test_ranges_quote_tab_names() {
        assert_eq!(full_range("Base A"), "'Base A'!A:Z");
        assert_eq!(header_range("Base A"), "'Base A'!A2:Z2");
        assert_eq!(full_range("O'Neil"), "'O''Neil'!A:Z");
    }
}
