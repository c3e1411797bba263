// Format-independent document structure.
//
// The assembler builds this; a `DocumentRenderer` in the infra layer turns
// it into bytes (.docx today).

/// Prefix of every group heading.
pub const SECTION_HEADING_PREFIX: &str = "ANEXO - ";

/// The static opening of the document: a centered title and a justified body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleBlock {
    pub title: String,
    pub body: String,
}

/// A table whose first row holds the column labels.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn column_count(&self) -> usize {
        self.header.len()
    }
}

/// One group of the export: heading plus its table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub group: String,
    pub table: Table,
}

impl Section {
    pub fn heading(&self) -> String {
        format!("{SECTION_HEADING_PREFIX}{}", self.group)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledDocument {
    pub title_block: TitleBlock,
    pub sections: Vec<Section>,
}
