// Command-line interface.
//
// `serve` runs the HTTP API (the default); `columns` and `export` call the
// pipeline once and print the result, which is handy for scripting.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::core::export::{
    DocumentRenderer, DocumentStore, ExportRequest, ExportResult, ExportService, OutputFormat,
    SpreadsheetReader,
};

/// Generate grouped "portaria" documents from a Google Sheets tab
#[derive(Debug, Parser)]
#[command(name = "portaria-export")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Enable verbose logging (sets log level to DEBUG)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Serve the HTTP API
    Serve {
        /// Address to listen on (overrides PORTARIA_BIND_ADDR)
        #[arg(long)]
        bind: Option<SocketAddr>,
    },

    /// Print the header columns of a sheet tab as `index|name`
    Columns {
        /// Spreadsheet URL or bare id
        #[arg(long)]
        reference: String,

        /// Sheet tab name
        #[arg(long)]
        tab: String,
    },

    /// Generate one document from a sheet tab
    Export(ExportArgs),
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    /// Spreadsheet URL or bare id
    #[arg(long)]
    pub reference: String,

    /// Sheet tab name
    #[arg(long)]
    pub tab: String,

    /// Column letter whose value groups the rows
    #[arg(long, default_value = "A")]
    pub group_column: String,

    /// Skip rows containing this text (case-insensitive)
    #[arg(long, default_value = "")]
    pub exclude_text: String,

    /// Column indices to leave out, comma separated (e.g. 0,3)
    #[arg(long, value_delimiter = ',')]
    pub drop_columns: Vec<usize>,

    #[arg(long, value_enum, default_value_t = FormatArg::Native)]
    pub format: FormatArg,

    /// Where to write the PDF (defaults to `<document name>.pdf`)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    /// Keep the document in Drive and print its link
    Native,
    /// Download a PDF and remove the Drive copy
    Pdf,
}

impl From<FormatArg> for OutputFormat {
    fn from(format: FormatArg) -> Self {
        match format {
            FormatArg::Native => OutputFormat::Native,
            FormatArg::Pdf => OutputFormat::Pdf,
        }
    }
}

impl From<ExportArgs> for ExportRequest {
    fn from(args: ExportArgs) -> Self {
        ExportRequest {
            reference: args.reference,
            sheet_tab: args.tab,
            group_key_letter: args.group_column,
            exclusion_needle: args.exclude_text,
            excluded_columns: args.drop_columns,
            format: args.format.into(),
        }
    }
}

/// RUST_LOG always takes precedence; `--verbose` falls back to DEBUG.
pub fn init_tracing(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::from_default_env().add_directive(level.into());
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();
}

pub async fn run_columns<R, S, W>(
    service: &ExportService<R, S, W>,
    reference: &str,
    tab: &str,
) -> Result<()>
where
    R: SpreadsheetReader,
    S: DocumentStore,
    W: DocumentRenderer,
{
    let columns = service.list_columns(reference, tab).await?;
    for column in columns {
        println!("{}|{}", column.index, column.name);
    }
    Ok(())
}

pub async fn run_export<R, S, W>(service: &ExportService<R, S, W>, args: ExportArgs) -> Result<()>
where
    R: SpreadsheetReader,
    S: DocumentStore,
    W: DocumentRenderer,
{
    let output = args.output.clone();
    let result = service.export(&ExportRequest::from(args)).await?;
    let message = deliver(result, output.as_deref()).await?;
    println!("{message}");
    Ok(())
}

/// Writes byte results to disk. Returns what should be shown to the user:
/// the link, or the path the file was written to.
async fn deliver(result: ExportResult, output: Option<&Path>) -> Result<String> {
    match result {
        ExportResult::Link { url, .. } => Ok(url),
        ExportResult::Bytes {
            content,
            filename,
            orphaned_document,
            ..
        } => {
            let path = output.map_or_else(|| PathBuf::from(&filename), Path::to_path_buf);
            tokio::fs::write(&path, &content)
                .await
                .with_context(|| format!("failed to write {}", path.display()))?;

            if let Some(id) = orphaned_document {
                eprintln!("warning: intermediate document {id} could not be deleted from Drive");
            }
            Ok(path.display().to_string())
        }
    }
}
