// This is the entry point of the portaria export service.
//
// **Architecture Overview:**
// - `core/` = Business logic (sheet pipeline, document assembly, export flow)
// - `infra/` = Implementations of core traits (Google Sheets, Google Drive, .docx)
// - `http/` = HTTP adapter (axum routes)
// - `cli/` = Command-line adapter
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Run the requested command (serving HTTP by default)

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with half a dozen mod.rs files that all look the same.
#[path = "cli/cli_layer.rs"]
mod cli;
mod config;
#[path = "core/core_layer.rs"]
mod core;
#[path = "http/http_layer.rs"]
mod http;
#[path = "infra/infra_layer.rs"]
mod infra;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use crate::cli::{Cli, Command};
use crate::config::AppConfig;
use crate::core::export::ExportService;
use crate::infra::docx::DocxRenderer;
use crate::infra::google::{GoogleDriveClient, GoogleSheetsClient, ServiceAccountAuth};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    cli::init_tracing(cli.verbose);

    let config = AppConfig::from_env()?;

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================
    // This is the "composition root" where we wire everything together.

    // Missing credentials stop the process here instead of failing the first request.
    let auth = Arc::new(
        ServiceAccountAuth::from_env()
            .await
            .context("Google service account is not configured")?,
    );
    tracing::info!(client_email = auth.client_email(), "Loaded Google service account");

    let sheets = GoogleSheetsClient::new(Arc::clone(&auth));
    let drive = GoogleDriveClient::new(auth).with_folder(config.drive_folder_id.clone());
    let service = Arc::new(ExportService::new(
        sheets,
        drive,
        DocxRenderer,
        config.export.clone(),
    ));

    match cli.command.unwrap_or(Command::Serve { bind: None }) {
        Command::Serve { bind } => {
            let addr = bind.unwrap_or(config.bind_addr);
            let listener = tokio::net::TcpListener::bind(addr)
                .await
                .with_context(|| format!("failed to bind {addr}"))?;

            tracing::info!(%addr, "Portaria export API listening");
            axum::serve(listener, http::build_router(service)).await?;
        }
        Command::Columns { reference, tab } => {
            cli::run_columns(&service, &reference, &tab).await?;
        }
        Command::Export(args) => {
            cli::run_export(&service, args).await?;
        }
    }

    Ok(())
}
