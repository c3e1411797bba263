// =============================================================================
// GOOGLE WORKSPACE MODULE
// =============================================================================
//
// Implementations of the export pipeline's collaborator traits on top of
// Google APIs:
// - `service_account.rs` mints OAuth2 bearer tokens from a service account key.
// - `sheets_client.rs` reads cell ranges (Sheets v4).
// - `drive_client.rs` uploads, exports and deletes documents (Drive v3).
//
// One `ServiceAccountAuth` is shared by both clients so they reuse the same
// cached token.

pub mod drive_client;
pub mod service_account;
pub mod sheets_client;

pub use drive_client::GoogleDriveClient;
pub use service_account::ServiceAccountAuth;
pub use sheets_client::GoogleSheetsClient;

use std::fmt::Display;

use crate::core::errors::UpstreamError;

pub(crate) fn transport_error(service: &'static str, err: impl Display) -> UpstreamError {
    UpstreamError::Transport {
        service,
        message: err.to_string(),
    }
}

/// Turns a non-2xx response into `UpstreamError::Status`, keeping the body
/// for the error message.
pub(crate) async fn ensure_success(
    service: &'static str,
    response: reqwest::Response,
) -> Result<reqwest::Response, UpstreamError> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    Err(UpstreamError::Status {
        service,
        status,
        body,
    })
}
