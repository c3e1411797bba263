use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::service_account::ServiceAccountAuth;
use super::{ensure_success, transport_error};
use crate::core::errors::UpstreamError;
use crate::core::export::{DocumentStore, NewDocument, StoredDocument};

const SERVICE: &str = "drive";
const DEFAULT_BASE_URL: &str = "https://www.googleapis.com";

/// Uploads are converted to this so Drive can later export them as PDF.
const GOOGLE_DOCS_MIME: &str = "application/vnd.google-apps.document";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FileMetadata<'a> {
    name: &'a str,
    mime_type: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parents: Option<Vec<&'a str>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatedFile {
    id: String,
    web_view_link: Option<String>,
}

/// Google Drive v3 document store.
pub struct GoogleDriveClient {
    client: Client,
    auth: Arc<ServiceAccountAuth>,
    base_url: String,
    folder_id: Option<String>,
}

impl GoogleDriveClient {
    pub fn new(auth: Arc<ServiceAccountAuth>) -> Self {
        Self {
            client: Client::new(),
            auth,
            base_url: DEFAULT_BASE_URL.to_string(),
            folder_id: None,
        }
    }

    /// Places every created document in this folder instead of the
    /// service account's root.
    pub fn with_folder(mut self, folder_id: Option<String>) -> Self {
        self.folder_id = folder_id;
        self
    }

    fn file_url(&self, document_id: &str) -> String {
        format!("{}/drive/v3/files/{}", self.base_url, document_id)
    }
}

/// Link used when Drive does not return `webViewLink`.
fn fallback_link(document_id: &str) -> String {
    format!("https://docs.google.com/document/d/{document_id}/edit")
}

/// Builds a `multipart/related` body: JSON metadata part, then the media part.
fn related_body(boundary: &str, metadata: &[u8], media_type: &str, media: &[u8]) -> Vec<u8> {
    let mut body = Vec::with_capacity(metadata.len() + media.len() + 256);
    body.extend_from_slice(
        format!("--{boundary}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n").as_bytes(),
    );
    body.extend_from_slice(metadata);
    body.extend_from_slice(format!("\r\n--{boundary}\r\nContent-Type: {media_type}\r\n\r\n").as_bytes());
    body.extend_from_slice(media);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    body
}

#[async_trait]
impl DocumentStore for GoogleDriveClient {
    async fn create_from_bytes(
        &self,
        document: NewDocument,
    ) -> Result<StoredDocument, UpstreamError> {
        let metadata = FileMetadata {
            name: &document.name,
            mime_type: GOOGLE_DOCS_MIME,
            parents: self.folder_id.as_deref().map(|id| vec![id]),
        };
        let metadata = serde_json::to_vec(&metadata).map_err(|e| transport_error(SERVICE, e))?;

        let boundary = format!("portaria-{:016x}", rand::random::<u64>());
        let body = related_body(&boundary, &metadata, document.mime_type, &document.content);
        let token = self.auth.access_token().await?;

        tracing::debug!(name = %document.name, bytes = document.content.len(), "Uploading document to Drive");

        let response = self
            .client
            .post(format!("{}/upload/drive/v3/files", self.base_url))
            .query(&[
                ("uploadType", "multipart"),
                ("fields", "id,webViewLink"),
                ("supportsAllDrives", "true"),
            ])
            .bearer_auth(token)
            .header(
                reqwest::header::CONTENT_TYPE,
                format!("multipart/related; boundary={boundary}"),
            )
            .body(body)
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, e))?;
        let response = ensure_success(SERVICE, response).await?;

        let created: CreatedFile = response.json().await.map_err(|e| UpstreamError::Decode {
            service: SERVICE,
            message: e.to_string(),
        })?;

        let link = created
            .web_view_link
            .unwrap_or_else(|| fallback_link(&created.id));
        Ok(StoredDocument {
            id: created.id,
            link,
        })
    }

    async fn export_as(
        &self,
        document_id: &str,
        mime_type: &str,
    ) -> Result<Vec<u8>, UpstreamError> {
        let token = self.auth.access_token().await?;

        tracing::debug!(document_id, mime_type, "Exporting document from Drive");

        let response = self
            .client
            .get(format!("{}/export", self.file_url(document_id)))
            .query(&[("mimeType", mime_type)])
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, e))?;
        let response = ensure_success(SERVICE, response).await?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| transport_error(SERVICE, e))?;
        Ok(bytes.to_vec())
    }

    async fn delete(&self, document_id: &str) -> Result<(), UpstreamError> {
        let token = self.auth.access_token().await?;

        let response = self
            .client
            .delete(self.file_url(document_id))
            .query(&[("supportsAllDrives", "true")])
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, e))?;
        ensure_success(SERVICE, response).await?;

        tracing::debug!(document_id, "Deleted document from Drive");
        Ok(())
    }
}
