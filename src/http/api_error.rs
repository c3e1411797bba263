// Error responses. Failures become `{"error": "<message>"}`, or
// `{"erro": "<message>"}` on the legacy `/api/...` routes.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::core::errors::ExportError;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("invalid request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Export(#[from] ExportError),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Export(err) if err.is_caller_error() => StatusCode::BAD_REQUEST,
            ApiError::Export(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Logs the failure and returns what goes on the wire.
    fn report(self) -> (StatusCode, String) {
        let status = self.status();
        let message = self.to_string();

        if status.is_server_error() {
            tracing::error!(error = %message, "Request failed");
        } else {
            tracing::warn!(error = %message, "Rejected request");
        }

        (status, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = self.report();
        (status, Json(ErrorBody { error: message })).into_response()
    }
}

// ============================================================================
// LEGACY FRONT-END
// ============================================================================

/// Error body read by the `/api/...` front-end.
#[derive(Debug, Serialize)]
pub struct LegacyErrorBody {
    pub erro: String,
}

/// Same status mapping as `ApiError`, rendered as `{"erro": "<message>"}`.
#[derive(Debug)]
pub struct LegacyApiError(pub ApiError);

impl From<ApiError> for LegacyApiError {
    fn from(err: ApiError) -> Self {
        LegacyApiError(err)
    }
}

impl From<ExportError> for LegacyApiError {
    fn from(err: ExportError) -> Self {
        LegacyApiError(err.into())
    }
}

impl From<JsonRejection> for LegacyApiError {
    fn from(rejection: JsonRejection) -> Self {
        LegacyApiError(rejection.into())
    }
}

impl IntoResponse for LegacyApiError {
    fn into_response(self) -> Response {
        let (status, message) = self.0.report();
        (status, Json(LegacyErrorBody { erro: message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::errors::UpstreamError;

    #[test]
    fn test_caller_errors_are_bad_requests() {
        let err = ApiError::from(ExportError::InsufficientData { rows: 1 });
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let err = ApiError::from(ExportError::InvalidGroupKey("1".to_string()));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let err = ApiError::BadRequest("missing field".to_string());
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_service_errors_are_internal() {
        let err = ApiError::from(ExportError::Upstream(UpstreamError::Status {
            service: "sheets",
            status: 403,
            body: "forbidden".to_string(),
        }));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let err = ApiError::from(ExportError::Configuration("no key".to_string()));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_legacy_body_uses_erro_field() {
        let err = LegacyApiError::from(ExportError::InsufficientData { rows: 1 });
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = axum::body::to_bytes(response.into_body(), 4096).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert!(json["erro"].as_str().unwrap().contains("found 1"));
        assert!(json.get("error").is_none());
    }

    #[tokio::test]
    async fn test_response_body_carries_message() {
        let response = ApiError::from(ExportError::InvalidGroupKey("AB".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = axum::body::to_bytes(response.into_body(), 4096).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            json["error"],
            "invalid group column \"AB\": expected a single letter A-Z"
        );
    }
}
