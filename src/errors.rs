use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("token is missing")]
    MissingToken,

    #[error("token has expired")]
    ExpiredToken,

    #[error("invalid token")]
    InvalidToken,

    #[error("invalid username or password")]
    BadCredentials,

    #[error("{0} parameter is required")]
    MissingParameter(&'static str),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("upstream returned status {status}")]
    UpstreamRejected { status: u16, body: String },

    #[error("failed to reach upstream: {0}")]
    UpstreamUnreachable(String),

    #[error("upstream returned a malformed body")]
    UpstreamMalformed,

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, code, msg, details) = match &self {
            AppError::MissingToken => (
                StatusCode::UNAUTHORIZED,
                "authentication_error",
                "missing_token",
                self.to_string(),
                None,
            ),
            AppError::ExpiredToken => (
                StatusCode::UNAUTHORIZED,
                "authentication_error",
                "token_expired",
                self.to_string(),
                None,
            ),
            AppError::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                "authentication_error",
                "invalid_token",
                self.to_string(),
                None,
            ),
            AppError::BadCredentials => (
                StatusCode::UNAUTHORIZED,
                "authentication_error",
                "bad_credentials",
                self.to_string(),
                None,
            ),
            AppError::MissingParameter(_) => (
                StatusCode::BAD_REQUEST,
                "invalid_request_error",
                "missing_parameter",
                self.to_string(),
                None,
            ),
            AppError::InvalidParameter(_) => (
                StatusCode::BAD_REQUEST,
                "invalid_request_error",
                "invalid_parameter",
                self.to_string(),
                None,
            ),
            AppError::UpstreamRejected { status, body } => (
                // Propagate the upstream status verbatim.
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY),
                "upstream_error",
                "upstream_rejected",
                self.to_string(),
                Some(body.clone()),
            ),
            AppError::UpstreamUnreachable(e) => {
                tracing::warn!("upstream unreachable: {}", e);
                (
                    StatusCode::BAD_GATEWAY,
                    "upstream_error",
                    "upstream_unreachable",
                    "failed to reach upstream".to_string(),
                    None,
                )
            }
            AppError::UpstreamMalformed => (
                StatusCode::BAD_GATEWAY,
                "upstream_error",
                "upstream_malformed",
                self.to_string(),
                None,
            ),
            AppError::Internal(e) => {
                tracing::error!("internal error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "internal_server_error",
                    "internal server error".to_string(),
                    None,
                )
            }
        };

        let mut error = json!({
            "message": msg,
            "type": error_type,
            "code": code,
        });
        if let Some(details) = details {
            error["details"] = json!(details);
        }

        (status, Json(json!({ "error": error }))).into_response()
    }
}
