use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use orderiq_core::ExtractError;

/// Every way a request can fail, rendered as a JSON body
/// `{ "error", "details", "raw_output"? }`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error("failed to save spreadsheet: {0}")]
    Persistence(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Extract(e) => match e {
                ExtractError::EmptyRequest | ExtractError::ImagesUnsupported { .. } => {
                    StatusCode::BAD_REQUEST
                }
                ExtractError::Format(_) => StatusCode::UNPROCESSABLE_ENTITY,
                ExtractError::Unavailable { .. } => StatusCode::BAD_GATEWAY,
            },
            ApiError::Persistence(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn summary(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "Bad request",
            ApiError::NotFound(_) => "Not found",
            ApiError::Extract(ExtractError::Format(_)) => "Invalid format received from model",
            ApiError::Extract(ExtractError::Unavailable { .. }) => "Generative backend unavailable",
            ApiError::Extract(_) => "Bad request",
            ApiError::Persistence(_) => "Failed to save spreadsheet",
            ApiError::Internal(_) => "Internal error",
        }
    }

    /// The model output that failed to parse, if that is what went wrong.
    pub fn raw_output(&self) -> Option<&str> {
        match self {
            ApiError::Extract(ExtractError::Format(f)) => Some(f.raw_output()),
            _ => None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut body = json!({
            "error": self.summary(),
            "details": self.to_string(),
        });
        if let Some(raw) = self.raw_output() {
            body["raw_output"] = json!(raw);
        }
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orderiq_core::FormatError;

    #[test]
    fn status_codes() {
        let format = ApiError::from(ExtractError::Format(FormatError::NoArrayFound {
            raw_output: "no".into(),
        }));
        assert_eq!(format.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(format.raw_output(), Some("no"));

        let down = ApiError::from(ExtractError::Unavailable {
            backend: "gemini".into(),
            message: "timeout".into(),
        });
        assert_eq!(down.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(down.raw_output(), None);

        assert_eq!(ApiError::from(ExtractError::EmptyRequest).status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::NotFound("x".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::Persistence("disk full".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
