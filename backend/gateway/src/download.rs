//! `GET /download_excel/:request_id`: serve the spreadsheet written for one
//! extraction request.

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use tokio::fs;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::ApiError;
use crate::server::GatewayState;

const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

pub async fn download_excel(
    Path(request_id): Path<String>,
    State(state): State<GatewayState>,
) -> Result<Response, ApiError> {
    let not_found = || ApiError::NotFound(format!("No spreadsheet for request {request_id}"));

    let id = Uuid::parse_str(&request_id).map_err(|_| not_found())?;
    let handle = state.artifacts.get(&id).await.ok_or_else(not_found)?;
    debug!(path = %handle.path.display(), "Serving spreadsheet");

    let bytes = match fs::read(&handle.path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!(path = %handle.path.display(), "Indexed spreadsheet is gone from disk");
            return Err(ApiError::NotFound(format!(
                "Spreadsheet for request {request_id} no longer exists"
            )));
        }
        Err(e) => {
            warn!(path = %handle.path.display(), error = %e, "Failed to read spreadsheet");
            return Err(ApiError::Internal("Failed to read spreadsheet".into()));
        }
    };

    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{}\"", handle.file_name))
        .map_err(|e| ApiError::Internal(format!("invalid file name: {e}")))?;

    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(XLSX_MIME));
    headers.insert(header::CONTENT_DISPOSITION, disposition);
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(bytes.len()));

    Ok((StatusCode::OK, headers, bytes).into_response())
}
