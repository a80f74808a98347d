//! Extraction endpoints.
//!
//! Each successful request gets its own id, its own spreadsheet, and a
//! download URL pointing at that spreadsheet.

use axum::{
    extract::{multipart::Multipart, rejection::JsonRejection, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use orderiq_core::{ExtractError, ExtractionBatch, ImageInput};
use orderiq_logging::{EventLogger, ExtractionEvent};

use crate::error::ApiError;
use crate::mime_detect::{is_image, resolve_upload_mime};
use crate::server::GatewayState;

/// Body of `POST /extract_from_text`.
#[derive(Debug, Default, Deserialize)]
pub struct TextExtractionRequest {
    #[serde(default)]
    pub input_texts: Vec<String>,
    /// Single-message shorthand, appended after `input_texts`.
    #[serde(default)]
    pub input_text: Option<String>,
}

impl TextExtractionRequest {
    pub fn into_messages(self) -> Vec<String> {
        let mut messages = self.input_texts;
        messages.extend(self.input_text);
        messages
    }
}

#[derive(Debug, Serialize)]
pub struct ExtractionResponse {
    pub message: String,
    pub request_id: Uuid,
    pub data: ExtractionBatch,
    pub download_url: String,
}

pub fn download_url(request_id: Uuid) -> String {
    format!("/download_excel/{request_id}")
}

/// Handler for `POST /extract_from_text`
pub async fn extract_from_text(
    State(state): State<GatewayState>,
    payload: Result<Json<TextExtractionRequest>, JsonRejection>,
) -> Result<Json<ExtractionResponse>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let messages = request.into_messages();

    let request_id = Uuid::new_v4();
    EventLogger::log_event(
        &request_id.to_string(),
        ExtractionEvent::Requested {
            source: "text".into(),
            inputs: messages.len(),
        },
    );

    let batch = state
        .pipeline
        .extract_batch(&messages)
        .await
        .map_err(|e| failed(request_id, e))?;

    finish(&state, request_id, batch, "Batch text extraction successful").await
}

/// Handler for `POST /extract_from_image`
pub async fn extract_from_image(
    State(state): State<GatewayState>,
    mut multipart: Multipart,
) -> Result<Json<ExtractionResponse>, ApiError> {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("invalid multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let content_type = field.content_type().map(str::to_owned);
        let file_name = field.file_name().map(str::to_owned);
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("failed to read upload: {e}")))?;
        upload = Some((content_type, file_name, data));
        break;
    }

    let Some((content_type, file_name, data)) = upload else {
        return Err(ApiError::BadRequest("missing multipart field 'file'".into()));
    };
    if data.is_empty() {
        return Err(ApiError::BadRequest("uploaded file is empty".into()));
    }

    let mime = resolve_upload_mime(content_type.as_deref(), &data, file_name.as_deref());
    if !is_image(&mime) {
        return Err(ApiError::BadRequest(format!(
            "unsupported media type {mime}; upload an image of the order"
        )));
    }

    let request_id = Uuid::new_v4();
    info!(%request_id, %mime, bytes = data.len(), file_name = ?file_name, "Image upload received");
    EventLogger::log_event(
        &request_id.to_string(),
        ExtractionEvent::Requested {
            source: "image".into(),
            inputs: 1,
        },
    );

    let batch = state
        .pipeline
        .extract_image(ImageInput::new(data, mime))
        .await
        .map_err(|e| failed(request_id, e))?;

    finish(&state, request_id, batch, "Image extraction successful").await
}

fn failed(request_id: Uuid, error: ExtractError) -> ApiError {
    let error = ApiError::from(error);
    EventLogger::log_event(
        &request_id.to_string(),
        ExtractionEvent::Failed {
            error_msg: error.to_string(),
            raw_output: error.raw_output().map(str::to_owned),
        },
    );
    error
}

/// Persist the batch, index it for download, and build the response.
async fn finish(
    state: &GatewayState,
    request_id: Uuid,
    batch: ExtractionBatch,
    message: &str,
) -> Result<Json<ExtractionResponse>, ApiError> {
    let handle = match state.sink.persist(request_id, &batch).await {
        Ok(handle) => handle,
        Err(e) => {
            let error = ApiError::Persistence(format!("{e:#}"));
            EventLogger::log_event(
                &request_id.to_string(),
                ExtractionEvent::Failed {
                    error_msg: error.to_string(),
                    raw_output: None,
                },
            );
            return Err(error);
        }
    };

    EventLogger::log_event(
        &request_id.to_string(),
        ExtractionEvent::Completed {
            records: batch.len(),
            artifact: Some(handle.file_name.clone()),
        },
    );
    state.artifacts.insert(handle).await;

    Ok(Json(ExtractionResponse {
        message: message.to_string(),
        request_id,
        data: batch,
        download_url: download_url(request_id),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::test_support::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use orderiq_providers::MockBackend;
    use serde_json::json;

    const FANTA: &str = "```json\n[{\"product\": \"Fanta\", \"quantity\": \"4 bottles\"}]\n```";
    const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    fn multipart(content_type: Option<&str>, file_name: &str, data: &[u8]) -> Request<Body> {
        let mut body = Vec::new();
        body.extend_from_slice(b"--XBOUNDARY\r\n");
        body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n")
                .as_bytes(),
        );
        if let Some(ct) = content_type {
            body.extend_from_slice(format!("Content-Type: {ct}\r\n").as_bytes());
        }
        body.extend_from_slice(b"\r\n");
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n--XBOUNDARY--\r\n");

        Request::post("/extract_from_image")
            .header("content-type", "multipart/form-data; boundary=XBOUNDARY")
            .body(Body::from(body))
            .unwrap()
    }

    #[test]
    fn single_text_is_appended() {
        let request = TextExtractionRequest {
            input_texts: vec!["a".into()],
            input_text: Some("b".into()),
        };
        assert_eq!(request.into_messages(), ["a", "b"]);
    }

    #[tokio::test]
    async fn text_extraction_returns_completed_records() {
        let app = app_with(MockBackend::default().with_response(FANTA));
        let (status, body) = send_json(
            &app.router,
            post_json("/extract_from_text", json!({ "input_texts": ["4 bottles of Fanta"] })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Batch text extraction successful");
        let record = &body["data"][0];
        assert_eq!(record["product"], "Fanta");
        assert_eq!(record["phone"], "unknown");
        assert_eq!(record.as_object().unwrap().len(), 9);

        let request_id = body["request_id"].as_str().unwrap();
        assert_eq!(body["download_url"], format!("/download_excel/{request_id}"));
        assert_eq!(std::fs::read_dir(app.dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn single_input_text_is_accepted() {
        let app = app_with(MockBackend::default().with_response(FANTA));
        let (status, _) = send_json(
            &app.router,
            post_json("/extract_from_text", json!({ "input_text": "4 bottles of Fanta" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(app.backend.prompts()[0].contains("4 bottles of Fanta"));
    }

    #[tokio::test]
    async fn empty_input_is_bad_request() {
        let app = app_with(MockBackend::default());
        let (status, body) =
            send_json(&app.router, post_json("/extract_from_text", json!({ "input_texts": [] }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["details"].as_str().unwrap().contains("no input"));
        assert!(app.backend.prompts().is_empty());
    }

    #[tokio::test]
    async fn malformed_json_body_is_bad_request() {
        let app = app_with(MockBackend::default());
        let request = Request::post("/extract_from_text")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, body) = send_json(&app.router, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Bad request");
    }

    #[tokio::test]
    async fn unparseable_model_output_is_422_with_raw_output() {
        let app = app_with(MockBackend::default().with_response("I could not find any orders."));
        let (status, body) =
            send_json(&app.router, post_json("/extract_from_text", json!({ "input_texts": ["hi"] }))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"], "Invalid format received from model");
        assert_eq!(body["raw_output"], "I could not find any orders.");
        assert_eq!(std::fs::read_dir(app.dir.path()).map(|d| d.count()).unwrap_or(0), 0);
    }

    #[tokio::test]
    async fn backend_failure_is_502() {
        let app = app_with(MockBackend::default().with_failure("quota exceeded"));
        let (status, body) =
            send_json(&app.router, post_json("/extract_from_text", json!({ "input_texts": ["hi"] }))).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(body["details"].as_str().unwrap().contains("quota exceeded"));
        assert!(body.get("raw_output").is_none());
    }

    #[tokio::test]
    async fn image_upload_is_extracted() {
        let app = app_with(MockBackend::default().with_response(FANTA));
        let (status, body) =
            send_json(&app.router, multipart(Some("image/png"), "fax.png", PNG)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Image extraction successful");
        assert_eq!(body["data"][0]["quantity"], "4 bottles");
    }

    #[tokio::test]
    async fn image_type_is_sniffed_without_content_type() {
        let app = app_with(MockBackend::default().with_response(FANTA));
        let (status, _) = send_json(&app.router, multipart(None, "upload.bin", PNG)).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn non_image_upload_is_rejected() {
        let app = app_with(MockBackend::default().with_response(FANTA));
        let (status, body) =
            send_json(&app.router, multipart(Some("text/plain"), "order.txt", b"2 tea")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["details"].as_str().unwrap().contains("text/plain"));
        assert!(app.backend.prompts().is_empty());
    }

    #[tokio::test]
    async fn missing_file_field_is_rejected() {
        let app = app_with(MockBackend::default());
        let request = Request::post("/extract_from_image")
            .header("content-type", "multipart/form-data; boundary=XBOUNDARY")
            .body(Body::from(
                "--XBOUNDARY\r\nContent-Disposition: form-data; name=\"other\"\r\n\r\nx\r\n--XBOUNDARY--\r\n",
            ))
            .unwrap();
        let (status, body) = send_json(&app.router, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["details"].as_str().unwrap().contains("'file'"));
    }

    #[tokio::test]
    async fn text_only_backend_rejects_images() {
        let app = app_with(MockBackend::default().text_only());
        let (status, _) = send_json(&app.router, multipart(Some("image/png"), "fax.png", PNG)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
