//! Axum route handlers for the Batch API.

use axum::{
    extract::{Multipart, State},
    http::{header, HeaderName, StatusCode},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use chrono::Utc;
use tracing::info;

use crate::batch::{process_batch, BatchOptions};
use crate::errors::AppError;
use crate::state::AppState;

const ARCHIVE_FIELD: &str = "archive";
const XLSX_CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// POST /api/v1/batches
///
/// Multipart upload with one `archive` field holding a ZIP of CVs.
/// Answers with the generated workbook as an attachment.
pub async fn handle_create_batch(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response, AppError> {
    let mut archive: Option<Bytes> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("invalid multipart body: {e}")))?
    {
        if field.name() == Some(ARCHIVE_FIELD) {
            let data = field
                .bytes()
                .await
                .map_err(|e| AppError::Validation(format!("failed to read upload: {e}")))?;
            archive = Some(data);
        }
    }

    let archive = archive
        .filter(|data| !data.is_empty())
        .ok_or_else(|| {
            AppError::Validation(format!("multipart field '{ARCHIVE_FIELD}' with a ZIP file is required"))
        })?;

    info!("Received archive upload ({} bytes)", archive.len());

    // Upload, staging and report live in a per-request dir, removed when it drops.
    let workdir = tempfile::tempdir().map_err(|e| AppError::Internal(e.into()))?;
    let archive_path = workdir.path().join("upload.zip");
    let output_path = workdir.path().join("report.xlsx");
    tokio::fs::write(&archive_path, &archive)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    let options = BatchOptions {
        staging_root: workdir.path().join("staging"),
        ..state.config.batch_options()
    };
    let run = process_batch(
        &archive_path,
        &output_path,
        &options,
        state.summarizer.clone(),
    )
    .await?;

    let workbook = tokio::fs::read(&output_path)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    let filename = format!("cv_report_{}.xlsx", Utc::now().format("%Y%m%dT%H%M%SZ"));
    let headers = [
        (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}\""),
        ),
        (
            HeaderName::from_static("x-rows-processed"),
            run.report.len().to_string(),
        ),
        (
            HeaderName::from_static("x-files-failed"),
            run.failures.len().to_string(),
        ),
    ];

    Ok((StatusCode::OK, headers, workbook).into_response())
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    use super::*;
    use crate::batch::archive::tests::write_zip;
    use crate::batch::orchestrator::tests::{FakeMode, FakeSummarizer};
    use crate::batch::CleanupPolicy;
    use crate::config::Config;
    use crate::extraction::docx::tests::docx_bytes;
    use crate::routes::build_router;

    const BOUNDARY: &str = "cvextractorboundary";

    fn test_state(staging_root: &std::path::Path) -> AppState {
        AppState {
            config: Config {
                hf_api_token: "hf_test".into(),
                summarizer_url: "http://127.0.0.1:9/unused".into(),
                summarizer_timeout: Duration::from_secs(1),
                summary_concurrency: 2,
                staging_root: staging_root.to_path_buf(),
                staging_cleanup: CleanupPolicy::Purge,
                max_entry_bytes: 1024 * 1024,
                max_upload_bytes: 1024 * 1024,
                port: 0,
                rust_log: "info".into(),
            },
            summarizer: FakeSummarizer::new(FakeMode::Echo),
        }
    }

    fn multipart_request(field: &str, payload: &[u8]) -> Request<Body> {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"cvs.zip\"\r\nContent-Type: application/zip\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(payload);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri("/api/v1/batches")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_upload_returns_workbook_attachment() {
        let tmp = tempfile::tempdir().unwrap();
        let zip_path = tmp.path().join("cvs.zip");
        let alice = docx_bytes(&["Alice", "alice@example.com", "555-123-4567"]);
        write_zip(&zip_path, &[("alice.docx", &alice), ("readme.txt", b"skip me")]);
        let payload = fs::read(&zip_path).unwrap();

        let app = build_router(test_state(&tmp.path().join("staging")));
        let response = app
            .oneshot(multipart_request(ARCHIVE_FIELD, &payload))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(headers[header::CONTENT_TYPE], XLSX_CONTENT_TYPE);
        assert!(headers[header::CONTENT_DISPOSITION]
            .to_str()
            .unwrap()
            .starts_with("attachment; filename=\"cv_report_"));
        assert_eq!(headers["x-rows-processed"], "1");
        assert_eq!(headers["x-files-failed"], "0");

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        // XLSX is a ZIP container.
        assert!(body.starts_with(b"PK"));
    }

    #[tokio::test]
    async fn test_requests_leave_nothing_under_staging_root() {
        let tmp = tempfile::tempdir().unwrap();
        let staging_root = tmp.path().join("staging");
        fs::create_dir_all(&staging_root).unwrap();
        let zip_path = tmp.path().join("cvs.zip");
        let alice = docx_bytes(&["Alice", "alice@example.com"]);
        write_zip(&zip_path, &[("alice.docx", &alice)]);
        let payload = fs::read(&zip_path).unwrap();

        let mut state = test_state(&staging_root);
        state.config.staging_cleanup = CleanupPolicy::IfEmpty;
        let app = build_router(state);

        for _ in 0..3 {
            let response = app
                .clone()
                .oneshot(multipart_request(ARCHIVE_FIELD, &payload))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        assert_eq!(fs::read_dir(&staging_root).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_missing_archive_field_is_400() {
        let tmp = tempfile::tempdir().unwrap();
        let app = build_router(test_state(tmp.path()));

        let response = app
            .oneshot(multipart_request("something_else", b"data"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_non_zip_upload_is_422() {
        let tmp = tempfile::tempdir().unwrap();
        let app = build_router(test_state(tmp.path()));

        let response = app
            .oneshot(multipart_request(ARCHIVE_FIELD, b"plain text, not a zip"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"]["code"], "UNPROCESSABLE_ENTITY");
    }

    #[tokio::test]
    async fn test_health_reports_ok() {
        let tmp = tempfile::tempdir().unwrap();
        let app = build_router(test_state(tmp.path()));

        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "ok");
    }

    #[test]
    fn test_state_summarizer_is_shared() {
        let tmp = tempfile::tempdir().unwrap();
        let state = test_state(tmp.path());
        let cloned = state.clone();
        assert!(Arc::ptr_eq(&state.summarizer, &cloned.summarizer));
    }
}
