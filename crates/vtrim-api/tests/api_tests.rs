//! API integration tests over stubbed stage services.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use tower::ServiceExt;

use vtrim_api::{create_router, ApiConfig, AppState};
use vtrim_models::{DetectionParams, SpeechSegment, UploadInfo, VideoFile};
use vtrim_services::{
    DetectionResponse, FilterResponse, ProgressSink, ServiceResult, StageServices,
    TranscriptionResponse,
};

/// Stage services with canned successful responses.
struct StubServices;

#[async_trait]
impl StageServices for StubServices {
    async fn remove_silence(
        &self,
        _file: &VideoFile,
        _params: &DetectionParams,
        _progress: ProgressSink,
    ) -> ServiceResult<DetectionResponse> {
        Ok(DetectionResponse {
            segments: vec![
                SpeechSegment::new(0.0, 2.0),
                SpeechSegment::new(5.0, 8.0),
                SpeechSegment::new(10.0, 11.0),
            ],
            audio_url: "/audio/talk.wav".to_string(),
            upload_info: Some(UploadInfo {
                file_path: "/uploads/abc/talk.mp4".to_string(),
                file_name: "talk.mp4".to_string(),
                file_size: 100,
                session_id: "abc".to_string(),
            }),
        })
    }

    async fn transcribe_video(
        &self,
        _file: &VideoFile,
        segments: &[SpeechSegment],
        _language: &str,
        _progress: ProgressSink,
        _upload_info: Option<&UploadInfo>,
    ) -> ServiceResult<TranscriptionResponse> {
        Ok(TranscriptionResponse {
            segments: segments
                .iter()
                .cloned()
                .map(|s| s.with_transcript("words"))
                .collect(),
            error: None,
            installation_instructions: None,
        })
    }

    async fn filter_transcribed_segments(
        &self,
        segments: &[SpeechSegment],
    ) -> ServiceResult<FilterResponse> {
        Ok(FilterResponse {
            filtered_segments: Some(segments.iter().cloned().take(2).collect()),
            model: Some("filter-v2".to_string()),
            warning: None,
            error: None,
        })
    }
}

fn test_app() -> Router {
    let state = AppState::with_services(ApiConfig::default(), Arc::new(StubServices));
    create_router(state)
}

fn json_request(method: Method, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn create_session(app: &Router) -> String {
    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/sessions",
            serde_json::json!({
                "file_name": "talk.mp4",
                "file_path": "/videos/talk.mp4",
                "file_size": 100,
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response).await;
    assert_eq!(body["phase"], "idle");
    body["session_id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn health_endpoint_responds() {
    let app = test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn session_not_found_is_404() {
    let app = test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/sessions/nope")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn empty_file_name_is_rejected() {
    let app = test_app();

    let response = app
        .oneshot(json_request(
            Method::POST,
            "/api/sessions",
            serde_json::json!({
                "file_name": "",
                "file_path": "/videos/talk.mp4",
                "file_size": 100,
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn full_pipeline_over_http() {
    let app = test_app();
    let session_id = create_session(&app).await;

    // Detect.
    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            &format!("/api/sessions/{}/detect", session_id),
            serde_json::json!({ "params": { "volume_threshold": 35 } }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "completed");
    assert_eq!(body["segments"].as_array().unwrap().len(), 3);

    // Transcribe.
    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            &format!("/api/sessions/{}/transcribe", session_id),
            serde_json::json!({ "language": "english" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "completed");

    // Filter keeps two of three segments.
    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            &format!("/api/sessions/{}/filter", session_id),
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["segments"].as_array().unwrap().len(), 2);

    // Snapshot reflects the filtered state and recomputed durations.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/api/sessions/{}", session_id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["phase"], "filtered");
    assert_eq!(body["total_segment_duration"], 5.0);
    assert_eq!(body["original_duration"], 11.0);

    // Export download carries the artifact name.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/api/sessions/{}/export", session_id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let disposition = response
        .headers()
        .get(header::CONTENT_DISPOSITION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.contains("talk_edited.xml"));
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let xml = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(xml.contains("<xmeml version=\"4\">"));
    assert_eq!(xml.matches("<clipitem id=").count(), 2);
}

#[tokio::test]
async fn detect_with_transcript_requires_confirmation() {
    let app = test_app();
    let session_id = create_session(&app).await;

    for path in ["detect", "transcribe"] {
        let response = app
            .clone()
            .oneshot(json_request(
                Method::POST,
                &format!("/api/sessions/{}/{}", session_id, path),
                serde_json::json!({}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    // Re-detection with a transcript parks behind confirmation.
    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            &format!("/api/sessions/{}/detect", session_id),
            serde_json::json!({ "params": { "volume_threshold": 50 } }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "confirmation_required");

    // Confirm executes the re-detection.
    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            &format!("/api/sessions/{}/detect/confirm", session_id),
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "redetected");

    // Nothing pending anymore.
    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            &format!("/api/sessions/{}/detect/cancel", session_id),
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}
