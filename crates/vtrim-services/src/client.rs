//! Media service HTTP client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use tracing::{debug, warn};

use vtrim_models::{DetectionParams, SpeechSegment, UploadInfo, VideoFile};

use crate::error::{ServiceError, ServiceResult};
use crate::progress::{decode_stream, ProgressSink};
use crate::types::{
    DetectionResponse, FilterRequest, FilterResponse, HealthResponse, TranscribeRequest,
    TranscriptionResponse,
};
use crate::StageServices;

/// Configuration for the media service client.
#[derive(Debug, Clone)]
pub struct MediaServiceConfig {
    /// Base URL of the media service
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for MediaServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8001".to_string(),
            timeout: Duration::from_secs(600), // 10 minutes for long transcriptions
        }
    }
}

impl MediaServiceConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("MEDIA_SERVICE_URL")
                .unwrap_or_else(|_| "http://localhost:8001".to_string()),
            timeout: Duration::from_secs(
                std::env::var("MEDIA_SERVICE_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(600),
            ),
        }
    }
}

/// HTTP client for the external silence-detection, transcription, and
/// filtering services.
pub struct HttpStageServices {
    http: Client,
    config: MediaServiceConfig,
}

impl HttpStageServices {
    /// Create a new client.
    pub fn new(config: MediaServiceConfig) -> ServiceResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(ServiceError::Network)?;

        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> ServiceResult<Self> {
        Self::new(MediaServiceConfig::from_env())
    }

    /// Check if the media service is healthy.
    pub async fn health_check(&self) -> ServiceResult<bool> {
        let url = format!("{}/health", self.config.base_url);

        match self.http.get(&url).send().await {
            Ok(response) if response.status().is_success() => {
                let health: HealthResponse = response.json().await?;
                Ok(health.status == "healthy" || health.status == "ok")
            }
            Ok(response) => {
                warn!("Media service health check failed: {}", response.status());
                Ok(false)
            }
            Err(e) => {
                warn!("Media service health check error: {}", e);
                Ok(false)
            }
        }
    }

    /// Build a multipart form carrying the video file.
    async fn file_part(&self, file: &VideoFile) -> ServiceResult<Part> {
        let bytes = tokio::fs::read(&file.path)
            .await
            .map_err(|e| ServiceError::upload_failed(format!("cannot read {}: {}", file.path, e)))?;

        Part::bytes(bytes)
            .file_name(file.name.clone())
            .mime_str("application/octet-stream")
            .map_err(ServiceError::Network)
    }

    async fn ensure_success(response: reqwest::Response) -> ServiceResult<reqwest::Response> {
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::request_failed(status, body));
        }
        Ok(response)
    }
}

#[async_trait]
impl StageServices for HttpStageServices {
    async fn remove_silence(
        &self,
        file: &VideoFile,
        params: &DetectionParams,
        progress: ProgressSink,
    ) -> ServiceResult<DetectionResponse> {
        let url = format!("{}/silence/remove", self.config.base_url);
        debug!(file = %file.name, "Sending silence-detection request to {}", url);

        let form = Form::new()
            .part("file", self.file_part(file).await?)
            .text("volume_threshold", params.volume_threshold.to_string())
            .text("speech_padding_ms", params.speech_padding_ms.to_string())
            .text("silence_padding_ms", params.silence_padding_ms.to_string());

        let response = self.http.post(&url).multipart(form).send().await?;
        let response = Self::ensure_success(response).await?;

        decode_stream(response, &progress).await
    }

    async fn transcribe_video(
        &self,
        file: &VideoFile,
        segments: &[SpeechSegment],
        language: &str,
        progress: ProgressSink,
        upload_info: Option<&UploadInfo>,
    ) -> ServiceResult<TranscriptionResponse> {
        let url = format!("{}/transcribe", self.config.base_url);

        // With a valid upload handle the file is referenced in place instead
        // of being uploaded a second time.
        let response = match upload_info {
            Some(info) => {
                debug!(
                    file = %file.name,
                    media_session = %info.session_id,
                    "Sending transcription request reusing uploaded file"
                );
                let body = TranscribeRequest {
                    file_path: &info.file_path,
                    session_id: &info.session_id,
                    segments,
                    language,
                };
                self.http.post(&url).json(&body).send().await?
            }
            None => {
                debug!(file = %file.name, "Sending transcription request with file upload");
                let segments_json = serde_json::to_string(segments)
                    .map_err(|e| ServiceError::invalid_response(e.to_string()))?;
                let form = Form::new()
                    .part("file", self.file_part(file).await?)
                    .text("segments", segments_json)
                    .text("language", language.to_string());
                self.http.post(&url).multipart(form).send().await?
            }
        };

        let response = Self::ensure_success(response).await?;
        decode_stream(response, &progress).await
    }

    async fn filter_transcribed_segments(
        &self,
        segments: &[SpeechSegment],
    ) -> ServiceResult<FilterResponse> {
        let url = format!("{}/transcripts/filter", self.config.base_url);
        debug!(count = segments.len(), "Sending filter request to {}", url);

        // No automatic retry: a failed stage is surfaced and the user
        // decides whether to run it again.
        let response = self
            .http
            .post(&url)
            .json(&FilterRequest { segments })
            .send()
            .await?;
        let response = Self::ensure_success(response).await?;

        let filter_response: FilterResponse = response.json().await?;
        Ok(filter_response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = MediaServiceConfig::default();
        assert_eq!(config.base_url, "http://localhost:8001");
        assert_eq!(config.timeout, Duration::from_secs(600));
    }
}
