//! NDJSON progress stream decoding.
//!
//! Long-running media-service endpoints respond with newline-delimited JSON:
//! zero or more progress event lines followed by exactly one terminal line
//! tagged `"type": "result"` carrying the stage payload. Lines arrive (and
//! are forwarded) in emission order.

use futures_util::StreamExt;
use serde::de::DeserializeOwned;
use tokio::sync::mpsc;
use tracing::warn;

use vtrim_models::ProgressEvent;

use crate::error::{ServiceError, ServiceResult};

/// Sink for progress events decoded off a stage response stream.
pub type ProgressSink = mpsc::UnboundedSender<ProgressEvent>;

/// Decode a streamed stage response.
///
/// Progress events are forwarded to `progress` as they arrive; the terminal
/// result payload is returned. Malformed lines are skipped with a warning so
/// a glitchy stream cannot kill an otherwise healthy stage run; a missing
/// terminal payload is an error.
pub async fn decode_stream<T: DeserializeOwned>(
    response: reqwest::Response,
    progress: &ProgressSink,
) -> ServiceResult<T> {
    let mut stream = response.bytes_stream();
    let mut buffer: Vec<u8> = Vec::new();
    let mut result: Option<T> = None;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        buffer.extend_from_slice(&chunk);

        while let Some(newline) = buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = buffer.drain(..=newline).collect();
            decode_line(&line, progress, &mut result)?;
        }
    }

    // Terminal line may arrive without a trailing newline.
    if !buffer.is_empty() {
        decode_line(&buffer, progress, &mut result)?;
    }

    result.ok_or_else(|| ServiceError::invalid_response("stream ended without a result payload"))
}

fn decode_line<T: DeserializeOwned>(
    line: &[u8],
    progress: &ProgressSink,
    result: &mut Option<T>,
) -> ServiceResult<()> {
    let text = match std::str::from_utf8(line) {
        Ok(text) => text.trim(),
        Err(_) => {
            warn!("Skipping non-UTF8 line in progress stream");
            return Ok(());
        }
    };

    if text.is_empty() {
        return Ok(());
    }

    let value: serde_json::Value = match serde_json::from_str(text) {
        Ok(value) => value,
        Err(e) => {
            warn!(error = %e, "Skipping malformed line in progress stream");
            return Ok(());
        }
    };

    if value.get("type").and_then(|t| t.as_str()) == Some("result") {
        let data = value
            .get("data")
            .cloned()
            .ok_or_else(|| ServiceError::invalid_response("result line missing data payload"))?;
        let payload = serde_json::from_value(data)
            .map_err(|e| ServiceError::invalid_response(format!("bad result payload: {}", e)))?;
        *result = Some(payload);
        return Ok(());
    }

    match serde_json::from_value::<ProgressEvent>(value) {
        Ok(event) => {
            // A closed receiver only means the caller stopped listening.
            progress.send(event).ok();
        }
        Err(e) => {
            warn!(error = %e, "Skipping unrecognized event in progress stream");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sink() -> (ProgressSink, mpsc::UnboundedReceiver<ProgressEvent>) {
        mpsc::unbounded_channel()
    }

    #[test]
    fn test_decode_line_event_then_result() {
        let (tx, mut rx) = sink();
        let mut result: Option<serde_json::Value> = None;

        decode_line(
            br#"{"type":"status","status":"Initializing...","message":"warming up"}"#,
            &tx,
            &mut result,
        )
        .unwrap();
        decode_line(br#"{"type":"result","data":{"ok":true}}"#, &tx, &mut result).unwrap();

        assert!(matches!(rx.try_recv().unwrap(), ProgressEvent::Status { .. }));
        assert_eq!(result.unwrap(), serde_json::json!({"ok": true}));
    }

    #[test]
    fn test_decode_line_skips_malformed() {
        let (tx, mut rx) = sink();
        let mut result: Option<serde_json::Value> = None;

        decode_line(b"not json at all", &tx, &mut result).unwrap();
        decode_line(br#"{"type":"mystery"}"#, &tx, &mut result).unwrap();
        decode_line(b"", &tx, &mut result).unwrap();

        assert!(rx.try_recv().is_err());
        assert!(result.is_none());
    }

    #[test]
    fn test_decode_line_bad_result_payload_is_error() {
        let (tx, _rx) = sink();
        let mut result: Option<u32> = None;

        let err = decode_line(br#"{"type":"result"}"#, &tx, &mut result).unwrap_err();
        assert!(matches!(err, ServiceError::InvalidResponse(_)));
    }

    #[test]
    fn test_decode_preserves_order() {
        let (tx, mut rx) = sink();
        let mut result: Option<serde_json::Value> = None;

        for i in 1..=3u8 {
            let line = format!(
                r#"{{"type":"upload_progress","progress":{},"message":"Uploading video..."}}"#,
                i * 10
            );
            decode_line(line.as_bytes(), &tx, &mut result).unwrap();
        }

        for i in 1..=3u8 {
            match rx.try_recv().unwrap() {
                ProgressEvent::UploadProgress { progress, .. } => assert_eq!(progress, i * 10),
                other => panic!("Unexpected event: {:?}", other),
            }
        }
    }
}
