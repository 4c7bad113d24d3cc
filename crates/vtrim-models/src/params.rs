//! Silence-detection parameters.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Tunable knobs for silence detection.
///
/// Changing any of these invalidates previously detected segments and
/// requires re-detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct DetectionParams {
    /// Volume threshold below which audio counts as silence (0-100)
    #[serde(default = "default_volume_threshold")]
    pub volume_threshold: u8,

    /// Padding kept around speech, in milliseconds
    #[serde(default = "default_speech_padding_ms")]
    pub speech_padding_ms: u32,

    /// Minimum silence gap removed, in milliseconds
    #[serde(default = "default_silence_padding_ms")]
    pub silence_padding_ms: u32,
}

fn default_volume_threshold() -> u8 {
    35
}

fn default_speech_padding_ms() -> u32 {
    50
}

fn default_silence_padding_ms() -> u32 {
    500
}

impl Default for DetectionParams {
    fn default() -> Self {
        Self {
            volume_threshold: default_volume_threshold(),
            speech_padding_ms: default_speech_padding_ms(),
            silence_padding_ms: default_silence_padding_ms(),
        }
    }
}

/// Detection parameter validation error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParamsError {
    /// Volume threshold outside the 0-100 range
    #[error("Volume threshold must be between 0 and 100, got {0}")]
    VolumeThresholdOutOfRange(u8),
}

impl DetectionParams {
    /// Create parameters, falling back to defaults for each knob.
    pub fn new(volume_threshold: u8, speech_padding_ms: u32, silence_padding_ms: u32) -> Self {
        Self {
            volume_threshold,
            speech_padding_ms,
            silence_padding_ms,
        }
    }

    /// Validate the parameter ranges.
    pub fn validate(&self) -> Result<(), ParamsError> {
        if self.volume_threshold > 100 {
            return Err(ParamsError::VolumeThresholdOutOfRange(self.volume_threshold));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let params = DetectionParams::default();
        assert_eq!(params.volume_threshold, 35);
        assert_eq!(params.speech_padding_ms, 50);
        assert_eq!(params.silence_padding_ms, 500);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_volume_threshold_range() {
        let params = DetectionParams::new(101, 0, 0);
        assert!(matches!(
            params.validate(),
            Err(ParamsError::VolumeThresholdOutOfRange(101))
        ));

        let params = DetectionParams::new(100, 0, 0);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_deserialization_fills_defaults() {
        let params: DetectionParams = serde_json::from_str("{}").unwrap();
        assert_eq!(params, DetectionParams::default());

        let params: DetectionParams =
            serde_json::from_str(r#"{"volume_threshold": 50}"#).unwrap();
        assert_eq!(params.volume_threshold, 50);
        assert_eq!(params.silence_padding_ms, 500);
    }
}
