//! Engine configuration.

/// Pipeline engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Capacity of the per-session progress broadcast channel
    pub progress_capacity: usize,
    /// Transcription language used when the caller does not pick one
    pub default_language: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            progress_capacity: 256,
            default_language: "english".to_string(),
        }
    }
}

impl EngineConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            progress_capacity: std::env::var("ENGINE_PROGRESS_CAPACITY")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(256),
            default_language: std::env::var("ENGINE_DEFAULT_LANGUAGE")
                .unwrap_or_else(|_| "english".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.progress_capacity, 256);
        assert_eq!(config.default_language, "english");
    }
}
