use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const CONFIG_FILE_NAME: &str = "caption-studio.json";

const MAX_FILE_BYTES: u64 = 5 * 1024 * 1024;
const HISTORY_PREDICTIONS: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SessionConfig {
    pub max_file_bytes: u64,
    /// Predictions retained per history entry.
    pub history_predictions: usize,
    /// Yield to the scheduler before classifying so the disabled trigger can repaint.
    pub yield_before_classify: bool,
    pub use_fake_classifier: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_file_bytes: MAX_FILE_BYTES,
            history_predictions: HISTORY_PREDICTIONS,
            yield_before_classify: true,
            use_fake_classifier: false,
        }
    }
}

impl SessionConfig {
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let content = std::fs::read_to_string(path).map_err(|e| AppError {
            message: format!("Failed to read config file {}: {}", path.display(), e),
        })?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Ignoring config {}: {}", path.display(), e);
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_file(name: &str, content: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("caption-studio-{}-{}", std::process::id(), name));
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn defaults_match_upload_limits() {
        let config = SessionConfig::default();
        assert_eq!(config.max_file_bytes, 5_242_880);
        assert_eq!(config.history_predictions, 3);
        assert!(config.yield_before_classify);
        assert!(!config.use_fake_classifier);
    }

    #[test]
    fn partial_json_keeps_remaining_defaults() {
        let config: SessionConfig = serde_json::from_str(r#"{ "useFakeClassifier": true }"#).unwrap();
        assert!(config.use_fake_classifier);
        assert_eq!(config.max_file_bytes, MAX_FILE_BYTES);
    }

    #[test]
    fn load_reads_file() {
        let path = temp_file("load.json", r#"{ "maxFileBytes": 1024, "historyPredictions": 2 }"#);
        let config = SessionConfig::load(&path).unwrap();
        assert_eq!(config.max_file_bytes, 1024);
        assert_eq!(config.history_predictions, 2);
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn broken_file_falls_back_to_defaults() {
        let path = temp_file("broken.json", "{ not json");
        assert!(SessionConfig::load(&path).is_err());
        assert_eq!(SessionConfig::load_or_default(&path), SessionConfig::default());
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn missing_file_is_an_error_for_load() {
        let path = std::env::temp_dir().join("caption-studio-does-not-exist.json");
        let err = SessionConfig::load(&path).unwrap_err();
        assert!(err.message.starts_with("Failed to read config file"));
        assert_eq!(SessionConfig::load_or_default(&path), SessionConfig::default());
    }
}
