use serde::Serialize;
use std::fmt;

pub const GENERIC_FAILURE: &str = "Something went wrong.";

/// Everything a session command can fail with. The `Display` text is what the
/// status line shows.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CaptionError {
    #[error("Please choose an image file.")]
    InvalidFileType,
    #[error("Image too large. Please stay under {}.", format_limit(*.limit))]
    FileTooLarge { size: u64, limit: u64 },
    #[error("Enter a valid image URL first.")]
    EmptyUrl,
    #[error("Image classifier is not available.")]
    ModelUnavailable,
    #[error("{0}")]
    ModelLoadFailure(String),
    #[error("{0}")]
    ClassificationFailure(String),
    #[error("Model returned no predictions.")]
    EmptyPrediction,
    #[error("Select an image first.")]
    NoImage,
    #[error("A caption is already being generated.")]
    Busy,
    #[error("{0}")]
    FileReadFailure(String),
}

/// Upload limit for messages, rounded up to whole MB, or KB below one MiB.
pub fn format_limit(bytes: u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = 1024 * 1024;
    if bytes >= MIB {
        format!("{} MB", bytes.div_ceil(MIB))
    } else {
        format!("{} KB", bytes.div_ceil(KIB).max(1))
    }
}

impl CaptionError {
    /// Status line text, falling back to a generic message when the underlying
    /// failure carried none.
    pub fn status_message(&self) -> String {
        let message = self.to_string();
        if message.trim().is_empty() {
            GENERIC_FAILURE.to_string()
        } else {
            message
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AppError {
    pub message: String,
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl From<CaptionError> for AppError {
    fn from(err: CaptionError) -> Self {
        AppError {
            message: err.status_message(),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError {
            message: err.to_string(),
        }
    }
}
