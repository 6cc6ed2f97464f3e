use serde::{Deserialize, Serialize};

/// The active image: a `data:` URI for local files or a remote URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageSource(String);

impl ImageSource {
    pub fn new(src: impl Into<String>) -> Self {
        Self(src.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_data_uri(&self) -> bool {
        self.0.starts_with("data:")
    }
}

/// A local file handed over by the picker or a drop.
#[derive(Debug, Clone)]
pub struct ImageFile {
    pub name: String,
    pub media_type: String,
    pub bytes: Vec<u8>,
}

impl ImageFile {
    pub fn new(name: impl Into<String>, media_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            bytes,
        }
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Prediction {
    pub label: String,
    pub probability: f32,
}

impl Prediction {
    pub fn new(label: impl Into<String>, probability: f32) -> Self {
        Self {
            label: label.into(),
            probability,
        }
    }
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct HistoryEntry {
    pub caption: String,
    pub predictions: Vec<Prediction>,
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StatusVariant {
    Info,
    Success,
    Error,
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct SessionStatus {
    pub message: String,
    pub variant: StatusVariant,
}

impl SessionStatus {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            variant: StatusVariant::Info,
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            variant: StatusVariant::Success,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            variant: StatusVariant::Error,
        }
    }
}

/// Whole-percent confidence shown by the readout and the bar.
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq, Default)]
pub struct Confidence {
    pub percent: u8,
}

/// Everything the UI needs to render one frame of the session.
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub image: Option<ImageSource>,
    pub url_input: String,
    pub caption_enabled: bool,
    pub busy: bool,
    pub caption: String,
    pub confidence: Confidence,
    pub status: SessionStatus,
    pub history: Vec<HistoryEntry>,
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct ModelStatus {
    pub available: bool,
    pub loading: bool,
    pub ready: bool,
    pub error: Option<String>,
}
