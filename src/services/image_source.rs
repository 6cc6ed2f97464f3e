use crate::error::CaptionError;
use crate::models::caption_types::{ImageFile, ImageSource};
use base64::Engine;
use std::path::Path;

const FALLBACK_MEDIA_TYPE: &str = "application/octet-stream";

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DemoPreset {
    Scenic,
    Food,
    Pet,
}

impl DemoPreset {
    pub const ALL: [DemoPreset; 3] = [DemoPreset::Scenic, DemoPreset::Food, DemoPreset::Pet];

    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "scenic" => Some(DemoPreset::Scenic),
            "food" => Some(DemoPreset::Food),
            "pet" => Some(DemoPreset::Pet),
            _ => None,
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            DemoPreset::Scenic => "scenic",
            DemoPreset::Food => "food",
            DemoPreset::Pet => "pet",
        }
    }

    pub fn url(&self) -> &'static str {
        match self {
            DemoPreset::Scenic => {
                "https://images.unsplash.com/photo-1500530855697-b586d89ba3ee?auto=format&fit=crop&w=800&q=80"
            }
            DemoPreset::Food => {
                "https://images.unsplash.com/photo-1504674900247-0877df9cc836?auto=format&fit=crop&w=800&q=80"
            }
            DemoPreset::Pet => {
                "https://images.unsplash.com/photo-1517849845537-4d257902454a?auto=format&fit=crop&w=800&q=80"
            }
        }
    }
}

/// Checks the declared media type and size of an upload.
pub fn validate_upload(media_type: &str, size: u64, max_bytes: u64) -> Result<(), CaptionError> {
    if !media_type.starts_with("image/") {
        return Err(CaptionError::InvalidFileType);
    }
    if size > max_bytes {
        return Err(CaptionError::FileTooLarge {
            size,
            limit: max_bytes,
        });
    }
    Ok(())
}

/// Media type from the file extension, like a browser fills `File.type`.
pub fn media_type_for_path(path: &Path) -> String {
    image::ImageFormat::from_path(path)
        .map(|format| format.to_mime_type().to_string())
        .unwrap_or_else(|_| FALLBACK_MEDIA_TYPE.to_string())
}

pub fn file_name(path: &Path) -> String {
    path.file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string()
}

pub fn to_data_uri(media_type: &str, bytes: &[u8]) -> String {
    let b64 = base64::engine::general_purpose::STANDARD.encode(bytes);
    format!("data:{};base64,{}", media_type, b64)
}

/// Encodes the file off the async runtime.
pub async fn encode_file(file: ImageFile) -> Result<ImageSource, CaptionError> {
    let name = file.name.clone();
    tokio::task::spawn_blocking(move || ImageSource::new(to_data_uri(&file.media_type, &file.bytes)))
        .await
        .map_err(|e| CaptionError::FileReadFailure(format!("Failed to read {}: {}", name, e)))
}

pub async fn read_file(path: &Path, max_bytes: u64) -> Result<ImageFile, CaptionError> {
    let name = file_name(path);
    let metadata = tokio::fs::metadata(path)
        .await
        .map_err(|e| CaptionError::FileReadFailure(format!("Failed to read {}: {}", name, e)))?;

    let media_type = media_type_for_path(path);
    validate_upload(&media_type, metadata.len(), max_bytes)?;

    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| CaptionError::FileReadFailure(format!("Failed to read {}: {}", name, e)))?;

    Ok(ImageFile::new(name, media_type, bytes))
}
