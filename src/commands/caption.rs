use crate::error::AppError;
use crate::models::caption_types::{ModelStatus, SessionView};
use crate::services::caption::session::{CaptionSession, SessionObserver};
use std::path::PathBuf;
use tauri::{AppHandle, Emitter, State};

pub const SESSION_CHANGED: &str = "session-changed";

/// Pushes every session snapshot to the webview.
pub struct EventObserver {
    app: AppHandle,
}

impl EventObserver {
    pub fn new(app: AppHandle) -> Self {
        Self { app }
    }
}

impl SessionObserver for EventObserver {
    fn on_change(&self, view: &SessionView) {
        if let Err(e) = self.app.emit(SESSION_CHANGED, view) {
            log::warn!("Failed to emit {}: {}", SESSION_CHANGED, e);
        }
    }
}

#[tauri::command]
pub fn get_session_view(session: State<'_, CaptionSession>) -> SessionView {
    session.view()
}

#[tauri::command]
pub fn get_model_status(session: State<'_, CaptionSession>) -> ModelStatus {
    session.model_status()
}

#[tauri::command]
pub async fn load_image_file(
    session: State<'_, CaptionSession>,
    path: PathBuf,
) -> Result<SessionView, AppError> {
    session.load_from_path(&path).await?;
    Ok(session.view())
}

#[tauri::command]
pub fn load_image_url(session: State<'_, CaptionSession>, url: String) -> Result<SessionView, AppError> {
    session.load_from_url(&url)?;
    Ok(session.view())
}

#[tauri::command]
pub fn load_demo_image(session: State<'_, CaptionSession>, key: String) -> SessionView {
    session.load_demo(&key);
    session.view()
}

#[tauri::command]
pub async fn generate_caption(session: State<'_, CaptionSession>) -> Result<SessionView, AppError> {
    session.generate_caption().await?;
    Ok(session.view())
}

#[tauri::command]
pub fn reset_preview(session: State<'_, CaptionSession>) -> SessionView {
    session.reset_preview();
    session.view()
}
