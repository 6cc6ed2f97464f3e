use crate::config::SessionConfig;
use crate::error::CaptionError;
use crate::models::caption_types::{
    Confidence, HistoryEntry, ImageFile, ImageSource, ModelStatus, SessionStatus, SessionView,
};
use crate::services::caption::formatter::build_caption;
use crate::services::caption::model_manager::{ClassifierBackend, ImageModel, LoadEvent, ModelManager};
use crate::services::image_source::{self, DemoPreset};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

pub const PLACEHOLDER_CAPTION: &str = "Waiting for your image…";
pub const READY_CAPTION: &str = "Image ready. Generate a caption when you are.";

const WELCOME: &str = "Drop an image, paste a URL or pick a demo to get started.";
const MODEL_LOADING: &str = "Loading image classifier… this can take a few seconds.";
const MODEL_READY: &str = "Model loaded. Ready when you are!";
const ANALYZING: &str = "Analyzing image…";
const CAPTION_READY: &str = "Caption ready!";

/// Receives a fresh snapshot after every state change.
pub trait SessionObserver: Send + Sync {
    fn on_change(&self, view: &SessionView);
}

struct SessionState {
    image: Option<ImageSource>,
    url_input: String,
    caption: String,
    confidence: Confidence,
    status: SessionStatus,
    history: Vec<HistoryEntry>,
}

impl SessionState {
    fn snapshot(&self, busy: bool) -> SessionView {
        SessionView {
            image: self.image.clone(),
            url_input: self.url_input.clone(),
            caption_enabled: self.image.is_some() && !busy,
            busy,
            caption: self.caption.clone(),
            confidence: self.confidence,
            status: self.status.clone(),
            history: self.history.clone(),
        }
    }
}

/// Clears the busy flag on every exit path of a caption run.
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// One preview image, its caption and the session's history.
///
/// Clones share the same session. State lives behind a mutex that is never held
/// across an `.await`.
#[derive(Clone)]
pub struct CaptionSession {
    config: Arc<SessionConfig>,
    models: ModelManager,
    state: Arc<Mutex<SessionState>>,
    busy: Arc<AtomicBool>,
    observer: Option<Arc<dyn SessionObserver>>,
}

impl CaptionSession {
    pub fn new(config: SessionConfig) -> Self {
        let session = Self {
            config: Arc::new(config),
            models: ModelManager::new(None),
            state: Arc::new(Mutex::new(SessionState {
                image: None,
                url_input: String::new(),
                caption: String::new(),
                confidence: Confidence::default(),
                status: SessionStatus::info(WELCOME),
                history: Vec::new(),
            })),
            busy: Arc::new(AtomicBool::new(false)),
            observer: None,
        };
        session.reset_preview();
        session
    }

    pub fn with_backend(self, backend: Arc<dyn ClassifierBackend>) -> Self {
        self.models.set_backend(backend);
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn SessionObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Installs the classification capability. A later `ensure_model` picks it up.
    pub fn set_backend(&self, backend: Arc<dyn ClassifierBackend>) {
        self.models.set_backend(backend);
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn view(&self) -> SessionView {
        self.lock().snapshot(self.busy.load(Ordering::Acquire))
    }

    pub fn model_status(&self) -> ModelStatus {
        self.models.status()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn update<R>(&self, f: impl FnOnce(&mut SessionState) -> R) -> R {
        let (result, view) = {
            let mut state = self.lock();
            let result = f(&mut state);
            (result, state.snapshot(self.busy.load(Ordering::Acquire)))
        };
        if let Some(observer) = &self.observer {
            observer.on_change(&view);
        }
        result
    }

    fn set_status(&self, status: SessionStatus) {
        self.update(|state| state.status = status);
    }

    fn fail(&self, err: CaptionError) -> CaptionError {
        log::warn!("{}", err);
        self.set_status(SessionStatus::error(err.status_message()));
        err
    }

    pub async fn load_from_file(&self, file: ImageFile) -> Result<ImageSource, CaptionError> {
        if let Err(err) =
            image_source::validate_upload(&file.media_type, file.size(), self.config.max_file_bytes)
        {
            return Err(self.fail(err));
        }
        let name = file.name.clone();
        let src = image_source::encode_file(file).await.map_err(|e| self.fail(e))?;
        self.set_active_image(src.clone(), format!("Loaded {}.", name));
        Ok(src)
    }

    /// Picker and drop entry point: validates from metadata before reading the bytes.
    pub async fn load_from_path(&self, path: &Path) -> Result<ImageSource, CaptionError> {
        let file = image_source::read_file(path, self.config.max_file_bytes)
            .await
            .map_err(|e| self.fail(e))?;
        self.load_from_file(file).await
    }

    pub fn load_from_url(&self, url_text: &str) -> Result<ImageSource, CaptionError> {
        let url = url_text.trim();
        if url.is_empty() {
            return Err(self.fail(CaptionError::EmptyUrl));
        }
        let src = ImageSource::new(url);
        self.activate(src.clone(), "Loaded image from URL.".into(), Some(url.to_string()));
        Ok(src)
    }

    /// Unknown keys are ignored without touching the status line.
    pub fn load_demo(&self, key: &str) -> Option<ImageSource> {
        let preset = DemoPreset::from_key(key)?;
        let src = ImageSource::new(preset.url());
        self.activate(
            src.clone(),
            format!("Loaded {} demo image.", preset.key()),
            Some(preset.url().to_string()),
        );
        Some(src)
    }

    pub fn set_active_image(&self, src: ImageSource, message: impl Into<String>) {
        self.activate(src, message.into(), None);
    }

    /// One update: observers see the URL box and the image change together.
    fn activate(&self, src: ImageSource, message: String, url_input: Option<String>) {
        log::info!(
            "Active image set ({})",
            if src.is_data_uri() { "data uri" } else { src.as_str() }
        );
        self.update(|state| {
            if let Some(url) = url_input {
                state.url_input = url;
            }
            state.image = Some(src);
            state.caption = READY_CAPTION.to_string();
            state.confidence = Confidence::default();
            state.status = SessionStatus::success(message);
        });
    }

    pub fn reset_preview(&self) {
        self.update(|state| {
            state.image = None;
            state.caption = PLACEHOLDER_CAPTION.to_string();
            state.confidence = Confidence::default();
        });
    }

    pub async fn ensure_model(&self) -> Result<Arc<dyn ImageModel>, CaptionError> {
        self.models
            .ensure_model(|event| match event {
                LoadEvent::Loading => self.set_status(SessionStatus::info(MODEL_LOADING)),
                LoadEvent::Ready => self.set_status(SessionStatus::success(MODEL_READY)),
            })
            .await
    }

    /// Classifies the active image and records the result. Failures land on the
    /// status line and are returned; the trigger is enabled again either way.
    pub async fn generate_caption(&self) -> Result<HistoryEntry, CaptionError> {
        let has_image = self.lock().image.is_some();
        if !has_image {
            return Err(self.fail(CaptionError::NoImage));
        }
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            log::debug!("Caption trigger ignored, a caption is already in flight");
            return Err(CaptionError::Busy);
        }
        let guard = BusyGuard(&self.busy);

        self.set_status(SessionStatus::info(ANALYZING));
        let result = self.caption_active_image().await;
        drop(guard);

        match result {
            Ok((entry, confidence)) => {
                self.update(|state| {
                    state.caption = entry.caption.clone();
                    state.confidence = confidence;
                    state.history.insert(0, entry.clone());
                    state.status = SessionStatus::success(CAPTION_READY);
                });
                Ok(entry)
            }
            Err(err) => {
                log::error!("Caption failed: {}", err);
                self.set_status(SessionStatus::error(err.status_message()));
                Err(err)
            }
        }
    }

    async fn caption_active_image(&self) -> Result<(HistoryEntry, Confidence), CaptionError> {
        let model = self.ensure_model().await?;
        if self.config.yield_before_classify {
            tokio::task::yield_now().await;
        }

        // The image may have been swapped while the model was loading.
        let image = self.lock().image.clone();
        let image = image.ok_or(CaptionError::NoImage)?;
        let predictions = model
            .classify(&image)
            .await
            .map_err(|e| CaptionError::ClassificationFailure(e.to_string()))?;

        let caption = build_caption(&predictions).ok_or(CaptionError::EmptyPrediction)?;
        let confidence = predictions
            .first()
            .map(|top| Confidence::from_probability(top.probability))
            .unwrap_or_default();
        let entry = HistoryEntry::new(caption, &predictions, self.config.history_predictions);
        Ok((entry, confidence))
    }
}
