use crate::error::CaptionError;
use crate::models::caption_types::{ImageSource, ModelStatus, Prediction};
use futures::future::BoxFuture;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::Mutex;

pub type BackendError = Box<dyn std::error::Error + Send + Sync>;

/// The classification capability provided by the host environment.
pub trait ClassifierBackend: Send + Sync {
    fn load(&self) -> BoxFuture<'_, Result<Arc<dyn ImageModel>, BackendError>>;
}

/// A loaded model. Predictions come back ordered by descending probability.
pub trait ImageModel: Send + Sync {
    fn classify<'a>(
        &'a self,
        image: &'a ImageSource,
    ) -> BoxFuture<'a, Result<Vec<Prediction>, BackendError>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadEvent {
    Loading,
    Ready,
}

#[derive(Clone, Default)]
pub struct ModelManager {
    backend: Arc<RwLock<Option<Arc<dyn ClassifierBackend>>>>,
    model: Arc<Mutex<Option<Arc<dyn ImageModel>>>>,
    loading: Arc<AtomicBool>,
    error: Arc<std::sync::Mutex<Option<String>>>,
}

impl ModelManager {
    pub fn new(backend: Option<Arc<dyn ClassifierBackend>>) -> Self {
        let manager = Self::default();
        if let Some(backend) = backend {
            manager.set_backend(backend);
        }
        manager
    }

    pub fn set_backend(&self, backend: Arc<dyn ClassifierBackend>) {
        *self.backend.write().unwrap_or_else(PoisonError::into_inner) = Some(backend);
    }

    fn backend(&self) -> Option<Arc<dyn ClassifierBackend>> {
        self.backend
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_available(&self) -> bool {
        self.backend().is_some()
    }

    /// False while a load holds the slot.
    pub fn is_ready(&self) -> bool {
        self.model
            .try_lock()
            .map(|slot| slot.is_some())
            .unwrap_or(false)
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::Acquire)
    }

    pub fn get_error(&self) -> Option<String> {
        self.error.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn set_error(&self, error: Option<String>) {
        *self.error.lock().unwrap_or_else(PoisonError::into_inner) = error;
    }

    pub fn status(&self) -> ModelStatus {
        ModelStatus {
            available: self.is_available(),
            loading: self.is_loading(),
            ready: self.is_ready(),
            error: self.get_error(),
        }
    }

    /// Returns the loaded model, loading it on first use. The slot stays locked for
    /// the whole load so concurrent callers share a single load. A failed load
    /// leaves the slot empty.
    pub async fn ensure_model<F>(&self, mut on_event: F) -> Result<Arc<dyn ImageModel>, CaptionError>
    where
        F: FnMut(LoadEvent) + Send,
    {
        let mut slot = self.model.lock().await;
        if let Some(model) = slot.as_ref() {
            return Ok(Arc::clone(model));
        }

        let backend = self.backend().ok_or(CaptionError::ModelUnavailable)?;

        on_event(LoadEvent::Loading);
        self.loading.store(true, Ordering::Release);
        self.set_error(None);

        let result = backend.load().await;
        self.loading.store(false, Ordering::Release);

        match result {
            Ok(model) => {
                *slot = Some(Arc::clone(&model));
                drop(slot);
                log::info!("Image classifier loaded");
                on_event(LoadEvent::Ready);
                Ok(model)
            }
            Err(e) => {
                let message = e.to_string();
                log::error!("Failed to load image classifier: {}", message);
                self.set_error(Some(message.clone()));
                Err(CaptionError::ModelLoadFailure(message))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::caption::impl_fake::FakeClassifier;
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::Notify;

    /// Holds `load` open until the test opens the gate.
    struct GatedBackend {
        gate: Arc<Notify>,
        calls: Arc<AtomicUsize>,
        inner: FakeClassifier,
    }

    impl ClassifierBackend for GatedBackend {
        fn load(&self) -> BoxFuture<'_, Result<Arc<dyn ImageModel>, BackendError>> {
            Box::pin(async move {
                self.calls.fetch_add(1, Ordering::SeqCst);
                self.gate.notified().await;
                self.inner.load().await
            })
        }
    }

    fn manager_with(fake: &FakeClassifier) -> ModelManager {
        ModelManager::new(Some(Arc::new(fake.clone())))
    }

    #[tokio::test]
    async fn loads_once_and_memoizes() {
        let fake = FakeClassifier::new(vec![Prediction::new("dog", 0.8)]);
        let manager = manager_with(&fake);
        let mut events = Vec::new();

        let first = manager.ensure_model(|e| events.push(e)).await.unwrap();
        let second = manager.ensure_model(|e| events.push(e)).await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(fake.load_count(), 1);
        assert_eq!(events, vec![LoadEvent::Loading, LoadEvent::Ready]);
        assert!(manager.is_ready());
    }

    #[tokio::test]
    async fn missing_backend_is_unavailable_and_retryable() {
        let manager = ModelManager::new(None);
        let mut events = Vec::new();

        let err = manager.ensure_model(|e| events.push(e)).await.err();
        assert_eq!(err, Some(CaptionError::ModelUnavailable));
        assert!(events.is_empty());
        assert!(!manager.status().available);

        let fake = FakeClassifier::new(vec![Prediction::new("cat", 0.7)]);
        manager.set_backend(Arc::new(fake.clone()));
        assert!(manager.ensure_model(|_| {}).await.is_ok());
        assert_eq!(fake.load_count(), 1);
    }

    #[tokio::test]
    async fn failed_load_leaves_slot_empty() {
        let fake = FakeClassifier::failing_load("weights missing");
        let manager = manager_with(&fake);

        let err = manager.ensure_model(|_| {}).await.err();
        assert_eq!(err, Some(CaptionError::ModelLoadFailure("weights missing".into())));
        assert_eq!(
            manager.status(),
            ModelStatus {
                available: true,
                loading: false,
                ready: false,
                error: Some("weights missing".into()),
            }
        );

        let _ = manager.ensure_model(|_| {}).await;
        assert_eq!(fake.load_count(), 2);
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_load() {
        let fake = FakeClassifier::new(vec![Prediction::new("dog", 0.8)]);
        let gate = Arc::new(Notify::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let manager = ModelManager::new(Some(Arc::new(GatedBackend {
            gate: Arc::clone(&gate),
            calls: Arc::clone(&calls),
            inner: fake.clone(),
        })));

        let opener = async {
            while calls.load(Ordering::SeqCst) == 0 {
                tokio::task::yield_now().await;
            }
            assert!(manager.is_loading());
            assert!(!manager.is_ready());
            // Give the second caller a chance to queue on the slot.
            for _ in 0..3 {
                tokio::task::yield_now().await;
            }
            gate.notify_one();
        };
        let (first, second, ()) = tokio::join!(
            manager.ensure_model(|_| {}),
            manager.ensure_model(|_| {}),
            opener
        );

        let first = first.unwrap();
        let second = second.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(fake.load_count(), 1);
        assert!(manager.is_ready());
        assert!(!manager.is_loading());
    }
}
