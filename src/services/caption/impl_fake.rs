use crate::models::caption_types::{ImageSource, Prediction};
use crate::services::caption::model_manager::{BackendError, ClassifierBackend, ImageModel};
use futures::future::BoxFuture;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

const DEMO_LABELS: [&str; 8] = [
    "golden retriever",
    "pizza, pizza pie",
    "alp",
    "tabby, tabby cat",
    "espresso",
    "lakeside, lakeshore",
    "orange",
    "seashore, coast, seacoast, sea-coast",
];

/// In-process classifier with canned answers. Counts loads and classify calls.
#[derive(Clone, Default)]
pub struct FakeClassifier {
    predictions: Option<Vec<Prediction>>,
    fail_load: Option<String>,
    fail_classify: Option<String>,
    loads: Arc<AtomicUsize>,
    classifications: Arc<AtomicUsize>,
}

impl FakeClassifier {
    /// Always answers with `predictions`.
    pub fn new(predictions: Vec<Prediction>) -> Self {
        Self {
            predictions: Some(predictions),
            ..Self::default()
        }
    }

    /// Picks three labels from a fixed list based on the image source.
    pub fn demo() -> Self {
        Self::default()
    }

    pub fn failing_load(message: impl Into<String>) -> Self {
        Self {
            fail_load: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn failing_classify(message: impl Into<String>) -> Self {
        Self {
            fail_classify: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub fn classify_count(&self) -> usize {
        self.classifications.load(Ordering::SeqCst)
    }
}

impl ClassifierBackend for FakeClassifier {
    fn load(&self) -> BoxFuture<'_, Result<Arc<dyn ImageModel>, BackendError>> {
        Box::pin(async move {
            self.loads.fetch_add(1, Ordering::SeqCst);
            if let Some(message) = &self.fail_load {
                return Err(BackendError::from(message.clone()));
            }
            let model: Arc<dyn ImageModel> = Arc::new(FakeModel {
                predictions: self.predictions.clone(),
                fail_classify: self.fail_classify.clone(),
                classifications: Arc::clone(&self.classifications),
            });
            Ok(model)
        })
    }
}

struct FakeModel {
    predictions: Option<Vec<Prediction>>,
    fail_classify: Option<String>,
    classifications: Arc<AtomicUsize>,
}

impl ImageModel for FakeModel {
    fn classify<'a>(
        &'a self,
        image: &'a ImageSource,
    ) -> BoxFuture<'a, Result<Vec<Prediction>, BackendError>> {
        Box::pin(async move {
            self.classifications.fetch_add(1, Ordering::SeqCst);
            if let Some(message) = &self.fail_classify {
                return Err(BackendError::from(message.clone()));
            }
            Ok(match &self.predictions {
                Some(predictions) => predictions.clone(),
                None => demo_predictions(image),
            })
        })
    }
}

fn demo_predictions(image: &ImageSource) -> Vec<Prediction> {
    let seed = image
        .as_str()
        .bytes()
        .fold(0usize, |acc, b| acc.wrapping_mul(31).wrapping_add(b as usize));
    [0.62f32, 0.21, 0.08]
        .iter()
        .enumerate()
        .map(|(i, probability)| {
            Prediction::new(DEMO_LABELS[seed.wrapping_add(i) % DEMO_LABELS.len()], *probability)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn demo_answers_are_stable_per_image() {
        let fake = FakeClassifier::demo();
        let model = fake.load().await.unwrap();
        let image = ImageSource::new("https://example.com/cat.jpg");

        let first = model.classify(&image).await.unwrap();
        let second = model.classify(&image).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.len(), 3);
        assert!(first.windows(2).all(|w| w[0].probability >= w[1].probability));
        assert_eq!(fake.load_count(), 1);
        assert_eq!(fake.classify_count(), 2);
    }

    #[tokio::test]
    async fn failures_surface_their_message() {
        let err = FakeClassifier::failing_load("no weights").load().await.err().unwrap();
        assert_eq!(err.to_string(), "no weights");

        let fake = FakeClassifier::failing_classify("decode failed");
        let model = fake.load().await.unwrap();
        let err = model.classify(&ImageSource::new("x")).await.unwrap_err();
        assert_eq!(err.to_string(), "decode failed");
    }
}
