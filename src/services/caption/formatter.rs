use crate::models::caption_types::{Confidence, HistoryEntry, Prediction};

const VOWELS: [char; 5] = ['a', 'e', 'i', 'o', 'u'];

/// Upper bound on predictions kept per history entry, whatever the config asks for.
pub const MAX_HISTORY_PREDICTIONS: usize = 3;

/// Raw labels can be comma separated synonym lists; keep the first one.
pub fn primary_label(label: &str) -> &str {
    label.split(',').next().unwrap_or(label)
}

/// Naive "a"/"an" choice on the first letter. "an one" and "a hour" are known misses.
pub fn with_article(phrase: &str) -> String {
    let trimmed = phrase.trim();
    let starts_with_vowel = trimmed
        .chars()
        .next()
        .and_then(|c| c.to_lowercase().next())
        .map(|c| VOWELS.contains(&c))
        .unwrap_or(false);
    let article = if starts_with_vowel { "an" } else { "a" };
    format!("{} {}", article, trimmed)
}

/// Sentence built from the top one or two predictions. `None` for an empty result.
pub fn build_caption(predictions: &[Prediction]) -> Option<String> {
    let primary = predictions.first()?;
    let subject = with_article(primary_label(&primary.label));
    let caption = match predictions.get(1) {
        Some(secondary) => format!(
            "Looks like {} with hints of {}.",
            subject,
            primary_label(&secondary.label)
        ),
        None => format!("Looks like {}.", subject),
    };
    Some(caption)
}

impl Confidence {
    /// Widened to `f64` before scaling; an `f32` product can land on a spurious `.5`.
    pub fn from_probability(probability: f32) -> Self {
        let percent = (f64::from(probability) * 100.0).round().clamp(0.0, 100.0) as u8;
        Self { percent }
    }

    /// Numeric readout, e.g. `87%`.
    pub fn label(&self) -> String {
        format!("{}%", self.percent)
    }

    /// CSS width of the bar fill.
    pub fn bar_width(&self) -> String {
        format!("{}%", self.percent)
    }
}

impl HistoryEntry {
    pub fn new(caption: String, predictions: &[Prediction], keep: usize) -> Self {
        Self {
            caption,
            predictions: predictions
                .iter()
                .take(keep.min(MAX_HISTORY_PREDICTIONS))
                .cloned()
                .collect(),
        }
    }

    /// One line per entry, e.g. `apple (90%) • banana (50%)`.
    pub fn summary(&self) -> String {
        self.predictions
            .iter()
            .map(|p| {
                format!(
                    "{} ({})",
                    primary_label(&p.label),
                    Confidence::from_probability(p.probability).label()
                )
            })
            .collect::<Vec<_>>()
            .join(" • ")
    }
}
