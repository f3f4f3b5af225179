use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::{
    CharCursor, RecognizedSpan, Recognizer, RecognizerError, RecognizerResult, Span,
};

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type ModelResult<T> = Result<T, ModelError>;

/// Provenance stored alongside a trained model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelCard {
    pub id: Uuid,
    pub name: String,
    pub base_model: String,
    pub seed: u64,
    pub passes: usize,
    /// Loss recorded for each training pass, oldest first.
    #[serde(default)]
    pub losses: Vec<f64>,
    pub created_at: DateTime<Utc>,
}

impl ModelCard {
    #[must_use]
    pub fn new(name: impl Into<String>, base_model: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            name: name.into(),
            base_model: base_model.into(),
            seed: 0,
            passes: 0,
            losses: Vec::new(),
            created_at: Utc::now(),
        }
    }
}

/// Recognizer backed by the entity surface forms seen during training.
///
/// Matching is exact and case-sensitive; overlapping hits are resolved
/// leftmost-longest so a short known form never splits a longer one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GazetteerRecognizer {
    card: ModelCard,
    entries: BTreeMap<String, BTreeSet<String>>,
}

impl GazetteerRecognizer {
    #[must_use]
    pub const fn new(card: ModelCard) -> Self {
        Self {
            card,
            entries: BTreeMap::new(),
        }
    }

    #[must_use]
    pub const fn card(&self) -> &ModelCard {
        &self.card
    }

    pub fn card_mut(&mut self) -> &mut ModelCard {
        &mut self.card
    }

    /// Records `form` under `label`. Returns `true` if the form was new.
    /// Blank forms are ignored.
    pub fn insert(&mut self, label: &str, form: &str) -> bool {
        if form.trim().is_empty() {
            return false;
        }
        self.entries
            .entry(label.to_string())
            .or_default()
            .insert(form.to_string())
    }

    #[must_use]
    pub fn contains(&self, label: &str, form: &str) -> bool {
        self.entries
            .get(label)
            .is_some_and(|forms| forms.contains(form))
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.entries.values().map(BTreeSet::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entry_count() == 0
    }

    pub fn save(&self, path: &Path) -> ModelResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Reads a saved model. Blank forms, which could only come from a
    /// hand-edited file, are dropped.
    pub fn load(path: &Path) -> ModelResult<Self> {
        let json = std::fs::read_to_string(path)?;
        let mut model: Self = serde_json::from_str(&json)?;

        let before = model.entry_count();
        for forms in model.entries.values_mut() {
            forms.retain(|form| !form.trim().is_empty());
        }
        model.entries.retain(|_, forms| !forms.is_empty());
        if model.entry_count() < before {
            tracing::warn!(
                "Dropped {} blank forms from {}",
                before - model.entry_count(),
                path.display()
            );
        }

        Ok(model)
    }

    fn candidates<'a>(&'a self, text: &'a str) -> Vec<(usize, usize, &'a str)> {
        let mut found = Vec::new();
        for (label, forms) in &self.entries {
            for form in forms {
                for (start, matched) in text.match_indices(form.as_str()) {
                    found.push((start, start + matched.len(), label.as_str()));
                }
            }
        }
        found.sort_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)));
        found
    }
}

impl Recognizer for GazetteerRecognizer {
    fn name(&self) -> &str {
        &self.card.name
    }

    fn recognize(&self, text: &str) -> RecognizerResult<Vec<RecognizedSpan>> {
        if self.is_empty() {
            return Err(RecognizerError::Unavailable(format!(
                "model '{}' has no trained entries",
                self.card.name
            )));
        }

        let mut spans = Vec::new();
        let mut cursor = CharCursor::new(text);
        let mut covered_until = 0;

        for (start, end, label) in self.candidates(text) {
            if start < covered_until || start == end {
                continue;
            }
            covered_until = end;
            let char_start = cursor.advance_to(start);
            let char_end = cursor.advance_to(end);
            spans.push(RecognizedSpan::new(
                &text[start..end],
                Span::new(char_start, char_end, label),
            ));
        }

        Ok(spans)
    }
}
