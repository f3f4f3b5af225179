use super::{RecognizedSpan, Recognizer, RecognizerResult};

/// Runs several recognizers over the same text and concatenates their
/// spans. The first failing member fails the whole call.
pub struct CompositeRecognizer {
    recognizers: Vec<Box<dyn Recognizer>>,
}

impl CompositeRecognizer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            recognizers: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_recognizer(mut self, recognizer: Box<dyn Recognizer>) -> Self {
        self.recognizers.push(recognizer);
        self
    }

    pub fn add_recognizer(&mut self, recognizer: Box<dyn Recognizer>) {
        self.recognizers.push(recognizer);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.recognizers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.recognizers.is_empty()
    }
}

impl Default for CompositeRecognizer {
    fn default() -> Self {
        Self::new().with_recognizer(Box::new(super::PatternRecognizer::with_default_patterns()))
    }
}

impl Recognizer for CompositeRecognizer {
    fn name(&self) -> &'static str {
        "composite"
    }

    fn recognize(&self, text: &str) -> RecognizerResult<Vec<RecognizedSpan>> {
        let mut combined = Vec::new();

        for recognizer in &self.recognizers {
            let spans = recognizer.recognize(text)?;
            tracing::debug!(recognizer = recognizer.name(), spans = spans.len(), "recognized");
            combined.extend(spans);
        }

        Ok(combined)
    }
}
