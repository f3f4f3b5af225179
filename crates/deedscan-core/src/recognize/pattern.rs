use regex::Regex;

use super::{CharCursor, RecognizedSpan, Recognizer, RecognizerResult, Span, ADDRESS_LABEL};

/// Street address as it tends to appear inline in deed captions: house
/// number, street words, city, region, five-digit postal code.
const DEFAULT_ADDRESS_PATTERN: &str = r"\b[0-9]{1,6}\s+[A-Za-z]+(?:[ \t]+[A-Za-z]+)+,?\s+[A-Za-z]+(?:[ \t]+[A-Za-z]+)*,\s+[A-Za-z]+(?:[ \t]+[A-Za-z]+)*,?\s+[0-9]{5}\b";

pub struct RecognitionPattern {
    pub label: String,
    pub regex: Regex,
}

impl RecognitionPattern {
    pub fn new(label: impl Into<String>, pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            label: label.into(),
            regex: Regex::new(pattern)?,
        })
    }
}

/// Rule-based stand-in for a trained model: every regex match becomes a
/// span carrying the pattern's label.
pub struct PatternRecognizer {
    patterns: Vec<RecognitionPattern>,
}

impl PatternRecognizer {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            patterns: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_pattern(mut self, pattern: RecognitionPattern) -> Self {
        self.patterns.push(pattern);
        self
    }

    #[must_use]
    pub fn with_default_patterns() -> Self {
        let mut recognizer = Self::new();

        if let Ok(p) = RecognitionPattern::new(ADDRESS_LABEL, DEFAULT_ADDRESS_PATTERN) {
            recognizer.patterns.push(p);
        }

        recognizer
    }

    #[must_use]
    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }
}

impl Default for PatternRecognizer {
    fn default() -> Self {
        Self::with_default_patterns()
    }
}

impl Recognizer for PatternRecognizer {
    fn name(&self) -> &'static str {
        "pattern"
    }

    fn recognize(&self, text: &str) -> RecognizerResult<Vec<RecognizedSpan>> {
        let mut spans = Vec::new();

        for pattern in &self.patterns {
            let mut cursor = CharCursor::new(text);
            for found in pattern.regex.find_iter(text) {
                let start = cursor.advance_to(found.start());
                let end = cursor.advance_to(found.end());
                if start == end {
                    continue;
                }
                spans.push(RecognizedSpan::new(
                    found.as_str(),
                    Span::new(start, end, pattern.label.clone()),
                ));
            }
        }

        Ok(spans)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_pattern_finds_inline_address() {
        let recognizer = PatternRecognizer::with_default_patterns();
        let text = "ALL THAT CERTAIN lot BEING KNOWN AS 123 Main Street, Springfield, IL, 62704. \
                    Grantor: Estate of Jane Roe.";

        let spans = recognizer.recognize(text).unwrap();

        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].text, "123 Main Street, Springfield, IL, 62704");
        assert!(spans[0].is_address());
        assert_eq!(spans[0].span.slice(text), Some(spans[0].text.as_str()));
    }

    #[test]
    fn test_offsets_are_char_based() {
        let recognizer = PatternRecognizer::with_default_patterns();
        let text = "Bien situé: 9 North Elm Avenue, Dover, DE, 19901";

        let spans = recognizer.recognize(text).unwrap();

        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].span.start, 12);
        assert_eq!(spans[0].span.slice(text), Some("9 North Elm Avenue, Dover, DE, 19901"));
    }

    #[test]
    fn test_custom_pattern_label() {
        let recognizer = PatternRecognizer::new().with_pattern(
            RecognitionPattern::new("PARCEL", r"Parcel No\. [0-9-]+").unwrap(),
        );

        let spans = recognizer.recognize("Tax Parcel No. 12-34-567 recorded").unwrap();

        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].label(), "PARCEL");
        assert!(!spans[0].is_address());
    }

    #[test]
    fn test_empty_text() {
        let recognizer = PatternRecognizer::default();
        assert!(recognizer.recognize("").unwrap().is_empty());
        assert_eq!(recognizer.pattern_count(), 1);
    }
}
