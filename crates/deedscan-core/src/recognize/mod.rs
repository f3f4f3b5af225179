mod composite;
mod gazetteer;
mod pattern;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use composite::CompositeRecognizer;
pub use gazetteer::{GazetteerRecognizer, ModelCard, ModelError, ModelResult};
pub use pattern::{PatternRecognizer, RecognitionPattern};

/// Label carried by address spans, both in recognizer output and in
/// synthesized training data.
pub const ADDRESS_LABEL: &str = "ADDRESS";

#[derive(Debug, Error)]
pub enum RecognizerError {
    /// The recognizer cannot serve any request (missing or untrained model).
    #[error("Recognizer unavailable: {0}")]
    Unavailable(String),
    /// Recognition of one particular text failed.
    #[error("Recognition failed: {0}")]
    Failed(String),
}

pub type RecognizerResult<T> = Result<T, RecognizerError>;

/// A labelled, half-open `[start, end)` range over a text buffer.
///
/// Offsets count `char`s, not bytes, so spans line up with what NER
/// training tools expect for non-ASCII text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "(usize, usize, String)", into = "(usize, usize, String)")]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub label: String,
}

impl Span {
    #[must_use]
    pub fn new(start: usize, end: usize, label: impl Into<String>) -> Self {
        Self {
            start,
            end,
            label: label.into(),
        }
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the span is non-empty and fits inside `text`.
    #[must_use]
    pub fn is_valid_for(&self, text: &str) -> bool {
        self.start < self.end && self.end <= text.chars().count()
    }

    /// The covered substring, or `None` when the span does not fit `text`.
    #[must_use]
    pub fn slice<'a>(&self, text: &'a str) -> Option<&'a str> {
        if self.start > self.end {
            return None;
        }
        let from = char_to_byte(text, self.start)?;
        let to = char_to_byte(text, self.end)?;
        text.get(from..to)
    }
}

impl From<(usize, usize, String)> for Span {
    fn from((start, end, label): (usize, usize, String)) -> Self {
        Self { start, end, label }
    }
}

impl From<Span> for (usize, usize, String) {
    fn from(span: Span) -> Self {
        (span.start, span.end, span.label)
    }
}

/// A span together with the text it covers, as returned by a recognizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognizedSpan {
    pub text: String,
    pub span: Span,
}

impl RecognizedSpan {
    #[must_use]
    pub fn new(text: impl Into<String>, span: Span) -> Self {
        Self {
            text: text.into(),
            span,
        }
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.span.label
    }

    #[must_use]
    pub fn is_address(&self) -> bool {
        self.span.label == ADDRESS_LABEL
    }
}

/// The entity-recognition capability the extraction pipeline consumes.
///
/// Implementations are shared read-only across `recognize` calls; nothing
/// about recognition may mutate the model.
pub trait Recognizer: Send + Sync {
    fn name(&self) -> &str;

    /// Candidate spans for `text`. Empty or arbitrarily long input must not
    /// fail on its own account.
    fn recognize(&self, text: &str) -> RecognizerResult<Vec<RecognizedSpan>>;
}

impl<R: Recognizer + ?Sized> Recognizer for Box<R> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn recognize(&self, text: &str) -> RecognizerResult<Vec<RecognizedSpan>> {
        (**self).recognize(text)
    }
}

/// Byte offset of the `index`-th char, allowing one-past-the-end.
fn char_to_byte(text: &str, index: usize) -> Option<usize> {
    text.char_indices()
        .map(|(byte, _)| byte)
        .chain(std::iter::once(text.len()))
        .nth(index)
}

/// Converts ascending byte offsets into char offsets without rescanning
/// the text from the start for every match.
pub(crate) struct CharCursor<'a> {
    text: &'a str,
    byte: usize,
    chars: usize,
}

impl<'a> CharCursor<'a> {
    pub(crate) const fn new(text: &'a str) -> Self {
        Self {
            text,
            byte: 0,
            chars: 0,
        }
    }

    /// Char offset of `byte`, which must lie on a char boundary at or after
    /// the previously requested offset.
    pub(crate) fn advance_to(&mut self, byte: usize) -> usize {
        if byte < self.byte {
            self.byte = 0;
            self.chars = 0;
        }
        self.chars += self.text[self.byte..byte].chars().count();
        self.byte = byte;
        self.chars
    }
}
