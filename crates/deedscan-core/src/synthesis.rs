//! Labelled training documents built by dropping known entity values into
//! carrier sentences.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::recognize::{CharCursor, Span, ADDRESS_LABEL};

/// Carrier sentences seen around property addresses in deed captions.
pub const DEFAULT_TEMPLATES: [&str; 8] = [
    "BEING KNOWN AS {ADDRESS}",
    "Premises Being: {ADDRESS}",
    "PROPERTY ADDRESS: {ADDRESS}",
    "Being known as {ADDRESS}",
    "Property Address: {ADDRESS}",
    "Located at {ADDRESS}",
    "Address: {ADDRESS}",
    "At {ADDRESS}",
];

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([A-Z][A-Z0-9_]*)\}").expect("placeholder pattern is valid"));

static TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z][A-Z0-9_]*$").expect("tag pattern is valid"));

#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("Template {template:?} uses tag {tag} which has no registered entity")]
    UnregisteredTag { template: String, tag: String },
    #[error("Entity tag registered twice: {0}")]
    DuplicateTag(String),
    #[error("Invalid entity tag {0:?}: expected upper-case letters, digits and underscores")]
    InvalidTag(String),
    #[error("No templates configured")]
    NoTemplates,
}

pub type SynthesisResult<T> = Result<T, SynthesisError>;

/// How a placeholder's text is produced.
#[derive(Debug, Clone)]
pub enum Replacement {
    /// The value passed to [`Synthesizer::synthesize`].
    Subject,
    Fixed(String),
    Generated(fn() -> String),
}

impl Replacement {
    fn resolve(&self, subject: &str) -> String {
        match self {
            Self::Subject => subject.to_string(),
            Self::Fixed(value) => value.clone(),
            Self::Generated(generate) => generate(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TrainableEntity {
    pub tag: String,
    pub replacement: Replacement,
}

impl TrainableEntity {
    #[must_use]
    pub fn new(tag: impl Into<String>, replacement: Replacement) -> Self {
        Self {
            tag: tag.into(),
            replacement,
        }
    }

    /// `ADDRESS` filled with the value being synthesized.
    #[must_use]
    pub fn address() -> Self {
        Self::new(ADDRESS_LABEL, Replacement::Subject)
    }
}

/// A carrier sentence with `{TAG}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template(String);

impl Template {
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Tags referenced by the template, in textual order.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        PLACEHOLDER
            .captures_iter(&self.0)
            .filter_map(|c| c.get(1))
            .map(|m| m.as_str())
    }

    #[must_use]
    pub fn defaults() -> Vec<Self> {
        DEFAULT_TEMPLATES.iter().map(|t| Self::new(*t)).collect()
    }

    /// One template per non-blank line.
    #[must_use]
    pub fn from_lines(content: &str) -> Vec<Self> {
        content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(Self::new)
            .collect()
    }
}

/// A document and the labelled spans inside it.
///
/// Serializes as `[text, {"entities": [[start, end, tag], ...]}]`, the
/// shape NER training tools consume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(String, Annotations)", into = "(String, Annotations)")]
pub struct TrainingExample {
    pub text: String,
    pub spans: Vec<Span>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Annotations {
    pub entities: Vec<Span>,
}

impl From<(String, Annotations)> for TrainingExample {
    fn from((text, annotations): (String, Annotations)) -> Self {
        Self {
            text,
            spans: annotations.entities,
        }
    }
}

impl From<TrainingExample> for (String, Annotations) {
    fn from(example: TrainingExample) -> Self {
        (
            example.text,
            Annotations {
                entities: example.spans,
            },
        )
    }
}

impl TrainingExample {
    /// Covered text of each span, `None` for a span that does not fit.
    pub fn span_texts(&self) -> impl Iterator<Item = (Option<&str>, &str)> {
        self.spans
            .iter()
            .map(|span| (span.slice(&self.text), span.label.as_str()))
    }

    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        self.spans.iter().all(|span| span.is_valid_for(&self.text))
    }
}

/// Where each substituted value lands in the output text.
///
/// Offsets are tracked as two running totals in chars, what earlier
/// substitutions inserted and what their placeholders removed, and applied
/// to each later placeholder's template position. Nothing is ever searched
/// for in the output, so a value that also occurs elsewhere in the sentence
/// cannot be mislocated.
#[derive(Debug, Default)]
struct OffsetAccumulator {
    inserted: usize,
    removed: usize,
}

impl OffsetAccumulator {
    /// Output position of a placeholder found at `template_start`, then
    /// records its substitution.
    fn place(&mut self, template_start: usize, placeholder_len: usize, value_len: usize) -> usize {
        let start = template_start + self.inserted - self.removed;
        self.inserted += value_len;
        self.removed += placeholder_len;
        start
    }
}

/// Turns one value into one labelled example per template.
#[derive(Debug, Clone)]
pub struct Synthesizer {
    templates: Vec<Template>,
    entities: BTreeMap<String, Replacement>,
}

impl Synthesizer {
    /// Fails if any template references a tag with no entity, so a broken
    /// configuration is caught before a single example is built.
    pub fn new(entities: Vec<TrainableEntity>, templates: Vec<Template>) -> SynthesisResult<Self> {
        if templates.is_empty() {
            return Err(SynthesisError::NoTemplates);
        }

        let mut registered = BTreeMap::new();
        for entity in entities {
            if !TAG.is_match(&entity.tag) {
                return Err(SynthesisError::InvalidTag(entity.tag));
            }
            if registered.contains_key(&entity.tag) {
                return Err(SynthesisError::DuplicateTag(entity.tag));
            }
            registered.insert(entity.tag, entity.replacement);
        }

        for template in &templates {
            if let Some(tag) = template.tags().find(|tag| !registered.contains_key(*tag)) {
                return Err(SynthesisError::UnregisteredTag {
                    template: template.as_str().to_string(),
                    tag: tag.to_string(),
                });
            }
        }

        Ok(Self {
            templates,
            entities: registered,
        })
    }

    /// Default templates with `ADDRESS` as the only entity.
    pub fn for_addresses() -> SynthesisResult<Self> {
        Self::new(vec![TrainableEntity::address()], Template::defaults())
    }

    #[must_use]
    pub fn templates(&self) -> &[Template] {
        &self.templates
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.entities.keys().map(String::as_str)
    }

    /// Exactly one example per template. Every placeholder in a template
    /// contributes one span to that template's example.
    #[must_use]
    pub fn synthesize(&self, subject: &str) -> Vec<TrainingExample> {
        self.templates
            .iter()
            .map(|template| self.fill(template, subject))
            .collect()
    }

    fn fill(&self, template: &Template, subject: &str) -> TrainingExample {
        let source = template.as_str();
        let mut text = String::with_capacity(source.len() + subject.len());
        let mut spans = Vec::new();
        let mut offsets = OffsetAccumulator::default();
        let mut cursor = CharCursor::new(source);
        let mut copied_until = 0;

        for captures in PLACEHOLDER.captures_iter(source) {
            let (Some(whole), Some(tag)) = (captures.get(0), captures.get(1)) else {
                continue;
            };
            let Some(replacement) = self.entities.get(tag.as_str()) else {
                continue;
            };

            let value = replacement.resolve(subject);
            let value_len = value.chars().count();
            let template_start = cursor.advance_to(whole.start());
            let placeholder_len = cursor.advance_to(whole.end()) - template_start;

            let start = offsets.place(template_start, placeholder_len, value_len);
            if value_len > 0 {
                spans.push(Span::new(start, start + value_len, tag.as_str()));
            }

            text.push_str(&source[copied_until..whole.start()]);
            text.push_str(&value);
            copied_until = whole.end();
        }
        text.push_str(&source[copied_until..]);

        TrainingExample { text, spans }
    }
}

/// Examples for every value in `subjects`, in order.
pub fn synthesize_all<'a, I>(synthesizer: &Synthesizer, subjects: I) -> Vec<TrainingExample>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut examples = Vec::new();
    for subject in subjects {
        let batch = synthesizer.synthesize(subject);
        tracing::debug!(subject, examples = batch.len(), "Synthesized examples");
        examples.extend(batch);
    }
    examples
}

/// Pretty-printed JSON list of examples in the export shape.
pub fn to_json(examples: &[TrainingExample]) -> crate::Result<String> {
    Ok(serde_json::to_string_pretty(examples)?)
}
