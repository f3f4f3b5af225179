use std::collections::BTreeSet;

use crate::address::{is_likely_address, normalize};
use crate::corpus::{csv_field, Document};
use crate::recognize::{Recognizer, RecognizerError, RecognizerResult};

/// Normalized addresses found in one document. Ordered only so output is
/// stable; membership is what matters.
pub type AddressSet = BTreeSet<String>;

/// Everything one `extract` call saw, not just the final set.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    /// Raw text of every `ADDRESS` span the recognizer returned, in order,
    /// duplicates kept.
    pub candidates: Vec<String>,
    /// Candidates dropped by the shape check.
    pub rejected: usize,
    /// Set when recognition failed and the text was treated as empty.
    pub degraded: bool,
    pub addresses: AddressSet,
}

#[derive(Debug, Clone, Default)]
pub struct ExtractionStats {
    pub documents: usize,
    pub words: usize,
    pub lines: usize,
    pub candidates: usize,
    pub rejected: usize,
    pub addresses: usize,
    pub degraded: usize,
}

/// Per-document results for a whole corpus, plus the two corpus-wide pools
/// evaluation works from.
#[derive(Debug, Clone, Default)]
pub struct CorpusExtraction {
    pub documents: Vec<(String, AddressSet)>,
    /// Every raw recognizer hit across the corpus, duplicates kept.
    pub raw_pool: Vec<String>,
    pub stats: ExtractionStats,
}

impl CorpusExtraction {
    /// Per-document sets concatenated in document order. An address found
    /// in two documents appears twice.
    #[must_use]
    pub fn address_pool(&self) -> Vec<String> {
        self.documents
            .iter()
            .flat_map(|(_, addresses)| addresses.iter().cloned())
            .collect()
    }

    /// `Filename,Address` table with one row per extracted address.
    #[must_use]
    pub fn to_csv(&self) -> String {
        let mut out = String::from("Filename,Address\n");
        for (id, address) in self.rows() {
            out.push_str(&csv_field(id));
            out.push(',');
            out.push_str(&csv_field(address));
            out.push('\n');
        }
        out
    }

    /// `(document id, address)` pairs, one per extracted address.
    pub fn rows(&self) -> impl Iterator<Item = (&str, &str)> {
        self.documents.iter().flat_map(|(id, addresses)| {
            addresses
                .iter()
                .map(move |address| (id.as_str(), address.as_str()))
        })
    }
}

/// Recognizer, then shape check, then normalization, then dedup.
///
/// The recognizer is injected and only ever borrowed immutably, so one
/// pipeline can serve many documents, or several threads.
pub struct ExtractionPipeline<R> {
    recognizer: R,
}

impl<R: Recognizer> ExtractionPipeline<R> {
    pub const fn new(recognizer: R) -> Self {
        Self { recognizer }
    }

    pub const fn recognizer(&self) -> &R {
        &self.recognizer
    }

    /// Normalized, validated addresses in `text`.
    ///
    /// Per-text recognition failures degrade to an empty result. Only an
    /// unavailable recognizer is reported as an error.
    pub fn extract(&self, text: &str) -> RecognizerResult<AddressSet> {
        self.extract_detailed(text).map(|extraction| extraction.addresses)
    }

    pub fn extract_detailed(&self, text: &str) -> RecognizerResult<Extraction> {
        let mut extraction = Extraction::default();

        let spans = match self.recognizer.recognize(text) {
            Ok(spans) => spans,
            Err(RecognizerError::Failed(reason)) => {
                tracing::warn!(
                    recognizer = self.recognizer.name(),
                    "Recognition failed, treating as no spans: {}",
                    reason
                );
                extraction.degraded = true;
                Vec::new()
            }
            Err(e) => return Err(e),
        };

        for hit in spans.into_iter().filter(|s| s.is_address()) {
            if is_likely_address(&hit.text) {
                let address = normalize(&hit.text);
                if !address.is_empty() {
                    extraction.addresses.insert(address);
                }
            } else {
                tracing::debug!(candidate = %hit.text, "Rejected candidate");
                extraction.rejected += 1;
            }
            extraction.candidates.push(hit.text);
        }

        Ok(extraction)
    }

    /// Runs every document through the pipeline. Stops at the first
    /// unavailable-recognizer error, since no later document could succeed.
    pub fn extract_corpus<'a, I>(&self, documents: I) -> RecognizerResult<CorpusExtraction>
    where
        I: IntoIterator<Item = &'a Document>,
    {
        let mut corpus = CorpusExtraction::default();

        for document in documents {
            let extraction = self.extract_detailed(&document.text)?;

            corpus.stats.documents += 1;
            corpus.stats.words += document.word_count();
            corpus.stats.lines += document.line_count();
            corpus.stats.degraded += usize::from(extraction.degraded);
            corpus.stats.candidates += extraction.candidates.len();
            corpus.stats.rejected += extraction.rejected;
            corpus.stats.addresses += extraction.addresses.len();

            corpus.raw_pool.extend(extraction.candidates);
            corpus
                .documents
                .push((document.id.clone(), extraction.addresses));

            tracing::info!("Processed: {}", document.id);
        }

        Ok(corpus)
    }
}
