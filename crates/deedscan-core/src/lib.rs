#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]

pub mod address;
pub mod config;
pub mod corpus;
pub mod error;
pub mod metrics;
pub mod pipeline;
pub mod recognize;
pub mod synthesis;
pub mod training;

pub use address::{is_likely_address, normalize};
pub use config::Settings;
pub use corpus::{clean_text, load_address_list, load_directory, Document};
pub use error::{Error, Result};
pub use metrics::{evaluate, evaluate_corpus, evaluate_self_consistency, MetricsReport};
pub use pipeline::{AddressSet, CorpusExtraction, Extraction, ExtractionPipeline};
pub use recognize::{
    CompositeRecognizer, GazetteerRecognizer, ModelCard, PatternRecognizer, RecognizedSpan,
    Recognizer, RecognizerError, Span, ADDRESS_LABEL,
};
pub use synthesis::{Replacement, Synthesizer, Template, TrainableEntity, TrainingExample};
pub use training::{GazetteerTrainer, Trainer, TrainingConfig, TrainingRun};
