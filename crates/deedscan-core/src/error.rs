use thiserror::Error;

use crate::corpus::CorpusError;
use crate::recognize::{ModelError, RecognizerError};
use crate::synthesis::SynthesisError;
use crate::training::TrainingError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Recognizer error: {0}")]
    Recognizer(#[from] RecognizerError),

    #[error("Synthesis error: {0}")]
    Synthesis(#[from] SynthesisError),

    #[error("Training error: {0}")]
    Training(#[from] TrainingError),

    #[error("Corpus error: {0}")]
    Corpus(#[from] CorpusError),

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
