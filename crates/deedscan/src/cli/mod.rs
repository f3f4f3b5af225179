pub mod evaluate;
pub mod extract;
pub mod synthesize;
pub mod train;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};

use deedscan_core::synthesis::Template;
use deedscan_core::{
    load_directory, CompositeRecognizer, CorpusExtraction, Document, ExtractionPipeline,
    GazetteerRecognizer, PatternRecognizer, Recognizer, Settings,
};

#[derive(Parser)]
#[command(
    name = "deedscan",
    about = "Find, score and train address recognition in deed text",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write labelled training examples for a list of addresses as JSON
    Synthesize {
        /// File with one known address per line
        #[arg(long)]
        addresses: PathBuf,
        /// File with one template per line (defaults to the built-in set)
        #[arg(long)]
        templates: Option<PathBuf>,
        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Train an address model from a list of known addresses
    Train(TrainArgs),
    /// Extract addresses from every .txt document in a directory
    Extract {
        #[command(flatten)]
        corpus: CorpusArgs,
        /// CSV file to write (Filename,Address)
        #[arg(short, long)]
        output: PathBuf,
        #[command(flatten)]
        recognizer: RecognizerArgs,
    },
    /// Score extraction over a corpus and write overall metrics
    Evaluate {
        #[command(flatten)]
        corpus: CorpusArgs,
        /// File with one expected address per line; without it, raw
        /// recognizer output is scored against the cleaned output
        #[arg(long)]
        ground_truth: Option<PathBuf>,
        /// Directory for overall_metrics.csv and overall_metrics.json
        #[arg(long)]
        output_dir: PathBuf,
        #[command(flatten)]
        recognizer: RecognizerArgs,
    },
}

#[derive(Args)]
pub struct TrainArgs {
    /// File with one known address per line
    #[arg(long)]
    pub addresses: PathBuf,
    /// File with one template per line (defaults to the built-in set)
    #[arg(long)]
    pub templates: Option<PathBuf>,
    /// Model name; the model is saved as <model-dir>/<name>.json
    #[arg(long)]
    pub name: Option<String>,
    /// Directory to save the model in (defaults to DEEDSCAN_MODEL_DIR)
    #[arg(long)]
    pub model_dir: Option<PathBuf>,
    /// Model to continue training: "blank", a model name, or a path
    #[arg(long)]
    pub base: Option<String>,
    #[arg(long)]
    pub seed: Option<u64>,
    #[arg(long)]
    pub batch_size: Option<usize>,
    #[arg(long)]
    pub dropout: Option<f64>,
    /// Passes over the data (defaults to the number of addresses)
    #[arg(long)]
    pub passes: Option<usize>,
}

#[derive(Args)]
pub struct CorpusArgs {
    /// Directory of plain-text documents
    #[arg(short, long)]
    pub input: PathBuf,
    /// Collapse layout whitespace in each document before extraction
    #[arg(long)]
    pub clean_text: bool,
}

#[derive(Args)]
pub struct RecognizerArgs {
    /// Trained model: a path or a name under DEEDSCAN_MODEL_DIR.
    /// Without it the built-in address patterns are used.
    #[arg(short, long)]
    pub model: Option<String>,
    /// Also run the built-in address patterns alongside the model
    #[arg(long)]
    pub patterns: bool,
}

/// Builds the recognizer selected on the command line.
pub fn build_recognizer(settings: &Settings, args: &RecognizerArgs) -> Result<Box<dyn Recognizer>> {
    let Some(model) = args.model.as_deref() else {
        return Ok(Box::new(PatternRecognizer::with_default_patterns()));
    };

    let model = load_model(settings, model)?;
    tracing::info!("Loaded model {} ({} entries)", model.card().name, model.entry_count());

    if args.patterns {
        Ok(Box::new(
            CompositeRecognizer::new()
                .with_recognizer(Box::new(model))
                .with_recognizer(Box::new(PatternRecognizer::with_default_patterns())),
        ))
    } else {
        Ok(Box::new(model))
    }
}

/// Loads the corpus and runs it through a pipeline built from `recognizer`.
pub fn extract_corpus(
    settings: &Settings,
    corpus: &CorpusArgs,
    recognizer: &RecognizerArgs,
) -> Result<CorpusExtraction> {
    let pipeline = ExtractionPipeline::new(build_recognizer(settings, recognizer)?);

    let mut documents = load_directory(&corpus.input)?;
    if corpus.clean_text {
        documents = documents.into_iter().map(Document::cleaned).collect();
    }

    Ok(pipeline.extract_corpus(&documents)?)
}

/// Resolves `reference` as a file path first, then as a model name.
pub fn load_model(settings: &Settings, reference: &str) -> Result<GazetteerRecognizer> {
    let as_path = Path::new(reference);
    let path = if as_path.is_file() {
        as_path.to_path_buf()
    } else {
        let named = settings.model_path(reference);
        if !named.is_file() {
            bail!(
                "model not found: '{}' is neither a file nor a model in {}",
                reference,
                settings.model_dir.display()
            );
        }
        named
    };

    GazetteerRecognizer::load(&path)
        .with_context(|| format!("failed to load model from {}", path.display()))
}

pub fn load_templates(path: Option<&Path>) -> Result<Vec<Template>> {
    let Some(path) = path else {
        return Ok(Template::defaults());
    };
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read templates from {}", path.display()))?;
    let templates = Template::from_lines(&content);
    if templates.is_empty() {
        bail!("no templates in {}", path.display());
    }
    Ok(templates)
}

pub fn write_output(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))
}
