use std::path::Path;

use anyhow::Result;

use deedscan_core::Settings;

use super::{extract_corpus, write_output, CorpusArgs, RecognizerArgs};

pub fn run(
    settings: &Settings,
    input: &CorpusArgs,
    output: &Path,
    recognizer: &RecognizerArgs,
) -> Result<()> {
    let corpus = extract_corpus(settings, input, recognizer)?;

    write_output(output, &corpus.to_csv())?;

    eprintln!(
        "Processed {} files and saved results to {}",
        corpus.stats.documents,
        output.display()
    );
    eprintln!(
        "  Words: {}, lines: {}",
        corpus.stats.words, corpus.stats.lines
    );
    eprintln!(
        "  Candidates: {}, rejected: {}, addresses: {}",
        corpus.stats.candidates, corpus.stats.rejected, corpus.stats.addresses
    );
    if corpus.stats.degraded > 0 {
        eprintln!("  Recognition failed on {} files", corpus.stats.degraded);
    }

    Ok(())
}
