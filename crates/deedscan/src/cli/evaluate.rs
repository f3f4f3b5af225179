use std::path::Path;

use anyhow::{Context, Result};

use deedscan_core::{
    evaluate_corpus, evaluate_self_consistency, load_address_list, normalize, MetricsReport,
    Settings,
};

use super::{extract_corpus, write_output, CorpusArgs, RecognizerArgs};

pub fn run(
    settings: &Settings,
    input: &CorpusArgs,
    ground_truth: Option<&Path>,
    output_dir: &Path,
    recognizer: &RecognizerArgs,
) -> Result<()> {
    let corpus = extract_corpus(settings, input, recognizer)?;

    let report = match ground_truth {
        Some(path) => {
            let expected = load_address_list(path).with_context(|| {
                format!("failed to read ground truth from {}", path.display())
            })?;
            evaluate_corpus(&corpus, expected.iter().map(String::as_str).map(normalize))
        }
        None => evaluate_self_consistency(&corpus),
    };

    let csv_path = output_dir.join("overall_metrics.csv");
    let json_path = output_dir.join("overall_metrics.json");
    write_output(&csv_path, &report.to_csv())?;
    write_output(&json_path, &report.to_json()?)?;

    print_summary(&report, corpus.stats.documents);
    eprintln!("  Wrote {} and {}", csv_path.display(), json_path.display());

    Ok(())
}

fn print_summary(report: &MetricsReport, documents: usize) {
    eprintln!("Evaluated {documents} files");
    eprintln!(
        "  TP: {}  FP: {}  FN: {}",
        report.true_positives_count, report.false_positives_count, report.false_negatives_count
    );
    eprintln!(
        "  Precision: {:.4}  Recall: {:.4}  F1: {:.4}",
        report.precision, report.recall, report.f1_score
    );
}
