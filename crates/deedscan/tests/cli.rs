use std::fs;
use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const DEED_A: &str = "THIS INDENTURE made between the Estate of John Doe, Executor, and Jane Roe.\n\
    ALL THAT CERTAIN lot BEING KNOWN AS 123 Main Street, Springfield, IL, 62704.\n\
    Premises Being: 123 Main Street,\nSpringfield, IL, 62704";
const DEED_B: &str = "Property Address: 9 North Elm Avenue, Dover, DE, 19901";

fn deedscan(dir: &Path) -> Command {
    let mut cmd: Command = cargo_bin_cmd!("deedscan").into();
    cmd.current_dir(dir);
    cmd.env("DEEDSCAN_MODEL_DIR", dir.join("models"));
    cmd.env_remove("DEEDSCAN_SEED");
    cmd
}

/// Temp dir holding a `texts/` corpus and an `addresses.txt` list.
fn workspace() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let texts = tmp.path().join("texts");
    fs::create_dir(&texts).unwrap();
    fs::write(texts.join("a.txt"), DEED_A).unwrap();
    fs::write(texts.join("b.txt"), DEED_B).unwrap();
    fs::write(texts.join("notes.md"), "ignored 1 Oak Lane, Bath, ME, 04530").unwrap();
    fs::write(
        tmp.path().join("addresses.txt"),
        "123 Main Street, Springfield, IL, 62704\n\n9 North Elm Avenue, Dover, DE, 19901\n",
    )
    .unwrap();
    tmp
}

// --- Binary startup ---

#[test]
fn binary_runs() {
    let mut cmd: Command = cargo_bin_cmd!("deedscan").into();
    cmd.arg("--version");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("deedscan"));
}

// --- Synthesize ---

#[test]
fn synthesize_prints_examples() {
    let tmp = workspace();

    let output = deedscan(tmp.path())
        .args(["synthesize", "--addresses", "addresses.txt"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let examples: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let examples = examples.as_array().unwrap();
    assert_eq!(examples.len(), 16);
    assert_eq!(
        examples[0][0],
        "BEING KNOWN AS 123 Main Street, Springfield, IL, 62704"
    );
    assert_eq!(examples[0][1]["entities"][0][0], 15);
}

#[test]
fn synthesize_rejects_unregistered_tag() {
    let tmp = workspace();
    fs::write(tmp.path().join("templates.txt"), "Owner {OWNER} at {ADDRESS}\n").unwrap();

    deedscan(tmp.path())
        .args([
            "synthesize",
            "--addresses",
            "addresses.txt",
            "--templates",
            "templates.txt",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("OWNER"));
}

#[test]
fn synthesize_writes_file() {
    let tmp = workspace();

    deedscan(tmp.path())
        .args(["synthesize", "--addresses", "addresses.txt", "-o", "out/examples.json"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Wrote 16 examples"));

    assert!(tmp.path().join("out/examples.json").exists());
}

// --- Extract ---

#[test]
fn extract_with_patterns_writes_csv() {
    let tmp = workspace();

    deedscan(tmp.path())
        .args(["extract", "-i", "texts", "-o", "final/addresses.csv"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Processed 2 files"))
        .stderr(predicate::str::contains("Words: 43, lines: 5"));

    let csv = fs::read_to_string(tmp.path().join("final/addresses.csv")).unwrap();
    assert_eq!(
        csv,
        "Filename,Address\n\
         a.txt,\"123 Main Street, Springfield, IL, 62704\"\n\
         b.txt,\"9 North Elm Avenue, Dover, DE, 19901\"\n"
    );
}

#[test]
fn extract_missing_directory_fails() {
    let tmp = workspace();

    deedscan(tmp.path())
        .args(["extract", "-i", "nope", "-o", "out.csv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not a directory"));
}

#[test]
fn extract_unknown_model_fails() {
    let tmp = workspace();

    deedscan(tmp.path())
        .args(["extract", "-i", "texts", "-o", "out.csv", "--model", "missing"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("model not found"));
}

// --- Train ---

#[test]
fn train_then_extract_with_model() {
    let tmp = workspace();

    deedscan(tmp.path())
        .args(["train", "--addresses", "addresses.txt", "--dropout", "0", "--name", "deeds"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Trained deeds on 16 examples over 2 passes"));

    assert!(tmp.path().join("models/deeds.json").exists());

    deedscan(tmp.path())
        .args(["extract", "-i", "texts", "-o", "by-model.csv", "--model", "deeds"])
        .assert()
        .success();

    let csv = fs::read_to_string(tmp.path().join("by-model.csv")).unwrap();
    assert!(csv.contains("a.txt,\"123 Main Street, Springfield, IL, 62704\""));
    assert!(csv.contains("b.txt,\"9 North Elm Avenue, Dover, DE, 19901\""));
}

#[test]
fn train_rejects_bad_dropout() {
    let tmp = workspace();

    deedscan(tmp.path())
        .args(["train", "--addresses", "addresses.txt", "--dropout", "1.5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("dropout"));
}

#[test]
fn train_resumes_from_base_model() {
    let tmp = workspace();
    fs::write(tmp.path().join("more.txt"), "4 Pine Hill Road, Bath, ME, 04530\n").unwrap();

    deedscan(tmp.path())
        .args(["train", "--addresses", "addresses.txt", "--dropout", "0", "--name", "first"])
        .assert()
        .success();

    deedscan(tmp.path())
        .args([
            "train",
            "--addresses",
            "more.txt",
            "--dropout",
            "0",
            "--name",
            "second",
            "--base",
            "first",
        ])
        .assert()
        .success()
        .stderr(predicate::str::contains("Entries: 3"));
}

// --- Evaluate ---

#[test]
fn evaluate_against_ground_truth() {
    let tmp = workspace();
    fs::write(
        tmp.path().join("truth.txt"),
        "123 Main Street, Springfield, IL, 62704.\n4 Pine Hill Road, Bath, ME, 04530\n",
    )
    .unwrap();

    deedscan(tmp.path())
        .args([
            "evaluate",
            "-i",
            "texts",
            "--ground-truth",
            "truth.txt",
            "--output-dir",
            "metrics",
        ])
        .assert()
        .success()
        .stderr(predicate::str::contains("TP: 1  FP: 1  FN: 1"));

    let json = fs::read_to_string(tmp.path().join("metrics/overall_metrics.json")).unwrap();
    let report: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(report["true_positives_count"], 1);
    assert_eq!(report["precision"], 0.5);
    assert_eq!(report["true_negatives_count"], 0);

    let csv = fs::read_to_string(tmp.path().join("metrics/overall_metrics.csv")).unwrap();
    assert!(csv.starts_with("metric,value\ntrue_positives_count,1\n"));
    assert!(csv.contains("false_negatives_value,\"4 Pine Hill Road, Bath, ME, 04530\""));
}

#[test]
fn evaluate_without_ground_truth_scores_cleanup() {
    let tmp = workspace();

    deedscan(tmp.path())
        .args(["evaluate", "-i", "texts", "--output-dir", "metrics"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Evaluated 2 files"));

    let json = fs::read_to_string(tmp.path().join("metrics/overall_metrics.json")).unwrap();
    let report: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(report["true_positives_count"], 2);
    assert_eq!(report["false_positives_count"], 1);
}

#[test]
fn evaluate_with_clean_text_drops_layout_variants() {
    let tmp = workspace();

    deedscan(tmp.path())
        .args(["evaluate", "-i", "texts", "--clean-text", "--output-dir", "metrics"])
        .assert()
        .success();

    let json = fs::read_to_string(tmp.path().join("metrics/overall_metrics.json")).unwrap();
    let report: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(report["true_positives_count"], 2);
    assert_eq!(report["false_positives_count"], 0);
}
