use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Not a directory: {}", .0.display())]
    NotADirectory(PathBuf),
}

pub type CorpusResult<T> = Result<T, CorpusError>;

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

/// One plain-text document, identified by its file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub id: String,
    pub text: String,
}

impl Document {
    #[must_use]
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }

    /// The same document with [`clean_text`] applied.
    #[must_use]
    pub fn cleaned(self) -> Self {
        Self {
            text: clean_text(&self.text),
            id: self.id,
        }
    }

    #[must_use]
    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }

    #[must_use]
    pub fn line_count(&self) -> usize {
        self.text.lines().count()
    }
}

/// Flattens layout whitespace left behind by text extraction.
#[must_use]
pub fn clean_text(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").trim().to_string()
}

/// Reads every `*.txt` file directly inside `dir`, sorted by file name.
/// Bytes that are not valid UTF-8 become U+FFFD rather than failing the load.
pub fn load_directory(dir: &Path) -> CorpusResult<Vec<Document>> {
    if !dir.is_dir() {
        return Err(CorpusError::NotADirectory(dir.to_path_buf()));
    }

    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "txt") {
            paths.push(path);
        }
    }
    paths.sort();

    let mut documents = Vec::with_capacity(paths.len());
    for path in paths {
        let id = path.file_name().map_or_else(
            || path.to_string_lossy().to_string(),
            |n| n.to_string_lossy().to_string(),
        );
        let text = match String::from_utf8(std::fs::read(&path)?) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(document = %id, "Invalid UTF-8, replacing undecodable bytes");
                String::from_utf8_lossy(e.as_bytes()).into_owned()
            }
        };
        tracing::debug!(document = %id, bytes = text.len(), "Loaded document");
        documents.push(Document::new(id, text));
    }

    Ok(documents)
}

/// One entry per non-blank line, trimmed. Used for both training address
/// lists and ground truth.
pub fn load_address_list(path: &Path) -> CorpusResult<Vec<String>> {
    let content = std::fs::read_to_string(path)?;
    Ok(parse_address_list(&content))
}

#[must_use]
pub fn parse_address_list(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

/// Quotes a CSV field when it holds a delimiter, quote or line break.
pub(crate) fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
