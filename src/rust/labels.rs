use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum LabelError {
    #[error("Failed to read label file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("Label file contains no labels")]
    Empty,
    #[error("Blank label on line {0}; every line before the last label must name a class")]
    BlankLine(usize),
}

/// The ordered class names of the model. Index `i` names output class `i`.
///
/// Cloning is cheap: the labels are shared behind an `Arc` and never mutated
/// after loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct LabelSet {
    labels: Arc<[String]>,
}

impl LabelSet {
    /// Reads a newline-separated label file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, LabelError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| LabelError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let labels = Self::parse(&text)?;
        log::info!("Loaded {} labels from {:?}", labels.len(), path);
        Ok(labels)
    }

    /// Parses label text: one label per line, surrounding whitespace trimmed.
    /// Trailing blank lines are ignored; a blank line between labels would
    /// shift every following class index and is rejected.
    pub fn parse(text: &str) -> Result<Self, LabelError> {
        let lines: Vec<&str> = text.lines().map(str::trim).collect();
        let last = lines
            .iter()
            .rposition(|line| !line.is_empty())
            .ok_or(LabelError::Empty)?;

        if let Some(pos) = lines[..=last].iter().position(|line| line.is_empty()) {
            return Err(LabelError::BlankLine(pos + 1));
        }

        Ok(Self::new(lines[..=last].iter().map(|line| line.to_string())))
    }

    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            labels: labels.into_iter().map(Into::into).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.labels
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }
}
