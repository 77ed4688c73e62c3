//! Word-level transcript timings.
//!
//! [`Transcript`] is the single ingestion boundary for word timings: raw
//! records from the speech-to-text stage are normalized here into
//! [`WordTiming`] values with mandatory fields, so nothing downstream ever
//! deals with partially populated records.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::segment::ClipWindow;

/// One spoken word with absolute source-relative timing.
///
/// Invariants (upheld by [`Transcript`]): `word` is non-blank and
/// `end >= start`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordTiming {
    pub word: String,
    pub start: f64,
    pub end: f64,
}

impl WordTiming {
    pub fn new(word: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            word: word.into(),
            start,
            end,
        }
    }

    /// Partial overlap with a clip window.
    pub fn overlaps(&self, window: &ClipWindow) -> bool {
        window.overlaps(self.start, self.end)
    }
}

/// An ordered list of word timings covering a whole source.
///
/// Words are ascending by `start`; equal or overlapping neighbours are kept in
/// their original relative order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Transcript {
    words: Vec<WordTiming>,
}

/// A word record as produced upstream, before normalization.
#[derive(Debug, Deserialize)]
struct RawWord {
    #[serde(default, alias = "text")]
    word: Option<String>,
    #[serde(default)]
    start: Option<f64>,
    #[serde(default)]
    end: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawTranscript {
    Bare(Vec<RawWord>),
    Verbose { words: Vec<RawWord> },
}

impl Transcript {
    /// Build a transcript from already-constructed words, normalizing them.
    pub fn new(words: Vec<WordTiming>) -> Self {
        Self::normalize(
            words
                .into_iter()
                .map(|w| (Some(w.word), Some(w.start), Some(w.end))),
        )
    }

    /// Parse a transcript from JSON.
    ///
    /// Accepts a bare array of `{word, start, end}` records or a verbose
    /// speech-to-text response carrying a `words` array. Records with missing
    /// timing or blank text are dropped.
    pub fn from_json(json: &str) -> Result<Self, TranscriptError> {
        let raw: RawTranscript =
            serde_json::from_str(json).map_err(|source| TranscriptError::ParseError {
                path: None,
                source,
            })?;
        let words = match raw {
            RawTranscript::Bare(words) => words,
            RawTranscript::Verbose { words } => words,
        };
        Ok(Self::normalize(
            words.into_iter().map(|w| (w.word, w.start, w.end)),
        ))
    }

    /// Load and parse a transcript file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TranscriptError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| TranscriptError::IoError {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content).map_err(|err| match err {
            TranscriptError::ParseError { source, .. } => TranscriptError::ParseError {
                path: Some(path.to_path_buf()),
                source,
            },
            other => other,
        })
    }

    fn normalize(
        records: impl Iterator<Item = (Option<String>, Option<f64>, Option<f64>)>,
    ) -> Self {
        let mut words: Vec<WordTiming> = records
            .filter_map(|(word, start, end)| {
                let word = word?;
                let word = word.trim();
                let (start, end) = (start?, end?);
                if word.is_empty() || !start.is_finite() || !end.is_finite() {
                    return None;
                }
                Some(WordTiming::new(word, start, end.max(start)))
            })
            .collect();

        // Stable: overlapping words keep their upstream order.
        words.sort_by(|a, b| a.start.total_cmp(&b.start));
        Self { words }
    }

    pub fn words(&self) -> &[WordTiming] {
        &self.words
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// End time of the last spoken word.
    pub fn last_end(&self) -> Option<f64> {
        self.words.iter().map(|w| w.end).reduce(f64::max)
    }

    /// Words overlapping the window, with their absolute timing unchanged.
    ///
    /// This is the subset a persistence layer stores to re-render a clip
    /// later without the full transcript.
    pub fn words_in(&self, window: &ClipWindow) -> Vec<WordTiming> {
        self.words
            .iter()
            .filter(|w| w.overlaps(window))
            .cloned()
            .collect()
    }

    /// Space-joined text of the words overlapping the window.
    pub fn caption_text(&self, window: &ClipWindow) -> String {
        self.words
            .iter()
            .filter(|w| w.overlaps(window))
            .map(|w| w.word.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Errors raised while ingesting transcripts.
#[derive(Debug, thiserror::Error)]
pub enum TranscriptError {
    #[error("I/O error at {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Transcript parse error{}: {source}", in_path(.path))]
    ParseError {
        path: Option<PathBuf>,
        source: serde_json::Error,
    },
}

fn in_path(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map(|p| format!(" in {}", p.display()))
        .unwrap_or_default()
}
