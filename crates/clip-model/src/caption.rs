//! Timed caption chunks.

use serde::{Deserialize, Serialize};

/// A group of words shown together as one subtitle line.
///
/// Times are relative to the start of the clip. Invariant (upheld by the
/// caption segmenter): `0 <= relative_start < relative_end <= clip duration`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionChunk {
    /// Space-joined display text.
    pub text: String,
    /// Clip-relative start in seconds.
    pub relative_start: f64,
    /// Clip-relative end in seconds (exclusive).
    pub relative_end: f64,
    /// Number of words merged into this chunk.
    pub word_count: usize,
}

impl CaptionChunk {
    /// On-screen duration in seconds.
    pub fn duration(&self) -> f64 {
        self.relative_end - self.relative_start
    }

    /// Whether the chunk is visible at clip time `t` (half-open interval).
    pub fn is_visible_at(&self, t: f64) -> bool {
        t >= self.relative_start && t < self.relative_end
    }
}
