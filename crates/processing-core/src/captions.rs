//! Caption segmentation.
//!
//! Turns absolute word timings into short, clip-relative caption chunks:
//!
//! 1. Keep words that partially overlap the clip window.
//! 2. Clamp each word into the window and shift it to clip-relative time,
//!    dropping words left with an empty interval.
//! 3. Group consecutive survivors into chunks of at most `chunk_size` words.
//! 4. Stretch chunks shorter than the minimum display duration, never past
//!    the end of the clip.
//!
//! Segmentation is lazy and allocation-light; [`CaptionChunks`] is `Clone`,
//! so a caller can restart iteration from the beginning at any time.

use reelcut_clip_model::caption::CaptionChunk;
use reelcut_clip_model::segment::ClipWindow;
use reelcut_clip_model::transcript::WordTiming;
use reelcut_common::config::CaptionConfig;

/// Parameters for caption chunking.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmenterConfig {
    /// Maximum words per chunk. Zero is treated as one.
    pub chunk_size: usize,

    /// Minimum on-screen time for a chunk, in seconds.
    pub min_duration_secs: f64,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            chunk_size: 4,
            min_duration_secs: 0.1,
        }
    }
}

impl From<&CaptionConfig> for SegmenterConfig {
    fn from(config: &CaptionConfig) -> Self {
        Self {
            chunk_size: config.chunk_size,
            min_duration_secs: config.min_duration_secs,
        }
    }
}

/// A word after clamping, in clip-relative seconds.
#[derive(Debug, Clone, Copy)]
struct ClippedWord<'a> {
    text: &'a str,
    start: f64,
    end: f64,
}

/// Lazy iterator over the caption chunks of one clip.
#[derive(Debug, Clone)]
pub struct CaptionChunks<'a> {
    words: std::slice::Iter<'a, WordTiming>,
    window: ClipWindow,
    chunk_size: usize,
    min_duration_secs: f64,
}

impl<'a> CaptionChunks<'a> {
    fn next_word(&mut self) -> Option<ClippedWord<'a>> {
        for word in self.words.by_ref() {
            if !word.overlaps(&self.window) {
                continue;
            }
            let start = self.window.to_relative(word.start);
            let end = self.window.to_relative(word.end);
            if end > start {
                return Some(ClippedWord {
                    text: word.word.trim(),
                    start,
                    end,
                });
            }
        }
        None
    }
}

impl Iterator for CaptionChunks<'_> {
    type Item = CaptionChunk;

    fn next(&mut self) -> Option<CaptionChunk> {
        let first = self.next_word()?;
        let mut text = String::from(first.text);
        let mut last_end = first.end;
        let mut widest_end = first.end;
        let mut word_count = 1;

        while word_count < self.chunk_size {
            let Some(word) = self.next_word() else {
                break;
            };
            if !word.text.is_empty() {
                if !text.is_empty() {
                    text.push(' ');
                }
                text.push_str(word.text);
            }
            last_end = word.end;
            widest_end = widest_end.max(word.end);
            word_count += 1;
        }

        let duration = self.window.duration();
        let relative_start = first.start;
        let mut relative_end = last_end;
        if relative_end - relative_start < self.min_duration_secs {
            relative_end = (relative_start + self.min_duration_secs).min(duration);
        }
        // Out-of-order input can leave the last word ending before the first
        // one started.
        if relative_end <= relative_start {
            relative_end = widest_end;
        }

        Some(CaptionChunk {
            text,
            relative_start,
            relative_end,
            word_count,
        })
    }
}

/// Segment `words` into caption chunks for `window`.
///
/// `words` should be ordered by start time, as produced by
/// [`Transcript`](reelcut_clip_model::transcript::Transcript).
pub fn caption_chunks<'a>(
    words: &'a [WordTiming],
    window: ClipWindow,
    config: &SegmenterConfig,
) -> CaptionChunks<'a> {
    CaptionChunks {
        words: words.iter(),
        window,
        chunk_size: config.chunk_size.max(1),
        min_duration_secs: if config.min_duration_secs.is_finite() {
            config.min_duration_secs.max(0.0)
        } else {
            0.0
        },
    }
}

/// Collect every caption chunk for `window`.
pub fn segment_captions(
    words: &[WordTiming],
    window: ClipWindow,
    config: &SegmenterConfig,
) -> Vec<CaptionChunk> {
    let chunks: Vec<CaptionChunk> = caption_chunks(words, window, config).collect();
    tracing::debug!(
        clip_start = window.start(),
        clip_end = window.end(),
        chunks = chunks.len(),
        "Segmented captions"
    );
    chunks
}
