//! Candidate segments and the clip windows they resolve to.
//!
//! Segment boundaries come from upstream analysis and are not trusted:
//! they are clamped against the real source duration only when a clip is
//! rendered, via [`SegmentDescriptor::window`].

use serde::{Deserialize, Serialize};

/// A candidate time range selected by the analysis stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentDescriptor {
    /// Absolute start in seconds. Missing means the start of the source.
    #[serde(default, alias = "start_time")]
    pub start: f64,

    /// Absolute end in seconds. `None` (missing or `null`) means the end of
    /// the source.
    #[serde(default, alias = "end_time")]
    pub end: Option<f64>,

    /// Display title.
    #[serde(default)]
    pub title: String,

    /// Hashtags, with or without the leading `#`.
    #[serde(default)]
    pub hashtags: Vec<String>,

    /// Engagement score assigned upstream.
    #[serde(default)]
    pub score: Option<f64>,

    /// Why the segment was selected.
    #[serde(default, alias = "rationale")]
    pub reason: String,

    /// Short hook text shown alongside the clip.
    #[serde(default)]
    pub viral_detail: Option<String>,
}

/// Maximum number of title characters kept in generated file names.
const FILE_TITLE_CHARS: usize = 30;

impl SegmentDescriptor {
    /// Create a bare segment with only timing.
    pub fn new(start: f64, end: f64) -> Self {
        Self::open_ended(start).with_end(end)
    }

    /// Segment running from `start` to the end of the source.
    pub fn open_ended(start: f64) -> Self {
        Self {
            start,
            end: None,
            title: String::new(),
            hashtags: Vec::new(),
            score: None,
            reason: String::new(),
            viral_detail: None,
        }
    }

    pub fn with_end(mut self, end: f64) -> Self {
        self.end = Some(end);
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Parse a list of segments from JSON.
    ///
    /// Accepts a bare array or an object wrapping it under `clips` or
    /// `segments`.
    pub fn list_from_json(json: &str) -> Result<Vec<Self>, serde_json::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum SegmentList {
            Bare(Vec<SegmentDescriptor>),
            Clips { clips: Vec<SegmentDescriptor> },
            Segments { segments: Vec<SegmentDescriptor> },
        }

        Ok(match serde_json::from_str::<SegmentList>(json)? {
            SegmentList::Bare(list) => list,
            SegmentList::Clips { clips } => clips,
            SegmentList::Segments { segments } => segments,
        })
    }

    /// Clamp this segment against a source of `duration_secs`.
    ///
    /// `start` is clamped into `[0, duration)` and `end` into
    /// `(start, duration]`; an open end resolves to `duration`. Returns `None`
    /// when the clamped range is empty, when any input is NaN, or when the
    /// source has no duration.
    pub fn window(&self, duration_secs: f64) -> Option<ClipWindow> {
        let end = self.end.unwrap_or(duration_secs);
        if self.start.is_nan() || end.is_nan() || duration_secs.is_nan() {
            return None;
        }
        if duration_secs <= 0.0 {
            return None;
        }
        let start = self.start.clamp(0.0, duration_secs);
        let end = end.min(duration_secs);
        if end > start {
            Some(ClipWindow { start, end })
        } else {
            None
        }
    }

    /// Hashtags normalized to a single `#`-prefixed, space-separated line.
    pub fn hashtag_line(&self) -> String {
        self.hashtags
            .iter()
            .map(|tag| tag.trim().trim_start_matches('#'))
            .filter(|tag| !tag.is_empty())
            .map(|tag| format!("#{tag}"))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Output file name: `clip_{index}_{title}_{unix_secs}.mp4`.
    ///
    /// The title keeps only alphanumerics, spaces, `-` and `_`, and is cut to
    /// 30 characters.
    pub fn output_file_name(&self, index: usize, unix_secs: i64) -> String {
        let filtered: String = self
            .title
            .chars()
            .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_'))
            .collect();
        let safe: String = filtered.trim().chars().take(FILE_TITLE_CHARS).collect();
        let safe = safe.trim_end();
        let safe = if safe.is_empty() { "untitled" } else { safe };
        format!("clip_{index}_{safe}_{unix_secs}.mp4")
    }
}

/// A validated, clamped clip range in absolute source seconds.
///
/// Invariant: `0 <= start < end`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClipWindow {
    start: f64,
    end: f64,
}

impl ClipWindow {
    /// Build a window directly. Returns `None` unless `0 <= start < end`.
    pub fn new(start: f64, end: f64) -> Option<Self> {
        if start >= 0.0 && end > start {
            Some(Self { start, end })
        } else {
            None
        }
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn end(&self) -> f64 {
        self.end
    }

    /// Clip length in seconds.
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Partial-overlap test against an absolute `[start, end)` interval.
    pub fn overlaps(&self, start: f64, end: f64) -> bool {
        end > self.start && start < self.end
    }

    /// Map an absolute timestamp to clip-relative time, clamped to the window.
    pub fn to_relative(&self, absolute: f64) -> f64 {
        absolute.clamp(self.start, self.end) - self.start
    }
}
