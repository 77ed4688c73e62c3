//! Source media handles and render results.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::layout::Size;

/// A decodable video file as reported by the media probe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceVideo {
    /// Absolute path to the file.
    pub path: PathBuf,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Container duration in seconds.
    pub duration_secs: f64,
    /// Whether at least one audio stream is present.
    pub has_audio: bool,
}

impl SourceVideo {
    /// Frame dimensions.
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

/// Outcome of one render call. The caller owns `output_path` afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderResult {
    pub output_path: PathBuf,
    pub success: bool,
}

impl RenderResult {
    pub fn completed(output_path: PathBuf) -> Self {
        Self {
            output_path,
            success: true,
        }
    }
}
