//! Caption sidecar files.
//!
//! A sidecar carries the same chunks that are burned into the clip, with the
//! same clip-relative cue times, so players that support soft subtitles show
//! text in sync with the rendered frames.

use std::fmt::Write as _;
use std::path::Path;

use reelcut_clip_model::caption::CaptionChunk;
use reelcut_common::error::ReelcutResult;

/// Sidecar dialects. They differ only in the header, cue numbering and the
/// millisecond separator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SidecarFormat {
    Srt,
    WebVtt,
}

impl SidecarFormat {
    fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("vtt") => Self::WebVtt,
            _ => Self::Srt,
        }
    }

    fn millis_separator(self) -> char {
        match self {
            Self::Srt => ',',
            Self::WebVtt => '.',
        }
    }

    fn render(self, chunks: &[CaptionChunk]) -> String {
        let mut out = match self {
            Self::Srt => String::new(),
            Self::WebVtt => String::from("WEBVTT\n\n"),
        };
        for (index, chunk) in chunks.iter().enumerate() {
            if self == Self::Srt {
                let _ = writeln!(out, "{}", index + 1);
            }
            let _ = writeln!(
                out,
                "{} --> {}",
                cue_time(chunk.relative_start, self.millis_separator()),
                cue_time(chunk.relative_end, self.millis_separator()),
            );
            let _ = writeln!(out, "{}\n", chunk.text);
        }
        out
    }
}

/// Numbered SubRip cues for the chunks of one clip.
pub fn generate_srt(chunks: &[CaptionChunk]) -> String {
    SidecarFormat::Srt.render(chunks)
}

/// WebVTT cues for the chunks of one clip.
pub fn generate_vtt(chunks: &[CaptionChunk]) -> String {
    SidecarFormat::WebVtt.render(chunks)
}

/// Write the chunks of a clip to `path`. A `.vtt` extension writes WebVTT;
/// every other path gets SubRip.
pub fn save_subtitles(chunks: &[CaptionChunk], path: &Path) -> ReelcutResult<()> {
    std::fs::write(path, SidecarFormat::for_path(path).render(chunks))?;
    Ok(())
}

/// `HH:MM:SS<sep>mmm`, rounded to the nearest millisecond.
fn cue_time(secs: f64, separator: char) -> String {
    let total_ms = (secs.max(0.0) * 1000.0).round() as u64;
    let hours = total_ms / 3_600_000;
    let minutes = total_ms / 60_000 % 60;
    let seconds = total_ms / 1000 % 60;
    let millis = total_ms % 1000;
    format!("{hours:02}:{minutes:02}:{seconds:02}{separator}{millis:03}")
}
