//! Source media probing.

use std::path::Path;
use std::process::Command;

use serde::Deserialize;

use reelcut_clip_model::media::SourceVideo;
use reelcut_common::error::{ReelcutError, ReelcutResult};

/// Reads the properties of a source video.
pub trait MediaProbe: Send + Sync {
    /// Open `path` and describe its video stream.
    fn probe(&self, path: &Path) -> ReelcutResult<SourceVideo>;

    /// Check if this probe can run on the system.
    fn is_available(&self) -> bool;

    /// Probe name.
    fn name(&self) -> &str;
}

/// Probe backed by the `ffprobe` binary.
#[derive(Debug, Clone)]
pub struct FfprobeProbe {
    binary: String,
}

impl Default for FfprobeProbe {
    fn default() -> Self {
        Self::new("ffprobe")
    }
}

impl FfprobeProbe {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl MediaProbe for FfprobeProbe {
    fn probe(&self, path: &Path) -> ReelcutResult<SourceVideo> {
        if !path.is_file() {
            return Err(ReelcutError::media_open(path, "file does not exist"));
        }

        let output = Command::new(&self.binary)
            .args([
                "-v",
                "error",
                "-print_format",
                "json",
                "-show_streams",
                "-show_format",
            ])
            .arg(path)
            .output()
            .map_err(|e| ReelcutError::media_open(path, format!("failed to run {}: {e}", self.binary)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ReelcutError::media_open(
                path,
                format!("{} exited with {}: {}", self.binary, output.status, stderr.trim()),
            ));
        }

        let json = String::from_utf8_lossy(&output.stdout);
        let source = parse_probe_output(path, &json)?;
        tracing::debug!(
            path = %path.display(),
            width = source.width,
            height = source.height,
            duration_secs = source.duration_secs,
            has_audio = source.has_audio,
            "Probed source"
        );
        Ok(source)
    }

    fn is_available(&self) -> bool {
        crate::export::command_exists(&self.binary)
    }

    fn name(&self) -> &str {
        "ffprobe"
    }
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    #[serde(default)]
    format: Option<ProbeFormat>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    #[serde(default)]
    codec_type: String,
    #[serde(default)]
    width: Option<u32>,
    #[serde(default)]
    height: Option<u32>,
    #[serde(default)]
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    #[serde(default)]
    duration: Option<String>,
}

/// Turn ffprobe's JSON report into a [`SourceVideo`].
///
/// The container duration wins over the video stream duration; either must be
/// positive, and the first video stream must have non-zero dimensions.
pub fn parse_probe_output(path: &Path, json: &str) -> ReelcutResult<SourceVideo> {
    let report: ProbeOutput = serde_json::from_str(json)
        .map_err(|e| ReelcutError::media_open(path, format!("unreadable probe output: {e}")))?;

    let video = report
        .streams
        .iter()
        .find(|s| s.codec_type == "video")
        .ok_or_else(|| ReelcutError::media_open(path, "no video stream"))?;

    let (width, height) = match (video.width, video.height) {
        (Some(w), Some(h)) if w > 0 && h > 0 => (w, h),
        _ => return Err(ReelcutError::media_open(path, "video stream has no dimensions")),
    };

    let parse_secs = |raw: &Option<String>| raw.as_deref().and_then(|s| s.trim().parse::<f64>().ok());
    let duration_secs = report
        .format
        .as_ref()
        .and_then(|f| parse_secs(&f.duration))
        .or_else(|| parse_secs(&video.duration))
        .filter(|d| d.is_finite() && *d > 0.0)
        .ok_or_else(|| ReelcutError::media_open(path, "source has no positive duration"))?;

    Ok(SourceVideo {
        path: path.to_path_buf(),
        width,
        height,
        duration_secs,
        has_audio: report.streams.iter().any(|s| s.codec_type == "audio"),
    })
}
