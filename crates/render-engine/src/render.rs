//! Render orchestration: one source segment in, one vertical clip out.
//!
//! A render walks a fixed sequence of stages:
//!
//! ```text
//! Idle ─► Loaded ─► Subclipped ─► Planned ─► Captioned ─► Composited ─► Done
//!   │        │           │           │            │             │
//!   └────────┴───────────┴───────────┴────────────┴─────────────┴──► Failed
//! ```
//!
//! A failing stage ends the render with the original error. Nothing is
//! retried; batch callers decide what to do with a failed segment.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use image::ImageFormat;

use reelcut_clip_model::caption::CaptionChunk;
use reelcut_clip_model::layout::Size;
use reelcut_clip_model::media::{RenderResult, SourceVideo};
use reelcut_clip_model::segment::SegmentDescriptor;
use reelcut_clip_model::transcript::WordTiming;
use reelcut_common::config::AppConfig;
use reelcut_common::error::{ReelcutError, ReelcutResult};
use reelcut_processing_core::captions::{segment_captions, SegmenterConfig};
use reelcut_processing_core::layout::plan_layout;
use reelcut_processing_core::subtitles::save_subtitles;

use crate::compositor::{caption_position, caption_safe_width, CaptionOverlay};
use crate::export::{verify_output, EncodeJob, FfmpegBackend, RenderBackend};
use crate::probe::{FfprobeProbe, MediaProbe};
use crate::progress::{BatchProgress, MonotonicProgress, NoProgress, ProgressSink};
use crate::text::CaptionRasterizer;

/// Stages of a single render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderStage {
    Idle,
    Loaded,
    Subclipped,
    Planned,
    Captioned,
    Composited,
    Done,
    Failed,
}

impl RenderStage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loaded => "loaded",
            Self::Subclipped => "subclipped",
            Self::Planned => "planned",
            Self::Captioned => "captioned",
            Self::Composited => "composited",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

impl std::fmt::Display for RenderStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Callback invoked on every stage transition.
pub type StageObserver = Box<dyn Fn(RenderStage) + Send + Sync>;

struct StageTracker<'a> {
    stage: RenderStage,
    observer: Option<&'a StageObserver>,
}

impl<'a> StageTracker<'a> {
    fn new(observer: Option<&'a StageObserver>) -> Self {
        Self {
            stage: RenderStage::Idle,
            observer,
        }
    }

    fn advance(&mut self, next: RenderStage) {
        tracing::debug!(from = %self.stage, to = %next, "Render stage");
        self.stage = next;
        if let Some(observer) = self.observer {
            observer(next);
        }
    }
}

/// Renders vertical clips from a source video.
///
/// A renderer holds no per-render state, so one instance can serve
/// concurrent renders to different output paths.
pub struct ClipRenderer {
    probe: Box<dyn MediaProbe>,
    backend: Box<dyn RenderBackend>,
    rasterizer: CaptionRasterizer,
    config: AppConfig,
    observer: Option<StageObserver>,
}

impl std::fmt::Debug for ClipRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClipRenderer")
            .field("probe", &self.probe.name())
            .field("backend", &self.backend.name())
            .field("rasterizer", &self.rasterizer)
            .finish_non_exhaustive()
    }
}

impl ClipRenderer {
    /// Renderer using the ffprobe/ffmpeg binaries named in `config.render`.
    pub fn new(config: AppConfig) -> ReelcutResult<Self> {
        let probe = FfprobeProbe::new(config.render.ffprobe_bin.clone());
        let backend = FfmpegBackend::new(config.render.ffmpeg_bin.clone());
        Self::with_backends(Box::new(probe), Box::new(backend), config)
    }

    pub fn with_backends(
        probe: Box<dyn MediaProbe>,
        backend: Box<dyn RenderBackend>,
        config: AppConfig,
    ) -> ReelcutResult<Self> {
        config.validate()?;
        let rasterizer = CaptionRasterizer::from_config(&config.captions)?;
        tracing::debug!(font = %rasterizer.font().name(), "Caption rasterizer ready");
        Ok(Self {
            probe,
            backend,
            rasterizer,
            config,
            observer: None,
        })
    }

    /// Replace the caption rasterizer.
    pub fn with_rasterizer(mut self, rasterizer: CaptionRasterizer) -> Self {
        self.rasterizer = rasterizer;
        self
    }

    /// Observe stage transitions of every render.
    pub fn with_stage_observer(mut self, observer: impl Fn(RenderStage) + Send + Sync + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn probe_source(&self, path: &Path) -> ReelcutResult<SourceVideo> {
        self.probe.probe(path)
    }

    /// Render `segment` of `source` into a vertical clip at `output_path`.
    ///
    /// `words` is the transcript of the whole source in absolute time.
    pub fn render(
        &self,
        source: &Path,
        segment: &SegmentDescriptor,
        output_path: &Path,
        words: &[WordTiming],
        progress: Option<&dyn ProgressSink>,
    ) -> ReelcutResult<RenderResult> {
        let started = Instant::now();
        let progress = MonotonicProgress::new(progress.unwrap_or(&NoProgress));
        let mut tracker = StageTracker::new(self.observer.as_ref());

        tracing::info!(
            source = %source.display(),
            output = %output_path.display(),
            start = segment.start,
            end = segment.end,
            backend = self.backend.name(),
            "Starting render"
        );

        match self.run(&mut tracker, source, segment, output_path, words, &progress) {
            Ok(result) => {
                progress.finish();
                tracker.advance(RenderStage::Done);
                tracing::info!(
                    output = %result.output_path.display(),
                    elapsed_secs = started.elapsed().as_secs_f64(),
                    "Render finished"
                );
                Ok(result)
            }
            Err(err) => {
                tracing::warn!(
                    stage = %tracker.stage,
                    kind = err.kind(),
                    error = %err,
                    "Render failed"
                );
                tracker.advance(RenderStage::Failed);
                Err(err)
            }
        }
    }

    fn run(
        &self,
        tracker: &mut StageTracker<'_>,
        source: &Path,
        segment: &SegmentDescriptor,
        output_path: &Path,
        words: &[WordTiming],
        progress: &MonotonicProgress<'_>,
    ) -> ReelcutResult<RenderResult> {
        progress.report(0.0);

        let video = self.probe.probe(source)?;
        if video.size().is_degenerate() {
            return Err(ReelcutError::invalid_argument(format!(
                "Source {} reports a {}x{} frame",
                source.display(),
                video.width,
                video.height
            )));
        }
        tracker.advance(RenderStage::Loaded);

        let window = segment
            .window(video.duration_secs)
            .ok_or(ReelcutError::InvalidRange {
                start: segment.start,
                end: segment.end.unwrap_or(video.duration_secs),
                duration: video.duration_secs,
            })?;
        tracker.advance(RenderStage::Subclipped);

        let target = Size::new(
            self.config.render.target_width,
            self.config.render.target_height,
        );
        let layout = plan_layout(video.size(), target, &self.config.layout);
        tracing::debug!(
            foreground = ?layout.foreground_rect(),
            crop = ?layout.background_crop,
            "Planned layout"
        );
        tracker.advance(RenderStage::Planned);

        let chunks = if self.config.captions.enabled {
            segment_captions(words, window, &SegmenterConfig::from(&self.config.captions))
        } else {
            Vec::new()
        };
        let caption_dir = tempfile::Builder::new()
            .prefix("reelcut-captions-")
            .tempdir()?;
        let captions = self.rasterize_captions(&chunks, target, caption_dir.path())?;
        tracker.advance(RenderStage::Captioned);

        if let Some(parent) = output_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let job = EncodeJob {
            source_path: video.path.clone(),
            window,
            has_audio: video.has_audio,
            layout,
            captions,
            output_path: output_path.to_path_buf(),
            settings: self.config.render.clone(),
        };
        self.backend.encode(&job, progress)?;
        verify_output(output_path)?;
        tracker.advance(RenderStage::Composited);

        if self.config.captions.write_sidecar && !chunks.is_empty() {
            let sidecar = output_path.with_extension("srt");
            save_subtitles(&chunks, &sidecar)?;
            tracing::debug!(path = %sidecar.display(), "Wrote caption sidecar");
        }

        Ok(RenderResult::completed(output_path.to_path_buf()))
    }

    fn rasterize_captions(
        &self,
        chunks: &[CaptionChunk],
        target: Size,
        dir: &Path,
    ) -> ReelcutResult<Vec<CaptionOverlay>> {
        let canvas = self
            .rasterizer
            .canvas_size(caption_safe_width(target, &self.config.captions));
        let mut overlays = Vec::with_capacity(chunks.len());

        for (index, chunk) in chunks.iter().enumerate() {
            let image = match self.rasterizer.rasterize(&chunk.text, canvas) {
                Ok(image) => image,
                Err(err) if !err.is_fatal() => {
                    tracing::warn!(index, text = %chunk.text, error = %err, "Omitting caption chunk");
                    continue;
                }
                Err(err) => return Err(err),
            };

            let path = dir.join(format!("caption_{index:04}.png"));
            image
                .save_with_format(&path, ImageFormat::Png)
                .map_err(|e| ReelcutError::Io(std::io::Error::other(e)))?;

            let position = caption_position(
                target,
                Size::new(image.width(), image.height()),
                &self.config.captions,
            );
            overlays.push(CaptionOverlay::new(path, position, chunk));
        }

        tracing::debug!(
            chunks = chunks.len(),
            rendered = overlays.len(),
            "Rasterized captions"
        );
        Ok(overlays)
    }

    /// Render every segment in order into `output_dir`.
    ///
    /// Each segment gets its own result; a failed segment does not stop the
    /// batch. Progress spans the whole batch.
    pub fn render_all(
        &self,
        source: &Path,
        segments: &[SegmentDescriptor],
        output_dir: &Path,
        words: &[WordTiming],
        progress: Option<&dyn ProgressSink>,
    ) -> Vec<ReelcutResult<RenderResult>> {
        let stamp = chrono::Utc::now().timestamp();
        segments
            .iter()
            .enumerate()
            .map(|(index, segment)| {
                let output = output_dir.join(segment.output_file_name(index + 1, stamp));
                let slot = progress.map(|p| BatchProgress::new(p, index, segments.len()));
                let result = self.render(
                    source,
                    segment,
                    &output,
                    words,
                    slot.as_ref().map(|s| s as &dyn ProgressSink),
                );
                if let Err(err) = &result {
                    if err.is_skippable_segment() {
                        tracing::info!(index, error = %err, "Skipping segment");
                    }
                }
                result
            })
            .collect()
    }
}

/// Run a render on the blocking thread pool for async callers.
pub async fn render_clip_blocking(
    renderer: Arc<ClipRenderer>,
    source: PathBuf,
    segment: SegmentDescriptor,
    output_path: PathBuf,
    words: Vec<WordTiming>,
    progress: Option<Box<dyn Fn(f64) + Send>>,
) -> ReelcutResult<RenderResult> {
    tokio::task::spawn_blocking(move || {
        let sink = progress.map(|report| move |fraction: f64| report(fraction));
        renderer.render(
            &source,
            &segment,
            &output_path,
            &words,
            sink.as_ref().map(|s| s as &dyn ProgressSink),
        )
    })
    .await
    .map_err(|e| ReelcutError::Other(anyhow::anyhow!("Render worker failed: {e}")))?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_names() {
        assert_eq!(RenderStage::Subclipped.to_string(), "subclipped");
        assert!(RenderStage::Failed.is_terminal());
        assert!(!RenderStage::Composited.is_terminal());
    }
}
