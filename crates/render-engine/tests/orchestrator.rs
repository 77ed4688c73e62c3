use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use reelcut_clip_model::media::SourceVideo;
use reelcut_clip_model::segment::SegmentDescriptor;
use reelcut_clip_model::transcript::WordTiming;
use reelcut_common::config::AppConfig;
use reelcut_common::error::{ReelcutError, ReelcutResult};
use reelcut_render_engine::{
    render_clip_blocking, CaptionFont, CaptionRasterizer, ClipRenderer, EncodeJob, MediaProbe,
    ProgressSink, RenderBackend, RenderStage, TextStyle,
};

struct FakeProbe {
    width: u32,
    height: u32,
    duration_secs: f64,
}

impl FakeProbe {
    fn landscape() -> Self {
        Self {
            width: 1920,
            height: 1080,
            duration_secs: 60.0,
        }
    }
}

impl MediaProbe for FakeProbe {
    fn probe(&self, path: &Path) -> ReelcutResult<SourceVideo> {
        if path.ends_with("missing.mp4") {
            return Err(ReelcutError::media_open(path, "file does not exist"));
        }
        Ok(SourceVideo {
            path: path.to_path_buf(),
            width: self.width,
            height: self.height,
            duration_secs: self.duration_secs,
            has_audio: true,
        })
    }

    fn is_available(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        "fake-probe"
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Outcome {
    Write,
    WriteNothing,
    Fail,
}

#[derive(Default)]
struct Recorded {
    jobs: Vec<EncodeJob>,
    caption_files_present: Vec<bool>,
}

struct RecordingBackend {
    outcome: Outcome,
    recorded: Arc<Mutex<Recorded>>,
}

impl RenderBackend for RecordingBackend {
    fn encode(&self, job: &EncodeJob, progress: &dyn ProgressSink) -> ReelcutResult<()> {
        let mut recorded = self.recorded.lock().unwrap();
        recorded
            .caption_files_present
            .push(job.captions.iter().all(|c| c.image_path.is_file()));
        recorded.jobs.push(job.clone());

        for fraction in [0.3, 0.1, 0.6, 1.2] {
            progress.report(fraction);
        }
        match self.outcome {
            Outcome::Write => {
                std::fs::write(&job.output_path, b"fake mp4")?;
                Ok(())
            }
            Outcome::WriteNothing => Ok(()),
            Outcome::Fail => Err(ReelcutError::encoding("ffmpeg failed (status 1)")),
        }
    }

    fn is_available(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        "recording"
    }
}

struct Harness {
    renderer: ClipRenderer,
    recorded: Arc<Mutex<Recorded>>,
    stages: Arc<Mutex<Vec<RenderStage>>>,
    dir: tempfile::TempDir,
}

impl Harness {
    fn new(config: AppConfig, outcome: Outcome) -> Self {
        let recorded = Arc::new(Mutex::new(Recorded::default()));
        let stages = Arc::new(Mutex::new(Vec::new()));
        let sink = stages.clone();
        let renderer = ClipRenderer::with_backends(
            Box::new(FakeProbe::landscape()),
            Box::new(RecordingBackend {
                outcome,
                recorded: recorded.clone(),
            }),
            config,
        )
        .unwrap()
        .with_rasterizer(CaptionRasterizer::new(CaptionFont::Builtin, TextStyle::default()))
        .with_stage_observer(move |stage| sink.lock().unwrap().push(stage));

        Self {
            renderer,
            recorded,
            stages,
            dir: tempfile::tempdir().unwrap(),
        }
    }

    fn output(&self) -> PathBuf {
        self.dir.path().join("clips").join("clip_1.mp4")
    }

    fn render(&self, segment: SegmentDescriptor, words: &[WordTiming]) -> ReelcutResult<PathBuf> {
        self.renderer
            .render(Path::new("/media/source.mp4"), &segment, &self.output(), words, None)
            .map(|r| r.output_path)
    }

    fn stages(&self) -> Vec<RenderStage> {
        self.stages.lock().unwrap().clone()
    }

    fn jobs(&self) -> Vec<EncodeJob> {
        self.recorded.lock().unwrap().jobs.clone()
    }
}

/// Words every half second from 5s to 45s.
fn steady_words() -> Vec<WordTiming> {
    (0..80)
        .map(|i| {
            let start = 5.0 + 0.5 * i as f64;
            WordTiming::new(format!("word{i}"), start, start + 0.4)
        })
        .collect()
}

#[test]
fn landscape_clip_walks_every_stage() {
    let harness = Harness::new(AppConfig::default(), Outcome::Write);
    let output = harness
        .render(SegmentDescriptor::new(10.0, 40.0), &steady_words())
        .unwrap();

    assert_eq!(output, harness.output());
    assert!(output.is_file());
    assert_eq!(
        harness.stages(),
        vec![
            RenderStage::Loaded,
            RenderStage::Subclipped,
            RenderStage::Planned,
            RenderStage::Captioned,
            RenderStage::Composited,
            RenderStage::Done,
        ]
    );

    let jobs = harness.jobs();
    assert_eq!(jobs.len(), 1);
    let job = &jobs[0];
    assert_eq!((job.window.start(), job.window.end()), (10.0, 40.0));
    assert_eq!(job.layout.foreground_size.width, 1020);
    assert_eq!(job.layout.background_crop.size(), job.layout.target);
    assert_eq!(job.captions.len(), 15);
    assert!(job.captions.iter().all(|c| c.start >= 0.0 && c.end <= 30.0 && c.start < c.end));
    assert!(job.captions.iter().all(|c| c.y < 1632));
    assert!(harness.recorded.lock().unwrap().caption_files_present[0]);
}

#[test]
fn caption_bitmaps_are_removed_after_render() {
    let harness = Harness::new(AppConfig::default(), Outcome::Write);
    harness
        .render(SegmentDescriptor::new(10.0, 20.0), &steady_words())
        .unwrap();
    let job = &harness.jobs()[0];
    assert!(!job.captions.is_empty());
    assert!(job.captions.iter().all(|c| !c.image_path.exists()));
}

#[test]
fn progress_is_monotonic_and_finishes_at_one() {
    let harness = Harness::new(AppConfig::default(), Outcome::Write);
    let seen = Mutex::new(Vec::new());
    let sink = |f: f64| seen.lock().unwrap().push(f);

    harness
        .renderer
        .render(
            Path::new("/media/source.mp4"),
            &SegmentDescriptor::new(10.0, 40.0),
            &harness.output(),
            &[],
            Some(&sink),
        )
        .unwrap();

    let seen = seen.into_inner().unwrap();
    assert_eq!(seen.first(), Some(&0.0));
    assert_eq!(seen.last(), Some(&1.0));
    assert!(seen.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(seen.iter().filter(|f| **f == 1.0).count(), 1);
}

#[test]
fn disabled_captions_render_layers_only() {
    let mut config = AppConfig::default();
    config.captions.enabled = false;
    let harness = Harness::new(config, Outcome::Write);
    harness
        .render(SegmentDescriptor::new(10.0, 40.0), &steady_words())
        .unwrap();
    assert!(harness.jobs()[0].captions.is_empty());
}

#[test]
fn empty_transcript_renders_layers_only() {
    let harness = Harness::new(AppConfig::default(), Outcome::Write);
    harness.render(SegmentDescriptor::new(0.0, 30.0), &[]).unwrap();
    assert!(harness.jobs()[0].captions.is_empty());
}

#[test]
fn collapsed_range_fails_before_planning() {
    let harness = Harness::new(AppConfig::default(), Outcome::Write);
    let err = harness
        .render(SegmentDescriptor::new(50.0, 50.0), &steady_words())
        .unwrap_err();

    assert!(matches!(err, ReelcutError::InvalidRange { .. }));
    assert!(err.is_skippable_segment());
    assert_eq!(harness.stages(), vec![RenderStage::Loaded, RenderStage::Failed]);
    assert!(harness.jobs().is_empty());
}

#[test]
fn out_of_bounds_segments_are_clamped() {
    let harness = Harness::new(AppConfig::default(), Outcome::Write);
    harness.render(SegmentDescriptor::new(-5.0, 10.0), &[]).unwrap();
    harness.render(SegmentDescriptor::new(-10.0, 500.0), &[]).unwrap();

    let jobs = harness.jobs();
    assert_eq!((jobs[0].window.start(), jobs[0].window.end()), (0.0, 10.0));
    assert_eq!((jobs[1].window.start(), jobs[1].window.end()), (0.0, 60.0));
}

#[test]
fn open_ended_segment_runs_to_end_of_source() {
    let harness = Harness::new(AppConfig::default(), Outcome::Write);
    harness.render(SegmentDescriptor::open_ended(45.0), &[]).unwrap();

    let job = &harness.jobs()[0];
    assert_eq!((job.window.start(), job.window.end()), (45.0, 60.0));
}

#[test]
fn missing_source_fails_while_loading() {
    let harness = Harness::new(AppConfig::default(), Outcome::Write);
    let err = harness
        .renderer
        .render(
            Path::new("/media/missing.mp4"),
            &SegmentDescriptor::new(0.0, 10.0),
            &harness.output(),
            &[],
            None,
        )
        .unwrap_err();

    assert!(matches!(err, ReelcutError::MediaOpen { .. }));
    assert_eq!(harness.stages(), vec![RenderStage::Failed]);
}

#[test]
fn degenerate_source_is_invalid_argument() {
    let renderer = ClipRenderer::with_backends(
        Box::new(FakeProbe {
            width: 1920,
            height: 0,
            duration_secs: 60.0,
        }),
        Box::new(RecordingBackend {
            outcome: Outcome::Write,
            recorded: Arc::default(),
        }),
        AppConfig::default(),
    )
    .unwrap();
    let dir = tempfile::tempdir().unwrap();
    let err = renderer
        .render(
            Path::new("/media/source.mp4"),
            &SegmentDescriptor::new(0.0, 10.0),
            &dir.path().join("out.mp4"),
            &[],
            None,
        )
        .unwrap_err();
    assert!(matches!(err, ReelcutError::InvalidArgument { .. }));
}

#[test]
fn encoder_failure_is_reported() {
    let harness = Harness::new(AppConfig::default(), Outcome::Fail);
    let err = harness
        .render(SegmentDescriptor::new(0.0, 10.0), &[])
        .unwrap_err();
    assert!(matches!(err, ReelcutError::Encoding { .. }));
    assert_eq!(harness.stages().last(), Some(&RenderStage::Failed));
    assert!(!harness.stages().contains(&RenderStage::Composited));
}

#[test]
fn missing_output_is_an_encoding_error() {
    let harness = Harness::new(AppConfig::default(), Outcome::WriteNothing);
    let err = harness
        .render(SegmentDescriptor::new(0.0, 10.0), &[])
        .unwrap_err();
    assert!(matches!(err, ReelcutError::Encoding { .. }));
}

#[test]
fn unrenderable_chunk_is_omitted() {
    let mut config = AppConfig::default();
    config.captions.chunk_size = 1;
    let harness = Harness::new(config, Outcome::Write);
    let words = vec![
        WordTiming::new("hello", 1.0, 1.5),
        WordTiming::new("\u{65E5}\u{672C}", 1.5, 2.0),
        WordTiming::new("world", 2.0, 2.5),
    ];

    harness.render(SegmentDescriptor::new(0.0, 10.0), &words).unwrap();
    let captions = &harness.jobs()[0].captions;
    assert_eq!(captions.len(), 2);
    assert_eq!(captions[1].start, 2.0);
}

#[test]
fn sidecar_is_written_when_enabled() {
    let mut config = AppConfig::default();
    config.captions.write_sidecar = true;
    let harness = Harness::new(config, Outcome::Write);
    harness
        .render(SegmentDescriptor::new(10.0, 40.0), &steady_words())
        .unwrap();

    let srt = std::fs::read_to_string(harness.output().with_extension("srt")).unwrap();
    assert!(srt.starts_with("1\n00:00:00,000 --> 00:00:01,900\n"));
}

#[test]
fn batch_keeps_going_after_a_bad_segment() {
    let harness = Harness::new(AppConfig::default(), Outcome::Write);
    let segments = vec![
        SegmentDescriptor::new(0.0, 10.0).with_title("First hook"),
        SegmentDescriptor::new(70.0, 80.0),
        SegmentDescriptor::new(20.0, 30.0).with_title("Third"),
    ];
    let out_dir = harness.dir.path().join("batch");

    let results = harness.renderer.render_all(
        Path::new("/media/source.mp4"),
        &segments,
        &out_dir,
        &steady_words(),
        None,
    );

    assert_eq!(results.len(), 3);
    let first = results[0].as_ref().unwrap();
    let name = first.output_path.file_name().unwrap().to_string_lossy();
    assert!(name.starts_with("clip_1_First hook_"));
    assert!(matches!(results[1], Err(ReelcutError::InvalidRange { .. })));
    assert!(results[2].is_ok());
    assert_eq!(harness.jobs().len(), 2);
}

#[tokio::test]
async fn blocking_helper_renders_on_worker() {
    let harness = Harness::new(AppConfig::default(), Outcome::Write);
    let output = harness.output();
    let renderer = Arc::new(harness.renderer);

    let result = render_clip_blocking(
        renderer,
        PathBuf::from("/media/source.mp4"),
        SegmentDescriptor::new(0.0, 5.0),
        output.clone(),
        steady_words(),
        None,
    )
    .await
    .unwrap();

    assert!(result.success);
    assert_eq!(result.output_path, output);
}
