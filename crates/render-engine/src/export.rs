//! Encode jobs and the ffmpeg render backend.

use std::io::{BufRead, BufReader, Read};
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};

use reelcut_clip_model::layout::RenderLayout;
use reelcut_clip_model::segment::ClipWindow;
use reelcut_common::config::RenderDefaults;
use reelcut_common::error::{ReelcutError, ReelcutResult};

use crate::compositor::{build_filter_graph, CaptionOverlay};
use crate::progress::ProgressSink;

/// Everything needed to encode one clip.
#[derive(Debug, Clone)]
pub struct EncodeJob {
    /// Source video path.
    pub source_path: PathBuf,

    /// Clamped clip range in source time.
    pub window: ClipWindow,

    /// Whether the source carries an audio stream to keep.
    pub has_audio: bool,

    /// Layer geometry.
    pub layout: RenderLayout,

    /// Caption bitmaps and their display intervals.
    pub captions: Vec<CaptionOverlay>,

    /// Output file path.
    pub output_path: PathBuf,

    /// Encoder settings.
    pub settings: RenderDefaults,
}

/// Trait for render backends.
pub trait RenderBackend: Send + Sync {
    /// Encode the job, writing exactly one file at `job.output_path`.
    ///
    /// Progress fractions are relative to the clip duration and may be
    /// reported out of order; callers wrap the sink as needed.
    fn encode(&self, job: &EncodeJob, progress: &dyn ProgressSink) -> ReelcutResult<()>;

    /// Check if this backend is available on the system.
    fn is_available(&self) -> bool;

    /// Backend name.
    fn name(&self) -> &str;
}

/// Backend that shells out to `ffmpeg`.
#[derive(Debug, Clone)]
pub struct FfmpegBackend {
    binary: String,
}

impl Default for FfmpegBackend {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

impl FfmpegBackend {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn run_ffmpeg(&self, job: &EncodeJob, args: &[String], progress: &dyn ProgressSink) -> ReelcutResult<()> {
        tracing::debug!(args = ?args, "Running ffmpeg");
        let mut cmd = Command::new(&self.binary);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let start = std::time::Instant::now();
        let child = cmd
            .spawn()
            .map_err(|e| ReelcutError::encoding(format!("Failed to start {}: {e}", self.binary)))?;
        let mut child = ChildGuard::new(child);

        tracing::info!(
            pid = child.id(),
            captions = job.captions.len(),
            duration_secs = job.window.duration(),
            "ffmpeg process started"
        );

        let stdout = child
            .stdout()
            .ok_or_else(|| ReelcutError::encoding("Failed to capture ffmpeg stdout"))?;
        let stderr = child
            .stderr()
            .ok_or_else(|| ReelcutError::encoding("Failed to capture ffmpeg stderr"))?;

        // Drain stderr concurrently to avoid ffmpeg blocking on a full stderr pipe.
        let stderr_task = std::thread::spawn(move || -> String {
            let mut reader = BufReader::new(stderr);
            let mut output = String::new();
            match reader.read_to_string(&mut output) {
                Ok(_) => output,
                Err(err) => format!("<failed to read ffmpeg stderr: {err}>"),
            }
        });

        let duration = job.window.duration();
        let mut reader = BufReader::new(stdout);
        let mut line = String::new();
        let mut latest = ProgressState::default();
        let mut last_progress_secs = 0.0f64;
        let mut last_progress_wall = std::time::Instant::now();
        loop {
            line.clear();
            let bytes = reader
                .read_line(&mut line)
                .map_err(|e| ReelcutError::encoding(format!("Failed reading ffmpeg progress: {e}")))?;
            if bytes == 0 {
                break;
            }

            let Some((key, value)) = line.trim().split_once('=') else {
                continue;
            };
            latest.update(key, value);
            if key != "progress" {
                continue;
            }

            if latest.out_time_secs > last_progress_secs + 0.001 {
                last_progress_secs = latest.out_time_secs;
                last_progress_wall = std::time::Instant::now();
            }
            progress.report(latest.fraction(duration));
            if last_progress_wall.elapsed().as_secs() >= 10 {
                tracing::warn!(
                    out_time_secs = latest.out_time_secs,
                    elapsed_secs = start.elapsed().as_secs_f64(),
                    "No ffmpeg progress advancement for 10s"
                );
                last_progress_wall = std::time::Instant::now();
            }
        }

        let status = child
            .wait()
            .map_err(|e| ReelcutError::encoding(format!("Failed to wait on ffmpeg: {e}")))?;

        let stderr_output = stderr_task
            .join()
            .unwrap_or_else(|_| "<failed to join stderr reader>".to_string());

        if !status.success() {
            return Err(ReelcutError::encoding(format!(
                "ffmpeg failed (status {}): {}",
                status,
                stderr_output.trim()
            )));
        }

        tracing::info!(
            elapsed_secs = start.elapsed().as_secs_f64(),
            output = %job.output_path.display(),
            "ffmpeg finished"
        );
        Ok(())
    }
}

impl RenderBackend for FfmpegBackend {
    fn encode(&self, job: &EncodeJob, progress: &dyn ProgressSink) -> ReelcutResult<()> {
        let args = ffmpeg_args(job);
        self.run_ffmpeg(job, &args, progress)?;
        verify_output(&job.output_path)
    }

    fn is_available(&self) -> bool {
        command_exists(&self.binary)
    }

    fn name(&self) -> &str {
        "ffmpeg"
    }
}

/// Fail unless `path` is a non-empty file.
pub fn verify_output(path: &std::path::Path) -> ReelcutResult<()> {
    match std::fs::metadata(path) {
        Ok(meta) if meta.is_file() && meta.len() > 0 => Ok(()),
        Ok(_) => Err(ReelcutError::encoding(format!(
            "Encoder produced an empty file at {}",
            path.display()
        ))),
        Err(err) => Err(ReelcutError::encoding(format!(
            "Encoder produced no file at {}: {err}",
            path.display()
        ))),
    }
}

/// Full ffmpeg argument list for a job.
pub fn ffmpeg_args(job: &EncodeJob) -> Vec<String> {
    let duration = format!("{:.3}", job.window.duration());
    let mut args: Vec<String> = [
        "-y",
        "-hide_banner",
        "-nostats",
        "-loglevel",
        "error",
        "-progress",
        "pipe:1",
        "-ss",
    ]
    .into_iter()
    .map(String::from)
    .collect();

    args.push(format!("{:.3}", job.window.start()));
    args.push("-t".to_string());
    args.push(duration.clone());
    args.push("-i".to_string());
    args.push(job.source_path.display().to_string());

    // Each still only needs to last until its caption ends.
    for caption in &job.captions {
        args.extend([
            "-loop".to_string(),
            "1".to_string(),
            "-t".to_string(),
            format!("{:.3}", caption.end),
            "-i".to_string(),
            caption.image_path.display().to_string(),
        ]);
    }

    args.push("-filter_complex".to_string());
    args.push(build_filter_graph(&job.layout, &job.captions));
    args.push("-map".to_string());
    args.push("[vout]".to_string());

    if job.has_audio {
        args.push("-map".to_string());
        args.push("0:a:0?".to_string());
    }

    args.extend(codec_args(&job.settings, job.has_audio));
    args.push("-t".to_string());
    args.push(duration);
    args.push(job.output_path.display().to_string());
    args
}

fn codec_args(settings: &RenderDefaults, has_audio: bool) -> Vec<String> {
    let mut args = vec![
        "-c:v".to_string(),
        "libx264".to_string(),
        "-preset".to_string(),
        settings.preset.clone(),
        "-crf".to_string(),
        settings.crf.to_string(),
        "-r".to_string(),
        settings.fps.max(1).to_string(),
        "-pix_fmt".to_string(),
        "yuv420p".to_string(),
    ];

    if has_audio {
        args.extend([
            "-c:a".to_string(),
            "aac".to_string(),
            "-b:a".to_string(),
            format!("{}k", settings.audio_bitrate_kbps.max(64)),
        ]);
    } else {
        args.push("-an".to_string());
    }

    args.extend([
        "-threads".to_string(),
        settings.threads.to_string(),
        "-movflags".to_string(),
        "+faststart".to_string(),
    ]);
    args
}

/// Whether `binary -version` runs and exits cleanly.
pub(crate) fn command_exists(binary: &str) -> bool {
    Command::new(binary)
        .arg("-version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

/// Kills and reaps the child unless it was waited on.
struct ChildGuard {
    child: Option<Child>,
}

impl ChildGuard {
    fn new(child: Child) -> Self {
        Self { child: Some(child) }
    }

    fn id(&self) -> Option<u32> {
        self.child.as_ref().map(Child::id)
    }

    fn stdout(&mut self) -> Option<std::process::ChildStdout> {
        self.child.as_mut().and_then(|c| c.stdout.take())
    }

    fn stderr(&mut self) -> Option<std::process::ChildStderr> {
        self.child.as_mut().and_then(|c| c.stderr.take())
    }

    fn wait(mut self) -> std::io::Result<ExitStatus> {
        match self.child.take() {
            Some(mut child) => child.wait(),
            None => Err(std::io::Error::other("child already reaped")),
        }
    }
}

impl Drop for ChildGuard {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take() {
            tracing::warn!(pid = child.id(), "Killing unfinished ffmpeg process");
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

#[derive(Debug, Default)]
struct ProgressState {
    out_time_secs: f64,
    complete: bool,
}

impl ProgressState {
    fn update(&mut self, key: &str, value: &str) {
        match key {
            // Despite the name, ffmpeg reports microseconds here too.
            "out_time_ms" | "out_time_us" => {
                if let Ok(us) = value.trim().parse::<f64>() {
                    self.out_time_secs = us / 1_000_000.0;
                }
            }
            "progress" => {
                self.complete = value.trim() == "end";
            }
            _ => {}
        }
    }

    fn fraction(&self, duration_secs: f64) -> f64 {
        if self.complete {
            return 1.0;
        }
        if duration_secs <= 0.0 {
            return 0.0;
        }
        (self.out_time_secs / duration_secs).clamp(0.0, 1.0)
    }
}
