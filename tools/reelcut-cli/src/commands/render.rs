//! Render vertical clips for a list of segments.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use reelcut_clip_model::segment::SegmentDescriptor;
use reelcut_clip_model::transcript::Transcript;
use reelcut_common::config::AppConfig;
use reelcut_common::error::ReelcutResult;
use reelcut_render_engine::{render_clip_blocking, ClipRenderer};

pub struct RenderArgs {
    pub source: PathBuf,
    pub segments: PathBuf,
    pub words: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub only: Option<usize>,
    pub no_captions: bool,
    pub chunk_size: Option<usize>,
}

pub async fn run(mut config: AppConfig, args: RenderArgs) -> anyhow::Result<()> {
    if args.no_captions {
        config.captions.enabled = false;
    }
    if let Some(chunk_size) = args.chunk_size {
        config.captions.chunk_size = chunk_size;
    }
    let output_dir = args.output_dir.unwrap_or_else(|| config.output_dir.clone());

    let segments_json = std::fs::read_to_string(&args.segments)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {e}", args.segments.display()))?;
    let segments = SegmentDescriptor::list_from_json(&segments_json)
        .map_err(|e| anyhow::anyhow!("Invalid segments file: {e}"))?;

    let transcript = match &args.words {
        Some(path) => Transcript::load(path)?,
        None => Transcript::default(),
    };

    let selected: Vec<(usize, SegmentDescriptor)> = match args.only {
        Some(n) => {
            let segment = segments.get(n.wrapping_sub(1)).cloned().ok_or_else(|| {
                anyhow::anyhow!("Segment {n} out of range (1..={})", segments.len())
            })?;
            vec![(n, segment)]
        }
        None => segments.into_iter().enumerate().map(|(i, s)| (i + 1, s)).collect(),
    };

    println!("Rendering from: {}", args.source.display());
    println!("  Segments: {}", selected.len());
    println!("  Words: {}", transcript.len());
    println!(
        "  Captions: {}",
        if config.captions.enabled { "on" } else { "off" }
    );
    println!("  Output: {}", output_dir.display());

    let renderer = Arc::new(ClipRenderer::new(config)?);
    let stamp = chrono::Utc::now().timestamp();
    let mut summary = RenderSummary::default();

    for (index, segment) in selected {
        let output_path = output_dir.join(segment.output_file_name(index, stamp));
        let end = match segment.end {
            Some(end) => format!("{end:.1}s"),
            None => "end".to_string(),
        };
        println!("\n[{index}] {:.1}s - {end} {}", segment.start, segment.title);

        let progress: Box<dyn Fn(f64) + Send> = Box::new(|fraction: f64| {
            print!("\r  Progress: {:.1}%  ", fraction * 100.0);
            let _ = std::io::stdout().flush();
        });

        let result = render_clip_blocking(
            renderer.clone(),
            args.source.clone(),
            segment,
            output_path,
            transcript.words().to_vec(),
            Some(progress),
        )
        .await;
        match &result {
            Ok(result) => println!("\n  Clip complete: {}", result.output_path.display()),
            Err(e) if e.is_skippable_segment() => println!("\n  Skipped: {e}"),
            Err(e) => println!("\n  Render failed: {e}"),
        }
        summary.record(&result);
    }

    println!(
        "\nRendered {} clip(s), skipped {}, failed {}.",
        summary.rendered, summary.skipped, summary.failed
    );
    summary.into_result()
}

/// Per-run tally. Skipped segments are expected; failures are not.
#[derive(Debug, Default, PartialEq)]
struct RenderSummary {
    rendered: usize,
    skipped: usize,
    failed: usize,
}

impl RenderSummary {
    fn record<T>(&mut self, result: &ReelcutResult<T>) {
        match result {
            Ok(_) => self.rendered += 1,
            Err(e) if e.is_skippable_segment() => self.skipped += 1,
            Err(_) => self.failed += 1,
        }
    }

    fn into_result(self) -> anyhow::Result<()> {
        if self.failed > 0 {
            anyhow::bail!("{} of {} clip(s) failed to render", self.failed, self.total());
        }
        Ok(())
    }

    fn total(&self) -> usize {
        self.rendered + self.skipped + self.failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reelcut_common::error::ReelcutError;

    fn invalid_range() -> ReelcutResult<()> {
        Err(ReelcutError::InvalidRange {
            start: 70.0,
            end: 80.0,
            duration: 60.0,
        })
    }

    #[test]
    fn test_skipped_segments_do_not_fail_the_run() {
        let mut summary = RenderSummary::default();
        summary.record(&Ok(()));
        summary.record(&invalid_range());
        assert_eq!(summary.skipped, 1);
        assert!(summary.into_result().is_ok());
    }

    #[test]
    fn test_render_failure_fails_the_run() {
        let mut summary = RenderSummary::default();
        summary.record(&Ok(()));
        summary.record(&Err::<(), _>(ReelcutError::encoding("ffmpeg failed (status 1)")));
        let err = summary.into_result().unwrap_err();
        assert_eq!(err.to_string(), "1 of 2 clip(s) failed to render");
    }
}
