//! Show source media properties.

use std::path::PathBuf;

use reelcut_common::config::AppConfig;
use reelcut_render_engine::{FfprobeProbe, MediaProbe};

pub fn run(config: &AppConfig, source: PathBuf) -> anyhow::Result<()> {
    let probe = FfprobeProbe::new(config.render.ffprobe_bin.clone());
    let video = probe.probe(&source)?;

    println!("Source: {}", video.path.display());
    println!("  Resolution: {}x{}", video.width, video.height);
    println!("  Duration: {:.3}s", video.duration_secs);
    println!("  Audio: {}", if video.has_audio { "yes" } else { "no" });
    Ok(())
}
