//! Check system capabilities.

use reelcut_common::config::{config_file_path, AppConfig};
use reelcut_render_engine::{CaptionFont, FfmpegBackend, FfprobeProbe, MediaProbe, RenderBackend};

pub fn run(config: &AppConfig) -> anyhow::Result<()> {
    println!("Reelcut System Check");
    println!("{}", "=".repeat(50));

    let probe = FfprobeProbe::new(config.render.ffprobe_bin.clone());
    let backend = FfmpegBackend::new(config.render.ffmpeg_bin.clone());
    let probe_ok = probe.is_available();
    let backend_ok = backend.is_available();

    report(probe_ok, &format!("Media probe: {}", config.render.ffprobe_bin));
    report(backend_ok, &format!("Encoder: {}", config.render.ffmpeg_bin));

    match CaptionFont::resolve(config.captions.font_path.as_deref()) {
        CaptionFont::Builtin => println!("[WARN] Caption font: built-in bitmap fallback"),
        font => println!("[OK] Caption font: {}", font.name()),
    }

    let config_path = config_file_path();
    println!(
        "[OK] Config: {} ({})",
        config_path.display(),
        if config_path.exists() { "loaded" } else { "defaults" }
    );
    println!(
        "     captions {}, chunk size {}, output {}",
        if config.captions.enabled { "on" } else { "off" },
        config.captions.chunk_size,
        config.output_dir.display()
    );

    println!();
    if probe_ok && backend_ok {
        println!("All required tools are available. Reelcut is ready.");
    } else {
        println!("Some required tools are missing. Install ffmpeg and ffprobe.");
    }

    Ok(())
}

fn report(ok: bool, label: &str) {
    if ok {
        println!("[OK] {label}");
    } else {
        println!("[MISSING] {label}");
    }
}
