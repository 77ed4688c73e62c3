//! Print the layout plan for a source resolution.

use reelcut_clip_model::layout::Size;
use reelcut_common::config::AppConfig;
use reelcut_processing_core::plan_layout;

pub fn run(config: &AppConfig, width: u32, height: u32) -> anyhow::Result<()> {
    let source = Size::new(width, height);
    if source.is_degenerate() {
        anyhow::bail!("Source size must be non-zero, got {width}x{height}");
    }
    let target = Size::new(config.render.target_width, config.render.target_height);
    let layout = plan_layout(source, target, &config.layout);

    println!("{}", serde_json::to_string_pretty(&layout)?);
    Ok(())
}
