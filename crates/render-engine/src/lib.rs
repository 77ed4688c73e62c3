//! Reelcut Render Engine
//!
//! Turns a planned clip into a finished vertical video.
//!
//! # Pipeline Architecture
//!
//! ```text
//! source.mp4 ──► probe ──► window clamp ──► layout plan
//!                                               │
//! words ──► caption chunks ──► rasterize (PNG)  │
//!                                   │           │
//!                                   ▼           ▼
//!                      ┌──── ffmpeg filter graph ─────┐
//!                      │ blurred, dimmed background   │
//!                      │ centered sharp foreground    │
//!                      │ time-gated caption overlays  │
//!                      └──────────────┬───────────────┘
//!                                     ▼
//!                              Encode (H.264/AAC)
//!                                     │
//!                                     ▼
//!                                 clip.mp4
//! ```

pub mod builtin_font;
pub mod compositor;
pub mod export;
pub mod probe;
pub mod progress;
pub mod render;
pub mod text;

pub use export::{EncodeJob, FfmpegBackend, RenderBackend};
pub use probe::{FfprobeProbe, MediaProbe};
pub use progress::{MonotonicProgress, NoProgress, ProgressSink};
pub use render::{render_clip_blocking, ClipRenderer, RenderStage};
pub use text::{CaptionFont, CaptionRasterizer, TextStyle};
