//! Reelcut Processing Core
//!
//! Decides what a vertical clip looks like before any pixels are touched:
//! - **Layout:** foreground fit and background cover/crop for the 9:16 canvas
//! - **Captions:** word timings grouped into short clip-relative chunks
//! - **Subtitles:** SRT/WebVTT sidecars from the same chunks
//!
//! Layout and caption planning are pure computation. All inputs are data;
//! all outputs are data.

pub mod captions;
pub mod layout;
pub mod subtitles;

pub use captions::{caption_chunks, segment_captions, CaptionChunks, SegmenterConfig};
pub use layout::plan_layout;
