//! Reelcut Clip Model
//!
//! Defines the core data contracts for clip rendering:
//! - **Media:** Source video handles and render results
//! - **Segments:** Candidate time ranges and their clamped clip windows
//! - **Transcripts:** Normalized word-level timings
//! - **Captions:** Clip-relative caption chunks
//! - **Layout:** Pixel geometry of the vertical canvas
//! - **Color:** Caption fill and outline colors
//!
//! Transcript and segment times are absolute source seconds; caption chunk
//! times are relative to the start of the clip.

pub mod caption;
pub mod color;
pub mod layout;
pub mod media;
pub mod segment;
pub mod transcript;

pub use caption::*;
pub use color::*;
pub use layout::*;
pub use media::*;
pub use segment::*;
pub use transcript::*;
