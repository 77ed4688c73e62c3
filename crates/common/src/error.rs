//! Error types shared across Reelcut crates.

use std::path::PathBuf;

/// Top-level error type for Reelcut operations.
#[derive(Debug, thiserror::Error)]
pub enum ReelcutError {
    #[error("Cannot open media {path}: {message}")]
    MediaOpen { path: PathBuf, message: String },

    #[error("Invalid clip range [{start:.3}, {end:.3}] for source of {duration:.3}s")]
    InvalidRange { start: f64, end: f64, duration: f64 },

    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("Rasterization error: {message}")]
    Rasterization { message: String },

    #[error("Encoding error: {message}")]
    Encoding { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using ReelcutError.
pub type ReelcutResult<T> = Result<T, ReelcutError>;

impl ReelcutError {
    pub fn media_open(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::MediaOpen {
            path: path.into(),
            message: msg.into(),
        }
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: msg.into(),
        }
    }

    pub fn rasterization(msg: impl Into<String>) -> Self {
        Self::Rasterization {
            message: msg.into(),
        }
    }

    pub fn encoding(msg: impl Into<String>) -> Self {
        Self::Encoding {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Short stable identifier for structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MediaOpen { .. } => "media_open",
            Self::InvalidRange { .. } => "invalid_range",
            Self::InvalidArgument { .. } => "invalid_argument",
            Self::Rasterization { .. } => "rasterization",
            Self::Encoding { .. } => "encoding",
            Self::Config { .. } => "config",
            Self::Io(_) => "io",
            Self::Json(_) => "json",
            Self::Other(_) => "other",
        }
    }

    /// Whether the render call that produced this error must be abandoned.
    ///
    /// Rasterization failures are recovered inside a render (fallback font or
    /// a dropped caption chunk) and only surface from the rasterizer itself.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Rasterization { .. })
    }

    /// Whether the caller should skip this segment rather than report a fault.
    pub fn is_skippable_segment(&self) -> bool {
        matches!(self, Self::InvalidRange { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_range_message() {
        let err = ReelcutError::InvalidRange {
            start: 50.0,
            end: 50.0,
            duration: 100.0,
        };
        assert_eq!(
            err.to_string(),
            "Invalid clip range [50.000, 50.000] for source of 100.000s"
        );
        assert!(err.is_skippable_segment());
        assert_eq!(err.kind(), "invalid_range");
    }

    #[test]
    fn test_rasterization_is_not_fatal() {
        assert!(!ReelcutError::rasterization("no glyphs").is_fatal());
        assert!(ReelcutError::encoding("ffmpeg exited").is_fatal());
        assert!(ReelcutError::media_open("/tmp/x.mp4", "missing").is_fatal());
    }

    #[test]
    fn test_every_category_has_its_own_kind() {
        let errors = [
            ReelcutError::media_open("/tmp/x.mp4", "missing"),
            ReelcutError::InvalidRange {
                start: 1.0,
                end: 0.0,
                duration: 10.0,
            },
            ReelcutError::invalid_argument("zero width"),
            ReelcutError::rasterization("no glyphs"),
            ReelcutError::encoding("ffmpeg exited"),
            ReelcutError::config("bad value"),
        ];
        let kinds: std::collections::HashSet<_> = errors.iter().map(|e| e.kind()).collect();
        assert_eq!(kinds.len(), errors.len());
    }

    #[test]
    fn test_io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: ReelcutError = io.into();
        assert_eq!(err.kind(), "io");
    }
}
