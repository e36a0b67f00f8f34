//! Error Types

use std::fmt;
use thiserror::Error;

/// Pipeline step an error was raised in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Downmix,
    Resample,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Downmix => write!(f, "downmix"),
            Stage::Resample => write!(f, "resample"),
        }
    }
}

/// Coarse error category, independent of the step that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Io,
    Format,
    Conversion,
    Config,
}

/// Main error type
#[derive(Debug, Error)]
pub enum NormalizerError {
    #[error("IO error: {message}")]
    Io { message: String },
    #[error("Format error: {message}")]
    Format { message: String },
    #[error("Conversion error: {message}")]
    Conversion { message: String },
    #[error("Config error: {message}")]
    Config { message: String },
    #[error("{stage} step failed: {source}")]
    Step {
        stage: Stage,
        #[source]
        source: Box<NormalizerError>,
    },
}

impl NormalizerError {
    pub fn io<S: Into<String>>(msg: S) -> Self { Self::Io { message: msg.into() } }
    pub fn format<S: Into<String>>(msg: S) -> Self { Self::Format { message: msg.into() } }
    pub fn conversion<S: Into<String>>(msg: S) -> Self { Self::Conversion { message: msg.into() } }
    pub fn config<S: Into<String>>(msg: S) -> Self { Self::Config { message: msg.into() } }

    /// Tag an error with the step it came from. Already-tagged errors keep their stage.
    pub fn in_stage(self, stage: Stage) -> Self {
        match self {
            Self::Step { .. } => self,
            other => Self::Step { stage, source: Box::new(other) },
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Io { .. } => ErrorKind::Io,
            Self::Format { .. } => ErrorKind::Format,
            Self::Conversion { .. } => ErrorKind::Conversion,
            Self::Config { .. } => ErrorKind::Config,
            Self::Step { source, .. } => source.kind(),
        }
    }

    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::Step { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, NormalizerError>;

impl From<std::io::Error> for NormalizerError {
    fn from(err: std::io::Error) -> Self { Self::io(err.to_string()) }
}

impl From<hound::Error> for NormalizerError {
    fn from(err: hound::Error) -> Self {
        match err {
            hound::Error::IoError(e) => Self::io(e.to_string()),
            other => Self::format(format!("WAV: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let e = NormalizerError::format("bad header");
        assert!(e.to_string().contains("Format"));
        assert!(e.to_string().contains("bad header"));
    }

    #[test]
    fn test_step_keeps_kind() {
        let e = NormalizerError::conversion("rate").in_stage(Stage::Resample);
        assert_eq!(e.kind(), ErrorKind::Conversion);
        assert_eq!(e.stage(), Some(Stage::Resample));
        assert!(e.to_string().starts_with("resample step failed"));
    }

    #[test]
    fn test_stage_not_rewrapped() {
        let e = NormalizerError::io("gone")
            .in_stage(Stage::Downmix)
            .in_stage(Stage::Resample);
        assert_eq!(e.stage(), Some(Stage::Downmix));
    }

    #[test]
    fn test_hound_error_mapping() {
        let io = hound::Error::IoError(std::io::Error::new(std::io::ErrorKind::NotFound, "missing"));
        assert_eq!(NormalizerError::from(io).kind(), ErrorKind::Io);

        let fmt = hound::Error::FormatError("no RIFF tag found");
        assert_eq!(NormalizerError::from(fmt).kind(), ErrorKind::Format);

        assert_eq!(NormalizerError::from(hound::Error::Unsupported).kind(), ErrorKind::Format);
    }
}
