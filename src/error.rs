//! Extraction error taxonomy
//!
//! Every variant is recovered inside the extraction layer; callers see them only
//! as the reason attached to a degraded [`crate::analysis::Extraction`].

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    /// The optimized analysis library is not compiled in or failed to initialize
    #[error("Optimized backend unavailable: {0}")]
    BackendUnavailable(String),

    /// The asset resolver could not supply bytes for the source
    #[error("Audio source unavailable: {0}")]
    SourceUnavailable(String),

    /// Bytes were supplied but could not be decoded to PCM
    #[error("Failed to decode audio: {0}")]
    DecodeFailure(String),

    /// Zero-length sample buffer
    #[error("Input buffer is empty")]
    EmptyInput,

    /// Unexpected fault inside a backend
    #[error("Extraction failed: {0}")]
    ExtractionFailure(String),
}

impl ExtractionError {
    /// Short machine-friendly name used in reports
    pub fn kind(&self) -> &'static str {
        match self {
            ExtractionError::BackendUnavailable(_) => "backendUnavailable",
            ExtractionError::SourceUnavailable(_) => "sourceUnavailable",
            ExtractionError::DecodeFailure(_) => "decodeFailure",
            ExtractionError::EmptyInput => "emptyInput",
            ExtractionError::ExtractionFailure(_) => "extractionFailure",
        }
    }
}
