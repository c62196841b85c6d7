//! Backend trait definitions

use super::config::ExtractionConfig;
use crate::error::ExtractionError;
use crate::model::AudioMarkers;
use serde::Serialize;

/// Marker extraction strategy - allows swapping between the optimized and fallback backends
///
/// Implementations receive mono samples; downmixing and empty-input handling
/// happen in the extractor before a backend is called.
pub trait MarkerBackend: Send + Sync {
    /// Which implementation this is
    fn kind(&self) -> BackendKind;

    /// Extract the full marker set from mono samples
    fn extract(
        &self,
        samples: &[f32],
        sample_rate: u32,
        config: &ExtractionConfig,
    ) -> Result<AudioMarkers, ExtractionError>;
}

/// Concrete backend implementations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Library-backed analysis (stratum-dsp)
    Optimized,

    /// Dependency-free energy analysis
    Fallback,

    /// No analysis ran; the fixed 120-BPM substitute grid
    Synthetic,
}

impl BackendKind {
    pub fn name(&self) -> &'static str {
        match self {
            BackendKind::Optimized => "optimized",
            BackendKind::Fallback => "fallback",
            BackendKind::Synthetic => "synthetic",
        }
    }
}

/// Backend requested at extractor construction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendChoice {
    /// Optimized when compiled in, fallback otherwise
    #[default]
    Auto,

    /// Optimized; unavailability is reported on every extraction
    Optimized,

    /// Fallback only
    Fallback,
}
