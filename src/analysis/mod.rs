//! Marker extraction
//!
//! Extraction goes through the `MarkerBackend` trait. The optimized backend is
//! powered by stratum-dsp (tempo, key, beat grid) and realfft (spectral flux)
//! and is compiled in with the `optimized` feature. The fallback backend uses
//! only energy analysis and is always available.

mod config;
mod envelope;
mod extractor;
mod fallback;
mod harmonic;
mod pattern;
mod traits;

#[cfg(feature = "optimized")]
mod spectral;
#[cfg(feature = "optimized")]
mod stratum;

pub use config::{
    BeatMethod, BeatTrackingConfig, ExtractionConfig, HarmonicAnalysisConfig, OnsetDetectionConfig,
    OnsetMethod, PatternDetectionConfig,
};
pub use extractor::{select_backend, Extraction, ExtractionStatus, Extractor};
pub use fallback::FallbackBackend;
pub use pattern::{classify_pattern, IntervalClass};
pub use traits::{BackendChoice, BackendKind, MarkerBackend};

#[cfg(feature = "optimized")]
pub use stratum::OptimizedBackend;
