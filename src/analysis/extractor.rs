//! Extractor: backend selection, downmixing and local failure recovery

use super::config::ExtractionConfig;
use super::fallback::FallbackBackend;
use super::traits::{BackendChoice, BackendKind, MarkerBackend};
use crate::error::ExtractionError;
use crate::model::AudioMarkers;
use crate::source::PcmBuffer;
use std::panic::{self, AssertUnwindSafe};

/// Outcome of one extraction
///
/// Extraction never fails outright: faults are recovered locally and reported
/// through `status` next to whatever usable markers were produced.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub markers: AudioMarkers,
    pub status: ExtractionStatus,
    /// Backend that produced `markers`
    pub backend: BackendKind,
}

/// Tri-state extraction status
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionStatus {
    /// The selected backend produced the markers
    Complete,
    /// Markers are usable but came from a substitute path
    Degraded(ExtractionError),
    /// The input had no samples; all collections are empty
    Empty,
}

impl Extraction {
    pub fn complete(markers: AudioMarkers, backend: BackendKind) -> Self {
        Self {
            markers,
            status: ExtractionStatus::Complete,
            backend,
        }
    }

    pub fn degraded(markers: AudioMarkers, reason: ExtractionError, backend: BackendKind) -> Self {
        Self {
            markers,
            status: ExtractionStatus::Degraded(reason),
            backend,
        }
    }

    pub fn empty(backend: BackendKind) -> Self {
        Self {
            markers: AudioMarkers::empty(),
            status: ExtractionStatus::Empty,
            backend,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self.status, ExtractionStatus::Degraded(_))
    }

    /// Why the extraction degraded, if it did
    pub fn reason(&self) -> Option<&ExtractionError> {
        match &self.status {
            ExtractionStatus::Degraded(reason) => Some(reason),
            _ => None,
        }
    }

    /// Status name used in reports: "complete", "degraded" or "empty"
    pub fn status_name(&self) -> &'static str {
        match self.status {
            ExtractionStatus::Complete => "complete",
            ExtractionStatus::Degraded(_) => "degraded",
            ExtractionStatus::Empty => "empty",
        }
    }
}

/// Build the backend for `choice`
///
/// Returns the backend plus the reason the optimized backend could not be used,
/// when one was explicitly requested and is missing.
pub fn select_backend(
    choice: BackendChoice,
) -> (Box<dyn MarkerBackend>, Option<ExtractionError>) {
    match choice {
        BackendChoice::Fallback => (Box::new(FallbackBackend::new()), None),
        BackendChoice::Auto => match optimized_backend() {
            Ok(backend) => (backend, None),
            Err(e) => {
                log::debug!("{}; using fallback backend", e);
                (Box::new(FallbackBackend::new()), None)
            }
        },
        BackendChoice::Optimized => match optimized_backend() {
            Ok(backend) => (backend, None),
            Err(e) => {
                log::warn!("{}; substituting fallback backend", e);
                (Box::new(FallbackBackend::new()), Some(e))
            }
        },
    }
}

#[cfg(feature = "optimized")]
fn optimized_backend() -> Result<Box<dyn MarkerBackend>, ExtractionError> {
    Ok(Box::new(super::stratum::OptimizedBackend::new()))
}

#[cfg(not(feature = "optimized"))]
fn optimized_backend() -> Result<Box<dyn MarkerBackend>, ExtractionError> {
    Err(ExtractionError::BackendUnavailable(
        "built without the `optimized` feature".to_string(),
    ))
}

/// Turns sample buffers into marker sets through one selected backend
pub struct Extractor {
    backend: Box<dyn MarkerBackend>,
    fallback: FallbackBackend,
    /// Set when the requested backend was substituted at construction
    unavailable: Option<ExtractionError>,
    config: ExtractionConfig,
}

impl Extractor {
    /// Select a backend once and keep it for every extraction
    pub fn new(choice: BackendChoice, config: ExtractionConfig) -> Self {
        let (backend, unavailable) = select_backend(choice);
        log::debug!("Extractor using {} backend", backend.kind().name());

        Self {
            backend,
            fallback: FallbackBackend::new(),
            unavailable,
            config,
        }
    }

    /// Extractor that only ever runs the fallback backend
    pub fn fallback(config: ExtractionConfig) -> Self {
        Self::new(BackendChoice::Fallback, config)
    }

    /// Extractor around a caller-supplied strategy
    pub fn with_backend(backend: Box<dyn MarkerBackend>, config: ExtractionConfig) -> Self {
        Self {
            backend,
            fallback: FallbackBackend::new(),
            unavailable: None,
            config,
        }
    }

    pub fn backend_kind(&self) -> BackendKind {
        self.backend.kind()
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Extract from a (possibly multi-channel) buffer, downmixing first
    pub fn extract(&self, pcm: &PcmBuffer) -> Extraction {
        if pcm.is_empty() {
            log::debug!("Empty input buffer, returning empty markers");
            return Extraction::empty(self.backend.kind());
        }

        let mono = pcm.to_mono();
        self.extract_mono(&mono, pcm.sample_rate)
    }

    /// Extract from mono samples
    pub fn extract_mono(&self, samples: &[f32], sample_rate: u32) -> Extraction {
        if samples.is_empty() {
            log::debug!("Empty input buffer, returning empty markers");
            return Extraction::empty(self.backend.kind());
        }

        let kind = self.backend.kind();

        match run_guarded(self.backend.as_ref(), samples, sample_rate, &self.config) {
            Ok(markers) => {
                log::info!(
                    "Extraction complete ({}): {} beats, {} onsets, {} downbeats, {} patterns, {} harmonic events",
                    kind.name(),
                    markers.beats.len(),
                    markers.onsets.len(),
                    markers.downbeats.len(),
                    markers.patterns.len(),
                    markers.harmonic_events.len()
                );

                match &self.unavailable {
                    Some(reason) => Extraction::degraded(markers, reason.clone(), kind),
                    None => Extraction::complete(markers, kind),
                }
            }
            Err(error) if kind == BackendKind::Fallback => {
                log::warn!("Fallback extraction failed: {}", error);
                Extraction::degraded(AudioMarkers::empty(), error, BackendKind::Fallback)
            }
            Err(error) => {
                log::warn!("{} backend failed: {}; retrying with fallback", kind.name(), error);

                match run_guarded(&self.fallback, samples, sample_rate, &self.config) {
                    Ok(markers) => Extraction::degraded(markers, error, BackendKind::Fallback),
                    Err(fallback_error) => {
                        log::warn!("Fallback extraction failed: {}", fallback_error);
                        Extraction::degraded(AudioMarkers::empty(), error, BackendKind::Fallback)
                    }
                }
            }
        }
    }
}

/// Run a backend, turning a panic into `ExtractionFailure`
fn run_guarded(
    backend: &dyn MarkerBackend,
    samples: &[f32],
    sample_rate: u32,
    config: &ExtractionConfig,
) -> Result<AudioMarkers, ExtractionError> {
    match panic::catch_unwind(AssertUnwindSafe(|| backend.extract(samples, sample_rate, config))) {
        Ok(result) => result,
        Err(_) => Err(ExtractionError::ExtractionFailure(format!(
            "{} backend panicked",
            backend.kind().name()
        ))),
    }
}
