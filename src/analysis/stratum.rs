//! Optimized backend using stratum-dsp
//!
//! BPM, key, beats and downbeats come from stratum-dsp's tempogram and HMM beat
//! tracker. Onsets use real spectral flux; harmonic events and patterns share
//! the fallback implementations so the output schema is identical.

use super::config::{BeatMethod, ExtractionConfig, OnsetMethod};
use super::envelope::ENVELOPE_HOP;
use super::fallback::{detect_beats, detect_energy_onsets, downbeats_from, pick_onsets};
use super::harmonic::detect_harmonic_events;
use super::pattern::detect_patterns;
use super::spectral::spectral_flux;
use super::traits::{BackendKind, MarkerBackend};
use crate::error::ExtractionError;
use crate::model::{AudioMarkers, MarkerType, TimeSignature, TimelineMarker};
use stratum_dsp::{analyze_audio, AnalysisConfig};

/// Window for spectral flux onsets
const SPECTRAL_WINDOW: usize = 2048;

/// stratum-dsp backed extraction
pub struct OptimizedBackend {
    /// Shortest clip handed to the library, in seconds
    min_duration_secs: f32,
}

impl OptimizedBackend {
    pub fn new() -> Self {
        Self {
            min_duration_secs: 1.0,
        }
    }
}

impl Default for OptimizedBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkerBackend for OptimizedBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Optimized
    }

    fn extract(
        &self,
        samples: &[f32],
        sample_rate: u32,
        config: &ExtractionConfig,
    ) -> Result<AudioMarkers, ExtractionError> {
        if sample_rate == 0 {
            return Err(ExtractionError::ExtractionFailure(
                "sample rate must be positive".to_string(),
            ));
        }
        if samples.is_empty() {
            return Err(ExtractionError::EmptyInput);
        }
        if (samples.len() as f32 / sample_rate as f32) < self.min_duration_secs {
            return Err(ExtractionError::ExtractionFailure(
                "audio too short for optimized analysis".to_string(),
            ));
        }

        log::debug!(
            "Optimized extraction: {} samples ({:.1}s) at {}Hz",
            samples.len(),
            samples.len() as f32 / sample_rate as f32,
            sample_rate
        );

        let mut markers = AudioMarkers::empty();

        if config.beat_tracking.enabled {
            let result = analyze_audio(samples, sample_rate, AnalysisConfig::default())
                .map_err(|e| ExtractionError::ExtractionFailure(format!("{:?}", e)))?;

            check_library_result(
                config.beat_tracking.method,
                result.bpm as f32,
                result.beat_grid.beats.len(),
            )?;

            let confidence = (result.bpm_confidence as f32).clamp(0.0, 1.0);

            markers.beats = if config.beat_tracking.method == BeatMethod::Energy {
                // energy peaks, library tempo and key
                detect_beats(samples, sample_rate, config.beat_tracking.sensitivity)
            } else {
                result
                    .beat_grid
                    .beats
                    .iter()
                    .map(|&t| {
                        TimelineMarker::new(t as f64, MarkerType::Beat)
                            .with_confidence(confidence)
                            .with_strength(confidence)
                    })
                    .collect()
            };

            markers.downbeats = if config.beat_tracking.method == BeatMethod::Energy
                || result.beat_grid.downbeats.is_empty()
            {
                downbeats_from(&markers.beats)
            } else {
                result
                    .beat_grid
                    .downbeats
                    .iter()
                    .map(|&t| {
                        TimelineMarker::new(t as f64, MarkerType::Downbeat)
                            .with_confidence(confidence)
                    })
                    .collect()
            };

            markers.bpm = Some(result.bpm as f32);
            markers.key = Some(result.key.name().to_string());
            markers.time_signature = Some(TimeSignature::COMMON);

            log::info!(
                "stratum-dsp: BPM={:.1} (confidence {:.2}), key={}, {} beats",
                result.bpm,
                confidence,
                markers.key.as_deref().unwrap_or("unknown"),
                markers.beats.len()
            );

            if config.pattern_detection.enabled {
                markers.patterns = detect_patterns(
                    &markers.beats,
                    &config.pattern_detection,
                    markers.time_signature,
                );
            }
        }

        if config.onset_detection.enabled {
            markers.onsets = match config.onset_detection.method {
                OnsetMethod::SpectralFlux => {
                    let flux = spectral_flux(samples, SPECTRAL_WINDOW, ENVELOPE_HOP);
                    pick_onsets(
                        &flux,
                        ENVELOPE_HOP,
                        sample_rate,
                        config.onset_detection.threshold,
                    )
                }
                OnsetMethod::EnergyFlux => {
                    detect_energy_onsets(samples, sample_rate, config.onset_detection.threshold)
                }
            };
        }

        if config.harmonic_analysis.enabled {
            markers.harmonic_events =
                detect_harmonic_events(samples, sample_rate, &config.harmonic_analysis);
        }

        Ok(markers)
    }
}

/// Reject library output the selected beat method cannot use
///
/// The beat grid is only needed when beats come from the tempogram.
fn check_library_result(
    method: BeatMethod,
    bpm: f32,
    grid_beats: usize,
) -> Result<(), ExtractionError> {
    if !bpm.is_finite() || bpm <= 0.0 {
        return Err(ExtractionError::ExtractionFailure(
            "library produced no tempo".to_string(),
        ));
    }
    if method == BeatMethod::Tempogram && grid_beats == 0 {
        return Err(ExtractionError::ExtractionFailure(
            "library produced no beat grid".to_string(),
        ));
    }
    Ok(())
}
