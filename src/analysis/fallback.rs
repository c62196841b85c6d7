//! Dependency-free fallback backend
//!
//! Energy-envelope approximations of beat tracking and onset detection. Always
//! available, so the extractor can substitute it for the optimized backend at any
//! point. Accuracy is traded for availability.

use super::config::{ExtractionConfig, OnsetMethod};
use super::envelope::{
    energy_envelope, peaks_above, percentile, positive_flux, window_time, ENVELOPE_HOP,
    ENVELOPE_WINDOW,
};
use super::harmonic::detect_harmonic_events;
use super::pattern::detect_patterns;
use super::traits::{BackendKind, MarkerBackend};
use crate::error::ExtractionError;
use crate::model::{AudioMarkers, MarkerType, TimeSignature, TimelineMarker};

/// Fraction of the envelope's 90th percentile a beat must exceed (at sensitivity 1.0)
pub const BEAT_THRESHOLD_FACTOR: f32 = 0.7;
/// Tempo bounds used both for candidate spacing and BPM clamping
pub const MIN_BPM: f32 = 60.0;
pub const MAX_BPM: f32 = 180.0;
/// Reported when fewer than two beats were found
pub const DEFAULT_BPM: f32 = 120.0;
/// Every Nth beat is a downbeat (4/4 heuristic)
pub const BEATS_PER_BAR: usize = 4;

/// Energy-based backend with no external dependencies
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackBackend;

impl FallbackBackend {
    pub fn new() -> Self {
        Self
    }
}

impl MarkerBackend for FallbackBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Fallback
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
        if samples.iter().any(|s| !s.is_finite()) {
            return Err(ExtractionError::ExtractionFailure(
                "input contains non-finite samples".to_string(),
            ));
        }

        log::debug!(
            "Fallback extraction: {} samples ({:.1}s) at {}Hz",
            samples.len(),
            samples.len() as f32 / sample_rate as f32,
            sample_rate
        );

        let mut markers = AudioMarkers::empty();

        if config.beat_tracking.enabled {
            markers.beats = detect_beats(samples, sample_rate, config.beat_tracking.sensitivity);
            markers.downbeats = downbeats_from(&markers.beats);
            markers.bpm = Some(bpm_from_beats(&markers.beats));
            markers.time_signature = Some(TimeSignature::COMMON);

            if config.pattern_detection.enabled {
                markers.patterns = detect_patterns(
                    &markers.beats,
                    &config.pattern_detection,
                    markers.time_signature,
                );
            }
        }

        if config.onset_detection.enabled {
            if config.onset_detection.method == OnsetMethod::SpectralFlux {
                log::debug!("Spectral flux needs the optimized backend, using energy flux");
            }
            markers.onsets =
                detect_energy_onsets(samples, sample_rate, config.onset_detection.threshold);
        }

        if config.harmonic_analysis.enabled {
            markers.harmonic_events =
                detect_harmonic_events(samples, sample_rate, &config.harmonic_analysis);
        }

        Ok(markers)
    }
}

/// Energy-envelope beat tracking
///
/// Candidates are strict local maxima above `0.7 / sensitivity × p90`. They are
/// accepted in order only when at least one 180-BPM interval after the previously
/// accepted beat; rejected candidates are dropped.
pub fn detect_beats(samples: &[f32], sample_rate: u32, sensitivity: f32) -> Vec<TimelineMarker> {
    let envelope = energy_envelope(samples, ENVELOPE_WINDOW, ENVELOPE_HOP);
    if envelope.is_empty() || sample_rate == 0 {
        return Vec::new();
    }

    let sensitivity = if sensitivity.is_finite() && sensitivity > 0.0 {
        sensitivity
    } else {
        1.0
    };
    let reference = percentile(&envelope, 0.9);
    let threshold = BEAT_THRESHOLD_FACTOR / sensitivity * reference;
    let peak = envelope.iter().copied().fold(0.0f32, f32::max);
    let min_interval = 60.0 / MAX_BPM as f64;

    let mut beats: Vec<TimelineMarker> = Vec::new();

    for i in peaks_above(&envelope, threshold) {
        let time = window_time(i, ENVELOPE_HOP, sample_rate);

        if let Some(previous) = beats.last() {
            if time - previous.time < min_interval {
                continue;
            }
        }

        let energy = envelope[i];
        let confidence = if reference > 0.0 { energy / reference } else { 1.0 };
        let strength = if peak > 0.0 { energy / peak } else { 0.0 };

        beats.push(
            TimelineMarker::new(time, MarkerType::Beat)
                .with_confidence(confidence)
                .with_strength(strength),
        );
    }

    log::debug!(
        "Beat tracking: {} beats from {} windows (threshold {:.4})",
        beats.len(),
        envelope.len(),
        threshold
    );

    beats
}

/// `clamp(60 / mean inter-beat interval, 60, 180)`, or 120 with fewer than two beats
pub fn bpm_from_beats(beats: &[TimelineMarker]) -> f32 {
    if beats.len() < 2 {
        return DEFAULT_BPM;
    }

    let total: f64 = beats.windows(2).map(|w| w[1].time - w[0].time).sum();
    let mean = total / (beats.len() - 1) as f64;

    if mean <= 0.0 {
        return DEFAULT_BPM;
    }

    ((60.0 / mean) as f32).clamp(MIN_BPM, MAX_BPM)
}

/// Every fourth beat by index, starting with the first
pub fn downbeats_from(beats: &[TimelineMarker]) -> Vec<TimelineMarker> {
    beats
        .iter()
        .enumerate()
        .filter(|(i, _)| i % BEATS_PER_BAR == 0)
        .map(|(_, beat)| {
            let mut downbeat = beat.clone();
            downbeat.marker_type = MarkerType::Downbeat;
            downbeat
        })
        .collect()
}

/// Onsets from the positive energy delta between envelope windows
pub fn detect_energy_onsets(
    samples: &[f32],
    sample_rate: u32,
    threshold_factor: f32,
) -> Vec<TimelineMarker> {
    let envelope = energy_envelope(samples, ENVELOPE_WINDOW, ENVELOPE_HOP);
    let flux = positive_flux(&envelope);
    pick_onsets(&flux, ENVELOPE_HOP, sample_rate, threshold_factor)
}

/// Peak-pick a flux series against `threshold_factor × p80`
///
/// Confidence is `min(1, flux / threshold)`; strength is flux relative to the
/// largest flux value so it stays in [0, 1]. A zero threshold (mostly-flat flux)
/// accepts any positive peak with full confidence.
pub fn pick_onsets(
    flux: &[f32],
    hop_size: usize,
    sample_rate: u32,
    threshold_factor: f32,
) -> Vec<TimelineMarker> {
    if flux.is_empty() || sample_rate == 0 {
        return Vec::new();
    }

    let threshold = threshold_factor.max(0.0) * percentile(flux, 0.8);
    let max_flux = flux.iter().copied().fold(0.0f32, f32::max);

    let onsets: Vec<TimelineMarker> = peaks_above(flux, threshold)
        .into_iter()
        .map(|i| {
            let confidence = if threshold > 0.0 { flux[i] / threshold } else { 1.0 };
            let strength = if max_flux > 0.0 { flux[i] / max_flux } else { 0.0 };

            TimelineMarker::new(window_time(i, hop_size, sample_rate), MarkerType::Onset)
                .with_confidence(confidence)
                .with_strength(strength)
        })
        .collect();

    log::debug!(
        "Onset detection: {} onsets from {} flux frames (threshold {:.4})",
        onsets.len(),
        flux.len(),
        threshold
    );

    onsets
}
