//! Harmonic accent markers from a sliding-window centroid proxy
//!
//! The centroid here is computed over sample positions, not a spectrum: each
//! sample's index inside the window is weighted by its absolute amplitude.

use super::config::HarmonicAnalysisConfig;
use super::envelope::{rms, window_time};
use crate::model::HarmonicMarker;

/// Windows at or below this RMS energy emit no marker
pub const HARMONIC_ENERGY_FLOOR: f32 = 0.1;

/// Slide a window across `samples` and emit a marker for every energetic window
pub fn detect_harmonic_events(
    samples: &[f32],
    sample_rate: u32,
    config: &HarmonicAnalysisConfig,
) -> Vec<HarmonicMarker> {
    let window_size = config.window_size;
    let hop_size = config.hop_size;

    if window_size == 0 || hop_size == 0 || samples.len() < window_size || sample_rate == 0 {
        return Vec::new();
    }

    let mut events = Vec::new();
    let mut start = 0;
    let mut index = 0;

    while start + window_size <= samples.len() {
        let window = &samples[start..start + window_size];
        let energy = rms(window);

        if energy > HARMONIC_ENERGY_FLOOR {
            let centroid = position_centroid(window);
            events.push(HarmonicMarker {
                time: window_time(index, hop_size, sample_rate),
                frequency: centroid * sample_rate as f32 / window_size as f32,
                spectral_centroid: centroid,
                energy,
                chroma: None,
            });
        }

        start += hop_size;
        index += 1;
    }

    log::debug!(
        "Harmonic analysis: {} events (window={}, hop={})",
        events.len(),
        window_size,
        hop_size
    );

    events
}

/// Σ(index·|sample|) / Σ|sample|, or 0 for a silent window
fn position_centroid(window: &[f32]) -> f32 {
    let mut weighted_sum = 0.0;
    let mut total = 0.0;

    for (i, sample) in window.iter().enumerate() {
        let magnitude = sample.abs();
        weighted_sum += i as f32 * magnitude;
        total += magnitude;
    }

    if total > 0.0 {
        weighted_sum / total
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quiet_signal_emits_nothing() {
        let samples = vec![0.05; 8192];
        let events = detect_harmonic_events(&samples, 44100, &HarmonicAnalysisConfig::default());
        assert!(events.is_empty());
    }

    #[test]
    fn test_loud_constant_signal() {
        let samples = vec![0.5; 4096];
        let events = detect_harmonic_events(&samples, 44100, &HarmonicAnalysisConfig::default());

        // (4096 - 2048) / 512 + 1
        assert_eq!(events.len(), 5);
        assert!((events[0].energy - 0.5).abs() < 1e-6);
        // uniform amplitude puts the centroid in the middle of the window
        assert!((events[0].spectral_centroid - 1023.5).abs() < 0.5);
        assert!((events[1].time - 512.0 / 44100.0).abs() < 1e-9);
    }

    #[test]
    fn test_centroid_tracks_amplitude_position() {
        let mut window = vec![0.0; 100];
        window[90] = 1.0;
        assert!((position_centroid(&window) - 90.0).abs() < 1e-6);
        assert_eq!(position_centroid(&[0.0; 10]), 0.0);
    }

    #[test]
    fn test_invalid_window_config() {
        let config = HarmonicAnalysisConfig {
            enabled: true,
            window_size: 0,
            hop_size: 512,
        };
        assert!(detect_harmonic_events(&[0.5; 4096], 44100, &config).is_empty());
    }
}
