//! Deterministic substitute markers
//!
//! Used when a source cannot be resolved or decoded so the render path always
//! has a usable beat grid.

use crate::analysis::classify_pattern;
use crate::model::{AudioMarkers, MarkerType, RhythmicPattern, TimeSignature, TimelineMarker};

/// Tempo of the synthetic grid
pub const SYNTHETIC_BPM: f32 = 120.0;

/// Grid length when the real duration is unknown
pub const SYNTHETIC_DURATION_SECS: f64 = 60.0;

/// Fixed 120-BPM grid covering `duration_secs`
///
/// Beats every 0.5s starting at 0, a downbeat on every 4th beat and one
/// quarter-note pattern per bar. Non-finite or non-positive durations use
/// the 60 second default.
pub fn synthetic_markers(duration_secs: f64) -> AudioMarkers {
    let duration = if duration_secs.is_finite() && duration_secs > 0.0 {
        duration_secs
    } else {
        SYNTHETIC_DURATION_SECS
    };

    let interval = 60.0 / SYNTHETIC_BPM as f64;
    let count = (duration / interval).floor() as usize + 1;

    let beats: Vec<TimelineMarker> = (0..count)
        .map(|i| {
            TimelineMarker::new(i as f64 * interval, MarkerType::Beat)
                .with_confidence(1.0)
                .with_strength(1.0)
        })
        .filter(|m| m.time <= duration)
        .collect();

    let downbeats = beats
        .iter()
        .step_by(4)
        .map(|b| TimelineMarker::new(b.time, MarkerType::Downbeat).with_confidence(1.0))
        .collect();

    let time_signature = Some(TimeSignature::COMMON);
    let bar = 4.0 * interval;
    let bar_pattern = classify_pattern(&[interval; 4]).unwrap_or_default();

    let patterns = beats
        .iter()
        .step_by(4)
        .map(|b| b.time)
        .filter(|start| start + bar <= duration)
        .map(|start| RhythmicPattern {
            start_time: start,
            end_time: start + bar,
            pattern: bar_pattern.clone(),
            time_signature,
        })
        .collect();

    AudioMarkers {
        beats,
        downbeats,
        patterns,
        bpm: Some(SYNTHETIC_BPM),
        time_signature,
        ..AudioMarkers::empty()
    }
}
