use super::{HarmonicMarker, MarkerType, RhythmicPattern, TimeSignature, TimelineMarker};
use serde::{Deserialize, Serialize};

/// Complete extraction output for one (sample buffer, configuration) pair
///
/// Never mutated after the extractor hands it out; consumers share it behind an `Arc`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioMarkers {
    pub beats: Vec<TimelineMarker>,
    pub onsets: Vec<TimelineMarker>,
    pub downbeats: Vec<TimelineMarker>,
    pub patterns: Vec<RhythmicPattern>,
    pub harmonic_events: Vec<HarmonicMarker>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bpm: Option<f32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_signature: Option<TimeSignature>,
}

impl AudioMarkers {
    /// Marker set with every collection empty
    pub fn empty() -> Self {
        Self::default()
    }

    /// True when all five collections are empty
    pub fn is_empty(&self) -> bool {
        self.beats.is_empty()
            && self.onsets.is_empty()
            && self.downbeats.is_empty()
            && self.patterns.is_empty()
            && self.harmonic_events.is_empty()
    }

    /// Total number of events across all collections
    pub fn event_count(&self) -> usize {
        self.beats.len()
            + self.onsets.len()
            + self.downbeats.len()
            + self.patterns.len()
            + self.harmonic_events.len()
    }

    /// View one category as timeline markers
    ///
    /// Patterns become a marker at their start time carrying the signature and span
    /// in `data`; harmonic events carry their energy as strength. Neither is part of
    /// the frame aggregate, so callers map these explicitly when they need them.
    pub fn timeline_markers(&self, marker_type: MarkerType) -> Vec<TimelineMarker> {
        match marker_type {
            MarkerType::Beat => self.beats.clone(),
            MarkerType::Onset => self.onsets.clone(),
            MarkerType::Downbeat => self.downbeats.clone(),
            MarkerType::Pattern => self
                .patterns
                .iter()
                .map(|p| {
                    TimelineMarker::new(p.start_time, MarkerType::Pattern).with_data(
                        serde_json::json!({
                            "pattern": p.pattern,
                            "endTime": p.end_time,
                        }),
                    )
                })
                .collect(),
            MarkerType::Harmonic => self
                .harmonic_events
                .iter()
                .map(|h| {
                    TimelineMarker::new(h.time, MarkerType::Harmonic)
                        .with_strength(h.energy)
                        .with_data(serde_json::json!({
                            "frequency": h.frequency,
                            "spectralCentroid": h.spectral_centroid,
                        }))
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_markers() {
        let markers = AudioMarkers::empty();
        assert!(markers.is_empty());
        assert_eq!(markers.event_count(), 0);
        assert!(markers.bpm.is_none());
    }

    #[test]
    fn test_pattern_view_carries_signature() {
        let markers = AudioMarkers {
            patterns: vec![RhythmicPattern {
                start_time: 1.0,
                end_time: 3.0,
                pattern: "quarter-quarter".to_string(),
                time_signature: Some(TimeSignature::COMMON),
            }],
            ..Default::default()
        };

        let view = markers.timeline_markers(MarkerType::Pattern);
        assert_eq!(view.len(), 1);
        assert_eq!(view[0].time, 1.0);
        assert_eq!(view[0].marker_type, MarkerType::Pattern);
        assert_eq!(view[0].data.as_ref().unwrap()["pattern"], "quarter-quarter");
    }

    #[test]
    fn test_harmonic_view_clamps_energy() {
        let markers = AudioMarkers {
            harmonic_events: vec![HarmonicMarker {
                time: 0.25,
                frequency: 440.0,
                spectral_centroid: 20.0,
                energy: 1.4,
                chroma: None,
            }],
            ..Default::default()
        };

        let view = markers.timeline_markers(MarkerType::Harmonic);
        assert_eq!(view[0].strength, Some(1.0));
    }

    #[test]
    fn test_serializes_camel_case_keys() {
        let json = serde_json::to_value(AudioMarkers::empty()).unwrap();
        assert!(json.get("harmonicEvents").is_some());
        assert!(json.get("bpm").is_none());
    }
}
