//! Frame mapper: time to frame assignment

use crate::model::{AudioMarkers, MarkerType, TimelineMarker};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Categories merged into the frame aggregate, in merge order
///
/// Patterns and harmonic events stay in the time domain unless mapped
/// explicitly with [`map_category`].
pub const AGGREGATE_CATEGORIES: [MarkerType; 3] =
    [MarkerType::Beat, MarkerType::Onset, MarkerType::Downbeat];

/// Sparse frame -> markers mapping
///
/// Markers within a frame keep insertion order (category merge order, then
/// input order), not time order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FrameMarkers {
    frames: BTreeMap<i64, Vec<TimelineMarker>>,
}

impl FrameMarkers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a marker to `frame`
    pub fn push(&mut self, frame: i64, marker: TimelineMarker) {
        self.frames.entry(frame).or_default().push(marker);
    }

    /// Append every frame list of `other` after this one's
    pub fn merge(&mut self, other: FrameMarkers) {
        for (frame, markers) in other.frames {
            self.frames.entry(frame).or_default().extend(markers);
        }
    }

    /// Markers on exactly `frame`
    pub fn get(&self, frame: i64) -> &[TimelineMarker] {
        self.frames.get(&frame).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Populated frames in ascending order with their markers
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (i64, &[TimelineMarker])> {
        self.frames.iter().map(|(f, m)| (*f, m.as_slice()))
    }

    /// Populated frames within `start..=end`
    pub fn range(&self, start: i64, end: i64) -> impl Iterator<Item = (i64, &[TimelineMarker])> {
        let bounds = if start <= end { Some(start..=end) } else { None };
        bounds
            .into_iter()
            .flat_map(move |r| self.frames.range(r))
            .map(|(f, m)| (*f, m.as_slice()))
    }

    /// Sorted distinct populated frames
    pub fn frame_numbers(&self) -> Vec<i64> {
        self.frames.keys().copied().collect()
    }

    /// Number of populated frames
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Total markers across all frames
    pub fn marker_count(&self) -> usize {
        self.frames.values().map(Vec::len).sum()
    }
}

/// Per-category frame offsets, all 0 by default
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CategoryOffsets {
    pub beat: i64,
    pub onset: i64,
    pub downbeat: i64,
    pub pattern: i64,
    pub harmonic: i64,
}

impl CategoryOffsets {
    pub fn for_type(&self, marker_type: MarkerType) -> i64 {
        match marker_type {
            MarkerType::Beat => self.beat,
            MarkerType::Onset => self.onset,
            MarkerType::Downbeat => self.downbeat,
            MarkerType::Pattern => self.pattern,
            MarkerType::Harmonic => self.harmonic,
        }
    }
}

/// `round(start_frame + time * fps + offset)`
///
/// `None` when `fps` is not a positive finite number or the result is not
/// representable as a frame.
pub fn frame_for_time(time: f64, start_frame: i64, fps: f64, offset: i64) -> Option<i64> {
    if !fps.is_finite() || fps <= 0.0 {
        return None;
    }

    let frame = (start_frame as f64 + time * fps + offset as f64).round();
    if !frame.is_finite() || frame < i64::MIN as f64 || frame > i64::MAX as f64 {
        return None;
    }
    Some(frame as i64)
}

/// Map one marker list onto frames
///
/// Every output marker carries its assigned `frame`. Markers whose frame
/// cannot be computed are skipped.
pub fn map_markers(
    markers: &[TimelineMarker],
    start_frame: i64,
    fps: f64,
    offset: i64,
) -> FrameMarkers {
    let mut mapped = FrameMarkers::new();

    for marker in markers {
        match frame_for_time(marker.time, start_frame, fps, offset) {
            Some(frame) => mapped.push(frame, marker.at_frame(frame)),
            None => log::trace!("Skipping unmappable {} marker at {}s", marker.marker_type, marker.time),
        }
    }

    mapped
}

/// Map a single category of `markers`, applying that category's offset
pub fn map_category(
    markers: &AudioMarkers,
    marker_type: MarkerType,
    start_frame: i64,
    fps: f64,
    offsets: &CategoryOffsets,
) -> FrameMarkers {
    map_markers(
        &markers.timeline_markers(marker_type),
        start_frame,
        fps,
        offsets.for_type(marker_type),
    )
}

/// Frame aggregate of beats, onsets and downbeats, merged in that order
pub fn map_audio_markers(
    markers: &AudioMarkers,
    start_frame: i64,
    fps: f64,
    offsets: &CategoryOffsets,
) -> FrameMarkers {
    let mut aggregate = FrameMarkers::new();

    for marker_type in AGGREGATE_CATEGORIES {
        aggregate.merge(map_category(markers, marker_type, start_frame, fps, offsets));
    }

    log::debug!(
        "Mapped {} markers onto {} frames at {} fps",
        aggregate.marker_count(),
        aggregate.len(),
        fps
    );

    aggregate
}

#[cfg(test)]
mod tests {
    use super::*;

    fn beats(times: &[f64]) -> Vec<TimelineMarker> {
        times
            .iter()
            .map(|&t| TimelineMarker::new(t, MarkerType::Beat))
            .collect()
    }

    #[test]
    fn test_beats_at_30_fps() {
        let mapped = map_markers(&beats(&[0.5, 1.0, 1.5, 2.0, 2.5]), 0, 30.0, 0);
        assert_eq!(mapped.frame_numbers(), vec![15, 30, 45, 60, 75]);
        assert_eq!(mapped.get(30)[0].frame, Some(30));
    }

    #[test]
    fn test_offset_and_start_frame() {
        let mapped = map_markers(&beats(&[0.5, 1.0]), 0, 30.0, -5);
        assert_eq!(mapped.frame_numbers(), vec![10, 25]);

        let mapped = map_markers(&beats(&[0.5]), 100, 30.0, 0);
        assert_eq!(mapped.frame_numbers(), vec![115]);
    }

    #[test]
    fn test_collisions_keep_input_order() {
        let markers = vec![
            TimelineMarker::new(1.0, MarkerType::Beat).with_strength(0.1),
            TimelineMarker::new(1.01, MarkerType::Beat).with_strength(0.2),
        ];
        let mapped = map_markers(&markers, 0, 24.0, 0);

        assert_eq!(mapped.len(), 1);
        let frame = mapped.get(24);
        assert_eq!(frame[0].strength, Some(0.1));
        assert_eq!(frame[1].strength, Some(0.2));
    }

    #[test]
    fn test_invalid_fps_yields_nothing() {
        let input = beats(&[0.5, 1.0]);
        assert!(map_markers(&input, 0, 0.0, 0).is_empty());
        assert!(map_markers(&input, 0, -30.0, 0).is_empty());
        assert!(map_markers(&input, 0, f64::NAN, 0).is_empty());
    }

    #[test]
    fn test_aggregate_merge_order() {
        let markers = AudioMarkers {
            beats: beats(&[1.0]),
            onsets: vec![TimelineMarker::new(1.0, MarkerType::Onset)],
            downbeats: vec![TimelineMarker::new(1.0, MarkerType::Downbeat)],
            ..Default::default()
        };

        let aggregate = map_audio_markers(&markers, 0, 30.0, &CategoryOffsets::default());
        let types: Vec<MarkerType> = aggregate.get(30).iter().map(|m| m.marker_type).collect();

        assert_eq!(types, vec![MarkerType::Beat, MarkerType::Onset, MarkerType::Downbeat]);
    }

    #[test]
    fn test_aggregate_excludes_patterns_and_harmonics() {
        let markers = AudioMarkers {
            patterns: vec![crate::model::RhythmicPattern {
                start_time: 1.0,
                end_time: 2.0,
                pattern: "quarter-quarter".to_string(),
                time_signature: None,
            }],
            ..Default::default()
        };
        let offsets = CategoryOffsets {
            pattern: 2,
            ..Default::default()
        };

        assert!(map_audio_markers(&markers, 0, 30.0, &offsets).is_empty());

        let patterns = map_category(&markers, MarkerType::Pattern, 0, 30.0, &offsets);
        assert_eq!(patterns.frame_numbers(), vec![32]);
    }

    #[test]
    fn test_per_category_offsets() {
        let markers = AudioMarkers {
            beats: beats(&[1.0]),
            onsets: vec![TimelineMarker::new(1.0, MarkerType::Onset)],
            ..Default::default()
        };
        let offsets = CategoryOffsets {
            onset: 3,
            ..Default::default()
        };

        let aggregate = map_audio_markers(&markers, 0, 30.0, &offsets);
        assert_eq!(aggregate.frame_numbers(), vec![30, 33]);
    }

    #[test]
    fn test_offsets_json() {
        let offsets: CategoryOffsets = serde_json::from_str(r#"{"downbeat": -2}"#).unwrap();
        assert_eq!(offsets.downbeat, -2);
        assert_eq!(offsets.beat, 0);
    }
}
