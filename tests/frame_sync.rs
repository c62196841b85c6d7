use beat_sync::analysis::{classify_pattern, ExtractionConfig, Extractor};
use beat_sync::model::{AudioMarkers, MarkerType, TimelineMarker};
use beat_sync::sync::{
    frame_for_time, map_audio_markers, map_markers, CategoryOffsets, MarkerIndex, ToleranceScan,
    AGGREGATE_CATEGORIES,
};

fn beats(times: &[f64]) -> Vec<TimelineMarker> {
    times
        .iter()
        .map(|&t| TimelineMarker::new(t, MarkerType::Beat).with_confidence(0.9))
        .collect()
}

fn beat_markers(times: &[f64]) -> AudioMarkers {
    AudioMarkers {
        beats: beats(times),
        ..Default::default()
    }
}

#[test]
fn test_beats_land_on_expected_frames() {
    let frames = map_markers(&beats(&[0.5, 1.0, 1.5, 2.0, 2.5]), 0, 30.0, 0);
    assert_eq!(frames.frame_numbers(), vec![15, 30, 45, 60, 75]);
}

#[test]
fn test_negative_category_offset() {
    let offsets = CategoryOffsets {
        beat: -5,
        ..Default::default()
    };
    let index = MarkerIndex::new(map_audio_markers(
        &beat_markers(&[0.5, 1.0, 1.5, 2.0, 2.5]),
        0,
        30.0,
        &offsets,
    ));

    assert!(index.has_markers(10));
    assert!(index.has_markers(25));
    assert!(!index.has_markers(15));
}

#[test]
fn test_range_query_is_inclusive() {
    let index = MarkerIndex::new(map_markers(&beats(&[0.5, 1.0, 1.5]), 0, 30.0, 0));
    assert_eq!(index.markers_in_range(15, 45).len(), 3);
}

#[test]
fn test_interpolation_between_beats() {
    let index = MarkerIndex::new(map_markers(&beats(&[1.0, 2.0]), 0, 30.0, 0));

    assert_eq!(index.interpolate(30, MarkerType::Beat), 0.0);
    let progress = index.interpolate(59, MarkerType::Beat);
    assert!((progress - 0.967).abs() < 1e-3, "progress {}", progress);
}

#[test]
fn test_nearest_frame() {
    let index = MarkerIndex::new(map_markers(&beats(&[0.5, 1.0]), 0, 30.0, 0));

    assert_eq!(index.nearest_frame(22), Some(15));
    assert_eq!(index.nearest_frame(23), Some(30));
    assert_eq!(index.nearest_frame(30), Some(30));
}

#[test]
fn test_pattern_classification() {
    assert_eq!(classify_pattern(&[0.5]), None);

    let label = classify_pattern(&[0.5, 0.5, 1.0]).unwrap();
    assert!(label.contains("eighth"), "label {}", label);
    assert!(label.contains("half"), "label {}", label);
}

#[test]
fn test_extracted_markers_round_trip_through_index() {
    let samples: Vec<f32> = (0..44100 * 4)
        .map(|n| {
            let since = (n % 22050) as f32 / 44100.0;
            let t = n as f32 / 44100.0;
            0.9 * (-since / 0.05).exp() * (2.0 * std::f32::consts::PI * 220.0 * t).sin()
        })
        .collect();
    let markers = Extractor::fallback(ExtractionConfig::default())
        .extract_mono(&samples, 44100)
        .markers;
    assert!(!markers.beats.is_empty());

    let (start_frame, fps) = (12, 24.0);
    let offsets = CategoryOffsets {
        onset: 2,
        downbeat: -1,
        ..Default::default()
    };
    let index = MarkerIndex::new(map_audio_markers(&markers, start_frame, fps, &offsets));

    for marker_type in AGGREGATE_CATEGORIES {
        for marker in markers.timeline_markers(marker_type) {
            let frame = frame_for_time(marker.time, start_frame, fps, offsets.for_type(marker_type))
                .unwrap();
            let found = index
                .markers_at(frame)
                .iter()
                .any(|m| m.time == marker.time && m.marker_type == marker.marker_type);
            assert!(found, "{} at {}s missing from frame {}", marker_type, marker.time, frame);
        }
    }
}

#[test]
fn test_tolerance_scan_modes() {
    let markers = AudioMarkers {
        beats: beats(&[1.0]),
        onsets: vec![TimelineMarker::new(0.9, MarkerType::Onset)],
        ..Default::default()
    };
    let frames = map_audio_markers(&markers, 0, 30.0, &CategoryOffsets::default());

    // onset on 27, beat on 30
    let first = MarkerIndex::new(frames.clone());
    assert!(!first.has_marker_near(28, Some(MarkerType::Beat), 3));
    assert!(first.has_marker_near(28, None, 3));

    let full = MarkerIndex::new(frames).with_tolerance_scan(ToleranceScan::FullWindow);
    assert!(full.has_marker_near(28, Some(MarkerType::Beat), 3));
}

#[test]
fn test_malformed_input_never_panics() {
    let index = MarkerIndex::new(map_audio_markers(
        &beat_markers(&[0.5, 1.0]),
        0,
        f64::NAN,
        &CategoryOffsets::default(),
    ));

    assert!(index.is_empty());
    assert_eq!(index.nearest_frame(10), None);
    assert!(index.next_marker(i64::MIN, None).is_none());
    assert!(index.markers_in_window(i64::MAX, u32::MAX).is_empty());
}
