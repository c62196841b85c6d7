//! Marker index: per-frame queries over a frame aggregate

use super::mapper::FrameMarkers;
use crate::model::{MarkerType, TimelineMarker};

/// How the tolerance membership test treats a typed query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToleranceScan {
    /// Stop at the first populated frame in the window and answer from it
    /// alone, even when it lacks the requested type
    #[default]
    FirstPopulated,

    /// Keep scanning the whole window for the requested type
    FullWindow,
}

/// Immutable query structure over [`FrameMarkers`]
///
/// Holds the sorted distinct frame list for binary search. Built once per
/// (markers, fps, start frame, offsets) tuple.
#[derive(Debug, Clone, Default)]
pub struct MarkerIndex {
    markers: FrameMarkers,
    frames: Vec<i64>,
    scan: ToleranceScan,
}

impl MarkerIndex {
    pub fn new(markers: FrameMarkers) -> Self {
        let frames = markers.frame_numbers();
        Self {
            markers,
            frames,
            scan: ToleranceScan::default(),
        }
    }

    pub fn with_tolerance_scan(mut self, scan: ToleranceScan) -> Self {
        self.scan = scan;
        self
    }

    pub fn tolerance_scan(&self) -> ToleranceScan {
        self.scan
    }

    pub fn frame_markers(&self) -> &FrameMarkers {
        &self.markers
    }

    /// Markers on exactly `frame`
    pub fn markers_at(&self, frame: i64) -> &[TimelineMarker] {
        self.markers.get(frame)
    }

    /// All markers in `[frame - window, frame + window]`, in frame order
    pub fn markers_in_window(&self, frame: i64, window: u32) -> Vec<&TimelineMarker> {
        let window = i64::from(window);
        self.markers_in_range(frame.saturating_sub(window), frame.saturating_add(window))
    }

    /// All markers with `start <= frame <= end`; empty when `start > end`
    pub fn markers_in_range(&self, start: i64, end: i64) -> Vec<&TimelineMarker> {
        self.markers
            .range(start, end)
            .flat_map(|(_, markers)| markers.iter())
            .collect()
    }

    /// Is there a marker (of `marker_type`, if given) within `tolerance` frames?
    ///
    /// Frames are scanned in increasing order. Under
    /// [`ToleranceScan::FirstPopulated`] the first populated frame decides the
    /// answer on its own.
    pub fn has_marker_near(
        &self,
        frame: i64,
        marker_type: Option<MarkerType>,
        tolerance: u32,
    ) -> bool {
        let tolerance = i64::from(tolerance);
        let start = frame.saturating_sub(tolerance);
        let end = frame.saturating_add(tolerance);

        for (_, markers) in self.markers.range(start, end) {
            let Some(wanted) = marker_type else {
                return true;
            };

            let matched = markers.iter().any(|m| m.marker_type == wanted);
            if matched || self.scan == ToleranceScan::FirstPopulated {
                return matched;
            }
        }

        false
    }

    /// First marker (of `marker_type`, if given) on a frame strictly after `frame`
    pub fn next_marker(
        &self,
        frame: i64,
        marker_type: Option<MarkerType>,
    ) -> Option<&TimelineMarker> {
        let start = self.frames.partition_point(|&f| f <= frame);

        self.frames[start..]
            .iter()
            .find_map(|&f| self.first_of_type(f, marker_type))
    }

    /// First marker (of `marker_type`, if given) on the closest frame strictly before `frame`
    pub fn previous_marker(
        &self,
        frame: i64,
        marker_type: Option<MarkerType>,
    ) -> Option<&TimelineMarker> {
        let end = self.frames.partition_point(|&f| f < frame);

        self.frames[..end]
            .iter()
            .rev()
            .find_map(|&f| self.first_of_type(f, marker_type))
    }

    /// Progress between the strictly previous and next markers of `marker_type`
    ///
    /// Returns 0 when either neighbour is missing.
    pub fn interpolate(&self, frame: i64, marker_type: MarkerType) -> f64 {
        let previous = match self.previous_marker(frame, Some(marker_type)) {
            Some(marker) => marker,
            None => return 0.0,
        };
        let next = match self.next_marker(frame, Some(marker_type)) {
            Some(marker) => marker,
            None => return 0.0,
        };

        match (previous.frame, next.frame) {
            // i128 so far-apart frames cannot overflow
            (Some(prev), Some(next)) if next > prev => {
                (i128::from(frame) - i128::from(prev)) as f64
                    / (i128::from(next) - i128::from(prev)) as f64
            }
            _ => 0.0,
        }
    }

    /// Populated frame closest to `target`, by binary search
    ///
    /// Ties go to whichever candidate the search visits first.
    pub fn nearest_frame(&self, target: i64) -> Option<i64> {
        let mut best: Option<(i64, u64)> = None;
        let (mut lo, mut hi) = (0, self.frames.len());

        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            let candidate = self.frames[mid];
            let distance = candidate.abs_diff(target);

            if best.map_or(true, |(_, d)| distance < d) {
                best = Some((candidate, distance));
            }

            match candidate.cmp(&target) {
                std::cmp::Ordering::Equal => return Some(candidate),
                std::cmp::Ordering::Less => lo = mid + 1,
                std::cmp::Ordering::Greater => hi = mid,
            }
        }

        best.map(|(frame, _)| frame)
    }

    /// Exact-frame membership, O(log n)
    pub fn has_markers(&self, frame: i64) -> bool {
        self.frames.binary_search(&frame).is_ok()
    }

    /// Sorted distinct populated frames
    pub fn all_marker_frames(&self) -> &[i64] {
        &self.frames
    }

    /// Number of populated frames
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    fn first_of_type(&self, frame: i64, marker_type: Option<MarkerType>) -> Option<&TimelineMarker> {
        let markers = self.markers.get(frame);
        match marker_type {
            Some(wanted) => markers.iter().find(|m| m.marker_type == wanted),
            None => markers.first(),
        }
    }
}

impl From<FrameMarkers> for MarkerIndex {
    fn from(markers: FrameMarkers) -> Self {
        Self::new(markers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::map_markers;

    fn index_of(entries: &[(i64, MarkerType)]) -> MarkerIndex {
        let mut markers = FrameMarkers::new();
        for &(frame, marker_type) in entries {
            markers.push(frame, TimelineMarker::new(frame as f64 / 30.0, marker_type).at_frame(frame));
        }
        MarkerIndex::new(markers)
    }

    fn beat_index(times: &[f64]) -> MarkerIndex {
        let beats: Vec<TimelineMarker> = times
            .iter()
            .map(|&t| TimelineMarker::new(t, MarkerType::Beat))
            .collect();
        MarkerIndex::new(map_markers(&beats, 0, 30.0, 0))
    }

    #[test]
    fn test_range_is_inclusive() {
        let index = beat_index(&[0.5, 1.0, 1.5]);
        assert_eq!(index.markers_in_range(15, 45).len(), 3);
        assert_eq!(index.markers_in_range(16, 44).len(), 1);
        assert!(index.markers_in_range(45, 15).is_empty());
    }

    #[test]
    fn test_window_lookup() {
        let index = beat_index(&[0.5, 1.0, 1.5]);
        assert_eq!(index.markers_in_window(30, 0).len(), 1);
        assert_eq!(index.markers_in_window(30, 14).len(), 1);
        assert_eq!(index.markers_in_window(30, 15).len(), 3);
        assert!(index.markers_in_window(100, 5).is_empty());
    }

    #[test]
    fn test_tolerance_stops_at_first_populated_frame() {
        let index = index_of(&[(10, MarkerType::Onset), (12, MarkerType::Beat)]);

        assert!(index.has_marker_near(11, None, 1));
        assert!(index.has_marker_near(11, Some(MarkerType::Onset), 1));
        // frame 10 is populated but has no beat, so the scan ends there
        assert!(!index.has_marker_near(11, Some(MarkerType::Beat), 1));
        assert!(!index.has_marker_near(20, None, 3));
    }

    #[test]
    fn test_tolerance_full_window() {
        let index = index_of(&[(10, MarkerType::Onset), (12, MarkerType::Beat)])
            .with_tolerance_scan(ToleranceScan::FullWindow);

        assert!(index.has_marker_near(11, Some(MarkerType::Beat), 1));
        assert!(!index.has_marker_near(11, Some(MarkerType::Downbeat), 1));
    }

    #[test]
    fn test_next_and_previous() {
        let index = index_of(&[
            (15, MarkerType::Beat),
            (20, MarkerType::Onset),
            (30, MarkerType::Beat),
        ]);

        assert_eq!(index.next_marker(15, None).and_then(|m| m.frame), Some(20));
        assert_eq!(index.next_marker(15, Some(MarkerType::Beat)).and_then(|m| m.frame), Some(30));
        assert!(index.next_marker(30, None).is_none());

        assert_eq!(index.previous_marker(30, None).and_then(|m| m.frame), Some(20));
        assert_eq!(
            index.previous_marker(30, Some(MarkerType::Beat)).and_then(|m| m.frame),
            Some(15)
        );
        assert!(index.previous_marker(15, None).is_none());
        assert!(index.next_marker(0, Some(MarkerType::Downbeat)).is_none());
    }

    #[test]
    fn test_interpolate() {
        let index = beat_index(&[0.5, 1.5]);

        assert_eq!(index.interpolate(15, MarkerType::Beat), 0.0);
        assert!((index.interpolate(44, MarkerType::Beat) - 29.0 / 30.0).abs() < 1e-9);
        assert!((index.interpolate(30, MarkerType::Beat) - 0.5).abs() < 1e-9);

        // no neighbour on one side
        assert_eq!(index.interpolate(10, MarkerType::Beat), 0.0);
        assert_eq!(index.interpolate(50, MarkerType::Beat), 0.0);
        assert_eq!(index.interpolate(30, MarkerType::Onset), 0.0);
    }

    #[test]
    fn test_interpolate_on_interior_marker() {
        let index = beat_index(&[0.5, 1.5, 2.5]);

        // frame 45 is a beat; its neighbours are 15 and 75
        assert!((index.interpolate(45, MarkerType::Beat) - 0.5).abs() < 1e-9);
        assert!((index.interpolate(60, MarkerType::Beat) - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_interpolate_extreme_frames() {
        let index = index_of(&[(i64::MIN + 1, MarkerType::Beat), (i64::MAX - 1, MarkerType::Beat)]);

        let progress = index.interpolate(0, MarkerType::Beat);
        assert!((progress - 0.5).abs() < 1e-9, "progress {}", progress);
        assert_eq!(index.interpolate(i64::MIN, MarkerType::Beat), 0.0);
        assert_eq!(index.interpolate(i64::MAX, MarkerType::Beat), 0.0);
    }

    #[test]
    fn test_nearest_frame() {
        let index = beat_index(&[0.5, 1.0]);

        assert_eq!(index.nearest_frame(22), Some(15));
        assert_eq!(index.nearest_frame(23), Some(30));
        assert_eq!(index.nearest_frame(30), Some(30));
        assert_eq!(index.nearest_frame(-100), Some(15));
        assert_eq!(MarkerIndex::default().nearest_frame(5), None);
    }

    #[test]
    fn test_membership_and_frames() {
        let index = beat_index(&[0.5, 1.0, 1.0]);

        assert!(index.has_markers(30));
        assert!(!index.has_markers(31));
        assert_eq!(index.all_marker_frames(), &[15, 30]);
        assert_eq!(index.markers_at(30).len(), 2);
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn test_empty_index() {
        let index = MarkerIndex::new(FrameMarkers::new());
        assert!(index.is_empty());
        assert!(!index.has_marker_near(0, None, 10));
        assert!(index.next_marker(0, None).is_none());
        assert_eq!(index.interpolate(0, MarkerType::Beat), 0.0);
    }
}
