//! Rhythmic pattern classification over inter-beat intervals

use super::config::PatternDetectionConfig;
use crate::model::{RhythmicPattern, TimeSignature, TimelineMarker};

/// Separator between bucket labels in a pattern signature
pub const PATTERN_SEPARATOR: &str = "-";

/// Duration bucket of one interval relative to the average interval
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntervalClass {
    Sixteenth,
    Eighth,
    Quarter,
    Half,
    Whole,
}

impl IntervalClass {
    /// Bucket a ratio of interval / average interval
    pub fn from_ratio(ratio: f64) -> Self {
        if ratio < 0.6 {
            IntervalClass::Sixteenth
        } else if ratio < 0.8 {
            IntervalClass::Eighth
        } else if ratio < 1.2 {
            IntervalClass::Quarter
        } else if ratio < 1.8 {
            IntervalClass::Half
        } else {
            IntervalClass::Whole
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            IntervalClass::Sixteenth => "sixteenth",
            IntervalClass::Eighth => "eighth",
            IntervalClass::Quarter => "quarter",
            IntervalClass::Half => "half",
            IntervalClass::Whole => "whole",
        }
    }
}

/// Build a pattern signature from a run of intervals (seconds)
///
/// Each interval is bucketed against the mean of the run. Fewer than two
/// intervals, or a run without a positive mean, yields `None`.
pub fn classify_pattern(intervals: &[f64]) -> Option<String> {
    if intervals.len() < 2 {
        return None;
    }

    let average = intervals.iter().sum::<f64>() / intervals.len() as f64;
    if !average.is_finite() || average <= 0.0 {
        return None;
    }

    let labels: Vec<&str> = intervals
        .iter()
        .map(|interval| IntervalClass::from_ratio(interval / average).name())
        .collect();

    Some(labels.join(PATTERN_SEPARATOR))
}

/// Emit one pattern per beat, spanning up to `max_pattern_length` beats forward
pub fn detect_patterns(
    beats: &[TimelineMarker],
    config: &PatternDetectionConfig,
    time_signature: Option<TimeSignature>,
) -> Vec<RhythmicPattern> {
    let max_len = config.max_pattern_length.max(1);
    let mut patterns = Vec::new();

    for i in 0..beats.len() {
        let end = (i + max_len).min(beats.len());
        let run = &beats[i..end];

        if run.len() < config.min_pattern_length {
            continue;
        }

        let intervals: Vec<f64> = run.windows(2).map(|w| w[1].time - w[0].time).collect();

        if let Some(signature) = classify_pattern(&intervals) {
            let start_time = run[0].time;
            let end_time = run[run.len() - 1].time;
            if end_time <= start_time {
                continue;
            }

            patterns.push(RhythmicPattern {
                start_time,
                end_time,
                pattern: signature,
                time_signature,
            });
        }
    }

    log::debug!("Detected {} rhythmic patterns from {} beats", patterns.len(), beats.len());
    patterns
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MarkerType;

    fn beats_at(times: &[f64]) -> Vec<TimelineMarker> {
        times
            .iter()
            .map(|&t| TimelineMarker::new(t, MarkerType::Beat))
            .collect()
    }

    #[test]
    fn test_single_interval_has_no_pattern() {
        assert!(classify_pattern(&[0.5]).is_none());
        assert!(classify_pattern(&[]).is_none());
    }

    #[test]
    fn test_mixed_intervals() {
        let label = classify_pattern(&[0.5, 0.5, 1.0]).unwrap();
        let buckets: Vec<&str> = label.split(PATTERN_SEPARATOR).collect();

        assert_eq!(buckets, vec!["eighth", "eighth", "half"]);
    }

    #[test]
    fn test_even_intervals_are_quarters() {
        let label = classify_pattern(&[0.5, 0.5, 0.5, 0.5]).unwrap();
        assert_eq!(label, "quarter-quarter-quarter-quarter");
    }

    #[test]
    fn test_extreme_ratios() {
        assert_eq!(IntervalClass::from_ratio(0.3), IntervalClass::Sixteenth);
        assert_eq!(IntervalClass::from_ratio(2.5), IntervalClass::Whole);
    }

    #[test]
    fn test_detect_patterns_respects_lengths() {
        let beats = beats_at(&[0.0, 0.5, 1.0, 1.5, 2.0, 2.5]);
        let config = PatternDetectionConfig {
            enabled: true,
            min_pattern_length: 4,
            max_pattern_length: 4,
        };

        let patterns = detect_patterns(&beats, &config, Some(TimeSignature::COMMON));

        // beats 0..=2 can start a full four-beat run
        assert_eq!(patterns.len(), 3);
        assert_eq!(patterns[0].start_time, 0.0);
        assert_eq!(patterns[0].end_time, 1.5);
        assert_eq!(patterns[0].pattern, "quarter-quarter-quarter");
        assert!(patterns.iter().all(|p| p.end_time > p.start_time));
    }

    #[test]
    fn test_detect_patterns_short_runs_skipped() {
        let beats = beats_at(&[0.0, 0.5]);
        let config = PatternDetectionConfig {
            enabled: true,
            min_pattern_length: 2,
            max_pattern_length: 8,
        };

        // two beats give a single interval, which never classifies
        assert!(detect_patterns(&beats, &config, None).is_empty());
    }
}
