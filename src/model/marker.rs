use serde::{Deserialize, Serialize};

/// A typed, timestamped event used to trigger synchronized visuals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineMarker {
    /// Position in seconds from the start of the audio (>= 0)
    pub time: f64,

    /// Frame on the video timeline, assigned by the frame mapper
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame: Option<i64>,

    /// Marker category
    #[serde(rename = "type")]
    pub marker_type: MarkerType,

    /// Detection confidence in [0, 1]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,

    /// Relative strength in [0, 1]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strength: Option<f32>,

    /// Opaque payload carried through to consumers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

/// Marker categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerType {
    Beat,
    Onset,
    Downbeat,
    Pattern,
    Harmonic,
}

impl MarkerType {
    /// All categories, in frame-merge order followed by the unmerged ones
    pub const ALL: [MarkerType; 5] = [
        MarkerType::Beat,
        MarkerType::Onset,
        MarkerType::Downbeat,
        MarkerType::Pattern,
        MarkerType::Harmonic,
    ];

    /// Get the lowercase category name
    pub fn name(&self) -> &'static str {
        match self {
            MarkerType::Beat => "beat",
            MarkerType::Onset => "onset",
            MarkerType::Downbeat => "downbeat",
            MarkerType::Pattern => "pattern",
            MarkerType::Harmonic => "harmonic",
        }
    }
}

impl std::fmt::Display for MarkerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for MarkerType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "beat" => Ok(MarkerType::Beat),
            "onset" => Ok(MarkerType::Onset),
            "downbeat" => Ok(MarkerType::Downbeat),
            "pattern" => Ok(MarkerType::Pattern),
            "harmonic" => Ok(MarkerType::Harmonic),
            other => Err(format!("unknown marker type: {}", other)),
        }
    }
}

impl TimelineMarker {
    /// Create an unmapped marker. Negative or non-finite times are pinned to 0.
    pub fn new(time: f64, marker_type: MarkerType) -> Self {
        let time = if time.is_finite() { time.max(0.0) } else { 0.0 };
        Self {
            time,
            frame: None,
            marker_type,
            confidence: None,
            strength: None,
            data: None,
        }
    }

    /// Set the confidence, clamped into [0, 1]
    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = Some(unit(confidence));
        self
    }

    /// Set the strength, clamped into [0, 1]
    pub fn with_strength(mut self, strength: f32) -> Self {
        self.strength = Some(unit(strength));
        self
    }

    /// Attach an opaque payload
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Copy of this marker stamped with a frame
    pub fn at_frame(&self, frame: i64) -> Self {
        let mut marker = self.clone();
        marker.frame = Some(frame);
        marker
    }
}

fn unit(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_and_strength_are_clamped() {
        let marker = TimelineMarker::new(1.0, MarkerType::Onset)
            .with_confidence(1.7)
            .with_strength(-0.2);

        assert_eq!(marker.confidence, Some(1.0));
        assert_eq!(marker.strength, Some(0.0));

        let nan = TimelineMarker::new(1.0, MarkerType::Onset).with_strength(f32::NAN);
        assert_eq!(nan.strength, Some(0.0));
    }

    #[test]
    fn test_negative_time_is_pinned() {
        assert_eq!(TimelineMarker::new(-3.0, MarkerType::Beat).time, 0.0);
        assert_eq!(TimelineMarker::new(f64::NAN, MarkerType::Beat).time, 0.0);
    }

    #[test]
    fn test_marker_type_round_trips_through_names() {
        for marker_type in MarkerType::ALL {
            let parsed: MarkerType = marker_type.name().parse().unwrap();
            assert_eq!(parsed, marker_type);
        }
        assert!("snare".parse::<MarkerType>().is_err());
    }

    #[test]
    fn test_serializes_type_field() {
        let marker = TimelineMarker::new(0.5, MarkerType::Downbeat).at_frame(15);
        let json = serde_json::to_value(&marker).unwrap();

        assert_eq!(json["type"], "downbeat");
        assert_eq!(json["frame"], 15);
        assert!(json.get("confidence").is_none());
    }
}
