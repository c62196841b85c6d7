use serde::{Deserialize, Serialize};

/// A run of beats whose relative spacing has been classified
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RhythmicPattern {
    /// Time of the first beat in the run (seconds)
    pub start_time: f64,

    /// Time of the last beat in the run (seconds, > start_time)
    pub end_time: f64,

    /// Pattern signature, e.g. "eighth-eighth-half"
    pub pattern: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_signature: Option<TimeSignature>,
}

/// Musical meter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSignature {
    pub numerator: u8,
    pub denominator: u8,
}

impl TimeSignature {
    /// Common time, the meter assumed by the downbeat heuristic
    pub const COMMON: TimeSignature = TimeSignature {
        numerator: 4,
        denominator: 4,
    };
}

impl std::fmt::Display for TimeSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

impl RhythmicPattern {
    /// Span of the pattern in seconds
    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }
}
