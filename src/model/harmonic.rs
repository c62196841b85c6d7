use serde::{Deserialize, Serialize};

/// Timbral/harmonic accent detected in a sliding analysis window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HarmonicMarker {
    /// Window start time in seconds
    pub time: f64,

    /// Centroid position converted to Hz (centroid * sample_rate / window_size)
    pub frequency: f32,

    /// Amplitude-weighted centroid position inside the window
    pub spectral_centroid: f32,

    /// RMS energy of the window
    pub energy: f32,

    /// Optional 12-bin pitch class profile
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chroma: Option<[f32; 12]>,
}
