//! Extraction configuration

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Options recognized by every extraction backend
///
/// Unset keys fall back to their defaults, so `{}` is a valid configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExtractionConfig {
    pub beat_tracking: BeatTrackingConfig,
    pub onset_detection: OnsetDetectionConfig,
    pub harmonic_analysis: HarmonicAnalysisConfig,
    pub pattern_detection: PatternDetectionConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BeatTrackingConfig {
    pub enabled: bool,
    pub method: BeatMethod,
    /// Scales the adaptive threshold: the fallback uses `0.7 / sensitivity * p90`
    pub sensitivity: f32,
}

/// Beat tracking method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BeatMethod {
    /// Library tempogram + beat grid; the fallback treats it as `Energy`
    Tempogram,
    /// Energy envelope peak picking
    Energy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OnsetDetectionConfig {
    pub enabled: bool,
    pub method: OnsetMethod,
    /// Multiplier applied to the 80th percentile of the flux series
    pub threshold: f32,
}

/// Onset detection method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OnsetMethod {
    /// Positive energy delta between windows
    EnergyFlux,
    /// Positive magnitude-spectrum delta; the fallback treats it as `EnergyFlux`
    SpectralFlux,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HarmonicAnalysisConfig {
    pub enabled: bool,
    pub window_size: usize,
    pub hop_size: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PatternDetectionConfig {
    pub enabled: bool,
    /// Minimum number of beats in a pattern
    pub min_pattern_length: usize,
    /// Maximum number of beats in a pattern
    pub max_pattern_length: usize,
}

impl Default for BeatTrackingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            method: BeatMethod::Tempogram,
            sensitivity: 1.0,
        }
    }
}

impl Default for OnsetDetectionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            method: OnsetMethod::EnergyFlux,
            threshold: 0.6,
        }
    }
}

impl Default for HarmonicAnalysisConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            window_size: 2048,
            hop_size: 512,
        }
    }
}

impl Default for PatternDetectionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_pattern_length: 4,
            max_pattern_length: 8,
        }
    }
}

impl ExtractionConfig {
    /// Load a configuration from a JSON file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    /// Stable serialized form, used as part of cache keys
    pub fn fingerprint(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Disable every category except beats (and the patterns/downbeats derived from them)
    pub fn beats_only() -> Self {
        let mut config = Self::default();
        config.onset_detection.enabled = false;
        config.harmonic_analysis.enabled = false;
        config
    }
}
