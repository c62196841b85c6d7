//! Sample sources
//!
//! Everything upstream of extraction: raw PCM buffers, symphonia decoding,
//! the asset resolver collaborator and the synthetic marker grid used when a
//! source cannot be obtained at all.

mod decode;
mod resolver;
mod synthetic;

pub use decode::{decode_bytes, decode_file};
pub use resolver::{AssetResolver, FileResolver};
pub use synthetic::{synthetic_markers, SYNTHETIC_BPM, SYNTHETIC_DURATION_SECS};

/// File extensions the decoder is built to handle
pub const SUPPORTED_EXTENSIONS: &[&str] = &["mp3", "flac", "wav", "ogg", "aac"];

/// Decoded PCM audio
#[derive(Debug, Clone, PartialEq)]
pub struct PcmBuffer {
    /// Interleaved samples in [-1.0, 1.0]
    pub samples: Vec<f32>,

    /// Number of interleaved channels (1 = mono, 2 = stereo)
    pub channels: usize,

    /// Sample rate in Hz
    pub sample_rate: u32,
}

impl PcmBuffer {
    pub fn new(samples: Vec<f32>, channels: usize, sample_rate: u32) -> Self {
        Self {
            samples,
            channels: channels.max(1),
            sample_rate,
        }
    }

    pub fn mono(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self::new(samples, 1, sample_rate)
    }

    /// Number of sample frames (samples per channel)
    pub fn frame_count(&self) -> usize {
        self.samples.len() / self.channels
    }

    pub fn is_empty(&self) -> bool {
        self.frame_count() == 0
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frame_count() as f64 / self.sample_rate as f64
    }

    /// Convert to mono by averaging channels
    ///
    /// A trailing partial frame is dropped.
    pub fn to_mono(&self) -> Vec<f32> {
        if self.channels == 1 {
            return self.samples.clone();
        }

        self.samples
            .chunks_exact(self.channels)
            .map(|frame| frame.iter().sum::<f32>() / self.channels as f32)
            .collect()
    }
}
