//! Beat Sync - audio marker extraction and frame synchronization
//!
//! This library extracts timing markers (beats, onsets, downbeats, harmonic
//! accents, rhythmic patterns) from decoded audio and maps them onto a video
//! frame timeline for per-frame effect triggering.

pub mod analysis;
pub mod cache;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod source;
pub mod sync;

pub use analysis::{BackendChoice, Extraction, ExtractionConfig, ExtractionStatus, Extractor};
pub use cache::{CancelToken, MarkerCache, SourceKey};
pub use error::ExtractionError;
pub use model::AudioMarkers;
pub use pipeline::MarkerPipeline;
pub use sync::{map_audio_markers, CategoryOffsets, FrameMarkers, MarkerIndex};
