//! Marker data model
//!
//! Types shared by the extractor, the frame mapper and the query layer.
//! All of them serialize with camelCase keys so reports can be handed to
//! non-Rust rendering layers unchanged.

mod harmonic;
mod marker;
mod markers;
mod pattern;

pub use harmonic::HarmonicMarker;
pub use marker::{MarkerType, TimelineMarker};
pub use markers::AudioMarkers;
pub use pattern::{RhythmicPattern, TimeSignature};
