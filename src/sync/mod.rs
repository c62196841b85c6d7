//! Frame synchronization
//!
//! Maps time-domain markers onto a per-frame video timeline and answers
//! per-frame queries against the result. Nothing in here fails: bad frame
//! rates or non-finite times produce empty collections or `None`.

mod index;
mod mapper;

pub use index::{MarkerIndex, ToleranceScan};
pub use mapper::{
    frame_for_time, map_audio_markers, map_category, map_markers, CategoryOffsets, FrameMarkers,
    AGGREGATE_CATEGORIES,
};
