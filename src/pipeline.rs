//! Marker pipeline orchestration
//!
//! resolver → decoder → extractor → cache → frame mapper → marker index

use crate::analysis::{BackendKind, Extraction, Extractor};
use crate::cache::{CancelToken, MarkerCache, SourceKey};
use crate::error::ExtractionError;
use crate::source::{decode_bytes, synthetic_markers, AssetResolver, SYNTHETIC_DURATION_SECS};
use crate::sync::{map_audio_markers, CategoryOffsets, MarkerIndex, ToleranceScan};
use std::sync::Arc;

/// Source identifiers in, frame-indexed markers out
///
/// Never fails: resolver and decode faults substitute the synthetic 120-BPM
/// grid, extraction faults are recovered by the extractor.
pub struct MarkerPipeline<R: AssetResolver> {
    resolver: R,
    extractor: Extractor,
    cache: MarkerCache,
    tolerance_scan: ToleranceScan,
}

impl<R: AssetResolver> MarkerPipeline<R> {
    pub fn new(resolver: R, extractor: Extractor) -> Self {
        Self {
            resolver,
            extractor,
            cache: MarkerCache::new(),
            tolerance_scan: ToleranceScan::default(),
        }
    }

    /// Tolerance behavior of the indexes this pipeline builds
    pub fn with_tolerance_scan(mut self, scan: ToleranceScan) -> Self {
        self.tolerance_scan = scan;
        self
    }

    pub fn cache(&self) -> &MarkerCache {
        &self.cache
    }

    pub fn extractor(&self) -> &Extractor {
        &self.extractor
    }

    /// Cache key for `source_id` under this pipeline's configuration
    pub fn key_for(&self, source_id: &str) -> SourceKey {
        SourceKey::new(source_id, self.extractor.config())
    }

    /// Extraction for `source_id`, computed once and cached
    ///
    /// Returns `None` only if `cancel` fired before a result was available.
    pub fn markers(&self, source_id: &str, cancel: &CancelToken) -> Option<Arc<Extraction>> {
        let key = self.key_for(source_id);
        self.cache
            .get_or_extract(&key, cancel, || self.load(source_id, cancel))
    }

    /// Frame index over the beat/onset/downbeat aggregate of `source_id`
    pub fn frame_index(
        &self,
        source_id: &str,
        start_frame: i64,
        fps: f64,
        offsets: &CategoryOffsets,
        cancel: &CancelToken,
    ) -> Option<MarkerIndex> {
        let extraction = self.markers(source_id, cancel)?;
        let frames = map_audio_markers(&extraction.markers, start_frame, fps, offsets);

        Some(MarkerIndex::new(frames).with_tolerance_scan(self.tolerance_scan))
    }

    fn load(&self, source_id: &str, cancel: &CancelToken) -> Extraction {
        log::debug!("Loading markers for {}", source_id);

        let bytes = match self.resolver.resolve(source_id) {
            Ok(bytes) => bytes,
            Err(e) => {
                log::warn!("Could not resolve {}: {:#}; using synthetic markers", source_id, e);
                return synthetic(ExtractionError::SourceUnavailable(format!("{:#}", e)));
            }
        };

        if cancel.is_cancelled() {
            return Extraction::empty(self.extractor.backend_kind());
        }

        let hint = self.resolver.hint(source_id);
        let pcm = match decode_bytes(bytes, hint.as_deref()) {
            Ok(pcm) => pcm,
            Err(e) => {
                log::warn!("Could not decode {}: {:#}; using synthetic markers", source_id, e);
                return synthetic(ExtractionError::DecodeFailure(format!("{:#}", e)));
            }
        };

        if cancel.is_cancelled() {
            return Extraction::empty(self.extractor.backend_kind());
        }

        self.extractor.extract(&pcm)
    }
}

fn synthetic(reason: ExtractionError) -> Extraction {
    Extraction::degraded(
        synthetic_markers(SYNTHETIC_DURATION_SECS),
        reason,
        BackendKind::Synthetic,
    )
}
