//! Per-session wrapper around a [`FrameSource`].

use crate::{AffineTransform, FrameCache, FrameError, FrameSource, RawFrame, Rotation};
use log::{debug, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Frame access for one playback session.
///
/// The source orientation is resolved once, when the adapter is created, and
/// cached for the lifetime of the session. Frames are cached by timestamp.
/// After [`release`](Self::release) every request, including ones already in
/// flight, resolves to [`FrameError::TornDown`].
#[derive(Debug)]
pub struct FrameSourceAdapter {
    source: Mutex<Option<Arc<dyn FrameSource>>>,
    rotation: Rotation,
    cache: Mutex<FrameCache>,
    released: AtomicBool,
}

impl FrameSourceAdapter {
    /// Wrap `source`, classifying its preferred transform.
    #[must_use]
    pub fn new(source: Arc<dyn FrameSource>, cache_capacity: usize) -> Self {
        let transform = source.preferred_transform();
        Self::with_transform(source, transform, cache_capacity)
    }

    /// Wrap `source`, classifying `transform` from the track metadata.
    #[must_use]
    pub fn with_transform(source: Arc<dyn FrameSource>, transform: AffineTransform, cache_capacity: usize) -> Self {
        let rotation = Rotation::classify(&transform);
        if rotation == Rotation::Unknown {
            warn!("unsupported track transform {transform:?}, rendering frames unrotated");
        }

        Self {
            source: Mutex::new(Some(source)),
            rotation,
            cache: Mutex::new(FrameCache::new(cache_capacity)),
            released: AtomicBool::new(false),
        }
    }

    /// Rotation resolved from the track metadata.
    #[must_use]
    pub const fn orientation(&self) -> Rotation {
        self.rotation
    }

    /// Fetch the frame at `timestamp_ms`, from the cache when possible.
    ///
    /// Blocks while the source decodes; call it off the UI thread.
    ///
    /// # Errors
    ///
    /// Returns a [`FrameError`] when no frame is available. These are
    /// transient and should not be surfaced to the user.
    pub fn get_frame(&self, timestamp_ms: u64) -> Result<RawFrame, FrameError> {
        if let Some(frame) = self.lock_cache().get(timestamp_ms) {
            return Ok(frame);
        }

        let source = self
            .source
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(FrameError::TornDown)?;

        let frame = source.frame_at(timestamp_ms).inspect_err(|e| {
            debug!("frame at {timestamp_ms} ms unavailable: {e}");
        })?;

        // Released while the source was decoding.
        if self.is_released() {
            return Err(FrameError::TornDown);
        }

        self.lock_cache().insert(timestamp_ms, frame.clone());
        Ok(frame)
    }

    /// Tear the session down, dropping the source and cached frames.
    pub fn release(&self) {
        self.released.store(true, Ordering::Release);
        self.source
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        self.lock_cache().clear();
    }

    /// Whether [`release`](Self::release) was called.
    #[must_use]
    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }

    /// Number of frames currently cached.
    #[must_use]
    pub fn cached_frames(&self) -> usize {
        self.lock_cache().len()
    }

    fn lock_cache(&self) -> std::sync::MutexGuard<'_, FrameCache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
