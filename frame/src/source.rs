//! The frame source seam and a software implementation.

use crate::{AffineTransform, Dimensions, FrameError, RawFrame};
use image::RgbaImage;
use std::fmt;
use std::path::Path;

/// Hands out decoded frames for a playback timestamp.
///
/// Implemented by platform players (an `AVAssetImageGenerator` with zero
/// tolerance, a `MediaMetadataRetriever`, ...) and by
/// [`ImageSequenceSource`]. `frame_at` may block; it is only called from a
/// background worker and must never mutate playback state.
pub trait FrameSource: Send + Sync + fmt::Debug {
    /// Decode the frame displayed at `timestamp_ms`.
    ///
    /// # Errors
    ///
    /// Returns a [`FrameError`] when no frame is available for the timestamp.
    fn frame_at(&self, timestamp_ms: u64) -> Result<RawFrame, FrameError>;

    /// The track's preferred transform, as stored in its metadata.
    fn preferred_transform(&self) -> AffineTransform {
        AffineTransform::IDENTITY
    }
}

/// A frame source backed by in-memory images.
///
/// Each frame is shown from its timestamp until the next one; the last frame
/// lasts `frame_duration_ms` and stays on screen at exactly the end time,
/// where a finished player parks.
#[derive(Debug, Clone)]
pub struct ImageSequenceSource {
    frames: Vec<RawFrame>,
    frame_duration_ms: u64,
    transform: AffineTransform,
}

impl ImageSequenceSource {
    /// Create an empty sequence.
    #[must_use]
    pub const fn new(frame_duration_ms: u64) -> Self {
        Self {
            frames: Vec::new(),
            frame_duration_ms,
            transform: AffineTransform::IDENTITY,
        }
    }

    /// A single image shown for `duration_ms`.
    #[must_use]
    pub fn still(image: RgbaImage, duration_ms: u64) -> Self {
        let mut source = Self::new(duration_ms);
        source.push(0, image);
        source
    }

    /// Load a single image file with the `image` crate.
    ///
    /// # Errors
    ///
    /// Returns the decoder error if the file cannot be read or decoded.
    pub fn open_still(path: impl AsRef<Path>, duration_ms: u64) -> Result<Self, image::ImageError> {
        let image = image::open(path)?.to_rgba8();
        Ok(Self::still(image, duration_ms))
    }

    /// Set the preferred transform reported to the adapter.
    #[must_use]
    pub const fn with_transform(mut self, transform: AffineTransform) -> Self {
        self.transform = transform;
        self
    }

    /// Add a frame shown from `timestamp_ms`.
    ///
    /// A frame already at that timestamp is replaced.
    pub fn push(&mut self, timestamp_ms: u64, image: RgbaImage) {
        let frame = RawFrame::from_rgba(image, timestamp_ms);
        let index = self
            .frames
            .partition_point(|existing| existing.timestamp_ms < timestamp_ms);
        match self.frames.get(index) {
            Some(existing) if existing.timestamp_ms == timestamp_ms => self.frames[index] = frame,
            _ => self.frames.insert(index, frame),
        }
    }

    /// Total duration in milliseconds.
    #[must_use]
    pub fn duration_ms(&self) -> u64 {
        self.frames
            .last()
            .map_or(0, |last| last.timestamp_ms + self.frame_duration_ms)
    }

    /// Size of the stored (unrotated) buffers.
    #[must_use]
    pub fn natural_size(&self) -> Dimensions {
        self.frames
            .first()
            .map(RawFrame::dimensions)
            .unwrap_or_default()
    }

    /// Number of frames.
    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Whether the sequence has no frames.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl FrameSource for ImageSequenceSource {
    fn frame_at(&self, timestamp_ms: u64) -> Result<RawFrame, FrameError> {
        if self.frames.is_empty() {
            return Err(FrameError::NoActiveItem);
        }
        if timestamp_ms > self.duration_ms() {
            return Err(FrameError::NotReady { timestamp_ms });
        }

        let index = self
            .frames
            .partition_point(|frame| frame.timestamp_ms <= timestamp_ms);
        index
            .checked_sub(1)
            .and_then(|i| self.frames.get(i))
            .cloned()
            .ok_or(FrameError::NotReady { timestamp_ms })
    }

    fn preferred_transform(&self) -> AffineTransform {
        self.transform
    }
}
