//! Decoded video frame access.
//!
//! This crate provides the frame side of a video view:
//! - **[`FrameSource`]**: the seam a platform player implements to hand out
//!   decoded images for a playback timestamp
//! - **[`FrameSourceAdapter`]**: caches frames and the source orientation for
//!   one playback session
//! - **Orientation**: classifies a track's preferred transform into a
//!   [`Rotation`] and rotates raw frames upright
//! - **[`ImageSequenceSource`]**: a software source backed by still images

#![warn(missing_docs)]

mod adapter;
mod cache;
mod orientation;
mod source;

pub use adapter::FrameSourceAdapter;
pub use cache::FrameCache;
pub use orientation::{AffineTransform, OrientedFrame, Rotation, normalize};
pub use source::{FrameSource, ImageSequenceSource};

/// Re-export image for callers that consume oriented frames.
pub use image;

use image::RgbaImage;
use std::sync::Arc;

/// Errors that can occur while fetching a frame.
///
/// Every variant means the frame is unavailable; none of them is fatal to
/// playback.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    /// The player has no active item.
    #[error("no active media item")]
    NoActiveItem,
    /// No decoded buffer is ready for the timestamp.
    #[error("no decoded frame at {timestamp_ms} ms")]
    NotReady {
        /// Requested timestamp in milliseconds.
        timestamp_ms: u64,
    },
    /// The session was released while the request was in flight.
    #[error("frame source was torn down")]
    TornDown,
    /// The platform decoder failed.
    #[error("decode failed: {0}")]
    Decode(String),
    /// Buffer length does not match its dimensions.
    #[error("invalid frame buffer: expected {expected} bytes, got {actual}")]
    InvalidBuffer {
        /// Bytes implied by width, height and format.
        expected: usize,
        /// Bytes actually present.
        actual: usize,
    },
}

/// Pixel dimensions of a video track or frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Dimensions {
    /// Create new dimensions.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Whether either side is zero.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Dimensions after applying `rotation`.
    ///
    /// Quarter turns swap the axes; everything else keeps them.
    #[must_use]
    pub const fn oriented(self, rotation: Rotation) -> Self {
        if rotation.swaps_axes() {
            Self::new(self.height, self.width)
        } else {
            self
        }
    }
}

/// Layout of a raw frame buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PixelFormat {
    /// RGBA 8-bit.
    #[default]
    Rgba,
    /// BGRA 8-bit (`kCVPixelFormatType_32BGRA`).
    Bgra,
}

/// A decoded frame as handed out by a [`FrameSource`], before orientation.
#[derive(Clone)]
pub struct RawFrame {
    /// Packed pixel data, 4 bytes per pixel, no row padding.
    pub data: Arc<Vec<u8>>,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Layout of `data`.
    pub format: PixelFormat,
    /// Presentation timestamp in milliseconds.
    pub timestamp_ms: u64,
}

impl std::fmt::Debug for RawFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawFrame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("format", &self.format)
            .field("timestamp_ms", &self.timestamp_ms)
            .field("data_len", &self.data.len())
            .finish()
    }
}

impl RawFrame {
    /// Wrap an RGBA image.
    #[must_use]
    pub fn from_rgba(image: RgbaImage, timestamp_ms: u64) -> Self {
        let (width, height) = image.dimensions();
        Self {
            data: Arc::new(image.into_raw()),
            width,
            height,
            format: PixelFormat::Rgba,
            timestamp_ms,
        }
    }

    /// Frame dimensions.
    #[must_use]
    pub const fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.width, self.height)
    }

    /// Convert to an owned RGBA image.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::InvalidBuffer`] if the buffer length does not
    /// match the frame dimensions.
    pub fn to_rgba(&self) -> Result<RgbaImage, FrameError> {
        let expected = self.width as usize * self.height as usize * 4;
        if self.data.len() != expected {
            return Err(FrameError::InvalidBuffer {
                expected,
                actual: self.data.len(),
            });
        }

        let mut data = self.data.as_ref().clone();
        if self.format == PixelFormat::Bgra {
            for pixel in data.chunks_exact_mut(4) {
                pixel.swap(0, 2);
            }
        }

        RgbaImage::from_raw(self.width, self.height, data).ok_or(FrameError::InvalidBuffer {
            expected,
            actual: self.data.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn bgra_frames_are_swizzled() {
        let frame = RawFrame {
            data: Arc::new(vec![10, 20, 30, 255]),
            width: 1,
            height: 1,
            format: PixelFormat::Bgra,
            timestamp_ms: 0,
        };
        let image = frame.to_rgba().unwrap();
        assert_eq!(*image.get_pixel(0, 0), Rgba([30, 20, 10, 255]));
    }

    #[test]
    fn short_buffers_are_rejected() {
        let frame = RawFrame {
            data: Arc::new(vec![0; 7]),
            width: 2,
            height: 1,
            format: PixelFormat::Rgba,
            timestamp_ms: 0,
        };
        assert_eq!(
            frame.to_rgba().unwrap_err(),
            FrameError::InvalidBuffer {
                expected: 8,
                actual: 7
            }
        );
    }

    #[test]
    fn quarter_turns_swap_dimensions() {
        let size = Dimensions::new(1920, 1080);
        assert_eq!(size.oriented(Rotation::Deg90), Dimensions::new(1080, 1920));
        assert_eq!(size.oriented(Rotation::DegNeg90), Dimensions::new(1080, 1920));
        assert_eq!(size.oriented(Rotation::Deg180), size);
        assert_eq!(size.oriented(Rotation::Unknown), size);
    }
}
