//! Pointer-following magnifier loupe for video.
//!
//! While the user pans over a playing video, the loupe shows the current
//! frame around the pointer. This crate provides:
//! - **Geometry**: aspect-fit of the video into its viewport and the mapping
//!   from the pointer to a crop window in frame pixels
//! - **Rendering**: crop, scale and decorate the loupe bitmap
//! - **[`MagnifierPipeline`]**: renders off the UI thread, newest request
//!   wins, and commits to the [`Loupe`] through a [`UiDispatcher`]
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use videoview_frame::{FrameSourceAdapter, ImageSequenceSource, image::RgbaImage};
//! use videoview_magnifier::{
//!     FrameRequest, ImmediateDispatcher, MagnifierConfig, MagnifierPipeline, Point, Size,
//! };
//!
//! # fn main() -> Result<(), videoview_magnifier::MagnifierError> {
//! let source = ImageSequenceSource::still(RgbaImage::new(1920, 1080), 10_000);
//! let frames = Arc::new(FrameSourceAdapter::new(Arc::new(source), 32));
//! let pipeline = MagnifierPipeline::new(MagnifierConfig::new(), Arc::new(ImmediateDispatcher))?;
//!
//! pipeline.request(FrameRequest {
//!     timestamp_ms: 0,
//!     pointer: Point::new(200.0, 112.5),
//!     viewport: Size::new(400.0, 225.0),
//!     video: Size::new(1920.0, 1080.0),
//!     frames,
//! });
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod config;
mod dispatch;
mod geometry;
mod loupe;
mod pipeline;
mod render;

pub use config::{InvalidConfig, MAX_RENDER_SIDE, MAX_ZOOM, MagnifierConfig, MagnifierStyle, UnknownStyle};
pub use dispatch::{ImmediateDispatcher, QueueDispatcher, UiDispatcher, UiTask};
pub use geometry::{DisplayGeometry, GeometryInput, Point, Rect, Size, aspect_fit};
pub use loupe::{Loupe, LoupeState, decorate};
pub use pipeline::{FrameRequest, Generation, JobState, MagnifierPipeline, PipelineStats};
pub use render::{LoupeTarget, draw, prepare, rasterize, render_loupe};

use videoview_frame::FrameError;

/// Errors that can occur while running the magnifier.
#[derive(Debug, thiserror::Error)]
pub enum MagnifierError {
    /// The worker thread could not be started.
    #[error("failed to start magnifier worker: {0}")]
    Worker(#[from] std::io::Error),
    /// A configuration value is out of range.
    #[error(transparent)]
    Config(#[from] InvalidConfig),
    /// No usable frame for the requested timestamp.
    #[error(transparent)]
    Frame(#[from] FrameError),
    /// The video or viewport has no drawable area.
    #[error("nothing to magnify: video {video:?} in viewport {viewport:?}")]
    Geometry {
        /// Intrinsic video size.
        video: Size,
        /// Viewport size.
        viewport: Size,
    },
}
