//! # Videoview
//!
//! A video view with a pointer-following magnifier loupe.
//!
//! While the user drags across a playing video, the loupe shows the current
//! frame around the pointer, rendered off the UI thread so a slow frame fetch
//! never blocks input. Only the newest drag position ever reaches the screen.
//!
//! ## Features
//!
//! Videoview is split into small crates. Enable only the ones you need.
//!
//! - `frame`: Frame sources, orientation normalization and the frame cache.
//! - `magnifier`: Loupe geometry, rendering and the background pipeline.
//! - `player`: The playback facade and the software sequence player.
//! - `view`: The `VideoView` widget tying playback and magnifier together.
//!
//! Use the `full` feature to enable everything.
//!
//! ## Example
//!
//! ```toml
//! [dependencies]
//! videoview = { version = "0.1", features = ["view"] }
//! ```
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use videoview::magnifier::{ImmediateDispatcher, MagnifierConfig, MagnifierStyle};
//! use videoview::player::SequencePlayer;
//! use videoview::view::VideoView;
//!
//! let mut view = VideoView::new(SequencePlayer::new(), Arc::new(ImmediateDispatcher), MagnifierConfig::new())?;
//! view.set_viewport(400.0, 225.0);
//! view.configure("/path/to/poster.png", false, MagnifierStyle::PointMarker)?;
//! view.on_pan_update(200.0, 112.5);
//! ```

#[cfg(feature = "frame")]
pub use videoview_frame as frame;

#[cfg(feature = "magnifier")]
pub use videoview_magnifier as magnifier;

#[cfg(feature = "player")]
pub use videoview_player as player;

#[cfg(feature = "view")]
pub use videoview_view as view;
