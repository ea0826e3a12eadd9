//! Video playback behind a small, platform-neutral facade.
//!
//! This crate provides:
//! - **[`MediaPlayer`]**: the capability trait a platform player implements
//!   (`AVPlayer`, `ExoPlayer`, ...)
//! - **[`Playback`]**: the facade a video view talks to; it normalizes times
//!   to milliseconds and turns [`PlayerEvent`]s into single-slot callbacks
//! - **[`SequencePlayer`]**: a wall-clock software player over image
//!   sequences, for tests and tools
//!
//! # Example
//!
//! ```no_run
//! use videoview_player::{Playback, SequencePlayer};
//!
//! let mut playback = Playback::new(SequencePlayer::new());
//! playback.set_on_prepared(|| println!("ready"));
//! playback.set_on_failed(|message| eprintln!("failed: {message}"));
//!
//! if playback.open("/path/to/clip.png", false).is_ok() {
//!     playback.pump_events();
//!     playback.play();
//! }
//! ```

#![warn(missing_docs)]

mod backend;
mod playback;
mod sequence;

pub use backend::{MediaPlayer, MediaSource, PlayerEvent, VideoTrack};
pub use playback::{Playback, PlayerState};
pub use sequence::SequencePlayer;

/// Errors that can occur during playback.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlayerError {
    /// The path or URL cannot be turned into a media source.
    #[error("invalid media source: {0}")]
    InvalidSource(String),
    /// The backend could not open the media.
    #[error("failed to load media: {0}")]
    LoadFailed(String),
    /// The backend reported a failure after loading.
    #[error("playback failed: {0}")]
    PlaybackFailed(String),
}
