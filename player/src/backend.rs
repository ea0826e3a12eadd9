//! The platform player seam.

use crate::PlayerError;
use async_channel::Sender;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use videoview_frame::{AffineTransform, Dimensions, FrameSource};

/// Media to play.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MediaSource {
    /// Local file path.
    File(PathBuf),
    /// Remote URL.
    Url(String),
}

impl MediaSource {
    /// Build a source from the host's `(path, is_url)` pair.
    ///
    /// # Errors
    ///
    /// Returns [`PlayerError::InvalidSource`] for an empty path or a URL
    /// without a scheme.
    pub fn parse(path: &str, is_url: bool) -> Result<Self, PlayerError> {
        let path = path.trim();
        if path.is_empty() {
            return Err(PlayerError::InvalidSource("empty path".into()));
        }
        if !is_url {
            return Ok(Self::File(PathBuf::from(path)));
        }

        match path.split_once("://") {
            Some((scheme, rest)) if is_scheme(scheme) && !rest.is_empty() => Ok(Self::Url(path.to_owned())),
            _ => Err(PlayerError::InvalidSource(format!("not a URL: {path}"))),
        }
    }

    /// Whether the source is remote.
    #[must_use]
    pub const fn is_url(&self) -> bool {
        matches!(self, Self::Url(_))
    }
}

fn is_scheme(scheme: &str) -> bool {
    let mut chars = scheme.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

impl<P: AsRef<Path>> From<P> for MediaSource {
    fn from(path: P) -> Self {
        Self::File(path.as_ref().to_path_buf())
    }
}

impl fmt::Display for MediaSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Url(url) => f.write_str(url),
        }
    }
}

/// Asynchronous notifications from a backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerEvent {
    /// The loaded item is ready to play.
    Ready,
    /// Loading or playback failed.
    Failed(String),
    /// Playback reached the end of the item.
    Completed,
}

/// The loaded item's video track.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoTrack {
    /// Size of the decoded buffers, before the preferred transform.
    pub natural_size: Dimensions,
    /// Orientation metadata of the track.
    pub preferred_transform: AffineTransform,
}

/// A platform video player.
///
/// All methods are called from the UI thread. Outcomes that arrive later
/// (readiness, failures, end of playback) are pushed through the sender
/// handed over in [`set_event_sender`](Self::set_event_sender).
pub trait MediaPlayer: Send + fmt::Debug {
    /// Where to push [`PlayerEvent`]s.
    fn set_event_sender(&mut self, events: Sender<PlayerEvent>);

    /// Replace the current item with `source`.
    fn load(&mut self, source: &MediaSource);

    /// Drop the current item.
    fn unload(&mut self);

    /// Start or resume playback.
    fn play(&mut self);

    /// Pause playback, keeping the position.
    fn pause(&mut self);

    /// Seek to `position` with zero tolerance.
    fn seek(&mut self, position: Duration);

    /// Set the volume, `0.0..=1.0`.
    fn set_volume(&mut self, volume: f32);

    /// Current volume.
    fn volume(&self) -> f32;

    /// Playback rate; zero while paused.
    fn rate(&self) -> f32;

    /// The failure of the current item, if any.
    fn error(&self) -> Option<String>;

    /// Current playback position.
    fn current_time(&self) -> Duration;

    /// Duration of the current item, once known.
    fn duration(&self) -> Option<Duration>;

    /// The current item's video track, once known.
    fn video_track(&self) -> Option<VideoTrack>;

    /// Frame access for the current item.
    fn frame_source(&self) -> Option<Arc<dyn FrameSource>>;

    /// Give the backend a chance to emit time-driven events.
    fn poll(&mut self) {}
}
