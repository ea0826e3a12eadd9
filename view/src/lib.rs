//! A video view with a pan-driven magnifier loupe.
//!
//! [`VideoView`] is the widget contract a host binds to: transport control
//! through a [`Playback`](videoview_player::Playback) facade, pan input that
//! drives the magnifier pipeline, and lifecycle forwarding from the host
//! activity.

#![warn(missing_docs)]

mod lifecycle;
mod session;
mod view;

pub use lifecycle::{LifecycleEvent, LifecycleProxy, LifecycleState, OwnerId};
pub use session::PlaybackSession;
pub use view::VideoView;

use videoview_magnifier::MagnifierError;
use videoview_player::PlayerError;

/// Errors that can occur while driving a video view.
#[derive(Debug, thiserror::Error)]
pub enum ViewError {
    /// The magnifier could not be started.
    #[error(transparent)]
    Magnifier(#[from] MagnifierError),
    /// The media could not be opened.
    #[error(transparent)]
    Player(#[from] PlayerError),
    /// The view was destroyed.
    #[error("video view was destroyed")]
    Destroyed,
}
