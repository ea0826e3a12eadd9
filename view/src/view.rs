//! The video view widget.

use crate::lifecycle::{LifecycleEvent, LifecycleProxy, OwnerId};
use crate::session::PlaybackSession;
use crate::ViewError;
use log::{debug, info};
use std::sync::{Arc, Mutex};
use videoview_magnifier::{
    FrameRequest, Loupe, LoupeState, MagnifierConfig, MagnifierPipeline, MagnifierStyle, PipelineStats,
    Point, Size, UiDispatcher,
};
use videoview_player::{MediaPlayer, Playback, PlayerState};

/// A video view with a pan-driven magnifier loupe.
///
/// Every method must be called from the host's UI thread. Magnifier renders
/// run on a background worker and reach the loupe through the
/// [`UiDispatcher`] given at construction; player notifications fire from
/// [`pump_events`](Self::pump_events).
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use videoview_magnifier::{ImmediateDispatcher, MagnifierConfig, MagnifierStyle};
/// use videoview_player::SequencePlayer;
/// use videoview_view::VideoView;
///
/// # fn main() -> Result<(), videoview_view::ViewError> {
/// let mut view = VideoView::new(SequencePlayer::new(), Arc::new(ImmediateDispatcher), MagnifierConfig::new())?;
/// view.set_viewport(400.0, 225.0);
/// view.configure("/path/to/poster.png", false, MagnifierStyle::Crosshair)?;
/// view.pump_events();
///
/// view.on_pan_update(120.0, 80.0);
/// view.on_pan_end();
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct VideoView {
    playback: Playback,
    pipeline: MagnifierPipeline,
    session: Option<PlaybackSession>,
    lifecycle: Option<LifecycleProxy>,
    viewport: Size,
    panning: bool,
    destroyed: bool,
}

impl VideoView {
    /// Create a view around a platform player.
    ///
    /// # Errors
    ///
    /// Returns [`ViewError::Magnifier`] if `config` is out of range or the
    /// render worker cannot start.
    pub fn new(
        player: impl MediaPlayer + 'static,
        dispatcher: Arc<dyn UiDispatcher>,
        config: MagnifierConfig,
    ) -> Result<Self, ViewError> {
        Ok(Self {
            playback: Playback::new(player),
            pipeline: MagnifierPipeline::new(config, dispatcher)?,
            session: None,
            lifecycle: None,
            viewport: Size::default(),
            panning: false,
            destroyed: false,
        })
    }

    /// Load new media and pick the loupe decoration.
    ///
    /// The previous session is dropped first. Invalid sources are also
    /// reported through the failure callback.
    ///
    /// # Errors
    ///
    /// Returns [`ViewError::Player`] if `(path, is_url)` is not a usable
    /// source, and [`ViewError::Destroyed`] after [`destroy`](Self::destroy).
    pub fn configure(&mut self, path: &str, is_url: bool, style: MagnifierStyle) -> Result<(), ViewError> {
        if self.destroyed {
            return Err(ViewError::Destroyed);
        }
        info!("configuring video view: {path} (url: {is_url}, style: {style})");

        self.pipeline.clear();
        self.panning = false;
        self.session = None;
        self.pipeline.set_style(style);
        self.playback.open(path, is_url)?;
        self.session = PlaybackSession::from_playback(&self.playback, self.pipeline.config().cache_capacity);
        Ok(())
    }

    /// Start playback. Ignored if nothing is loaded or already playing.
    pub fn play(&mut self) {
        self.playback.play();
    }

    /// Pause playback, rewinding to the start if `restart` is set.
    pub fn pause(&mut self, restart: bool) {
        self.playback.pause(restart);
    }

    /// Pause and rewind.
    pub fn stop(&mut self) {
        self.playback.stop();
    }

    /// Seek to `position_ms`.
    pub fn seek_to(&mut self, position_ms: u64) {
        self.playback.seek_to(position_ms);
    }

    /// Set the volume, clamped to `0.0..=1.0`.
    pub fn set_volume(&mut self, volume: f32) {
        self.playback.set_volume(volume);
    }

    /// Duration in milliseconds; zero while unknown.
    #[must_use]
    pub fn duration(&self) -> u64 {
        self.playback.duration_ms()
    }

    /// Playback position in milliseconds.
    #[must_use]
    pub fn current_position(&self) -> u64 {
        self.playback.current_position_ms()
    }

    /// Natural width of the video track; zero while unknown.
    #[must_use]
    pub fn video_width(&self) -> u32 {
        self.playback.video_width()
    }

    /// Natural height of the video track; zero while unknown.
    #[must_use]
    pub fn video_height(&self) -> u32 {
        self.playback.video_height()
    }

    /// Whether the video is advancing without error.
    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.playback.is_playing()
    }

    /// Coarse playback state.
    #[must_use]
    pub fn player_state(&self) -> PlayerState {
        self.playback.state()
    }

    /// Record the view's size in points.
    pub fn set_viewport(&mut self, width: f64, height: f64) {
        self.viewport = Size::new(width, height);
    }

    /// The view's size in points.
    #[must_use]
    pub const fn viewport(&self) -> Size {
        self.viewport
    }

    /// The pointer moved while dragging; magnify the frame under it.
    ///
    /// Supersedes any render still in flight.
    pub fn on_pan_update(&mut self, x: f64, y: f64) {
        if self.destroyed {
            return;
        }
        self.panning = true;
        if !self.viewport.is_drawable() {
            debug!("ignoring pan before the viewport has a size");
            return;
        }
        let timestamp_ms = self.playback.current_position_ms();
        let Some((video, frames)) = self
            .current_session()
            .map(|session| (session.intrinsic_size(), session.frames()))
        else {
            debug!("ignoring pan: no video track yet");
            return;
        };

        self.pipeline.request(FrameRequest {
            timestamp_ms,
            pointer: Point::new(x, y),
            viewport: self.viewport,
            video,
            frames,
        });
    }

    /// Host form of pan input: a position plus whether the drag is active.
    pub fn on_pan(&mut self, position: (f64, f64), active: bool) {
        if active {
            self.on_pan_update(position.0, position.1);
        } else {
            self.on_pan_end();
        }
    }

    /// The drag ended: cancel pending renders and hide the loupe.
    pub fn on_pan_end(&mut self) {
        self.panning = false;
        self.pipeline.cancel();
    }

    /// Whether a drag is in progress.
    #[must_use]
    pub const fn is_panning(&self) -> bool {
        self.panning
    }

    /// Call `callback` whenever the media becomes ready.
    pub fn set_on_prepared<F>(&mut self, callback: F)
    where
        F: FnMut() + Send + 'static,
    {
        self.playback.set_on_prepared(callback);
    }

    /// Call `callback` with a message whenever loading or playback fails.
    pub fn set_on_failed<F>(&mut self, callback: F)
    where
        F: FnMut(&str) + Send + 'static,
    {
        self.playback.set_on_failed(callback);
    }

    /// Call `callback` whenever playback reaches the end.
    pub fn set_on_completion<F>(&mut self, callback: F)
    where
        F: FnMut() + Send + 'static,
    {
        self.playback.set_on_completion(callback);
    }

    /// Remove the prepared callback.
    pub fn clear_on_prepared(&mut self) {
        self.playback.clear_on_prepared();
    }

    /// Remove the failure callback.
    pub fn clear_on_failed(&mut self) {
        self.playback.clear_on_failed();
    }

    /// Remove the completion callback.
    pub fn clear_on_completion(&mut self) {
        self.playback.clear_on_completion();
    }

    /// Deliver pending player notifications, returning how many fired.
    pub fn pump_events(&mut self) -> usize {
        self.playback.pump_events()
    }

    /// Snapshot of the loupe.
    #[must_use]
    pub fn loupe(&self) -> LoupeState {
        self.pipeline.loupe()
    }

    /// Shared handle to the loupe, for hosts that draw it.
    #[must_use]
    pub fn loupe_handle(&self) -> Arc<Mutex<Loupe>> {
        self.pipeline.loupe_handle()
    }

    /// Magnifier job counters.
    #[must_use]
    pub fn magnifier_stats(&self) -> PipelineStats {
        self.pipeline.stats()
    }

    /// The active session, if track metadata is known.
    #[must_use]
    pub const fn session(&self) -> Option<&PlaybackSession> {
        self.session.as_ref()
    }

    /// Follow the lifecycle of host activity `owner`. Ignored once destroyed.
    pub fn attach_lifecycle(&mut self, owner: OwnerId) {
        if self.destroyed {
            return;
        }
        self.lifecycle = Some(LifecycleProxy::new(owner));
    }

    /// The attached lifecycle proxy.
    #[must_use]
    pub const fn lifecycle(&self) -> Option<&LifecycleProxy> {
        self.lifecycle.as_ref()
    }

    /// Feed a host-wide activity callback through the attached proxy.
    pub fn on_activity_event(&mut self, owner: OwnerId, event: LifecycleEvent) {
        let forwarded = self
            .lifecycle
            .as_mut()
            .and_then(|proxy| proxy.accept(owner, event));
        if let Some(event) = forwarded {
            self.handle_lifecycle(event);
        }
    }

    /// React to a lifecycle event of the owning activity.
    pub fn handle_lifecycle(&mut self, event: LifecycleEvent) {
        match event {
            LifecycleEvent::Paused => self.on_pan_end(),
            LifecycleEvent::Stopped => self.pause(false),
            LifecycleEvent::Destroyed => self.destroy(),
            LifecycleEvent::Created | LifecycleEvent::Started | LifecycleEvent::Resumed => {}
        }
    }

    /// Tear the view down and detach the lifecycle proxy. Later calls are
    /// ignored.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        info!("destroying video view");
        self.destroyed = true;
        self.panning = false;
        self.pipeline.shutdown();
        self.playback.pause(false);
        self.playback.unload();
        self.playback.clear_callbacks();
        self.session = None;
        self.lifecycle = None;
    }

    /// Whether [`destroy`](Self::destroy) has run.
    #[must_use]
    pub const fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// The session for the loaded item, rebuilt if the item changed or its
    /// metadata arrived after `configure`.
    fn current_session(&mut self) -> Option<&PlaybackSession> {
        let stale = self
            .session
            .as_ref()
            .is_some_and(|session| !session.matches(self.playback.source()));
        if stale {
            self.session = None;
        }
        if self.session.is_none() {
            self.session = PlaybackSession::from_playback(&self.playback, self.pipeline.config().cache_capacity);
        }
        self.session.as_ref()
    }
}

impl Drop for VideoView {
    fn drop(&mut self) {
        self.destroy();
    }
}
