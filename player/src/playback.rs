//! The playback facade used by a video view.

use crate::{MediaPlayer, MediaSource, PlayerError, PlayerEvent, VideoTrack};
use async_channel::{Receiver, Sender};
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Duration;
use videoview_frame::FrameSource;

type Callback = Box<dyn FnMut() + Send>;
type FailureCallback = Box<dyn FnMut(&str) + Send>;

/// Coarse state of the facade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PlayerState {
    /// Nothing loaded.
    #[default]
    Stopped,
    /// Playing.
    Playing,
    /// Loaded but not playing.
    Paused,
}

#[derive(Default)]
struct Callbacks {
    prepared: Option<Callback>,
    failed: Option<FailureCallback>,
    completion: Option<Callback>,
}

impl Callbacks {
    fn deliver(&mut self, event: &PlayerEvent) {
        match event {
            PlayerEvent::Ready => {
                if let Some(callback) = self.prepared.as_mut() {
                    callback();
                }
            }
            PlayerEvent::Failed(message) => {
                if let Some(callback) = self.failed.as_mut() {
                    callback(message);
                }
            }
            PlayerEvent::Completed => {
                if let Some(callback) = self.completion.as_mut() {
                    callback();
                }
            }
        }
    }
}

/// Drives a [`MediaPlayer`] on behalf of a video view.
///
/// Times are whole milliseconds. Transport calls made before anything is
/// loaded are ignored. Notifications are single-slot: registering a callback
/// replaces the previous one. They fire from [`pump_events`](Self::pump_events),
/// which the host calls on its UI thread.
pub struct Playback {
    player: Box<dyn MediaPlayer>,
    events: Receiver<PlayerEvent>,
    notify: Sender<PlayerEvent>,
    source: Option<MediaSource>,
    callbacks: Callbacks,
}

impl std::fmt::Debug for Playback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Playback")
            .field("player", &self.player)
            .field("source", &self.source)
            .field("pending_events", &self.events.len())
            .finish_non_exhaustive()
    }
}

impl Playback {
    /// Wrap a backend.
    #[must_use]
    pub fn new(player: impl MediaPlayer + 'static) -> Self {
        Self::from_boxed(Box::new(player))
    }

    /// Wrap an already boxed backend.
    #[must_use]
    pub fn from_boxed(mut player: Box<dyn MediaPlayer>) -> Self {
        let (notify, events) = async_channel::unbounded();
        player.set_event_sender(notify.clone());
        Self {
            player,
            events,
            notify,
            source: None,
            callbacks: Callbacks::default(),
        }
    }

    /// Load the host's `(path, is_url)` pair.
    ///
    /// An invalid source is also reported through the failure callback.
    ///
    /// # Errors
    ///
    /// Returns [`PlayerError::InvalidSource`] if the pair is not a usable
    /// source; the previous item is unloaded either way.
    pub fn open(&mut self, path: &str, is_url: bool) -> Result<(), PlayerError> {
        match MediaSource::parse(path, is_url) {
            Ok(source) => {
                self.load(source);
                Ok(())
            }
            Err(error) => {
                warn!("rejecting media source {path:?}: {error}");
                self.unload();
                self.report(PlayerEvent::Failed(error.to_string()));
                Err(error)
            }
        }
    }

    /// Replace the current item.
    pub fn load(&mut self, source: MediaSource) {
        info!("loading {source}");
        self.player.load(&source);
        self.source = Some(source);
    }

    /// Drop the current item.
    pub fn unload(&mut self) {
        if self.source.take().is_some() {
            self.player.unload();
        }
    }

    /// The loaded source.
    #[must_use]
    pub const fn source(&self) -> Option<&MediaSource> {
        self.source.as_ref()
    }

    /// Whether an item is loaded.
    #[must_use]
    pub const fn is_loaded(&self) -> bool {
        self.source.is_some()
    }

    /// Start playback. Ignored if nothing is loaded or already playing.
    pub fn play(&mut self) {
        if !self.is_loaded() || self.is_playing() {
            return;
        }
        self.player.play();
    }

    /// Pause playback, rewinding to the start if `restart` is set.
    pub fn pause(&mut self, restart: bool) {
        if !self.is_loaded() {
            return;
        }
        self.player.pause();
        if restart {
            self.player.seek(Duration::ZERO);
        }
    }

    /// Pause and rewind.
    pub fn stop(&mut self) {
        self.pause(true);
    }

    /// Seek to `position_ms`.
    pub fn seek_to(&mut self, position_ms: u64) {
        if self.is_loaded() {
            self.player.seek(Duration::from_millis(position_ms));
        }
    }

    /// Set the volume, clamped to `0.0..=1.0`.
    pub fn set_volume(&mut self, volume: f32) {
        let volume = if volume.is_nan() { 0.0 } else { volume.clamp(0.0, 1.0) };
        self.player.set_volume(volume);
    }

    /// Current volume.
    #[must_use]
    pub fn volume(&self) -> f32 {
        self.player.volume()
    }

    /// Duration in milliseconds; zero while unknown.
    #[must_use]
    pub fn duration_ms(&self) -> u64 {
        if !self.is_loaded() {
            return 0;
        }
        self.player.duration().map_or(0, millis)
    }

    /// Playback position in milliseconds.
    #[must_use]
    pub fn current_position_ms(&self) -> u64 {
        if !self.is_loaded() {
            return 0;
        }
        millis(self.player.current_time())
    }

    /// Whether the item is advancing without error.
    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.is_loaded() && self.player.rate() != 0.0 && self.player.error().is_none()
    }

    /// Coarse state.
    #[must_use]
    pub fn state(&self) -> PlayerState {
        if !self.is_loaded() {
            PlayerState::Stopped
        } else if self.is_playing() {
            PlayerState::Playing
        } else {
            PlayerState::Paused
        }
    }

    /// The loaded item's video track.
    #[must_use]
    pub fn video_track(&self) -> Option<VideoTrack> {
        self.is_loaded().then(|| self.player.video_track()).flatten()
    }

    /// Natural width of the video track; zero while unknown.
    #[must_use]
    pub fn video_width(&self) -> u32 {
        self.video_track().map_or(0, |track| track.natural_size.width)
    }

    /// Natural height of the video track; zero while unknown.
    #[must_use]
    pub fn video_height(&self) -> u32 {
        self.video_track().map_or(0, |track| track.natural_size.height)
    }

    /// Frame access for the loaded item.
    #[must_use]
    pub fn frame_source(&self) -> Option<Arc<dyn FrameSource>> {
        self.is_loaded().then(|| self.player.frame_source()).flatten()
    }

    /// Call `callback` whenever the item becomes ready.
    pub fn set_on_prepared<F>(&mut self, callback: F)
    where
        F: FnMut() + Send + 'static,
    {
        self.callbacks.prepared = Some(Box::new(callback));
    }

    /// Call `callback` with a message whenever loading or playback fails.
    pub fn set_on_failed<F>(&mut self, callback: F)
    where
        F: FnMut(&str) + Send + 'static,
    {
        self.callbacks.failed = Some(Box::new(callback));
    }

    /// Call `callback` whenever playback reaches the end.
    pub fn set_on_completion<F>(&mut self, callback: F)
    where
        F: FnMut() + Send + 'static,
    {
        self.callbacks.completion = Some(Box::new(callback));
    }

    /// Remove the prepared callback.
    pub fn clear_on_prepared(&mut self) {
        self.callbacks.prepared = None;
    }

    /// Remove the failure callback.
    pub fn clear_on_failed(&mut self) {
        self.callbacks.failed = None;
    }

    /// Remove the completion callback.
    pub fn clear_on_completion(&mut self) {
        self.callbacks.completion = None;
    }

    /// Remove every callback.
    pub fn clear_callbacks(&mut self) {
        self.callbacks = Callbacks::default();
    }

    /// Deliver pending backend events to the callbacks, returning how many
    /// were delivered.
    pub fn pump_events(&mut self) -> usize {
        self.player.poll();
        let mut delivered = 0;
        while let Ok(event) = self.events.try_recv() {
            match &event {
                PlayerEvent::Failed(message) => warn!("playback failed: {message}"),
                other => debug!("player event: {other:?}"),
            }
            self.callbacks.deliver(&event);
            delivered += 1;
        }
        delivered
    }

    fn report(&self, event: PlayerEvent) {
        if self.notify.try_send(event).is_err() {
            debug!("player event channel closed");
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SequencePlayer;
    use std::sync::Mutex;
    use videoview_frame::ImageSequenceSource;
    use videoview_frame::image::RgbaImage;

    fn clip() -> MediaSource {
        MediaSource::Url("memory://clip".into())
    }

    fn playback() -> Playback {
        let mut player = SequencePlayer::new();
        player.register(clip(), ImageSequenceSource::still(RgbaImage::new(64, 36), 10_000));
        Playback::new(player)
    }

    fn record(playback: &mut Playback) -> Arc<Mutex<Vec<String>>> {
        let log = Arc::new(Mutex::new(Vec::new()));
        let prepared = Arc::clone(&log);
        playback.set_on_prepared(move || prepared.lock().unwrap().push("prepared".into()));
        let failed = Arc::clone(&log);
        playback.set_on_failed(move |message| failed.lock().unwrap().push(format!("failed: {message}")));
        let completed = Arc::clone(&log);
        playback.set_on_completion(move || completed.lock().unwrap().push("completed".into()));
        log
    }

    #[test]
    fn calls_before_load_are_ignored() {
        let mut playback = playback();
        playback.play();
        playback.seek_to(500);
        playback.pause(true);

        assert_eq!(playback.state(), PlayerState::Stopped);
        assert!(!playback.is_playing());
        assert_eq!(playback.duration_ms(), 0);
        assert_eq!(playback.current_position_ms(), 0);
        assert_eq!(playback.video_width(), 0);
    }

    #[test]
    fn load_reports_prepared_on_pump() {
        let mut playback = playback();
        let log = record(&mut playback);
        playback.load(clip());

        assert!(log.lock().unwrap().is_empty());
        assert_eq!(playback.pump_events(), 1);
        assert_eq!(*log.lock().unwrap(), vec!["prepared".to_owned()]);
        assert_eq!(playback.duration_ms(), 10_000);
        assert_eq!((playback.video_width(), playback.video_height()), (64, 36));
    }

    #[test]
    fn invalid_source_goes_to_on_failed() {
        let mut playback = playback();
        let log = record(&mut playback);

        assert!(playback.open("no-scheme/clip.mp4", true).is_err());
        playback.pump_events();

        let log = log.lock().unwrap();
        assert_eq!(log.len(), 1);
        assert!(log[0].starts_with("failed: invalid media source"));
        assert!(!playback.is_loaded());
    }

    #[test]
    fn pause_with_restart_rewinds() {
        let mut playback = playback();
        playback.load(clip());
        playback.play();
        playback.seek_to(4_000);
        assert!(playback.current_position_ms() >= 4_000);

        playback.pause(false);
        assert!(!playback.is_playing());
        assert!(playback.current_position_ms() >= 4_000);

        playback.pause(true);
        assert_eq!(playback.current_position_ms(), 0);
    }

    #[test]
    fn stop_is_pause_with_restart() {
        let mut playback = playback();
        playback.load(clip());
        playback.play();
        playback.seek_to(2_500);
        playback.stop();

        assert_eq!(playback.state(), PlayerState::Paused);
        assert_eq!(playback.current_position_ms(), 0);
    }

    #[test]
    fn play_twice_is_harmless() {
        let mut playback = playback();
        playback.load(clip());
        playback.play();
        playback.play();
        assert_eq!(playback.state(), PlayerState::Playing);
    }

    #[test]
    fn volume_is_clamped() {
        let mut playback = playback();
        playback.set_volume(1.7);
        assert!((playback.volume() - 1.0).abs() < f32::EPSILON);
        playback.set_volume(-0.3);
        assert!(playback.volume().abs() < f32::EPSILON);
        playback.set_volume(f32::NAN);
        assert!(playback.volume().abs() < f32::EPSILON);
    }

    #[test]
    fn last_registration_wins() {
        let mut playback = playback();
        let first = Arc::new(Mutex::new(0));
        let second = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&first);
        playback.set_on_prepared(move || *counter.lock().unwrap() += 1);
        let counter = Arc::clone(&second);
        playback.set_on_prepared(move || *counter.lock().unwrap() += 1);

        playback.load(clip());
        playback.pump_events();
        assert_eq!(*first.lock().unwrap(), 0);
        assert_eq!(*second.lock().unwrap(), 1);

        playback.clear_on_prepared();
        playback.load(clip());
        playback.pump_events();
        assert_eq!(*second.lock().unwrap(), 1);
    }

    #[test]
    fn unknown_media_fails() {
        let mut playback = playback();
        let log = record(&mut playback);
        playback.load(MediaSource::Url("memory://missing".into()));
        playback.pump_events();

        assert_eq!(log.lock().unwrap().len(), 1);
        assert!(!playback.is_playing());
        playback.play();
        assert!(!playback.is_playing());
    }
}
