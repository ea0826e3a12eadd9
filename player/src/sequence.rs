//! A software player over image sequences.

use crate::{MediaPlayer, MediaSource, PlayerEvent, VideoTrack};
use async_channel::Sender;
use log::{debug, warn};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use videoview_frame::{FrameSource, ImageSequenceSource};

/// How long a still image file plays by default.
const DEFAULT_STILL_DURATION: Duration = Duration::from_secs(5);

#[derive(Debug)]
struct Item {
    frames: Arc<ImageSequenceSource>,
    duration: Duration,
}

/// Wall-clock playback position.
#[derive(Debug, Clone, Copy, Default)]
struct Clock {
    base: Duration,
    started: Option<Instant>,
}

impl Clock {
    fn position(&self) -> Duration {
        self.base + self.started.map_or(Duration::ZERO, |started| started.elapsed())
    }

    const fn is_running(&self) -> bool {
        self.started.is_some()
    }

    fn start(&mut self) {
        if self.started.is_none() {
            self.started = Some(Instant::now());
        }
    }

    fn stop(&mut self) {
        self.base = self.position();
        self.started = None;
    }

    fn set(&mut self, position: Duration) {
        self.base = position;
        if self.started.is_some() {
            self.started = Some(Instant::now());
        }
    }
}

/// Plays registered image sequences, or still image files, against the wall
/// clock.
///
/// Sources are looked up in the catalog first; a file source that is not
/// registered is decoded with the `image` crate and shown as a still.
#[derive(Debug)]
pub struct SequencePlayer {
    catalog: HashMap<MediaSource, Arc<ImageSequenceSource>>,
    still_duration: Duration,
    events: Option<Sender<PlayerEvent>>,
    item: Option<Item>,
    error: Option<String>,
    clock: Clock,
    volume: f32,
    completed: bool,
}

impl Default for SequencePlayer {
    fn default() -> Self {
        Self::new()
    }
}

impl SequencePlayer {
    /// Create a player with an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self {
            catalog: HashMap::new(),
            still_duration: DEFAULT_STILL_DURATION,
            events: None,
            item: None,
            error: None,
            clock: Clock::default(),
            volume: 1.0,
            completed: false,
        }
    }

    /// Set how long still image files play.
    #[must_use]
    pub const fn still_duration(mut self, duration: Duration) -> Self {
        self.still_duration = duration;
        self
    }

    /// Make `frames` playable as `source`.
    pub fn register(&mut self, source: impl Into<MediaSource>, frames: ImageSequenceSource) {
        self.catalog.insert(source.into(), Arc::new(frames));
    }

    fn emit(&self, event: PlayerEvent) {
        let Some(events) = &self.events else {
            return;
        };
        if events.try_send(event).is_err() {
            debug!("player event receiver is gone");
        }
    }

    fn resolve(&self, source: &MediaSource) -> Result<Arc<ImageSequenceSource>, String> {
        if let Some(frames) = self.catalog.get(source) {
            return Ok(Arc::clone(frames));
        }
        match source {
            MediaSource::File(path) => {
                let millis = u64::try_from(self.still_duration.as_millis()).unwrap_or(u64::MAX);
                ImageSequenceSource::open_still(path, millis)
                    .map(Arc::new)
                    .map_err(|error| format!("cannot open {}: {error}", path.display()))
            }
            MediaSource::Url(url) => Err(format!("unknown media: {url}")),
        }
    }

    fn fail(&mut self, message: String) {
        warn!("{message}");
        self.item = None;
        self.clock = Clock::default();
        self.error = Some(message.clone());
        self.emit(PlayerEvent::Failed(message));
    }
}

impl MediaPlayer for SequencePlayer {
    fn set_event_sender(&mut self, events: Sender<PlayerEvent>) {
        self.events = Some(events);
    }

    fn load(&mut self, source: &MediaSource) {
        self.unload();
        match self.resolve(source) {
            Ok(frames) if frames.is_empty() => self.fail(format!("no frames in {source}")),
            Ok(frames) => {
                let duration = Duration::from_millis(frames.duration_ms());
                self.item = Some(Item { frames, duration });
                self.emit(PlayerEvent::Ready);
            }
            Err(message) => self.fail(message),
        }
    }

    fn unload(&mut self) {
        self.item = None;
        self.error = None;
        self.clock = Clock::default();
        self.completed = false;
    }

    fn play(&mut self) {
        let Some(item) = &self.item else {
            return;
        };
        if self.clock.position() >= item.duration {
            self.clock.set(Duration::ZERO);
        }
        self.completed = false;
        self.clock.start();
    }

    fn pause(&mut self) {
        self.clock.stop();
    }

    fn seek(&mut self, position: Duration) {
        let Some(item) = &self.item else {
            return;
        };
        self.clock.set(position.min(item.duration));
        self.completed = false;
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume;
    }

    fn volume(&self) -> f32 {
        self.volume
    }

    fn rate(&self) -> f32 {
        if self.item.is_some() && self.clock.is_running() {
            1.0
        } else {
            0.0
        }
    }

    fn error(&self) -> Option<String> {
        self.error.clone()
    }

    fn current_time(&self) -> Duration {
        self.item
            .as_ref()
            .map_or(Duration::ZERO, |item| self.clock.position().min(item.duration))
    }

    fn duration(&self) -> Option<Duration> {
        self.item.as_ref().map(|item| item.duration)
    }

    fn video_track(&self) -> Option<VideoTrack> {
        self.item.as_ref().map(|item| VideoTrack {
            natural_size: item.frames.natural_size(),
            preferred_transform: item.frames.preferred_transform(),
        })
    }

    fn frame_source(&self) -> Option<Arc<dyn FrameSource>> {
        self.item
            .as_ref()
            .map(|item| Arc::clone(&item.frames) as Arc<dyn FrameSource>)
    }

    fn poll(&mut self) {
        let Some(item) = &self.item else {
            return;
        };
        if self.completed || !self.clock.is_running() || self.clock.position() < item.duration {
            return;
        }
        let end = item.duration;
        self.clock.stop();
        self.clock.set(end);
        self.completed = true;
        self.emit(PlayerEvent::Completed);
    }
}
