//! Per-item playback session.

use log::debug;
use std::sync::Arc;
use videoview_frame::{Dimensions, FrameSourceAdapter, Rotation};
use videoview_magnifier::Size;
use videoview_player::{MediaSource, Playback};

/// Everything the magnifier needs to know about the loaded item.
///
/// Built once track metadata is available and replaced wholesale when the
/// view is configured with new media.
#[derive(Debug)]
pub struct PlaybackSession {
    source: MediaSource,
    natural_size: Dimensions,
    frames: Arc<FrameSourceAdapter>,
}

impl PlaybackSession {
    /// Build a session for the item `playback` has loaded.
    ///
    /// Returns `None` until the item, its video track and its frames are
    /// available. Orientation comes from the track's preferred transform.
    #[must_use]
    pub fn from_playback(playback: &Playback, cache_capacity: usize) -> Option<Self> {
        let source = playback.source()?.clone();
        let track = playback.video_track()?;
        let frame_source = playback.frame_source()?;
        if track.natural_size.is_empty() {
            debug!("video track of {source} has no size yet");
            return None;
        }

        let frames = Arc::new(FrameSourceAdapter::with_transform(
            frame_source,
            track.preferred_transform,
            cache_capacity,
        ));
        debug!(
            "session for {source}: {}x{}, {:?}",
            track.natural_size.width,
            track.natural_size.height,
            frames.orientation()
        );
        Some(Self {
            source,
            natural_size: track.natural_size,
            frames,
        })
    }

    /// The media this session plays.
    #[must_use]
    pub const fn source(&self) -> &MediaSource {
        &self.source
    }

    /// Decoded buffer size.
    #[must_use]
    pub const fn natural_size(&self) -> Dimensions {
        self.natural_size
    }

    /// Rotation that makes decoded frames upright.
    #[must_use]
    pub fn rotation(&self) -> Rotation {
        self.frames.orientation()
    }

    /// Upright video size in pixels.
    #[must_use]
    pub fn intrinsic_size(&self) -> Size {
        self.natural_size.oriented(self.rotation()).into()
    }

    /// Frame access shared with the magnifier worker.
    #[must_use]
    pub fn frames(&self) -> Arc<FrameSourceAdapter> {
        Arc::clone(&self.frames)
    }

    /// Whether the session still belongs to `source`.
    #[must_use]
    pub fn matches(&self, source: Option<&MediaSource>) -> bool {
        source == Some(&self.source)
    }

    /// Release frame access; in-flight fetches resolve to torn down.
    pub fn release(&self) {
        self.frames.release();
    }
}

impl Drop for PlaybackSession {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_channel::Sender;
    use std::time::Duration;
    use videoview_frame::image::RgbaImage;
    use videoview_frame::{AffineTransform, FrameError, FrameSource, ImageSequenceSource, RawFrame};
    use videoview_player::{MediaPlayer, PlayerEvent, SequencePlayer, VideoTrack};

    /// Frames with the default, identity, preferred transform.
    #[derive(Debug)]
    struct PlainFrames(ImageSequenceSource);

    impl FrameSource for PlainFrames {
        fn frame_at(&self, timestamp_ms: u64) -> Result<RawFrame, FrameError> {
            self.0.frame_at(timestamp_ms)
        }
    }

    /// A backend that reports orientation only through its track metadata.
    #[derive(Debug)]
    struct TrackRotatedPlayer {
        frames: Arc<PlainFrames>,
        transform: AffineTransform,
        loaded: bool,
    }

    impl MediaPlayer for TrackRotatedPlayer {
        fn set_event_sender(&mut self, _events: Sender<PlayerEvent>) {}
        fn load(&mut self, _source: &MediaSource) {
            self.loaded = true;
        }
        fn unload(&mut self) {
            self.loaded = false;
        }
        fn play(&mut self) {}
        fn pause(&mut self) {}
        fn seek(&mut self, _position: Duration) {}
        fn set_volume(&mut self, _volume: f32) {}
        fn volume(&self) -> f32 {
            1.0
        }
        fn rate(&self) -> f32 {
            0.0
        }
        fn error(&self) -> Option<String> {
            None
        }
        fn current_time(&self) -> Duration {
            Duration::ZERO
        }
        fn duration(&self) -> Option<Duration> {
            Some(Duration::from_secs(1))
        }
        fn video_track(&self) -> Option<VideoTrack> {
            self.loaded.then(|| VideoTrack {
                natural_size: self.frames.0.natural_size(),
                preferred_transform: self.transform,
            })
        }
        fn frame_source(&self) -> Option<Arc<dyn FrameSource>> {
            self.loaded
                .then(|| Arc::clone(&self.frames) as Arc<dyn FrameSource>)
        }
    }

    fn playback_with(frames: ImageSequenceSource) -> Playback {
        let mut player = SequencePlayer::new();
        player.register("clip.mp4", frames);
        Playback::new(player)
    }

    #[test]
    fn nothing_loaded_means_no_session() {
        let playback = playback_with(ImageSequenceSource::still(RgbaImage::new(4, 2), 1_000));
        assert!(PlaybackSession::from_playback(&playback, 8).is_none());
    }

    #[test]
    fn portrait_track_swaps_intrinsic_size() {
        let portrait = AffineTransform::new(0.0, 1.0, -1.0, 0.0, 1080.0, 0.0);
        let mut playback = playback_with(
            ImageSequenceSource::still(RgbaImage::new(1920, 1080), 1_000).with_transform(portrait),
        );
        playback.load(MediaSource::from("clip.mp4"));

        let session = PlaybackSession::from_playback(&playback, 8).unwrap();
        assert_eq!(session.rotation(), Rotation::Deg90);
        assert_eq!(session.natural_size(), Dimensions::new(1920, 1080));
        assert_eq!(session.intrinsic_size(), Size::new(1080.0, 1920.0));
        assert!(session.matches(playback.source()));
    }

    #[test]
    fn rotation_follows_track_metadata() {
        let mut playback = Playback::new(TrackRotatedPlayer {
            frames: Arc::new(PlainFrames(ImageSequenceSource::still(RgbaImage::new(1920, 1080), 1_000))),
            transform: AffineTransform::new(0.0, 1.0, -1.0, 0.0, 1080.0, 0.0),
            loaded: false,
        });
        playback.load(MediaSource::from("clip.mp4"));

        let session = PlaybackSession::from_playback(&playback, 8).unwrap();
        assert_eq!(session.rotation(), Rotation::Deg90);
        assert_eq!(session.intrinsic_size(), Size::new(1080.0, 1920.0));
    }

    #[test]
    fn dropping_releases_frames() {
        let mut playback = playback_with(ImageSequenceSource::still(RgbaImage::new(4, 2), 1_000));
        playback.load(MediaSource::from("clip.mp4"));

        let session = PlaybackSession::from_playback(&playback, 8).unwrap();
        let frames = session.frames();
        drop(session);
        assert!(frames.is_released());
    }
}
