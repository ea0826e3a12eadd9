#![allow(dead_code)]

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use videoview_frame::image::{Rgba, RgbaImage};
use videoview_frame::{AffineTransform, ImageSequenceSource};
use videoview_magnifier::{MagnifierConfig, UiDispatcher};
use videoview_player::{MediaSource, SequencePlayer};
use videoview_view::VideoView;

pub const CLIP: &str = "memory://clip";
pub const PORTRAIT: &str = "memory://portrait";

pub const LEFT: Rgba<u8> = Rgba([200, 40, 40, 255]);
pub const RIGHT: Rgba<u8> = Rgba([40, 40, 200, 255]);
pub const TOP: Rgba<u8> = Rgba([40, 160, 40, 255]);
pub const BOTTOM: Rgba<u8> = Rgba([200, 200, 40, 255]);

/// 1920x1080, left half one color and right half another, ten seconds long.
pub fn landscape() -> ImageSequenceSource {
    let frame = RgbaImage::from_fn(1920, 1080, |x, _| if x < 960 { LEFT } else { RIGHT });
    ImageSequenceSource::still(frame, 10_000)
}

/// A landscape buffer tagged with a quarter-turn transform.
///
/// The buffer's top half is `TOP` and its bottom half `BOTTOM`, so upright
/// the left half shows `BOTTOM` and the right half `TOP`.
pub fn portrait() -> ImageSequenceSource {
    let rotate = AffineTransform::new(0.0, 1.0, -1.0, 0.0, 1080.0, 0.0);
    let frame = RgbaImage::from_fn(1920, 1080, |_, y| if y < 540 { TOP } else { BOTTOM });
    ImageSequenceSource::still(frame, 10_000).with_transform(rotate)
}

pub fn player() -> SequencePlayer {
    let mut player = SequencePlayer::new();
    player.register(MediaSource::Url(CLIP.into()), landscape());
    player.register(MediaSource::Url(PORTRAIT.into()), portrait());
    player
}

pub fn view(dispatcher: Arc<dyn UiDispatcher>) -> VideoView {
    let mut view = VideoView::new(player(), dispatcher, MagnifierConfig::new()).unwrap();
    view.set_viewport(400.0, 225.0);
    view
}

/// Poll `done` until it holds, failing after a few seconds.
pub fn wait_until(what: &str, mut done: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !done() {
        assert!(Instant::now() < deadline, "timed out waiting for {what}");
        thread::sleep(Duration::from_millis(2));
    }
}
