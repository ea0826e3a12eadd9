mod common;

use common::{BOTTOM, CLIP, LEFT, PORTRAIT, RIGHT, TOP, view, wait_until};
use std::sync::{Arc, Mutex};
use videoview_magnifier::{ImmediateDispatcher, MagnifierStyle, QueueDispatcher, Rect, Size};
use videoview_player::{PlayerError, PlayerState};
use videoview_view::ViewError;

fn loupe_center(view: &videoview_view::VideoView) -> videoview_frame::image::Rgba<u8> {
    let image = view.loupe_handle().lock().unwrap().image().unwrap();
    *image.get_pixel(image.width() / 2, image.height() / 2)
}

#[test]
fn back_to_back_pans_show_only_the_latest() {
    for reverse in [false, true] {
        let queue = QueueDispatcher::new();
        let mut view = view(Arc::new(queue.clone()));
        view.configure(CLIP, true, MagnifierStyle::PointMarker).unwrap();

        view.on_pan_update(100.0, 112.5);
        wait_until("first render", || queue.pending() == 1);
        view.on_pan_update(300.0, 112.5);
        wait_until("second render", || queue.pending() == 2);

        let mut tasks = queue.take_pending();
        if reverse {
            tasks.reverse();
        }
        for task in tasks {
            task();
        }

        let loupe = view.loupe();
        assert!(loupe.visible, "reverse = {reverse}");
        assert_eq!(loupe.frame, Rect::new(250.0, -37.5, 100.0, 100.0));
        assert_eq!(loupe_center(&view), RIGHT);

        let stats = view.magnifier_stats();
        assert_eq!(stats.issued, 2);
        assert_eq!(stats.committed, 1);
        assert_eq!(stats.cancelled, 1);
    }
}

#[test]
fn pan_end_hides_the_loupe() {
    let mut view = view(Arc::new(ImmediateDispatcher));
    view.configure(CLIP, true, MagnifierStyle::PointMarker).unwrap();

    view.on_pan((100.0, 112.5), true);
    assert!(view.is_panning());
    wait_until("loupe", || view.loupe().visible);
    assert_eq!(loupe_center(&view), LEFT);

    view.on_pan((100.0, 112.5), false);
    assert!(!view.is_panning());
    assert!(!view.loupe().visible);
}

#[test]
fn pan_end_discards_render_in_flight() {
    let queue = QueueDispatcher::new();
    let mut view = view(Arc::new(queue.clone()));
    view.configure(CLIP, true, MagnifierStyle::PointMarker).unwrap();

    view.on_pan_update(100.0, 112.5);
    wait_until("render", || queue.pending() == 1);
    view.on_pan_end();
    queue.run_pending();

    assert!(!view.loupe().visible);
    assert!(!view.loupe().has_image);
    let stats = view.magnifier_stats();
    assert_eq!(stats.committed, 0);
    assert_eq!(stats.cancelled, 1);
}

#[test]
fn pans_without_media_or_viewport_are_ignored() {
    let mut view = view(Arc::new(ImmediateDispatcher));
    view.on_pan_update(10.0, 10.0);
    assert_eq!(view.magnifier_stats().issued, 0);

    view.configure(CLIP, true, MagnifierStyle::PointMarker).unwrap();
    view.set_viewport(0.0, 0.0);
    view.on_pan_update(10.0, 10.0);
    assert_eq!(view.magnifier_stats().issued, 0);
    assert!(!view.loupe().visible);
}

#[test]
fn portrait_video_is_magnified_upright() {
    let mut view = view(Arc::new(ImmediateDispatcher));
    view.set_viewport(400.0, 400.0);
    view.configure(PORTRAIT, true, MagnifierStyle::PointMarker).unwrap();

    let session = view.session().unwrap();
    assert_eq!(session.intrinsic_size(), Size::new(1080.0, 1920.0));
    assert_eq!((view.video_width(), view.video_height()), (1920, 1080));

    // The video is shown 225 points wide, centered between x = 87.5 and 312.5.
    view.on_pan_update(120.0, 200.0);
    wait_until("left render", || view.magnifier_stats().committed == 1);
    assert!(view.loupe().visible);
    assert_eq!(loupe_center(&view), BOTTOM);

    view.on_pan_update(280.0, 200.0);
    wait_until("right render", || view.magnifier_stats().committed == 2);
    assert_eq!(loupe_center(&view), TOP);
}

#[test]
fn pan_at_end_of_media_shows_last_frame() {
    let mut view = view(Arc::new(ImmediateDispatcher));
    view.configure(CLIP, true, MagnifierStyle::PointMarker).unwrap();
    view.pump_events();

    view.seek_to(view.duration());
    assert_eq!(view.current_position(), 10_000);

    view.on_pan_update(100.0, 112.5);
    wait_until("render", || view.magnifier_stats().in_flight() == 0);
    let stats = view.magnifier_stats();
    assert_eq!(stats.committed, 1);
    assert_eq!(stats.failed, 0);
    assert!(view.loupe().visible);
    assert_eq!(loupe_center(&view), LEFT);
}

#[test]
fn invalid_source_is_reported() {
    let mut view = view(Arc::new(ImmediateDispatcher));
    let failures = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&failures);
    view.set_on_failed(move |message| sink.lock().unwrap().push(message.to_owned()));

    let result = view.configure("example.com/clip.mp4", true, MagnifierStyle::PointMarker);
    assert!(matches!(
        result,
        Err(ViewError::Player(PlayerError::InvalidSource(_)))
    ));
    view.pump_events();
    assert_eq!(failures.lock().unwrap().len(), 1);
}

#[test]
fn unknown_media_fails_and_disables_the_loupe() {
    let mut view = view(Arc::new(ImmediateDispatcher));
    let failures = Arc::new(Mutex::new(0));
    let sink = Arc::clone(&failures);
    view.set_on_failed(move |_| *sink.lock().unwrap() += 1);

    view.configure("memory://missing", true, MagnifierStyle::PointMarker).unwrap();
    view.pump_events();
    assert_eq!(*failures.lock().unwrap(), 1);

    view.on_pan_update(50.0, 50.0);
    assert_eq!(view.magnifier_stats().issued, 0);
    assert!(!view.is_playing());
}

#[test]
fn transport_controls() {
    let mut view = view(Arc::new(ImmediateDispatcher));
    let prepared = Arc::new(Mutex::new(false));
    let sink = Arc::clone(&prepared);
    view.set_on_prepared(move || *sink.lock().unwrap() = true);

    view.configure(CLIP, true, MagnifierStyle::PointMarker).unwrap();
    view.pump_events();
    assert!(*prepared.lock().unwrap());
    assert_eq!(view.duration(), 10_000);

    view.play();
    assert!(view.is_playing());
    view.seek_to(3_000);
    assert!(view.current_position() >= 3_000);

    view.pause(true);
    assert_eq!(view.current_position(), 0);
    assert_eq!(view.player_state(), PlayerState::Paused);

    view.play();
    view.stop();
    assert!(!view.is_playing());
    assert_eq!(view.current_position(), 0);
}

#[test]
fn reconfigure_replaces_the_session() {
    let mut view = view(Arc::new(ImmediateDispatcher));
    view.configure(CLIP, true, MagnifierStyle::PointMarker).unwrap();
    let old_frames = view.session().unwrap().frames();

    view.configure(PORTRAIT, true, MagnifierStyle::PointMarker).unwrap();
    assert!(old_frames.is_released());
    assert!(!view.session().unwrap().frames().is_released());
}

#[test]
fn destroy_is_final() {
    let mut view = view(Arc::new(ImmediateDispatcher));
    view.configure(CLIP, true, MagnifierStyle::PointMarker).unwrap();
    let frames = view.session().unwrap().frames();
    view.play();

    view.destroy();
    assert!(view.is_destroyed());
    assert!(frames.is_released());
    assert!(!view.is_playing());
    assert!(!view.loupe().visible);

    view.on_pan_update(100.0, 100.0);
    assert_eq!(view.magnifier_stats().issued, 0);
    assert!(matches!(
        view.configure(CLIP, true, MagnifierStyle::PointMarker),
        Err(ViewError::Destroyed)
    ));
    view.destroy();
}

#[tokio::test]
async fn async_host_loop_commits() {
    let queue = QueueDispatcher::new();
    let mut view = view(Arc::new(queue.clone()));
    view.configure(CLIP, true, MagnifierStyle::PointMarker).unwrap();

    view.on_pan_update(300.0, 112.5);
    assert!(queue.run_next().await);

    assert!(view.loupe().visible);
    assert_eq!(loupe_center(&view), RIGHT);
}
