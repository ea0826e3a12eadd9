//! The loupe overlay: circular clip, decoration and placement.

use crate::config::{MagnifierConfig, MagnifierStyle};
use crate::geometry::{Point, Rect, Size};
use image::{Rgba, RgbaImage};
use std::sync::Arc;

/// Crosshair line width in points.
const CROSSHAIR_WIDTH: f64 = 1.0;

/// Clip `image` to a circle and draw the border and center decoration.
///
/// The image is assumed to be the full loupe, `config.loupe_size` points
/// across.
pub fn decorate(image: &mut RgbaImage, config: &MagnifierConfig) {
    let side = f64::from(image.width().min(image.height()));
    let points = side / config.loupe_size.max(f64::EPSILON);
    let radius = side / 2.0;
    let border = config.border_width * points;
    let marker_outer = config.marker_diameter / 2.0 * points;
    let marker_inner = marker_outer - config.marker_width * points;
    let line = CROSSHAIR_WIDTH * points / 2.0;

    for (x, y, pixel) in image.enumerate_pixels_mut() {
        let dx = f64::from(x) + 0.5 - radius;
        let dy = f64::from(y) + 0.5 - radius;
        let distance = dx.hypot(dy);

        if distance > radius {
            *pixel = Rgba([0, 0, 0, 0]);
        } else if distance > radius - border {
            *pixel = Rgba(config.border_color);
        } else {
            let on_marker = match config.style {
                MagnifierStyle::PointMarker => distance <= marker_outer && distance > marker_inner,
                MagnifierStyle::Crosshair => dx.abs() <= line || dy.abs() <= line,
            };
            if on_marker {
                *pixel = Rgba(config.marker_color);
            }
        }
    }
}

/// Plain-data view of the loupe, for hosts that mirror it into native views.
#[derive(Debug, Clone, PartialEq)]
pub struct LoupeState {
    /// Whether the loupe is shown.
    pub visible: bool,
    /// Placement in viewport coordinates.
    pub frame: Rect,
    /// Generation of the job whose image is committed; 0 before any commit.
    pub generation: u64,
    /// Whether an image has been committed.
    pub has_image: bool,
    /// Center decoration.
    pub style: MagnifierStyle,
}

/// The loupe overlay.
///
/// Only the UI thread mutates it: the pipeline hands committed images over
/// through the UI dispatcher.
#[derive(Debug, Clone)]
pub struct Loupe {
    size: f64,
    offset: Point,
    style: MagnifierStyle,
    image: Option<Arc<RgbaImage>>,
    frame: Rect,
    visible: bool,
    generation: u64,
}

impl Loupe {
    /// Create a hidden loupe.
    #[must_use]
    pub const fn new(config: &MagnifierConfig) -> Self {
        Self {
            size: config.loupe_size,
            offset: config.offset,
            style: config.style,
            image: None,
            frame: Rect::new(0.0, 0.0, config.loupe_size, config.loupe_size),
            visible: false,
            generation: 0,
        }
    }

    /// Placement for a pointer: centered on it, displaced by the fixed offset.
    #[must_use]
    pub fn place(&self, pointer: Point) -> Rect {
        Rect {
            origin: Point::new(
                pointer.x - self.size / 2.0 - self.offset.x,
                pointer.y - self.size / 2.0 - self.offset.y,
            ),
            size: Size::new(self.size, self.size),
        }
    }

    /// Show `image` for the job `generation` at the pointer.
    pub fn commit(&mut self, image: RgbaImage, pointer: Point, generation: u64) {
        self.frame = self.place(pointer);
        self.image = Some(Arc::new(image));
        self.generation = generation;
        self.visible = true;
    }

    /// Hide the loupe, keeping the last image.
    pub const fn hide(&mut self) {
        self.visible = false;
    }

    /// Hide the loupe and drop its image.
    pub fn clear(&mut self) {
        self.visible = false;
        self.image = None;
    }

    /// Change the center decoration.
    pub const fn set_style(&mut self, style: MagnifierStyle) {
        self.style = style;
    }

    /// Current decoration.
    #[must_use]
    pub const fn style(&self) -> MagnifierStyle {
        self.style
    }

    /// Whether the loupe is shown.
    #[must_use]
    pub const fn is_visible(&self) -> bool {
        self.visible
    }

    /// Placement in viewport coordinates.
    #[must_use]
    pub const fn frame(&self) -> Rect {
        self.frame
    }

    /// The committed image.
    #[must_use]
    pub fn image(&self) -> Option<Arc<RgbaImage>> {
        self.image.clone()
    }

    /// Generation of the committed image.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Snapshot of the loupe state.
    #[must_use]
    pub const fn snapshot(&self) -> LoupeState {
        LoupeState {
            visible: self.visible,
            frame: self.frame,
            generation: self.generation,
            has_image: self.image.is_some(),
            style: self.style,
        }
    }
}
