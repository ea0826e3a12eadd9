//! Aspect-fit and crop math for the loupe.
//!
//! All values are in viewport points unless stated otherwise. The viewport is
//! the view the video is letterboxed into; the loupe renders a window of a
//! viewport-sized canvas on which the frame is drawn so that the point under
//! the pointer lands on the canvas center.

use serde::{Deserialize, Serialize};
use videoview_frame::Dimensions;

/// A point in viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A width/height pair.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    /// Width.
    pub width: f64,
    /// Height.
    pub height: f64,
}

impl Size {
    /// Create a new size.
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Width over height.
    #[must_use]
    pub fn aspect_ratio(&self) -> f64 {
        self.width / self.height
    }

    /// Whether both sides are finite and strictly positive.
    #[must_use]
    pub fn is_drawable(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }

    /// Scale both sides by `factor`.
    #[must_use]
    pub fn scaled(self, factor: f64) -> Self {
        Self::new(self.width * factor, self.height * factor)
    }
}

impl From<Dimensions> for Size {
    fn from(dimensions: Dimensions) -> Self {
        Self::new(f64::from(dimensions.width), f64::from(dimensions.height))
    }
}

/// An axis-aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    /// Top-left corner.
    pub origin: Point,
    /// Extent.
    pub size: Size,
}

impl Rect {
    /// Create a rectangle from its corner and size.
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            origin: Point::new(x, y),
            size: Size::new(width, height),
        }
    }

    /// Center point.
    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(
            self.origin.x + self.size.width / 2.0,
            self.origin.y + self.size.height / 2.0,
        )
    }

    /// Right edge.
    #[must_use]
    pub fn max_x(&self) -> f64 {
        self.origin.x + self.size.width
    }

    /// Bottom edge.
    #[must_use]
    pub fn max_y(&self) -> f64 {
        self.origin.y + self.size.height
    }
}

/// Fit `video` inside `viewport` preserving its aspect ratio ("contain").
///
/// Wide videos fill the viewport width, tall ones fill its height. The result
/// is centered in the viewport, the same way the player layer lays out the
/// live video.
#[must_use]
pub fn aspect_fit(video: Size, viewport: Size) -> Rect {
    let (width, height) = if video.aspect_ratio() >= viewport.aspect_ratio() {
        (viewport.width, viewport.width / video.width * video.height)
    } else {
        (viewport.height / video.height * video.width, viewport.height)
    };

    Rect::new(
        (viewport.width - width) / 2.0,
        (viewport.height - height) / 2.0,
        width,
        height,
    )
}

/// Inputs for one loupe render.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeometryInput {
    /// Intrinsic (upright) video size in pixels.
    pub video: Size,
    /// Viewport size in points.
    pub viewport: Size,
    /// Pointer position in viewport coordinates.
    pub pointer: Point,
    /// Size of the upright decoded frame in pixels.
    pub frame: Size,
    /// Loupe diameter in points.
    pub loupe_size: f64,
    /// Magnification relative to the on-screen video.
    pub zoom: f64,
    /// Output pixels per point.
    pub pixel_ratio: f64,
}

/// Everything needed to rasterize one loupe image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayGeometry {
    /// Where the video sits in the viewport.
    pub display: Rect,
    /// Display width over intrinsic width.
    pub scale: f64,
    /// Offset of the drawn frame relative to the centered display rect.
    ///
    /// `(0, 0)` when the pointer is at the viewport center.
    pub offset: Point,
    /// Where the upright frame is drawn on the viewport-sized canvas.
    pub draw: Rect,
    /// The loupe window in upright frame pixels. May extend past the frame.
    pub crop: Rect,
    /// Output bitmap size in pixels.
    pub render_size: Size,
}

impl DisplayGeometry {
    /// Compute the geometry for one render.
    ///
    /// Returns `None` if any size is empty or not finite.
    #[must_use]
    pub fn compute(input: &GeometryInput) -> Option<Self> {
        let GeometryInput {
            video,
            viewport,
            pointer,
            frame,
            loupe_size,
            zoom,
            pixel_ratio,
        } = *input;

        let valid_scalars = [loupe_size, zoom, pixel_ratio]
            .iter()
            .all(|v| v.is_finite() && *v > 0.0);
        if !(video.is_drawable() && viewport.is_drawable() && frame.is_drawable() && valid_scalars) {
            return None;
        }
        if !(pointer.x.is_finite() && pointer.y.is_finite()) {
            return None;
        }

        let display = aspect_fit(video, viewport);
        let scale = display.size.width / video.width;

        // Fit the decoded frame into the display rect; it may be decoded at a
        // different resolution than the track's natural size.
        let ratio = (display.size.width / frame.width).min(display.size.height / frame.height);
        let drawn = frame.scaled(ratio);

        let center = Point::new(viewport.width / 2.0, viewport.height / 2.0);
        let offset = Point::new(center.x - pointer.x, center.y - pointer.y);
        let draw = Rect {
            origin: Point::new(
                center.x + (display.origin.x - pointer.x) * zoom,
                center.y + (display.origin.y - pointer.y) * zoom,
            ),
            size: drawn.scaled(zoom),
        };

        let half = loupe_size / 2.0;
        let to_frame_x = frame.width / draw.size.width;
        let to_frame_y = frame.height / draw.size.height;
        let crop = Rect::new(
            (center.x - half - draw.origin.x) * to_frame_x,
            (center.y - half - draw.origin.y) * to_frame_y,
            loupe_size * to_frame_x,
            loupe_size * to_frame_y,
        );

        let side = (loupe_size * pixel_ratio).round().max(1.0);
        Some(Self {
            display,
            scale,
            offset,
            draw,
            crop,
            render_size: Size::new(side, side),
        })
    }
}
