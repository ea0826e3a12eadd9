//! Rasterization of the loupe window.

use crate::MagnifierError;
use crate::config::{MAX_RENDER_SIDE, MagnifierConfig};
use crate::geometry::{DisplayGeometry, GeometryInput, Point, Rect, Size};
use crate::loupe::decorate;
use image::RgbaImage;
use image::imageops::{self, FilterType};
use videoview_frame::{OrientedFrame, RawFrame, Rotation, normalize};

/// Where the loupe looks: the video, its viewport and the pointer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoupeTarget {
    /// Intrinsic (upright) video size in pixels.
    pub video: Size,
    /// Viewport size in points.
    pub viewport: Size,
    /// Pointer position in viewport coordinates.
    pub pointer: Point,
}

/// Orient a raw frame and compute the geometry for `target`.
///
/// # Errors
///
/// Returns [`MagnifierError::Config`] for out-of-range settings,
/// [`MagnifierError::Frame`] for a malformed buffer and
/// [`MagnifierError::Geometry`] when the sizes are degenerate.
pub fn prepare(
    raw: &RawFrame,
    rotation: Rotation,
    target: &LoupeTarget,
    config: &MagnifierConfig,
) -> Result<(OrientedFrame, DisplayGeometry), MagnifierError> {
    config.validate()?;
    let oriented = normalize(raw, rotation)?;
    let input = GeometryInput {
        video: target.video,
        viewport: target.viewport,
        pointer: target.pointer,
        frame: oriented.dimensions().into(),
        loupe_size: config.loupe_size,
        zoom: config.zoom,
        pixel_ratio: config.pixel_ratio,
    };
    let geometry = DisplayGeometry::compute(&input).ok_or(MagnifierError::Geometry {
        video: target.video,
        viewport: target.viewport,
    })?;
    Ok((oriented, geometry))
}

/// Rasterize and decorate the loupe image.
#[must_use]
pub fn draw(frame: &OrientedFrame, geometry: &DisplayGeometry, config: &MagnifierConfig) -> RgbaImage {
    let mut image = rasterize(&frame.image, geometry);
    decorate(&mut image, config);
    image
}

/// Render a loupe image for `target` in one go.
///
/// # Errors
///
/// See [`prepare`].
pub fn render_loupe(
    raw: &RawFrame,
    rotation: Rotation,
    target: &LoupeTarget,
    config: &MagnifierConfig,
) -> Result<(RgbaImage, DisplayGeometry), MagnifierError> {
    let (oriented, geometry) = prepare(raw, rotation, target, config)?;
    Ok((draw(&oriented, &geometry, config), geometry))
}

/// Render the crop window of an upright frame into a bitmap of
/// `geometry.render_size`.
///
/// Parts of the window outside the frame stay transparent. The bitmap side
/// is capped at [`MAX_RENDER_SIDE`].
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn rasterize(frame: &RgbaImage, geometry: &DisplayGeometry) -> RgbaImage {
    let out_width = geometry.render_size.width.clamp(1.0, MAX_RENDER_SIDE) as u32;
    let out_height = geometry.render_size.height.clamp(1.0, MAX_RENDER_SIDE) as u32;
    let mut output = RgbaImage::new(out_width, out_height);

    let crop = geometry.crop;
    let (frame_width, frame_height) = frame.dimensions();
    let left = crop.origin.x.max(0.0);
    let top = crop.origin.y.max(0.0);
    let right = crop.max_x().min(f64::from(frame_width));
    let bottom = crop.max_y().min(f64::from(frame_height));
    if right <= left || bottom <= top {
        return output;
    }

    let scale_x = f64::from(out_width) / crop.size.width;
    let scale_y = f64::from(out_height) / crop.size.height;

    // Snap the visible part of the window to whole source pixels.
    let src_x = left.floor() as u32;
    let src_y = top.floor() as u32;
    let src_width = (right.ceil() as u32).saturating_sub(src_x).max(1);
    let src_height = (bottom.ceil() as u32).saturating_sub(src_y).max(1);

    let dst_width = (f64::from(src_width) * scale_x).round().max(1.0);
    let dst_height = (f64::from(src_height) * scale_y).round().max(1.0);
    if dst_width > 2.0 * f64::from(out_width) || dst_height > 2.0 * f64::from(out_height) {
        // Snapping would blow a few source pixels up far past the output.
        sample_nearest(frame, &crop, scale_x, scale_y, &mut output);
        return output;
    }

    let dst_x = ((f64::from(src_x) - crop.origin.x) * scale_x).round() as i64;
    let dst_y = ((f64::from(src_y) - crop.origin.y) * scale_y).round() as i64;
    let window = imageops::crop_imm(frame, src_x, src_y, src_width, src_height).to_image();
    let scaled = imageops::resize(&window, dst_width as u32, dst_height as u32, FilterType::Triangle);
    imageops::overlay(&mut output, &scaled, dst_x, dst_y);
    output
}

/// Fill `output` by mapping each output pixel center back into the frame.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn sample_nearest(frame: &RgbaImage, crop: &Rect, scale_x: f64, scale_y: f64, output: &mut RgbaImage) {
    let (frame_width, frame_height) = frame.dimensions();
    for (x, y, pixel) in output.enumerate_pixels_mut() {
        let source_x = crop.origin.x + (f64::from(x) + 0.5) / scale_x;
        let source_y = crop.origin.y + (f64::from(y) + 0.5) / scale_y;
        if source_x < 0.0 || source_y < 0.0 {
            continue;
        }
        let (source_x, source_y) = (source_x as u32, source_y as u32);
        if source_x < frame_width && source_y < frame_height {
            *pixel = *frame.get_pixel(source_x, source_y);
        }
    }
}
