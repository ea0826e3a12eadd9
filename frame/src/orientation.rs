//! Source orientation classification and frame rotation.

use crate::{Dimensions, FrameError, RawFrame};
use image::RgbaImage;
use image::imageops;

/// A 2D affine transform in the `CGAffineTransform` layout.
///
/// Points map as `x' = a*x + c*y + tx`, `y' = b*x + d*y + ty`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffineTransform {
    /// Row 1, column 1.
    pub a: f64,
    /// Row 1, column 2.
    pub b: f64,
    /// Row 2, column 1.
    pub c: f64,
    /// Row 2, column 2.
    pub d: f64,
    /// Horizontal translation.
    pub tx: f64,
    /// Vertical translation.
    pub ty: f64,
}

impl AffineTransform {
    /// The identity transform.
    pub const IDENTITY: Self = Self::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);

    /// Create a transform from its six components.
    #[must_use]
    pub const fn new(a: f64, b: f64, c: f64, d: f64, tx: f64, ty: f64) -> Self {
        Self { a, b, c, d, tx, ty }
    }

    /// Apply the linear part to a size, returning absolute extents.
    #[must_use]
    pub fn apply_to_size(&self, width: f64, height: f64) -> (f64, f64) {
        let w = self.a.mul_add(width, self.c * height);
        let h = self.b.mul_add(width, self.d * height);
        (w.abs(), h.abs())
    }
}

impl Default for AffineTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Rotation needed to display a decoded buffer upright.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Rotation {
    /// Already upright.
    #[default]
    Deg0,
    /// Rotate a quarter turn clockwise.
    Deg90,
    /// Rotate a quarter turn counter-clockwise.
    DegNeg90,
    /// Rotate a half turn.
    Deg180,
    /// The transform matched none of the canonical rotations.
    ///
    /// Rendered as [`Rotation::Deg0`].
    Unknown,
}

impl Rotation {
    /// Classify a preferred track transform.
    ///
    /// Only the linear part takes part in the match; translation is ignored.
    /// The comparison is exact, any other matrix is [`Rotation::Unknown`].
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn classify(transform: &AffineTransform) -> Self {
        const CANONICAL: [([f64; 4], Rotation); 4] = [
            ([1.0, 0.0, 0.0, 1.0], Rotation::Deg0),
            ([0.0, 1.0, -1.0, 0.0], Rotation::Deg90),
            ([0.0, -1.0, 1.0, 0.0], Rotation::DegNeg90),
            ([-1.0, 0.0, 0.0, -1.0], Rotation::Deg180),
        ];

        let linear = [transform.a, transform.b, transform.c, transform.d];
        CANONICAL
            .iter()
            .find(|(matrix, _)| *matrix == linear)
            .map_or(Self::Unknown, |(_, rotation)| *rotation)
    }

    /// Angle in degrees, or `None` for [`Rotation::Unknown`].
    #[must_use]
    pub const fn degrees(self) -> Option<i32> {
        match self {
            Self::Deg0 => Some(0),
            Self::Deg90 => Some(90),
            Self::DegNeg90 => Some(-90),
            Self::Deg180 => Some(180),
            Self::Unknown => None,
        }
    }

    /// Whether the rotation is a quarter turn.
    #[must_use]
    pub const fn swaps_axes(self) -> bool {
        matches!(self, Self::Deg90 | Self::DegNeg90)
    }
}

/// A frame rotated upright, ready for geometry math.
#[derive(Debug, Clone)]
pub struct OrientedFrame {
    /// Upright RGBA pixels.
    pub image: RgbaImage,
    /// Rotation that was applied.
    pub rotation: Rotation,
    /// Presentation timestamp in milliseconds.
    pub timestamp_ms: u64,
}

impl OrientedFrame {
    /// Upright dimensions.
    #[must_use]
    pub fn dimensions(&self) -> Dimensions {
        let (width, height) = self.image.dimensions();
        Dimensions::new(width, height)
    }
}

/// Rotate a raw frame upright.
///
/// # Errors
///
/// Returns [`FrameError::InvalidBuffer`] if the raw buffer is malformed.
pub fn normalize(raw: &RawFrame, rotation: Rotation) -> Result<OrientedFrame, FrameError> {
    let image = raw.to_rgba()?;
    let image = match rotation {
        Rotation::Deg0 | Rotation::Unknown => image,
        Rotation::Deg90 => imageops::rotate90(&image),
        Rotation::DegNeg90 => imageops::rotate270(&image),
        Rotation::Deg180 => imageops::rotate180(&image),
    };

    Ok(OrientedFrame {
        image,
        rotation,
        timestamp_ms: raw.timestamp_ms,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);

    /// 2x1 frame: red on the left, blue on the right.
    fn two_pixel_frame() -> RawFrame {
        let mut image = RgbaImage::new(2, 1);
        image.put_pixel(0, 0, RED);
        image.put_pixel(1, 0, BLUE);
        RawFrame::from_rgba(image, 40)
    }

    #[test]
    fn classifies_canonical_matrices() {
        let cases = [
            (AffineTransform::IDENTITY, Rotation::Deg0),
            (AffineTransform::new(0.0, 1.0, -1.0, 0.0, 1080.0, 0.0), Rotation::Deg90),
            (AffineTransform::new(0.0, -1.0, 1.0, 0.0, 0.0, 1920.0), Rotation::DegNeg90),
            (AffineTransform::new(-1.0, 0.0, 0.0, -1.0, 1920.0, 1080.0), Rotation::Deg180),
        ];
        for (transform, expected) in cases {
            assert_eq!(Rotation::classify(&transform), expected);
        }
    }

    #[test]
    fn skewed_transform_is_unknown() {
        let skew = AffineTransform::new(1.0, 0.5, 0.0, 1.0, 0.0, 0.0);
        assert_eq!(Rotation::classify(&skew), Rotation::Unknown);
        assert_eq!(Rotation::Unknown.degrees(), None);
    }

    #[test]
    fn classification_is_idempotent() {
        let transform = AffineTransform::new(0.0, 1.0, -1.0, 0.0, 0.0, 0.0);
        let first = Rotation::classify(&transform);
        let second = Rotation::classify(&transform);
        assert_eq!(first, second);
    }

    #[test]
    fn transform_applied_to_size_is_absolute() {
        let portrait = AffineTransform::new(0.0, 1.0, -1.0, 0.0, 0.0, 0.0);
        assert_eq!(portrait.apply_to_size(1920.0, 1080.0), (1080.0, 1920.0));
    }

    #[test]
    fn quarter_turn_clockwise_puts_left_on_top() {
        let oriented = normalize(&two_pixel_frame(), Rotation::Deg90).unwrap();
        assert_eq!(oriented.dimensions(), Dimensions::new(1, 2));
        assert_eq!(*oriented.image.get_pixel(0, 0), RED);
        assert_eq!(*oriented.image.get_pixel(0, 1), BLUE);
    }

    #[test]
    fn quarter_turn_counter_clockwise_puts_right_on_top() {
        let oriented = normalize(&two_pixel_frame(), Rotation::DegNeg90).unwrap();
        assert_eq!(*oriented.image.get_pixel(0, 0), BLUE);
        assert_eq!(*oriented.image.get_pixel(0, 1), RED);
    }

    #[test]
    fn half_turn_mirrors_both_axes() {
        let oriented = normalize(&two_pixel_frame(), Rotation::Deg180).unwrap();
        assert_eq!(*oriented.image.get_pixel(0, 0), BLUE);
        assert_eq!(oriented.timestamp_ms, 40);
    }

    #[test]
    fn unknown_rotation_leaves_frame_untouched() {
        let oriented = normalize(&two_pixel_frame(), Rotation::Unknown).unwrap();
        assert_eq!(*oriented.image.get_pixel(0, 0), RED);
        assert_eq!(oriented.rotation, Rotation::Unknown);
    }
}
