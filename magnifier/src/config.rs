//! Magnifier configuration.

use crate::geometry::Point;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Decoration drawn at the loupe center.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MagnifierStyle {
    /// A small ring marking the exact point under the pointer.
    #[default]
    PointMarker,
    /// Horizontal and vertical lines through the center.
    Crosshair,
}

impl FromStr for MagnifierStyle {
    type Err = UnknownStyle;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pointmarker" | "point_marker" | "point-marker" => Ok(Self::PointMarker),
            "crosshair" => Ok(Self::Crosshair),
            _ => Err(UnknownStyle(s.to_owned())),
        }
    }
}

impl fmt::Display for MagnifierStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PointMarker => write!(f, "pointMarker"),
            Self::Crosshair => write!(f, "crosshair"),
        }
    }
}

/// Largest accepted magnification.
pub const MAX_ZOOM: f64 = 64.0;

/// Largest accepted loupe bitmap side, in pixels.
pub const MAX_RENDER_SIDE: f64 = 4096.0;

/// A magnifier setting outside its accepted range.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("invalid magnifier {field}: {value}")]
pub struct InvalidConfig {
    /// Name of the offending setting.
    pub field: &'static str,
    /// The rejected value.
    pub value: f64,
}

/// A magnifier style name that matched nothing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown magnifier style: {0}")]
pub struct UnknownStyle(pub String);

/// Look and behavior of the magnifier loupe.
///
/// Sizes are in points; the rendered bitmap is `loupe_size * pixel_ratio`
/// pixels square.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MagnifierConfig {
    /// Center decoration.
    pub style: MagnifierStyle,
    /// Loupe diameter.
    pub loupe_size: f64,
    /// Magnification relative to the on-screen video.
    pub zoom: f64,
    /// Output pixels per point.
    pub pixel_ratio: f64,
    /// Fixed displacement of the loupe from the pointer, subtracted from its
    /// centered position.
    pub offset: Point,
    /// Width of the outer ring.
    pub border_width: f64,
    /// Outer ring color (RGBA).
    pub border_color: [u8; 4],
    /// Diameter of the point marker ring.
    pub marker_diameter: f64,
    /// Stroke width of the point marker ring.
    pub marker_width: f64,
    /// Marker and crosshair color (RGBA).
    pub marker_color: [u8; 4],
    /// Frames kept per session by the frame cache, each a full decoded
    /// buffer. Zero disables it.
    pub cache_capacity: usize,
}

impl Default for MagnifierConfig {
    fn default() -> Self {
        Self {
            style: MagnifierStyle::PointMarker,
            loupe_size: 100.0,
            zoom: 1.0,
            pixel_ratio: 1.0,
            offset: Point::new(0.0, 100.0),
            border_width: 1.0,
            border_color: [255, 255, 255, 255],
            marker_diameter: 24.0,
            marker_width: 3.0,
            marker_color: [183, 28, 28, 255],
            cache_capacity: 4,
        }
    }
}

impl MagnifierConfig {
    /// Create the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the center decoration.
    #[must_use]
    pub const fn style(mut self, style: MagnifierStyle) -> Self {
        self.style = style;
        self
    }

    /// Set the loupe diameter.
    #[must_use]
    pub const fn loupe_size(mut self, size: f64) -> Self {
        self.loupe_size = size;
        self
    }

    /// Set the magnification.
    #[must_use]
    pub const fn zoom(mut self, zoom: f64) -> Self {
        self.zoom = zoom;
        self
    }

    /// Set the output pixel density.
    #[must_use]
    pub const fn pixel_ratio(mut self, ratio: f64) -> Self {
        self.pixel_ratio = ratio;
        self
    }

    /// Set the loupe displacement from the pointer.
    #[must_use]
    pub const fn offset(mut self, x: f64, y: f64) -> Self {
        self.offset = Point::new(x, y);
        self
    }

    /// Set the frame cache capacity.
    #[must_use]
    pub const fn cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    /// Check that every size and factor is usable for rendering.
    ///
    /// Sizes must be finite and positive, `zoom` at most [`MAX_ZOOM`] and the
    /// loupe bitmap (`loupe_size * pixel_ratio`) at most [`MAX_RENDER_SIDE`]
    /// pixels square.
    ///
    /// # Errors
    ///
    /// Returns the first setting found out of range.
    pub fn validate(&self) -> Result<(), InvalidConfig> {
        let positive = [
            ("loupeSize", self.loupe_size),
            ("zoom", self.zoom),
            ("pixelRatio", self.pixel_ratio),
        ];
        for (field, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(InvalidConfig { field, value });
            }
        }
        let strokes = [
            ("borderWidth", self.border_width),
            ("markerDiameter", self.marker_diameter),
            ("markerWidth", self.marker_width),
        ];
        for (field, value) in strokes {
            if !value.is_finite() || value < 0.0 {
                return Err(InvalidConfig { field, value });
            }
        }
        if !self.offset.x.is_finite() || !self.offset.y.is_finite() {
            let value = if self.offset.x.is_finite() { self.offset.y } else { self.offset.x };
            return Err(InvalidConfig { field: "offset", value });
        }
        if self.zoom > MAX_ZOOM {
            return Err(InvalidConfig { field: "zoom", value: self.zoom });
        }
        let side = self.loupe_size * self.pixel_ratio;
        if side > MAX_RENDER_SIDE {
            return Err(InvalidConfig { field: "loupeSize * pixelRatio", value: side });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn styles_parse_from_host_names() {
        assert_eq!("pointMarker".parse(), Ok(MagnifierStyle::PointMarker));
        assert_eq!("CROSSHAIR".parse(), Ok(MagnifierStyle::Crosshair));
        assert_eq!(
            "loupe".parse::<MagnifierStyle>(),
            Err(UnknownStyle("loupe".into()))
        );
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: MagnifierConfig =
            serde_json::from_str(r#"{"style":"crosshair","zoom":2.5,"offset":{"x":0,"y":60}}"#).unwrap();

        assert_eq!(config.style, MagnifierStyle::Crosshair);
        assert!((config.zoom - 2.5).abs() < f64::EPSILON);
        assert_eq!(config.offset, Point::new(0.0, 60.0));
        assert!((config.loupe_size - 100.0).abs() < f64::EPSILON);
        assert_eq!(config.cache_capacity, 4);
    }

    #[test]
    fn defaults_are_valid() {
        assert_eq!(MagnifierConfig::new().validate(), Ok(()));
        assert_eq!(MagnifierConfig::new().zoom(MAX_ZOOM).validate(), Ok(()));
    }

    #[test]
    fn extreme_values_are_rejected() {
        let zoom = MagnifierConfig::new().zoom(1.0e5).validate().unwrap_err();
        assert_eq!(zoom.field, "zoom");

        let side = MagnifierConfig::new()
            .loupe_size(1.0e6)
            .pixel_ratio(3.0)
            .validate()
            .unwrap_err();
        assert_eq!(side.field, "loupeSize * pixelRatio");

        for bad in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(MagnifierConfig::new().pixel_ratio(bad).validate().is_err(), "{bad}");
        }
    }

    #[test]
    fn json_is_checked_by_validate() {
        let config: MagnifierConfig = serde_json::from_str(r#"{"zoom":100000}"#).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn display_round_trips_through_parse() {
        for style in [MagnifierStyle::PointMarker, MagnifierStyle::Crosshair] {
            assert_eq!(style.to_string().parse(), Ok(style));
        }
    }
}
