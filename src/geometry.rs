//! Image-space geometry: rotation normalization and source→view scaling.
//! All rotation math lives here; detection and overlay scaling both go
//! through `normalized_dimensions` so the two can never disagree.

use serde::{Deserialize, Serialize};

/// Frame rotation relative to the display, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rotation {
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    /// Parse from a degree value. Anything outside {0, 90, 180, 270} is None.
    pub fn from_degrees(degrees: u32) -> Option<Self> {
        match degrees {
            0 => Some(Rotation::Deg0),
            90 => Some(Rotation::Deg90),
            180 => Some(Rotation::Deg180),
            270 => Some(Rotation::Deg270),
            _ => None,
        }
    }

    /// Whether this rotation swaps width and height.
    #[inline]
    pub fn swaps_axes(self) -> bool {
        matches!(self, Rotation::Deg90 | Rotation::Deg270)
    }
}

impl std::fmt::Display for Rotation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let deg = match self {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 90,
            Rotation::Deg180 => 180,
            Rotation::Deg270 => 270,
        };
        write!(f, "{deg}°")
    }
}

/// Rotation-corrected image dimensions: 90°/270° swap width and height.
pub fn normalized_dimensions(width: u32, height: u32, rotation: Rotation) -> (u32, u32) {
    if rotation.swaps_axes() {
        (height, width)
    } else {
        (width, height)
    }
}

/// Axis-aligned rectangle in floating-point coordinates.
/// Detector output uses image space; the overlay maps it to view space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RectF {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl RectF {
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    /// Map from source space to view space with independent axis scales.
    pub fn scaled(&self, scale_x: f32, scale_y: f32) -> RectF {
        RectF {
            left: self.left * scale_x,
            top: self.top * scale_y,
            right: self.right * scale_x,
            bottom: self.bottom * scale_y,
        }
    }
}

/// Per-axis scale factors mapping source image space to view space.
pub fn scale_factors(
    image_width: u32,
    image_height: u32,
    view_width: u32,
    view_height: u32,
) -> (f32, f32) {
    if image_width == 0 || image_height == 0 {
        return (1.0, 1.0);
    }
    (
        view_width as f32 / image_width as f32,
        view_height as f32 / image_height as f32,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotation_from_degrees() {
        assert_eq!(Rotation::from_degrees(0), Some(Rotation::Deg0));
        assert_eq!(Rotation::from_degrees(90), Some(Rotation::Deg90));
        assert_eq!(Rotation::from_degrees(270), Some(Rotation::Deg270));
        assert_eq!(Rotation::from_degrees(45), None);
    }

    #[test]
    fn normalized_dimensions_swaps_on_quarter_turns() {
        assert_eq!(normalized_dimensions(1080, 1920, Rotation::Deg0), (1080, 1920));
        assert_eq!(normalized_dimensions(1080, 1920, Rotation::Deg90), (1920, 1080));
        assert_eq!(normalized_dimensions(1080, 1920, Rotation::Deg180), (1080, 1920));
        assert_eq!(normalized_dimensions(1080, 1920, Rotation::Deg270), (1920, 1080));
    }

    #[test]
    fn rect_scaling() {
        let rect = RectF::new(100.0, 100.0, 200.0, 150.0);
        let scaled = rect.scaled(0.5, 2.0);
        assert_eq!(scaled, RectF::new(50.0, 200.0, 100.0, 300.0));
        assert_eq!(scaled.width(), 50.0);
        assert_eq!(scaled.height(), 100.0);
    }

    #[test]
    fn scale_factors_basic() {
        let (sx, sy) = scale_factors(1920, 1080, 960, 540);
        assert_eq!((sx, sy), (0.5, 0.5));
        // Degenerate source dimensions fall back to identity.
        assert_eq!(scale_factors(0, 1080, 960, 540), (1.0, 1.0));
    }
}
