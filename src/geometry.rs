#[cfg(test)]
#[path = "geometry_test.rs"]
mod geometry_test;

use serde::{Deserialize, Serialize};

/// A point in root-relative coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned bounding box in root-relative coordinates.
///
/// [`BBox::new`] and deserialization clamp `width` and `height` to zero or
/// more. Struct literals are not checked.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "BBoxFields")]
pub struct BBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BBox {
    /// The box reported when there is nothing to measure.
    pub const ZERO: Self = Self { x: 0.0, y: 0.0, width: 0.0, height: 0.0 };

    /// Build a box, clamping negative or NaN extents to zero.
    #[must_use]
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width: width.max(0.0), height: height.max(0.0) }
    }

    #[must_use]
    pub fn top_right(&self) -> Point {
        Point::new(self.x + self.width, self.y)
    }

    /// Whether the box is large enough in both dimensions to carry a marker.
    #[must_use]
    pub fn is_meaningful(&self, min_extent: f64) -> bool {
        self.width >= min_extent && self.height >= min_extent
    }

    /// The same box shifted by `-origin`.
    #[must_use]
    pub fn relative_to(&self, origin: Point) -> Self {
        Self { x: self.x - origin.x, y: self.y - origin.y, ..*self }
    }
}

#[derive(Deserialize)]
struct BBoxFields {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
}

impl From<BBoxFields> for BBox {
    fn from(raw: BBoxFields) -> Self {
        Self::new(raw.x, raw.y, raw.width, raw.height)
    }
}

/// 2D translation applied to a marker, in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Translation {
    pub x: f64,
    pub y: f64,
}

impl Translation {
    /// CSS `transform` value for this translation.
    #[must_use]
    pub fn css_transform(&self) -> String {
        format!("translate({}px, {}px)", self.x, self.y)
    }
}
