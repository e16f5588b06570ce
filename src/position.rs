#[cfg(test)]
#[path = "position_test.rs"]
mod position_test;

use serde::Serialize;

use crate::config::MarkerGeometry;
use crate::connector::{RootId, Shape, ShapeConnector};
use crate::geometry::{BBox, Translation};

/// Where a marker goes, derived from its shape's first bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Placement {
    pub bbox: BBox,
    /// `None` when the box is too small to carry a marker.
    pub translation: Option<Translation>,
}

/// Resolve a marker placement. Without a shape or root the box is [`BBox::ZERO`].
///
/// Pure: the same shape state and root always give the same placement.
#[must_use]
pub fn resolve(
    connector: &dyn ShapeConnector,
    shape: Option<&dyn Shape>,
    root: Option<RootId>,
    geometry: &MarkerGeometry,
) -> Placement {
    let bbox = match (shape, root) {
        (Some(shape), Some(root)) => connector
            .calculate_bbox(shape, root)
            .into_iter()
            .next()
            .unwrap_or(BBox::ZERO),
        _ => BBox::ZERO,
    };
    let translation = bbox
        .is_meaningful(geometry.min_extent)
        .then(|| marker_translation(bbox, geometry));
    Placement { bbox, translation }
}

/// Translation that makes the marker's bottom-left corner overlap the box's
/// top-right corner by `icon_overlap`.
#[must_use]
pub fn marker_translation(bbox: BBox, geometry: &MarkerGeometry) -> Translation {
    let anchor = bbox.top_right();
    Translation {
        x: anchor.x - geometry.padding_compensation - geometry.icon_overlap,
        y: anchor.y - geometry.icon_size + geometry.padding_compensation + geometry.icon_overlap,
    }
}
