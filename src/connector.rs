//! Shape connector seam.
//!
//! A connector turns an overlay node plus a coordinate-space root into a live
//! [`Shape`]: a handle that can report the node's bounding boxes relative to
//! that root and that calls back whenever the node's own geometry changes.
//! Layout changes outside the node (root resizes, reflow of the page) are not
//! reported through shapes; see [`crate::resize`] for those.

use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::geometry::BBox;

/// Identity of a visual node in the document tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u64);

/// Identity of a coordinate-space root element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RootId(pub u64);

/// The visual element a comment is anchored to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlayNode {
    pub id: NodeId,
    pub hidden: bool,
}

/// Callback fired by a shape when its node's geometry changes.
pub type UpdateCallback = Rc<dyn Fn()>;

/// A live geometric handle bound to one node.
pub trait Shape {
    /// The node this shape tracks.
    fn node(&self) -> NodeId;

    /// Register a callback for geometry changes of the tracked node.
    fn on_update(&mut self, callback: UpdateCallback);

    /// Drop every registered callback and stop tracking. Idempotent.
    fn destroy(&mut self);
}

pub trait ShapeConnector {
    /// Create a shape tracking `node` in the coordinate space of `root`.
    fn create_shape(&self, node: NodeId, root: RootId) -> Box<dyn Shape>;

    /// Bounding boxes of `shape`, relative to `root`. Empty when the node is gone.
    fn calculate_bbox(&self, shape: &dyn Shape, root: RootId) -> Vec<BBox>;
}
