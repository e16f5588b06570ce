//! In-memory shape connector backed by a retained layout table.
//!
//! `StaticLayout` stores node boxes in document coordinates and root origins,
//! and answers bounding-box queries relative to a root. Changing a node's box
//! (or removing the node) fires the update callbacks of every live shape that
//! tracks it. Moving a root does not; the host reports root movement through
//! the resize pipeline instead.

#[cfg(test)]
#[path = "layout_test.rs"]
mod layout_test;

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use tracing::trace;

use crate::connector::{NodeId, RootId, Shape, ShapeConnector, UpdateCallback};
use crate::geometry::{BBox, Point};

#[derive(Default)]
struct LayoutTable {
    nodes: HashMap<NodeId, BBox>,
    roots: HashMap<RootId, Point>,
    /// Live shapes keyed by shape serial.
    shapes: HashMap<u64, LiveShape>,
    next_serial: u64,
}

struct LiveShape {
    node: NodeId,
    callbacks: Vec<UpdateCallback>,
}

impl LayoutTable {
    fn callbacks_for(&self, node: NodeId) -> Vec<UpdateCallback> {
        self.shapes
            .values()
            .filter(|s| s.node == node)
            .flat_map(|s| s.callbacks.iter().cloned())
            .collect()
    }
}

/// Retained layout that doubles as a [`ShapeConnector`].
#[derive(Clone, Default)]
pub struct StaticLayout {
    table: Rc<RefCell<LayoutTable>>,
}

impl StaticLayout {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a node's box in document coordinates and notify its shapes.
    pub fn set_node_box(&self, node: NodeId, bbox: BBox) {
        let callbacks = {
            let mut table = self.table.borrow_mut();
            table.nodes.insert(node, bbox);
            table.callbacks_for(node)
        };
        trace!(?node, listeners = callbacks.len(), "node box changed");
        for callback in callbacks {
            callback();
        }
    }

    /// Remove a node and notify its shapes.
    pub fn remove_node(&self, node: NodeId) {
        let callbacks = {
            let mut table = self.table.borrow_mut();
            if table.nodes.remove(&node).is_none() {
                return;
            }
            table.callbacks_for(node)
        };
        for callback in callbacks {
            callback();
        }
    }

    /// Place a root's origin in document coordinates. Shapes are not notified.
    pub fn set_root_origin(&self, root: RootId, origin: Point) {
        self.table.borrow_mut().roots.insert(root, origin);
    }

    /// Number of shapes created and not yet destroyed.
    #[must_use]
    pub fn live_shapes(&self) -> usize {
        self.table.borrow().shapes.len()
    }

    /// Number of update callbacks registered on live shapes.
    #[must_use]
    pub fn active_subscriptions(&self) -> usize {
        self.table.borrow().shapes.values().map(|s| s.callbacks.len()).sum()
    }
}

impl ShapeConnector for StaticLayout {
    fn create_shape(&self, node: NodeId, root: RootId) -> Box<dyn Shape> {
        let mut table = self.table.borrow_mut();
        table.next_serial += 1;
        let serial = table.next_serial;
        table.shapes.insert(serial, LiveShape { node, callbacks: Vec::new() });
        trace!(?node, ?root, serial, "shape created");
        Box::new(StaticShape { serial, node, table: Rc::downgrade(&self.table) })
    }

    fn calculate_bbox(&self, shape: &dyn Shape, root: RootId) -> Vec<BBox> {
        let table = self.table.borrow();
        let Some(bbox) = table.nodes.get(&shape.node()) else {
            return Vec::new();
        };
        let origin = table.roots.get(&root).copied().unwrap_or_default();
        vec![bbox.relative_to(origin)]
    }
}

struct StaticShape {
    serial: u64,
    node: NodeId,
    table: Weak<RefCell<LayoutTable>>,
}

impl Shape for StaticShape {
    fn node(&self) -> NodeId {
        self.node
    }

    fn on_update(&mut self, callback: UpdateCallback) {
        let Some(table) = self.table.upgrade() else {
            return;
        };
        if let Some(live) = table.borrow_mut().shapes.get_mut(&self.serial) {
            live.callbacks.push(callback);
        }
    }

    fn destroy(&mut self) {
        if let Some(table) = self.table.upgrade() {
            if table.borrow_mut().shapes.remove(&self.serial).is_some() {
                trace!(node = ?self.node, serial = self.serial, "shape destroyed");
            }
        }
    }
}
