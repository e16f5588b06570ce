//! Per-comment shape binding.
//!
//! A `ShapeBinding` owns at most one live [`Shape`] for the (node, root) pair a
//! comment currently resolves to. Every shape it creates is destroyed exactly
//! once: on rebind, on [`ShapeBinding::release`], or when the binding drops.
//! Shape updates bump the binding's revision and enqueue the comment on an
//! [`InvalidationQueue`], so only that marker recomputes.

#[cfg(test)]
#[path = "binding_test.rs"]
mod binding_test;

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tracing::debug;

use crate::comment::CommentId;
use crate::connector::{NodeId, OverlayNode, RootId, Shape, ShapeConnector};

/// Comments whose shapes reported a geometry change since the last drain.
#[derive(Clone, Default)]
pub struct InvalidationQueue {
    pending: Rc<RefCell<Vec<CommentId>>>,
}

impl InvalidationQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, comment: CommentId) {
        let mut pending = self.pending.borrow_mut();
        if !pending.contains(&comment) {
            pending.push(comment);
        }
    }

    /// Take every queued comment, oldest first.
    pub fn drain(&self) -> Vec<CommentId> {
        std::mem::take(&mut *self.pending.borrow_mut())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.borrow().is_empty()
    }
}

struct BoundShape {
    node: NodeId,
    root: RootId,
    shape: Box<dyn Shape>,
}

pub struct ShapeBinding {
    comment: CommentId,
    connector: Rc<dyn ShapeConnector>,
    invalidations: InvalidationQueue,
    bound: Option<BoundShape>,
    revision: Rc<Cell<u64>>,
}

impl ShapeBinding {
    #[must_use]
    pub fn new(comment: CommentId, connector: Rc<dyn ShapeConnector>, invalidations: InvalidationQueue) -> Self {
        Self { comment, connector, invalidations, bound: None, revision: Rc::new(Cell::new(0)) }
    }

    /// Bring the bound shape in line with the comment's current node and root.
    ///
    /// Absent or hidden nodes, or a missing root, leave the binding empty. A
    /// change of node or root identity destroys the old shape before the new
    /// one is created. Unchanged inputs keep the existing shape.
    pub fn sync(&mut self, node: Option<OverlayNode>, root: Option<RootId>) {
        let target = match (node, root) {
            (Some(node), Some(root)) if !node.hidden => Some((node.id, root)),
            _ => None,
        };
        let current = self.bound.as_ref().map(|b| (b.node, b.root));
        if current == target {
            return;
        }

        self.release();
        let Some((node, root)) = target else {
            return;
        };

        let mut shape = self.connector.create_shape(node, root);
        let revision = Rc::clone(&self.revision);
        let invalidations = self.invalidations.clone();
        let comment = self.comment;
        shape.on_update(Rc::new(move || {
            revision.set(revision.get() + 1);
            invalidations.push(comment);
        }));
        self.bump();
        debug!(comment = comment.0, node = node.0, root = root.0, "shape bound");
        self.bound = Some(BoundShape { node, root, shape });
    }

    /// Destroy the bound shape, if any.
    pub fn release(&mut self) {
        if let Some(mut bound) = self.bound.take() {
            bound.shape.destroy();
            self.bump();
            debug!(comment = self.comment.0, node = bound.node.0, "shape released");
        }
    }

    #[must_use]
    pub fn shape(&self) -> Option<&dyn Shape> {
        self.bound.as_ref().map(|b| b.shape.as_ref())
    }

    #[must_use]
    pub fn root(&self) -> Option<RootId> {
        self.bound.as_ref().map(|b| b.root)
    }

    /// Changes on every rebind, release, and shape update.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision.get()
    }

    #[must_use]
    pub fn comment(&self) -> CommentId {
        self.comment
    }

    fn bump(&self) {
        self.revision.set(self.revision.get() + 1);
    }
}

impl Drop for ShapeBinding {
    fn drop(&mut self) {
        self.release();
    }
}
