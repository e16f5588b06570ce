//! Frame-coalesced resize observation.
//!
//! DESIGN
//! ======
//! Shapes report changes of their own node only. Anything that moves a node
//! without touching it (the root resizing, a sidebar collapsing and reflowing
//! the page) arrives here instead, as size-change events on the root or the
//! document body. A burst of events within one frame window collapses into a
//! single recompute: every event cancels the pending animation frame and
//! requests a new one, and only the frame that is still pending when it fires
//! produces a new [`RecomputeToken`].
//!
//! Both capabilities are injected. [`LayoutNotifier`] is the host's resize
//! observer; [`FrameScheduler`] is its animation-frame clock. Every target the
//! coalescer observes is unobserved again when the root is replaced, when
//! [`ResizeCoalescer::disconnect`] runs, or when the coalescer drops.

#[cfg(test)]
#[path = "resize_test.rs"]
mod resize_test;

use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::connector::RootId;

/// Something whose size changes can move markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ObservedTarget {
    /// The overlay's coordinate-space root.
    Root(RootId),
    /// The document-level container.
    DocumentBody,
}

/// Host resize observer.
pub trait LayoutNotifier {
    fn observe(&self, target: ObservedTarget);
    fn unobserve(&self, target: ObservedTarget);
}

/// Handle of a requested animation frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameHandle(pub u64);

/// Host animation-frame clock.
pub trait FrameScheduler {
    fn request_frame(&self) -> FrameHandle;
    fn cancel_frame(&self, handle: FrameHandle);
}

/// Recompute generation. Each coalesced frame yields a new, larger token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecomputeToken(u64);

impl RecomputeToken {
    #[must_use]
    pub fn generation(self) -> u64 {
        self.0
    }
}

pub struct ResizeCoalescer {
    notifier: Rc<dyn LayoutNotifier>,
    frames: Rc<dyn FrameScheduler>,
    root: Option<RootId>,
    observed: Vec<ObservedTarget>,
    pending: Option<FrameHandle>,
    token: RecomputeToken,
}

impl ResizeCoalescer {
    #[must_use]
    pub fn new(notifier: Rc<dyn LayoutNotifier>, frames: Rc<dyn FrameScheduler>) -> Self {
        Self { notifier, frames, root: None, observed: Vec::new(), pending: None, token: RecomputeToken::default() }
    }

    /// Point observation at a new root, or stop observing with `None`.
    ///
    /// The previous root and the document body are unobserved before the new
    /// pair is observed.
    pub fn attach_root(&mut self, root: Option<RootId>) {
        if self.root == root {
            return;
        }
        self.unobserve_all();
        self.root = root;
        if let Some(root) = root {
            self.observe(ObservedTarget::Root(root));
            self.observe(ObservedTarget::DocumentBody);
            debug!(root = root.0, "resize observation attached");
        }
    }

    /// Record a batch of size-change events and (re)schedule the recompute frame.
    pub fn on_resize(&mut self, entries: &[ObservedTarget]) {
        if !entries.iter().any(|e| self.observed.contains(e)) {
            return;
        }
        if let Some(stale) = self.pending.take() {
            self.frames.cancel_frame(stale);
            trace!(frame = stale.0, "recompute frame rescheduled");
        }
        self.pending = Some(self.frames.request_frame());
    }

    /// Called when `handle` fires. Yields a fresh token only for the pending frame.
    pub fn on_frame(&mut self, handle: FrameHandle) -> Option<RecomputeToken> {
        if self.pending != Some(handle) {
            return None;
        }
        self.pending = None;
        self.token = RecomputeToken(self.token.0 + 1);
        debug!(generation = self.token.0, "layout recompute");
        Some(self.token)
    }

    /// Token of the most recent recompute.
    #[must_use]
    pub fn token(&self) -> RecomputeToken {
        self.token
    }

    #[must_use]
    pub fn root(&self) -> Option<RootId> {
        self.root
    }

    #[must_use]
    pub fn has_pending_frame(&self) -> bool {
        self.pending.is_some()
    }

    #[must_use]
    pub fn observed(&self) -> &[ObservedTarget] {
        &self.observed
    }

    /// Cancel the pending frame and unobserve everything.
    pub fn disconnect(&mut self) {
        if let Some(pending) = self.pending.take() {
            self.frames.cancel_frame(pending);
        }
        self.unobserve_all();
        self.root = None;
    }

    fn observe(&mut self, target: ObservedTarget) {
        if !self.observed.contains(&target) {
            self.notifier.observe(target);
            self.observed.push(target);
        }
    }

    fn unobserve_all(&mut self) {
        for target in self.observed.drain(..) {
            self.notifier.unobserve(target);
        }
    }
}

impl Drop for ResizeCoalescer {
    fn drop(&mut self) {
        self.disconnect();
    }
}
