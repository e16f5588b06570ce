//! In-memory host capabilities for headless rendering and tests.
//!
//! `FrameClock` stands in for the animation-frame clock: it hands out frame
//! handles, forgets cancelled ones, and returns the survivors when the host
//! advances a frame. `ObserverRegistry` stands in for the resize observer and
//! records what is currently observed.

use std::cell::RefCell;
use std::collections::BTreeSet;

use crate::resize::{FrameHandle, FrameScheduler, LayoutNotifier, ObservedTarget};

#[derive(Debug, Default)]
struct ClockState {
    next: u64,
    due: Vec<FrameHandle>,
    requested: usize,
    cancelled: usize,
}

#[derive(Debug, Default)]
pub struct FrameClock {
    state: RefCell<ClockState>,
}

impl FrameClock {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance one frame: every requested, uncancelled handle, in request order.
    pub fn take_due(&self) -> Vec<FrameHandle> {
        std::mem::take(&mut self.state.borrow_mut().due)
    }

    #[must_use]
    pub fn requested(&self) -> usize {
        self.state.borrow().requested
    }

    #[must_use]
    pub fn cancelled(&self) -> usize {
        self.state.borrow().cancelled
    }
}

impl FrameScheduler for FrameClock {
    fn request_frame(&self) -> FrameHandle {
        let mut state = self.state.borrow_mut();
        state.next += 1;
        state.requested += 1;
        let handle = FrameHandle(state.next);
        state.due.push(handle);
        handle
    }

    fn cancel_frame(&self, handle: FrameHandle) {
        let mut state = self.state.borrow_mut();
        let before = state.due.len();
        state.due.retain(|h| *h != handle);
        if state.due.len() != before {
            state.cancelled += 1;
        }
    }
}

#[derive(Debug, Default)]
pub struct ObserverRegistry {
    targets: RefCell<BTreeSet<ObservedTarget>>,
}

impl ObserverRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_observing(&self, target: ObservedTarget) -> bool {
        self.targets.borrow().contains(&target)
    }

    #[must_use]
    pub fn observed(&self) -> Vec<ObservedTarget> {
        self.targets.borrow().iter().copied().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.targets.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.targets.borrow().is_empty()
    }
}

impl LayoutNotifier for ObserverRegistry {
    fn observe(&self, target: ObservedTarget) {
        self.targets.borrow_mut().insert(target);
    }

    fn unobserve(&self, target: ObservedTarget) {
        self.targets.borrow_mut().remove(&target);
    }
}
