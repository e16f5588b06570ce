//! Readiness gate over an annotation's tag set.
//!
//! The marker layer must not compute positions against half-loaded content:
//! an image that has not finished decoding reports a zero-sized box, which
//! would briefly anchor markers in the wrong place. The gate is a pure
//! predicate over the current tag set. It is re-evaluated on every render and
//! never latches, so a unit dropping back to "not ready" blocks the layer
//! again.

#[cfg(test)]
#[path = "readiness_test.rs"]
mod readiness_test;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Readiness contract of one named piece of visual content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TagUnit {
    /// Image-backed content; must also report its image as loaded.
    Image {
        alive: bool,
        image_loaded: bool,
        #[serde(default)]
        ready: Option<bool>,
    },
    /// Any other content; liveness and the optional readiness flag decide.
    Control {
        alive: bool,
        #[serde(default)]
        ready: Option<bool>,
    },
}

impl TagUnit {
    /// A live, ready unit with no image.
    #[must_use]
    pub fn ready_control() -> Self {
        Self::Control { alive: true, ready: Some(true) }
    }

    /// A live image unit that finished loading.
    #[must_use]
    pub fn loaded_image() -> Self {
        Self::Image { alive: true, image_loaded: true, ready: None }
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        match *self {
            Self::Image { alive, image_loaded, ready } => alive && image_loaded && ready.unwrap_or(true),
            Self::Control { alive, ready } => alive && ready.unwrap_or(true),
        }
    }
}

/// Named tag units in name order.
pub type TagSet = BTreeMap<String, TagUnit>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Blocked,
    Ready,
}

/// `Ready` iff every unit is ready. An empty set is `Ready`.
#[must_use]
pub fn evaluate(tags: &TagSet) -> GateState {
    if tags.values().all(TagUnit::is_ready) {
        GateState::Ready
    } else {
        GateState::Blocked
    }
}

/// Name of the first unit (in name order) that keeps the gate closed.
#[must_use]
pub fn first_blocking(tags: &TagSet) -> Option<&str> {
    tags.iter()
        .find(|(_, unit)| !unit.is_ready())
        .map(|(name, _)| name.as_str())
}

/// Gate evaluator that remembers the previous result for logging only.
#[derive(Debug, Default)]
pub struct ReadinessGate {
    last: Option<GateState>,
}

impl ReadinessGate {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluate the gate against `tags`. The previous result has no influence.
    pub fn evaluate(&mut self, tags: &TagSet) -> GateState {
        let state = evaluate(tags);
        if self.last != Some(state) {
            debug!(?state, blocking = first_blocking(tags), units = tags.len(), "readiness gate changed");
        }
        self.last = Some(state);
        state
    }

    /// Result of the most recent evaluation.
    #[must_use]
    pub fn last(&self) -> Option<GateState> {
        self.last
    }
}
