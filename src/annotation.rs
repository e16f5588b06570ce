//! Annotation identity and its tag set.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use uuid::Uuid;

use crate::readiness::{TagSet, TagUnit};

/// Internal annotation identity.
///
/// Fresh for every annotation, including empty ones, and stable for the
/// annotation's lifetime (submitting a draft keeps the id).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnnotationId(pub Uuid);

impl AnnotationId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AnnotationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AnnotationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

struct AnnotationInner {
    id: AnnotationId,
    tags: RefCell<TagSet>,
    changes: watch::Sender<u64>,
}

/// Shared handle to an annotation. Clones refer to the same annotation.
#[derive(Clone)]
pub struct Annotation {
    inner: Rc<AnnotationInner>,
}

impl Annotation {
    #[must_use]
    pub fn new() -> Self {
        Self::with_id(AnnotationId::new())
    }

    #[must_use]
    pub fn with_id(id: AnnotationId) -> Self {
        let (changes, _) = watch::channel(0);
        Self { inner: Rc::new(AnnotationInner { id, tags: RefCell::new(TagSet::new()), changes }) }
    }

    #[must_use]
    pub fn id(&self) -> AnnotationId {
        self.inner.id
    }

    /// Snapshot of the current tag set.
    #[must_use]
    pub fn tags(&self) -> TagSet {
        self.inner.tags.borrow().clone()
    }

    /// Insert or replace a named tag unit.
    pub fn set_tag(&self, name: impl Into<String>, unit: TagUnit) {
        self.inner.tags.borrow_mut().insert(name.into(), unit);
        self.notify();
    }

    pub fn remove_tag(&self, name: &str) {
        if self.inner.tags.borrow_mut().remove(name).is_some() {
            self.notify();
        }
    }

    /// Receiver that flags every tag change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.changes.subscribe()
    }

    fn notify(&self) {
        self.inner.changes.send_modify(|rev| *rev += 1);
    }
}

impl Default for Annotation {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Annotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Annotation")
            .field("id", &self.inner.id)
            .field("tags", &self.inner.tags.borrow().len())
            .finish()
    }
}
