//! Comment store: the ordered comment list of the active annotation.
//!
//! DESIGN
//! ======
//! The store is the only place the comment list lives. It is mutated by
//! [`CommentStore::list_comments`] (whole-list replacement) and by highlight
//! toggles; everything else reads. Observers subscribe to a revision counter
//! over a `tokio::sync::watch` channel and re-render when it moves.
//!
//! Loads race. A load captures its request number and target annotation when
//! it is *called*, not when it is first polled, and applies its result only if
//! the caller is still mounted, no newer load was issued since, and the target
//! is still the active annotation. Anything else is discarded without touching
//! the list.

#[cfg(test)]
#[path = "store_test.rs"]
mod store_test;

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::rc::Rc;

use tokio::sync::{mpsc, watch};
use tracing::debug;

use crate::annotation::{Annotation, AnnotationId};
use crate::comment::{Comment, CommentId, CommentRecord};
use crate::coordinator::MountFlag;
use crate::error::SourceError;

/// Where comment lists come from. Transport is the implementor's business.
#[async_trait::async_trait(?Send)]
pub trait CommentSource {
    /// Fetch the comments of `annotation`, in display order.
    ///
    /// # Errors
    ///
    /// Returns a [`SourceError`] if the list could not be produced.
    async fn fetch(&self, annotation: AnnotationId) -> Result<Vec<CommentRecord>, SourceError>;
}

/// In-memory comment source.
#[derive(Debug, Default)]
pub struct MemorySource {
    lists: RefCell<HashMap<AnnotationId, Vec<CommentRecord>>>,
}

impl MemorySource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, annotation: AnnotationId, records: Vec<CommentRecord>) {
        self.lists.borrow_mut().insert(annotation, records);
    }

    /// Replace the list of `annotation` with a JSON array of comment records.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Decode`] if `json` is not an array of records.
    pub fn insert_json(&self, annotation: AnnotationId, json: &str) -> Result<(), SourceError> {
        let records: Vec<CommentRecord> = serde_json::from_str(json)?;
        self.insert(annotation, records);
        Ok(())
    }
}

#[async_trait::async_trait(?Send)]
impl CommentSource for MemorySource {
    async fn fetch(&self, annotation: AnnotationId) -> Result<Vec<CommentRecord>, SourceError> {
        Ok(self.lists.borrow().get(&annotation).cloned().unwrap_or_default())
    }
}

#[derive(Debug, Clone)]
pub struct ListOptions {
    /// Whether the requesting component is still mounted.
    pub mounted: MountFlag,
    /// Keep showing the current list until the new one arrives.
    pub suppress_clear_comments: bool,
}

/// How a load settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The list was replaced with `count` comments.
    Applied { count: usize },
    /// The requester unmounted before the result arrived.
    Unmounted,
    /// A newer load or an annotation switch made the result stale.
    Superseded,
    /// There was no active annotation to load for.
    NoAnnotation,
}

#[derive(Default)]
struct StoreState {
    annotation: Option<Annotation>,
    /// `None` until a list exists.
    comments: Option<Vec<Comment>>,
    /// Annotation the current list was loaded for.
    list_annotation: Option<AnnotationId>,
    latest_request: u64,
}

/// Shared handle to the comment store. Clones refer to the same store.
#[derive(Clone)]
pub struct CommentStore {
    state: Rc<RefCell<StoreState>>,
    source: Rc<dyn CommentSource>,
    changes: Rc<watch::Sender<u64>>,
    scrolls: mpsc::UnboundedSender<CommentId>,
    scroll_rx: Rc<RefCell<Option<mpsc::UnboundedReceiver<CommentId>>>>,
}

impl CommentStore {
    #[must_use]
    pub fn new(source: Rc<dyn CommentSource>) -> Self {
        let (changes, _) = watch::channel(0);
        let (scrolls, scroll_rx) = mpsc::unbounded_channel();
        Self {
            state: Rc::new(RefCell::new(StoreState::default())),
            source,
            changes: Rc::new(changes),
            scrolls,
            scroll_rx: Rc::new(RefCell::new(Some(scroll_rx))),
        }
    }

    // --- Annotation ---

    /// Switch the active annotation. The list is left alone; loading decides.
    pub fn set_annotation(&self, annotation: Option<Annotation>) {
        self.state.borrow_mut().annotation = annotation;
        self.notify();
    }

    #[must_use]
    pub fn annotation(&self) -> Option<Annotation> {
        self.state.borrow().annotation.clone()
    }

    #[must_use]
    pub fn annotation_id(&self) -> Option<AnnotationId> {
        self.state.borrow().annotation.as_ref().map(Annotation::id)
    }

    // --- Queries ---

    /// Every comment, or `None` before any list exists.
    #[must_use]
    pub fn comments(&self) -> Option<Vec<Comment>> {
        self.state.borrow().comments.clone()
    }

    /// Comments attached to a region, in list order. Only the first comment
    /// with a given id is kept.
    #[must_use]
    pub fn overlay_comments(&self) -> Option<Vec<Comment>> {
        let state = self.state.borrow();
        let all = state.comments.as_ref()?;
        let mut seen = HashSet::new();
        let overlay = all
            .iter()
            .filter(|c| c.region.is_some())
            .filter(|c| {
                let first = seen.insert(c.id);
                if !first {
                    debug!(comment = c.id.0, "duplicate comment id skipped");
                }
                first
            })
            .cloned()
            .collect();
        Some(overlay)
    }

    /// Whether any comment is highlighted.
    #[must_use]
    pub fn is_highlighting(&self) -> bool {
        self.state
            .borrow()
            .comments
            .as_ref()
            .is_some_and(|all| all.iter().any(|c| c.highlighted))
    }

    /// Whether the current list was loaded for the active annotation.
    #[must_use]
    pub fn is_relevant_list(&self) -> bool {
        let state = self.state.borrow();
        state.list_annotation.is_some() && state.list_annotation == state.annotation.as_ref().map(Annotation::id)
    }

    /// Receiver that flags every store change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.changes.subscribe()
    }

    // --- Mutations ---

    /// Set a comment's highlighted flag. Returns `false` for unknown comments.
    pub fn set_highlighted(&self, id: CommentId, highlighted: bool) -> bool {
        let changed = {
            let mut state = self.state.borrow_mut();
            let Some(comment) = state.comments.iter_mut().flatten().find(|c| c.id == id) else {
                return false;
            };
            let changed = comment.highlighted != highlighted;
            comment.highlighted = highlighted;
            changed
        };
        if changed {
            self.notify();
        }
        true
    }

    /// Ask the host to scroll the comment into view.
    pub fn scroll_into_view(&self, id: CommentId) {
        if self.scrolls.send(id).is_err() {
            debug!(comment = id.0, "scroll request dropped, no listener");
        }
    }

    /// Receiver of scroll-into-view requests. Available once.
    pub fn take_scroll_requests(&self) -> Option<mpsc::UnboundedReceiver<CommentId>> {
        self.scroll_rx.borrow_mut().take()
    }

    /// Empty the list and forget which annotation it belonged to.
    pub fn clear_comments(&self) {
        {
            let mut state = self.state.borrow_mut();
            state.comments = Some(Vec::new());
            state.list_annotation = None;
        }
        self.notify();
    }

    // --- Loading ---

    /// Load the list of the active annotation.
    ///
    /// Unless `suppress_clear_comments` is set, the list is cleared right away so
    /// markers of another annotation never linger. The request is captured
    /// before this returns; see the module docs for when results are discarded.
    ///
    /// # Errors
    ///
    /// The returned future fails with the source's [`SourceError`]. The list is
    /// left as it was when the load started (cleared or not).
    pub fn list_comments(&self, options: ListOptions) -> impl Future<Output = Result<LoadOutcome, SourceError>> + use<> {
        let (request, target) = {
            let mut state = self.state.borrow_mut();
            state.latest_request += 1;
            (state.latest_request, state.annotation.as_ref().map(Annotation::id))
        };
        if !options.suppress_clear_comments {
            self.clear_comments();
        }
        let store = self.clone();

        async move {
            let Some(target) = target else {
                return Ok(LoadOutcome::NoAnnotation);
            };
            let records = store.source.fetch(target).await?;

            if !options.mounted.is_mounted() {
                debug!(annotation = %target, request, "comment load discarded: unmounted");
                return Ok(LoadOutcome::Unmounted);
            }
            if !store.is_current(request, target) {
                debug!(annotation = %target, request, "comment load discarded: superseded");
                return Ok(LoadOutcome::Superseded);
            }

            let count = records.len();
            store.replace_comments(target, records);
            Ok(LoadOutcome::Applied { count })
        }
    }

    fn is_current(&self, request: u64, target: AnnotationId) -> bool {
        let state = self.state.borrow();
        state.latest_request == request && state.annotation.as_ref().map(Annotation::id) == Some(target)
    }

    fn replace_comments(&self, target: AnnotationId, records: Vec<CommentRecord>) {
        {
            let mut state = self.state.borrow_mut();
            state.comments = Some(records.into_iter().map(Comment::from).collect());
            state.list_annotation = Some(target);
        }
        self.notify();
    }

    fn notify(&self) {
        self.changes.send_modify(|rev| *rev += 1);
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================
