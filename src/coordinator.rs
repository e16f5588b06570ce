//! Comment load coordinator.
//!
//! Watches the active annotation's identity and starts a store load whenever
//! it changes. The identity survives no-op re-renders and draft submission,
//! so those never reload; every distinct annotation (empty ones included)
//! gets its own load.

#[cfg(test)]
#[path = "coordinator_test.rs"]
mod coordinator_test;

use std::cell::Cell;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;

use tracing::{debug, info, warn};

use crate::annotation::AnnotationId;
use crate::error::ErrorCode;
use crate::store::{CommentStore, ListOptions, LoadOutcome};

/// Shared "still mounted" flag. Readers hold clones; the owner flips it once.
#[derive(Debug, Clone)]
pub struct MountFlag(Rc<Cell<bool>>);

impl MountFlag {
    #[must_use]
    pub fn mounted() -> Self {
        Self(Rc::new(Cell::new(true)))
    }

    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.0.get()
    }

    pub fn set_unmounted(&self) {
        self.0.set(false);
    }
}

/// How a coordinated load ended, from the overlay's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadReport {
    Finished(LoadOutcome),
    /// The source failed. Already logged; the list keeps whatever it holds.
    Failed { code: &'static str },
}

/// A load for the host to drive on its event loop.
pub type LoadTask = Pin<Box<dyn Future<Output = LoadReport>>>;

pub struct LoadCoordinator {
    store: CommentStore,
    mounted: MountFlag,
    /// Identity of the last load; `None` before the first sync.
    loaded_for: Option<Option<AnnotationId>>,
}

impl LoadCoordinator {
    #[must_use]
    pub fn new(store: CommentStore, mounted: MountFlag) -> Self {
        Self { store, mounted, loaded_for: None }
    }

    /// Start a load if this is the first sync or the annotation changed.
    pub fn sync(&mut self) -> Option<LoadTask> {
        let identity = self.store.annotation_id();
        if self.loaded_for == Some(identity) {
            return None;
        }
        self.loaded_for = Some(identity);

        let options = ListOptions {
            mounted: self.mounted.clone(),
            suppress_clear_comments: self.store.is_relevant_list(),
        };
        info!(
            annotation = ?identity.map(|id| id.to_string()),
            suppress_clear = options.suppress_clear_comments,
            "loading comments"
        );
        let load = self.store.list_comments(options);

        Some(Box::pin(async move {
            match load.await {
                Ok(outcome) => {
                    debug!(?outcome, "comment load settled");
                    LoadReport::Finished(outcome)
                }
                Err(e) => {
                    warn!(error = %e, code = e.error_code(), "comment load failed");
                    LoadReport::Failed { code: e.error_code() }
                }
            }
        }))
    }

    #[must_use]
    pub fn mount_flag(&self) -> &MountFlag {
        &self.mounted
    }
}
