//! Comment marker overlay renderer.
//!
//! DESIGN
//! ======
//! `CommentsOverlay` is retained state plus a `render` pass that returns a
//! plain [`OverlayView`] for the host to draw. It never draws anything itself.
//!
//! The readiness gate decides whether the marker layer exists at all. While it
//! is `Ready`, a `MountedLayer` holds everything with a lifecycle: the load
//! coordinator and its mount flag, the resize coalescer and one `Marker` per
//! overlay comment. When the gate closes, or the host calls
//! [`CommentsOverlay::unmount`], the layer drops. Dropping flips the mount flag
//! so in-flight loads are discarded, destroys every shape and unobserves every
//! resize target.
//!
//! Markers are keyed by comment id plus the current [`RecomputeToken`]. A new
//! token changes every key, so the next render builds fresh markers and the
//! old ones drop. Between tokens a marker keeps its shape and only recomputes
//! its placement when its binding revision moved.
//!
//! Change tracking is explicit: the store and the active annotation publish
//! revision counters over `tokio::sync::watch`, shapes push onto an
//! [`InvalidationQueue`], and the coalescer hands out tokens.
//! [`CommentsOverlay::needs_render`] folds all of these together.

#[cfg(test)]
#[path = "overlay_test.rs"]
mod overlay_test;

use std::collections::BTreeMap;
use std::rc::Rc;

use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, trace};

use crate::annotation::AnnotationId;
use crate::binding::{InvalidationQueue, ShapeBinding};
use crate::comment::CommentId;
use crate::config::MarkerGeometry;
use crate::connector::{RootId, ShapeConnector};
use crate::coordinator::{LoadCoordinator, LoadTask, MountFlag};
use crate::geometry::Translation;
use crate::position::{self, Placement};
use crate::readiness::{GateState, ReadinessGate, TagSet};
use crate::resize::{FrameHandle, FrameScheduler, LayoutNotifier, ObservedTarget, RecomputeToken, ResizeCoalescer};
use crate::store::CommentStore;

/// Container class applied while any comment is highlighted.
pub const HIGHLIGHTING_CLASS: &str = "is-highlighting";

/// Host capabilities and collaborators the overlay is built from.
pub struct OverlayDeps {
    pub store: CommentStore,
    pub connector: Rc<dyn ShapeConnector>,
    pub notifier: Rc<dyn LayoutNotifier>,
    pub frames: Rc<dyn FrameScheduler>,
    pub geometry: MarkerGeometry,
}

/// Identity of a mounted marker. Changes with every recompute generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct MarkerKey {
    pub comment: CommentId,
    pub generation: RecomputeToken,
}

/// One visible marker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerView {
    pub key: MarkerKey,
    pub translation: Translation,
    /// CSS `transform` value, e.g. `translate(53px, -7px)`.
    pub transform: String,
    pub highlighted: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum OverlayView {
    /// Visual content is still loading; nothing is mounted.
    Blocked,
    /// The store has no comment list yet.
    Empty,
    Layer { highlighting: bool, markers: Vec<MarkerView> },
}

impl OverlayView {
    /// Visible markers, empty unless this is a `Layer`.
    #[must_use]
    pub fn markers(&self) -> &[MarkerView] {
        match self {
            Self::Layer { markers, .. } => markers,
            Self::Blocked | Self::Empty => &[],
        }
    }

    /// Class for the layer container, if any.
    #[must_use]
    pub fn container_class(&self) -> Option<&'static str> {
        match self {
            Self::Layer { highlighting: true, .. } => Some(HIGHLIGHTING_CLASS),
            _ => None,
        }
    }
}

/// Result of a render pass.
pub struct RenderOutput {
    pub view: OverlayView,
    /// A comment load the host must drive to completion.
    pub load: Option<LoadTask>,
}

struct Marker {
    binding: ShapeBinding,
    /// Placement and the binding revision it was computed at.
    memo: Option<(u64, Placement)>,
}

impl Marker {
    fn new(comment: CommentId, connector: Rc<dyn ShapeConnector>, invalidations: InvalidationQueue) -> Self {
        Self { binding: ShapeBinding::new(comment, connector, invalidations), memo: None }
    }

    fn placement(&mut self, connector: &dyn ShapeConnector, geometry: &MarkerGeometry) -> Placement {
        let revision = self.binding.revision();
        if let Some((_, placement)) = self.memo.filter(|(seen, _)| *seen == revision) {
            return placement;
        }
        let placement = position::resolve(connector, self.binding.shape(), self.binding.root(), geometry);
        trace!(comment = self.binding.comment().0, revision, ?placement, "marker placed");
        self.memo = Some((revision, placement));
        placement
    }
}

struct MountedLayer {
    mounted: MountFlag,
    coordinator: LoadCoordinator,
    resize: ResizeCoalescer,
    invalidations: InvalidationQueue,
    markers: BTreeMap<MarkerKey, Marker>,
}

impl MountedLayer {
    fn mount(deps: &OverlayDeps) -> Self {
        let mounted = MountFlag::mounted();
        debug!("marker layer mounted");
        Self {
            coordinator: LoadCoordinator::new(deps.store.clone(), mounted.clone()),
            mounted,
            resize: ResizeCoalescer::new(Rc::clone(&deps.notifier), Rc::clone(&deps.frames)),
            invalidations: InvalidationQueue::new(),
            markers: BTreeMap::new(),
        }
    }
}

impl Drop for MountedLayer {
    fn drop(&mut self) {
        self.mounted.set_unmounted();
        debug!(markers = self.markers.len(), "marker layer unmounted");
    }
}

pub struct CommentsOverlay {
    deps: OverlayDeps,
    gate: ReadinessGate,
    root: Option<RootId>,
    layer: Option<MountedLayer>,
    store_changes: watch::Receiver<u64>,
    /// Tag watch of the annotation the last render saw.
    tag_changes: Option<(AnnotationId, watch::Receiver<u64>)>,
    rendered_token: Option<RecomputeToken>,
    dirty: bool,
}

impl CommentsOverlay {
    #[must_use]
    pub fn new(deps: OverlayDeps) -> Self {
        let store_changes = deps.store.subscribe();
        Self {
            deps,
            gate: ReadinessGate::new(),
            root: None,
            layer: None,
            store_changes,
            tag_changes: None,
            rendered_token: None,
            dirty: true,
        }
    }

    // --- Host inputs ---

    /// Set the coordinate-space root markers are positioned against.
    pub fn set_root(&mut self, root: Option<RootId>) {
        if self.root != root {
            self.root = root;
            self.dirty = true;
        }
    }

    /// Forward size-change events from the host's resize observer.
    pub fn on_resize(&mut self, entries: &[ObservedTarget]) {
        if let Some(layer) = &mut self.layer {
            layer.resize.on_resize(entries);
        }
    }

    /// Forward a fired animation frame. Returns `true` if it started a new
    /// recompute generation.
    pub fn on_frame(&mut self, handle: FrameHandle) -> bool {
        self.layer
            .as_mut()
            .and_then(|layer| layer.resize.on_frame(handle))
            .is_some()
    }

    // --- Marker interaction ---

    pub fn pointer_enter(&self, comment: CommentId) {
        self.highlight(comment, true);
    }

    pub fn pointer_leave(&self, comment: CommentId) {
        self.highlight(comment, false);
    }

    pub fn click(&self, comment: CommentId) {
        self.deps.store.scroll_into_view(comment);
    }

    // --- Rendering ---

    /// Whether anything the view depends on changed since the last render.
    #[must_use]
    pub fn needs_render(&self) -> bool {
        if self.dirty || self.store_changes.has_changed().unwrap_or(true) {
            return true;
        }
        let tags_changed = match (self.deps.store.annotation_id(), &self.tag_changes) {
            (None, None) => false,
            (Some(id), Some((tracked, changes))) if id == *tracked => changes.has_changed().unwrap_or(true),
            _ => true,
        };
        tags_changed
            || self
                .layer
                .as_ref()
                .is_some_and(|layer| !layer.invalidations.is_empty() || Some(layer.resize.token()) != self.rendered_token)
    }

    /// Bring the marker layer up to date and describe it.
    pub fn render(&mut self) -> RenderOutput {
        self.dirty = false;
        self.store_changes.mark_unchanged();
        let tags = self.refresh_tags();

        if self.gate.evaluate(&tags) == GateState::Blocked {
            self.layer = None;
            self.rendered_token = None;
            return RenderOutput { view: OverlayView::Blocked, load: None };
        }

        let deps = &self.deps;
        let root = self.root;
        let layer = self.layer.get_or_insert_with(|| MountedLayer::mount(deps));
        let load = layer.coordinator.sync();
        self.rendered_token = Some(layer.resize.token());

        let Some(comments) = deps.store.overlay_comments() else {
            layer.resize.attach_root(None);
            layer.markers.clear();
            return RenderOutput { view: OverlayView::Empty, load };
        };

        layer.resize.attach_root(root);
        let generation = layer.resize.token();
        let invalidated = layer.invalidations.drain();
        if !invalidated.is_empty() {
            trace!(count = invalidated.len(), "shape updates since last render");
        }

        let mut previous = std::mem::take(&mut layer.markers);
        let mut markers = Vec::new();
        for comment in comments {
            let key = MarkerKey { comment: comment.id, generation };
            let mut marker = previous
                .remove(&key)
                .unwrap_or_else(|| Marker::new(comment.id, Rc::clone(&deps.connector), layer.invalidations.clone()));
            marker.binding.sync(comment.region.and_then(|r| r.overlay_node()), root);

            let placement = marker.placement(deps.connector.as_ref(), &deps.geometry);
            if let Some(translation) = placement.translation {
                markers.push(MarkerView {
                    key,
                    translation,
                    transform: translation.css_transform(),
                    highlighted: comment.highlighted,
                });
            }
            layer.markers.insert(key, marker);
        }
        if !previous.is_empty() {
            debug!(count = previous.len(), generation = generation.generation(), "stale markers dropped");
        }
        drop(previous);

        let view = OverlayView::Layer { highlighting: deps.store.is_highlighting(), markers };
        RenderOutput { view, load }
    }

    /// Tear the marker layer down. The next `render` mounts it again.
    pub fn unmount(&mut self) {
        self.layer = None;
        self.rendered_token = None;
        self.dirty = true;
    }

    /// Keys of every mounted marker, including ones too small to show.
    #[must_use]
    pub fn active_markers(&self) -> Vec<MarkerKey> {
        self.layer
            .as_ref()
            .map(|layer| layer.markers.keys().copied().collect())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.layer.is_some()
    }

    #[must_use]
    pub fn store(&self) -> &CommentStore {
        &self.deps.store
    }

    fn highlight(&self, comment: CommentId, highlighted: bool) {
        if !self.deps.store.set_highlighted(comment, highlighted) {
            trace!(comment = comment.0, highlighted, "highlight for unknown comment ignored");
        }
    }

    fn refresh_tags(&mut self) -> TagSet {
        let Some(annotation) = self.deps.store.annotation() else {
            self.tag_changes = None;
            return TagSet::new();
        };
        let id = annotation.id();
        if self.tag_changes.as_ref().is_none_or(|(tracked, _)| *tracked != id) {
            self.tag_changes = Some((id, annotation.subscribe()));
        } else if let Some((_, changes)) = &mut self.tag_changes {
            changes.mark_unchanged();
        }
        annotation.tags()
    }
}
