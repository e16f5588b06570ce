//! Headless overlay demo.
//!
//! Renders a comment overlay against an in-memory layout, walks it through an
//! image load, a hover, a sidebar collapse and a teardown, and prints each view
//! as JSON. Comments come from `OVERLAY_FIXTURE` or a built-in list.

use std::rc::Rc;

use tracing::{debug, error, info};

use comments_overlay::annotation::Annotation;
use comments_overlay::comment::CommentId;
use comments_overlay::config::OverlayConfig;
use comments_overlay::connector::{NodeId, RootId};
use comments_overlay::error::{ErrorCode, OverlayError};
use comments_overlay::geometry::{BBox, Point};
use comments_overlay::headless::{FrameClock, ObserverRegistry};
use comments_overlay::layout::StaticLayout;
use comments_overlay::overlay::{CommentsOverlay, OverlayDeps, OverlayView};
use comments_overlay::readiness::TagUnit;
use comments_overlay::resize::ObservedTarget;
use comments_overlay::store::{CommentStore, MemorySource};

const BUILTIN_COMMENTS: &str = r#"[
    {"id": 1, "region": {"node": 10}, "text": "Tighten this margin"},
    {"id": 2, "region": {"node": 20, "hidden": true}, "text": "On a collapsed layer"},
    {"id": 3, "text": "Overall looks good"}
]"#;

const ROOT: RootId = RootId(1);

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), OverlayError> {
    tracing_subscriber::fmt::init();

    if let Err(e) = run().await {
        error!(error = %e, code = e.error_code(), "demo failed");
        return Err(e);
    }
    Ok(())
}

async fn run() -> Result<(), OverlayError> {
    let config = OverlayConfig::from_env()?;

    let annotation = Annotation::new();
    annotation.set_tag("page", TagUnit::Image { alive: true, image_loaded: false, ready: None });

    let payload = match &config.fixture {
        Some(path) => std::fs::read_to_string(path)?,
        None => BUILTIN_COMMENTS.to_owned(),
    };
    let source = MemorySource::new();
    source.insert_json(annotation.id(), &payload)?;

    let layout = StaticLayout::new();
    layout.set_root_origin(ROOT, Point::new(0.0, 0.0));
    layout.set_node_box(NodeId(10), BBox::new(10.0, 10.0, 50.0, 20.0));
    layout.set_node_box(NodeId(20), BBox::new(120.0, 40.0, 30.0, 30.0));
    let clock = Rc::new(FrameClock::new());
    let observers = Rc::new(ObserverRegistry::new());

    let store = CommentStore::new(Rc::new(source));
    store.set_annotation(Some(annotation.clone()));
    let mut scrolls = store.take_scroll_requests();

    let mut overlay = CommentsOverlay::new(OverlayDeps {
        store,
        connector: Rc::new(layout.clone()),
        notifier: observers.clone(),
        frames: clock.clone(),
        geometry: config.geometry,
    });
    overlay.set_root(Some(ROOT));

    print_view("page image decoding", &render(&mut overlay).await)?;

    annotation.set_tag("page", TagUnit::loaded_image());
    print_view("page image loaded", &render(&mut overlay).await)?;

    overlay.pointer_enter(CommentId(1));
    print_view("pointer over comment 1", &render(&mut overlay).await)?;
    overlay.pointer_leave(CommentId(1));
    overlay.click(CommentId(1));
    if let Some(scrolls) = &mut scrolls {
        while let Ok(comment) = scrolls.try_recv() {
            info!(comment = comment.0, "scroll into view requested");
        }
    }

    // Sidebar collapses: the root moves and the body reports a burst of resizes.
    layout.set_root_origin(ROOT, Point::new(-40.0, 0.0));
    for _ in 0..8 {
        overlay.on_resize(&[ObservedTarget::DocumentBody, ObservedTarget::Root(ROOT)]);
    }
    let recomputes = clock.take_due().into_iter().filter(|frame| overlay.on_frame(*frame)).count();
    info!(recomputes, requested = clock.requested(), cancelled = clock.cancelled(), "frame advanced");
    print_view("after sidebar collapse", &render(&mut overlay).await)?;

    overlay.unmount();
    info!(
        observed = observers.len(),
        shapes = layout.live_shapes(),
        subscriptions = layout.active_subscriptions(),
        "overlay torn down"
    );
    Ok(())
}

/// Render, driving every load the render starts, until the view settles.
async fn render(overlay: &mut CommentsOverlay) -> OverlayView {
    let mut output = overlay.render();
    while let Some(load) = output.load {
        let report = load.await;
        debug!(?report, "comment load finished");
        output = overlay.render();
    }
    output.view
}

fn print_view(label: &str, view: &OverlayView) -> Result<(), OverlayError> {
    println!("{label}: {}", serde_json::to_string(view)?);
    Ok(())
}
