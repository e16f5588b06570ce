//! Comment marker overlay for annotated canvases.
//!
//! This crate keeps a layer of small interactive comment markers pinned to the
//! top-right corner of the regions they annotate. It owns the position math,
//! the resize-to-recompute pipeline, the readiness gate that holds the layer
//! back until the underlying visual content has loaded, and the comment list
//! loading protocol. The host is responsible only for drawing the returned
//! [`overlay::OverlayView`] and forwarding layout, frame, and pointer events.
//!
//! Everything runs on one cooperative event loop. Shared state uses `Rc` and
//! `RefCell`; nothing here is `Send`.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`overlay`] | Top-level renderer composing every piece below |
//! | [`binding`] | Per-comment shape ownership and recompute signals |
//! | [`position`] | Bounding box to marker translation |
//! | [`resize`] | Frame-coalesced resize observation |
//! | [`readiness`] | Tag readiness gate |
//! | [`coordinator`] | Comment list load triggering |
//! | [`store`] | Comment store and comment sources |
//! | [`annotation`] | Annotation identity and tag set |
//! | [`comment`] | Comment and region reference types |
//! | [`connector`] | Shape connector traits |
//! | [`layout`] | In-memory shape connector |
//! | [`headless`] | In-memory frame clock and layout notifier |
//! | [`geometry`] | Points, boxes, translations |
//! | [`config`] | Environment configuration |
//! | [`error`] | Error types |
//! | [`consts`] | Marker constants |

pub mod annotation;
pub mod binding;
pub mod comment;
pub mod config;
pub mod connector;
pub mod consts;
pub mod coordinator;
pub mod error;
pub mod geometry;
pub mod headless;
pub mod layout;
pub mod overlay;
pub mod position;
pub mod readiness;
pub mod resize;
pub mod store;
