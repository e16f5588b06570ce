//! Shared numeric constants for the marker layer.

// ── Marker glyph ────────────────────────────────────────────────

/// Width and height of the comment marker glyph, in CSS pixels.
pub const ICON_SIZE_PX: f64 = 24.0;

/// Compensates for the padding the host draws around each region outline.
pub const PADDING_COMPENSATION_PX: f64 = 3.0;

/// How far the marker's bottom-left corner overlaps the region's top-right corner.
pub const COMMENT_ICON_OVERLAP_PX: f64 = 4.0;

// ── Visibility ──────────────────────────────────────────────────

/// Boxes narrower or shorter than this are not laid out yet; no marker is drawn.
pub const MIN_MARKER_EXTENT_PX: f64 = 1.0;
