//! Comment types: the wire record, the store form, and region references.

use serde::{Deserialize, Serialize};

use crate::connector::{NodeId, OverlayNode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommentId(pub u64);

/// Weak link from a comment to the node it annotates.
///
/// The node itself belongs to the document's visual tree; a reference only
/// names it. `node` is `None` while the region has not been resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RegionRef {
    #[serde(default)]
    pub node: Option<NodeId>,
    #[serde(default)]
    pub hidden: bool,
}

impl RegionRef {
    #[must_use]
    pub fn overlay_node(&self) -> Option<OverlayNode> {
        self.node.map(|id| OverlayNode { id, hidden: self.hidden })
    }
}

/// A comment as delivered by a comment source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentRecord {
    pub id: CommentId,
    /// Region the comment is attached to. Document-level comments have none.
    #[serde(default)]
    pub region: Option<RegionRef>,
    #[serde(default)]
    pub text: String,
}

/// A comment as held by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    pub id: CommentId,
    pub region: Option<RegionRef>,
    pub text: String,
    /// Set while the pointer is over this comment's marker.
    pub highlighted: bool,
}

impl From<CommentRecord> for Comment {
    fn from(record: CommentRecord) -> Self {
        Self { id: record.id, region: record.region, text: record.text, highlighted: false }
    }
}
