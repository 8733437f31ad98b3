//! Regions of the primary data stream.

use crate::model::AnnotationRef;

/// A position in the primary data identifying one boundary of a region.
///
/// Anchors are non-negative offsets. By convention they are listed in
/// non-decreasing order, but the model does not require it.
pub type Anchor = u64;

/// An identified span of the primary data, anchored to a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    pub id: String,
    /// Anchor positions in declaration order.
    pub anchors: Vec<Anchor>,
    /// The node this region was declared against. Further nodes may link
    /// the same region without changing this field.
    pub node: String,
    /// Annotations attached to this region.
    pub annotations: Vec<AnnotationRef>,
}

impl Region {
    /// Creates a region with no annotations.
    pub fn new(id: impl Into<String>, anchors: Vec<Anchor>, node: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            anchors,
            node: node.into(),
            annotations: Vec::new(),
        }
    }
}
