//! Graph nodes.

use crate::model::AnnotationRef;

/// A graph vertex.
///
/// Nodes are created on first mention, either by their own element or as
/// an edge endpoint reference. Adjacency lists are filled only during
/// finalization, after every node element has been seen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Node {
    pub id: String,
    /// Ids of edges leaving this node, in attachment order.
    pub out_edges: Vec<String>,
    /// Ids of edges arriving at this node, in attachment order.
    pub in_edges: Vec<String>,
    /// Ids of regions anchoring this node to the primary data.
    pub regions: Vec<String>,
    /// Annotations attached to this node.
    pub annotations: Vec<AnnotationRef>,
}

impl Node {
    /// Creates a node with empty adjacency.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }
}
