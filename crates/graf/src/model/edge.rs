//! Directed edges between nodes.

use crate::model::AnnotationRef;

/// A directed arc between two nodes.
///
/// Edges are fully described at parse time but held in a pending buffer
/// until finalization; only then are they inserted into the graph and
/// linked into both endpoints' adjacency lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub id: String,
    /// Source node id.
    pub from: String,
    /// Target node id.
    pub to: String,
    /// Optional type label.
    pub label: Option<String>,
    /// Annotations attached to this edge.
    pub annotations: Vec<AnnotationRef>,
}

impl Edge {
    /// Creates an unlabeled edge with no annotations.
    pub fn new(id: impl Into<String>, from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            from: from.into(),
            to: to.into(),
            label: None,
            annotations: Vec::new(),
        }
    }
}
