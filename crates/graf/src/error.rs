//! Error types for GrAF parsing and graph lookups.

use thiserror::Error;

/// Error raised while folding the event stream into a graph.
///
/// Every variant is fatal to the document being parsed: the in-progress
/// graph is discarded and never handed to the caller. `position` is the
/// zero-based index of the offending event in the stream, where one is
/// available.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Structurally invalid event sequence, unexpected nesting, or a
    /// malformed attribute value.
    #[error("malformed document: {reason} in <{element}> (event {position})")]
    MalformedDocument {
        element: String,
        reason: String,
        position: usize,
    },

    /// A required identifier attribute is absent.
    #[error("<{element}> is missing its identifier attribute (event {position})")]
    MissingIdentifier {
        element: &'static str,
        position: usize,
    },

    /// An edge element lacks one of its endpoint references.
    #[error("edge {edge:?} is missing its {endpoint} endpoint (event {position})")]
    MissingEndpoint {
        edge: String,
        endpoint: &'static str,
        position: usize,
    },

    /// An annotation or link references an identifier that matches no
    /// node, edge, or region, even after finalization and dependency merges.
    #[error("target {target:?} does not resolve to any node, edge, or region (event {position})")]
    UnresolvedTarget { target: String, position: usize },

    /// A declared dependency document could not be fetched, parsed, or
    /// merged. The underlying cause is carried as a rendered message.
    #[error("failed to resolve dependency {locator:?}: {reason} (event {position})")]
    DependencyResolutionFailed {
        locator: String,
        reason: String,
        position: usize,
    },
}

/// Error raised by graph-level operations after construction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// Lookup of an identifier that is not present in the graph.
    #[error("no {category} with id {id:?}")]
    NotFound { category: &'static str, id: String },

    /// Two graphs being merged disagree on the content of a shared
    /// identifier and the merge policy rejects conflicts.
    #[error("merge conflict on {category} {id:?}")]
    MergeConflict { category: &'static str, id: String },
}
