//! Data model types for annotation graphs.
//!
//! This module contains all the core types a parsed document materializes
//! into:
//! - Nodes, edges, and regions (the graph structure over primary data)
//! - Annotations, sets, and spaces (labels and feature content)
//! - Feature structures (possibly nested attribute-value content)
//! - The graph aggregate itself, with id lookup and merging

pub mod annotation;
pub mod edge;
pub mod feature;
pub mod graph;
pub mod header;
pub mod node;
pub mod region;

pub use annotation::{
    Annotation, AnnotationRef, AnnotationSet, AnnotationSpace, TargetKind, DEFAULT_ANNOTATION_SPACE,
};
pub use edge::Edge;
pub use feature::{Feature, FeatureStructure, FeatureValue};
pub use graph::{Graph, MergePolicy};
pub use header::{DependencyDecl, Header, LabelUsage};
pub use node::Node;
pub use region::{Anchor, Region};
