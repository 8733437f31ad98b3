//! GrAF: standoff annotation graphs for linguistic data.
//!
//! This crate parses the GrAF 1.0 serialization (ISO 24612 / XCES standoff
//! annotation) into an in-memory annotation graph usable by downstream
//! linguistic tooling.
//!
//! # Overview
//!
//! GrAF represents annotations as a graph over primary data:
//! - **Standoff**: annotations live apart from the text, anchored through
//!   regions of the primary data
//! - **Layered**: documents declare dependencies on other documents, and
//!   their graphs are merged during parsing
//! - **Structured**: annotation content is a feature structure, nesting to
//!   arbitrary depth
//!
//! # Quick Start
//!
//! ```rust
//! use graf::{parse_standalone, SaxEvent, GRAF_NAMESPACE};
//!
//! // Events normally come from a streaming XML tokenizer; they can be
//! // built by hand just as well.
//! let events = vec![
//!     SaxEvent::open("graph").attr("xmlns", GRAF_NAMESPACE),
//!     SaxEvent::open("node").attr("xml:id", "n0"),
//!     SaxEvent::close("node"),
//!     // Edges may reference nodes declared later in the document.
//!     SaxEvent::open("edge").attr("xml:id", "e0").attr("from", "n0").attr("to", "n1"),
//!     SaxEvent::close("edge"),
//!     SaxEvent::open("node").attr("xml:id", "n1"),
//!     SaxEvent::close("node"),
//!     SaxEvent::open("a").attr("label", "pos").attr("ref", "n0").attr("as", "penn"),
//!     SaxEvent::open("fs"),
//!     SaxEvent::open("f").attr("name", "cat").attr("value", "NN"),
//!     SaxEvent::close("f"),
//!     SaxEvent::close("fs"),
//!     SaxEvent::close("a"),
//!     SaxEvent::close("graph"),
//! ];
//!
//! let graph = parse_standalone(events).unwrap();
//! assert_eq!(graph.node("n0").unwrap().out_edges, ["e0"]);
//! assert_eq!(graph.node("n1").unwrap().in_edges, ["e0"]);
//! assert_eq!(graph.root_id(), Some("n0"));
//! ```
//!
//! # Modules
//!
//! - [`model`]: Core data types (Graph, Node, Edge, Region, annotations,
//!   feature structures)
//! - [`parser`]: The push-based parser, its options, and dependency loading
//! - [`events`]: The SAX-style event contract consumed by the parser
//! - [`error`]: Error types
//!
//! # Event sources
//!
//! The crate does not tokenize XML. Any producer of well-formed,
//! namespace-resolved [`SaxEvent`]s works: a streaming XML reader, a corpus
//! index, or a test fixture. Attribute lookup distinguishes absent from
//! empty, so the parser can enforce required attributes precisely.
//!
//! # Dependencies between documents
//!
//! GrAF documents reference other documents (`dependsOn` in the header).
//! When a parse reaches finalization, each declared dependency is fetched
//! through a caller-supplied [`DependencyLoader`], parsed recursively, and
//! merged into the current graph under a configurable conflict policy.

pub mod error;
pub mod events;
pub mod model;
pub mod parser;

// Re-export commonly used types at crate root
pub use error::{GraphError, ParseError};
pub use events::{Attributes, SaxEvent};
pub use model::{
    Anchor, Annotation, AnnotationRef, AnnotationSet, AnnotationSpace, DependencyDecl, Edge,
    Feature, FeatureStructure, FeatureValue, Graph, Header, LabelUsage, MergePolicy, Node, Region,
    TargetKind, DEFAULT_ANNOTATION_SPACE,
};
pub use parser::{
    parse_events, parse_standalone, DependencyLoader, GraphParser, NoDependencies, ParseOptions,
    StaticLoader, GRAF_NAMESPACE,
};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// GrAF format version this crate parses.
pub const GRAF_VERSION: &str = "1.0";
