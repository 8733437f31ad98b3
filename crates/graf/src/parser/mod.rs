//! Event-stream parsing.
//!
//! The parser consumes SAX-style events produced elsewhere (an XML
//! tokenizer, a test fixture, a corpus index) and folds them into a
//! [`Graph`]. Dependency documents declared in a header are obtained
//! through a caller-supplied [`DependencyLoader`] and merged in during
//! finalization.

mod element;
mod engine;

pub use element::GRAF_NAMESPACE;
pub use engine::GraphParser;

use rustc_hash::FxHashMap;

use crate::error::ParseError;
use crate::events::SaxEvent;
use crate::model::{Graph, MergePolicy};

/// Knobs for a parse run. Dependency sub-parses inherit them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseOptions {
    /// Skip dependencies that fail to load, parse, or merge instead of
    /// failing the whole document. Skipped dependencies are logged.
    pub best_effort_dependencies: bool,
    /// Leave annotations whose target never resolves unattached in their
    /// set instead of failing with `UnresolvedTarget`.
    pub drop_unresolved_annotations: bool,
    /// Conflict policy applied when dependency graphs are merged in.
    pub merge_policy: MergePolicy,
}

impl ParseOptions {
    /// Default options: strict dependencies, strict targets, prefer-first
    /// merging.
    pub fn new() -> Self {
        Self::default()
    }
}

/// Supplies the event stream of a dependency document.
///
/// Locators come from `dependsOn` declarations; how one maps to a
/// document (file path, corpus lookup, remote fetch) is the caller's
/// concern. The parser only consumes the resulting events.
pub trait DependencyLoader {
    /// Returns the events of the document named by `locator`.
    fn events(
        &mut self,
        locator: &str,
    ) -> Result<Vec<SaxEvent>, Box<dyn std::error::Error + Send + Sync>>;
}

/// Loader for self-contained documents; every lookup fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDependencies;

impl DependencyLoader for NoDependencies {
    fn events(
        &mut self,
        locator: &str,
    ) -> Result<Vec<SaxEvent>, Box<dyn std::error::Error + Send + Sync>> {
        Err(format!("no loader configured for dependency {locator}").into())
    }
}

/// In-memory loader mapping locators to pre-tokenized event streams.
#[derive(Debug, Clone, Default)]
pub struct StaticLoader {
    documents: FxHashMap<String, Vec<SaxEvent>>,
}

impl StaticLoader {
    /// Creates an empty loader.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the events served for `locator`.
    pub fn insert(&mut self, locator: impl Into<String>, events: Vec<SaxEvent>) {
        self.documents.insert(locator.into(), events);
    }
}

impl DependencyLoader for StaticLoader {
    fn events(
        &mut self,
        locator: &str,
    ) -> Result<Vec<SaxEvent>, Box<dyn std::error::Error + Send + Sync>> {
        self.documents
            .get(locator)
            .cloned()
            .ok_or_else(|| format!("unknown dependency {locator}").into())
    }
}

/// Parses a complete event stream into a graph.
pub fn parse_events<L>(
    events: impl IntoIterator<Item = SaxEvent>,
    loader: &mut L,
    options: ParseOptions,
) -> Result<Graph, ParseError>
where
    L: DependencyLoader + ?Sized,
{
    let mut parser = GraphParser::with_options(options);
    for event in events {
        parser.feed(event)?;
    }
    parser.finish(loader)
}

/// Parses a self-contained document with default options. Declared
/// dependencies make the parse fail; use [`parse_events`] with a real
/// loader for documents that have them.
pub fn parse_standalone(events: impl IntoIterator<Item = SaxEvent>) -> Result<Graph, ParseError> {
    parse_events(events, &mut NoDependencies, ParseOptions::default())
}
