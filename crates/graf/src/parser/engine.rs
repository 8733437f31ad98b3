//! The push-based graph construction engine.
//!
//! [`GraphParser`] consumes [`SaxEvent`]s one at a time and incrementally
//! populates a [`Graph`]. References may precede their targets in document
//! order, so edges, node→region links, and annotations with unresolved
//! targets are buffered and resolved during finalization, after the whole
//! document (and every declared dependency) has been read.

use rustc_hash::FxHashSet;

use crate::error::ParseError;
use crate::events::{Attributes, SaxEvent};
use crate::model::{
    Anchor, Annotation, DependencyDecl, Edge, Feature, FeatureStructure, Graph, LabelUsage, Region,
    DEFAULT_ANNOTATION_SPACE,
};
use crate::parser::element::{self, ElementKind, GRAF_NAMESPACE};
use crate::parser::{DependencyLoader, ParseOptions};

// ===== PARSE STATE =====

/// An annotation element that is open but not yet committed to its set.
#[derive(Debug)]
struct PendingAnnotation {
    id: Option<String>,
    label: String,
    target: String,
    set_id: String,
    features: Option<FeatureStructure>,
    position: usize,
}

/// An open `f` element whose value sources are still being collected.
#[derive(Debug)]
struct PendingFeature {
    name: String,
    value_attr: Option<String>,
    text: String,
    nested: Option<FeatureStructure>,
}

/// A region element between open and close.
#[derive(Debug)]
struct PendingRegion {
    id: String,
    anchors: Vec<Anchor>,
    node: String,
}

/// A node→region link awaiting resolution at finalization.
#[derive(Debug)]
struct PendingLink {
    node: String,
    targets: Vec<String>,
    position: usize,
}

/// An annotation whose target did not resolve when its element closed.
#[derive(Debug)]
struct PendingTarget {
    set_id: String,
    annotation_id: String,
    target: String,
    position: usize,
}

/// A dependency declaration queued for post-parse resolution.
#[derive(Debug)]
struct QueuedDependency {
    locator: String,
    position: usize,
}

/// Push-based parser building one document's annotation graph.
///
/// Feed events in document order with [`GraphParser::feed`], then call
/// [`GraphParser::finish`] to run finalization (edge attachment, root
/// resolution, dependency merging, deferred target resolution) and take
/// the completed graph. Any error is fatal: the parser poisons itself,
/// later calls return the same error, and the in-progress graph is
/// discarded rather than handed out partially built.
#[derive(Debug)]
pub struct GraphParser {
    options: ParseOptions,
    graph: Graph,
    /// Open-element context, validated against the nesting table.
    stack: Vec<ElementKind>,
    /// Frames of open `fs` elements, innermost last.
    fs_stack: Vec<FeatureStructure>,
    feature_stack: Vec<PendingFeature>,
    current_annotation: Option<PendingAnnotation>,
    /// Most recently opened node; survives the node's close so regions
    /// declared after it still associate with it.
    current_node: Option<String>,
    current_set: Option<String>,
    current_space: Option<String>,
    pending_region: Option<PendingRegion>,
    pending_edges: Vec<Edge>,
    pending_edge_ids: FxHashSet<String>,
    pending_links: Vec<PendingLink>,
    pending_annotations: Vec<PendingTarget>,
    dependencies: Vec<QueuedDependency>,
    root_chars: String,
    /// Index of the event currently being processed.
    position: usize,
    document_closed: bool,
    poisoned: Option<ParseError>,
}

impl GraphParser {
    /// Creates a parser with default options.
    pub fn new() -> Self {
        Self::with_options(ParseOptions::default())
    }

    /// Creates a parser with the given options. Dependency sub-parses
    /// inherit them.
    pub fn with_options(options: ParseOptions) -> Self {
        Self {
            options,
            graph: Graph::new(),
            stack: Vec::new(),
            fs_stack: Vec::new(),
            feature_stack: Vec::new(),
            current_annotation: None,
            current_node: None,
            current_set: None,
            current_space: None,
            pending_region: None,
            pending_edges: Vec::new(),
            pending_edge_ids: FxHashSet::default(),
            pending_links: Vec::new(),
            pending_annotations: Vec::new(),
            dependencies: Vec::new(),
            root_chars: String::new(),
            position: 0,
            document_closed: false,
            poisoned: None,
        }
    }

    /// Processes one event. After an error every further call returns
    /// that same error.
    pub fn feed(&mut self, event: SaxEvent) -> Result<(), ParseError> {
        if let Some(err) = &self.poisoned {
            return Err(err.clone());
        }
        let result = match event {
            SaxEvent::StartElement { name, attrs } => self.start_element(&name, &attrs),
            SaxEvent::Characters(text) => {
                self.characters(&text);
                Ok(())
            }
            SaxEvent::EndElement { name } => self.end_element(&name),
        };
        self.position += 1;
        if let Err(err) = &result {
            self.poisoned = Some(err.clone());
        }
        result
    }

    // ===== EVENT HANDLERS =====

    fn malformed(&self, element: &str, reason: impl Into<String>) -> ParseError {
        ParseError::MalformedDocument {
            element: element.to_string(),
            reason: reason.into(),
            position: self.position,
        }
    }

    fn characters(&mut self, text: &str) {
        match self.stack.last() {
            Some(ElementKind::Feature) => {
                if let Some(feature) = self.feature_stack.last_mut() {
                    feature.text.push_str(text);
                }
            }
            Some(ElementKind::Root) => self.root_chars.push_str(text),
            // Free text is meaningful only inside f and root elements.
            _ => {}
        }
    }

    fn start_element(&mut self, name: &str, attrs: &Attributes) -> Result<(), ParseError> {
        if self.document_closed {
            return Err(self.malformed(name, "content after the closing graph element"));
        }
        let Some(kind) = ElementKind::from_name(name) else {
            return Err(self.malformed(name, "unknown element"));
        };
        let parent = self.stack.last().copied();
        if !kind.may_nest_in(parent) {
            let reason = match parent {
                Some(p) => format!("not allowed inside {}", p.name()),
                None => "only graph may appear at the document top".to_string(),
            };
            return Err(self.malformed(kind.name(), reason));
        }
        match kind {
            ElementKind::Graph => self.open_graph(attrs)?,
            ElementKind::Node => self.open_node(attrs)?,
            ElementKind::Edge => self.open_edge(attrs)?,
            ElementKind::Region => self.open_region(attrs)?,
            ElementKind::Link => self.open_link(attrs)?,
            ElementKind::AnnotationSpace => self.open_space(attrs)?,
            ElementKind::AnnotationSet => self.open_set(attrs)?,
            ElementKind::Annotation => self.open_annotation(attrs)?,
            ElementKind::FeatureStructure => self.open_feature_structure(attrs)?,
            ElementKind::Feature => self.open_feature(attrs)?,
            ElementKind::LabelUsage => self.open_label_usage(attrs)?,
            ElementKind::DependsOn => self.open_depends_on(attrs)?,
            ElementKind::Root => self.root_chars.clear(),
            ElementKind::GraphHeader
            | ElementKind::LabelsDecl
            | ElementKind::Dependencies
            | ElementKind::Roots
            | ElementKind::AnnotationSpaces => {}
        }
        self.stack.push(kind);
        Ok(())
    }

    fn end_element(&mut self, name: &str) -> Result<(), ParseError> {
        let Some(kind) = ElementKind::from_name(name) else {
            return Err(self.malformed(name, "unknown element"));
        };
        match self.stack.last() {
            Some(&top) if top == kind => {}
            Some(&top) => {
                return Err(self.malformed(
                    name,
                    format!("mismatched closing tag, expected {}", top.name()),
                ));
            }
            None => return Err(self.malformed(name, "closing tag without matching open")),
        }
        self.stack.pop();
        match kind {
            ElementKind::Graph => self.document_closed = true,
            ElementKind::Region => self.close_region(),
            ElementKind::Annotation => self.close_annotation()?,
            ElementKind::FeatureStructure => self.close_feature_structure(),
            ElementKind::Feature => self.close_feature()?,
            ElementKind::Root => self.close_root()?,
            ElementKind::AnnotationSet => self.current_set = None,
            ElementKind::AnnotationSpace => self.current_space = None,
            _ => {}
        }
        Ok(())
    }

    fn open_graph(&mut self, attrs: &Attributes) -> Result<(), ParseError> {
        if let Some(ns) = attrs.get(element::XMLNS) {
            if ns != GRAF_NAMESPACE {
                return Err(self.malformed("graph", format!("unexpected namespace {ns}")));
            }
        }
        Ok(())
    }

    fn open_node(&mut self, attrs: &Attributes) -> Result<(), ParseError> {
        let Some(id) = attrs.get(element::XML_ID) else {
            return Err(ParseError::MissingIdentifier {
                element: "node",
                position: self.position,
            });
        };
        self.graph.get_or_add_node(id);
        self.current_node = Some(id.to_string());
        Ok(())
    }

    fn open_edge(&mut self, attrs: &Attributes) -> Result<(), ParseError> {
        let Some(id) = attrs.get(element::XML_ID) else {
            return Err(ParseError::MissingIdentifier {
                element: "edge",
                position: self.position,
            });
        };
        let Some(from) = attrs.get(element::FROM) else {
            return Err(ParseError::MissingEndpoint {
                edge: id.to_string(),
                endpoint: "from",
                position: self.position,
            });
        };
        let Some(to) = attrs.get(element::TO) else {
            return Err(ParseError::MissingEndpoint {
                edge: id.to_string(),
                endpoint: "to",
                position: self.position,
            });
        };
        if !self.pending_edge_ids.insert(id.to_string()) {
            return Err(self.malformed("edge", format!("duplicate edge id {id}")));
        }
        // Placeholder endpoints, so lookups succeed even when a node's
        // own declaring element never appears.
        self.graph.get_or_add_node(from);
        self.graph.get_or_add_node(to);
        let mut edge = Edge::new(id, from, to);
        edge.label = attrs.get(element::LABEL).map(str::to_string);
        self.pending_edges.push(edge);
        Ok(())
    }

    fn open_region(&mut self, attrs: &Attributes) -> Result<(), ParseError> {
        let Some(id) = attrs.get(element::XML_ID) else {
            return Err(ParseError::MissingIdentifier {
                element: "region",
                position: self.position,
            });
        };
        if self.graph.region(id).is_ok() {
            return Err(self.malformed("region", format!("duplicate region id {id}")));
        }
        let Some(anchors_attr) = attrs.get(element::ANCHORS) else {
            return Err(self.malformed("region", "missing anchors attribute"));
        };
        let mut anchors = Vec::new();
        for token in anchors_attr.split_whitespace() {
            let anchor = token.parse::<Anchor>().map_err(|_| {
                self.malformed(
                    "region",
                    format!("anchor {token:?} is not a non-negative integer"),
                )
            })?;
            anchors.push(anchor);
        }
        let node = match attrs.get(element::REF).or(self.current_node.as_deref()) {
            Some(node) => node.to_string(),
            None => {
                return Err(self.malformed(
                    "region",
                    "no node to anchor, missing ref attribute and node context",
                ));
            }
        };
        self.pending_region = Some(PendingRegion {
            id: id.to_string(),
            anchors,
            node,
        });
        Ok(())
    }

    fn open_link(&mut self, attrs: &Attributes) -> Result<(), ParseError> {
        let Some(node) = self.current_node.clone() else {
            return Err(self.malformed("link", "no enclosing node"));
        };
        let Some(targets_attr) = attrs.get(element::TARGETS) else {
            return Err(self.malformed("link", "missing targets attribute"));
        };
        let targets: Vec<String> = targets_attr.split_whitespace().map(str::to_string).collect();
        if targets.is_empty() {
            return Err(self.malformed("link", "empty targets attribute"));
        }
        self.pending_links.push(PendingLink {
            node,
            targets,
            position: self.position,
        });
        Ok(())
    }

    fn open_space(&mut self, attrs: &Attributes) -> Result<(), ParseError> {
        let id = match attrs.get(element::XML_ID).or(attrs.get(element::AS_ID)) {
            Some(id) => id,
            None => {
                return Err(ParseError::MissingIdentifier {
                    element: "annotationSpace",
                    position: self.position,
                });
            }
        };
        self.graph.ensure_space(id);
        self.current_space = Some(id.to_string());
        Ok(())
    }

    fn open_set(&mut self, attrs: &Attributes) -> Result<(), ParseError> {
        let id = match attrs.get(element::XML_ID).or(attrs.get(element::NAME)) {
            Some(id) => id,
            None => {
                return Err(ParseError::MissingIdentifier {
                    element: "annotationSet",
                    position: self.position,
                });
            }
        };
        let set_type = attrs.get(element::TYPE).map(str::to_string);
        match self.current_space.clone() {
            // A declaration under an explicit space is authoritative: it
            // pulls in a set that was auto-created in the default space.
            Some(space) => self.graph.declare_set(id, set_type, &space),
            None => self.graph.ensure_set(id, set_type, DEFAULT_ANNOTATION_SPACE),
        };
        self.current_set = Some(id.to_string());
        Ok(())
    }

    fn open_annotation(&mut self, attrs: &Attributes) -> Result<(), ParseError> {
        let Some(label) = attrs.get(element::LABEL) else {
            return Err(self.malformed("a", "missing label attribute"));
        };
        let Some(target) = attrs.get(element::REF) else {
            return Err(self.malformed("a", "missing ref attribute"));
        };
        let set_id = match attrs.get(element::AS_ATTR).or(self.current_set.as_deref()) {
            Some(set) => set.to_string(),
            None => {
                return Err(self.malformed(
                    "a",
                    "no annotation set, missing as attribute and set context",
                ));
            }
        };
        let space = self
            .current_space
            .clone()
            .unwrap_or_else(|| DEFAULT_ANNOTATION_SPACE.to_string());
        self.graph.ensure_set(&set_id, None, &space);
        self.current_annotation = Some(PendingAnnotation {
            id: attrs.get(element::XML_ID).map(str::to_string),
            label: label.to_string(),
            target: target.to_string(),
            set_id,
            features: None,
            position: self.position,
        });
        Ok(())
    }

    fn open_feature_structure(&mut self, attrs: &Attributes) -> Result<(), ParseError> {
        match self.stack.last() {
            Some(ElementKind::Annotation) => {
                if self
                    .current_annotation
                    .as_ref()
                    .is_some_and(|a| a.features.is_some())
                {
                    return Err(self.malformed("fs", "annotation already has a feature structure"));
                }
            }
            Some(ElementKind::Feature) => {
                if self.feature_stack.last().is_some_and(|f| f.nested.is_some()) {
                    return Err(self.malformed("fs", "feature already has a nested structure"));
                }
            }
            _ => {}
        }
        let fs = match attrs.get(element::TYPE) {
            Some(kind) => FeatureStructure::with_kind(kind),
            None => FeatureStructure::new(),
        };
        self.fs_stack.push(fs);
        Ok(())
    }

    fn open_feature(&mut self, attrs: &Attributes) -> Result<(), ParseError> {
        let Some(name) = attrs.get(element::NAME) else {
            return Err(self.malformed("f", "missing name attribute"));
        };
        self.feature_stack.push(PendingFeature {
            name: name.to_string(),
            value_attr: attrs.get(element::VALUE).map(str::to_string),
            text: String::new(),
            nested: None,
        });
        Ok(())
    }

    fn open_label_usage(&mut self, attrs: &Attributes) -> Result<(), ParseError> {
        let Some(label) = attrs.get(element::LABEL) else {
            return Err(self.malformed("labelUsage", "missing label attribute"));
        };
        let Some(occurs_attr) = attrs.get(element::OCCURS) else {
            return Err(self.malformed("labelUsage", "missing occurs attribute"));
        };
        let occurs = occurs_attr.parse::<u64>().map_err(|_| {
            self.malformed(
                "labelUsage",
                format!("occurs {occurs_attr:?} is not a non-negative integer"),
            )
        })?;
        self.graph.header.label_usage.push(LabelUsage {
            label: label.to_string(),
            occurs,
        });
        Ok(())
    }

    fn open_depends_on(&mut self, attrs: &Attributes) -> Result<(), ParseError> {
        let Some(key) = attrs.get(element::F_ID) else {
            return Err(self.malformed("dependsOn", "missing f.id attribute"));
        };
        let locator = attrs.get(element::REF).unwrap_or(key).to_string();
        self.graph.header.depends.push(DependencyDecl {
            key: key.to_string(),
            locator: locator.clone(),
        });
        self.dependencies.push(QueuedDependency {
            locator,
            position: self.position,
        });
        Ok(())
    }

    fn close_region(&mut self) {
        if let Some(pending) = self.pending_region.take() {
            self.graph
                .attach_region(Region::new(pending.id, pending.anchors, pending.node));
        }
    }

    fn close_annotation(&mut self) -> Result<(), ParseError> {
        let Some(pending) = self.current_annotation.take() else {
            return Ok(());
        };
        let ordinal = self
            .graph
            .annotation_set(&pending.set_id)
            .map(|set| set.len())
            .unwrap_or(0);
        let id = pending
            .id
            .unwrap_or_else(|| format!("{}-a{ordinal}", pending.set_id));
        if self
            .graph
            .annotation_set(&pending.set_id)
            .is_ok_and(|set| set.get(&id).is_some())
        {
            return Err(self.malformed("a", format!("duplicate annotation id {id}")));
        }
        self.graph.push_annotation(
            &pending.set_id,
            Annotation {
                id: id.clone(),
                label: pending.label,
                target: pending.target.clone(),
                target_kind: None,
                features: pending.features,
            },
        );
        match self.graph.resolve_target(&pending.target) {
            Some(kind) => self.graph.attach_annotation(kind, &pending.set_id, &id),
            // Edges stay pending until finalization and dependency
            // targets are not merged yet; retry there.
            None => self.pending_annotations.push(PendingTarget {
                set_id: pending.set_id,
                annotation_id: id,
                target: pending.target,
                position: pending.position,
            }),
        }
        Ok(())
    }

    fn close_feature_structure(&mut self) {
        let Some(fs) = self.fs_stack.pop() else {
            return;
        };
        match self.stack.last() {
            Some(ElementKind::Annotation) => {
                if let Some(ann) = self.current_annotation.as_mut() {
                    ann.features = Some(fs);
                }
            }
            Some(ElementKind::Feature) => {
                if let Some(feature) = self.feature_stack.last_mut() {
                    feature.nested = Some(fs);
                }
            }
            _ => {}
        }
    }

    fn close_feature(&mut self) -> Result<(), ParseError> {
        let Some(pending) = self.feature_stack.pop() else {
            return Ok(());
        };
        let text = pending.text.trim();
        let sources = usize::from(pending.value_attr.is_some())
            + usize::from(!text.is_empty())
            + usize::from(pending.nested.is_some());
        if sources > 1 {
            return Err(self.malformed(
                "f",
                format!("feature {} has conflicting value sources", pending.name),
            ));
        }
        let feature = if let Some(fs) = pending.nested {
            Feature::nested(pending.name, fs)
        } else if let Some(value) = pending.value_attr {
            Feature::atomic(pending.name, value)
        } else {
            Feature::atomic(pending.name, text)
        };
        if let Some(frame) = self.fs_stack.last_mut() {
            frame.set(feature);
        }
        Ok(())
    }

    fn close_root(&mut self) -> Result<(), ParseError> {
        let root = self.root_chars.trim().to_string();
        self.root_chars.clear();
        if root.is_empty() {
            return Err(self.malformed("root", "empty root declaration"));
        }
        // Several root declarations: the last one wins.
        self.graph.header.root_decl = Some(root);
        Ok(())
    }

    // ===== FINALIZATION =====

    /// Completes the parse and returns the graph.
    ///
    /// Runs in order: buffered edges are inserted and linked into both
    /// endpoints' adjacency lists, the declared root is resolved with
    /// create-or-fetch semantics, queued dependencies are recursively
    /// parsed and merged, node→region links and parked annotations are
    /// resolved, and finally, if no root was declared, the first-created
    /// node becomes the root (an empty graph keeps none).
    pub fn finish<L>(self, loader: &mut L) -> Result<Graph, ParseError>
    where
        L: DependencyLoader + ?Sized,
    {
        self.finalize(loader, &mut Vec::new())
    }

    fn finalize<L>(mut self, loader: &mut L, chain: &mut Vec<String>) -> Result<Graph, ParseError>
    where
        L: DependencyLoader + ?Sized,
    {
        if let Some(err) = self.poisoned {
            return Err(err);
        }
        if !self.document_closed {
            return Err(ParseError::MalformedDocument {
                element: "graph".to_string(),
                reason: "event stream ended before the graph element closed".to_string(),
                position: self.position,
            });
        }

        for edge in std::mem::take(&mut self.pending_edges) {
            self.graph.attach_edge(edge);
        }

        if let Some(root) = self.graph.header.root_decl.clone() {
            // A root declaration is a node reference like any other.
            self.graph.get_or_add_node(&root);
            self.graph.set_root(root);
        }

        for dep in std::mem::take(&mut self.dependencies) {
            match Self::resolve_dependency(self.options, loader, &dep, chain) {
                Ok(sub) => {
                    log::debug!("merging dependency {} into graph", dep.locator);
                    self.graph
                        .merge(sub, self.options.merge_policy)
                        .map_err(|err| ParseError::DependencyResolutionFailed {
                            locator: dep.locator.clone(),
                            reason: err.to_string(),
                            position: dep.position,
                        })?;
                }
                Err(err) if self.options.best_effort_dependencies => {
                    log::warn!("skipping dependency {}: {err}", dep.locator);
                }
                Err(err) => return Err(err),
            }
        }

        for link in std::mem::take(&mut self.pending_links) {
            for target in link.targets {
                if self.graph.region(&target).is_err() {
                    return Err(ParseError::UnresolvedTarget {
                        target,
                        position: link.position,
                    });
                }
                self.graph.link_region(&link.node, &target);
            }
        }

        for parked in std::mem::take(&mut self.pending_annotations) {
            match self.graph.resolve_target(&parked.target) {
                Some(kind) => {
                    self.graph
                        .attach_annotation(kind, &parked.set_id, &parked.annotation_id);
                }
                None if self.options.drop_unresolved_annotations => {
                    log::warn!(
                        "annotation {} target {} does not resolve, leaving it unattached",
                        parked.annotation_id,
                        parked.target
                    );
                }
                None => {
                    return Err(ParseError::UnresolvedTarget {
                        target: parked.target,
                        position: parked.position,
                    });
                }
            }
        }

        if self.graph.root_id().is_none() {
            if let Some(first) = self.graph.first_node_id().map(str::to_string) {
                self.graph.set_root(first);
            }
        }

        log::debug!(
            "built graph: {} nodes, {} edges, {} regions",
            self.graph.node_count(),
            self.graph.edge_count(),
            self.graph.region_count()
        );
        Ok(self.graph)
    }

    /// Parses one dependency document with a fresh parser and the same
    /// options. `chain` carries the locators currently being resolved,
    /// so a dependency cycle fails instead of recursing forever.
    fn resolve_dependency<L>(
        options: ParseOptions,
        loader: &mut L,
        dep: &QueuedDependency,
        chain: &mut Vec<String>,
    ) -> Result<Graph, ParseError>
    where
        L: DependencyLoader + ?Sized,
    {
        if chain.iter().any(|seen| seen == &dep.locator) {
            return Err(ParseError::DependencyResolutionFailed {
                locator: dep.locator.clone(),
                reason: "dependency cycle".to_string(),
                position: dep.position,
            });
        }
        let events = loader
            .events(&dep.locator)
            .map_err(|err| ParseError::DependencyResolutionFailed {
                locator: dep.locator.clone(),
                reason: err.to_string(),
                position: dep.position,
            })?;

        chain.push(dep.locator.clone());
        let result = (|| {
            let mut sub = GraphParser::with_options(options);
            for event in events {
                sub.feed(event)?;
            }
            sub.finalize(loader, chain)
        })();
        chain.pop();

        result.map_err(|err| ParseError::DependencyResolutionFailed {
            locator: dep.locator.clone(),
            reason: err.to_string(),
            position: dep.position,
        })
    }
}

impl Default for GraphParser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AnnotationRef, MergePolicy, TargetKind};
    use crate::parser::{parse_events, NoDependencies, StaticLoader};
    use proptest::prelude::*;

    fn graph_open() -> SaxEvent {
        SaxEvent::open("graph").attr("xmlns", GRAF_NAMESPACE)
    }

    fn node(id: &str) -> Vec<SaxEvent> {
        vec![SaxEvent::open("node").attr("xml:id", id), SaxEvent::close("node")]
    }

    fn parse(events: Vec<SaxEvent>) -> Result<Graph, ParseError> {
        parse_events(events, &mut NoDependencies, ParseOptions::default())
    }

    /// Minimal dependency document: one node `id`, one region `id-r`.
    fn dependency_doc(id: &str) -> Vec<SaxEvent> {
        vec![
            graph_open(),
            SaxEvent::open("node").attr("xml:id", id),
            SaxEvent::close("node"),
            SaxEvent::open("region")
                .attr("xml:id", format!("{id}-r"))
                .attr("anchors", "0 4"),
            SaxEvent::close("region"),
            SaxEvent::close("graph"),
        ]
    }

    #[test]
    fn test_concrete_document() {
        let mut events = vec![graph_open()];
        events.extend(node("n0"));
        // e0 appears before n1's declaring element.
        events.push(
            SaxEvent::open("edge")
                .attr("xml:id", "e0")
                .attr("from", "n0")
                .attr("to", "n1"),
        );
        events.push(SaxEvent::close("edge"));
        events.extend(node("n1"));
        events.push(
            SaxEvent::open("region")
                .attr("xml:id", "r0")
                .attr("anchors", "10 20")
                .attr("ref", "n0"),
        );
        events.push(SaxEvent::close("region"));
        events.push(
            SaxEvent::open("a")
                .attr("xml:id", "a0")
                .attr("label", "pos")
                .attr("ref", "n0")
                .attr("as", "s0"),
        );
        events.push(SaxEvent::open("fs"));
        events.push(SaxEvent::open("f").attr("name", "cat").attr("value", "NN"));
        events.push(SaxEvent::close("f"));
        events.push(SaxEvent::close("fs"));
        events.push(SaxEvent::close("a"));
        events.push(SaxEvent::close("graph"));

        let graph = parse(events).unwrap();

        assert_eq!(graph.nodes().count(), 2);
        assert_eq!(graph.node("n0").unwrap().out_edges, ["e0"]);
        assert_eq!(graph.node("n1").unwrap().in_edges, ["e0"]);
        assert_eq!(graph.region("r0").unwrap().anchors, [10, 20]);
        assert_eq!(graph.node("n0").unwrap().regions, ["r0"]);

        let n0 = graph.node("n0").unwrap();
        assert_eq!(n0.annotations, [AnnotationRef::new("s0", "a0")]);
        let ann = graph.annotation_set("s0").unwrap().get("a0").unwrap();
        assert_eq!(ann.label, "pos");
        assert_eq!(ann.target_kind, Some(TargetKind::Node));
        let fs = ann.features.as_ref().unwrap();
        assert_eq!(fs.get("cat").and_then(|f| f.value.as_atomic()), Some("NN"));
    }

    #[test]
    fn test_forward_referenced_edge_links_exactly_once() {
        let mut events = vec![graph_open()];
        events.push(
            SaxEvent::open("edge")
                .attr("xml:id", "e0")
                .attr("from", "n0")
                .attr("to", "n1"),
        );
        events.push(SaxEvent::close("edge"));
        events.extend(node("n0"));
        events.extend(node("n1"));
        events.push(SaxEvent::close("graph"));

        let graph = parse(events).unwrap();
        assert_eq!(graph.node("n0").unwrap().out_edges, ["e0"]);
        assert_eq!(graph.node("n1").unwrap().in_edges, ["e0"]);
        // Node elements seen after the edge reference must not duplicate
        // the placeholder entries.
        assert_eq!(graph.nodes().count(), 2);
    }

    #[test]
    fn test_edge_missing_endpoint() {
        let events = vec![
            graph_open(),
            SaxEvent::open("edge").attr("xml:id", "e0").attr("from", "n0"),
        ];
        let mut parser = GraphParser::new();
        let mut failure = None;
        for event in events {
            if let Err(err) = parser.feed(event) {
                failure = Some(err);
                break;
            }
        }
        assert_eq!(
            failure,
            Some(ParseError::MissingEndpoint {
                edge: "e0".to_string(),
                endpoint: "to",
                position: 1,
            })
        );
        // The poisoned parser never hands out a partial graph.
        let err = parser.finish(&mut NoDependencies).unwrap_err();
        assert!(matches!(err, ParseError::MissingEndpoint { .. }));
    }

    #[test]
    fn test_node_missing_identifier() {
        let err = parse(vec![graph_open(), SaxEvent::open("node")]).unwrap_err();
        assert_eq!(
            err,
            ParseError::MissingIdentifier {
                element: "node",
                position: 1
            }
        );
    }

    #[test]
    fn test_unknown_element_rejected() {
        let err = parse(vec![graph_open(), SaxEvent::open("annotation")]).unwrap_err();
        assert!(matches!(
            err,
            ParseError::MalformedDocument { ref element, .. } if element == "annotation"
        ));
    }

    #[test]
    fn test_misplaced_element_rejected() {
        // node outside any graph
        let err = parse(vec![SaxEvent::open("node").attr("xml:id", "n0")]).unwrap_err();
        assert!(matches!(err, ParseError::MalformedDocument { .. }));

        // f directly under an annotation, without its fs
        let events = vec![
            graph_open(),
            SaxEvent::open("a").attr("label", "pos").attr("ref", "n0").attr("as", "s0"),
            SaxEvent::open("f").attr("name", "cat"),
        ];
        let err = parse(events).unwrap_err();
        assert!(matches!(
            err,
            ParseError::MalformedDocument { ref element, .. } if element == "f"
        ));
    }

    #[test]
    fn test_namespace_checked() {
        let err = parse(vec![SaxEvent::open("graph").attr("xmlns", "http://elsewhere/")])
            .unwrap_err();
        assert!(matches!(
            err,
            ParseError::MalformedDocument { ref element, .. } if element == "graph"
        ));

        // Without the attribute the tokenizer is trusted.
        let graph = parse(vec![SaxEvent::open("graph"), SaxEvent::close("graph")]).unwrap();
        assert_eq!(graph.nodes().count(), 0);
    }

    #[test]
    fn test_root_fallback_is_first_node() {
        let mut events = vec![graph_open()];
        events.extend(node("n3"));
        events.extend(node("n1"));
        events.push(SaxEvent::close("graph"));

        let first = parse(events.clone()).unwrap();
        let second = parse(events).unwrap();
        assert_eq!(first.root_id(), Some("n3"));
        assert_eq!(second.root_id(), Some("n3"));
        assert_eq!(first, second);
    }

    #[test]
    fn test_declared_root_is_created_when_absent() {
        let mut events = vec![
            graph_open(),
            SaxEvent::open("graphHeader"),
            SaxEvent::open("roots"),
            SaxEvent::open("root"),
            SaxEvent::text("  n7\n"),
            SaxEvent::close("root"),
            SaxEvent::close("roots"),
            SaxEvent::close("graphHeader"),
        ];
        events.extend(node("n0"));
        events.push(SaxEvent::close("graph"));

        let graph = parse(events).unwrap();
        assert_eq!(graph.root_id(), Some("n7"));
        assert!(graph.node("n7").is_ok());
        assert_eq!(graph.header.root_decl.as_deref(), Some("n7"));
    }

    #[test]
    fn test_last_root_declaration_wins() {
        let events = vec![
            graph_open(),
            SaxEvent::open("graphHeader"),
            SaxEvent::open("root"),
            SaxEvent::text("n1"),
            SaxEvent::close("root"),
            SaxEvent::open("root"),
            SaxEvent::text("n2"),
            SaxEvent::close("root"),
            SaxEvent::close("graphHeader"),
            SaxEvent::close("graph"),
        ];
        let graph = parse(events).unwrap();
        assert_eq!(graph.root_id(), Some("n2"));
    }

    #[test]
    fn test_empty_root_declaration_rejected() {
        let events = vec![
            graph_open(),
            SaxEvent::open("graphHeader"),
            SaxEvent::open("root"),
            SaxEvent::text("   "),
            SaxEvent::close("root"),
        ];
        let err = parse(events).unwrap_err();
        assert!(matches!(
            err,
            ParseError::MalformedDocument { ref element, .. } if element == "root"
        ));
    }

    #[test]
    fn test_feature_text_content() {
        let mut events = vec![graph_open()];
        events.extend(node("n0"));
        events.push(SaxEvent::open("a").attr("label", "tok").attr("ref", "n0").attr("as", "s0"));
        events.push(SaxEvent::open("fs"));
        events.push(SaxEvent::open("f").attr("name", "base"));
        events.push(SaxEvent::text("  dog "));
        events.push(SaxEvent::close("f"));
        events.push(SaxEvent::close("fs"));
        events.push(SaxEvent::close("a"));
        events.push(SaxEvent::close("graph"));

        let graph = parse(events).unwrap();
        let ann = graph.annotation_set("s0").unwrap().get("s0-a0").unwrap();
        let fs = ann.features.as_ref().unwrap();
        assert_eq!(fs.get("base").and_then(|f| f.value.as_atomic()), Some("dog"));
    }

    #[test]
    fn test_feature_with_conflicting_sources_rejected() {
        let mut events = vec![graph_open()];
        events.extend(node("n0"));
        events.push(SaxEvent::open("a").attr("label", "tok").attr("ref", "n0").attr("as", "s0"));
        events.push(SaxEvent::open("fs"));
        events.push(SaxEvent::open("f").attr("name", "cat").attr("value", "NN"));
        events.push(SaxEvent::text("VB"));
        events.push(SaxEvent::close("f"));

        let err = parse(events).unwrap_err();
        assert!(matches!(
            err,
            ParseError::MalformedDocument { ref element, .. } if element == "f"
        ));
    }

    #[test]
    fn test_second_fs_under_annotation_rejected() {
        let mut events = vec![graph_open()];
        events.extend(node("n0"));
        events.push(SaxEvent::open("a").attr("label", "tok").attr("ref", "n0").attr("as", "s0"));
        events.push(SaxEvent::open("fs"));
        events.push(SaxEvent::close("fs"));
        events.push(SaxEvent::open("fs"));

        let err = parse(events).unwrap_err();
        assert!(matches!(
            err,
            ParseError::MalformedDocument { ref element, .. } if element == "fs"
        ));
    }

    #[test]
    fn test_bare_feature_is_empty_atomic() {
        let mut events = vec![graph_open()];
        events.extend(node("n0"));
        events.push(SaxEvent::open("a").attr("label", "tok").attr("ref", "n0").attr("as", "s0"));
        events.push(SaxEvent::open("fs"));
        events.push(SaxEvent::open("f").attr("name", "flag"));
        events.push(SaxEvent::close("f"));
        events.push(SaxEvent::close("fs"));
        events.push(SaxEvent::close("a"));
        events.push(SaxEvent::close("graph"));

        let graph = parse(events).unwrap();
        let ann = graph.annotation_set("s0").unwrap().get("s0-a0").unwrap();
        let value = ann.features.as_ref().unwrap().get("flag").unwrap();
        assert_eq!(value.value.as_atomic(), Some(""));
    }

    #[test]
    fn test_duplicate_feature_name_replaced_in_place() {
        let mut events = vec![graph_open()];
        events.extend(node("n0"));
        events.push(SaxEvent::open("a").attr("label", "tok").attr("ref", "n0").attr("as", "s0"));
        events.push(SaxEvent::open("fs"));
        events.push(SaxEvent::open("f").attr("name", "cat").attr("value", "NN"));
        events.push(SaxEvent::close("f"));
        events.push(SaxEvent::open("f").attr("name", "num").attr("value", "sg"));
        events.push(SaxEvent::close("f"));
        events.push(SaxEvent::open("f").attr("name", "cat").attr("value", "VB"));
        events.push(SaxEvent::close("f"));
        events.push(SaxEvent::close("fs"));
        events.push(SaxEvent::close("a"));
        events.push(SaxEvent::close("graph"));

        let graph = parse(events).unwrap();
        let ann = graph.annotation_set("s0").unwrap().get("s0-a0").unwrap();
        let fs = ann.features.as_ref().unwrap();
        assert_eq!(fs.len(), 2);
        let names: Vec<&str> = fs.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["cat", "num"]);
        assert_eq!(fs.get("cat").and_then(|f| f.value.as_atomic()), Some("VB"));
    }

    #[test]
    fn test_set_auto_created_in_default_space() {
        let mut events = vec![graph_open()];
        events.extend(node("n0"));
        events.push(SaxEvent::open("a").attr("label", "pos").attr("ref", "n0").attr("as", "s9"));
        events.push(SaxEvent::close("a"));
        events.push(SaxEvent::close("graph"));

        let graph = parse(events).unwrap();
        let set = graph.annotation_set("s9").unwrap();
        assert_eq!(set.space, DEFAULT_ANNOTATION_SPACE);
        assert_eq!(
            graph.annotation_space(DEFAULT_ANNOTATION_SPACE).unwrap().sets,
            ["s9"]
        );
    }

    #[test]
    fn test_annotation_without_set_rejected() {
        let mut events = vec![graph_open()];
        events.extend(node("n0"));
        events.push(SaxEvent::open("a").attr("label", "pos").attr("ref", "n0"));

        let err = parse(events).unwrap_err();
        assert!(matches!(
            err,
            ParseError::MalformedDocument { ref element, .. } if element == "a"
        ));
    }

    #[test]
    fn test_annotation_set_element_provides_context() {
        let mut events = vec![
            graph_open(),
            SaxEvent::open("annotationSpace").attr("as.id", "xces"),
            SaxEvent::open("as").attr("name", "s0").attr("type", "tokens"),
        ];
        events.push(SaxEvent::open("a").attr("label", "tok").attr("ref", "n0"));
        events.push(SaxEvent::close("a"));
        events.push(SaxEvent::close("as"));
        events.push(SaxEvent::close("annotationSpace"));
        events.extend(node("n0"));
        events.push(SaxEvent::close("graph"));

        let graph = parse(events).unwrap();
        let set = graph.annotation_set("s0").unwrap();
        assert_eq!(set.set_type.as_deref(), Some("tokens"));
        assert_eq!(set.space, "xces");
        assert_eq!(set.len(), 1);
        assert_eq!(graph.annotation_space("xces").unwrap().sets, ["s0"]);
        // The target was forward-referenced and resolved at finalization.
        assert_eq!(
            graph.node("n0").unwrap().annotations,
            [AnnotationRef::new("s0", "s0-a0")]
        );
    }

    #[test]
    fn test_set_declaration_moves_auto_created_set_into_space() {
        let mut events = vec![graph_open()];
        events.extend(node("n0"));
        // The as attribute auto-creates s0 in the default space.
        events.push(SaxEvent::open("a").attr("label", "pos").attr("ref", "n0").attr("as", "s0"));
        events.push(SaxEvent::close("a"));
        events.push(SaxEvent::open("annotationSpace").attr("as.id", "xces"));
        events.push(SaxEvent::open("as").attr("name", "s0").attr("type", "tokens"));
        events.push(SaxEvent::close("as"));
        events.push(SaxEvent::close("annotationSpace"));
        events.push(SaxEvent::close("graph"));

        let graph = parse(events).unwrap();
        let set = graph.annotation_set("s0").unwrap();
        assert_eq!(set.space, "xces");
        assert_eq!(set.set_type.as_deref(), Some("tokens"));
        assert_eq!(graph.annotation_space("xces").unwrap().sets, ["s0"]);
        assert!(graph
            .annotation_space(DEFAULT_ANNOTATION_SPACE)
            .unwrap()
            .sets
            .is_empty());
        // The annotation recorded before the declaration stays put.
        assert_eq!(
            graph.node("n0").unwrap().annotations,
            [AnnotationRef::new("s0", "s0-a0")]
        );
    }

    #[test]
    fn test_annotation_on_edge_resolves_after_finalization() {
        let mut events = vec![graph_open()];
        events.extend(node("n0"));
        events.extend(node("n1"));
        events.push(
            SaxEvent::open("edge")
                .attr("xml:id", "e0")
                .attr("from", "n0")
                .attr("to", "n1"),
        );
        events.push(SaxEvent::close("edge"));
        events.push(SaxEvent::open("a").attr("label", "dep").attr("ref", "e0").attr("as", "s0"));
        events.push(SaxEvent::close("a"));
        events.push(SaxEvent::close("graph"));

        let graph = parse(events).unwrap();
        let edge = graph.edge("e0").unwrap();
        assert_eq!(edge.annotations, [AnnotationRef::new("s0", "s0-a0")]);
        let ann = graph.annotation_set("s0").unwrap().get("s0-a0").unwrap();
        assert_eq!(ann.target_kind, Some(TargetKind::Edge));
    }

    #[test]
    fn test_unresolved_annotation_target_fails() {
        let mut events = vec![graph_open()];
        events.extend(node("n0"));
        events.push(SaxEvent::open("a").attr("label", "pos").attr("ref", "ghost").attr("as", "s0"));
        events.push(SaxEvent::close("a"));
        events.push(SaxEvent::close("graph"));

        let err = parse(events).unwrap_err();
        assert!(matches!(
            err,
            ParseError::UnresolvedTarget { ref target, .. } if target == "ghost"
        ));
    }

    #[test]
    fn test_unresolved_annotation_dropped_when_opted_in() {
        let mut events = vec![graph_open()];
        events.extend(node("n0"));
        events.push(SaxEvent::open("a").attr("label", "pos").attr("ref", "ghost").attr("as", "s0"));
        events.push(SaxEvent::close("a"));
        events.push(SaxEvent::close("graph"));

        let options = ParseOptions {
            drop_unresolved_annotations: true,
            ..ParseOptions::default()
        };
        let graph = parse_events(events, &mut NoDependencies, options).unwrap();
        // The annotation stays in its set, unattached.
        let ann = graph.annotation_set("s0").unwrap().get("s0-a0").unwrap();
        assert_eq!(ann.target_kind, None);
        assert!(graph.node("n0").unwrap().annotations.is_empty());
    }

    #[test]
    fn test_link_resolves_region_declared_later() {
        let mut events = vec![graph_open()];
        events.push(SaxEvent::open("node").attr("xml:id", "n0"));
        events.push(SaxEvent::open("link").attr("targets", "r0 r1"));
        events.push(SaxEvent::close("link"));
        events.push(SaxEvent::close("node"));
        events.push(
            SaxEvent::open("region")
                .attr("xml:id", "r0")
                .attr("anchors", "0 5")
                .attr("ref", "n0"),
        );
        events.push(SaxEvent::close("region"));
        events.push(
            SaxEvent::open("region")
                .attr("xml:id", "r1")
                .attr("anchors", "5 9")
                .attr("ref", "n0"),
        );
        events.push(SaxEvent::close("region"));
        events.push(SaxEvent::close("graph"));

        let graph = parse(events).unwrap();
        assert_eq!(graph.node("n0").unwrap().regions, ["r0", "r1"]);
    }

    #[test]
    fn test_link_to_unknown_region_fails() {
        let mut events = vec![graph_open()];
        events.push(SaxEvent::open("node").attr("xml:id", "n0"));
        events.push(SaxEvent::open("link").attr("targets", "r9"));
        events.push(SaxEvent::close("link"));
        events.push(SaxEvent::close("node"));
        events.push(SaxEvent::close("graph"));

        let err = parse(events).unwrap_err();
        assert!(matches!(
            err,
            ParseError::UnresolvedTarget { ref target, .. } if target == "r9"
        ));
    }

    #[test]
    fn test_region_uses_most_recent_node_context() {
        let mut events = vec![graph_open()];
        events.extend(node("n0"));
        events.push(SaxEvent::open("region").attr("xml:id", "r0").attr("anchors", "1 2"));
        events.push(SaxEvent::close("region"));
        events.push(SaxEvent::close("graph"));

        let graph = parse(events).unwrap();
        assert_eq!(graph.region("r0").unwrap().node, "n0");
        assert_eq!(graph.node("n0").unwrap().regions, ["r0"]);
    }

    #[test]
    fn test_region_without_node_rejected() {
        let events = vec![
            graph_open(),
            SaxEvent::open("region").attr("xml:id", "r0").attr("anchors", "1 2"),
        ];
        let err = parse(events).unwrap_err();
        assert!(matches!(
            err,
            ParseError::MalformedDocument { ref element, .. } if element == "region"
        ));
    }

    #[test]
    fn test_non_numeric_anchor_rejected() {
        let mut events = vec![graph_open()];
        events.extend(node("n0"));
        events.push(SaxEvent::open("region").attr("xml:id", "r0").attr("anchors", "10 twenty"));

        let err = parse(events).unwrap_err();
        assert!(matches!(
            err,
            ParseError::MalformedDocument { ref element, ref reason, .. }
                if element == "region" && reason.contains("twenty")
        ));
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let mut events = vec![graph_open()];
        events.push(
            SaxEvent::open("edge").attr("xml:id", "e0").attr("from", "n0").attr("to", "n1"),
        );
        events.push(SaxEvent::close("edge"));
        events.push(
            SaxEvent::open("edge").attr("xml:id", "e0").attr("from", "n1").attr("to", "n0"),
        );
        let err = parse(events).unwrap_err();
        assert!(matches!(
            err,
            ParseError::MalformedDocument { ref element, .. } if element == "edge"
        ));

        let mut events = vec![graph_open()];
        events.extend(node("n0"));
        events.push(SaxEvent::open("region").attr("xml:id", "r0").attr("anchors", "0 1"));
        events.push(SaxEvent::close("region"));
        events.push(SaxEvent::open("region").attr("xml:id", "r0").attr("anchors", "2 3"));
        let err = parse(events).unwrap_err();
        assert!(matches!(
            err,
            ParseError::MalformedDocument { ref element, .. } if element == "region"
        ));

        let mut events = vec![graph_open()];
        events.extend(node("n0"));
        events.push(SaxEvent::open("a").attr("xml:id", "a0").attr("label", "x").attr("ref", "n0").attr("as", "s0"));
        events.push(SaxEvent::close("a"));
        events.push(SaxEvent::open("a").attr("xml:id", "a0").attr("label", "y").attr("ref", "n0").attr("as", "s0"));
        events.push(SaxEvent::close("a"));
        let err = parse(events).unwrap_err();
        assert!(matches!(
            err,
            ParseError::MalformedDocument { ref element, .. } if element == "a"
        ));
    }

    #[test]
    fn test_header_bookkeeping() {
        let events = vec![
            graph_open(),
            SaxEvent::open("graphHeader"),
            SaxEvent::open("labelsDecl"),
            SaxEvent::open("labelUsage").attr("label", "tok").attr("occurs", "1250"),
            SaxEvent::close("labelUsage"),
            SaxEvent::close("labelsDecl"),
            SaxEvent::open("dependencies"),
            SaxEvent::open("dependsOn").attr("f.id", "f.seg").attr("ref", "seg.xml"),
            SaxEvent::close("dependsOn"),
            SaxEvent::close("dependencies"),
            SaxEvent::close("graphHeader"),
            SaxEvent::close("graph"),
        ];

        let mut loader = StaticLoader::new();
        loader.insert("seg.xml", vec![SaxEvent::open("graph"), SaxEvent::close("graph")]);
        let graph = parse_events(events, &mut loader, ParseOptions::default()).unwrap();

        assert_eq!(graph.header.label_usage.len(), 1);
        assert_eq!(graph.header.label_usage[0].label, "tok");
        assert_eq!(graph.header.label_usage[0].occurs, 1250);
        assert_eq!(graph.header.depends.len(), 1);
        assert_eq!(graph.header.depends[0].key, "f.seg");
        assert_eq!(graph.header.depends[0].locator, "seg.xml");
    }

    #[test]
    fn test_bad_label_usage_count_rejected() {
        let events = vec![
            graph_open(),
            SaxEvent::open("graphHeader"),
            SaxEvent::open("labelsDecl"),
            SaxEvent::open("labelUsage").attr("label", "tok").attr("occurs", "many"),
        ];
        let err = parse(events).unwrap_err();
        assert!(matches!(
            err,
            ParseError::MalformedDocument { ref element, .. } if element == "labelUsage"
        ));
    }

    #[test]
    fn test_dependency_merged_before_target_resolution() {
        let mut events = vec![
            graph_open(),
            SaxEvent::open("graphHeader"),
            SaxEvent::open("dependsOn").attr("f.id", "f.seg"),
            SaxEvent::close("dependsOn"),
            SaxEvent::close("graphHeader"),
        ];
        events.extend(node("n0"));
        // Links and annotations may target entities of the dependency.
        events.push(SaxEvent::open("node").attr("xml:id", "n1"));
        events.push(SaxEvent::open("link").attr("targets", "seg-r"));
        events.push(SaxEvent::close("link"));
        events.push(SaxEvent::close("node"));
        events.push(SaxEvent::open("a").attr("label", "pos").attr("ref", "seg").attr("as", "s0"));
        events.push(SaxEvent::close("a"));
        events.push(SaxEvent::close("graph"));

        let mut loader = StaticLoader::new();
        loader.insert("f.seg", dependency_doc("seg"));
        let graph = parse_events(events, &mut loader, ParseOptions::default()).unwrap();

        assert!(graph.node("seg").is_ok());
        assert_eq!(graph.region("seg-r").unwrap().anchors, [0, 4]);
        assert_eq!(graph.node("n1").unwrap().regions, ["seg-r"]);
        assert_eq!(
            graph.node("seg").unwrap().annotations,
            [AnnotationRef::new("s0", "s0-a0")]
        );
        // Root comes from this document, not the dependency.
        assert_eq!(graph.root_id(), Some("n0"));
    }

    #[test]
    fn test_dependency_failure_is_fatal_by_default() {
        let events = vec![
            graph_open(),
            SaxEvent::open("graphHeader"),
            SaxEvent::open("dependsOn").attr("f.id", "f.seg"),
            SaxEvent::close("dependsOn"),
            SaxEvent::close("graphHeader"),
            SaxEvent::close("graph"),
        ];
        let err = parse(events).unwrap_err();
        assert!(matches!(
            err,
            ParseError::DependencyResolutionFailed { ref locator, .. } if locator == "f.seg"
        ));
    }

    #[test]
    fn test_best_effort_skips_failed_dependency() {
        let mut events = vec![
            graph_open(),
            SaxEvent::open("graphHeader"),
            SaxEvent::open("dependsOn").attr("f.id", "f.seg"),
            SaxEvent::close("dependsOn"),
            SaxEvent::close("graphHeader"),
        ];
        events.extend(node("n0"));
        events.push(SaxEvent::close("graph"));

        let options = ParseOptions {
            best_effort_dependencies: true,
            ..ParseOptions::default()
        };
        let graph = parse_events(events, &mut NoDependencies, options).unwrap();
        assert_eq!(graph.nodes().count(), 1);
        // The declaration is still recorded even though resolution was skipped.
        assert_eq!(graph.header.depends[0].key, "f.seg");
    }

    #[test]
    fn test_dependency_cycle_detected() {
        let cyclic = vec![
            graph_open(),
            SaxEvent::open("graphHeader"),
            SaxEvent::open("dependsOn").attr("f.id", "f.loop"),
            SaxEvent::close("dependsOn"),
            SaxEvent::close("graphHeader"),
            SaxEvent::close("graph"),
        ];
        let mut loader = StaticLoader::new();
        loader.insert("f.loop", cyclic.clone());

        let err = parse_events(cyclic, &mut loader, ParseOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            ParseError::DependencyResolutionFailed { ref locator, .. } if locator == "f.loop"
        ));
    }

    #[test]
    fn test_dependency_merge_conflict_surfaces() {
        let mut events = vec![
            graph_open(),
            SaxEvent::open("graphHeader"),
            SaxEvent::open("dependsOn").attr("f.id", "f.other"),
            SaxEvent::close("dependsOn"),
            SaxEvent::close("graphHeader"),
        ];
        events.push(
            SaxEvent::open("edge").attr("xml:id", "e0").attr("from", "n0").attr("to", "n1"),
        );
        events.push(SaxEvent::close("edge"));
        events.push(SaxEvent::close("graph"));

        let mut conflicting = vec![graph_open()];
        conflicting.push(
            SaxEvent::open("edge").attr("xml:id", "e0").attr("from", "n0").attr("to", "n2"),
        );
        conflicting.push(SaxEvent::close("edge"));
        conflicting.push(SaxEvent::close("graph"));

        let mut loader = StaticLoader::new();
        loader.insert("f.other", conflicting);

        let options = ParseOptions {
            merge_policy: MergePolicy::ErrorOnConflict,
            ..ParseOptions::default()
        };
        let err = parse_events(events, &mut loader, options).unwrap_err();
        assert!(matches!(
            err,
            ParseError::DependencyResolutionFailed { ref locator, .. } if locator == "f.other"
        ));
    }

    #[test]
    fn test_stray_characters_ignored() {
        let events = vec![
            SaxEvent::text("\n"),
            graph_open(),
            SaxEvent::text("\n  "),
            SaxEvent::open("node").attr("xml:id", "n0"),
            SaxEvent::close("node"),
            SaxEvent::text("\n"),
            SaxEvent::close("graph"),
            SaxEvent::text("\n"),
        ];
        let graph = parse(events).unwrap();
        assert_eq!(graph.nodes().count(), 1);
    }

    #[test]
    fn test_events_after_close_rejected() {
        let events = vec![
            graph_open(),
            SaxEvent::close("graph"),
            SaxEvent::open("node").attr("xml:id", "n0"),
        ];
        let err = parse(events).unwrap_err();
        assert!(matches!(
            err,
            ParseError::MalformedDocument { ref reason, .. }
                if reason.contains("after the closing graph")
        ));
    }

    #[test]
    fn test_mismatched_close_rejected() {
        let events = vec![
            graph_open(),
            SaxEvent::open("node").attr("xml:id", "n0"),
            SaxEvent::close("graph"),
        ];
        let err = parse(events).unwrap_err();
        assert!(matches!(
            err,
            ParseError::MalformedDocument { ref reason, .. } if reason.contains("mismatched")
        ));
    }

    #[test]
    fn test_truncated_stream_rejected() {
        let mut parser = GraphParser::new();
        parser.feed(graph_open()).unwrap();
        let err = parser.finish(&mut NoDependencies).unwrap_err();
        assert!(matches!(
            err,
            ParseError::MalformedDocument { ref reason, .. } if reason.contains("ended before")
        ));
    }

    #[test]
    fn test_empty_graph() {
        let graph = parse(vec![graph_open(), SaxEvent::close("graph")]).unwrap();
        assert_eq!(graph.nodes().count(), 0);
        assert_eq!(graph.root_id(), None);
    }

    proptest! {
        #[test]
        fn test_anchor_tokenization_round_trips(
            anchors in proptest::collection::vec(any::<u32>(), 1..8)
        ) {
            let rendered = anchors
                .iter()
                .map(|a| a.to_string())
                .collect::<Vec<_>>()
                .join(" ");
            let mut events = vec![graph_open()];
            events.extend(node("n0"));
            events.push(SaxEvent::open("region").attr("xml:id", "r0").attr("anchors", rendered));
            events.push(SaxEvent::close("region"));
            events.push(SaxEvent::close("graph"));

            let graph = parse(events).unwrap();
            let expected: Vec<Anchor> = anchors.iter().map(|&a| Anchor::from(a)).collect();
            prop_assert_eq!(&graph.region("r0").unwrap().anchors, &expected);
        }

        #[test]
        fn test_feature_nesting_depth_preserved(depth in 1usize..12) {
            let mut events = vec![graph_open()];
            events.extend(node("n0"));
            events.push(
                SaxEvent::open("a").attr("label", "deep").attr("ref", "n0").attr("as", "s0"),
            );
            events.push(SaxEvent::open("fs"));
            for _ in 1..depth {
                events.push(SaxEvent::open("f").attr("name", "sub"));
                events.push(SaxEvent::open("fs"));
            }
            events.push(SaxEvent::open("f").attr("name", "leaf").attr("value", "NN"));
            events.push(SaxEvent::close("f"));
            for _ in 1..depth {
                events.push(SaxEvent::close("fs"));
                events.push(SaxEvent::close("f"));
            }
            events.push(SaxEvent::close("fs"));
            events.push(SaxEvent::close("a"));
            events.push(SaxEvent::close("graph"));

            let graph = parse(events).unwrap();
            let set = graph.annotation_set("s0").unwrap();
            let ann = set.iter().next().unwrap();
            let mut fs = ann.features.as_ref().unwrap();
            let mut seen = 1usize;
            loop {
                if let Some(leaf) = fs.get("leaf") {
                    // Atomic and nested are mutually exclusive.
                    prop_assert_eq!(leaf.value.as_atomic(), Some("NN"));
                    prop_assert!(leaf.value.as_nested().is_none());
                    break;
                }
                let sub = fs.get("sub").unwrap();
                prop_assert!(sub.value.as_atomic().is_none());
                fs = sub.value.as_nested().unwrap();
                seen += 1;
            }
            prop_assert_eq!(seen, depth);
        }
    }
}
