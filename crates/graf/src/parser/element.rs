//! Element vocabulary of the GrAF serialization.
//!
//! Start and end events carry element names as strings; everything after
//! the first lookup works on [`ElementKind`], so dispatch and nesting
//! checks are enum matches rather than repeated string comparisons.

/// Namespace identifying a GrAF standoff document.
pub const GRAF_NAMESPACE: &str = "http://www.xces.org/ns/GrAF/1.0/";

pub(crate) const XMLNS: &str = "xmlns";
pub(crate) const XML_ID: &str = "xml:id";
pub(crate) const FROM: &str = "from";
pub(crate) const TO: &str = "to";
pub(crate) const LABEL: &str = "label";
pub(crate) const ANCHORS: &str = "anchors";
pub(crate) const REF: &str = "ref";
pub(crate) const TARGETS: &str = "targets";
pub(crate) const NAME: &str = "name";
pub(crate) const VALUE: &str = "value";
pub(crate) const TYPE: &str = "type";
pub(crate) const AS_ATTR: &str = "as";
pub(crate) const AS_ID: &str = "as.id";
pub(crate) const F_ID: &str = "f.id";
pub(crate) const OCCURS: &str = "occurs";

/// One element of the GrAF vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ElementKind {
    Graph,
    GraphHeader,
    LabelsDecl,
    LabelUsage,
    Dependencies,
    DependsOn,
    Roots,
    Root,
    AnnotationSpaces,
    AnnotationSpace,
    AnnotationSet,
    Node,
    Link,
    Edge,
    Region,
    Annotation,
    FeatureStructure,
    Feature,
}

impl ElementKind {
    /// Maps an element name to its kind. `as` is the legacy alias for
    /// `annotationSet`. Unknown names yield `None`.
    pub(crate) fn from_name(name: &str) -> Option<Self> {
        let kind = match name {
            "graph" => Self::Graph,
            "graphHeader" => Self::GraphHeader,
            "labelsDecl" => Self::LabelsDecl,
            "labelUsage" => Self::LabelUsage,
            "dependencies" => Self::Dependencies,
            "dependsOn" => Self::DependsOn,
            "roots" => Self::Roots,
            "root" => Self::Root,
            "annotationSpaces" => Self::AnnotationSpaces,
            "annotationSpace" => Self::AnnotationSpace,
            "annotationSet" | "as" => Self::AnnotationSet,
            "node" => Self::Node,
            "link" => Self::Link,
            "edge" => Self::Edge,
            "region" => Self::Region,
            "a" => Self::Annotation,
            "fs" => Self::FeatureStructure,
            "f" => Self::Feature,
            _ => return None,
        };
        Some(kind)
    }

    /// Canonical element name.
    pub(crate) fn name(self) -> &'static str {
        match self {
            Self::Graph => "graph",
            Self::GraphHeader => "graphHeader",
            Self::LabelsDecl => "labelsDecl",
            Self::LabelUsage => "labelUsage",
            Self::Dependencies => "dependencies",
            Self::DependsOn => "dependsOn",
            Self::Roots => "roots",
            Self::Root => "root",
            Self::AnnotationSpaces => "annotationSpaces",
            Self::AnnotationSpace => "annotationSpace",
            Self::AnnotationSet => "annotationSet",
            Self::Node => "node",
            Self::Link => "link",
            Self::Edge => "edge",
            Self::Region => "region",
            Self::Annotation => "a",
            Self::FeatureStructure => "fs",
            Self::Feature => "f",
        }
    }

    /// Whether this element may open directly under `parent`.
    /// `None` is the document top, where only `graph` is allowed.
    pub(crate) fn may_nest_in(self, parent: Option<ElementKind>) -> bool {
        use ElementKind::*;
        match self {
            Graph => parent.is_none(),
            GraphHeader => parent == Some(Graph),
            LabelsDecl => parent == Some(GraphHeader),
            LabelUsage => parent == Some(LabelsDecl),
            Dependencies => parent == Some(GraphHeader),
            DependsOn => matches!(parent, Some(GraphHeader | Dependencies)),
            Roots => parent == Some(GraphHeader),
            Root => matches!(parent, Some(GraphHeader | Roots)),
            AnnotationSpaces => parent == Some(GraphHeader),
            AnnotationSpace => matches!(parent, Some(Graph | GraphHeader | AnnotationSpaces)),
            AnnotationSet => matches!(parent, Some(Graph | AnnotationSpace)),
            Node => parent == Some(Graph),
            Link => parent == Some(Node),
            Edge => parent == Some(Graph),
            Region => parent == Some(Graph),
            Annotation => matches!(parent, Some(Graph | AnnotationSet)),
            FeatureStructure => matches!(parent, Some(Annotation | Feature)),
            Feature => parent == Some(FeatureStructure),
        }
    }
}
