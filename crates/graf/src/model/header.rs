//! Document header bookkeeping.

/// A declared dependency on another annotation document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyDecl {
    /// Logical dependency-type key (the wire `f.id`).
    pub key: String,
    /// Locator of the referenced document. Defaults to the key when the
    /// wire carries no explicit reference.
    pub locator: String,
}

/// Label statistics recovered from the header's `labelsDecl` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelUsage {
    pub label: String,
    /// Number of occurrences the header declares for the label.
    pub occurs: u64,
}

/// Bookkeeping metadata for a parsed document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Header {
    /// Dependency declarations in document order.
    pub depends: Vec<DependencyDecl>,
    /// Declared root node id; when several `root` elements appear, the
    /// last one wins.
    pub root_decl: Option<String>,
    /// Label usage declarations in document order.
    pub label_usage: Vec<LabelUsage>,
}

impl Header {
    /// Creates an empty header.
    pub fn new() -> Self {
        Self::default()
    }
}
