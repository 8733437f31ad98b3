//! Annotations and their grouping containers.
//!
//! An annotation is owned by exactly one annotation set; the annotated
//! node, edge, or region holds an [`AnnotationRef`] handle instead of a
//! copy. Sets belong to annotation spaces, which act as namespaces for
//! annotation types.

use crate::model::FeatureStructure;

/// Id of the annotation space that receives sets declared without an
/// explicit owning space (sets opened directly under the graph element,
/// or auto-created from an annotation's `as` attribute).
pub const DEFAULT_ANNOTATION_SPACE: &str = "default";

/// The category of the element an annotation is attached to.
///
/// The wire format carries only the target id; the category is fixed at
/// attachment time by probing nodes, then edges, then regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetKind {
    Node,
    Edge,
    Region,
}

impl TargetKind {
    /// Returns the category name used in error messages.
    pub fn category(self) -> &'static str {
        match self {
            TargetKind::Node => "node",
            TargetKind::Edge => "edge",
            TargetKind::Region => "region",
        }
    }
}

/// A handle from an annotated element back to its annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationRef {
    /// Id of the owning annotation set.
    pub set: String,
    /// Id of the annotation within that set.
    pub annotation: String,
}

impl AnnotationRef {
    pub fn new(set: impl Into<String>, annotation: impl Into<String>) -> Self {
        Self {
            set: set.into(),
            annotation: annotation.into(),
        }
    }
}

/// A typed label with optional structured content, attached to one
/// graph element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    /// Wire id, or a deterministic generated id of the form
    /// `<set>-a<ordinal>` when the wire carried none.
    pub id: String,
    /// Annotation label (its type).
    pub label: String,
    /// Id of the annotated element.
    pub target: String,
    /// Category of the annotated element; fixed at attachment, `None`
    /// while unresolved or when the annotation was kept despite an
    /// unresolvable target.
    pub target_kind: Option<TargetKind>,
    /// Structured content, if the annotation carried a feature structure.
    pub features: Option<FeatureStructure>,
}

/// A named, optionally typed collection of annotations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationSet {
    pub id: String,
    /// Optional set type from the wire format.
    pub set_type: Option<String>,
    /// Id of the owning annotation space.
    pub space: String,
    annotations: Vec<Annotation>,
}

impl AnnotationSet {
    /// Creates an empty set owned by `space`.
    pub fn new(id: impl Into<String>, set_type: Option<String>, space: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            set_type,
            space: space.into(),
            annotations: Vec::new(),
        }
    }

    /// Appends an annotation. Ids are expected to be unique within the
    /// set; the parser rejects duplicates before calling this.
    pub fn push(&mut self, annotation: Annotation) {
        self.annotations.push(annotation);
    }

    /// Returns the annotation with the given id, if present.
    pub fn get(&self, id: &str) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.id == id)
    }

    /// Mutable counterpart of [`AnnotationSet::get`].
    pub fn get_mut(&mut self, id: &str) -> Option<&mut Annotation> {
        self.annotations.iter_mut().find(|a| a.id == id)
    }

    /// Iterates over annotations in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Annotation> {
        self.annotations.iter()
    }

    /// Returns the number of annotations in the set.
    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    /// Returns true if the set holds no annotations.
    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }

    /// Consumes the set, yielding its annotations in order.
    pub(crate) fn into_annotations(self) -> Vec<Annotation> {
        self.annotations
    }
}

/// A named grouping of annotation sets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationSpace {
    pub id: String,
    /// Member set ids in declaration order.
    pub sets: Vec<String>,
}

impl AnnotationSpace {
    /// Creates a space with no member sets.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            sets: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_lookup() {
        let mut set = AnnotationSet::new("s0", Some("syntax".to_string()), "space0");
        set.push(Annotation {
            id: "a0".to_string(),
            label: "pos".to_string(),
            target: "n0".to_string(),
            target_kind: Some(TargetKind::Node),
            features: None,
        });

        assert_eq!(set.len(), 1);
        assert_eq!(set.get("a0").map(|a| a.label.as_str()), Some("pos"));
        assert!(set.get("a1").is_none());
    }

    #[test]
    fn test_target_kind_category() {
        assert_eq!(TargetKind::Node.category(), "node");
        assert_eq!(TargetKind::Edge.category(), "edge");
        assert_eq!(TargetKind::Region.category(), "region");
    }
}
