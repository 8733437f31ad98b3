//! Features and feature structures.
//!
//! A feature binds a name to either an atomic string or a nested feature
//! structure. Feature structures nest to arbitrary depth and back the
//! content of annotations.

/// The value side of a [`Feature`].
///
/// Exactly one of the two variants holds: a feature is never both atomic
/// and nested, and never neither. An empty atomic string is a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeatureValue {
    /// Plain string value.
    Atomic(String),
    /// Nested feature structure.
    Nested(FeatureStructure),
}

impl FeatureValue {
    /// Returns the atomic string, or `None` for a nested value.
    pub fn as_atomic(&self) -> Option<&str> {
        match self {
            FeatureValue::Atomic(s) => Some(s),
            FeatureValue::Nested(_) => None,
        }
    }

    /// Returns the nested structure, or `None` for an atomic value.
    pub fn as_nested(&self) -> Option<&FeatureStructure> {
        match self {
            FeatureValue::Atomic(_) => None,
            FeatureValue::Nested(fs) => Some(fs),
        }
    }
}

/// A named value inside a feature structure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feature {
    pub name: String,
    pub value: FeatureValue,
}

impl Feature {
    /// Creates a feature with an atomic string value.
    pub fn atomic(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: FeatureValue::Atomic(value.into()),
        }
    }

    /// Creates a feature whose value is a nested structure.
    pub fn nested(name: impl Into<String>, value: FeatureStructure) -> Self {
        Self {
            name: name.into(),
            value: FeatureValue::Nested(value),
        }
    }
}

/// An ordered collection of features, optionally typed.
///
/// Names are unique within one structure: [`FeatureStructure::set`]
/// replaces an existing feature of the same name in place, so the last
/// value wins while the original position is kept. Nesting levels are
/// independent name scopes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeatureStructure {
    /// Optional structure type from the wire format.
    pub kind: Option<String>,
    features: Vec<Feature>,
}

impl FeatureStructure {
    /// Creates an empty, untyped structure.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty structure with the given type.
    pub fn with_kind(kind: impl Into<String>) -> Self {
        Self {
            kind: Some(kind.into()),
            features: Vec::new(),
        }
    }

    /// Adds a feature, replacing any existing feature of the same name
    /// in place.
    pub fn set(&mut self, feature: Feature) {
        match self.features.iter_mut().find(|f| f.name == feature.name) {
            Some(existing) => *existing = feature,
            None => self.features.push(feature),
        }
    }

    /// Returns the feature named `name`, if present.
    pub fn get(&self, name: &str) -> Option<&Feature> {
        self.features.iter().find(|f| f.name == name)
    }

    /// Iterates over features in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Feature> {
        self.features.iter()
    }

    /// Returns the number of features.
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Returns true if the structure holds no features.
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}
