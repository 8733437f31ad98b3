//! SAX-style event stream consumed by the parser.
//!
//! The crate does not tokenize XML itself. A streaming tokenizer (or any
//! other producer) delivers [`SaxEvent`]s in document order and the parser
//! folds them into a graph. Attribute lookup distinguishes "absent" from
//! "empty": [`Attributes::get`] returns `None` for a missing name, never a
//! default value.

/// Attributes attached to a start-element event.
///
/// Order-preserving list of `(name, value)` pairs with lookup by name.
/// Qualified names are kept verbatim (`xml:id` stays `xml:id`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    entries: Vec<(String, String)>,
}

impl Attributes {
    /// Creates an empty attribute list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an attribute. Duplicate names are kept; `get` returns the first.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    /// Returns the value for `name`, or `None` if the attribute is absent.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Returns the number of attributes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if there are no attributes.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over `(name, value)` pairs in document order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

impl<N: Into<String>, V: Into<String>> FromIterator<(N, V)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(n, v)| (n.into(), v.into()))
                .collect(),
        }
    }
}

/// One structural event from the XML tokenizer.
#[derive(Debug, Clone, PartialEq)]
pub enum SaxEvent {
    /// Opening tag with its attributes.
    StartElement { name: String, attrs: Attributes },
    /// Character data between tags.
    Characters(String),
    /// Closing tag.
    EndElement { name: String },
}

impl SaxEvent {
    /// Start-element event with no attributes.
    pub fn open(name: impl Into<String>) -> Self {
        SaxEvent::StartElement {
            name: name.into(),
            attrs: Attributes::new(),
        }
    }

    /// Adds an attribute to a start-element event; no-op on other variants.
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        if let SaxEvent::StartElement { attrs, .. } = &mut self {
            attrs.push(name, value);
        }
        self
    }

    /// Character-data event.
    pub fn text(data: impl Into<String>) -> Self {
        SaxEvent::Characters(data.into())
    }

    /// End-element event.
    pub fn close(name: impl Into<String>) -> Self {
        SaxEvent::EndElement { name: name.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_lookup() {
        let attrs: Attributes = [("xml:id", "n0"), ("label", "tok")].into_iter().collect();
        assert_eq!(attrs.get("xml:id"), Some("n0"));
        assert_eq!(attrs.get("label"), Some("tok"));
        assert_eq!(attrs.get("missing"), None);
        assert_eq!(attrs.len(), 2);
    }

    #[test]
    fn test_absent_is_not_empty_string() {
        let mut attrs = Attributes::new();
        attrs.push("value", "");
        assert_eq!(attrs.get("value"), Some(""));
        assert_eq!(attrs.get("other"), None);
    }

    #[test]
    fn test_event_constructors() {
        let open = SaxEvent::open("node").attr("xml:id", "n0");
        match &open {
            SaxEvent::StartElement { name, attrs } => {
                assert_eq!(name, "node");
                assert_eq!(attrs.get("xml:id"), Some("n0"));
            }
            _ => panic!("expected StartElement"),
        }

        assert_eq!(SaxEvent::text("abc"), SaxEvent::Characters("abc".to_string()));
        assert_eq!(
            SaxEvent::close("node"),
            SaxEvent::EndElement { name: "node".to_string() }
        );
    }

    #[test]
    fn test_attr_on_non_start_event_is_ignored() {
        let event = SaxEvent::text("abc").attr("x", "y");
        assert_eq!(event, SaxEvent::Characters("abc".to_string()));
    }
}
