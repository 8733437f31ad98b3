//! The annotation graph aggregate.

use rustc_hash::FxHashMap;

use crate::error::GraphError;
use crate::model::{
    Annotation, AnnotationRef, AnnotationSet, AnnotationSpace, Edge, Header, Node, Region,
    TargetKind,
};

/// Conflict policy for [`Graph::merge`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MergePolicy {
    /// Keep the receiving graph's version of a conflicting entity.
    #[default]
    PreferFirst,
    /// Take the incoming graph's version of a conflicting entity.
    PreferLast,
    /// Reject the merge with [`GraphError::MergeConflict`].
    ErrorOnConflict,
}

/// Insertion-ordered storage with id lookup.
///
/// Entries live in a `Vec` in creation order; an `FxHashMap` maps ids to
/// positions. Replacing an entry keeps its position.
#[derive(Debug, Clone)]
struct IdTable<T> {
    entries: Vec<T>,
    index: FxHashMap<String, usize>,
}

impl<T> Default for IdTable<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            index: FxHashMap::default(),
        }
    }
}

impl<T> IdTable<T> {
    fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    fn get(&self, id: &str) -> Option<&T> {
        self.index.get(id).map(|&i| &self.entries[i])
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut T> {
        self.index.get(id).copied().map(move |i| &mut self.entries[i])
    }

    /// Appends a new entry, or replaces an existing one in place.
    fn insert(&mut self, id: &str, value: T) {
        match self.index.get(id) {
            Some(&i) => self.entries[i] = value,
            None => {
                self.index.insert(id.to_string(), self.entries.len());
                self.entries.push(value);
            }
        }
    }

    fn get_or_insert_with(&mut self, id: &str, make: impl FnOnce() -> T) -> &mut T {
        let i = match self.index.get(id) {
            Some(&i) => i,
            None => {
                let i = self.entries.len();
                self.index.insert(id.to_string(), i);
                self.entries.push(make());
                i
            }
        };
        &mut self.entries[i]
    }

    fn iter(&self) -> std::slice::Iter<'_, T> {
        self.entries.iter()
    }

    fn first(&self) -> Option<&T> {
        self.entries.first()
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn into_entries(self) -> Vec<T> {
        self.entries
    }
}

// The index map is derived state; entry order decides equality.
impl<T: PartialEq> PartialEq for IdTable<T> {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl<T: Eq> Eq for IdTable<T> {}

fn push_unique<T: PartialEq>(list: &mut Vec<T>, value: T) {
    if !list.contains(&value) {
        list.push(value);
    }
}

fn remove_value(list: &mut Vec<String>, value: &str) {
    if let Some(i) = list.iter().position(|v| v == value) {
        list.remove(i);
    }
}

/// The annotation graph: nodes, edges, regions, annotation containers,
/// and header bookkeeping, each keyed by id within its own category.
///
/// Entities iterate in creation order, which keeps traversal and the
/// root fallback deterministic. After a successful parse the graph is a
/// finished snapshot: every edge is linked into both endpoints' adjacency
/// lists and the root, if set, resolves.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Graph {
    nodes: IdTable<Node>,
    edges: IdTable<Edge>,
    regions: IdTable<Region>,
    annotation_sets: IdTable<AnnotationSet>,
    annotation_spaces: IdTable<AnnotationSpace>,
    /// Document header bookkeeping.
    pub header: Header,
    root: Option<String>,
}

impl Graph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up a node by id.
    pub fn node(&self, id: &str) -> Result<&Node, GraphError> {
        self.nodes.get(id).ok_or_else(|| GraphError::NotFound {
            category: "node",
            id: id.to_string(),
        })
    }

    /// Looks up an edge by id.
    pub fn edge(&self, id: &str) -> Result<&Edge, GraphError> {
        self.edges.get(id).ok_or_else(|| GraphError::NotFound {
            category: "edge",
            id: id.to_string(),
        })
    }

    /// Looks up a region by id.
    pub fn region(&self, id: &str) -> Result<&Region, GraphError> {
        self.regions.get(id).ok_or_else(|| GraphError::NotFound {
            category: "region",
            id: id.to_string(),
        })
    }

    /// Looks up an annotation set by id.
    pub fn annotation_set(&self, id: &str) -> Result<&AnnotationSet, GraphError> {
        self.annotation_sets.get(id).ok_or_else(|| GraphError::NotFound {
            category: "annotation set",
            id: id.to_string(),
        })
    }

    /// Looks up an annotation space by id.
    pub fn annotation_space(&self, id: &str) -> Result<&AnnotationSpace, GraphError> {
        self.annotation_spaces.get(id).ok_or_else(|| GraphError::NotFound {
            category: "annotation space",
            id: id.to_string(),
        })
    }

    /// Iterates nodes in creation order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    /// Iterates edges in creation order.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter()
    }

    /// Iterates regions in creation order.
    pub fn regions(&self) -> impl Iterator<Item = &Region> {
        self.regions.iter()
    }

    /// Iterates annotation sets in creation order.
    pub fn annotation_sets(&self) -> impl Iterator<Item = &AnnotationSet> {
        self.annotation_sets.iter()
    }

    /// Iterates annotation spaces in creation order.
    pub fn annotation_spaces(&self) -> impl Iterator<Item = &AnnotationSpace> {
        self.annotation_spaces.iter()
    }

    /// Returns the designated root node id, if one was fixed.
    pub fn root_id(&self) -> Option<&str> {
        self.root.as_deref()
    }

    /// Returns the designated root node, if one was fixed and present.
    pub fn root(&self) -> Option<&Node> {
        self.root.as_deref().and_then(|id| self.nodes.get(id))
    }

    /// Fetches the node with the given id, creating it with empty
    /// adjacency on first mention. References may precede declarations,
    /// so edge endpoints and root declarations go through this as well.
    pub fn get_or_add_node(&mut self, id: &str) -> &mut Node {
        self.nodes.get_or_insert_with(id, || Node::new(id))
    }

    /// Determines the category of a target id, probing nodes, then
    /// edges, then regions. Ids are unique per category, so a string
    /// present in several categories resolves in that fixed order.
    pub fn resolve_target(&self, id: &str) -> Option<TargetKind> {
        if self.nodes.contains(id) {
            Some(TargetKind::Node)
        } else if self.edges.contains(id) {
            Some(TargetKind::Edge)
        } else if self.regions.contains(id) {
            Some(TargetKind::Region)
        } else {
            None
        }
    }

    pub(crate) fn set_root(&mut self, id: String) {
        self.root = Some(id);
    }

    pub(crate) fn first_node_id(&self) -> Option<&str> {
        self.nodes.first().map(|n| n.id.as_str())
    }

    pub(crate) fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub(crate) fn region_count(&self) -> usize {
        self.regions.len()
    }

    /// Inserts a finalized edge and links it into both endpoints'
    /// adjacency lists exactly once.
    pub(crate) fn attach_edge(&mut self, edge: Edge) {
        let id = edge.id.clone();
        let from = edge.from.clone();
        let to = edge.to.clone();
        self.edges.insert(&id, edge);
        push_unique(&mut self.get_or_add_node(&from).out_edges, id.clone());
        push_unique(&mut self.get_or_add_node(&to).in_edges, id);
    }

    /// Inserts a region and attaches it to its declaring node.
    pub(crate) fn attach_region(&mut self, region: Region) {
        let id = region.id.clone();
        let node = region.node.clone();
        self.regions.insert(&id, region);
        push_unique(&mut self.get_or_add_node(&node).regions, id);
    }

    /// Links an already-present region into a node's region list.
    pub(crate) fn link_region(&mut self, node: &str, region: &str) {
        push_unique(&mut self.get_or_add_node(node).regions, region.to_string());
    }

    /// Fetches or creates the annotation space with the given id.
    pub(crate) fn ensure_space(&mut self, id: &str) -> &mut AnnotationSpace {
        self.annotation_spaces
            .get_or_insert_with(id, || AnnotationSpace::new(id))
    }

    /// Fetches or creates an annotation set, registering it with its
    /// owning space on creation. A later mention may fill in a type the
    /// first one lacked, but never changes an established type or moves
    /// the set to another space; a formal declaration inside an explicit
    /// space goes through [`Graph::declare_set`] instead.
    pub(crate) fn ensure_set(
        &mut self,
        id: &str,
        set_type: Option<String>,
        space: &str,
    ) -> &mut AnnotationSet {
        if !self.annotation_sets.contains(id) {
            push_unique(&mut self.ensure_space(space).sets, id.to_string());
        }
        let set = self
            .annotation_sets
            .get_or_insert_with(id, || AnnotationSet::new(id, None, space));
        if set.set_type.is_none() {
            set.set_type = set_type;
        }
        set
    }

    /// [`Graph::ensure_set`] for a declaration inside an explicit space.
    /// A set auto-created elsewhere (typically in the default space from
    /// an annotation's set reference) moves to the declaring space, and
    /// the member lists of both spaces follow.
    pub(crate) fn declare_set(
        &mut self,
        id: &str,
        set_type: Option<String>,
        space: &str,
    ) -> &mut AnnotationSet {
        let previous = self.annotation_sets.get(id).map(|s| s.space.clone());
        if let Some(previous) = previous.filter(|p| p.as_str() != space) {
            remove_value(&mut self.ensure_space(&previous).sets, id);
            push_unique(&mut self.ensure_space(space).sets, id.to_string());
            if let Some(set) = self.annotation_sets.get_mut(id) {
                set.space = space.to_string();
            }
        }
        self.ensure_set(id, set_type, space)
    }

    /// Appends an annotation to a set; no-op if the set is absent.
    pub(crate) fn push_annotation(&mut self, set_id: &str, annotation: Annotation) {
        if let Some(set) = self.annotation_sets.get_mut(set_id) {
            set.push(annotation);
        }
    }

    /// Attaches an annotation already stored in its set to the element
    /// it targets, recording the resolved category on the annotation.
    pub(crate) fn attach_annotation(&mut self, kind: TargetKind, set_id: &str, annotation_id: &str) {
        let Some(target) = self
            .annotation_sets
            .get_mut(set_id)
            .and_then(|set| set.get_mut(annotation_id))
            .map(|ann| {
                ann.target_kind = Some(kind);
                ann.target.clone()
            })
        else {
            return;
        };
        let handle = AnnotationRef::new(set_id, annotation_id);
        match kind {
            TargetKind::Node => {
                if let Some(node) = self.nodes.get_mut(&target) {
                    push_unique(&mut node.annotations, handle);
                }
            }
            TargetKind::Edge => {
                if let Some(edge) = self.edges.get_mut(&target) {
                    push_unique(&mut edge.annotations, handle);
                }
            }
            TargetKind::Region => {
                if let Some(region) = self.regions.get_mut(&target) {
                    push_unique(&mut region.annotations, handle);
                }
            }
        }
    }

    /// Splices `other` into this graph using union-by-id semantics.
    ///
    /// A shared id denotes the same logical entity. Membership lists
    /// (adjacency, region links, annotation handles, space members) are
    /// unioned in existing-first order; nodes carry nothing else, so they
    /// never conflict. When the two graphs disagree on an entity's own
    /// attributes, `policy` decides which version survives: the receiving
    /// side's, the incoming one, or neither with
    /// [`GraphError::MergeConflict`]. The discarded version's adjacency
    /// entries are removed along with it, so edge and region links remain
    /// the exact inverse of the surviving entities. A missing annotation
    /// set type is filled from the other side rather than treated as a
    /// conflict. The receiving graph's header and root are kept; the
    /// incoming header and root are dropped.
    ///
    /// Under [`MergePolicy::ErrorOnConflict`] the merge is transactional:
    /// when it fails, the receiving graph is left exactly as it was.
    pub fn merge(&mut self, other: Graph, policy: MergePolicy) -> Result<(), GraphError> {
        if policy == MergePolicy::ErrorOnConflict {
            let mut staged = self.clone();
            staged.merge_entities(other, policy)?;
            *self = staged;
            return Ok(());
        }
        self.merge_entities(other, policy)
    }

    fn merge_entities(&mut self, other: Graph, policy: MergePolicy) -> Result<(), GraphError> {
        for node in other.nodes.into_entries() {
            if !self.nodes.contains(&node.id) {
                let id = node.id.clone();
                self.nodes.insert(&id, node);
                continue;
            }
            if let Some(existing) = self.nodes.get_mut(&node.id) {
                for e in node.out_edges {
                    push_unique(&mut existing.out_edges, e);
                }
                for e in node.in_edges {
                    push_unique(&mut existing.in_edges, e);
                }
                for r in node.regions {
                    push_unique(&mut existing.regions, r);
                }
                for a in node.annotations {
                    push_unique(&mut existing.annotations, a);
                }
            }
        }

        for mut edge in other.edges.into_entries() {
            if !self.edges.contains(&edge.id) {
                let id = edge.id.clone();
                self.edges.insert(&id, edge);
                continue;
            }
            let annotations = std::mem::take(&mut edge.annotations);
            let mut stale = None;
            if let Some(existing) = self.edges.get_mut(&edge.id) {
                for a in annotations {
                    push_unique(&mut existing.annotations, a);
                }
                if existing.from != edge.from
                    || existing.to != edge.to
                    || existing.label != edge.label
                {
                    match policy {
                        MergePolicy::PreferFirst => {
                            // The node union already imported adjacency for
                            // the losing incoming endpoints; scrub it.
                            stale = Some((edge.from, edge.to));
                        }
                        MergePolicy::ErrorOnConflict => {
                            return Err(GraphError::MergeConflict {
                                category: "edge",
                                id: edge.id,
                            });
                        }
                        MergePolicy::PreferLast => {
                            let old_from = std::mem::replace(&mut existing.from, edge.from);
                            let old_to = std::mem::replace(&mut existing.to, edge.to);
                            existing.label = edge.label;
                            stale = Some((old_from, old_to));
                        }
                    }
                }
            }
            if let Some((old_from, old_to)) = stale {
                self.rewire_edge(&edge.id, &old_from, &old_to);
            }
        }

        for mut region in other.regions.into_entries() {
            if !self.regions.contains(&region.id) {
                let id = region.id.clone();
                self.regions.insert(&id, region);
                continue;
            }
            let annotations = std::mem::take(&mut region.annotations);
            let mut stale = None;
            if let Some(existing) = self.regions.get_mut(&region.id) {
                for a in annotations {
                    push_unique(&mut existing.annotations, a);
                }
                if existing.anchors != region.anchors || existing.node != region.node {
                    match policy {
                        MergePolicy::PreferFirst => {
                            stale = Some(region.node);
                        }
                        MergePolicy::ErrorOnConflict => {
                            return Err(GraphError::MergeConflict {
                                category: "region",
                                id: region.id,
                            });
                        }
                        MergePolicy::PreferLast => {
                            existing.anchors = region.anchors;
                            stale = Some(std::mem::replace(&mut existing.node, region.node));
                        }
                    }
                }
            }
            if let Some(old_node) = stale {
                self.rewire_region(&region.id, &old_node);
            }
        }

        for set in other.annotation_sets.into_entries() {
            if !self.annotation_sets.contains(&set.id) {
                let id = set.id.clone();
                self.annotation_sets.insert(&id, set);
                continue;
            }
            let set_id = set.id.clone();
            let set_type = set.set_type.clone();
            let incoming = set.into_annotations();
            let Some(existing) = self.annotation_sets.get_mut(&set_id) else {
                continue;
            };
            if existing.set_type.is_none() {
                existing.set_type = set_type;
            } else if set_type.is_some() && existing.set_type != set_type {
                match policy {
                    MergePolicy::PreferFirst => {}
                    MergePolicy::ErrorOnConflict => {
                        return Err(GraphError::MergeConflict {
                            category: "annotation set",
                            id: set_id,
                        });
                    }
                    MergePolicy::PreferLast => existing.set_type = set_type,
                }
            }
            for ann in incoming {
                if existing.get(&ann.id).is_none() {
                    existing.push(ann);
                    continue;
                }
                let Some(present) = existing.get_mut(&ann.id) else {
                    continue;
                };
                if *present == ann {
                    continue;
                }
                match policy {
                    MergePolicy::PreferFirst => {}
                    MergePolicy::ErrorOnConflict => {
                        return Err(GraphError::MergeConflict {
                            category: "annotation",
                            id: ann.id,
                        });
                    }
                    MergePolicy::PreferLast => *present = ann,
                }
            }
        }

        for space in other.annotation_spaces.into_entries() {
            if !self.annotation_spaces.contains(&space.id) {
                let id = space.id.clone();
                self.annotation_spaces.insert(&id, space);
                continue;
            }
            if let Some(existing) = self.annotation_spaces.get_mut(&space.id) {
                for s in space.sets {
                    push_unique(&mut existing.sets, s);
                }
            }
        }

        Ok(())
    }

    /// Aligns adjacency with an edge's surviving endpoints, removing any
    /// entries recorded under `old_from`/`old_to`.
    fn rewire_edge(&mut self, id: &str, old_from: &str, old_to: &str) {
        let Some((new_from, new_to)) = self.edges.get(id).map(|e| (e.from.clone(), e.to.clone()))
        else {
            return;
        };
        if old_from != new_from {
            if let Some(node) = self.nodes.get_mut(old_from) {
                remove_value(&mut node.out_edges, id);
            }
            push_unique(&mut self.get_or_add_node(&new_from).out_edges, id.to_string());
        }
        if old_to != new_to {
            if let Some(node) = self.nodes.get_mut(old_to) {
                remove_value(&mut node.in_edges, id);
            }
            push_unique(&mut self.get_or_add_node(&new_to).in_edges, id.to_string());
        }
    }

    /// Aligns a region's node link with its surviving declaration,
    /// removing the entry recorded under `old_node`.
    fn rewire_region(&mut self, id: &str, old_node: &str) {
        let Some(new_node) = self.regions.get(id).map(|r| r.node.clone()) else {
            return;
        };
        if old_node == new_node {
            return;
        }
        if let Some(node) = self.nodes.get_mut(old_node) {
            remove_value(&mut node.regions, id);
        }
        push_unique(&mut self.get_or_add_node(&new_node).regions, id.to_string());
    }
}
