use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::snapshot::GraphSnapshot;
use super::value_objects::{EdgeId, NodeId};

/// Reserved predicate selecting [`EdgeKind::SubClassOf`].
pub const SUBCLASS_OF: &str = "subClassOf";

/// Distinguishes real classes from datatype marker nodes such as `String`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeRole {
    #[default]
    Class,
    Datatype,
}

impl NodeRole {
    #[must_use]
    pub fn is_class(&self) -> bool {
        matches!(self, Self::Class)
    }
}

/// A concept of the ontology as drawn on the canvas.
///
/// Labels are not unique. Lookups by label resolve to the first node in
/// insertion order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassNode {
    pub id: NodeId,
    pub label: String,
    #[serde(default, skip_serializing_if = "NodeRole::is_class")]
    pub role: NodeRole,
}

impl ClassNode {
    #[must_use]
    pub fn new(id: impl Into<NodeId>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            role: NodeRole::Class,
        }
    }

    #[must_use]
    pub fn datatype(id: impl Into<NodeId>, label: impl Into<String>) -> Self {
        Self {
            role: NodeRole::Datatype,
            ..Self::new(id, label)
        }
    }

    #[must_use]
    pub fn is_class(&self) -> bool {
        self.role.is_class()
    }
}

/// What an edge connects to, with only the fields valid for that kind.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EdgeKind {
    /// `source` is the child, `target` the parent.
    SubClassOf { target: NodeId },
    ObjectProperty { target: NodeId },
    /// Points at a primitive type by name (the label of its marker node).
    DatatypeProperty { datatype: String },
}

impl EdgeKind {
    #[must_use]
    pub fn target(&self) -> Option<&NodeId> {
        match self {
            Self::SubClassOf { target } | Self::ObjectProperty { target } => Some(target),
            Self::DatatypeProperty { .. } => None,
        }
    }

    #[must_use]
    pub fn datatype(&self) -> Option<&str> {
        match self {
            Self::DatatypeProperty { datatype } => Some(datatype),
            Self::SubClassOf { .. } | Self::ObjectProperty { .. } => None,
        }
    }

    #[must_use]
    pub fn is_subclass_of(&self) -> bool {
        matches!(self, Self::SubClassOf { .. })
    }
}

/// Directed, labelled relation between a class and another class or a datatype.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyEdge {
    pub id: EdgeId,
    pub source: NodeId,
    pub predicate: String,
    #[serde(flatten)]
    pub kind: EdgeKind,
}

impl PropertyEdge {
    #[must_use]
    pub fn target(&self) -> Option<&NodeId> {
        self.kind.target()
    }

    #[must_use]
    pub fn datatype(&self) -> Option<&str> {
        self.kind.datatype()
    }

    /// Returns `true` when the edge ends at `node`, either by id or, for
    /// datatype markers, by datatype name.
    #[must_use]
    pub fn points_to(&self, node: &ClassNode) -> bool {
        match &self.kind {
            EdgeKind::SubClassOf { target } | EdgeKind::ObjectProperty { target } => {
                *target == node.id
            }
            EdgeKind::DatatypeProperty { datatype } => {
                node.role == NodeRole::Datatype && *datatype == node.label
            }
        }
    }

    #[must_use]
    pub fn touches(&self, node: &ClassNode) -> bool {
        self.source == node.id || self.points_to(node)
    }

    fn same_triple(&self, source: &NodeId, predicate: &str, end: &EdgeEnd) -> bool {
        if self.source != *source || self.predicate != predicate {
            return false;
        }
        match (end, &self.kind) {
            (EdgeEnd::Class(id), kind) => kind.target() == Some(id),
            (EdgeEnd::Datatype(name), kind) => kind.datatype() == Some(name.as_str()),
        }
    }
}

/// Object side of an edge being added.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EdgeEnd {
    Class(NodeId),
    Datatype(String),
}

/// Result of an idempotent insert: the entity was created or already present.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Insertion<T> {
    Created(T),
    Existing(T),
}

impl<T> Insertion<T> {
    #[must_use]
    pub fn into_inner(self) -> T {
        match self {
            Self::Created(value) | Self::Existing(value) => value,
        }
    }

    #[must_use]
    pub fn value(&self) -> &T {
        match self {
            Self::Created(value) | Self::Existing(value) => value,
        }
    }

    #[must_use]
    pub fn is_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }
}

/// Canonical node/edge container.
///
/// Insertion order is kept so that serialisation is stable; it carries no
/// other meaning.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Ontology {
    nodes: Vec<ClassNode>,
    edges: Vec<PropertyEdge>,
}

impl Ontology {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a model from a boundary snapshot, checking referential integrity.
    pub fn from_snapshot(snapshot: GraphSnapshot) -> Result<Self, OntologyError> {
        let mut ontology = Self::new();
        for node in snapshot.nodes {
            ontology.insert_node(node)?;
        }
        for edge in snapshot.edges {
            ontology.insert_edge(edge)?;
        }
        Ok(ontology)
    }

    #[must_use]
    pub fn to_snapshot(&self) -> GraphSnapshot {
        GraphSnapshot {
            nodes: self.nodes.clone(),
            edges: self.edges.clone(),
        }
    }

    /// Returns every node, classes and datatype markers, in insertion order.
    #[must_use]
    pub fn nodes(&self) -> &[ClassNode] {
        &self.nodes
    }

    /// Returns every edge in insertion order.
    #[must_use]
    pub fn edges(&self) -> &[PropertyEdge] {
        &self.edges
    }

    /// Iterates nodes that are classes, skipping datatype markers.
    pub fn classes(&self) -> impl Iterator<Item = &ClassNode> {
        self.nodes.iter().filter(|node| node.is_class())
    }

    #[must_use]
    pub fn class_count(&self) -> usize {
        self.classes().count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the node with the given id, if any.
    #[must_use]
    pub fn find_node_by_id(&self, id: &NodeId) -> Option<&ClassNode> {
        self.nodes.iter().find(|node| node.id == *id)
    }

    /// First node carrying `label`, in insertion order.
    #[must_use]
    pub fn find_node_by_label(&self, label: &str) -> Option<&ClassNode> {
        self.nodes.iter().find(|node| node.label == label)
    }

    pub fn find_nodes_by_label<'a>(
        &'a self,
        label: &'a str,
    ) -> impl Iterator<Item = &'a ClassNode> + 'a {
        self.nodes.iter().filter(move |node| node.label == label)
    }

    #[must_use]
    pub fn find_edge(&self, id: &EdgeId) -> Option<&PropertyEdge> {
        self.edges.iter().find(|edge| edge.id == *id)
    }

    /// Outgoing edges of `source`, in insertion order.
    pub fn edges_from<'a>(
        &'a self,
        source: &'a NodeId,
    ) -> impl Iterator<Item = &'a PropertyEdge> + 'a {
        self.edges.iter().filter(move |edge| edge.source == *source)
    }

    /// Returns `true` if `source` already has a datatype property called `predicate`.
    #[must_use]
    pub fn has_datatype_property(&self, source: &NodeId, predicate: &str) -> bool {
        self.edges_from(source).any(|edge| {
            edge.predicate == predicate && matches!(edge.kind, EdgeKind::DatatypeProperty { .. })
        })
    }

    /// Adds a class unless a node with the same label exists.
    pub fn add_node(&mut self, label: impl Into<String>) -> Insertion<NodeId> {
        self.add_node_with_role(label.into(), NodeRole::Class)
    }

    /// Adds a datatype marker node unless a node with the same label exists.
    pub fn add_datatype_node(&mut self, label: impl Into<String>) -> Insertion<NodeId> {
        self.add_node_with_role(label.into(), NodeRole::Datatype)
    }

    fn add_node_with_role(&mut self, label: String, role: NodeRole) -> Insertion<NodeId> {
        if let Some(existing) = self.find_node_by_label(&label) {
            return Insertion::Existing(existing.id.clone());
        }
        let id = NodeId::generate();
        self.nodes.push(ClassNode {
            id: id.clone(),
            label,
            role,
        });
        Insertion::Created(id)
    }

    /// Inserts a fully specified node, keeping duplicate labels.
    ///
    /// Returns [`OntologyError::DuplicateNodeId`] when the id is taken.
    pub fn insert_node(&mut self, node: ClassNode) -> Result<(), OntologyError> {
        if self.find_node_by_id(&node.id).is_some() {
            return Err(OntologyError::DuplicateNodeId(node.id));
        }
        self.nodes.push(node);
        Ok(())
    }

    /// Relabels a node. Renaming a datatype marker also renames the datatype
    /// its properties point at.
    pub fn rename_node(
        &mut self,
        id: &NodeId,
        label: impl Into<String>,
    ) -> Result<(), OntologyError> {
        let label = label.into();
        let Some(node) = self.nodes.iter_mut().find(|node| node.id == *id) else {
            return Err(OntologyError::UnknownNode(id.clone()));
        };
        if node.role == NodeRole::Datatype {
            let previous = std::mem::replace(&mut node.label, label.clone());
            for edge in &mut self.edges {
                if let EdgeKind::DatatypeProperty { datatype } = &mut edge.kind {
                    if *datatype == previous {
                        datatype.clone_from(&label);
                    }
                }
            }
        } else {
            node.label = label;
        }
        Ok(())
    }

    /// Removes a node together with every edge touching it.
    pub fn remove_node(&mut self, id: &NodeId) -> Option<ClassNode> {
        let position = self.nodes.iter().position(|node| node.id == *id)?;
        let removed = self.nodes.remove(position);
        self.edges.retain(|edge| !edge.touches(&removed));
        Some(removed)
    }

    /// Adds an edge unless the same `(source, predicate, target)` triple exists.
    ///
    /// The reserved predicate [`SUBCLASS_OF`] selects a subclass edge and is
    /// only valid towards a class.
    pub fn add_edge(
        &mut self,
        source: &NodeId,
        predicate: &str,
        end: EdgeEnd,
    ) -> Result<Insertion<EdgeId>, OntologyError> {
        if self.find_node_by_id(source).is_none() {
            return Err(OntologyError::UnknownNode(source.clone()));
        }
        if predicate.trim().is_empty() {
            return Err(OntologyError::EmptyPredicate {
                node: source.clone(),
            });
        }
        if let Some(existing) = self
            .edges
            .iter()
            .find(|edge| edge.same_triple(source, predicate, &end))
        {
            return Ok(Insertion::Existing(existing.id.clone()));
        }

        let kind = match end {
            EdgeEnd::Class(target) => {
                if self.find_node_by_id(&target).is_none() {
                    return Err(OntologyError::UnknownNode(target));
                }
                if predicate == SUBCLASS_OF {
                    EdgeKind::SubClassOf { target }
                } else {
                    EdgeKind::ObjectProperty { target }
                }
            }
            EdgeEnd::Datatype(datatype) => {
                if predicate == SUBCLASS_OF {
                    return Err(OntologyError::SubClassOfDatatype {
                        node: source.clone(),
                        datatype,
                    });
                }
                EdgeKind::DatatypeProperty { datatype }
            }
        };

        let id = EdgeId::generate();
        self.edges.push(PropertyEdge {
            id: id.clone(),
            source: source.clone(),
            predicate: predicate.to_string(),
            kind,
        });
        Ok(Insertion::Created(id))
    }

    /// Inserts a fully specified edge after checking that its endpoints exist.
    pub fn insert_edge(&mut self, edge: PropertyEdge) -> Result<(), OntologyError> {
        if self.find_edge(&edge.id).is_some() {
            return Err(OntologyError::DuplicateEdgeId(edge.id));
        }
        if self.find_node_by_id(&edge.source).is_none() {
            return Err(OntologyError::UnknownNode(edge.source));
        }
        if let Some(target) = edge.target() {
            if self.find_node_by_id(target).is_none() {
                return Err(OntologyError::UnknownNode(target.clone()));
            }
        }
        self.edges.push(edge);
        Ok(())
    }

    /// Removes every edge from `source` to `target`, whatever its predicate.
    ///
    /// Edge identity for removal is the node pair; parallel edges with
    /// different predicates all go.
    pub fn remove_edge(&mut self, source: &NodeId, target: &NodeId) -> Vec<PropertyEdge> {
        let Some(target_node) = self.find_node_by_id(target).cloned() else {
            return Vec::new();
        };
        let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.edges)
            .into_iter()
            .partition(|edge| edge.source == *source && edge.points_to(&target_node));
        self.edges = kept;
        removed
    }
}

/// Errors raised when manipulating the graph model directly.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum OntologyError {
    #[error("node `{0}` does not exist")]
    UnknownNode(NodeId),
    #[error("node id `{0}` is already in use")]
    DuplicateNodeId(NodeId),
    #[error("edge id `{0}` is already in use")]
    DuplicateEdgeId(EdgeId),
    #[error("edge from `{node}` has an empty predicate")]
    EmptyPredicate { node: NodeId },
    #[error("`subClassOf` from `{node}` cannot point at datatype `{datatype}`")]
    SubClassOfDatatype { node: NodeId, datatype: String },
}
