//! Derived views over the edge list: the subclass forest and the indented
//! "triples" rendering.
//!
//! Nothing here is stored. Both structures are recomputed from the
//! [`Ontology`] on demand, so they can never drift from the edges.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt::{self, Display, Formatter};

use serde::Serialize;

use super::entities::{ClassNode, EdgeKind, Ontology};
use super::value_objects::NodeId;

/// Parent/child relation induced by `subClassOf` edges.
///
/// A class may have several parents. Child and parent lists keep edge
/// insertion order.
#[derive(Debug, Clone)]
pub struct SubclassForest<'a> {
    ontology: &'a Ontology,
    children: BTreeMap<&'a NodeId, Vec<&'a NodeId>>,
    parents: BTreeMap<&'a NodeId, Vec<&'a NodeId>>,
}

impl<'a> SubclassForest<'a> {
    #[must_use]
    pub fn new(ontology: &'a Ontology) -> Self {
        let mut children: BTreeMap<&NodeId, Vec<&NodeId>> = BTreeMap::new();
        let mut parents: BTreeMap<&NodeId, Vec<&NodeId>> = BTreeMap::new();
        for edge in ontology.edges() {
            if let EdgeKind::SubClassOf { target } = &edge.kind {
                children.entry(target).or_default().push(&edge.source);
                parents.entry(&edge.source).or_default().push(target);
            }
        }
        Self {
            ontology,
            children,
            parents,
        }
    }

    /// Classes that are not the child side of any `subClassOf` edge.
    #[must_use]
    pub fn roots(&self) -> Vec<&'a ClassNode> {
        self.ontology
            .classes()
            .filter(|node| !self.parents.contains_key(&node.id))
            .collect()
    }

    #[must_use]
    pub fn children(&self, id: &NodeId) -> &[&'a NodeId] {
        self.children.get(id).map(Vec::as_slice).unwrap_or_default()
    }

    #[must_use]
    pub fn parents(&self, id: &NodeId) -> &[&'a NodeId] {
        self.parents.get(id).map(Vec::as_slice).unwrap_or_default()
    }

    /// Transitive parents in breadth-first order. Terminates on cycles and
    /// never includes `id` itself.
    #[must_use]
    pub fn ancestors(&self, id: &NodeId) -> Vec<NodeId> {
        self.closure(id, &self.parents)
    }

    /// Transitive children in breadth-first order.
    #[must_use]
    pub fn descendants(&self, id: &NodeId) -> Vec<NodeId> {
        self.closure(id, &self.children)
    }

    fn closure(
        &self,
        start: &NodeId,
        links: &BTreeMap<&'a NodeId, Vec<&'a NodeId>>,
    ) -> Vec<NodeId> {
        let mut visited = BTreeSet::from([start]);
        let mut to_visit: VecDeque<&NodeId> = links
            .get(start)
            .map(|next| next.iter().copied().collect())
            .unwrap_or_default();
        let mut result = Vec::new();

        while let Some(current) = to_visit.pop_front() {
            if visited.insert(current) {
                result.push(current.clone());
                if let Some(next) = links.get(current) {
                    to_visit.extend(next.iter().copied());
                }
            }
        }

        result
    }
}

/// Object of a property row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PropertyObject {
    Class { id: NodeId, label: String },
    Datatype { name: String },
}

impl PropertyObject {
    #[must_use]
    pub fn is_datatype(&self) -> bool {
        matches!(self, Self::Datatype { .. })
    }
}

/// One line of the triples view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "row", rename_all = "snake_case")]
pub enum TripleRow {
    /// A class, nested under the parent it was reached through.
    Subject {
        node: NodeId,
        label: String,
        depth: usize,
        parent: Option<NodeId>,
    },
    /// A direct, non-subclass property of `subject`.
    ///
    /// `inline` marks rows expanded below an object-property target rather
    /// than listed under their own class.
    Property {
        subject: NodeId,
        predicate: String,
        object: PropertyObject,
        depth: usize,
        inline: bool,
    },
}

impl TripleRow {
    #[must_use]
    pub fn depth(&self) -> usize {
        match self {
            Self::Subject { depth, .. } | Self::Property { depth, .. } => *depth,
        }
    }

    #[must_use]
    pub fn is_subject(&self) -> bool {
        matches!(self, Self::Subject { .. })
    }
}

/// Ordered rows produced by [`HierarchyBuilder`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TriplesView {
    pub rows: Vec<TripleRow>,
}

impl TriplesView {
    /// Subject rows as `(label, depth)` pairs, in display order.
    #[must_use]
    pub fn subjects(&self) -> Vec<(&str, usize)> {
        self.rows
            .iter()
            .filter_map(|row| match row {
                TripleRow::Subject { label, depth, .. } => Some((label.as_str(), *depth)),
                TripleRow::Property { .. } => None,
            })
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl Display for TriplesView {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut labels: BTreeMap<&NodeId, &str> = BTreeMap::new();
        for row in &self.rows {
            if let TripleRow::Subject { node, label, .. } = row {
                labels.insert(node, label);
            }
        }

        for row in &self.rows {
            let indent = "  ".repeat(row.depth());
            match row {
                TripleRow::Subject { label, parent, .. } => {
                    match parent.as_ref().and_then(|p| labels.get(p)) {
                        Some(parent_label) => {
                            writeln!(f, "{indent}{label} (subClassOf {parent_label})")?;
                        }
                        None => writeln!(f, "{indent}{label}")?,
                    }
                }
                TripleRow::Property {
                    predicate, object, ..
                } => match object {
                    PropertyObject::Class { label, .. } => {
                        writeln!(f, "{indent}{predicate} -> {label}")?;
                    }
                    PropertyObject::Datatype { name } => {
                        writeln!(f, "{indent}{predicate}: {name}")?;
                    }
                },
            }
        }
        Ok(())
    }
}

/// Derives the deterministic triples view from an [`Ontology`].
///
/// Every class is emitted exactly once, including classes that only sit on a
/// `subClassOf` cycle, and traversal always terminates.
pub struct HierarchyBuilder<'a> {
    ontology: &'a Ontology,
    expand_object_targets: bool,
}

impl<'a> HierarchyBuilder<'a> {
    #[must_use]
    pub fn new(ontology: &'a Ontology) -> Self {
        Self {
            ontology,
            expand_object_targets: false,
        }
    }

    /// Nests the direct properties of object-property targets below the row.
    #[must_use]
    pub fn expand_object_targets(mut self, expand: bool) -> Self {
        self.expand_object_targets = expand;
        self
    }

    #[must_use]
    pub fn build(&self) -> TriplesView {
        let forest = SubclassForest::new(self.ontology);
        let mut visited: BTreeSet<&NodeId> = BTreeSet::new();
        let mut rows = Vec::new();

        let roots = forest.roots();
        let orphans = self.ontology.classes();
        for start in roots.into_iter().chain(orphans) {
            if visited.contains(&start.id) {
                continue;
            }
            self.traverse(&forest, start, &mut visited, &mut rows);
        }

        TriplesView { rows }
    }

    fn traverse(
        &self,
        forest: &SubclassForest<'a>,
        start: &'a ClassNode,
        visited: &mut BTreeSet<&'a NodeId>,
        rows: &mut Vec<TripleRow>,
    ) {
        let mut stack: Vec<(&'a ClassNode, usize, Option<&'a NodeId>)> = vec![(start, 0, None)];

        while let Some((node, depth, parent)) = stack.pop() {
            if !visited.insert(&node.id) {
                continue;
            }
            if !node.is_class() {
                continue;
            }
            tracing::trace!(class = %node.label, depth, "hierarchy_subject");
            rows.push(TripleRow::Subject {
                node: node.id.clone(),
                label: node.label.clone(),
                depth,
                parent: parent.cloned(),
            });

            let mut branch = BTreeSet::from([&node.id]);
            self.push_properties(node, depth + 1, false, &mut branch, rows);

            for child in forest.children(&node.id).iter().rev() {
                if visited.contains(child) {
                    continue;
                }
                if let Some(child_node) = self.ontology.find_node_by_id(child) {
                    stack.push((child_node, depth + 1, Some(&node.id)));
                }
            }
        }
    }

    fn push_properties(
        &self,
        node: &'a ClassNode,
        depth: usize,
        inline: bool,
        branch: &mut BTreeSet<&'a NodeId>,
        rows: &mut Vec<TripleRow>,
    ) {
        for edge in self.ontology.edges_from(&node.id) {
            match &edge.kind {
                EdgeKind::SubClassOf { .. } => {}
                EdgeKind::DatatypeProperty { datatype } => rows.push(TripleRow::Property {
                    subject: node.id.clone(),
                    predicate: edge.predicate.clone(),
                    object: PropertyObject::Datatype {
                        name: datatype.clone(),
                    },
                    depth,
                    inline,
                }),
                EdgeKind::ObjectProperty { target } => {
                    let Some(target_node) = self.ontology.find_node_by_id(target) else {
                        continue;
                    };
                    rows.push(TripleRow::Property {
                        subject: node.id.clone(),
                        predicate: edge.predicate.clone(),
                        object: PropertyObject::Class {
                            id: target.clone(),
                            label: target_node.label.clone(),
                        },
                        depth,
                        inline,
                    });
                    if self.expand_object_targets && branch.insert(&target_node.id) {
                        self.push_properties(target_node, depth + 1, true, branch, rows);
                        branch.remove(&target_node.id);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ontology::{EdgeEnd, SUBCLASS_OF};

    fn sub(ontology: &mut Ontology, child: &NodeId, parent: &NodeId) {
        ontology
            .add_edge(child, SUBCLASS_OF, EdgeEnd::Class(parent.clone()))
            .expect("subclass edge");
    }

    #[test]
    fn animal_dog_scenario() {
        let mut ontology = Ontology::new();
        let animal = ontology.add_node("Animal").into_inner();
        let dog = ontology.add_node("Dog").into_inner();
        sub(&mut ontology, &dog, &animal);

        let view = HierarchyBuilder::new(&ontology).build();
        assert_eq!(
            view.rows,
            vec![
                TripleRow::Subject {
                    node: animal.clone(),
                    label: "Animal".into(),
                    depth: 0,
                    parent: None,
                },
                TripleRow::Subject {
                    node: dog,
                    label: "Dog".into(),
                    depth: 1,
                    parent: Some(animal),
                },
            ]
        );
    }

    #[test]
    fn pure_cycle_is_emitted_once_per_class() {
        let mut ontology = Ontology::new();
        let a = ontology.add_node("A").into_inner();
        let b = ontology.add_node("B").into_inner();
        sub(&mut ontology, &a, &b);
        sub(&mut ontology, &b, &a);

        let view = HierarchyBuilder::new(&ontology).build();
        assert_eq!(view.subjects(), vec![("A", 0), ("B", 1)]);
    }

    #[test]
    fn multi_parent_class_appears_under_first_parent_only() {
        let mut ontology = Ontology::new();
        let pet = ontology.add_node("Pet").into_inner();
        let mammal = ontology.add_node("Mammal").into_inner();
        let dog = ontology.add_node("Dog").into_inner();
        sub(&mut ontology, &dog, &pet);
        sub(&mut ontology, &dog, &mammal);

        let view = HierarchyBuilder::new(&ontology).build();
        assert_eq!(view.subjects(), vec![("Pet", 0), ("Dog", 1), ("Mammal", 0)]);
        let forest = SubclassForest::new(&ontology);
        assert_eq!(forest.parents(&dog).len(), 2);
    }

    #[test]
    fn property_rows_follow_their_subject() {
        let mut ontology = Ontology::new();
        let dog = ontology.add_node("Dog").into_inner();
        let bone = ontology.add_node("Bone").into_inner();
        ontology.add_datatype_node("String");
        ontology
            .add_edge(&dog, "chews", EdgeEnd::Class(bone))
            .expect("object edge");
        ontology
            .add_edge(&dog, "breed", EdgeEnd::Datatype("String".into()))
            .expect("datatype edge");

        let view = HierarchyBuilder::new(&ontology).build();
        assert_eq!(view.to_string(), "Dog\n  chews -> Bone\n  breed: String\nBone\n");
        assert!(view.rows.iter().all(|row| !matches!(
            row,
            TripleRow::Subject { label, .. } if label == "String"
        )));
    }

    #[test]
    fn inline_expansion_is_cycle_guarded() {
        let mut ontology = Ontology::new();
        let owner = ontology.add_node("Owner").into_inner();
        let pet = ontology.add_node("Pet").into_inner();
        ontology
            .add_edge(&owner, "owns", EdgeEnd::Class(pet.clone()))
            .expect("owns");
        ontology
            .add_edge(&pet, "ownedBy", EdgeEnd::Class(owner))
            .expect("ownedBy");

        let view = HierarchyBuilder::new(&ontology)
            .expand_object_targets(true)
            .build();
        assert_eq!(
            view.to_string(),
            "Owner\n  owns -> Pet\n    ownedBy -> Owner\nPet\n  ownedBy -> Owner\n    owns -> Pet\n"
        );
    }

    #[test]
    fn ancestors_and_descendants_are_transitive_and_cycle_safe() {
        let mut ontology = Ontology::new();
        let a = ontology.add_node("A").into_inner();
        let b = ontology.add_node("B").into_inner();
        let c = ontology.add_node("C").into_inner();
        sub(&mut ontology, &c, &b);
        sub(&mut ontology, &b, &a);
        sub(&mut ontology, &a, &c);

        let forest = SubclassForest::new(&ontology);
        assert_eq!(forest.ancestors(&c), vec![b.clone(), a.clone()]);
        assert_eq!(forest.descendants(&a), vec![b, c]);
        assert!(forest.roots().is_empty());
    }
}
