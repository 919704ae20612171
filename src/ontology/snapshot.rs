//! Boundary shapes exchanged with storage and the canvas.
//!
//! [`GraphSnapshot`] is the canonical wire form. [`CanvasGraph`] decodes the
//! older canvas document where the kind of an edge was implied by which
//! fields were present.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::entities::{ClassNode, EdgeKind, NodeRole, PropertyEdge, SUBCLASS_OF};
use super::value_objects::{EdgeId, NodeId};

/// `{ nodes, edges }` as persisted and handed to the canvas.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    #[serde(default)]
    pub nodes: Vec<ClassNode>,
    #[serde(default)]
    pub edges: Vec<PropertyEdge>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CanvasPosition {
    pub x: f64,
    pub y: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CanvasNodeData {
    pub label: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CanvasNode {
    pub id: String,
    pub data: CanvasNodeData,
    #[serde(default)]
    pub position: Option<CanvasPosition>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CanvasEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub datatype: Option<String>,
}

/// Canvas document with duck-typed edges.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CanvasGraph {
    #[serde(default)]
    pub nodes: Vec<CanvasNode>,
    #[serde(default)]
    pub edges: Vec<CanvasEdge>,
}

impl CanvasGraph {
    /// Converts into the tagged model.
    ///
    /// An edge with a `datatype` becomes a datatype property and its target
    /// node is marked as a datatype marker; `subClassOf` labels select
    /// subclass edges; a missing label falls back to `default_relation`.
    #[must_use]
    pub fn into_snapshot(self, default_relation: &str) -> GraphSnapshot {
        let marker_ids: BTreeSet<&str> = self
            .edges
            .iter()
            .filter(|edge| edge.datatype.is_some())
            .map(|edge| edge.target.as_str())
            .collect();

        let nodes = self
            .nodes
            .iter()
            .map(|node| ClassNode {
                id: NodeId::from(node.id.as_str()),
                label: node.data.label.clone(),
                role: if marker_ids.contains(node.id.as_str()) {
                    NodeRole::Datatype
                } else {
                    NodeRole::Class
                },
            })
            .collect();

        let edges = self
            .edges
            .iter()
            .map(|edge| {
                let predicate = edge
                    .label
                    .clone()
                    .filter(|label| !label.trim().is_empty())
                    .unwrap_or_else(|| default_relation.to_string());
                let target = NodeId::from(edge.target.as_str());
                let kind = match &edge.datatype {
                    Some(datatype) => EdgeKind::DatatypeProperty {
                        datatype: datatype.clone(),
                    },
                    None if predicate == SUBCLASS_OF => EdgeKind::SubClassOf { target },
                    None => EdgeKind::ObjectProperty { target },
                };
                PropertyEdge {
                    id: EdgeId::from(edge.id.as_str()),
                    source: NodeId::from(edge.source.as_str()),
                    predicate,
                    kind,
                }
            })
            .collect();

        GraphSnapshot { nodes, edges }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ontology::Ontology;

    #[test]
    fn tagged_edges_serialise_with_kind_discriminator() {
        let edge = PropertyEdge {
            id: EdgeId::from("e1"),
            source: NodeId::from("dog"),
            predicate: "breed".into(),
            kind: EdgeKind::DatatypeProperty {
                datatype: "String".into(),
            },
        };
        let value = serde_json::to_value(&edge).expect("serialise");
        assert_eq!(
            value,
            serde_json::json!({
                "id": "e1",
                "source": "dog",
                "predicate": "breed",
                "kind": "datatype_property",
                "datatype": "String",
            })
        );
        let back: PropertyEdge = serde_json::from_value(value).expect("deserialise");
        assert_eq!(back, edge);
    }

    #[test]
    fn edge_without_kind_is_rejected() {
        let result: Result<PropertyEdge, _> = serde_json::from_value(serde_json::json!({
            "id": "e1",
            "source": "dog",
            "predicate": "breed",
            "target": "animal",
        }));
        assert!(result.is_err());
    }

    #[test]
    fn canvas_documents_are_decoded_into_tagged_edges() {
        let canvas: CanvasGraph = serde_json::from_value(serde_json::json!({
            "nodes": [
                {"id": "1", "data": {"label": "Animal"}, "position": {"x": 0.0, "y": 0.0}},
                {"id": "2", "data": {"label": "Dog"}},
                {"id": "3", "data": {"label": "String"}},
            ],
            "edges": [
                {"id": "e1", "source": "2", "target": "1", "label": "subClassOf"},
                {"id": "e2", "source": "2", "target": "3", "label": "breed", "datatype": "String"},
                {"id": "e3", "source": "2", "target": "1"},
            ]
        }))
        .expect("canvas document");

        let snapshot = canvas.into_snapshot("relatedTo");
        assert_eq!(snapshot.nodes[2].role, NodeRole::Datatype);
        assert!(snapshot.edges[0].kind.is_subclass_of());
        assert_eq!(snapshot.edges[1].datatype(), Some("String"));
        assert_eq!(snapshot.edges[2].predicate, "relatedTo");

        let ontology = Ontology::from_snapshot(snapshot).expect("valid graph");
        assert_eq!(ontology.class_count(), 2);
    }
}
