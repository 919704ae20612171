//! Canonical ontology graph: classes, typed property edges and the views
//! derived from them.
//!
//! [`Ontology`] owns the node and edge lists. Everything else in the crate
//! (the action protocol, the RDF codecs, the hierarchy view) reads or
//! rewrites it through the operations defined here.

pub mod entities;
pub mod hierarchy;
pub mod snapshot;
pub mod value_objects;

pub use entities::{
    ClassNode, EdgeEnd, EdgeKind, Insertion, NodeRole, Ontology, OntologyError, PropertyEdge,
    SUBCLASS_OF,
};
pub use hierarchy::{HierarchyBuilder, PropertyObject, SubclassForest, TripleRow, TriplesView};
pub use snapshot::{CanvasGraph, GraphSnapshot};
pub use value_objects::{slugify, EdgeId, Iri, IriError, NodeId};
