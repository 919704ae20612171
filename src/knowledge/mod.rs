//! Knowledge graphs: named sets of instances validated against one ontology.

pub mod entities;
pub mod export;
pub mod store;

use thiserror::Error;
use uuid::Uuid;

pub use entities::{DanglingReference, InstanceLink, KnowledgeGraph, RelationshipKey};
pub use export::KnowledgeGraphExporter;
pub use store::{
    KnowledgeGraphEditor, KnowledgeGraphRecord, KnowledgeGraphStore, Save, MAX_NAME_LENGTH,
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum KnowledgeError {
    #[error("knowledge graph `{0}` does not exist")]
    UnknownGraph(Uuid),
    #[error("knowledge graph name must not be blank")]
    EmptyName,
    #[error("knowledge graph name is longer than {max} characters")]
    NameTooLong { max: usize },
    #[error("`{0}` is not a `source:predicate:target` relationship key")]
    InvalidRelationshipKey(String),
}
