//! # Crate Errors
//!
//! Module level errors convert into [`Error`] so callers that only care about
//! "did it work" can use a single `Result` alias.

use crate::{
    config::ConfigError, knowledge::KnowledgeError, ontology::OntologyError, rdf::RdfError,
};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Ontology(#[from] OntologyError),

    #[error(transparent)]
    Rdf(#[from] RdfError),

    #[error(transparent)]
    Knowledge(#[from] KnowledgeError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Any(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    pub fn wrap(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Any(Box::new(err))
    }
}
