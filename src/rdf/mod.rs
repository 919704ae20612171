//! Mapping between the graph model and RDF serialisations.
//!
//! * [`turtle`] writes Turtle (export only).
//! * [`jsonld`] writes and reads JSON-LD documents.
//!
//! Classes and properties are minted as `{base}{local}` where the local name
//! is the label with whitespace replaced by `_` and any character an IRI
//! segment cannot hold percent-encoded. Classes sharing a label therefore
//! share a URI.

pub mod jsonld;
pub mod turtle;

use std::fmt::Write;

use thiserror::Error;

pub use jsonld::{JsonLdExporter, JsonLdImporter};
pub use turtle::TurtleExporter;

use crate::{
    config::NamespaceSettings,
    ontology::{slugify, Iri, IriError},
};

/// Namespace used for classes and properties unless configured otherwise.
pub const DEFAULT_BASE: &str = "http://example.org/ontology#";

pub const OWL: &str = "http://www.w3.org/2002/07/owl#";
pub const RDF: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
pub const RDFS: &str = "http://www.w3.org/2000/01/rdf-schema#";
pub const XSD: &str = "http://www.w3.org/2001/XMLSchema#";

/// Root of the named graphs used by the storage collaborator.
pub const GRAPH_ROOT: &str = "http://ontology-editor.local";

/// Datatypes with a dedicated `xsd:` term, as `(name, xsd local name)`.
const XSD_DATATYPES: [(&str, &str); 7] = [
    ("String", "string"),
    ("Integer", "integer"),
    ("Float", "float"),
    ("Double", "double"),
    ("Boolean", "boolean"),
    ("Date", "date"),
    ("DateTime", "dateTime"),
];

#[derive(Debug, Error)]
pub enum RdfError {
    #[error("JSON-LD document has no `@context`")]
    MissingContext,
    #[error("invalid JSON-LD document: {0}")]
    InvalidDocument(String),
    #[error("`{label}` cannot be turned into an IRI")]
    InvalidIri { label: String, source: IriError },
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// `xsd:` local name for a datatype name.
///
/// Known names map case-insensitively; anything else passes through as is.
#[must_use]
pub fn xsd_local_name(datatype: &str) -> String {
    XSD_DATATYPES
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(datatype))
        .map_or_else(|| datatype.to_string(), |(_, local)| (*local).to_string())
}

/// Datatype name for an `xsd:` local name; inverse of [`xsd_local_name`].
#[must_use]
pub fn datatype_from_xsd(local: &str) -> String {
    XSD_DATATYPES
        .iter()
        .find(|(_, xsd)| *xsd == local)
        .map_or_else(|| local.to_string(), |(name, _)| (*name).to_string())
}

/// Local part of the URI minted for a label.
///
/// Whitespace becomes `_`. ASCII outside the unreserved and sub-delimiter
/// sets, and non-ASCII that is not alphanumeric, is written as `%XX` UTF-8
/// bytes, so `#`, `/`, `:` and `%` never leak into the IRI structure.
#[must_use]
pub fn local_name(label: &str) -> String {
    let mut out = String::with_capacity(label.len());
    for ch in slugify(label).chars() {
        if is_verbatim(ch) {
            out.push(ch);
            continue;
        }
        let mut buf = [0u8; 4];
        for byte in ch.encode_utf8(&mut buf).bytes() {
            let _ = write!(out, "%{byte:02X}");
        }
    }
    out
}

fn is_verbatim(ch: char) -> bool {
    if ch.is_ascii() {
        ch.is_ascii_alphanumeric() || "-._~!$&'()*+,;=".contains(ch)
    } else {
        ch.is_alphanumeric()
    }
}

/// Named graph holding one user's ontology.
#[must_use]
pub fn ontology_graph_uri(user: &str, ontology_id: &str) -> String {
    format!("{GRAPH_ROOT}/users/{user}/ontologies/{ontology_id}")
}

/// Named graph holding a knowledge graph of an ontology.
#[must_use]
pub fn knowledge_graph_uri(user: &str, ontology_id: &str, knowledge_graph_id: &str) -> String {
    format!(
        "{}/kg/{knowledge_graph_id}",
        ontology_graph_uri(user, ontology_id)
    )
}

/// Base IRI used to mint class and property URIs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Namespace {
    base: Iri,
}

impl Namespace {
    #[must_use]
    pub fn new(base: Iri) -> Self {
        Self { base }
    }

    pub fn from_settings(settings: &NamespaceSettings) -> Result<Self, RdfError> {
        let base = Iri::new(settings.base.clone()).map_err(|source| RdfError::InvalidIri {
            label: settings.base.clone(),
            source,
        })?;
        Ok(Self::new(base))
    }

    #[must_use]
    pub fn base(&self) -> &Iri {
        &self.base
    }

    /// Full IRI for a class or property label.
    ///
    /// # Errors
    ///
    /// Only fails when the base itself does not accept a local name.
    pub fn term(&self, label: &str) -> Result<Iri, RdfError> {
        self.base
            .join(&local_name(label))
            .map_err(|source| RdfError::InvalidIri {
                label: label.to_string(),
                source,
            })
    }
}
