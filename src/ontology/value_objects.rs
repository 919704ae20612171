use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use oxrdf::NamedNode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Value object ensuring that supplied text represents a valid IRI.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Iri {
    value: String,
}

impl Iri {
    /// Validates and constructs a new [`Iri`] value object.
    ///
    /// The constructor rejects malformed identifiers so that every minted
    /// class or property URI is usable in an RDF document.
    pub fn new(value: impl Into<String>) -> Result<Self, IriError> {
        let value = value.into();
        NamedNode::new(value.as_str()).map_err(|_| IriError::Invalid {
            value: value.clone(),
        })?;
        Ok(Self { value })
    }

    /// Appends a local name to a namespace IRI.
    pub fn join(&self, local: &str) -> Result<Self, IriError> {
        Self::new(format!("{}{local}", self.value))
    }

    /// Returns the underlying textual representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.value
    }
}

impl Display for Iri {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl FromStr for Iri {
    type Err = IriError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_owned())
    }
}

impl TryFrom<String> for Iri {
    type Error = IriError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Errors produced when validating an [`Iri`].
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum IriError {
    /// The provided text could not be parsed as an IRI.
    #[error("invalid IRI: {value}")]
    Invalid { value: String },
}

macro_rules! opaque_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Mints a fresh random identifier.
            #[must_use]
            pub fn generate() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }

            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

opaque_id!(
    /// Stable identifier of a [`super::ClassNode`].
    NodeId
);

opaque_id!(
    /// Stable identifier of a [`super::PropertyEdge`].
    EdgeId
);

/// Turns a label into the local part of a URI: every whitespace character becomes `_`.
#[must_use]
pub fn slugify(label: &str) -> String {
    label
        .chars()
        .map(|ch| if ch.is_whitespace() { '_' } else { ch })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{slugify, Iri, NodeId};

    #[test]
    fn accepts_valid_iri() {
        let iri = Iri::new("https://example.org/resource").expect("valid IRI");
        assert_eq!(iri.as_str(), "https://example.org/resource");
    }

    #[test]
    fn rejects_invalid_iri() {
        let err = Iri::new("not an iri").expect_err("invalid IRI");
        assert!(matches!(err, super::IriError::Invalid { value } if value == "not an iri"));
    }

    #[test]
    fn joins_local_names() {
        let base = Iri::new("http://example.org/ontology#").expect("base");
        let joined = base.join("Dog").expect("joined");
        assert_eq!(joined.as_str(), "http://example.org/ontology#Dog");
        assert!(base.join("has space").is_err());
    }

    #[test]
    fn slugify_replaces_whitespace() {
        assert_eq!(slugify("Golden Retriever"), "Golden_Retriever");
        assert_eq!(slugify("Big \tCat"), "Big__Cat");
        assert_eq!(slugify("Dog"), "Dog");
    }

    #[test]
    fn generated_ids_are_unique() {
        assert_ne!(NodeId::generate(), NodeId::generate());
    }
}
