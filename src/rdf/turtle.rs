//! Turtle serialisation of an [`Ontology`].
//!
//! Output is byte-for-byte reproducible: classes in node order, then
//! `rdfs:subClassOf` statements in edge order, then one declaration per
//! `(predicate, kind)` in order of first use. A predicate used by several
//! edges is declared once, with the domain and range of its first edge.

use std::collections::BTreeSet;
use std::fmt::Write;

use oxrdf::Literal;

use super::{local_name, xsd_local_name, Namespace, RdfError, OWL, RDF, RDFS, XSD};
use crate::ontology::{EdgeKind, Iri, NodeId, Ontology};

pub struct TurtleExporter<'a> {
    namespace: &'a Namespace,
}

impl<'a> TurtleExporter<'a> {
    #[must_use]
    pub fn new(namespace: &'a Namespace) -> Self {
        Self { namespace }
    }

    /// Renders the ontology as a Turtle document.
    ///
    /// # Errors
    ///
    /// Fails only when the namespace base does not accept a local name.
    pub fn export(&self, ontology: &Ontology) -> Result<String, RdfError> {
        let mut out = String::new();
        let _ = writeln!(out, "@prefix : <{}> .", self.namespace.base());
        let _ = writeln!(out, "@prefix owl: <{OWL}> .");
        let _ = writeln!(out, "@prefix rdf: <{RDF}> .");
        let _ = writeln!(out, "@prefix rdfs: <{RDFS}> .");
        let _ = writeln!(out, "@prefix xsd: <{XSD}> .");

        let mut classes = BTreeSet::new();
        for class in ontology.classes() {
            let term = self.term(&class.label)?;
            if !classes.insert(term.clone()) {
                continue;
            }
            let _ = write!(
                out,
                "\n{term} a owl:Class ;\n    rdfs:label {} .\n",
                Literal::new_simple_literal(class.label.as_str())
            );
        }

        let mut statements = Vec::new();
        let mut seen = BTreeSet::new();
        for edge in ontology.edges() {
            let EdgeKind::SubClassOf { target } = &edge.kind else {
                continue;
            };
            let (Some(child), Some(parent)) = (
                self.label_term(ontology, &edge.source)?,
                self.label_term(ontology, target)?,
            ) else {
                continue;
            };
            let statement = format!("{child} rdfs:subClassOf {parent} .");
            if seen.insert(statement.clone()) {
                statements.push(statement);
            }
        }
        if !statements.is_empty() {
            out.push('\n');
            for statement in statements {
                let _ = writeln!(out, "{statement}");
            }
        }

        let mut declared = BTreeSet::new();
        for edge in ontology.edges() {
            let (kind, range) = match &edge.kind {
                EdgeKind::SubClassOf { .. } => continue,
                EdgeKind::ObjectProperty { target } => {
                    let Some(range) = self.label_term(ontology, target)? else {
                        continue;
                    };
                    ("owl:ObjectProperty", range)
                }
                EdgeKind::DatatypeProperty { datatype } => {
                    ("owl:DatatypeProperty", xsd_term(datatype)?)
                }
            };
            let property = self.term(&edge.predicate)?;
            if !declared.insert((property.clone(), kind)) {
                continue;
            }
            let Some(domain) = self.label_term(ontology, &edge.source)? else {
                continue;
            };
            let _ = write!(
                out,
                "\n{property} a {kind} ;\n    rdfs:domain {domain} ;\n    rdfs:range {range} .\n"
            );
        }

        tracing::debug!(bytes = out.len(), "turtle_exported");
        Ok(out)
    }

    fn term(&self, label: &str) -> Result<String, RdfError> {
        let iri = self.namespace.term(label)?;
        let local = local_name(label);
        Ok(if is_prefixed_local(&local) {
            format!(":{local}")
        } else {
            format!("<{iri}>")
        })
    }

    fn label_term(&self, ontology: &Ontology, id: &NodeId) -> Result<Option<String>, RdfError> {
        ontology
            .find_node_by_id(id)
            .map(|node| self.term(&node.label))
            .transpose()
    }
}

fn xsd_term(datatype: &str) -> Result<String, RdfError> {
    let local = local_name(&xsd_local_name(datatype));
    if is_prefixed_local(&local) {
        return Ok(format!("xsd:{local}"));
    }
    let iri = Iri::new(format!("{XSD}{local}")).map_err(|source| RdfError::InvalidIri {
        label: datatype.to_string(),
        source,
    })?;
    Ok(format!("<{iri}>"))
}

/// Whether `local` can follow a prefix without escaping.
fn is_prefixed_local(local: &str) -> bool {
    let mut chars = local.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_alphanumeric() || first == '_')
        && chars.all(|ch| ch.is_alphanumeric() || ch == '_' || ch == '-')
}
