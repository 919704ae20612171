//! JSON-LD export and import.
//!
//! Exported documents carry a `@context` whose `@vocab` is the namespace
//! base, so class and property `@id`s are the bare slugs. Keys are sorted,
//! which keeps the pretty-printed text stable for a given graph.

use std::collections::BTreeMap;

use serde_json::{json, Map, Value};

use super::{
    datatype_from_xsd, local_name, xsd_local_name, Namespace, RdfError, OWL, RDF, RDFS, XSD,
};
use crate::ontology::{EdgeEnd, EdgeKind, NodeId, Ontology, SUBCLASS_OF};

const OWL_CLASS: &str = "owl:Class";
const OWL_OBJECT_PROPERTY: &str = "owl:ObjectProperty";
const OWL_DATATYPE_PROPERTY: &str = "owl:DatatypeProperty";

/// The `@context` shared by ontology and knowledge-graph documents.
#[must_use]
pub fn context(namespace: &Namespace) -> Value {
    json!({
        "@vocab": namespace.base().as_str(),
        "owl": OWL,
        "rdfs": RDFS,
        "xsd": XSD,
    })
}

/// `{"@id": id}`, or an array of them when there is more than one.
pub(crate) fn id_refs(ids: &[String]) -> Value {
    match ids {
        [single] => json!({ "@id": single }),
        many => Value::Array(many.iter().map(|id| json!({ "@id": id })).collect()),
    }
}

/// Range reference of a datatype property.
///
/// Names that would not come back unchanged from the `xsd:` term (`integer`
/// reads back as `Integer`) carry their own `rdfs:label`.
fn datatype_range(datatype: &str) -> Value {
    let local = local_name(&xsd_local_name(datatype));
    let mut range = json!({ "@id": format!("xsd:{local}") });
    if datatype_from_xsd(&local) != datatype {
        range["rdfs:label"] = json!(datatype);
    }
    range
}

fn one_or_many(mut values: Vec<Value>) -> Value {
    if values.len() == 1 {
        values.remove(0)
    } else {
        Value::Array(values)
    }
}

struct PropertyDeclaration {
    id: String,
    kind: &'static str,
    label: String,
    domains: Vec<String>,
    ranges: Vec<Value>,
}

impl PropertyDeclaration {
    fn push_pair(&mut self, domain: String, range: Value) {
        let exists = self
            .domains
            .iter()
            .zip(&self.ranges)
            .any(|(d, r)| *d == domain && *r == range);
        if !exists {
            self.domains.push(domain);
            self.ranges.push(range);
        }
    }

    fn into_entry(self) -> Value {
        json!({
            "@id": self.id,
            "@type": self.kind,
            "rdfs:label": self.label,
            "rdfs:domain": id_refs(&self.domains),
            "rdfs:range": one_or_many(self.ranges),
        })
    }
}

pub struct JsonLdExporter<'a> {
    namespace: &'a Namespace,
}

impl<'a> JsonLdExporter<'a> {
    #[must_use]
    pub fn new(namespace: &'a Namespace) -> Self {
        Self { namespace }
    }

    /// Builds the JSON-LD document for `ontology`, titled `name`.
    ///
    /// `subClassOf` is folded into the child's class entry. Other edges
    /// produce one declaration per `(predicate, kind)`; when several edges
    /// share it, `rdfs:domain` and `rdfs:range` become parallel arrays.
    ///
    /// # Errors
    ///
    /// Fails when a label cannot be embedded in an IRI.
    pub fn document(&self, ontology: &Ontology, name: &str) -> Result<Value, RdfError> {
        let mut classes: Vec<(String, Map<String, Value>)> = Vec::new();
        let mut parents: BTreeMap<String, Vec<String>> = BTreeMap::new();

        for class in ontology.classes() {
            let slug = self.slug(&class.label)?;
            if classes.iter().any(|(id, _)| *id == slug) {
                continue;
            }
            let mut entry = Map::new();
            entry.insert("@id".to_string(), json!(slug));
            entry.insert("@type".to_string(), json!(OWL_CLASS));
            entry.insert("rdfs:label".to_string(), json!(class.label));
            classes.push((slug, entry));
        }

        let mut properties: Vec<PropertyDeclaration> = Vec::new();
        for edge in ontology.edges() {
            let Some(source) = ontology.find_node_by_id(&edge.source) else {
                continue;
            };
            let domain = self.slug(&source.label)?;
            let (kind, range) = match &edge.kind {
                EdgeKind::SubClassOf { target } => {
                    if let Some(parent) = ontology.find_node_by_id(target) {
                        let parent = self.slug(&parent.label)?;
                        let list = parents.entry(domain).or_default();
                        if !list.contains(&parent) {
                            list.push(parent);
                        }
                    }
                    continue;
                }
                EdgeKind::ObjectProperty { target } => {
                    let Some(target) = ontology.find_node_by_id(target) else {
                        continue;
                    };
                    (OWL_OBJECT_PROPERTY, json!({ "@id": self.slug(&target.label)? }))
                }
                EdgeKind::DatatypeProperty { datatype } => {
                    (OWL_DATATYPE_PROPERTY, datatype_range(datatype))
                }
            };

            let id = self.slug(&edge.predicate)?;
            match properties
                .iter_mut()
                .find(|declaration| declaration.id == id && declaration.kind == kind)
            {
                Some(declaration) => declaration.push_pair(domain, range),
                None => properties.push(PropertyDeclaration {
                    id,
                    kind,
                    label: edge.predicate.clone(),
                    domains: vec![domain],
                    ranges: vec![range],
                }),
            }
        }

        let mut graph = Vec::with_capacity(classes.len() + properties.len());
        for (slug, mut entry) in classes {
            if let Some(parents) = parents.get(&slug) {
                entry.insert("rdfs:subClassOf".to_string(), id_refs(parents));
            }
            graph.push(Value::Object(entry));
        }
        graph.extend(properties.into_iter().map(PropertyDeclaration::into_entry));

        Ok(json!({
            "@context": context(self.namespace),
            "@id": local_name(name),
            "@type": "owl:Ontology",
            "rdfs:label": name,
            "@graph": graph,
        }))
    }

    /// Pretty-printed form of [`Self::document`].
    pub fn export(&self, ontology: &Ontology, name: &str) -> Result<String, RdfError> {
        let text = serde_json::to_string_pretty(&self.document(ontology, name)?)?;
        tracing::debug!(bytes = text.len(), "jsonld_exported");
        Ok(text)
    }

    fn slug(&self, label: &str) -> Result<String, RdfError> {
        self.namespace.term(label)?;
        Ok(local_name(label))
    }
}

/// Prefixes and vocabulary in effect for one document.
struct Context {
    vocab: String,
    prefixes: BTreeMap<String, String>,
}

impl Context {
    fn read(value: &Value, default_vocab: &str) -> Result<Self, RdfError> {
        let mut context = Self {
            vocab: default_vocab.to_string(),
            prefixes: [("owl", OWL), ("rdf", RDF), ("rdfs", RDFS), ("xsd", XSD)]
                .into_iter()
                .map(|(prefix, iri)| (prefix.to_string(), iri.to_string()))
                .collect(),
        };
        match value {
            Value::Null => return Err(RdfError::MissingContext),
            Value::Object(map) => context.merge(map),
            Value::Array(items) => {
                for map in items.iter().filter_map(Value::as_object) {
                    context.merge(map);
                }
            }
            // Remote contexts are not fetched.
            _ => {}
        }
        Ok(context)
    }

    fn merge(&mut self, map: &Map<String, Value>) {
        for (key, value) in map {
            let Some(iri) = value.as_str() else {
                continue;
            };
            if key == "@vocab" {
                self.vocab = iri.to_string();
            } else if !key.starts_with('@') {
                self.prefixes.insert(key.clone(), iri.to_string());
            }
        }
    }

    /// Expands a compact IRI, absolute IRI or vocabulary term.
    fn expand(&self, term: &str) -> String {
        match term.split_once(':') {
            Some((prefix, rest)) => match self.prefixes.get(prefix) {
                Some(namespace) => format!("{namespace}{rest}"),
                None => term.to_string(),
            },
            None => format!("{}{term}", self.vocab),
        }
    }

    fn local_name<'t>(&self, iri: &'t str) -> &'t str {
        if let Some(local) = iri.strip_prefix(self.vocab.as_str()) {
            return local;
        }
        iri.rsplit(['#', '/']).next().unwrap_or(iri)
    }

    fn get<'v>(&self, entry: &'v Map<String, Value>, iri: &str) -> Option<&'v Value> {
        entry
            .iter()
            .find(|(key, _)| !key.starts_with('@') && self.expand(key) == iri)
            .map(|(_, value)| value)
    }

    fn types(&self, entry: &Map<String, Value>) -> Vec<String> {
        entry
            .get("@type")
            .map(|value| {
                references(value)
                    .into_iter()
                    .map(|term| self.expand(term))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn references(&self, entry: &Map<String, Value>, iri: &str) -> Vec<String> {
        self.get(entry, iri)
            .map(|value| {
                references(value)
                    .into_iter()
                    .map(|term| self.expand(term))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Like [`Self::references`], each paired with the `rdfs:label` of an
    /// object reference.
    fn labelled_references(
        &self,
        entry: &Map<String, Value>,
        iri: &str,
    ) -> Vec<(String, Option<String>)> {
        self.get(entry, iri)
            .map(|value| self.labelled(value))
            .unwrap_or_default()
    }

    fn labelled(&self, value: &Value) -> Vec<(String, Option<String>)> {
        match value {
            Value::String(term) => vec![(self.expand(term), None)],
            Value::Object(map) => map
                .get("@id")
                .and_then(Value::as_str)
                .map(|id| (self.expand(id), self.label(map)))
                .into_iter()
                .collect(),
            Value::Array(items) => items.iter().flat_map(|item| self.labelled(item)).collect(),
            _ => Vec::new(),
        }
    }

    fn label(&self, entry: &Map<String, Value>) -> Option<String> {
        let value = self.get(entry, &format!("{RDFS}label"))?;
        let value = match value {
            Value::Array(items) => items.first()?,
            other => other,
        };
        match value {
            Value::String(label) => Some(label.clone()),
            Value::Object(map) => map.get("@value")?.as_str().map(str::to_string),
            _ => None,
        }
    }
}

/// Terms referenced by a string, `{"@id": ..}` object or array of either.
fn references(value: &Value) -> Vec<&str> {
    match value {
        Value::String(term) => vec![term.as_str()],
        Value::Object(map) => map.get("@id").and_then(Value::as_str).into_iter().collect(),
        Value::Array(items) => items.iter().flat_map(references).collect(),
        _ => Vec::new(),
    }
}

enum PropertyKind {
    Object,
    Datatype,
}

/// Rebuilds an [`Ontology`] from a JSON-LD document.
pub struct JsonLdImporter<'a> {
    namespace: &'a Namespace,
}

impl<'a> JsonLdImporter<'a> {
    #[must_use]
    pub fn new(namespace: &'a Namespace) -> Self {
        Self { namespace }
    }

    pub fn import_str(&self, text: &str) -> Result<Ontology, RdfError> {
        let document: Value = serde_json::from_str(text)?;
        self.import(&document)
    }

    /// Builds a graph from the entries of `document`.
    ///
    /// `owl:Class` entries become classes, `rdfs:subClassOf` becomes subclass
    /// edges and property declarations become one edge per domain/range pair
    /// (pairwise when the arrays have equal length, otherwise every
    /// combination). Classes referenced but never declared are created.
    ///
    /// # Errors
    ///
    /// Fails without producing a graph when `@context` is missing or the
    /// document is not shaped like JSON-LD.
    pub fn import(&self, document: &Value) -> Result<Ontology, RdfError> {
        let Value::Object(root) = document else {
            return Err(RdfError::InvalidDocument(
                "top level must be a JSON object".to_string(),
            ));
        };
        let context = Context::read(
            root.get("@context").ok_or(RdfError::MissingContext)?,
            self.namespace.base().as_str(),
        )?;

        let entries: Vec<&Map<String, Value>> = match root.get("@graph") {
            Some(Value::Array(items)) => items.iter().filter_map(Value::as_object).collect(),
            Some(Value::Object(single)) => vec![single],
            Some(_) => {
                return Err(RdfError::InvalidDocument(
                    "`@graph` must be an array".to_string(),
                ))
            }
            None if root.contains_key("@id")
                && !context
                    .types(root)
                    .iter()
                    .any(|kind| *kind == format!("{OWL}Ontology")) =>
            {
                vec![root]
            }
            None => Vec::new(),
        };

        let mut ontology = Ontology::new();
        let mut classes: BTreeMap<String, NodeId> = BTreeMap::new();
        let class_types = [format!("{OWL}Class"), format!("{RDFS}Class")];

        let declared: Vec<(&Map<String, Value>, String)> = entries
            .iter()
            .filter(|entry| {
                context
                    .types(entry)
                    .iter()
                    .any(|kind| class_types.contains(kind))
            })
            .map(|entry| {
                let iri = entry
                    .get("@id")
                    .and_then(Value::as_str)
                    .map(|id| context.expand(id))
                    .ok_or_else(|| {
                        RdfError::InvalidDocument("class entry without `@id`".to_string())
                    })?;
                Ok((*entry, iri))
            })
            .collect::<Result<_, RdfError>>()?;

        for (entry, iri) in &declared {
            let label = context
                .label(entry)
                .unwrap_or_else(|| context.local_name(iri).to_string());
            let id = ontology.add_node(label).into_inner();
            classes.entry(iri.clone()).or_insert(id);
        }

        for (entry, iri) in &declared {
            let child = class_id(&context, &mut ontology, &mut classes, iri);
            for parent in context.references(entry, &format!("{RDFS}subClassOf")) {
                let parent = class_id(&context, &mut ontology, &mut classes, &parent);
                add_edge(&mut ontology, &child, SUBCLASS_OF, EdgeEnd::Class(parent))?;
            }
        }

        for entry in &entries {
            let types = context.types(entry);
            let kind = if types.iter().any(|kind| *kind == format!("{OWL}ObjectProperty")) {
                PropertyKind::Object
            } else if types.iter().any(|kind| *kind == format!("{OWL}DatatypeProperty")) {
                PropertyKind::Datatype
            } else {
                continue;
            };
            let Some(id) = entry.get("@id").and_then(Value::as_str) else {
                tracing::warn!("property_without_id");
                continue;
            };
            let iri = context.expand(id);
            let predicate = context
                .label(entry)
                .unwrap_or_else(|| context.local_name(&iri).to_string());
            let domains = context.references(entry, &format!("{RDFS}domain"));
            let ranges = context.labelled_references(entry, &format!("{RDFS}range"));
            if domains.is_empty() || ranges.is_empty() {
                tracing::warn!(property = %iri, "property_without_domain_or_range");
                continue;
            }

            for (domain, (range, range_label)) in pairs(&domains, &ranges) {
                let source = class_id(&context, &mut ontology, &mut classes, domain);
                let end = match kind {
                    PropertyKind::Object => {
                        EdgeEnd::Class(class_id(&context, &mut ontology, &mut classes, range))
                    }
                    PropertyKind::Datatype => {
                        let datatype = match (range_label, range.strip_prefix(XSD)) {
                            (Some(label), _) => label.clone(),
                            (None, Some(local)) => datatype_from_xsd(local),
                            (None, None) => context.local_name(range).to_string(),
                        };
                        ontology.add_datatype_node(datatype.clone());
                        EdgeEnd::Datatype(datatype)
                    }
                };
                add_edge(&mut ontology, &source, &predicate, end)?;
            }
        }

        tracing::debug!(
            classes = ontology.class_count(),
            edges = ontology.edges().len(),
            "jsonld_imported"
        );
        Ok(ontology)
    }
}

fn class_id(
    context: &Context,
    ontology: &mut Ontology,
    classes: &mut BTreeMap<String, NodeId>,
    iri: &str,
) -> NodeId {
    if let Some(id) = classes.get(iri) {
        return id.clone();
    }
    let id = ontology.add_node(context.local_name(iri)).into_inner();
    classes.insert(iri.to_string(), id.clone());
    id
}

fn add_edge(
    ontology: &mut Ontology,
    source: &NodeId,
    predicate: &str,
    end: EdgeEnd,
) -> Result<(), RdfError> {
    ontology
        .add_edge(source, predicate, end)
        .map(|_| ())
        .map_err(|err| RdfError::InvalidDocument(err.to_string()))
}

/// Pairwise when lengths match, otherwise the cartesian product.
fn pairs<'v, D, R>(domains: &'v [D], ranges: &'v [R]) -> Vec<(&'v D, &'v R)> {
    if domains.len() == ranges.len() {
        domains.iter().zip(ranges).collect()
    } else {
        domains
            .iter()
            .flat_map(|d| ranges.iter().map(move |r| (d, r)))
            .collect()
    }
}
