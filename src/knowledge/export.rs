//! JSON-LD rendering of a knowledge graph against its ontology.

use std::collections::BTreeMap;

use serde_json::{json, Map, Value};

use super::KnowledgeGraph;
use crate::{
    ontology::Ontology,
    rdf::{
        jsonld::{context, id_refs},
        local_name, Namespace, RdfError,
    },
};

pub struct KnowledgeGraphExporter<'a> {
    namespace: &'a Namespace,
}

impl<'a> KnowledgeGraphExporter<'a> {
    #[must_use]
    pub fn new(namespace: &'a Namespace) -> Self {
        Self { namespace }
    }

    /// One entry per instance, typed by its class, with `@id`
    /// `{classSlug}/{instanceSlug}`.
    ///
    /// Instances of classes missing from `ontology` are left out, and a link
    /// is written only when both of its ends are listed instances.
    ///
    /// # Errors
    ///
    /// Fails when a class, instance or predicate cannot be embedded in an IRI.
    pub fn document(
        &self,
        graph: &KnowledgeGraph,
        ontology: &Ontology,
        name: &str,
    ) -> Result<Value, RdfError> {
        let defined = |class: &str| ontology.classes().any(|node| node.label == class);

        let mut entries: Vec<(String, Map<String, Value>)> = Vec::new();
        let mut index: BTreeMap<String, usize> = BTreeMap::new();
        for (class, instances) in &graph.instances {
            if !defined(class) {
                tracing::debug!(class = %class, "instances_of_undefined_class_skipped");
                continue;
            }
            let class_slug = self.slug(class)?;
            for instance in instances {
                let id = self.instance_id(class, instance)?;
                let mut entry = Map::new();
                entry.insert("@id".to_string(), json!(id));
                entry.insert("@type".to_string(), json!(class_slug));
                entry.insert("rdfs:label".to_string(), json!(instance));
                index.insert(id.clone(), entries.len());
                entries.push((id, entry));
            }
        }

        let mut values: BTreeMap<(usize, String), Vec<String>> = BTreeMap::new();
        for (key, _) in graph.relationship_entries() {
            if !defined(&key.source_class) || !defined(&key.target_class) {
                continue;
            }
            let predicate = self.slug(&key.predicate)?;
            for link in graph.live_links(&key) {
                let source = self.instance_id(&key.source_class, &link.source)?;
                let target = self.instance_id(&key.target_class, &link.target)?;
                let Some(position) = index.get(&source) else {
                    continue;
                };
                let targets = values.entry((*position, predicate.clone())).or_default();
                if !targets.contains(&target) {
                    targets.push(target);
                }
            }
        }
        for ((position, predicate), targets) in values {
            entries[position].1.insert(predicate, id_refs(&targets));
        }

        Ok(json!({
            "@context": context(self.namespace),
            "@id": local_name(name),
            "rdfs:label": name,
            "@graph": entries
                .into_iter()
                .map(|(_, entry)| Value::Object(entry))
                .collect::<Vec<_>>(),
        }))
    }

    pub fn export(
        &self,
        graph: &KnowledgeGraph,
        ontology: &Ontology,
        name: &str,
    ) -> Result<String, RdfError> {
        Ok(serde_json::to_string_pretty(&self.document(graph, ontology, name)?)?)
    }

    fn slug(&self, label: &str) -> Result<String, RdfError> {
        self.namespace.term(label)?;
        Ok(local_name(label))
    }

    fn instance_id(&self, class: &str, instance: &str) -> Result<String, RdfError> {
        let id = format!("{}/{}", local_name(class), local_name(instance));
        self.namespace.term(&id)?;
        Ok(id)
    }
}
