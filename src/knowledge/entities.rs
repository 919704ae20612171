use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::KnowledgeError;
use crate::ontology::Ontology;

/// Identifies a family of instance links: `{sourceClass}:{predicate}:{targetClass}`.
///
/// The textual form cannot tell a `:` inside a class name from a separator,
/// so [`KnowledgeGraph::add_relationship`] refuses keys whose class names
/// contain one. Predicates may contain `:`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RelationshipKey {
    pub source_class: String,
    pub predicate: String,
    pub target_class: String,
}

impl RelationshipKey {
    #[must_use]
    pub fn new(
        source_class: impl Into<String>,
        predicate: impl Into<String>,
        target_class: impl Into<String>,
    ) -> Self {
        Self {
            source_class: source_class.into(),
            predicate: predicate.into(),
            target_class: target_class.into(),
        }
    }
}

impl Display for RelationshipKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            self.source_class, self.predicate, self.target_class
        )
    }
}

impl FromStr for RelationshipKey {
    type Err = KnowledgeError;

    /// Class names are split off at the first and last `:`, so a predicate
    /// may itself contain colons.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || KnowledgeError::InvalidRelationshipKey(s.to_string());
        let (source_class, rest) = s.split_once(':').ok_or_else(invalid)?;
        let (predicate, target_class) = rest.rsplit_once(':').ok_or_else(invalid)?;
        if source_class.is_empty() || predicate.is_empty() || target_class.is_empty() {
            return Err(invalid());
        }
        Ok(Self::new(source_class, predicate, target_class))
    }
}

/// One `source -> target` pair of instance names.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstanceLink {
    pub source: String,
    pub target: String,
}

impl InstanceLink {
    #[must_use]
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}

/// Something a knowledge graph refers to that its ontology, or its own
/// instance lists, no longer contain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DanglingReference {
    /// Instances are filed under a class the ontology does not define.
    Class { class: String },
    /// A relationship key names a class the ontology does not define.
    RelationshipClass { key: String, class: String },
    /// A link end is not listed among its class's instances.
    Instance {
        key: String,
        class: String,
        instance: String,
    },
}

/// Instances of ontology classes and the links between them.
///
/// Both maps keep their values as insertion-ordered sets.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeGraph {
    #[serde(default)]
    pub instances: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub relationships: BTreeMap<String, Vec<InstanceLink>>,
}

impl KnowledgeGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instances.values().all(Vec::is_empty) && self.relationships.values().all(Vec::is_empty)
    }

    #[must_use]
    pub fn instances_of(&self, class: &str) -> &[String] {
        self.instances
            .get(class)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    #[must_use]
    pub fn has_instance(&self, class: &str, name: &str) -> bool {
        self.instances_of(class).iter().any(|instance| instance == name)
    }

    /// Returns `false` when the name is blank or already listed.
    pub fn add_instance(&mut self, class: &str, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() || self.has_instance(class, name) {
            return false;
        }
        self.instances
            .entry(class.to_string())
            .or_default()
            .push(name.to_string());
        true
    }

    /// Removes an instance. Links mentioning it stay stored and are dropped
    /// when exported.
    pub fn remove_instance(&mut self, class: &str, name: &str) -> bool {
        let Some(instances) = self.instances.get_mut(class) else {
            return false;
        };
        let before = instances.len();
        instances.retain(|instance| instance != name);
        let removed = instances.len() != before;
        if instances.is_empty() {
            self.instances.remove(class);
        }
        removed
    }

    #[must_use]
    pub fn links(&self, key: &RelationshipKey) -> &[InstanceLink] {
        self.relationships
            .get(&key.to_string())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Records a link. Returns `false` when it is already stored or when a
    /// class name in `key` contains `:`.
    pub fn add_relationship(&mut self, key: &RelationshipKey, link: InstanceLink) -> bool {
        if key.source_class.contains(':') || key.target_class.contains(':') {
            tracing::warn!(key = %key, "relationship_key_class_with_colon");
            return false;
        }
        let links = self.relationships.entry(key.to_string()).or_default();
        if links.contains(&link) {
            return false;
        }
        links.push(link);
        true
    }

    pub fn remove_relationship(&mut self, key: &RelationshipKey, link: &InstanceLink) -> bool {
        let raw = key.to_string();
        let Some(links) = self.relationships.get_mut(&raw) else {
            return false;
        };
        let before = links.len();
        links.retain(|existing| existing != link);
        let removed = links.len() != before;
        if links.is_empty() {
            self.relationships.remove(&raw);
        }
        removed
    }

    /// Links of `key` whose both ends are listed instances.
    pub fn live_links<'a>(
        &'a self,
        key: &'a RelationshipKey,
    ) -> impl Iterator<Item = &'a InstanceLink> + 'a {
        self.links(key).iter().filter(move |link| {
            self.has_instance(&key.source_class, &link.source)
                && self.has_instance(&key.target_class, &link.target)
        })
    }

    /// Parsed relationship keys with their links; malformed keys are skipped.
    pub fn relationship_entries(&self) -> impl Iterator<Item = (RelationshipKey, &[InstanceLink])> {
        self.relationships.iter().filter_map(|(raw, links)| {
            raw.parse::<RelationshipKey>()
                .ok()
                .map(|key| (key, links.as_slice()))
        })
    }

    /// Lists every reference the ontology cannot satisfy. Nothing is removed.
    #[must_use]
    pub fn validate(&self, ontology: &Ontology) -> Vec<DanglingReference> {
        let defined = |class: &str| ontology.classes().any(|node| node.label == class);
        let mut dangling = Vec::new();

        for class in self.instances.keys() {
            if !defined(class) {
                dangling.push(DanglingReference::Class {
                    class: class.clone(),
                });
            }
        }

        for (raw, links) in &self.relationships {
            let Ok(key) = raw.parse::<RelationshipKey>() else {
                continue;
            };
            for class in [&key.source_class, &key.target_class] {
                if !defined(class) {
                    dangling.push(DanglingReference::RelationshipClass {
                        key: raw.clone(),
                        class: class.clone(),
                    });
                }
            }
            for link in links {
                for (class, instance) in [
                    (&key.source_class, &link.source),
                    (&key.target_class, &link.target),
                ] {
                    if !self.has_instance(class, instance) {
                        dangling.push(DanglingReference::Instance {
                            key: raw.clone(),
                            class: class.clone(),
                            instance: instance.clone(),
                        });
                    }
                }
            }
        }

        dangling
    }
}
