//! Applies a batch of [`Action`]s to a working copy of an [`Ontology`].
//!
//! The input graph is never touched. Actions run strictly in order, so later
//! actions see the effects of earlier ones, and the finished copy is handed
//! back as a whole.

use super::{observer::ActionObserver, Action};
use crate::{
    config::ActionSettings,
    ontology::{ClassNode, EdgeEnd, Insertion, NodeId, Ontology, SUBCLASS_OF},
};

/// Result of applying one batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOutcome {
    /// Replacement graph for the caller.
    pub graph: Ontology,
    /// Actions that changed the graph, in application order.
    pub applied: Vec<Action>,
}

impl BatchOutcome {
    #[must_use]
    pub fn changed(&self) -> bool {
        !self.applied.is_empty()
    }
}

/// What a single action did to the working copy.
enum Effect {
    Changed,
    Unchanged,
}

pub struct ActionApplier<'a> {
    settings: &'a ActionSettings,
    observer: &'a dyn ActionObserver,
}

impl<'a> ActionApplier<'a> {
    #[must_use]
    pub fn new(settings: &'a ActionSettings, observer: &'a dyn ActionObserver) -> Self {
        Self { settings, observer }
    }

    #[must_use]
    pub fn apply(&self, graph: &Ontology, actions: &[Action]) -> BatchOutcome {
        let mut working = graph.clone();
        let mut applied = Vec::new();

        for action in actions {
            if let Effect::Changed = self.apply_one(&mut working, action) {
                applied.push(action.clone());
            }
        }

        tracing::info!(
            received = actions.len(),
            applied = applied.len(),
            "action_batch_applied"
        );
        BatchOutcome {
            graph: working,
            applied,
        }
    }

    fn apply_one(&self, graph: &mut Ontology, action: &Action) -> Effect {
        match action {
            Action::AddNode { label, parent } => {
                self.add_node(graph, action, label, parent.as_deref())
            }
            Action::RemoveNode { label } => {
                let Some(id) = self.resolve(graph, action, label) else {
                    return Effect::Unchanged;
                };
                graph.remove_node(&id);
                Effect::Changed
            }
            Action::AddEdge {
                source,
                target,
                label,
            } => {
                let (Some(source), Some(target)) = (
                    self.resolve_class(graph, action, source),
                    self.resolve_class(graph, action, target),
                ) else {
                    return Effect::Unchanged;
                };
                let predicate = label
                    .as_deref()
                    .map(str::trim)
                    .filter(|label| !label.is_empty())
                    .unwrap_or(self.settings.default_relation.as_str());
                self.add_edge(graph, action, &source, predicate, EdgeEnd::Class(target))
            }
            Action::RemoveEdge { source, target } => {
                let (Some(source), Some(target)) = (
                    self.resolve(graph, action, source),
                    self.resolve(graph, action, target),
                ) else {
                    return Effect::Unchanged;
                };
                if graph.remove_edge(&source, &target).is_empty() {
                    tracing::debug!(action = action.name(), "no_matching_edges");
                    Effect::Unchanged
                } else {
                    Effect::Changed
                }
            }
            Action::AddProperty {
                class,
                property,
                datatype,
            } => {
                let Some(class) = self.resolve_class(graph, action, class) else {
                    return Effect::Unchanged;
                };
                if graph.has_datatype_property(&class, property) {
                    self.observer.on_duplicate(action);
                    return Effect::Unchanged;
                }
                let datatype = datatype
                    .as_deref()
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .unwrap_or(self.settings.datatype_class.as_str())
                    .to_string();
                let marker = graph.add_datatype_node(datatype.clone());
                let effect =
                    self.add_edge(graph, action, &class, property, EdgeEnd::Datatype(datatype));
                if let (Effect::Unchanged, Insertion::Created(id)) = (&effect, &marker) {
                    graph.remove_node(id);
                }
                effect
            }
        }
    }

    fn add_node(
        &self,
        graph: &mut Ontology,
        action: &Action,
        label: &str,
        parent: Option<&str>,
    ) -> Effect {
        let is_marker = graph
            .find_node_by_label(label)
            .is_some_and(|node| !node.is_class());
        if label.trim().is_empty() || is_marker {
            self.observer.on_unresolved(action, label);
            return Effect::Unchanged;
        }

        let insertion = graph.add_node(label);
        let created = insertion.is_created();
        let node = insertion.into_inner();

        let linked = match parent {
            Some(parent) => match self.resolve_class(graph, action, parent) {
                Some(parent) => matches!(
                    graph.add_edge(&node, SUBCLASS_OF, EdgeEnd::Class(parent)),
                    Ok(Insertion::Created(_))
                ),
                None => false,
            },
            None => false,
        };

        if created || linked {
            Effect::Changed
        } else {
            self.observer.on_duplicate(action);
            Effect::Unchanged
        }
    }

    fn add_edge(
        &self,
        graph: &mut Ontology,
        action: &Action,
        source: &NodeId,
        predicate: &str,
        end: EdgeEnd,
    ) -> Effect {
        match graph.add_edge(source, predicate, end) {
            Ok(Insertion::Created(_)) => Effect::Changed,
            Ok(Insertion::Existing(_)) => {
                self.observer.on_duplicate(action);
                Effect::Unchanged
            }
            Err(err) => {
                tracing::warn!(action = action.name(), error = %err, "action_rejected");
                Effect::Unchanged
            }
        }
    }

    /// First node with `label`, in insertion order.
    fn resolve(&self, graph: &Ontology, action: &Action, label: &str) -> Option<NodeId> {
        let found = graph.find_node_by_label(label).map(|node| node.id.clone());
        if found.is_none() {
            self.observer.on_unresolved(action, label);
        }
        found
    }

    /// Like [`Self::resolve`], but a datatype marker does not count as a match.
    fn resolve_class(&self, graph: &Ontology, action: &Action, label: &str) -> Option<NodeId> {
        let found = graph
            .find_node_by_label(label)
            .filter(|node| node.is_class())
            .map(|node: &ClassNode| node.id.clone());
        if found.is_none() {
            self.observer.on_unresolved(action, label);
        }
        found
    }
}
