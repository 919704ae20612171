//! Structured graph edits extracted from assistant text.
//!
//! [`parser`] turns free-form text into an ordered list of [`Action`]s and
//! [`applier`] replays them as one batch against a copy of an [`Ontology`].
//! Neither step fails: malformed or unresolvable candidates are reported to
//! an [`ActionObserver`] and skipped.

pub mod applier;
pub mod observer;
pub mod parser;

use serde::{Deserialize, Serialize};

pub use applier::{ActionApplier, BatchOutcome};
pub use observer::{ActionObserver, RecordingObserver, SkippedAction, TracingObserver};
pub use parser::ActionParser;

use crate::{
    config::{ActionSettings, Config},
    ontology::Ontology,
};

/// Edit instruction addressed by class label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    AddNode {
        label: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        parent: Option<String>,
    },
    RemoveNode {
        label: String,
    },
    AddEdge {
        source: String,
        target: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
    },
    RemoveEdge {
        source: String,
        target: String,
    },
    AddProperty {
        class: String,
        property: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        datatype: Option<String>,
    },
}

impl Action {
    /// The `action` discriminator as it appears on the wire.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::AddNode { .. } => "add_node",
            Self::RemoveNode { .. } => "remove_node",
            Self::AddEdge { .. } => "add_edge",
            Self::RemoveEdge { .. } => "remove_edge",
            Self::AddProperty { .. } => "add_property",
        }
    }
}

static TRACING_OBSERVER: TracingObserver = TracingObserver;

/// Parser and applier wired to the same settings and observer.
#[derive(Clone, Copy)]
pub struct ActionProtocol<'a> {
    settings: &'a ActionSettings,
    observer: &'a dyn ActionObserver,
}

impl<'a> ActionProtocol<'a> {
    /// Uses the configured action settings and reports skips through `tracing`.
    #[must_use]
    pub fn new(config: &'a Config) -> Self {
        Self {
            settings: &config.actions,
            observer: &TRACING_OBSERVER,
        }
    }

    #[must_use]
    pub fn with_observer(mut self, observer: &'a dyn ActionObserver) -> Self {
        self.observer = observer;
        self
    }

    #[must_use]
    pub fn parser(&self) -> ActionParser<'a> {
        ActionParser::new(self.settings, self.observer)
    }

    #[must_use]
    pub fn applier(&self) -> ActionApplier<'a> {
        ActionApplier::new(self.settings, self.observer)
    }

    #[must_use]
    pub fn parse(&self, text: &str) -> Vec<Action> {
        self.parser().parse(text)
    }

    #[must_use]
    pub fn apply(&self, graph: &Ontology, actions: &[Action]) -> BatchOutcome {
        self.applier().apply(graph, actions)
    }

    /// Parses `text` and applies every action it contains to a copy of `graph`.
    #[must_use]
    pub fn run(&self, text: &str, graph: &Ontology) -> BatchOutcome {
        let actions = self.parse(text);
        tracing::debug!(count = actions.len(), "actions_parsed");
        self.apply(graph, &actions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn actions_serialise_back_to_their_wire_shape() {
        let action = Action::AddNode {
            label: "Cat".into(),
            parent: Some("Animal".into()),
        };
        assert_eq!(
            serde_json::to_value(&action).expect("serialise"),
            serde_json::json!({"action": "add_node", "label": "Cat", "parent": "Animal"})
        );

        let property = Action::AddProperty {
            class: "Dog".into(),
            property: "breed".into(),
            datatype: None,
        };
        assert_eq!(
            serde_json::to_string(&property).expect("serialise"),
            r#"{"action":"add_property","class":"Dog","property":"breed"}"#
        );
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let action: Action = serde_json::from_str(
            r#"{"action":"remove_edge","source":"Dog","target":"Animal","why":"cleanup"}"#,
        )
        .expect("valid action");
        assert_eq!(action.name(), "remove_edge");
    }
}
