//! Boundary to the chat assistant.
//!
//! The language model itself is an opaque collaborator behind
//! [`AssistantClient`]. [`ChatSession`] keeps the conversation, describes
//! the current graph in the request and turns the reply into a new graph.

use std::fmt::Write;

use serde::{Deserialize, Serialize};

use crate::{
    actions::{Action, ActionObserver, ActionProtocol},
    config::Config,
    ontology::{GraphSnapshot, HierarchyBuilder, Ontology, OntologyError},
};

/// Instructions sent with every turn.
pub const SYSTEM_PROMPT: &str = "You help the user design an ontology of classes and properties.
When the user asks for a change, answer briefly and then list the edits as JSON objects in a \
```json fenced block, one object per line or a single array.
Supported edits:
{\"action\": \"add_node\", \"label\": \"Dog\", \"parent\": \"Animal\"}
{\"action\": \"remove_node\", \"label\": \"Dog\"}
{\"action\": \"add_edge\", \"source\": \"Dog\", \"target\": \"Bone\", \"label\": \"chews\"}
{\"action\": \"remove_edge\", \"source\": \"Dog\", \"target\": \"Bone\"}
{\"action\": \"add_property\", \"class\": \"Dog\", \"property\": \"breed\"}
Refer to classes by their exact label. `parent`, `label` and `datatype` are optional.";

/// Role of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversationRole {
    User,
    Assistant,
}

/// A single entry in the conversation history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: ConversationRole,
    pub content: String,
}

impl ConversationTurn {
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ConversationRole::User,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ConversationRole::Assistant,
            content: content.into(),
        }
    }
}

/// Request handed to an [`AssistantClient`].
///
/// The newest user message is the last entry of `prior_messages`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatTurnRequest {
    pub system_prompt: String,
    pub prior_messages: Vec<ConversationTurn>,
    pub current_graph_summary: String,
}

/// Reply of an [`AssistantClient`].
///
/// When `updated_graph` is present the server already applied the actions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatTurnResponse {
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applied_actions: Option<Vec<Action>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_graph: Option<GraphSnapshot>,
}

impl ChatTurnResponse {
    #[must_use]
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            applied_actions: None,
            updated_graph: None,
        }
    }
}

/// Errors produced by a chat turn.
#[derive(Debug, thiserror::Error)]
pub enum AssistantError {
    #[error("assistant client error: {0}")]
    Client(String),
    #[error("assistant returned an invalid graph: {0}")]
    Graph(#[from] OntologyError),
}

/// Text-in/text-out provider abstraction.
pub trait AssistantClient {
    type Error: std::error::Error + Send + Sync + 'static;

    fn complete(&self, request: &ChatTurnRequest) -> Result<ChatTurnResponse, Self::Error>;
}

/// Textual description of the graph included in every request.
#[must_use]
pub fn graph_summary(ontology: &Ontology, expand_object_targets: bool) -> String {
    let mut summary = String::new();
    append_classes(&mut summary, ontology);
    append_triples(&mut summary, ontology, expand_object_targets);
    summary
}

fn append_classes(buffer: &mut String, ontology: &Ontology) {
    let labels: Vec<&str> = ontology.classes().map(|node| node.label.as_str()).collect();
    if labels.is_empty() {
        buffer.push_str("Classes: none defined\n");
        return;
    }
    let _ = writeln!(buffer, "Classes ({}): {}", labels.len(), labels.join(", "));
}

fn append_triples(buffer: &mut String, ontology: &Ontology, expand_object_targets: bool) {
    let view = HierarchyBuilder::new(ontology)
        .expand_object_targets(expand_object_targets)
        .build();
    if view.is_empty() {
        return;
    }
    buffer.push_str("Hierarchy:\n");
    let _ = write!(buffer, "{view}");
}

/// Where the graph of a [`ChatOutcome`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphSource {
    /// The response carried an updated graph.
    Server,
    /// The actions in the reply were applied locally.
    Local,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatOutcome {
    pub reply: String,
    pub graph: Ontology,
    pub applied: Vec<Action>,
    pub source: GraphSource,
}

/// Conversation with one assistant about one graph.
pub struct ChatSession<'a, C> {
    config: &'a Config,
    client: &'a C,
    observer: Option<&'a dyn ActionObserver>,
    history: Vec<ConversationTurn>,
}

impl<'a, C> ChatSession<'a, C>
where
    C: AssistantClient,
{
    #[must_use]
    pub fn new(config: &'a Config, client: &'a C) -> Self {
        Self {
            config,
            client,
            observer: None,
            history: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_observer(mut self, observer: &'a dyn ActionObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    #[must_use]
    pub fn history(&self) -> &[ConversationTurn] {
        &self.history
    }

    /// Sends `message` and reconciles the reply against `graph`.
    ///
    /// `graph` itself is not modified; the caller replaces it with
    /// [`ChatOutcome::graph`]. History only grows when the turn succeeds.
    pub fn send(&mut self, message: &str, graph: &Ontology) -> Result<ChatOutcome, AssistantError> {
        let mut prior_messages = self.history.clone();
        prior_messages.push(ConversationTurn::user(message));
        let request = ChatTurnRequest {
            system_prompt: SYSTEM_PROMPT.to_string(),
            prior_messages,
            current_graph_summary: graph_summary(
                graph,
                self.config.hierarchy.expand_object_targets,
            ),
        };

        let response = self
            .client
            .complete(&request)
            .map_err(|err| AssistantError::Client(err.to_string()))?;

        let outcome = match response.updated_graph {
            Some(snapshot) => ChatOutcome {
                graph: Ontology::from_snapshot(snapshot)?,
                applied: response.applied_actions.unwrap_or_default(),
                reply: response.content,
                source: GraphSource::Server,
            },
            None => {
                let mut protocol = ActionProtocol::new(self.config);
                if let Some(observer) = self.observer {
                    protocol = protocol.with_observer(observer);
                }
                let batch = protocol.run(&response.content, graph);
                ChatOutcome {
                    graph: batch.graph,
                    applied: batch.applied,
                    reply: response.content,
                    source: GraphSource::Local,
                }
            }
        };

        tracing::info!(
            applied = outcome.applied.len(),
            source = ?outcome.source,
            "chat_turn_reconciled"
        );
        self.history.push(ConversationTurn::user(message));
        self.history.push(ConversationTurn::assistant(outcome.reply.clone()));
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::ontology::{EdgeEnd, SUBCLASS_OF};

    #[derive(Debug, thiserror::Error)]
    #[error("offline")]
    struct Offline;

    struct RecordingClient {
        responses: Mutex<Vec<ChatTurnResponse>>,
        captured: Mutex<Vec<ChatTurnRequest>>,
    }

    impl RecordingClient {
        fn new(responses: Vec<ChatTurnResponse>) -> Self {
            Self {
                responses: Mutex::new(responses),
                captured: Mutex::new(Vec::new()),
            }
        }

        fn captured(&self) -> Vec<ChatTurnRequest> {
            self.captured.lock().expect("lock").clone()
        }
    }

    impl AssistantClient for RecordingClient {
        type Error = Offline;

        fn complete(&self, request: &ChatTurnRequest) -> Result<ChatTurnResponse, Self::Error> {
            self.captured.lock().expect("lock").push(request.clone());
            let mut responses = self.responses.lock().expect("lock");
            if responses.is_empty() {
                return Err(Offline);
            }
            Ok(responses.remove(0))
        }
    }

    fn animal_dog() -> Ontology {
        let mut ontology = Ontology::new();
        let animal = ontology.add_node("Animal").into_inner();
        let dog = ontology.add_node("Dog").into_inner();
        ontology
            .add_edge(&dog, SUBCLASS_OF, EdgeEnd::Class(animal))
            .expect("edge");
        ontology
    }

    #[test]
    fn summary_lists_classes_and_hierarchy() {
        assert_eq!(
            graph_summary(&animal_dog(), false),
            "Classes (2): Animal, Dog\nHierarchy:\nAnimal\n  Dog (subClassOf Animal)\n"
        );
        assert_eq!(graph_summary(&Ontology::new(), false), "Classes: none defined\n");
    }

    #[test]
    fn local_reconciliation_applies_reply_actions() {
        let client = RecordingClient::new(vec![ChatTurnResponse::text(
            "Added it.\n```json\n{\"action\":\"add_node\",\"label\":\"Cat\",\"parent\":\"Animal\"}\n```",
        )]);
        let config = Config::default();
        let mut session = ChatSession::new(&config, &client);

        let outcome = session.send("add a cat", &animal_dog()).expect("turn");
        assert_eq!(outcome.source, GraphSource::Local);
        assert_eq!(outcome.graph.class_count(), 3);
        assert_eq!(outcome.applied.len(), 1);

        let request = &client.captured()[0];
        assert_eq!(request.system_prompt, SYSTEM_PROMPT);
        assert_eq!(request.prior_messages, vec![ConversationTurn::user("add a cat")]);
        assert!(request.current_graph_summary.contains("Dog (subClassOf Animal)"));
    }

    #[test]
    fn server_graph_wins_over_reply_text() {
        let mut server_graph = animal_dog();
        server_graph.add_node("Fish");
        let client = RecordingClient::new(vec![ChatTurnResponse {
            content: "```json\n{\"action\":\"add_node\",\"label\":\"Cat\"}\n```".to_string(),
            applied_actions: Some(vec![Action::AddNode {
                label: "Fish".into(),
                parent: None,
            }]),
            updated_graph: Some(server_graph.to_snapshot()),
        }]);
        let config = Config::default();
        let mut session = ChatSession::new(&config, &client);

        let outcome = session.send("add a fish", &animal_dog()).expect("turn");
        assert_eq!(outcome.source, GraphSource::Server);
        assert_eq!(outcome.graph, server_graph);
        assert!(outcome.graph.find_node_by_label("Cat").is_none());
    }

    #[test]
    fn history_grows_only_on_success() {
        let client = RecordingClient::new(vec![ChatTurnResponse::text("Hello")]);
        let config = Config::default();
        let mut session = ChatSession::new(&config, &client);
        let graph = Ontology::new();

        session.send("hi", &graph).expect("first turn");
        assert_eq!(
            session.history(),
            [ConversationTurn::user("hi"), ConversationTurn::assistant("Hello")]
        );

        let err = session.send("again", &graph).expect_err("offline");
        assert!(matches!(err, AssistantError::Client(message) if message == "offline"));
        assert_eq!(session.history().len(), 2);
        assert_eq!(client.captured()[1].prior_messages.len(), 3);
    }
}
