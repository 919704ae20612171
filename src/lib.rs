//! # ontograph
//!
//! Core of an interactive ontology editor: the class/property graph model,
//! the derived hierarchical "triples" view, the protocol that turns
//! assistant text into atomic graph edits, knowledge-graph instance storage
//! and the Turtle / JSON-LD codecs.
//!
//! Every operation here is synchronous and free of I/O. Callers own
//! transport, persistence and the language model.
//!
//! ```rust
//! use ontograph::{actions::ActionProtocol, config::Config, ontology::Ontology};
//!
//! let config = Config::default();
//! let graph = Ontology::new();
//! let text = "```json\n{\"action\":\"add_node\",\"label\":\"Animal\"}\n```";
//! let outcome = ActionProtocol::new(&config).run(text, &graph);
//! assert!(outcome.graph.find_node_by_label("Animal").is_some());
//! ```

pub use self::errors::Error;

pub mod actions;
pub mod assistant;
pub mod config;
mod errors;
pub mod knowledge;
pub mod logger;
pub mod ontology;
pub mod rdf;

/// Application results options list
pub type Result<T, E = Error> = std::result::Result<T, E>;
