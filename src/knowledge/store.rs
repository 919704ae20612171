//! In-memory collection of knowledge graphs and the editing handle.
//!
//! The store does no locking. Callers serialise access, which the borrow
//! checker enforces for [`KnowledgeGraphEditor`]: it holds the store
//! mutably for as long as it lives.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{KnowledgeError, KnowledgeGraph};

/// Stored knowledge graph with its metadata.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeGraphRecord {
    pub id: Uuid,
    pub name: String,
    pub ontology_id: String,
    pub data: KnowledgeGraph,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl KnowledgeGraphRecord {
    fn touch(&mut self) {
        self.updated_at = Utc::now().max(self.updated_at);
    }
}

/// Longest accepted knowledge graph name, in characters after trimming.
pub const MAX_NAME_LENGTH: usize = 100;

fn checked_name(name: &str) -> Result<String, KnowledgeError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(KnowledgeError::EmptyName);
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(KnowledgeError::NameTooLong {
            max: MAX_NAME_LENGTH,
        });
    }
    Ok(name.to_string())
}

#[derive(Clone, Debug, Default)]
pub struct KnowledgeGraphStore {
    records: Vec<KnowledgeGraphRecord>,
}

impl KnowledgeGraphStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with records loaded by the persistence collaborator.
    #[must_use]
    pub fn from_records(records: Vec<KnowledgeGraphRecord>) -> Self {
        Self { records }
    }

    #[must_use]
    pub fn records(&self) -> &[KnowledgeGraphRecord] {
        &self.records
    }

    /// Creates an empty knowledge graph for `ontology_id`.
    pub fn create(
        &mut self,
        ontology_id: &str,
        name: &str,
    ) -> Result<&KnowledgeGraphRecord, KnowledgeError> {
        let now = Utc::now();
        let record = KnowledgeGraphRecord {
            id: Uuid::new_v4(),
            name: checked_name(name)?,
            ontology_id: ontology_id.to_string(),
            data: KnowledgeGraph::new(),
            created_at: now,
            updated_at: now,
        };
        tracing::info!(id = %record.id, ontology_id, "knowledge_graph_created");
        self.records.push(record);
        let index = self.records.len() - 1;
        Ok(&self.records[index])
    }

    #[must_use]
    pub fn get(&self, id: &Uuid) -> Option<&KnowledgeGraphRecord> {
        self.records.iter().find(|record| record.id == *id)
    }

    fn get_mut(&mut self, id: &Uuid) -> Result<&mut KnowledgeGraphRecord, KnowledgeError> {
        self.records
            .iter_mut()
            .find(|record| record.id == *id)
            .ok_or(KnowledgeError::UnknownGraph(*id))
    }

    /// Graphs of one ontology, most recently updated first.
    #[must_use]
    pub fn list(&self, ontology_id: &str) -> Vec<&KnowledgeGraphRecord> {
        let mut records: Vec<_> = self
            .records
            .iter()
            .filter(|record| record.ontology_id == ontology_id)
            .collect();
        records.sort_by(|a, b| {
            b.updated_at
                .cmp(&a.updated_at)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        records
    }

    pub fn rename(&mut self, id: &Uuid, name: &str) -> Result<(), KnowledgeError> {
        let name = checked_name(name)?;
        let record = self.get_mut(id)?;
        record.name = name;
        record.touch();
        Ok(())
    }

    pub fn replace_data(&mut self, id: &Uuid, data: KnowledgeGraph) -> Result<(), KnowledgeError> {
        let record = self.get_mut(id)?;
        record.data = data;
        record.touch();
        tracing::debug!(id = %id, "knowledge_graph_saved");
        Ok(())
    }

    pub fn delete(&mut self, id: &Uuid) -> Result<KnowledgeGraphRecord, KnowledgeError> {
        let position = self
            .records
            .iter()
            .position(|record| record.id == *id)
            .ok_or(KnowledgeError::UnknownGraph(*id))?;
        Ok(self.records.remove(position))
    }

    /// Deletes every graph of `ontology_id` and returns how many went.
    pub fn delete_all_for_ontology(&mut self, ontology_id: &str) -> usize {
        let before = self.records.len();
        self.records
            .retain(|record| record.ontology_id != ontology_id);
        let removed = before - self.records.len();
        tracing::info!(ontology_id, removed, "knowledge_graphs_deleted");
        removed
    }

    /// Opens a draft of one graph for editing.
    pub fn editor(&mut self, id: &Uuid) -> Result<KnowledgeGraphEditor<'_>, KnowledgeError> {
        let draft = self.get_mut(id)?.data.clone();
        Ok(KnowledgeGraphEditor {
            store: self,
            id: *id,
            draft,
            dirty: false,
        })
    }
}

/// Capability to persist whatever is currently being edited.
///
/// Handed from the active editor to whoever owns the save control.
pub trait Save {
    fn save(&mut self) -> Result<(), KnowledgeError>;
}

/// Working copy of one knowledge graph, written back on [`Save::save`].
pub struct KnowledgeGraphEditor<'s> {
    store: &'s mut KnowledgeGraphStore,
    id: Uuid,
    draft: KnowledgeGraph,
    dirty: bool,
}

impl<'s> KnowledgeGraphEditor<'s> {
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    #[must_use]
    pub fn graph(&self) -> &KnowledgeGraph {
        &self.draft
    }

    /// Mutable access to the draft; marks it as unsaved.
    pub fn graph_mut(&mut self) -> &mut KnowledgeGraph {
        self.dirty = true;
        &mut self.draft
    }

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// The save capability for the parent component.
    pub fn save_handle(&mut self) -> &mut dyn Save {
        self
    }
}

impl Save for KnowledgeGraphEditor<'_> {
    fn save(&mut self) -> Result<(), KnowledgeError> {
        self.store.replace_data(&self.id, self.draft.clone())?;
        self.dirty = false;
        Ok(())
    }
}
