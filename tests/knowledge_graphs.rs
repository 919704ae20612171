use ontograph::{
    config::NamespaceSettings,
    knowledge::{
        DanglingReference, InstanceLink, KnowledgeError, KnowledgeGraphExporter,
        KnowledgeGraphStore, RelationshipKey, Save,
    },
    ontology::{EdgeEnd, Ontology},
    rdf::Namespace,
};
use serde_json::json;

fn pets() -> Ontology {
    let mut ontology = Ontology::new();
    let person = ontology.add_node("Person").into_inner();
    let dog = ontology.add_node("Dog").into_inner();
    ontology
        .add_edge(&person, "owns", EdgeEnd::Class(dog))
        .expect("owns edge");
    ontology
}

fn owns() -> RelationshipKey {
    RelationshipKey::new("Person", "owns", "Dog")
}

fn save_from_toolbar(save: &mut dyn Save) -> Result<(), KnowledgeError> {
    save.save()
}

#[test]
fn edit_save_and_export_a_knowledge_graph() {
    let ontology = pets();
    let mut store = KnowledgeGraphStore::new();
    let id = store.create("pets", "Household").expect("created").id;

    {
        let mut editor = store.editor(&id).expect("editor");
        let graph = editor.graph_mut();
        graph.add_instance("Person", "Ann");
        graph.add_instance("Dog", "Rex");
        graph.add_instance("Dog", "Fido");
        graph.add_relationship(&owns(), InstanceLink::new("Ann", "Rex"));
        graph.add_relationship(&owns(), InstanceLink::new("Ann", "Fido"));
        save_from_toolbar(editor.save_handle()).expect("saved");
    }

    let record = store.get(&id).expect("record");
    assert!(record.data.validate(&ontology).is_empty());

    let namespace = Namespace::from_settings(&NamespaceSettings::default()).expect("namespace");
    let document = KnowledgeGraphExporter::new(&namespace)
        .document(&record.data, &ontology, &record.name)
        .expect("document");

    assert_eq!(document["@id"], "Household");
    assert_eq!(
        document["@graph"],
        json!([
            {"@id": "Dog/Rex", "@type": "Dog", "rdfs:label": "Rex"},
            {"@id": "Dog/Fido", "@type": "Dog", "rdfs:label": "Fido"},
            {
                "@id": "Person/Ann",
                "@type": "Person",
                "rdfs:label": "Ann",
                "owns": [{"@id": "Dog/Rex"}, {"@id": "Dog/Fido"}]
            },
        ])
    );
}

#[test]
fn unsaved_drafts_are_discarded() {
    let mut store = KnowledgeGraphStore::new();
    let id = store.create("pets", "Household").expect("created").id;

    {
        let mut editor = store.editor(&id).expect("editor");
        editor.graph_mut().add_instance("Dog", "Rex");
        assert!(editor.is_dirty());
    }

    assert!(store.get(&id).expect("record").data.is_empty());
}

#[test]
fn removing_a_class_leaves_the_graph_reporting_dangling_references() {
    let mut ontology = pets();
    let mut store = KnowledgeGraphStore::new();
    let id = store.create("pets", "Household").expect("created").id;
    {
        let mut editor = store.editor(&id).expect("editor");
        let graph = editor.graph_mut();
        graph.add_instance("Person", "Ann");
        graph.add_instance("Dog", "Rex");
        graph.add_relationship(&owns(), InstanceLink::new("Ann", "Rex"));
        editor.save().expect("saved");
    }

    let dog = ontology.find_node_by_label("Dog").expect("dog").id.clone();
    ontology.remove_node(&dog);

    let record = store.get(&id).expect("record");
    let dangling = record.data.validate(&ontology);
    assert!(dangling.contains(&DanglingReference::Class {
        class: "Dog".into()
    }));
    assert_eq!(record.data.instances_of("Dog"), ["Rex"]);

    let namespace = Namespace::from_settings(&NamespaceSettings::default()).expect("namespace");
    let document = KnowledgeGraphExporter::new(&namespace)
        .document(&record.data, &ontology, &record.name)
        .expect("document");
    assert_eq!(
        document["@graph"],
        json!([{"@id": "Person/Ann", "@type": "Person", "rdfs:label": "Ann"}])
    );
}

#[test]
fn graphs_belong_to_one_ontology() {
    let mut store = KnowledgeGraphStore::new();
    let kept = store.create("zoo", "Keepers").expect("created").id;
    store.create("pets", "Household").expect("created");
    store.create("pets", "Neighbours").expect("created");

    assert_eq!(store.list("pets").len(), 2);
    assert_eq!(store.delete_all_for_ontology("pets"), 2);
    assert!(store.list("pets").is_empty());
    assert_eq!(store.list("zoo")[0].id, kept);

    store.rename(&kept, "  Zoo keepers ").expect("renamed");
    assert_eq!(store.get(&kept).expect("record").name, "Zoo keepers");
    assert_eq!(store.rename(&kept, ""), Err(KnowledgeError::EmptyName));
}
