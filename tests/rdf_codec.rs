use std::collections::BTreeSet;

use ontograph::{
    config::NamespaceSettings,
    ontology::{EdgeEnd, EdgeKind, Ontology, SUBCLASS_OF},
    rdf::{JsonLdExporter, JsonLdImporter, Namespace, RdfError, TurtleExporter},
};
use serde_json::json;

fn namespace() -> Namespace {
    Namespace::from_settings(&NamespaceSettings::default()).expect("default namespace")
}

fn animal_dog() -> Ontology {
    let mut ontology = Ontology::new();
    let animal = ontology.add_node("Animal").into_inner();
    let dog = ontology.add_node("Dog").into_inner();
    ontology
        .add_edge(&dog, SUBCLASS_OF, EdgeEnd::Class(animal))
        .expect("subclass edge");
    ontology
}

fn zoo() -> Ontology {
    let mut ontology = animal_dog();
    let dog = ontology.find_node_by_label("Dog").expect("dog").id.clone();
    let bone = ontology.add_node("Chew Toy").into_inner();
    ontology.add_datatype_node("String");
    ontology.add_datatype_node("Integer");
    ontology
        .add_edge(&dog, "chews", EdgeEnd::Class(bone))
        .expect("object edge");
    ontology
        .add_edge(&dog, "breed", EdgeEnd::Datatype("String".into()))
        .expect("datatype edge");
    ontology
        .add_edge(&dog, "age", EdgeEnd::Datatype("Integer".into()))
        .expect("datatype edge");
    ontology
}

fn triples(ontology: &Ontology) -> BTreeSet<(String, String, String)> {
    ontology
        .edges()
        .iter()
        .map(|edge| {
            let label = |id| {
                ontology
                    .find_node_by_id(id)
                    .map(|node| node.label.clone())
                    .unwrap_or_default()
            };
            let object = match &edge.kind {
                EdgeKind::SubClassOf { target } | EdgeKind::ObjectProperty { target } => {
                    label(target)
                }
                EdgeKind::DatatypeProperty { datatype } => datatype.clone(),
            };
            (label(&edge.source), edge.predicate.clone(), object)
        })
        .collect()
}

fn class_labels(ontology: &Ontology) -> BTreeSet<String> {
    ontology.classes().map(|node| node.label.clone()).collect()
}

#[test]
fn turtle_for_dog_subclass_of_animal() {
    let namespace = namespace();
    let turtle = TurtleExporter::new(&namespace)
        .export(&animal_dog())
        .expect("turtle");

    insta::assert_snapshot!(turtle, @r###"
    @prefix : <http://example.org/ontology#> .
    @prefix owl: <http://www.w3.org/2002/07/owl#> .
    @prefix rdf: <http://www.w3.org/1999/02/22-rdf-syntax-ns#> .
    @prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .
    @prefix xsd: <http://www.w3.org/2001/XMLSchema#> .

    :Animal a owl:Class ;
        rdfs:label "Animal" .

    :Dog a owl:Class ;
        rdfs:label "Dog" .

    :Dog rdfs:subClassOf :Animal .
    "###);
}

#[test]
fn turtle_is_reproducible() {
    let namespace = namespace();
    let exporter = TurtleExporter::new(&namespace);
    let graph = zoo();
    assert_eq!(
        exporter.export(&graph).expect("first"),
        exporter.export(&graph.clone()).expect("second")
    );
}

#[test]
fn jsonld_folds_subclass_into_the_class_entry() {
    let namespace = namespace();
    let document = JsonLdExporter::new(&namespace)
        .document(&animal_dog(), "Animals")
        .expect("document");

    assert_eq!(
        document,
        json!({
            "@context": {
                "@vocab": "http://example.org/ontology#",
                "owl": "http://www.w3.org/2002/07/owl#",
                "rdfs": "http://www.w3.org/2000/01/rdf-schema#",
                "xsd": "http://www.w3.org/2001/XMLSchema#"
            },
            "@id": "Animals",
            "@type": "owl:Ontology",
            "rdfs:label": "Animals",
            "@graph": [
                {"@id": "Animal", "@type": "owl:Class", "rdfs:label": "Animal"},
                {
                    "@id": "Dog",
                    "@type": "owl:Class",
                    "rdfs:label": "Dog",
                    "rdfs:subClassOf": {"@id": "Animal"}
                }
            ]
        })
    );
}

#[test]
fn jsonld_maps_datatypes_to_xsd() {
    let namespace = namespace();
    let document = JsonLdExporter::new(&namespace)
        .document(&zoo(), "Zoo")
        .expect("document");
    let graph = document["@graph"].as_array().expect("graph");

    let age = graph
        .iter()
        .find(|entry| entry["@id"] == "age")
        .expect("age declaration");
    assert_eq!(age["@type"], "owl:DatatypeProperty");
    assert_eq!(age["rdfs:range"], json!({"@id": "xsd:integer"}));

    let chews = graph
        .iter()
        .find(|entry| entry["@id"] == "chews")
        .expect("chews declaration");
    assert_eq!(chews["rdfs:range"], json!({"@id": "Chew_Toy"}));
    assert!(graph.iter().all(|entry| entry["@id"] != "String"));
}

#[test]
fn jsonld_round_trip_keeps_labels_and_triples() {
    let namespace = namespace();
    let original = zoo();
    let text = JsonLdExporter::new(&namespace)
        .export(&original, "Zoo")
        .expect("export");
    let imported = JsonLdImporter::new(&namespace)
        .import_str(&text)
        .expect("import");

    assert_eq!(class_labels(&imported), class_labels(&original));
    assert_eq!(triples(&imported), triples(&original));
}

#[test]
fn jsonld_export_is_byte_stable() {
    let namespace = namespace();
    let exporter = JsonLdExporter::new(&namespace);
    let graph = zoo();
    let first = exporter.export(&graph, "Zoo").expect("first");
    assert_eq!(first, exporter.export(&graph, "Zoo").expect("second"));
    assert!(first.starts_with("{\n  \"@context\""));
}

#[test]
fn import_without_context_is_rejected() {
    let namespace = namespace();
    let result = JsonLdImporter::new(&namespace)
        .import_str(r#"{"@graph": [{"@id": "Dog", "@type": "owl:Class"}]}"#);
    assert!(matches!(result, Err(RdfError::MissingContext)));

    let result = JsonLdImporter::new(&namespace).import_str("not json");
    assert!(matches!(result, Err(RdfError::Json(_))));
}

#[test]
fn jsonld_round_trip_keeps_lowercase_datatypes_and_awkward_labels() {
    let mut original = Ontology::new();
    let dog = original.add_node("Dog").into_inner();
    let lang = original.add_node("C#").into_inner();
    original.add_node("50% Cotton");
    for datatype in ["integer", "string", "dateTime"] {
        original.add_datatype_node(datatype);
    }
    original
        .add_edge(&dog, "age", EdgeEnd::Datatype("integer".into()))
        .expect("age");
    original
        .add_edge(&dog, "name", EdgeEnd::Datatype("string".into()))
        .expect("name");
    original
        .add_edge(&lang, "released", EdgeEnd::Datatype("dateTime".into()))
        .expect("released");
    original
        .add_edge(&dog, "knows", EdgeEnd::Class(lang))
        .expect("knows");

    let namespace = namespace();
    let text = JsonLdExporter::new(&namespace)
        .export(&original, "Mixed Bag")
        .expect("export");
    let imported = JsonLdImporter::new(&namespace)
        .import_str(&text)
        .expect("import");

    assert_eq!(class_labels(&imported), class_labels(&original));
    assert_eq!(triples(&imported), triples(&original));

    let turtle = TurtleExporter::new(&namespace)
        .export(&original)
        .expect("turtle");
    assert!(turtle.contains(":knows a owl:ObjectProperty ;\n    rdfs:domain :Dog ;\n    rdfs:range <http://example.org/ontology#C%23> ."));
}
