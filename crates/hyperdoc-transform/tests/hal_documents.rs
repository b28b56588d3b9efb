//! End-to-end HAL transformation over the serializer wire shape.
//!
//! Feeds raw wire JSON (marker keys included) through `Node::from_wire` and
//! both transformers, asserting on the final document shapes.

use hyperdoc_core::Node;
use hyperdoc_mapping::{Mapping, MappingRegistry};
use hyperdoc_transform::{HalTransformer, JsonApiTransformer};
use serde_json::json;

fn registry() -> MappingRegistry {
    let widget = Mapping::builder("widget", "app::model::Widget")
        .properties(["id", "name", "owner"])
        .id_properties(["id"])
        .resource_url("/widgets/{id}")
        .build()
        .unwrap();
    let user = Mapping::builder("user", "app::model::User")
        .properties(["id", "name"])
        .id_properties(["id"])
        .resource_url("/users/{id}")
        .additional_url("avatar", "/users/{id}/avatar")
        .build()
        .unwrap();
    MappingRegistry::new(vec![widget, user]).unwrap()
}

#[test]
fn widget_with_owner_from_wire_to_hal() {
    let wire = json!({
        "@type": "widget",
        "id": "7",
        "name": "Bolt",
        "owner": {"@type": "user", "id": "3", "name": "Ann"}
    });
    let node = Node::from_wire(&wire).unwrap();
    let registry = registry();
    let document = HalTransformer::new(&registry).to_document(&node).unwrap();

    assert_eq!(document["id"], "7");
    assert_eq!(document["name"], "Bolt");
    assert_eq!(document["_embedded"]["owner"]["id"], "3");
    assert_eq!(document["_embedded"]["owner"]["name"], "Ann");
    assert_eq!(
        document["_embedded"]["owner"]["_links"]["self"]["href"],
        "/users/3"
    );
    assert_eq!(
        document["_embedded"]["owner"]["_links"]["avatar"]["href"],
        "/users/3/avatar"
    );
    assert_eq!(document["_links"]["owner"]["href"], "/users/3");
    assert_eq!(document["_links"]["self"]["href"], "/widgets/7");
    // No markers survive into the output.
    let text = serde_json::to_string(&document).unwrap();
    assert!(!text.contains("@type"));
}

#[test]
fn wire_collection_roots_become_json_arrays() {
    let wire = json!({
        "@map": true,
        "@value": [
            {"@type": "widget", "id": "1", "name": "Bolt"},
            {"@type": "widget", "id": "2", "name": "Nut"}
        ]
    });
    let node = Node::from_wire(&wire).unwrap();
    let registry = registry();
    let document = HalTransformer::new(&registry).to_document(&node).unwrap();

    let elements = document.as_array().unwrap();
    assert_eq!(elements.len(), 2);
    assert_eq!(elements[0]["name"], "Bolt");
    assert_eq!(elements[1]["_links"]["self"]["href"], "/widgets/2");
}

#[test]
fn the_same_graph_shapes_both_document_variants() {
    let wire = json!({
        "@type": "widget",
        "id": "7",
        "name": "Bolt",
        "owner": {"@type": "user", "id": "3", "name": "Ann"}
    });
    let node = Node::from_wire(&wire).unwrap();
    let registry = registry();

    let hal = HalTransformer::new(&registry).to_document(&node).unwrap();
    let jsonapi = JsonApiTransformer::new(&registry).to_document(&node).unwrap();

    // Same attribute content, different placement keys.
    assert_eq!(hal["name"], jsonapi["data"]["attributes"]["name"]);
    assert_eq!(
        hal["_embedded"]["owner"]["name"],
        jsonapi["included"][0]["attributes"]["name"]
    );
    assert_eq!(
        hal["_links"]["self"]["href"],
        jsonapi["links"]["self"]["href"]
    );
}

#[test]
fn scalar_holders_in_wire_values_unwrap_into_attributes() {
    let wire = json!({
        "@type": "widget",
        "id": "7",
        "name": {"@scalar": true, "@value": "Bolt"}
    });
    let node = Node::from_wire(&wire).unwrap();
    let registry = registry();
    let document = HalTransformer::new(&registry).to_document(&node).unwrap();
    assert_eq!(document["name"], "Bolt");
}
