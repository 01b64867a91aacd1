//! JSON form of a document.
//!
//! ```json
//! { "name": "order", "attributes": { "id": "1" }, "children": ["text", { "name": "item" }] }
//! ```

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::{Document, DocumentError, NodeId};

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum JsonNode {
    Text(String),
    Element(JsonElement),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct JsonElement {
    name: String,
    #[serde(default)]
    attributes: BTreeMap<String, String>,
    #[serde(default)]
    children: Vec<JsonNode>,
}

impl Document {
    /// Parses a document from its JSON form.
    pub fn from_json(json: &str) -> Result<Self, DocumentError> {
        let root: JsonElement = serde_json::from_str(json)?;
        if root.name.is_empty() {
            return Err(DocumentError::invalid("document element has an empty name"));
        }

        let mut document = Document::new(root.name.clone());
        let mut pending = vec![(NodeId::ROOT, root)];
        while let Some((id, element)) = pending.pop() {
            for (name, value) in element.attributes {
                document.set_attribute(id, name, value)?;
            }
            for child in element.children {
                match child {
                    JsonNode::Text(text) => {
                        document.append_text(id, text)?;
                    }
                    JsonNode::Element(child) => {
                        if child.name.is_empty() {
                            return Err(DocumentError::invalid("element has an empty name"));
                        }
                        let child_id = document.append_element(id, child.name.clone())?;
                        pending.push((child_id, child));
                    }
                }
            }
        }

        Ok(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Node, StreamEvent};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn test_from_json() {
        let json = r#"{
            "name": "order",
            "attributes": { "id": "42" },
            "children": [
                { "name": "date", "children": ["Wed Nov 15"] },
                { "name": "items", "children": [
                    { "name": "item", "children": ["111"] },
                    { "name": "item", "children": ["222"] }
                ]}
            ]
        }"#;

        let doc = Document::from_json(json).unwrap();
        let root = doc.root();

        assert_eq!(root.attribute("id"), Some("42"));
        let names: Vec<_> = root.child_elements().filter_map(Node::name).collect();
        assert_eq!(names, vec!["date", "items"]);
        assert_eq!(root.text_content(), "Wed Nov 15111222");
    }

    #[test]
    fn test_from_json_preserves_document_order() {
        let json = r#"{ "name": "a", "children": [
            { "name": "b", "children": [{ "name": "c" }] },
            "tail"
        ]}"#;

        let doc = Document::from_json(json).unwrap();
        let events: Vec<_> = doc.events().collect();
        assert_eq!(
            events,
            vec![
                StreamEvent::start("a"),
                StreamEvent::start("b"),
                StreamEvent::start("c"),
                StreamEvent::end(),
                StreamEvent::end(),
                StreamEvent::text("tail"),
                StreamEvent::end(),
            ]
        );
    }

    #[rstest]
    #[case::not_json("<order/>")]
    #[case::missing_name(r#"{ "children": [] }"#)]
    #[case::unknown_field(r#"{ "name": "a", "kids": [] }"#)]
    #[case::empty_root_name(r#"{ "name": "" }"#)]
    #[case::empty_child_name(r#"{ "name": "a", "children": [{ "name": "" }] }"#)]
    fn test_from_json_rejects(#[case] json: &str) {
        assert!(Document::from_json(json).is_err(), "expected error for {json}");
    }
}
