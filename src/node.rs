//! Nested key-value structures walked by the engine
//!
//! A [`Node`] is either a scalar [`Value`] leaf, an insertion-ordered map, or
//! a list. Template structures are usually built from JSON, so conversions
//! to and from [`serde_json::Value`] are provided.

use crate::value::Value;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Map node type (preserves insertion order)
pub type NodeMap = IndexMap<String, Node>;

/// Template structure node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Node {
    Value(Value),
    Map(NodeMap),
    List(Vec<Node>),
}

impl Node {
    /// Creates an empty map node
    pub fn map() -> Self {
        Node::Map(NodeMap::new())
    }

    /// Returns true if the node is a map
    pub fn is_map(&self) -> bool {
        matches!(self, Node::Map(_))
    }

    /// Returns true if the node is a list
    pub fn is_list(&self) -> bool {
        matches!(self, Node::List(_))
    }

    /// Returns a reference to the scalar if this is a Value node
    pub fn as_value(&self) -> Option<&Value> {
        if let Node::Value(value) = self {
            Some(value)
        } else {
            None
        }
    }

    /// Returns a reference to the map if this is a Map node
    pub fn as_map(&self) -> Option<&NodeMap> {
        if let Node::Map(map) = self {
            Some(map)
        } else {
            None
        }
    }

    /// Returns a reference to the list if this is a List node
    pub fn as_list(&self) -> Option<&[Node]> {
        if let Node::List(list) = self {
            Some(list)
        } else {
            None
        }
    }

    /// Returns the string if this is a string leaf
    pub fn as_str(&self) -> Option<&str> {
        self.as_value().and_then(Value::as_str)
    }

    /// Looks up a child of a map node by key
    pub fn get(&self, key: &str) -> Option<&Node> {
        self.as_map().and_then(|map| map.get(key))
    }

    /// Inserts a child into a map node, returning the node for chaining
    ///
    /// Non-map nodes are left unchanged.
    pub fn with(mut self, key: impl Into<String>, child: impl Into<Node>) -> Self {
        if let Node::Map(map) = &mut self {
            map.insert(key.into(), child.into());
        }
        self
    }
}

impl Default for Node {
    fn default() -> Self {
        Node::Value(Value::Null)
    }
}

impl From<Value> for Node {
    fn from(value: Value) -> Self {
        Node::Value(value)
    }
}

impl From<&str> for Node {
    fn from(value: &str) -> Self {
        Node::Value(Value::from(value))
    }
}

impl From<String> for Node {
    fn from(value: String) -> Self {
        Node::Value(Value::String(value))
    }
}

impl From<NodeMap> for Node {
    fn from(map: NodeMap) -> Self {
        Node::Map(map)
    }
}

impl From<Vec<Node>> for Node {
    fn from(list: Vec<Node>) -> Self {
        Node::List(list)
    }
}

impl<K> FromIterator<(K, Node)> for Node
where
    K: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, Node)>>(iter: I) -> Self {
        Node::Map(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl From<serde_json::Value> for Node {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Array(items) => {
                Node::List(items.into_iter().map(Node::from).collect())
            }
            serde_json::Value::Object(object) => Node::Map(
                object
                    .into_iter()
                    .map(|(key, child)| (key, Node::from(child)))
                    .collect(),
            ),
            // Every remaining JSON value is a scalar
            scalar => Node::Value(Value::try_from(scalar).unwrap_or_default()),
        }
    }
}

impl From<Node> for serde_json::Value {
    fn from(node: Node) -> Self {
        match node {
            Node::Value(value) => value.into(),
            Node::Map(map) => serde_json::Value::Object(
                map.into_iter()
                    .map(|(key, child)| (key, serde_json::Value::from(child)))
                    .collect(),
            ),
            Node::List(list) => {
                serde_json::Value::Array(list.into_iter().map(Into::into).collect())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_preserves_order_and_types() {
        let node = Node::from(json!({
            "z": "{{ fruit }}",
            "a": 1,
            "m": [true, null, 1.5],
        }));

        let map = node.as_map().unwrap();
        let keys: Vec<&str> = map.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["z", "a", "m"]);

        assert_eq!(node.get("z").and_then(Node::as_str), Some("{{ fruit }}"));
        assert_eq!(node.get("a"), Some(&Node::Value(Value::Integer(1))));

        let list = node.get("m").and_then(Node::as_list).unwrap();
        assert_eq!(list.len(), 3);
        assert_eq!(list[0], Node::Value(Value::Boolean(true)));
        assert_eq!(list[1], Node::Value(Value::Null));
        assert_eq!(list[2], Node::Value(Value::Float(1.5)));
    }

    #[test]
    fn test_json_round_trip_keeps_structure() {
        let original = json!({"a": {"b": ["x", 2]}, "c": false});
        let back = serde_json::Value::from(Node::from(original.clone()));
        assert_eq!(back, original);
    }

    #[test]
    fn test_builder_helpers() {
        let node = Node::map()
            .with("name", "{{ fruit }}")
            .with("nested", Node::map().with("price", Value::Float(2.5)));

        assert!(node.is_map());
        assert_eq!(
            node.get("nested").and_then(|n| n.get("price")),
            Some(&Node::Value(Value::Float(2.5)))
        );

        // Inserting into a scalar is ignored
        let scalar = Node::from("x").with("k", "v");
        assert_eq!(scalar, Node::from("x"));
    }

    #[test]
    fn test_collect_into_map() {
        let node: Node = vec![("a", Node::from("1")), ("b", Node::from("2"))]
            .into_iter()
            .collect();
        assert_eq!(node.get("b").and_then(Node::as_str), Some("2"));
    }

    #[test]
    fn test_deserialize_untagged() {
        let node: Node = serde_json::from_str(r#"{"a": [1, "two"], "b": null}"#).unwrap();
        assert!(node.get("a").unwrap().is_list());
        assert_eq!(node.get("b"), Some(&Node::Value(Value::Null)));
    }
}
