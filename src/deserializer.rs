//! Serde deserializer over resolved structures
//!
//! After resolution a [`Node`] holds native scalars wherever a field was a
//! single token, so it can be turned straight into a typed Rust value:
//!
//! ```rust
//! use serde::Deserialize;
//! use templa::{Constant, Node, TemplaEngine};
//!
//! #[derive(Deserialize)]
//! struct Order {
//!     fruit: String,
//!     quantity: u32,
//! }
//!
//! let mut engine = TemplaEngine::new();
//! engine
//!     .add_macro("fruit", Constant::new("orange", "string"))
//!     .add_macro("quantity", Constant::new(3, "int"));
//!
//! let template = Node::from(serde_json::json!({
//!     "fruit": "{{ fruit }}",
//!     "quantity": "{{ quantity }}",
//! }));
//! let order: Order = engine.render(&template, &["fruit"]).unwrap();
//! assert_eq!(order.fruit, "orange");
//! assert_eq!(order.quantity, 3);
//! ```

use crate::error::{Path, SerdeError, TemplaError};
use crate::node::{Node, NodeMap};
use crate::value::Value;
use serde::de::{self, DeserializeOwned, DeserializeSeed, IntoDeserializer, Visitor};

/// Deserializer reading from an owned [`Node`]
///
/// Errors carry the path of the innermost node that failed.
pub struct NodeDeserializer {
    node: Node,
    path: Path,
}

impl NodeDeserializer {
    /// Creates a deserializer rooted at `node`
    pub fn new(node: Node) -> Self {
        Self::at(node, Path::new())
    }

    fn at(node: Node, path: Path) -> Self {
        Self { node, path }
    }

    fn visit_node<'de, V>(node: Node, path: &Path, visitor: V) -> Result<V::Value, SerdeError>
    where
        V: Visitor<'de>,
    {
        match node {
            Node::Value(Value::String(s)) => visitor.visit_string(s),
            Node::Value(Value::Integer(i)) => visitor.visit_i64(i),
            Node::Value(Value::Float(f)) => visitor.visit_f64(f),
            Node::Value(Value::Boolean(b)) => visitor.visit_bool(b),
            Node::Value(Value::Null) => visitor.visit_unit(),
            Node::Map(map) => visitor.visit_map(NodeMapAccess::new(map, path.clone())),
            Node::List(list) => visitor.visit_seq(NodeSeqAccess::new(list, path.clone())),
        }
    }
}

impl<'de> de::Deserializer<'de> for NodeDeserializer {
    type Error = SerdeError;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        let path = self.path;
        Self::visit_node(self.node, &path, visitor).map_err(|e| e.at(&path))
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        match self.node {
            Node::Value(Value::Null) => visitor.visit_none(),
            _ => visitor.visit_some(self),
        }
    }

    fn deserialize_newtype_struct<V>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        let path = self.path;
        let access = match self.node {
            // Unit variant
            Node::Value(Value::String(variant)) => NodeEnumAccess {
                variant,
                content: None,
                path: path.clone(),
            },
            // Data variant
            Node::Map(mut map) if map.len() == 1 => match map.shift_remove_index(0) {
                Some((variant, content)) => NodeEnumAccess {
                    variant,
                    content: Some(content),
                    path: path.clone(),
                },
                None => return Err(SerdeError::Custom("empty enum map".to_string()).at(&path)),
            },
            other => {
                return Err(SerdeError::Custom(format!(
                    "expected enum (string or single-key map), found {}",
                    describe(&other)
                ))
                .at(&path));
            }
        };
        visitor.visit_enum(access).map_err(|e| e.at(&path))
    }

    serde::forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf unit unit_struct seq tuple tuple_struct map struct
        identifier ignored_any
    }
}

fn describe(node: &Node) -> String {
    match node {
        Node::Value(value) => value.type_name().to_string(),
        Node::Map(map) => format!("map with {} keys", map.len()),
        Node::List(_) => "list".to_string(),
    }
}

struct NodeSeqAccess {
    items: std::iter::Enumerate<std::vec::IntoIter<Node>>,
    path: Path,
}

impl NodeSeqAccess {
    fn new(list: Vec<Node>, path: Path) -> Self {
        Self {
            items: list.into_iter().enumerate(),
            path,
        }
    }
}

impl<'de> de::SeqAccess<'de> for NodeSeqAccess {
    type Error = SerdeError;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>, Self::Error>
    where
        T: DeserializeSeed<'de>,
    {
        match self.items.next() {
            Some((index, node)) => seed
                .deserialize(NodeDeserializer::at(node, self.path.child(index)))
                .map(Some),
            None => Ok(None),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.items.len())
    }
}

struct NodeMapAccess {
    entries: indexmap::map::IntoIter<String, Node>,
    current: Option<(String, Node)>,
    path: Path,
}

impl NodeMapAccess {
    fn new(map: NodeMap, path: Path) -> Self {
        Self {
            entries: map.into_iter(),
            current: None,
            path,
        }
    }
}

impl<'de> de::MapAccess<'de> for NodeMapAccess {
    type Error = SerdeError;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>, Self::Error>
    where
        K: DeserializeSeed<'de>,
    {
        match self.entries.next() {
            Some((key, node)) => {
                let result = seed.deserialize(key.as_str().into_deserializer()).map(Some);
                self.current = Some((key, node));
                result
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value, Self::Error>
    where
        V: DeserializeSeed<'de>,
    {
        match self.current.take() {
            Some((key, node)) => {
                seed.deserialize(NodeDeserializer::at(node, self.path.child(key)))
            }
            None => Err(SerdeError::Custom(
                "value requested before key".to_string(),
            )),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.entries.len())
    }
}

struct NodeEnumAccess {
    variant: String,
    content: Option<Node>,
    path: Path,
}

impl<'de> de::EnumAccess<'de> for NodeEnumAccess {
    type Error = SerdeError;
    type Variant = Self;

    fn variant_seed<V>(self, seed: V) -> Result<(V::Value, Self::Variant), Self::Error>
    where
        V: DeserializeSeed<'de>,
    {
        let variant = seed.deserialize(self.variant.as_str().into_deserializer())?;
        Ok((variant, self))
    }
}

impl NodeEnumAccess {
    fn content(self, expected: &'static str) -> Result<NodeDeserializer, SerdeError> {
        match self.content {
            Some(node) => Ok(NodeDeserializer::at(node, self.path.child(self.variant))),
            None => Err(de::Error::invalid_type(
                de::Unexpected::UnitVariant,
                &expected,
            )),
        }
    }
}

impl<'de> de::VariantAccess<'de> for NodeEnumAccess {
    type Error = SerdeError;

    fn unit_variant(self) -> Result<(), Self::Error> {
        match self.content {
            None | Some(Node::Value(Value::Null)) => Ok(()),
            Some(other) => Err(SerdeError::Custom(format!(
                "expected unit variant `{}`, found {}",
                self.variant,
                describe(&other)
            ))),
        }
    }

    fn newtype_variant_seed<T>(self, seed: T) -> Result<T::Value, Self::Error>
    where
        T: DeserializeSeed<'de>,
    {
        seed.deserialize(self.content("newtype variant")?)
    }

    fn tuple_variant<V>(self, _len: usize, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        de::Deserializer::deserialize_seq(self.content("tuple variant")?, visitor)
    }

    fn struct_variant<V>(
        self,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        de::Deserializer::deserialize_map(self.content("struct variant")?, visitor)
    }
}

/// Deserializes a resolved structure into `T`
pub fn from_node<T>(node: Node) -> Result<T, TemplaError>
where
    T: DeserializeOwned,
{
    T::deserialize(NodeDeserializer::new(node)).map_err(TemplaError::from)
}
