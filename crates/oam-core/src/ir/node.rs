//! Arena of lowered schema nodes.
//!
//! Raw schemas carry every keyword as an optional field. Lowering picks the
//! one kind a schema actually is and keeps only the fields that kind uses,
//! so the resolver never sees combinations such as an array with enum values.

use indexmap::IndexMap;
use serde_json::Value;

use crate::parse::components::Components;
use crate::parse::ref_resolve::{encode_pointer_segment, schema_ref_name};
use crate::parse::schema::{Discriminator, Schema, SchemaOrBool, SchemaOrRef, SchemaType, TypeSet};

/// Index of a node in a [`SchemaArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

/// JSON Schema primitive type keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveBase {
    String,
    Integer,
    Number,
    Boolean,
}

impl PrimitiveBase {
    fn from_schema_type(ty: &SchemaType) -> Option<Self> {
        match ty {
            SchemaType::String => Some(PrimitiveBase::String),
            SchemaType::Integer => Some(PrimitiveBase::Integer),
            SchemaType::Number => Some(PrimitiveBase::Number),
            SchemaType::Boolean => Some(PrimitiveBase::Boolean),
            SchemaType::Array | SchemaType::Object | SchemaType::Null => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositionMode {
    AllOf,
    OneOf,
    AnyOf,
}

/// What an object allows beyond its declared properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtraProperties {
    /// Not specified or `false`.
    None,
    /// `additionalProperties: true`.
    Any,
    Schema(NodeId),
}

/// What a tuple allows after its positional elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TupleRest {
    Closed,
    /// `items: true` when the schema is `None`.
    Open(Option<NodeId>),
}

/// A schema reduced to the one kind it represents.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaNode {
    Reference {
        ref_path: String,
        /// Component schema name, `None` when the pointer is not a schema ref.
        target: Option<String>,
    },
    Composition {
        mode: CompositionMode,
        branches: Vec<NodeId>,
        /// Properties declared next to `allOf`, lowered as an object node.
        own_properties: Option<NodeId>,
        discriminator: Option<Discriminator>,
        nullable: bool,
    },
    Object {
        properties: IndexMap<String, NodeId>,
        required: Vec<String>,
        additional: ExtraProperties,
        nullable: bool,
    },
    Array {
        items: Option<NodeId>,
        nullable: bool,
    },
    Tuple {
        elements: Vec<NodeId>,
        rest: TupleRest,
        nullable: bool,
    },
    Primitive {
        base: PrimitiveBase,
        format: Option<String>,
        nullable: bool,
    },
    Enum {
        base: Option<PrimitiveBase>,
        values: Vec<Value>,
        nullable: bool,
    },
    Null,
    Any {
        nullable: bool,
    },
}

impl SchemaNode {
    pub fn nullable(&self) -> bool {
        match self {
            SchemaNode::Reference { .. } => false,
            SchemaNode::Null => true,
            SchemaNode::Composition { nullable, .. }
            | SchemaNode::Object { nullable, .. }
            | SchemaNode::Array { nullable, .. }
            | SchemaNode::Tuple { nullable, .. }
            | SchemaNode::Primitive { nullable, .. }
            | SchemaNode::Enum { nullable, .. }
            | SchemaNode::Any { nullable } => *nullable,
        }
    }
}

/// Annotations carried through to property descriptors.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeMeta {
    pub description: Option<String>,
    pub read_only: bool,
    pub write_only: bool,
}

#[derive(Debug, Clone)]
struct Entry {
    node: SchemaNode,
    pointer: String,
    meta: NodeMeta,
}

/// Owns every lowered node of one document.
#[derive(Debug, Default)]
pub struct SchemaArena {
    entries: Vec<Entry>,
    names: IndexMap<String, NodeId>,
}

impl SchemaArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lower every component schema of a document.
    pub fn from_components(components: Option<&Components>) -> Self {
        let mut arena = Self::new();
        if let Some(c) = components {
            for (name, schema) in &c.schemas {
                let pointer = format!("#/components/schemas/{}", encode_pointer_segment(name));
                let id = arena.lower(schema, pointer);
                arena.names.insert(name.clone(), id);
            }
        }
        arena
    }

    pub fn node(&self, id: NodeId) -> &SchemaNode {
        &self.entries[id.0].node
    }

    pub fn pointer(&self, id: NodeId) -> &str {
        &self.entries[id.0].pointer
    }

    pub fn meta(&self, id: NodeId) -> &NodeMeta {
        &self.entries[id.0].meta
    }

    /// Node of a named component schema.
    pub fn named(&self, name: &str) -> Option<NodeId> {
        self.names.get(name).copied()
    }

    pub fn names(&self) -> impl Iterator<Item = (&str, NodeId)> {
        self.names.iter().map(|(name, id)| (name.as_str(), *id))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Lower a schema (and everything below it) into the arena.
    pub fn lower(&mut self, schema_or_ref: &SchemaOrRef, pointer: String) -> NodeId {
        match schema_or_ref {
            SchemaOrRef::Ref { ref_path } => self.push(
                SchemaNode::Reference {
                    ref_path: ref_path.clone(),
                    target: schema_ref_name(ref_path),
                },
                pointer,
                NodeMeta::default(),
            ),
            SchemaOrRef::Schema(schema) => self.lower_schema(schema, pointer),
        }
    }

    fn push(&mut self, node: SchemaNode, pointer: String, meta: NodeMeta) -> NodeId {
        let id = NodeId(self.entries.len());
        self.entries.push(Entry {
            node,
            pointer,
            meta,
        });
        id
    }

    fn lower_schema(&mut self, schema: &Schema, pointer: String) -> NodeId {
        let meta = NodeMeta {
            description: schema.description.clone(),
            read_only: schema.read_only.unwrap_or(false),
            write_only: schema.write_only.unwrap_or(false),
        };
        let nullable = schema.nullable.unwrap_or(false)
            || schema
                .schema_type
                .as_ref()
                .is_some_and(|t| t.contains(&SchemaType::Null));

        let node = if !schema.one_of.is_empty() {
            self.lower_composition(CompositionMode::OneOf, &schema.one_of, schema, nullable, &pointer)
        } else if !schema.any_of.is_empty() {
            self.lower_composition(CompositionMode::AnyOf, &schema.any_of, schema, nullable, &pointer)
        } else if !schema.all_of.is_empty() {
            self.lower_composition(CompositionMode::AllOf, &schema.all_of, schema, nullable, &pointer)
        } else if !schema.enum_values.is_empty() {
            SchemaNode::Enum {
                base: single_primitive(schema),
                values: schema.enum_values.clone(),
                nullable,
            }
        } else if let Some(ref value) = schema.const_value {
            SchemaNode::Enum {
                base: single_primitive(schema),
                values: vec![value.clone()],
                nullable,
            }
        } else {
            match &schema.schema_type {
                Some(TypeSet::Multiple(types)) => {
                    let non_null: Vec<&SchemaType> =
                        types.iter().filter(|t| **t != SchemaType::Null).collect();
                    match non_null.as_slice() {
                        [] => SchemaNode::Null,
                        [single] => self.lower_typed(single, schema, nullable, &pointer),
                        many => {
                            let branches = many
                                .iter()
                                .enumerate()
                                .map(|(i, ty)| {
                                    let branch = Schema {
                                        schema_type: Some(TypeSet::Single(**ty)),
                                        nullable: None,
                                        ..schema.clone()
                                    };
                                    self.lower_schema(&branch, format!("{pointer}/type/{i}"))
                                })
                                .collect();
                            SchemaNode::Composition {
                                mode: CompositionMode::OneOf,
                                branches,
                                own_properties: None,
                                discriminator: None,
                                nullable,
                            }
                        }
                    }
                }
                Some(TypeSet::Single(ty)) => self.lower_typed(ty, schema, nullable, &pointer),
                None => {
                    if !schema.properties.is_empty() || schema.additional_properties.is_some() {
                        self.lower_object(schema, nullable, &pointer)
                    } else if !schema.prefix_items.is_empty() || schema.items.is_some() {
                        self.lower_array(schema, nullable, &pointer)
                    } else {
                        SchemaNode::Any { nullable }
                    }
                }
            }
        };

        self.push(node, pointer, meta)
    }

    fn lower_typed(
        &mut self,
        ty: &SchemaType,
        schema: &Schema,
        nullable: bool,
        pointer: &str,
    ) -> SchemaNode {
        match ty {
            SchemaType::Object => self.lower_object(schema, nullable, pointer),
            SchemaType::Array => self.lower_array(schema, nullable, pointer),
            SchemaType::Null => SchemaNode::Null,
            other => SchemaNode::Primitive {
                base: PrimitiveBase::from_schema_type(other).unwrap_or(PrimitiveBase::String),
                format: schema.format.clone(),
                nullable,
            },
        }
    }

    fn lower_composition(
        &mut self,
        mode: CompositionMode,
        branches: &[SchemaOrRef],
        schema: &Schema,
        nullable: bool,
        pointer: &str,
    ) -> SchemaNode {
        let key = match mode {
            CompositionMode::AllOf => "allOf",
            CompositionMode::OneOf => "oneOf",
            CompositionMode::AnyOf => "anyOf",
        };
        let branches = branches
            .iter()
            .enumerate()
            .map(|(i, b)| self.lower(b, format!("{pointer}/{key}/{i}")))
            .collect();
        let own_properties = if mode == CompositionMode::AllOf && !schema.properties.is_empty() {
            let node = self.lower_object(schema, false, pointer);
            Some(self.push(node, pointer.to_string(), NodeMeta::default()))
        } else {
            None
        };
        SchemaNode::Composition {
            mode,
            branches,
            own_properties,
            discriminator: schema.discriminator.clone(),
            nullable,
        }
    }

    fn lower_object(&mut self, schema: &Schema, nullable: bool, pointer: &str) -> SchemaNode {
        let properties = schema
            .properties
            .iter()
            .map(|(name, prop)| {
                let child = format!("{pointer}/properties/{}", encode_pointer_segment(name));
                (name.clone(), self.lower(prop, child))
            })
            .collect();
        let additional = match &schema.additional_properties {
            Some(SchemaOrBool::Schema(s)) => {
                ExtraProperties::Schema(self.lower(s, format!("{pointer}/additionalProperties")))
            }
            Some(SchemaOrBool::Bool(true)) => ExtraProperties::Any,
            Some(SchemaOrBool::Bool(false)) | None => ExtraProperties::None,
        };
        SchemaNode::Object {
            properties,
            required: schema.required.clone(),
            additional,
            nullable,
        }
    }

    fn lower_array(&mut self, schema: &Schema, nullable: bool, pointer: &str) -> SchemaNode {
        if schema.prefix_items.is_empty() {
            let items = schema
                .items
                .as_ref()
                .and_then(SchemaOrBool::as_schema)
                .map(|s| self.lower(s, format!("{pointer}/items")));
            return SchemaNode::Array { items, nullable };
        }

        let elements = schema
            .prefix_items
            .iter()
            .enumerate()
            .map(|(i, s)| self.lower(s, format!("{pointer}/prefixItems/{i}")))
            .collect();
        // `additionalItems` is the pre-2020-12 spelling of the same clause.
        let (extra, key) = match (&schema.items, &schema.additional_items) {
            (Some(items), _) => (Some(items), "items"),
            (None, Some(additional)) => (Some(additional), "additionalItems"),
            (None, None) => (None, ""),
        };
        let rest = match extra {
            Some(SchemaOrBool::Schema(s)) => {
                TupleRest::Open(Some(self.lower(s, format!("{pointer}/{key}"))))
            }
            Some(SchemaOrBool::Bool(true)) => TupleRest::Open(None),
            Some(SchemaOrBool::Bool(false)) | None => TupleRest::Closed,
        };
        SchemaNode::Tuple {
            elements,
            rest,
            nullable,
        }
    }
}

fn single_primitive(schema: &Schema) -> Option<PrimitiveBase> {
    match &schema.schema_type {
        Some(TypeSet::Single(t)) => PrimitiveBase::from_schema_type(t),
        Some(TypeSet::Multiple(types)) => types.iter().find_map(PrimitiveBase::from_schema_type),
        None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lower_yaml(yaml: &str) -> (SchemaArena, NodeId) {
        let schema: SchemaOrRef = serde_yaml_ng::from_str(yaml).unwrap();
        let mut arena = SchemaArena::new();
        let id = arena.lower(&schema, "#".to_string());
        (arena, id)
    }

    #[test]
    fn lowers_reference() {
        let (arena, id) = lower_yaml("$ref: '#/components/schemas/Pet'");
        assert_eq!(
            arena.node(id),
            &SchemaNode::Reference {
                ref_path: "#/components/schemas/Pet".to_string(),
                target: Some("Pet".to_string()),
            }
        );
    }

    #[test]
    fn type_array_with_null_is_nullable_primitive() {
        let (arena, id) = lower_yaml("type: [string, 'null']\nformat: uuid");
        match arena.node(id) {
            SchemaNode::Primitive {
                base,
                format,
                nullable,
            } => {
                assert_eq!(*base, PrimitiveBase::String);
                assert_eq!(format.as_deref(), Some("uuid"));
                assert!(*nullable);
            }
            other => panic!("expected primitive, got {other:?}"),
        }
    }

    #[test]
    fn enum_wins_over_type() {
        let (arena, id) = lower_yaml("type: string\nenum: [a, b]");
        assert!(matches!(
            arena.node(id),
            SchemaNode::Enum {
                base: Some(PrimitiveBase::String),
                ..
            }
        ));
    }

    #[test]
    fn prefix_items_lower_to_closed_tuple() {
        let (arena, id) = lower_yaml(
            "type: array\nprefixItems:\n  - type: string\n  - type: integer\n",
        );
        match arena.node(id) {
            SchemaNode::Tuple { elements, rest, .. } => {
                assert_eq!(elements.len(), 2);
                assert_eq!(*rest, TupleRest::Closed);
            }
            other => panic!("expected tuple, got {other:?}"),
        }
    }

    #[test]
    fn all_of_keeps_sibling_properties() {
        let (arena, id) = lower_yaml(
            "allOf:\n  - $ref: '#/components/schemas/Base'\nproperties:\n  extra:\n    type: string\n",
        );
        match arena.node(id) {
            SchemaNode::Composition {
                mode,
                branches,
                own_properties,
                ..
            } => {
                assert_eq!(*mode, CompositionMode::AllOf);
                assert_eq!(branches.len(), 1);
                let own = own_properties.expect("sibling properties lowered");
                assert!(matches!(arena.node(own), SchemaNode::Object { .. }));
            }
            other => panic!("expected composition, got {other:?}"),
        }
    }
}
