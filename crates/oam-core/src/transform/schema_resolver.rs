use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use serde_json::Value;

use crate::config::ResolveOptions;
use crate::diagnostics::{Diagnostic, Location, RuleId};
use crate::ir::node::{CompositionMode, ExtraProperties, NodeId, PrimitiveBase, TupleRest};
use crate::ir::{
    DiscriminatorDescriptor, EnumDescriptor, ObjectDescriptor, PrimitiveType, PropertyDescriptor,
    SchemaArena, SchemaNode, TupleDescriptor, TypeDescriptor, TypeKind, UnionDescriptor,
};
use crate::parse::ref_resolve::schema_ref_name;
use crate::parse::schema::Discriminator;

use super::formats::{FormatLookup, base_primitive, lookup_format};

/// Converts lowered schema nodes into [`TypeDescriptor`]s.
///
/// Named schemas currently being resolved sit on an in-progress stack. A
/// reference to a schema already on the stack is a back-edge and becomes
/// [`TypeKind::Recursive`]. The back-edge is fine when the path from the
/// enclosing occurrence crosses a nullable node, an optional property or a
/// collection element; otherwise the cycle is reported as `TYP001`.
pub struct SchemaResolver<'a> {
    arena: &'a SchemaArena,
    options: ResolveOptions,
    /// Descriptors that contain no back-edges.
    cache: HashMap<NodeId, TypeDescriptor>,
    in_progress: Vec<(String, NodeId)>,
    /// `in_progress.len()` at each break point on the current path.
    break_depths: Vec<usize>,
    back_edges: usize,
    reported: HashSet<(RuleId, String)>,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> SchemaResolver<'a> {
    pub fn new(arena: &'a SchemaArena, options: ResolveOptions) -> Self {
        Self {
            arena,
            options,
            cache: HashMap::new(),
            in_progress: Vec::new(),
            break_depths: Vec::new(),
            back_edges: 0,
            reported: HashSet::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Resolve every named schema, in declaration order.
    pub fn resolve_all(&mut self) -> IndexMap<String, TypeDescriptor> {
        let names: Vec<String> = self.arena.names().map(|(n, _)| n.to_string()).collect();
        names
            .into_iter()
            .filter_map(|name| {
                let descriptor = self.resolve_named(&name)?;
                Some((name, descriptor))
            })
            .collect()
    }

    /// Resolve a component schema by name.
    pub fn resolve_named(&mut self, name: &str) -> Option<TypeDescriptor> {
        let id = self.arena.named(name)?;
        Some(self.enter_named(name, id).named(name))
    }

    /// Resolve any node, named or inline.
    pub fn resolve(&mut self, id: NodeId) -> TypeDescriptor {
        if let Some(hit) = self.cache.get(&id) {
            return hit.clone();
        }
        let edges_before = self.back_edges;
        let node = self.arena.node(id);
        let breaks = node.nullable() || self.has_null_branch(node);
        if breaks {
            self.break_depths.push(self.in_progress.len());
        }
        let descriptor = self.resolve_node(id, node);
        if breaks {
            self.break_depths.pop();
        }
        if self.back_edges == edges_before {
            log::debug!("caching descriptor for {}", self.arena.pointer(id));
            self.cache.insert(id, descriptor.clone());
        }
        descriptor
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    fn enter_named(&mut self, name: &str, id: NodeId) -> TypeDescriptor {
        self.in_progress.push((name.to_string(), id));
        let descriptor = self.resolve(id);
        self.in_progress.pop();
        descriptor
    }

    /// Resolve below a point that makes a cycle through it breakable.
    fn guarded(&mut self, id: NodeId) -> TypeDescriptor {
        self.break_depths.push(self.in_progress.len());
        let descriptor = self.resolve(id);
        self.break_depths.pop();
        descriptor
    }

    fn has_null_branch(&self, node: &SchemaNode) -> bool {
        match node {
            SchemaNode::Composition {
                mode: CompositionMode::OneOf | CompositionMode::AnyOf,
                branches,
                ..
            } => branches
                .iter()
                .any(|b| matches!(self.arena.node(*b), SchemaNode::Null)),
            _ => false,
        }
    }

    fn resolve_node(&mut self, id: NodeId, node: &'a SchemaNode) -> TypeDescriptor {
        match node {
            SchemaNode::Reference { ref_path, target } => self.resolve_reference(ref_path, target),
            SchemaNode::Composition {
                mode: CompositionMode::AllOf,
                branches,
                own_properties,
                nullable,
                ..
            } => self.resolve_all_of(branches, *own_properties, *nullable),
            SchemaNode::Composition {
                branches,
                discriminator,
                nullable,
                ..
            } => self.resolve_union(branches, discriminator.as_ref(), *nullable),
            SchemaNode::Object {
                properties,
                required,
                additional,
                nullable,
            } => {
                let properties = properties
                    .iter()
                    .map(|(name, child)| {
                        let is_required = required.contains(name);
                        let descriptor = if is_required {
                            self.resolve(*child)
                        } else {
                            self.guarded(*child)
                        };
                        let meta = self.arena.meta(*child);
                        PropertyDescriptor {
                            name: name.clone(),
                            required: is_required,
                            descriptor,
                            description: meta.description.clone(),
                            read_only: meta.read_only,
                            write_only: meta.write_only,
                        }
                    })
                    .collect();
                let additional_properties = match additional {
                    ExtraProperties::None => None,
                    ExtraProperties::Any => Some(Box::new(TypeDescriptor::any())),
                    ExtraProperties::Schema(child) => Some(Box::new(self.guarded(*child))),
                };
                TypeDescriptor::new(TypeKind::Object(ObjectDescriptor {
                    properties,
                    additional_properties,
                }))
                .or_nullable(*nullable)
            }
            SchemaNode::Array { items, nullable } => {
                let element = match items {
                    Some(child) => self.guarded(*child),
                    None => TypeDescriptor::any(),
                };
                TypeDescriptor::new(TypeKind::Array {
                    element: Box::new(element),
                })
                .or_nullable(*nullable)
            }
            SchemaNode::Tuple {
                elements,
                rest,
                nullable,
            } => {
                let elements = elements.iter().map(|e| self.resolve(*e)).collect();
                let (rest, is_strict) = match rest {
                    TupleRest::Closed => (None, true),
                    TupleRest::Open(None) => (Some(Box::new(TypeDescriptor::any())), false),
                    TupleRest::Open(Some(child)) => (Some(Box::new(self.guarded(*child))), false),
                };
                TypeDescriptor::new(TypeKind::Tuple(TupleDescriptor {
                    elements,
                    rest,
                    is_strict,
                }))
                .or_nullable(*nullable)
            }
            SchemaNode::Primitive {
                base,
                format,
                nullable,
            } => {
                let primitive = match lookup_format(*base, format.as_deref()) {
                    FormatLookup::Known(p) => p,
                    FormatLookup::Unknown(p) => {
                        if self.options.report_unknown_formats {
                            self.report(
                                RuleId::UnknownFormat,
                                id,
                                format!(
                                    "format '{}' is not recognized; using {:?}",
                                    format.as_deref().unwrap_or_default(),
                                    p
                                ),
                            );
                        }
                        p
                    }
                };
                TypeDescriptor::primitive(primitive).or_nullable(*nullable)
            }
            SchemaNode::Enum {
                base,
                values,
                nullable,
            } => self.resolve_enum(id, *base, values, *nullable),
            SchemaNode::Null => TypeDescriptor::any().or_nullable(true),
            SchemaNode::Any { nullable } => TypeDescriptor::any().or_nullable(*nullable),
        }
    }

    fn resolve_reference(&mut self, ref_path: &str, target: &Option<String>) -> TypeDescriptor {
        let Some(name) = target else {
            return TypeDescriptor::unknown();
        };
        if let Some(pos) = self.in_progress.iter().position(|(n, _)| n == name) {
            self.back_edges += 1;
            let breakable = self.break_depths.last().is_some_and(|depth| *depth > pos);
            if !breakable {
                self.report_cycle(pos);
            }
            return TypeDescriptor::new(TypeKind::Recursive {
                target: name.clone(),
            });
        }
        match self.arena.named(name) {
            Some(id) => self.enter_named(name, id).named(name.clone()),
            None => {
                log::debug!("dangling reference {ref_path}");
                TypeDescriptor::unknown().named(name.clone())
            }
        }
    }

    fn resolve_union(
        &mut self,
        branches: &[NodeId],
        discriminator: Option<&Discriminator>,
        nullable: bool,
    ) -> TypeDescriptor {
        let mut has_null = false;
        let mut remaining = Vec::new();
        for branch in branches {
            if matches!(self.arena.node(*branch), SchemaNode::Null) {
                has_null = true;
            } else {
                remaining.push(*branch);
            }
        }
        let nullable = nullable || has_null;

        match remaining.as_slice() {
            [] => TypeDescriptor::any().or_nullable(nullable),
            [single] => self.resolve(*single).or_nullable(nullable),
            many => {
                let variants: Vec<TypeDescriptor> = many.iter().map(|b| self.resolve(*b)).collect();
                let discriminator = discriminator.map(|d| discriminator_descriptor(d, &variants));
                TypeDescriptor::new(TypeKind::Union(UnionDescriptor {
                    variants,
                    discriminator,
                }))
                .or_nullable(nullable)
            }
        }
    }

    fn resolve_all_of(
        &mut self,
        branches: &[NodeId],
        own_properties: Option<NodeId>,
        nullable: bool,
    ) -> TypeDescriptor {
        let parts: Vec<NodeId> = branches.iter().copied().chain(own_properties).collect();
        if let [single] = parts.as_slice() {
            return self.resolve(*single).or_nullable(nullable);
        }

        let mut merged = ObjectDescriptor {
            properties: Vec::new(),
            additional_properties: None,
        };
        for part in parts {
            let resolved = self.resolve(part);
            let kind_name = resolved.kind_name();
            let TypeKind::Object(object) = resolved.kind else {
                self.report(
                    RuleId::IgnoredAllOfBranch,
                    part,
                    format!("allOf branch resolves to {kind_name} and contributes no properties"),
                );
                continue;
            };
            for prop in object.properties {
                match merged.properties.iter_mut().find(|p| p.name == prop.name) {
                    Some(existing) => {
                        let required = existing.required || prop.required;
                        *existing = PropertyDescriptor { required, ..prop };
                    }
                    None => merged.properties.push(prop),
                }
            }
            if object.additional_properties.is_some() {
                merged.additional_properties = object.additional_properties;
            }
        }
        TypeDescriptor::new(TypeKind::Object(merged)).or_nullable(nullable)
    }

    fn resolve_enum(
        &mut self,
        id: NodeId,
        base: Option<PrimitiveBase>,
        values: &[Value],
        nullable: bool,
    ) -> TypeDescriptor {
        let mut nullable = nullable;
        let mut kept: Vec<Value> = Vec::new();
        let mut duplicates: Vec<String> = Vec::new();
        for value in values {
            if value.is_null() {
                nullable = true;
            } else if kept.contains(value) {
                duplicates.push(value.to_string());
            } else {
                kept.push(value.clone());
            }
        }
        if !duplicates.is_empty() {
            self.report(
                RuleId::DuplicateEnumValue,
                id,
                format!("enum lists {} more than once", duplicates.join(", ")),
            );
        }
        let base = base
            .map(base_primitive)
            .unwrap_or_else(|| infer_enum_base(&kept));
        TypeDescriptor::new(TypeKind::Enum(EnumDescriptor { base, values: kept }))
            .or_nullable(nullable)
    }

    fn report_cycle(&mut self, pos: usize) {
        let mut members: Vec<&str> = self.in_progress[pos..]
            .iter()
            .map(|(n, _)| n.as_str())
            .collect();
        let path = format!("{} -> {}", members.join(" -> "), members[0]);
        let anchor = self.in_progress[pos].1;
        members.sort_unstable();
        let key = (RuleId::ReferenceCycle, members.join(","));
        if !self.reported.insert(key) {
            return;
        }
        let diagnostic = Diagnostic::new(
            RuleId::ReferenceCycle,
            Location::pointer(self.arena.pointer(anchor)),
            format!("reference cycle {path} has no nullable or optional link"),
        );
        self.diagnostics.push(diagnostic);
    }

    /// Record a node-level finding once per rule and location.
    fn report(&mut self, rule: RuleId, id: NodeId, message: String) {
        let pointer = self.arena.pointer(id);
        if self.reported.insert((rule, pointer.to_string())) {
            self.diagnostics
                .push(Diagnostic::new(rule, Location::pointer(pointer), message));
        }
    }
}

fn discriminator_descriptor(
    discriminator: &Discriminator,
    variants: &[TypeDescriptor],
) -> DiscriminatorDescriptor {
    let mapping = if discriminator.mapping.is_empty() {
        variants
            .iter()
            .filter_map(|v| v.name.as_ref())
            .map(|name| (name.clone(), name.clone()))
            .collect()
    } else {
        discriminator
            .mapping
            .iter()
            .map(|(value, target)| {
                let name = schema_ref_name(target).unwrap_or_else(|| target.clone());
                (value.clone(), name)
            })
            .collect()
    };
    DiscriminatorDescriptor {
        property_name: discriminator.property_name.clone(),
        mapping,
    }
}

fn infer_enum_base(values: &[Value]) -> PrimitiveType {
    if values.iter().all(Value::is_string) {
        PrimitiveType::String
    } else if values.iter().all(|v| v.is_i64() || v.is_u64()) {
        PrimitiveType::Integer
    } else if values.iter().all(Value::is_number) {
        PrimitiveType::Number
    } else if values.iter().all(Value::is_boolean) {
        PrimitiveType::Boolean
    } else {
        PrimitiveType::Any
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::components::Components;

    fn arena(yaml: &str) -> SchemaArena {
        let components: Components = serde_yaml_ng::from_str(yaml).unwrap();
        SchemaArena::from_components(Some(&components))
    }

    fn resolve(yaml: &str, name: &str) -> (TypeDescriptor, Vec<Diagnostic>) {
        let arena = arena(yaml);
        let mut resolver = SchemaResolver::new(&arena, ResolveOptions::default());
        let descriptor = resolver.resolve_named(name).unwrap();
        (descriptor, resolver.into_diagnostics())
    }

    #[test]
    fn test_union_with_null_collapses() {
        let (d, diags) = resolve(
            r#"
schemas:
  Pet:
    type: object
  MaybePet:
    oneOf:
      - $ref: '#/components/schemas/Pet'
      - type: 'null'
"#,
            "MaybePet",
        );
        assert!(diags.is_empty());
        assert!(d.nullable);
        assert!(d.as_object().is_some());
    }

    #[test]
    fn test_union_of_two_stays_union() {
        let (d, _) = resolve(
            r#"
schemas:
  Cat:
    type: object
  Dog:
    type: object
  Pet:
    oneOf:
      - $ref: '#/components/schemas/Cat'
      - $ref: '#/components/schemas/Dog'
    discriminator:
      propertyName: kind
"#,
            "Pet",
        );
        let union = d.as_union().unwrap();
        assert_eq!(union.variants.len(), 2);
        assert_eq!(union.variants[0].name.as_deref(), Some("Cat"));
        let disc = union.discriminator.as_ref().unwrap();
        assert_eq!(disc.property_name, "kind");
        assert_eq!(
            disc.mapping,
            vec![
                ("Cat".to_string(), "Cat".to_string()),
                ("Dog".to_string(), "Dog".to_string())
            ]
        );
    }

    #[test]
    fn test_strict_tuple() {
        let (d, _) = resolve(
            r#"
schemas:
  Point:
    type: array
    prefixItems:
      - type: number
      - type: number
      - type: string
    items: false
"#,
            "Point",
        );
        let tuple = d.as_tuple().unwrap();
        assert_eq!(tuple.elements.len(), 3);
        assert!(tuple.is_strict);
        assert!(tuple.rest.is_none());
    }

    #[test]
    fn test_open_tuple_rest() {
        let (d, _) = resolve(
            r#"
schemas:
  Row:
    type: array
    prefixItems:
      - type: string
    items:
      type: integer
"#,
            "Row",
        );
        let tuple = d.as_tuple().unwrap();
        assert!(!tuple.is_strict);
        assert_eq!(
            tuple.rest.as_deref(),
            Some(&TypeDescriptor::primitive(PrimitiveType::Integer))
        );
    }

    #[test]
    fn test_all_of_merges_properties() {
        let (d, diags) = resolve(
            r#"
schemas:
  Base:
    type: object
    required: [id]
    properties:
      id:
        type: string
      note:
        type: string
  Extended:
    allOf:
      - $ref: '#/components/schemas/Base'
      - type: string
    required: [note]
    properties:
      note:
        type: integer
"#,
            "Extended",
        );
        let object = d.as_object().unwrap();
        let names: Vec<&str> = object.properties.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["id", "note"]);
        let note = object.property("note").unwrap();
        assert!(note.required);
        assert_eq!(
            note.descriptor,
            TypeDescriptor::primitive(PrimitiveType::Integer)
        );
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].rule, RuleId::IgnoredAllOfBranch);
    }

    #[test]
    fn test_single_all_of_collapses_to_reference() {
        let (d, _) = resolve(
            r#"
schemas:
  Base:
    type: object
  Alias:
    allOf:
      - $ref: '#/components/schemas/Base'
"#,
            "Alias",
        );
        assert_eq!(d.name.as_deref(), Some("Alias"));
        assert!(d.as_object().is_some());
    }

    #[test]
    fn test_optional_self_reference_is_breakable() {
        let (d, diags) = resolve(
            r#"
schemas:
  Node:
    type: object
    properties:
      next:
        $ref: '#/components/schemas/Node'
"#,
            "Node",
        );
        assert!(diags.is_empty());
        let next = d.as_object().unwrap().property("next").unwrap();
        assert_eq!(
            next.descriptor.kind,
            TypeKind::Recursive {
                target: "Node".to_string()
            }
        );
    }

    #[test]
    fn test_required_cycle_reported_once() {
        let yaml = r#"
schemas:
  A:
    type: object
    required: [b]
    properties:
      b:
        $ref: '#/components/schemas/B'
  B:
    type: object
    required: [a]
    properties:
      a:
        $ref: '#/components/schemas/A'
"#;
        let arena = arena(yaml);
        let mut resolver = SchemaResolver::new(&arena, ResolveOptions::default());
        let types = resolver.resolve_all();
        assert_eq!(types.len(), 2);
        let diags = resolver.into_diagnostics();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].rule, RuleId::ReferenceCycle);
        assert!(diags[0].message.contains("A -> B -> A"));
    }

    #[test]
    fn test_cycle_through_array_is_breakable() {
        let (_, diags) = resolve(
            r#"
schemas:
  Tree:
    type: object
    required: [children]
    properties:
      children:
        type: array
        items:
          $ref: '#/components/schemas/Tree'
"#,
            "Tree",
        );
        assert!(diags.is_empty());
    }

    #[test]
    fn test_unknown_format_reported() {
        let (d, diags) = resolve(
            "schemas:\n  Zip:\n    type: string\n    format: zip-code\n",
            "Zip",
        );
        assert_eq!(d.kind, TypeKind::Primitive { primitive: PrimitiveType::String });
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].rule, RuleId::UnknownFormat);

        let arena = arena("schemas:\n  Zip:\n    type: string\n    format: zip-code\n");
        let mut quiet = SchemaResolver::new(
            &arena,
            ResolveOptions {
                report_unknown_formats: false,
            },
        );
        quiet.resolve_named("Zip");
        assert!(quiet.diagnostics().is_empty());
    }

    #[test]
    fn test_enum_duplicates_and_null() {
        let (d, diags) = resolve(
            "schemas:\n  Color:\n    enum: [red, green, red, null]\n",
            "Color",
        );
        assert!(d.nullable);
        let e = d.as_enum().unwrap();
        assert_eq!(e.base, PrimitiveType::String);
        assert_eq!(e.values, vec![Value::from("red"), Value::from("green")]);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].rule, RuleId::DuplicateEnumValue);
    }

    #[test]
    fn test_const_is_single_value_enum() {
        let (d, _) = resolve("schemas:\n  Kind:\n    const: cat\n", "Kind");
        assert_eq!(d.as_enum().unwrap().values, vec![Value::from("cat")]);
    }

    #[test]
    fn test_dangling_reference_is_unknown() {
        let (d, _) = resolve(
            "schemas:\n  Holder:\n    $ref: '#/components/schemas/Missing'\n",
            "Holder",
        );
        assert!(d.is_unknown());
    }

    #[test]
    fn test_resolution_is_stable() {
        let arena = arena(
            "schemas:\n  Pet:\n    type: object\n    properties:\n      born:\n        type: string\n        format: date\n",
        );
        let mut resolver = SchemaResolver::new(&arena, ResolveOptions::default());
        let first = resolver.resolve_named("Pet");
        let second = resolver.resolve_named("Pet");
        assert_eq!(first, second);
    }
}
