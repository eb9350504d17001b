use oam_core::config::ResolveOptions;
use oam_core::ir::{PrimitiveType, SchemaArena, TypeKind};
use oam_core::parse;
use oam_core::transform::SchemaResolver;

const SHAPES: &str = include_str!("fixtures/shapes.yaml");
const PETSTORE: &str = include_str!("fixtures/petstore.yaml");

#[test]
fn three_positional_items_make_a_strict_tuple() {
    let spec = parse::from_yaml(SHAPES).unwrap();
    let arena = SchemaArena::from_components(spec.components.as_ref());
    let mut resolver = SchemaResolver::new(&arena, ResolveOptions::default());

    let point = resolver.resolve_named("Point").unwrap();
    let tuple = point.as_tuple().expect("Point should be a tuple");
    assert_eq!(tuple.elements.len(), 3);
    assert!(tuple.is_strict);
    assert_eq!(
        tuple.elements[0].kind,
        TypeKind::Primitive {
            primitive: PrimitiveType::Double
        }
    );
    assert!(resolver.diagnostics().is_empty());
}

#[test]
fn optional_back_references_resolve_without_findings() {
    let spec = parse::from_yaml(PETSTORE).unwrap();
    let arena = SchemaArena::from_components(spec.components.as_ref());
    let mut resolver = SchemaResolver::new(&arena, ResolveOptions::default());
    let types = resolver.resolve_all();

    let names: Vec<&str> = types.keys().map(String::as_str).collect();
    assert_eq!(names, ["Pet", "Owner"]);

    let pet = types["Pet"].as_object().unwrap();
    assert!(pet.property("id").unwrap().required);
    let owner = &pet.property("owner").unwrap().descriptor;
    assert_eq!(owner.name.as_deref(), Some("Owner"));
    assert!(resolver.into_diagnostics().is_empty());
}

#[test]
fn single_branch_union_matches_its_target() {
    let yaml = r#"
openapi: 3.1.0
info: {title: t, version: '1'}
paths: {}
components:
  schemas:
    Target:
      type: object
      properties:
        label: {type: string}
    Wrapper:
      anyOf:
        - $ref: '#/components/schemas/Target'
"#;
    let spec = parse::from_yaml(yaml).unwrap();
    let arena = SchemaArena::from_components(spec.components.as_ref());
    let mut resolver = SchemaResolver::new(&arena, ResolveOptions::default());
    let direct = resolver.resolve_named("Target").unwrap();
    let wrapped = resolver.resolve_named("Wrapper").unwrap();
    assert_eq!(wrapped.kind, direct.kind);
    assert_eq!(wrapped.nullable, direct.nullable);
}
