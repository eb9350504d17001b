use oam_core::diagnostics::{RuleId, Severity};
use oam_core::merge::{MergeResult, MergeStrategy, SourceDocument, discover_parts, merge};
use oam_core::parse::{self, SourceFormat};

const PETSTORE: &str = include_str!("fixtures/petstore.yaml");
const PETSTORE_USERS: &str = include_str!("fixtures/petstore_users.yaml");
const SHAPES: &str = include_str!("fixtures/shapes.yaml");
const SHAPES_POLYGONS: &str = include_str!("fixtures/shapes_polygons.yaml");
const SHAPES_SOLIDS: &str = include_str!("fixtures/shapes_solids.yaml");

fn load(name: &str, content: &str) -> SourceDocument {
    let spec = parse::fragment(content, SourceFormat::detect(name, content)).unwrap();
    SourceDocument::new(name, spec)
}

/// A copy of a full document used as a part, so without its header.
fn load_part(name: &str, content: &str) -> SourceDocument {
    let mut doc = load(name, content);
    doc.spec.openapi = None;
    doc.spec.info = None;
    doc
}

fn shape_property_count(strategy: MergeStrategy) -> Option<usize> {
    let result = merge(
        &load("shapes.yaml", SHAPES),
        &[load("shapes_polygons.yaml", SHAPES_POLYGONS)],
        strategy,
    );
    shape_properties(&result)
}

fn shape_properties(result: &MergeResult) -> Option<usize> {
    let schemas = &result.document.components.as_ref()?.schemas;
    let shape = schemas.get("Shape")?;
    match shape {
        oam_core::parse::schema::SchemaOrRef::Schema(s) => Some(s.properties.len()),
        oam_core::parse::schema::SchemaOrRef::Ref { .. } => None,
    }
}

#[test]
fn simple_merge_has_no_findings() {
    let result = merge(
        &load("petstore.yaml", PETSTORE),
        &[load("petstore_users.yaml", PETSTORE_USERS)],
        MergeStrategy::default(),
    );
    assert!(result.is_success());
    assert!(result.diagnostics.is_empty());
    assert_eq!(result.counts.files, 2);
    assert_eq!(result.counts.paths, 2);
    assert_eq!(result.counts.operations, 2);
    assert_eq!(result.counts.schemas, 3);

    let tags: Vec<&str> = result.document.tags.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(tags, ["pets", "users"]);
}

#[test]
fn cross_file_reference_is_localized() {
    let result = merge(
        &load("petstore.yaml", PETSTORE),
        &[load("petstore_users.yaml", PETSTORE_USERS)],
        MergeStrategy::default(),
    );
    let merged = serde_json::to_string(&result.document).unwrap();
    assert!(!merged.contains("petstore.yaml#"));
    assert!(merged.contains("#/components/schemas/Pet"));
}

#[test]
fn merge_is_deterministic() {
    let run = || {
        merge(
            &load("petstore.yaml", PETSTORE),
            &[load("petstore_users.yaml", PETSTORE_USERS)],
            MergeStrategy::AppendUnique,
        )
    };
    let first = run();
    let second = run();
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first.document).unwrap(),
        serde_json::to_string(&second.document).unwrap()
    );
}

#[test]
fn error_on_duplicate_excludes_schema() {
    let result = merge(
        &load("shapes.yaml", SHAPES),
        &[load("shapes_polygons.yaml", SHAPES_POLYGONS)],
        MergeStrategy::ErrorOnDuplicate,
    );
    assert!(!result.is_success());
    let duplicate = result
        .diagnostics
        .iter()
        .find(|d| d.rule == RuleId::DuplicateSchema)
        .unwrap();
    assert_eq!(duplicate.severity, Severity::Error);
    assert_eq!(duplicate.file.as_deref(), Some("shapes_polygons.yaml"));
    assert_eq!(shape_property_count(MergeStrategy::ErrorOnDuplicate), None);
}

#[test]
fn winner_strategies_pick_one_definition() {
    assert_eq!(shape_property_count(MergeStrategy::FirstWins), Some(1));
    assert_eq!(shape_property_count(MergeStrategy::LastWins), Some(2));
}

#[test]
fn merge_if_identical_rejects_differing_bodies() {
    let result = merge(
        &load("shapes.yaml", SHAPES),
        &[load("shapes_polygons.yaml", SHAPES_POLYGONS)],
        MergeStrategy::MergeIfIdentical,
    );
    assert!(
        result
            .diagnostics
            .iter()
            .any(|d| d.rule == RuleId::DuplicateSchema)
    );

    let again = merge(
        &load("shapes.yaml", SHAPES),
        &[load_part("shapes_copy.yaml", SHAPES)],
        MergeStrategy::MergeIfIdentical,
    );
    assert!(again.diagnostics.is_empty());
    assert_eq!(again.counts.schemas, 2);
}

#[test]
fn three_inputs_last_wins_takes_the_final_definition() {
    let result = merge(
        &load("shapes.yaml", SHAPES),
        &[
            load("shapes_polygons.yaml", SHAPES_POLYGONS),
            load("shapes_solids.yaml", SHAPES_SOLIDS),
        ],
        MergeStrategy::LastWins,
    );
    assert!(result.diagnostics.is_empty());
    assert_eq!(shape_properties(&result), Some(3));

    let names: Vec<&str> = result
        .document
        .components
        .as_ref()
        .unwrap()
        .schemas
        .keys()
        .map(String::as_str)
        .collect();
    assert_eq!(names, ["Point", "Shape", "Polygon"]);
}

#[test]
fn three_inputs_merge_if_identical_compares_with_the_first() {
    let all_same = merge(
        &load("shapes.yaml", SHAPES),
        &[
            load_part("shapes_a.yaml", SHAPES),
            load_part("shapes_b.yaml", SHAPES),
        ],
        MergeStrategy::MergeIfIdentical,
    );
    assert!(all_same.diagnostics.is_empty());
    assert_eq!(shape_properties(&all_same), Some(1));

    let last_differs = merge(
        &load("shapes.yaml", SHAPES),
        &[
            load_part("shapes_a.yaml", SHAPES),
            load("shapes_solids.yaml", SHAPES_SOLIDS),
        ],
        MergeStrategy::MergeIfIdentical,
    );
    assert_eq!(last_differs.diagnostics.len(), 1);
    let d = &last_differs.diagnostics[0];
    assert_eq!(d.rule, RuleId::DuplicateSchema);
    assert_eq!(d.file.as_deref(), Some("shapes_solids.yaml"));
    assert!(d.message.contains("shapes.yaml and shapes_solids.yaml differ"));
    assert_eq!(shape_properties(&last_differs), None);
}

#[test]
fn discovery_matches_sibling_parts() {
    let files = [
        "specs/petstore_users.yaml",
        "specs/petstore.yaml",
        "specs/petstore_admin.yaml",
        "specs/petstore_users.json",
        "specs/petstores.yaml",
        "specs/petstore_.yaml",
    ];
    assert_eq!(
        discover_parts("specs/petstore.yaml", &files),
        vec!["specs/petstore_admin.yaml", "specs/petstore_users.yaml"]
    );
}
