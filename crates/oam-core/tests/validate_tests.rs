use oam_core::config::ValidationConfig;
use oam_core::diagnostics::{RuleId, Severity};
use oam_core::parse;
use oam_core::validate::{CATALOG, Validator};

const RATE_LIMITED: &str = include_str!("fixtures/rate_limited.yaml");
const PETSTORE: &str = include_str!("fixtures/petstore.yaml");

#[test]
fn too_many_requests_is_strict_only() {
    let spec = parse::from_yaml(RATE_LIMITED).unwrap();

    let standard = Validator::new(ValidationConfig::default()).validate(&spec);
    assert!(standard.is_empty(), "{standard:?}");

    let strict = Validator::new(ValidationConfig::strict()).validate(&spec);
    assert_eq!(strict.len(), 1, "{strict:?}");
    assert_eq!(strict[0].rule, RuleId::TooManyRequestsWithoutRateLimit);
    assert_eq!(strict[0].severity, Severity::Warning);
    assert_eq!(strict[0].location.to_string(), "GET /search");
}

#[test]
fn document_rate_limit_satisfies_every_operation() {
    let with_limit = RATE_LIMITED.replacen(
        "paths:",
        "x-rate-limit:\n  requests: 100\n  window: 1m\npaths:",
        1,
    );
    let spec = parse::from_yaml(&with_limit).unwrap();
    assert!(Validator::new(ValidationConfig::strict()).validate(&spec).is_empty());
}

#[test]
fn strict_mode_runs_the_whole_catalog() {
    let standard = Validator::new(ValidationConfig::default());
    let strict = Validator::new(ValidationConfig::strict());
    assert_eq!(strict.rules().count(), CATALOG.len());
    assert!(standard.rules().count() < CATALOG.len());
}

#[test]
fn clean_document_has_no_standard_findings() {
    let spec = parse::from_yaml(PETSTORE).unwrap();
    let diags = Validator::new(ValidationConfig::default()).validate(&spec);
    assert!(diags.is_empty(), "{diags:?}");
}
