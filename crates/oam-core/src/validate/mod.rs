//! Rule-based validation of a merged document.
//!
//! Every rule is an independent check over a [`RuleContext`]. Rules are
//! gated by mode: standard rules always run, strict-only rules run when
//! [`ValidationConfig::strict_mode`] is set.

mod extensions;
mod naming;
mod responses;
mod structure;

use crate::config::{ValidationConfig, ValidationMode};
use crate::diagnostics::{Diagnostic, RuleId, sort_diagnostics};
use crate::parse::content::{Response, ResponseOrRef};
use crate::parse::operation::{HttpMethod, Operation, PathItem};
use crate::parse::parameter::{Parameter, ParameterLocation, ParameterOrRef};
use crate::parse::schema::{Schema, SchemaOrBool, SchemaOrRef};
use crate::parse::security::SecurityRequirement;
use crate::parse::spec::OpenApiSpec;

/// When a rule runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleMode {
    Standard,
    StrictOnly,
}

pub type CheckFn = fn(&RuleContext<'_>, &mut Vec<Diagnostic>);

/// One entry of the rule catalog.
#[derive(Clone, Copy)]
pub struct Rule {
    pub id: RuleId,
    pub mode: RuleMode,
    pub check: CheckFn,
}

impl Rule {
    const fn standard(id: RuleId, check: CheckFn) -> Self {
        Self {
            id,
            mode: RuleMode::Standard,
            check,
        }
    }

    const fn strict(id: RuleId, check: CheckFn) -> Self {
        Self {
            id,
            mode: RuleMode::StrictOnly,
            check,
        }
    }

    pub fn runs_in(&self, mode: ValidationMode) -> bool {
        match self.mode {
            RuleMode::Standard => true,
            RuleMode::StrictOnly => mode == ValidationMode::Strict,
        }
    }
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule")
            .field("id", &self.id)
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

/// Every validation rule, in catalog order.
pub const CATALOG: &[Rule] = &[
    Rule::standard(RuleId::MissingOpenApiVersion, structure::missing_openapi_version),
    Rule::standard(RuleId::MissingInfo, structure::missing_info),
    Rule::standard(RuleId::MissingOperationId, structure::missing_operation_id),
    Rule::standard(RuleId::DuplicateOperationId, structure::duplicate_operation_id),
    Rule::standard(RuleId::UndeclaredPathParameter, structure::undeclared_path_parameter),
    Rule::standard(RuleId::UnusedPathParameter, structure::unused_path_parameter),
    Rule::standard(RuleId::OptionalPathParameter, structure::optional_path_parameter),
    Rule::standard(RuleId::DuplicateParameter, structure::duplicate_parameter),
    Rule::standard(RuleId::EmptyResponses, structure::empty_responses),
    Rule::standard(RuleId::UndefinedSecurityScheme, structure::undefined_security_scheme),
    Rule::strict(RuleId::MissingSuccessResponse, structure::missing_success_response),
    Rule::strict(RuleId::MissingOperationDescription, structure::missing_description),
    Rule::standard(RuleId::InvalidStatusCode, responses::invalid_status_code),
    Rule::standard(RuleId::NotFoundWithoutPathParameter, responses::not_found_without_path_parameter),
    Rule::strict(RuleId::TooManyRequestsWithoutRateLimit, responses::too_many_requests_without_rate_limit),
    Rule::standard(RuleId::UnauthorizedWithoutSecurity, responses::unauthorized_without_security),
    Rule::standard(RuleId::ForbiddenWithoutSecurity, responses::forbidden_without_security),
    Rule::strict(RuleId::NoContentWithBody, responses::no_content_with_body),
    Rule::strict(RuleId::CacheOnUnsafeMethod, extensions::cache_on_unsafe_method),
    Rule::strict(RuleId::RetryOnNonIdempotentMethod, extensions::retry_on_non_idempotent_method),
    Rule::standard(RuleId::InvalidExtension, extensions::invalid_extension),
    Rule::standard(RuleId::OperationIdCasing, naming::operation_id_casing),
    Rule::standard(RuleId::SchemaNameCasing, naming::schema_name_casing),
    Rule::strict(RuleId::PropertyNameCasing, naming::property_name_casing),
    Rule::strict(RuleId::ParameterNameCasing, naming::parameter_name_casing),
    Rule::strict(RuleId::EnumValueCasing, naming::enum_value_casing),
];

/// Runs the catalog against documents.
#[derive(Debug, Clone)]
pub struct Validator {
    config: ValidationConfig,
}

impl Validator {
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Rules that run under this validator's mode.
    pub fn rules(&self) -> impl Iterator<Item = &'static Rule> + '_ {
        let mode = self.config.mode();
        CATALOG.iter().filter(move |r| r.runs_in(mode))
    }

    pub fn validate(&self, document: &OpenApiSpec) -> Vec<Diagnostic> {
        let ctx = RuleContext {
            document,
            config: &self.config,
        };
        let mut diagnostics = Vec::new();
        for rule in self.rules() {
            let before = diagnostics.len();
            (rule.check)(&ctx, &mut diagnostics);
            debug_assert!(diagnostics[before..].iter().all(|d| d.rule == rule.id));
            log::debug!("{} produced {} finding(s)", rule.id, diagnostics.len() - before);
        }
        sort_diagnostics(&mut diagnostics);
        diagnostics
    }
}

/// An operation together with where it lives.
#[derive(Debug, Clone, Copy)]
pub struct OperationView<'a> {
    pub path: &'a str,
    pub method: HttpMethod,
    pub item: &'a PathItem,
    pub operation: &'a Operation,
}

/// Read-only input shared by every rule.
pub struct RuleContext<'a> {
    pub document: &'a OpenApiSpec,
    pub config: &'a ValidationConfig,
}

impl<'a> RuleContext<'a> {
    /// Operations subject to operation-level rules.
    pub fn operations(&self) -> impl Iterator<Item = OperationView<'a>> + '_ {
        let include_deprecated = self.config.include_deprecated;
        self.document
            .paths
            .iter()
            .flat_map(|(path, item)| {
                item.operations().map(move |(method, operation)| OperationView {
                    path: path.as_str(),
                    method,
                    item,
                    operation,
                })
            })
            .filter(move |view| include_deprecated || !view.operation.is_deprecated())
    }

    pub fn parameter(&self, item: &'a ParameterOrRef) -> Option<&'a Parameter> {
        match item {
            ParameterOrRef::Parameter(p) => Some(p),
            ParameterOrRef::Ref { .. } => self.document.components.as_ref()?.parameter(item),
        }
    }

    pub fn effective_parameters(&self, view: &OperationView<'a>) -> Vec<&'a Parameter> {
        view.item
            .effective_parameters(view.operation, self.document.components.as_ref())
    }

    pub fn response(&self, operation: &'a Operation, status: &str) -> Option<&'a Response> {
        let item = operation.responses.get(status)?;
        match item {
            ResponseOrRef::Response(r) => Some(r),
            ResponseOrRef::Ref { .. } => {
                self.document.components.as_ref()?.response(item)
            }
        }
    }

    /// Security requirements in force for an operation.
    pub fn effective_security(&self, operation: &'a Operation) -> &'a [SecurityRequirement] {
        operation
            .security
            .as_deref()
            .or(self.document.security.as_deref())
            .unwrap_or_default()
    }

    /// Every schema reachable inline from the component schemas, with the
    /// owning component name and the dotted property path leading to it.
    pub fn component_schemas(&self) -> Vec<SchemaSite<'a>> {
        let mut sites = Vec::new();
        if let Some(components) = &self.document.components {
            for (name, schema) in &components.schemas {
                collect_sites(name, String::new(), schema, &mut sites);
            }
        }
        sites
    }
}

/// An inline schema and where it sits below a component.
#[derive(Debug, Clone)]
pub struct SchemaSite<'a> {
    pub component: &'a str,
    /// Dotted property path from the component, empty at its root.
    pub path: String,
    pub schema: &'a Schema,
}

fn collect_sites<'a>(
    component: &'a str,
    path: String,
    schema: &'a SchemaOrRef,
    sites: &mut Vec<SchemaSite<'a>>,
) {
    let SchemaOrRef::Schema(schema) = schema else {
        return;
    };
    for (name, prop) in &schema.properties {
        let child = if path.is_empty() {
            name.clone()
        } else {
            format!("{path}.{name}")
        };
        collect_sites(component, child, prop, sites);
    }
    let nested = schema
        .all_of
        .iter()
        .chain(&schema.one_of)
        .chain(&schema.any_of)
        .chain(&schema.prefix_items)
        .chain(schema.items.as_ref().and_then(SchemaOrBool::as_schema))
        .chain(
            schema
                .additional_properties
                .as_ref()
                .and_then(SchemaOrBool::as_schema),
        );
    for sub in nested {
        collect_sites(component, path.clone(), sub, sites);
    }
    sites.push(SchemaSite {
        component,
        path,
        schema,
    });
}

/// Names inside `{}` in a path template.
pub fn template_parameters(path: &str) -> Vec<&str> {
    let mut names = Vec::new();
    let mut rest = path;
    while let Some(start) = rest.find('{') {
        let Some(len) = rest[start..].find('}') else {
            break;
        };
        names.push(&rest[start + 1..start + len]);
        rest = &rest[start + len + 1..];
    }
    names
}

pub(crate) fn is_path_parameter(param: &Parameter) -> bool {
    param.location == ParameterLocation::Path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Severity;
    use crate::parse::{SourceFormat, fragment};

    fn validate(yaml: &str, config: ValidationConfig) -> Vec<Diagnostic> {
        let doc = fragment(yaml, SourceFormat::Yaml).unwrap();
        Validator::new(config).validate(&doc)
    }

    fn codes(diagnostics: &[Diagnostic]) -> Vec<&'static str> {
        diagnostics.iter().map(|d| d.rule.code()).collect()
    }

    const CLEAN: &str = r#"
openapi: 3.1.0
info:
  title: Pets
  version: 1.0.0
paths:
  /pets/{petId}:
    get:
      operationId: getPet
      summary: Fetch a pet
      parameters:
        - name: petId
          in: path
          required: true
          schema:
            type: string
      responses:
        "200":
          description: ok
"#;

    #[test]
    fn test_clean_document_passes_strict() {
        assert!(validate(CLEAN, ValidationConfig::strict()).is_empty());
    }

    #[test]
    fn test_catalog_ids_are_unique_and_validation_only() {
        let mut ids: Vec<RuleId> = CATALOG.iter().map(|r| r.id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), CATALOG.len());
        assert!(
            CATALOG
                .iter()
                .all(|r| !r.id.code().starts_with("MRG") && !r.id.code().starts_with("TYP"))
        );
    }

    #[test]
    fn test_strict_is_superset_of_standard() {
        let standard = Validator::new(ValidationConfig::default());
        let strict = Validator::new(ValidationConfig::strict());
        let strict_ids: Vec<RuleId> = strict.rules().map(|r| r.id).collect();
        assert!(standard.rules().all(|r| strict_ids.contains(&r.id)));
        assert!(strict_ids.len() > standard.rules().count());
    }

    #[test]
    fn test_output_is_sorted() {
        let diags = validate(
            r#"
paths:
  /b:
    get:
      responses: {}
  /a:
    get:
      responses: {}
"#,
            ValidationConfig::default(),
        );
        assert_eq!(
            codes(&diags),
            vec!["STR001", "STR002", "STR003", "STR003", "STR009", "STR009"]
        );
        assert_eq!(diags[2].location.to_string(), "GET /a");
        assert_eq!(diags[0].severity, Severity::Error);
    }

    #[test]
    fn test_deprecated_operations_can_be_skipped() {
        let yaml = r#"
openapi: 3.1.0
info:
  title: Pets
  version: 1.0.0
paths:
  /old:
    get:
      deprecated: true
      responses:
        "200":
          description: ok
"#;
        assert_eq!(codes(&validate(yaml, ValidationConfig::default())), vec!["STR003"]);
        let config = ValidationConfig {
            include_deprecated: false,
            ..ValidationConfig::default()
        };
        assert!(validate(yaml, config).is_empty());
    }

    #[test]
    fn test_template_parameters() {
        assert_eq!(
            template_parameters("/users/{userId}/posts/{postId}"),
            vec!["userId", "postId"]
        );
        assert!(template_parameters("/users").is_empty());
        assert!(template_parameters("/broken/{oops").is_empty());
    }
}
