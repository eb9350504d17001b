//! End-to-end analysis: raw text in, merged document plus derived
//! artifacts and diagnostics out.

use indexmap::IndexMap;

use crate::config::OamConfig;
use crate::conflict::{ConflictSet, ReservedIdentifiers};
use crate::diagnostics::{Diagnostic, has_errors, sort_diagnostics};
use crate::error::PipelineError;
use crate::ir::{
    BodyDescriptor, NodeId, OperationDescriptor, ParameterDescriptor, ResponseDescriptor,
    SchemaArena, TypeDescriptor,
};
use crate::merge::{MergeResult, SourceDocument, merge};
use crate::parse::components::Components;
use crate::parse::content::preferred_media;
use crate::parse::operation::{HttpMethod, Operation, PathItem};
use crate::parse::parameter::ParameterLocation;
use crate::parse::ref_resolve::encode_pointer_segment;
use crate::parse::spec::OpenApiSpec;
use crate::parse::{SourceFormat, fragment};
use crate::validate::Validator;

use super::name_normalizer::{normalize_name, route_to_name};
use super::schema_resolver::SchemaResolver;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceRole {
    Base,
    Part,
}

/// One input file as read by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub name: String,
    pub role: SourceRole,
    pub content: String,
}

impl SourceFile {
    pub fn base(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role: SourceRole::Base,
            content: content.into(),
        }
    }

    pub fn part(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role: SourceRole::Part,
            content: content.into(),
        }
    }
}

/// Everything derived from one set of inputs.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub merge: MergeResult,
    /// Resolved component schemas in declaration order.
    pub types: IndexMap<String, TypeDescriptor>,
    pub operations: Vec<OperationDescriptor>,
    pub conflicts: ConflictSet,
    /// Merge, resolution and validation findings, sorted.
    pub diagnostics: Vec<Diagnostic>,
}

impl Analysis {
    pub fn document(&self) -> &OpenApiSpec {
        &self.merge.document
    }

    pub fn has_errors(&self) -> bool {
        has_errors(&self.diagnostics)
    }
}

/// Parse one input. Headers are optional here so that missing ones surface
/// as validation findings rather than hard failures.
pub fn parse_source(file: &SourceFile) -> Result<SourceDocument, PipelineError> {
    let format = SourceFormat::detect(&file.name, &file.content);
    let spec = fragment(&file.content, format).map_err(|source| PipelineError::Parse {
        file: file.name.clone(),
        source,
    })?;
    Ok(SourceDocument::new(file.name.clone(), spec))
}

/// Run merge, conflict detection, type resolution and validation.
pub fn analyze(sources: &[SourceFile], config: &OamConfig) -> Result<Analysis, PipelineError> {
    let mut base: Option<SourceDocument> = None;
    let mut parts = Vec::new();
    for file in sources {
        let doc = parse_source(file)?;
        match (file.role, &base) {
            (SourceRole::Base, Some(existing)) => {
                return Err(PipelineError::MultipleBases(
                    existing.name.clone(),
                    doc.name,
                ));
            }
            (SourceRole::Base, None) => base = Some(doc),
            (SourceRole::Part, _) => parts.push(doc),
        }
    }
    let base = base.ok_or(PipelineError::MissingBase)?;

    let merged = merge(&base, &parts, config.merge.strategy);
    log::info!(
        "merged {} file(s): {} path(s), {} operation(s), {} schema(s)",
        merged.counts.files,
        merged.counts.paths,
        merged.counts.operations,
        merged.counts.schemas
    );
    let document = &merged.document;

    let reserved = ReservedIdentifiers::with_extra(config.reserved_names.iter().cloned());
    let conflicts = ConflictSet::scan(document, config.namespace.as_deref(), &reserved);
    log::info!("{} schema name conflict(s)", conflicts.conflicts().len());

    let mut arena = SchemaArena::from_components(document.components.as_ref());
    let mut plans = Vec::new();
    for (path, item) in &document.paths {
        for (method, op) in item.operations() {
            plans.push(plan_operation(document, item, &mut arena, path, method, op));
        }
    }

    let mut resolver = SchemaResolver::new(&arena, config.resolve);
    let types = resolver.resolve_all();
    let operations: Vec<OperationDescriptor> = plans
        .into_iter()
        .map(|plan| plan.resolve(&mut resolver))
        .collect();
    log::info!(
        "resolved {} type(s) and {} operation(s)",
        types.len(),
        operations.len()
    );

    let mut diagnostics = merged.diagnostics.clone();
    diagnostics.extend(resolver.into_diagnostics());
    diagnostics.extend(Validator::new(config.validation.clone()).validate(document));
    sort_diagnostics(&mut diagnostics);
    log::info!("{} diagnostic(s)", diagnostics.len());

    Ok(Analysis {
        merge: merged,
        types,
        operations,
        conflicts,
        diagnostics,
    })
}

/// An operation whose inline schemas have been lowered but not resolved.
struct OperationPlan {
    name: String,
    method: HttpMethod,
    path: String,
    tags: Vec<String>,
    deprecated: bool,
    parameters: Vec<(String, ParameterLocation, bool, Option<NodeId>)>,
    body: Option<(String, bool, Option<NodeId>)>,
    responses: Vec<(String, Option<String>, Option<NodeId>)>,
}

impl OperationPlan {
    fn resolve(self, resolver: &mut SchemaResolver<'_>) -> OperationDescriptor {
        let mut descriptor_of = |node: Option<NodeId>| match node {
            Some(id) => resolver.resolve(id),
            None => TypeDescriptor::any(),
        };
        let parameters = self
            .parameters
            .into_iter()
            .map(|(name, location, required, node)| ParameterDescriptor {
                name,
                location,
                required,
                descriptor: descriptor_of(node),
            })
            .collect();
        let request_body = self
            .body
            .map(|(content_type, required, node)| BodyDescriptor {
                content_type,
                required,
                descriptor: descriptor_of(node),
            });
        let responses = self
            .responses
            .into_iter()
            .map(|(status, content_type, node)| ResponseDescriptor {
                descriptor: content_type.as_ref().map(|_| descriptor_of(node)),
                status,
                content_type,
            })
            .collect();
        OperationDescriptor {
            name: normalize_name(&self.name),
            method: self.method,
            path: self.path,
            tags: self.tags,
            parameters,
            request_body,
            responses,
            deprecated: self.deprecated,
        }
    }
}

fn plan_operation(
    document: &OpenApiSpec,
    item: &PathItem,
    arena: &mut SchemaArena,
    path: &str,
    method: HttpMethod,
    op: &Operation,
) -> OperationPlan {
    let base = format!("#/paths/{}/{}", encode_pointer_segment(path), method.key());
    let none = Components::default();
    let components = document.components.as_ref().unwrap_or(&none);

    let parameters = item
        .effective_parameters(op, Some(components))
        .into_iter()
        .enumerate()
        .map(|(i, param)| {
            let node = param
                .schema
                .as_ref()
                .map(|s| arena.lower(s, format!("{base}/parameters/{i}/schema")));
            (param.name.clone(), param.location, param.required, node)
        })
        .collect();

    let body = op
        .request_body
        .as_ref()
        .and_then(|b| components.request_body(b))
        .and_then(|body| {
            let (content_type, media) = preferred_media(&body.content)?;
            let pointer = format!(
                "{base}/requestBody/content/{}/schema",
                encode_pointer_segment(content_type)
            );
            let node = media.schema.as_ref().map(|s| arena.lower(s, pointer));
            Some((content_type.to_string(), body.required, node))
        });

    let responses = op
        .responses
        .iter()
        .map(|(status, item)| {
            let media = components
                .response(item)
                .and_then(|r| preferred_media(&r.content));
            match media {
                Some((content_type, media)) => {
                    let pointer = format!(
                        "{base}/responses/{}/content/{}/schema",
                        encode_pointer_segment(status),
                        encode_pointer_segment(content_type)
                    );
                    let node = media.schema.as_ref().map(|s| arena.lower(s, pointer));
                    (status.clone(), Some(content_type.to_string()), node)
                }
                None => (status.clone(), None, None),
            }
        })
        .collect();

    OperationPlan {
        name: op
            .operation_id
            .clone()
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| route_to_name(method, path)),
        method,
        path: path.to_string(),
        tags: op.tags.clone(),
        deprecated: op.is_deprecated(),
        parameters,
        body,
        responses,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::RuleId;
    use crate::ir::{PrimitiveType, TypeKind};

    const BASE: &str = r#"
openapi: 3.1.0
info: {title: Shop, version: '1.0'}
paths:
  /orders/{orderId}:
    parameters:
      - {name: orderId, in: path, required: true, schema: {type: string, format: uuid}}
    get:
      operationId: getOrder
      summary: fetch an order
      responses:
        '200':
          description: ok
          content:
            application/xml: {schema: {type: string}}
            application/json: {schema: {$ref: '#/components/schemas/Order'}}
        '404': {description: missing}
components:
  schemas:
    Order:
      type: object
      required: [id]
      properties:
        id: {type: string, format: uuid}
"#;

    const PART: &str = r#"
paths:
  /orders:
    post:
      summary: place an order
      requestBody:
        required: true
        content:
          application/json:
            schema:
              type: object
              properties:
                quantity: {type: integer, format: int32}
      responses:
        '201': {description: created}
"#;

    #[test]
    fn test_analyze_builds_operations() {
        let sources = [
            SourceFile::base("shop.yaml", BASE),
            SourceFile::part("shop_orders.yaml", PART),
        ];
        let analysis = analyze(&sources, &OamConfig::default()).unwrap();
        assert_eq!(analysis.merge.counts.operations, 2);
        assert!(analysis.types.contains_key("Order"));

        let get = &analysis.operations[0];
        assert_eq!(get.name.original, "getOrder");
        assert_eq!(get.parameters.len(), 1);
        assert_eq!(
            get.parameters[0].descriptor.kind,
            TypeKind::Primitive {
                primitive: PrimitiveType::Uuid
            }
        );
        let ok = &get.responses[0];
        assert_eq!(ok.content_type.as_deref(), Some("application/json"));
        assert_eq!(
            ok.descriptor.as_ref().and_then(|d| d.name.as_deref()),
            Some("Order")
        );
        assert!(get.responses[1].descriptor.is_none());

        let post = &analysis.operations[1];
        assert_eq!(post.name.original, "createOrders");
        let body = post.request_body.as_ref().unwrap();
        assert!(body.required);
        assert!(body.descriptor.as_object().unwrap().property("quantity").is_some());

        let rules: Vec<RuleId> = analysis.diagnostics.iter().map(|d| d.rule).collect();
        assert_eq!(rules, vec![RuleId::MissingOperationId]);
        assert!(!analysis.has_errors());
    }

    #[test]
    fn test_base_is_required_and_unique() {
        let parts = [SourceFile::part("a_x.yaml", PART)];
        assert!(matches!(
            analyze(&parts, &OamConfig::default()),
            Err(PipelineError::MissingBase)
        ));

        let bases = [
            SourceFile::base("a.yaml", BASE),
            SourceFile::base("b.yaml", BASE),
        ];
        assert!(matches!(
            analyze(&bases, &OamConfig::default()),
            Err(PipelineError::MultipleBases(first, second)) if first == "a.yaml" && second == "b.yaml"
        ));
    }

    #[test]
    fn test_parse_failure_names_the_file() {
        let sources = [
            SourceFile::base("shop.yaml", BASE),
            SourceFile::part("shop_bad.json", "{ not json"),
        ];
        let err = analyze(&sources, &OamConfig::default()).unwrap_err();
        assert!(matches!(&err, PipelineError::Parse { file, .. } if file == "shop_bad.json"));
        assert!(err.to_string().contains("shop_bad.json"));
    }

    #[test]
    fn test_malformed_extension_is_a_finding() {
        let base = "openapi: 3.1.0\ninfo: {title: t, version: '1'}\nx-rate-limit: 100\npaths: {}\n";
        let sources = [SourceFile::base("api.yaml", base)];
        let analysis = analyze(&sources, &OamConfig::default()).unwrap();
        let rules: Vec<RuleId> = analysis.diagnostics.iter().map(|d| d.rule).collect();
        assert_eq!(rules, vec![RuleId::InvalidExtension]);
        assert!(analysis.has_errors());
    }

    #[test]
    fn test_missing_headers_are_reported_not_fatal() {
        let sources = [SourceFile::base("api.yaml", "paths: {}\n")];
        let analysis = analyze(&sources, &OamConfig::default()).unwrap();
        let rules: Vec<RuleId> = analysis.diagnostics.iter().map(|d| d.rule).collect();
        assert_eq!(
            rules,
            vec![RuleId::MissingOpenApiVersion, RuleId::MissingInfo]
        );
        assert!(analysis.has_errors());
    }
}
