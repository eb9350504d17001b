use std::collections::HashSet;

use indexmap::IndexMap;
use serde_json::Value;

use super::components::Components;
use super::content::{MediaType, RequestBodyOrRef, ResponseOrRef};
use super::operation::{Operation, PathItem};
use super::parameter::ParameterOrRef;
use super::schema::{Schema, SchemaOrBool, SchemaOrRef};
use super::spec::OpenApiSpec;
use crate::diagnostics::{Diagnostic, Location, RuleId};
use crate::error::ResolveError;

/// Component section a `$ref` may point into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentSection {
    Schemas,
    Responses,
    Parameters,
    RequestBodies,
    SecuritySchemes,
    Headers,
    Examples,
    Links,
    Callbacks,
    PathItems,
}

impl ComponentSection {
    pub const ALL: [ComponentSection; 10] = [
        ComponentSection::Schemas,
        ComponentSection::Responses,
        ComponentSection::Parameters,
        ComponentSection::RequestBodies,
        ComponentSection::SecuritySchemes,
        ComponentSection::Headers,
        ComponentSection::Examples,
        ComponentSection::Links,
        ComponentSection::Callbacks,
        ComponentSection::PathItems,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            ComponentSection::Schemas => "schemas",
            ComponentSection::Responses => "responses",
            ComponentSection::Parameters => "parameters",
            ComponentSection::RequestBodies => "requestBodies",
            ComponentSection::SecuritySchemes => "securitySchemes",
            ComponentSection::Headers => "headers",
            ComponentSection::Examples => "examples",
            ComponentSection::Links => "links",
            ComponentSection::Callbacks => "callbacks",
            ComponentSection::PathItems => "pathItems",
        }
    }

    fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|section| section.key() == key)
    }
}

/// A parsed `$ref` such as `pets.yaml#/components/schemas/Pet`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentRef {
    /// Document part before `#`, `None` for local references.
    pub document: Option<String>,
    pub section: ComponentSection,
    pub name: String,
}

impl ComponentRef {
    /// The same target as a local pointer.
    pub fn local_pointer(&self) -> String {
        format!(
            "#/components/{}/{}",
            self.section.key(),
            encode_pointer_segment(&self.name)
        )
    }
}

/// Parse a `$ref` pointing into `components`.
pub fn parse_ref(ref_path: &str) -> Result<ComponentRef, ResolveError> {
    let (document, fragment) = match ref_path.split_once('#') {
        Some(("", fragment)) => (None, fragment),
        Some((doc, fragment)) => (Some(doc.to_string()), fragment),
        None => return Err(ResolveError::InvalidRefFormat(ref_path.to_string())),
    };
    let stripped = fragment
        .strip_prefix("/components/")
        .ok_or_else(|| ResolveError::UnsupportedRef(ref_path.to_string()))?;
    let (section, name) = stripped
        .split_once('/')
        .ok_or_else(|| ResolveError::InvalidRefFormat(ref_path.to_string()))?;
    let section = ComponentSection::from_key(section)
        .ok_or_else(|| ResolveError::UnsupportedRef(ref_path.to_string()))?;
    if name.is_empty() || name.contains('/') {
        return Err(ResolveError::InvalidRefFormat(ref_path.to_string()));
    }
    Ok(ComponentRef {
        document,
        section,
        name: decode_pointer_segment(name),
    })
}

/// Name of the schema a `$ref` points to, if it is a schema reference.
pub fn schema_ref_name(ref_path: &str) -> Option<String> {
    parse_ref(ref_path)
        .ok()
        .filter(|r| r.section == ComponentSection::Schemas)
        .map(|r| r.name)
}

pub fn decode_pointer_segment(segment: &str) -> String {
    segment.replace("~1", "/").replace("~0", "~")
}

pub fn encode_pointer_segment(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

/// Top-level entry a `$ref` occurrence lives under.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RefRoot {
    Path(String),
    Webhook(String),
    Component(ComponentSection, String),
}

/// Walks every `$ref` in a document, handing each one to a visitor together
/// with the section it must point into and a JSON pointer to where it sits.
///
/// References inside untyped values (examples, headers, links, callbacks and
/// unmodeled schema keywords) are visited with no expected section.
pub struct RefWalker<F> {
    visit: F,
}

impl<F> RefWalker<F>
where
    F: FnMut(&mut String, Option<ComponentSection>, &RefRoot, &str),
{
    pub fn new(visit: F) -> Self {
        Self { visit }
    }

    pub fn walk_spec(&mut self, spec: &mut OpenApiSpec) {
        for (path, item) in &mut spec.paths {
            let root = RefRoot::Path(path.clone());
            let pointer = format!("#/paths/{}", encode_pointer_segment(path));
            self.walk_path_item(item, &root, &pointer);
        }
        for (name, item) in &mut spec.webhooks {
            let root = RefRoot::Webhook(name.clone());
            let pointer = format!("#/webhooks/{}", encode_pointer_segment(name));
            self.walk_path_item(item, &root, &pointer);
        }
        if let Some(ref mut components) = spec.components {
            self.walk_components(components);
        }
    }

    fn walk_components(&mut self, components: &mut Components) {
        for (name, schema) in &mut components.schemas {
            let root = RefRoot::Component(ComponentSection::Schemas, name.clone());
            let pointer = format!("#/components/schemas/{}", encode_pointer_segment(name));
            self.walk_schema_or_ref(schema, &root, &pointer);
        }
        for (name, response) in &mut components.responses {
            let root = RefRoot::Component(ComponentSection::Responses, name.clone());
            let pointer = format!("#/components/responses/{}", encode_pointer_segment(name));
            self.walk_response_or_ref(response, &root, &pointer);
        }
        for (name, param) in &mut components.parameters {
            let root = RefRoot::Component(ComponentSection::Parameters, name.clone());
            let pointer = format!("#/components/parameters/{}", encode_pointer_segment(name));
            self.walk_parameter_or_ref(param, &root, &pointer);
        }
        for (name, body) in &mut components.request_bodies {
            let root = RefRoot::Component(ComponentSection::RequestBodies, name.clone());
            let pointer = format!(
                "#/components/requestBodies/{}",
                encode_pointer_segment(name)
            );
            self.walk_request_body_or_ref(body, &root, &pointer);
        }
        let untyped = [
            (ComponentSection::Headers, &mut components.headers),
            (ComponentSection::Examples, &mut components.examples),
            (ComponentSection::Links, &mut components.links),
            (ComponentSection::Callbacks, &mut components.callbacks),
            (ComponentSection::PathItems, &mut components.path_items),
        ];
        for (section, entries) in untyped {
            for (name, value) in entries.iter_mut() {
                let root = RefRoot::Component(section, name.clone());
                let pointer = format!(
                    "#/components/{}/{}",
                    section.key(),
                    encode_pointer_segment(name)
                );
                self.walk_value(value, &root, &pointer);
            }
        }
    }

    /// Visit every `{"$ref": "..."}` object inside an untyped value.
    fn walk_value(&mut self, value: &mut Value, root: &RefRoot, pointer: &str) {
        match value {
            Value::Object(map) => {
                for (key, child) in map.iter_mut() {
                    let child_pointer = format!("{pointer}/{}", encode_pointer_segment(key));
                    if key == "$ref" {
                        if let Value::String(ref_path) = child {
                            (self.visit)(ref_path, None, root, &child_pointer);
                            continue;
                        }
                    }
                    self.walk_value(child, root, &child_pointer);
                }
            }
            Value::Array(items) => {
                for (i, item) in items.iter_mut().enumerate() {
                    self.walk_value(item, root, &format!("{pointer}/{i}"));
                }
            }
            _ => {}
        }
    }

    fn walk_extra(
        &mut self,
        extra: &mut IndexMap<String, Value>,
        root: &RefRoot,
        pointer: &str,
    ) {
        for (key, value) in extra.iter_mut() {
            self.walk_value(value, root, &format!("{pointer}/{}", encode_pointer_segment(key)));
        }
    }

    fn walk_path_item(&mut self, item: &mut PathItem, root: &RefRoot, pointer: &str) {
        for (i, p) in item.parameters.iter_mut().enumerate() {
            self.walk_parameter_or_ref(p, root, &format!("{pointer}/parameters/{i}"));
        }
        for (method, op) in item.operations_mut() {
            self.walk_operation(op, root, &format!("{pointer}/{}", method.key()));
        }
        self.walk_extra(&mut item.extra, root, pointer);
    }

    fn walk_operation(&mut self, op: &mut Operation, root: &RefRoot, pointer: &str) {
        for (i, p) in op.parameters.iter_mut().enumerate() {
            self.walk_parameter_or_ref(p, root, &format!("{pointer}/parameters/{i}"));
        }
        if let Some(ref mut body) = op.request_body {
            self.walk_request_body_or_ref(body, root, &format!("{pointer}/requestBody"));
        }
        for (status, resp) in &mut op.responses {
            self.walk_response_or_ref(resp, root, &format!("{pointer}/responses/{status}"));
        }
        self.walk_extra(&mut op.extra, root, pointer);
    }

    fn walk_schema_or_ref(&mut self, schema_or_ref: &mut SchemaOrRef, root: &RefRoot, pointer: &str) {
        match schema_or_ref {
            SchemaOrRef::Ref { ref_path } => {
                (self.visit)(ref_path, Some(ComponentSection::Schemas), root, pointer);
            }
            SchemaOrRef::Schema(schema) => self.walk_schema(schema, root, pointer),
        }
    }

    fn walk_schema(&mut self, schema: &mut Schema, root: &RefRoot, pointer: &str) {
        for (name, prop) in &mut schema.properties {
            let child = format!("{pointer}/properties/{}", encode_pointer_segment(name));
            self.walk_schema_or_ref(prop, root, &child);
        }
        if let Some(SchemaOrBool::Schema(ref mut items)) = schema.items {
            self.walk_schema_or_ref(items, root, &format!("{pointer}/items"));
        }
        for (i, s) in schema.prefix_items.iter_mut().enumerate() {
            self.walk_schema_or_ref(s, root, &format!("{pointer}/prefixItems/{i}"));
        }
        if let Some(SchemaOrBool::Schema(ref mut s)) = schema.additional_items {
            self.walk_schema_or_ref(s, root, &format!("{pointer}/additionalItems"));
        }
        if let Some(SchemaOrBool::Schema(ref mut s)) = schema.additional_properties {
            self.walk_schema_or_ref(s, root, &format!("{pointer}/additionalProperties"));
        }
        for (i, s) in schema.all_of.iter_mut().enumerate() {
            self.walk_schema_or_ref(s, root, &format!("{pointer}/allOf/{i}"));
        }
        for (i, s) in schema.one_of.iter_mut().enumerate() {
            self.walk_schema_or_ref(s, root, &format!("{pointer}/oneOf/{i}"));
        }
        for (i, s) in schema.any_of.iter_mut().enumerate() {
            self.walk_schema_or_ref(s, root, &format!("{pointer}/anyOf/{i}"));
        }
        self.walk_extra(&mut schema.keywords, root, pointer);
    }

    fn walk_parameter_or_ref(&mut self, param: &mut ParameterOrRef, root: &RefRoot, pointer: &str) {
        match param {
            ParameterOrRef::Ref { ref_path } => {
                (self.visit)(ref_path, Some(ComponentSection::Parameters), root, pointer);
            }
            ParameterOrRef::Parameter(p) => {
                if let Some(ref mut s) = p.schema {
                    self.walk_schema_or_ref(s, root, &format!("{pointer}/schema"));
                }
                self.walk_extra(&mut p.extra, root, pointer);
            }
        }
    }

    fn walk_request_body_or_ref(
        &mut self,
        body: &mut RequestBodyOrRef,
        root: &RefRoot,
        pointer: &str,
    ) {
        match body {
            RequestBodyOrRef::Ref { ref_path } => {
                (self.visit)(ref_path, Some(ComponentSection::RequestBodies), root, pointer);
            }
            RequestBodyOrRef::RequestBody(rb) => {
                for (ct, mt) in &mut rb.content {
                    let child = format!("{pointer}/content/{}", encode_pointer_segment(ct));
                    self.walk_media_type(mt, root, &child);
                }
            }
        }
    }

    fn walk_response_or_ref(&mut self, resp: &mut ResponseOrRef, root: &RefRoot, pointer: &str) {
        match resp {
            ResponseOrRef::Ref { ref_path } => {
                (self.visit)(ref_path, Some(ComponentSection::Responses), root, pointer);
            }
            ResponseOrRef::Response(r) => {
                for (ct, mt) in &mut r.content {
                    let child = format!("{pointer}/content/{}", encode_pointer_segment(ct));
                    self.walk_media_type(mt, root, &child);
                }
                self.walk_extra(&mut r.extra, root, pointer);
            }
        }
    }

    fn walk_media_type(&mut self, mt: &mut MediaType, root: &RefRoot, pointer: &str) {
        if let Some(ref mut s) = mt.schema {
            self.walk_schema_or_ref(s, root, &format!("{pointer}/schema"));
        }
        if let Some(ref mut s) = mt.item_schema {
            self.walk_schema_or_ref(s, root, &format!("{pointer}/itemSchema"));
        }
        self.walk_extra(&mut mt.extra, root, pointer);
    }
}

/// Names defined in the component sections of one document.
#[derive(Debug, Default)]
struct ComponentIndex {
    names: HashSet<(ComponentSection, String)>,
}

impl ComponentIndex {
    fn new(components: Option<&Components>) -> Self {
        let Some(c) = components else {
            return Self::default();
        };
        let names = ComponentSection::ALL
            .into_iter()
            .flat_map(|section| {
                c.names(section)
                    .into_iter()
                    .map(move |name| (section, name.to_string()))
            })
            .collect();
        Self { names }
    }

    fn contains(&self, section: ComponentSection, name: &str) -> bool {
        self.names.contains(&(section, name.to_string()))
    }
}

/// A `$ref` that could not be resolved against the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DanglingRef {
    pub ref_path: String,
    pub root: RefRoot,
    pub pointer: String,
    pub reason: String,
}

impl DanglingRef {
    fn new(ref_path: &str, root: &RefRoot, pointer: &str, reason: String) -> Self {
        Self {
            ref_path: ref_path.to_string(),
            root: root.clone(),
            pointer: pointer.to_string(),
            reason,
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::new(
            RuleId::UnresolvedReference,
            Location::pointer(self.pointer.clone()),
            format!("unresolved reference '{}': {}", self.ref_path, self.reason),
        )
    }
}

/// Rewrite references into `local_documents` as local pointers.
///
/// `local_documents` are the file names being merged; a reference such as
/// `pets.yaml#/components/schemas/Pet` is local when `pets.yaml` (or a path
/// ending in it) is one of them. Malformed references and references into
/// other documents are returned. Pointers outside `components` inside
/// untyped values (for instance `#/$defs/x`) are left alone.
pub fn localize_refs(spec: &mut OpenApiSpec, local_documents: &[String]) -> Vec<DanglingRef> {
    let mut dangling = Vec::new();
    let mut walker = RefWalker::new(
        |ref_path: &mut String, expected: Option<ComponentSection>, root: &RefRoot, pointer: &str| {
            let parsed = match parse_ref(ref_path) {
                Ok(parsed) => parsed,
                Err(_) if expected.is_none() => return,
                Err(e) => {
                    dangling.push(DanglingRef::new(ref_path, root, pointer, e.to_string()));
                    return;
                }
            };
            let Some(ref doc) = parsed.document else {
                return;
            };
            if is_local_document(doc, local_documents) {
                *ref_path = parsed.local_pointer();
            } else {
                let reason = format!("document '{doc}' is not part of the merge");
                dangling.push(DanglingRef::new(ref_path, root, pointer, reason));
            }
        },
    );
    walker.walk_spec(spec);
    dangling
}

/// Check every local `$ref` against the document's own components.
///
/// References that are malformed or point into other documents are
/// skipped; [`localize_refs`] reports those.
pub fn check_refs(spec: &mut OpenApiSpec) -> Vec<DanglingRef> {
    let index = ComponentIndex::new(spec.components.as_ref());
    let mut dangling = Vec::new();
    let mut walker = RefWalker::new(
        |ref_path: &mut String, expected: Option<ComponentSection>, root: &RefRoot, pointer: &str| {
            let Ok(parsed) = parse_ref(ref_path) else {
                return;
            };
            if parsed.document.is_some() {
                return;
            }
            match expected {
                Some(expected) if parsed.section != expected => {
                    let reason = format!(
                        "expected a reference into '{}', found '{}'",
                        expected.key(),
                        parsed.section.key()
                    );
                    dangling.push(DanglingRef::new(ref_path, root, pointer, reason));
                }
                _ if !index.contains(parsed.section, &parsed.name) => {
                    let reason =
                        format!("no {} entry named '{}'", parsed.section.key(), parsed.name);
                    dangling.push(DanglingRef::new(ref_path, root, pointer, reason));
                }
                _ => {}
            }
        },
    );
    walker.walk_spec(spec);
    dangling
}

fn is_local_document(doc: &str, local_documents: &[String]) -> bool {
    let doc = doc.trim_start_matches("./");
    let doc_file = doc.rsplit('/').next().unwrap_or(doc);
    local_documents.iter().any(|known| {
        let known_file = known.rsplit('/').next().unwrap_or(known);
        known == doc || known_file == doc_file
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_local_schema_ref() {
        let r = parse_ref("#/components/schemas/Pet").unwrap();
        assert_eq!(r.document, None);
        assert_eq!(r.section, ComponentSection::Schemas);
        assert_eq!(r.name, "Pet");
    }

    #[test]
    fn parses_external_ref() {
        let r = parse_ref("./pets.yaml#/components/responses/NotFound").unwrap();
        assert_eq!(r.document.as_deref(), Some("./pets.yaml"));
        assert_eq!(r.section, ComponentSection::Responses);
        assert_eq!(r.local_pointer(), "#/components/responses/NotFound");
    }

    #[test]
    fn decodes_pointer_escapes() {
        let r = parse_ref("#/components/schemas/a~1b~0c").unwrap();
        assert_eq!(r.name, "a/b~c");
        assert_eq!(r.local_pointer(), "#/components/schemas/a~1b~0c");
    }

    #[test]
    fn rejects_non_component_pointers() {
        assert!(matches!(
            parse_ref("#/paths/~1pets"),
            Err(ResolveError::UnsupportedRef(_))
        ));
        assert!(matches!(
            parse_ref("Pet"),
            Err(ResolveError::InvalidRefFormat(_))
        ));
    }

    #[test]
    fn schema_ref_name_ignores_other_sections() {
        assert_eq!(
            schema_ref_name("#/components/schemas/Pet").as_deref(),
            Some("Pet")
        );
        assert_eq!(schema_ref_name("#/components/responses/Pet"), None);
    }

    fn spec(yaml: &str) -> OpenApiSpec {
        serde_yaml_ng::from_str(yaml).unwrap()
    }

    #[test]
    fn refs_inside_untyped_values_are_localized_and_checked() {
        let mut doc = spec(
            r#"
paths:
  /pets:
    get:
      responses:
        "200":
          description: ok
          headers:
            X-Rate: {$ref: 'api.yaml#/components/headers/XRate'}
            X-Trace: {$ref: '#/components/headers/XTrace'}
          content:
            application/json:
              examples:
                one: {$ref: '#/components/examples/One'}
components:
  headers:
    XRate: {schema: {type: integer}}
  schemas:
    Pet:
      type: object
      $defs:
        local: {$ref: '#/$defs/other'}
"#,
        );
        let files = vec!["api.yaml".to_string()];
        assert!(localize_refs(&mut doc, &files).is_empty());

        let dangling = check_refs(&mut doc);
        let pointers: Vec<&str> = dangling.iter().map(|d| d.pointer.as_str()).collect();
        assert_eq!(
            pointers,
            vec![
                "#/paths/~1pets/get/responses/200/content/application~1json/examples/one/$ref",
                "#/paths/~1pets/get/responses/200/headers/X-Trace/$ref",
            ]
        );

        let yaml = serde_yaml_ng::to_string(&doc).unwrap();
        assert!(yaml.contains("#/components/headers/XRate"));
        assert!(!yaml.contains("api.yaml#"));
    }

    #[test]
    fn foreign_documents_are_reported_by_localization_only() {
        let mut doc = spec(
            "components:\n  schemas:\n    Pet: {$ref: 'common.yaml#/components/schemas/Animal'}\n",
        );
        let dangling = localize_refs(&mut doc, &["api.yaml".to_string()]);
        assert_eq!(dangling.len(), 1);
        assert_eq!(
            dangling[0].root,
            RefRoot::Component(ComponentSection::Schemas, "Pet".to_string())
        );
        assert!(check_refs(&mut doc).is_empty());
    }

    #[test]
    fn local_document_matches_by_file_name() {
        let docs = vec!["specs/api_pets.yaml".to_string()];
        assert!(is_local_document("api_pets.yaml", &docs));
        assert!(is_local_document("./api_pets.yaml", &docs));
        assert!(!is_local_document("other.yaml", &docs));
    }
}
