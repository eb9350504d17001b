//! Combines a base document with its part documents.
//!
//! Inputs are processed base first, then parts in the order given. Every
//! path and component keeps the position of its first occurrence; which
//! definition survives a duplicate is decided by the [`MergeStrategy`].

pub mod discovery;
pub mod strategy;

use std::collections::HashMap;

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use crate::diagnostics::{Diagnostic, Location, RuleId, has_errors};
use crate::parse::components::Components;
use crate::parse::ref_resolve::{
    ComponentSection, RefRoot, check_refs, encode_pointer_segment, localize_refs,
};
use crate::parse::spec::{OpenApiSpec, Tag};

pub use discovery::discover_parts;
pub use strategy::MergeStrategy;

/// A parsed input document and the file it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceDocument {
    pub name: String,
    pub spec: OpenApiSpec,
}

impl SourceDocument {
    pub fn new(name: impl Into<String>, spec: OpenApiSpec) -> Self {
        Self {
            name: name.into(),
            spec,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MergeCounts {
    pub files: usize,
    pub paths: usize,
    pub operations: usize,
    pub schemas: usize,
}

/// Outcome of a merge. The document is always the best-effort result.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeResult {
    pub document: OpenApiSpec,
    pub diagnostics: Vec<Diagnostic>,
    pub counts: MergeCounts,
}

impl MergeResult {
    /// True when the merge produced no error diagnostics.
    pub fn is_success(&self) -> bool {
        !has_errors(&self.diagnostics)
    }
}

/// Kinds of entity subject to the duplicate strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntityKind {
    Path,
    Webhook,
    Component(ComponentSection),
}

impl EntityKind {
    fn rule(self) -> RuleId {
        match self {
            EntityKind::Path | EntityKind::Webhook => RuleId::DuplicatePath,
            EntityKind::Component(ComponentSection::Schemas) => RuleId::DuplicateSchema,
            EntityKind::Component(_) => RuleId::DuplicateComponent,
        }
    }

    fn label(self) -> &'static str {
        match self {
            EntityKind::Path => "path",
            EntityKind::Webhook => "webhook",
            EntityKind::Component(ComponentSection::Schemas) => "schema",
            EntityKind::Component(ComponentSection::Responses) => "response",
            EntityKind::Component(ComponentSection::Parameters) => "parameter",
            EntityKind::Component(ComponentSection::RequestBodies) => "request body",
            EntityKind::Component(ComponentSection::SecuritySchemes) => "security scheme",
            EntityKind::Component(ComponentSection::Headers) => "header",
            EntityKind::Component(ComponentSection::Examples) => "example",
            EntityKind::Component(ComponentSection::Links) => "link",
            EntityKind::Component(ComponentSection::Callbacks) => "callback",
            EntityKind::Component(ComponentSection::PathItems) => "path item",
        }
    }

    fn location(self, name: &str) -> Location {
        match self {
            EntityKind::Path => Location::path(name),
            EntityKind::Webhook => {
                Location::pointer(format!("#/webhooks/{}", encode_pointer_segment(name)))
            }
            EntityKind::Component(ComponentSection::Schemas) => Location::schema(name),
            EntityKind::Component(section) => Location::pointer(format!(
                "#/components/{}/{}",
                section.key(),
                encode_pointer_segment(name)
            )),
        }
    }

    fn root(self, name: &str) -> RefRoot {
        match self {
            EntityKind::Path => RefRoot::Path(name.to_string()),
            EntityKind::Webhook => RefRoot::Webhook(name.to_string()),
            EntityKind::Component(section) => RefRoot::Component(section, name.to_string()),
        }
    }
}

/// Shared state while folding the inputs together.
struct Merger<'a> {
    files: Vec<&'a str>,
    strategy: MergeStrategy,
    diagnostics: Vec<Diagnostic>,
    /// File each surviving entity was taken from.
    provenance: HashMap<RefRoot, usize>,
}

impl<'a> Merger<'a> {
    /// Fold every occurrence of one entity kind into a single map.
    fn entities<T: Clone + PartialEq + 'a>(
        &mut self,
        kind: EntityKind,
        docs: &[&'a SourceDocument],
        extract: impl Fn(&'a OpenApiSpec) -> Option<&'a IndexMap<String, T>>,
    ) -> IndexMap<String, T> {
        let mut occurrences: IndexMap<&'a str, Vec<(usize, &'a T)>> = IndexMap::new();
        for (idx, doc) in docs.iter().enumerate() {
            let Some(map) = extract(&doc.spec) else {
                continue;
            };
            for (name, value) in map {
                occurrences
                    .entry(name.as_str())
                    .or_default()
                    .push((idx, value));
            }
        }

        let mut merged = IndexMap::new();
        for (name, found) in occurrences {
            if let Some((idx, value)) = self.pick(kind, name, &found) {
                self.provenance.insert(kind.root(name), idx);
                merged.insert(name.to_string(), value.clone());
            }
        }
        merged
    }

    /// Choose the surviving definition of one entity, if any.
    fn pick<'v, T: PartialEq>(
        &mut self,
        kind: EntityKind,
        name: &str,
        found: &[(usize, &'v T)],
    ) -> Option<(usize, &'v T)> {
        let (&first, rest) = found.split_first()?;
        if rest.is_empty() {
            return Some(first);
        }
        let defined_in = found
            .iter()
            .map(|(idx, _)| self.files[*idx])
            .collect::<Vec<_>>()
            .join(", ");

        match self.strategy {
            MergeStrategy::ErrorOnDuplicate => {
                self.duplicate_error(kind, name, rest[0].0, format!("defined in {defined_in}"));
                None
            }
            MergeStrategy::MergeIfIdentical => {
                match rest.iter().find(|(_, value)| *value != first.1) {
                    None => {
                        log::debug!("{} '{name}' identical in {defined_in}", kind.label());
                        Some(first)
                    }
                    Some((idx, _)) => {
                        let message = format!(
                            "definitions in {} and {} differ",
                            self.files[first.0], self.files[*idx]
                        );
                        self.duplicate_error(kind, name, *idx, message);
                        None
                    }
                }
            }
            MergeStrategy::AppendUnique => {
                for (idx, _) in rest {
                    let diagnostic = Diagnostic::new(
                        RuleId::DuplicateDropped,
                        kind.location(name),
                        format!(
                            "{} '{name}' already defined in {}; dropped",
                            kind.label(),
                            self.files[first.0]
                        ),
                    )
                    .in_file(self.files[*idx]);
                    self.diagnostics.push(diagnostic);
                }
                Some(first)
            }
            MergeStrategy::FirstWins => {
                log::debug!("{} '{name}': keeping {}", kind.label(), self.files[first.0]);
                Some(first)
            }
            MergeStrategy::LastWins => {
                let last = *rest.last()?;
                log::debug!("{} '{name}': keeping {}", kind.label(), self.files[last.0]);
                Some(last)
            }
        }
    }

    fn duplicate_error(&mut self, kind: EntityKind, name: &str, file: usize, detail: String) {
        let diagnostic = Diagnostic::new(
            kind.rule(),
            kind.location(name),
            format!("{} '{name}' {detail}", kind.label()),
        )
        .in_file(self.files[file]);
        self.diagnostics.push(diagnostic);
    }

    /// Adopt a document-level value, or report a part that redefines it.
    ///
    /// A part may only supply a key that no earlier input defines, even
    /// when its value is identical.
    fn metadata<T: Clone>(&mut self, key: &str, slot: &mut Option<T>, incoming: Option<&T>, file: usize) {
        let Some(value) = incoming else {
            return;
        };
        if slot.is_some() {
            self.redefinition(key, file);
        } else {
            *slot = Some(value.clone());
        }
    }

    /// [`Merger::metadata`] for every key of a catch-all map.
    fn metadata_map(
        &mut self,
        scope: &str,
        slot: &mut IndexMap<String, Value>,
        incoming: &IndexMap<String, Value>,
        file: usize,
    ) {
        for (key, value) in incoming {
            if slot.contains_key(key) {
                self.redefinition(&format!("{scope}{key}"), file);
            } else {
                slot.insert(key.clone(), value.clone());
            }
        }
    }

    fn redefinition(&mut self, key: &str, file: usize) {
        let diagnostic = Diagnostic::new(
            RuleId::MetadataRedefinition,
            Location::Document,
            format!("'{key}' is already defined; a part may only supply it when no earlier input does"),
        )
        .in_file(self.files[file]);
        self.diagnostics.push(diagnostic);
    }
}

/// Merge `base` and `parts` into one document.
///
/// Cross-file references are localized in every input before the inputs are
/// compared, so `api.yaml#/components/schemas/Pet` and
/// `#/components/schemas/Pet` count as the same definition.
pub fn merge(base: &SourceDocument, parts: &[SourceDocument], strategy: MergeStrategy) -> MergeResult {
    let file_names: Vec<String> = std::iter::once(base)
        .chain(parts)
        .map(|d| d.name.clone())
        .collect();
    let mut localized = Vec::with_capacity(file_names.len());
    let mut foreign = Vec::new();
    for (idx, doc) in std::iter::once(base).chain(parts).enumerate() {
        let mut doc = doc.clone();
        foreign.extend(
            localize_refs(&mut doc.spec, &file_names)
                .into_iter()
                .map(|dangling| (idx, dangling)),
        );
        localized.push(doc);
    }

    let docs: Vec<&SourceDocument> = localized.iter().collect();
    let mut merger = Merger {
        files: docs.iter().map(|d| d.name.as_str()).collect(),
        strategy,
        diagnostics: Vec::new(),
        provenance: HashMap::new(),
    };

    let base = docs[0];
    let mut openapi = base.spec.openapi.clone();
    let mut info = base.spec.info.clone();
    let mut servers = (!base.spec.servers.is_empty()).then(|| base.spec.servers.clone());
    let mut security = base.spec.security.clone();
    let mut rate_limit = base.spec.rate_limit.clone();
    let mut extra = base.spec.extra.clone();
    let mut component_extra = base
        .spec
        .components
        .as_ref()
        .map(|c| c.extra.clone())
        .unwrap_or_default();
    for (idx, part) in docs.iter().enumerate().skip(1) {
        let spec = &part.spec;
        merger.metadata("openapi", &mut openapi, spec.openapi.as_ref(), idx);
        merger.metadata("info", &mut info, spec.info.as_ref(), idx);
        let part_servers = (!spec.servers.is_empty()).then_some(&spec.servers);
        merger.metadata("servers", &mut servers, part_servers, idx);
        merger.metadata("security", &mut security, spec.security.as_ref(), idx);
        merger.metadata("x-rate-limit", &mut rate_limit, spec.rate_limit.as_ref(), idx);
        merger.metadata_map("", &mut extra, &spec.extra, idx);
        if let Some(components) = &spec.components {
            merger.metadata_map("components.", &mut component_extra, &components.extra, idx);
        }
    }

    let paths = merger.entities(EntityKind::Path, &docs, |s| Some(&s.paths));
    let webhooks = merger.entities(EntityKind::Webhook, &docs, |s| Some(&s.webhooks));
    let section = EntityKind::Component;
    let components = Components {
        schemas: merger.entities(section(ComponentSection::Schemas), &docs, |s| {
            s.components.as_ref().map(|c| &c.schemas)
        }),
        responses: merger.entities(section(ComponentSection::Responses), &docs, |s| {
            s.components.as_ref().map(|c| &c.responses)
        }),
        parameters: merger.entities(section(ComponentSection::Parameters), &docs, |s| {
            s.components.as_ref().map(|c| &c.parameters)
        }),
        request_bodies: merger.entities(section(ComponentSection::RequestBodies), &docs, |s| {
            s.components.as_ref().map(|c| &c.request_bodies)
        }),
        security_schemes: merger.entities(section(ComponentSection::SecuritySchemes), &docs, |s| {
            s.components.as_ref().map(|c| &c.security_schemes)
        }),
        headers: merger.entities(section(ComponentSection::Headers), &docs, |s| {
            s.components.as_ref().map(|c| &c.headers)
        }),
        examples: merger.entities(section(ComponentSection::Examples), &docs, |s| {
            s.components.as_ref().map(|c| &c.examples)
        }),
        links: merger.entities(section(ComponentSection::Links), &docs, |s| {
            s.components.as_ref().map(|c| &c.links)
        }),
        callbacks: merger.entities(section(ComponentSection::Callbacks), &docs, |s| {
            s.components.as_ref().map(|c| &c.callbacks)
        }),
        path_items: merger.entities(section(ComponentSection::PathItems), &docs, |s| {
            s.components.as_ref().map(|c| &c.path_items)
        }),
        extra: component_extra,
    };
    let any_components = docs.iter().any(|d| d.spec.components.is_some());

    let mut document = OpenApiSpec {
        openapi,
        info,
        servers: servers.unwrap_or_default(),
        paths,
        components: any_components.then_some(components),
        tags: union_tags(&docs),
        security,
        rate_limit,
        webhooks,
        extra,
    };

    // Only findings under a definition that made it into the result count.
    for (idx, dangling) in foreign {
        if merger.provenance.get(&dangling.root) == Some(&idx) {
            let diagnostic = dangling.to_diagnostic().in_file(merger.files[idx]);
            merger.diagnostics.push(diagnostic);
        }
    }
    for dangling in check_refs(&mut document) {
        let mut diagnostic = dangling.to_diagnostic();
        if let Some(idx) = merger.provenance.get(&dangling.root) {
            diagnostic = diagnostic.in_file(merger.files[*idx]);
        }
        merger.diagnostics.push(diagnostic);
    }

    let counts = MergeCounts {
        files: docs.len(),
        paths: document.paths.len(),
        operations: document.operation_count(),
        schemas: document.schema_count(),
    };
    log::debug!(
        "merged {} file(s) with {strategy}: {} path(s), {} schema(s), {} diagnostic(s)",
        counts.files,
        counts.paths,
        counts.schemas,
        merger.diagnostics.len()
    );

    MergeResult {
        document,
        diagnostics: merger.diagnostics,
        counts,
    }
}

/// Tags from every input, first definition per name.
fn union_tags(docs: &[&SourceDocument]) -> Vec<Tag> {
    let mut tags: IndexMap<&str, &Tag> = IndexMap::new();
    for tag in docs.iter().flat_map(|d| &d.spec.tags) {
        tags.entry(tag.name.as_str()).or_insert(tag);
    }
    tags.into_values().cloned().collect()
}
