//! Detects schema names that collide with identifiers of the target language
//! or with segments of the target namespace, and qualifies them.

use std::collections::BTreeSet;

use heck::ToUpperCamelCase;
use serde::Serialize;

use crate::parse::spec::OpenApiSpec;

/// Type names built into the generated target language.
const BUILTIN_RESERVED: &[&str] = &[
    "Action", "Array", "Attribute", "Boolean", "Byte", "Char", "Console", "DateTime", "Decimal",
    "Delegate", "Double", "Dynamic", "Enum", "Environment", "Event", "Exception", "File", "Func",
    "Guid", "Int16", "Int32", "Int64", "Math", "Nullable", "Object", "Path", "Random", "Range",
    "Single", "Span", "Stream", "String", "Task", "Thread", "TimeSpan", "Timer", "Type", "Uri",
    "ValueTask", "Version", "Void",
];

/// Set of identifiers schema names must not shadow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservedIdentifiers {
    names: BTreeSet<String>,
}

impl Default for ReservedIdentifiers {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ReservedIdentifiers {
    pub fn builtin() -> Self {
        Self {
            names: BUILTIN_RESERVED.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Built-in names plus `extra`.
    pub fn with_extra<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut reserved = Self::builtin();
        reserved.names.extend(extra.into_iter().map(Into::into));
        reserved
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Why a schema name needs qualification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "with", rename_all = "snake_case")]
pub enum ConflictReason {
    Reserved(String),
    NamespaceSegment(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Conflict {
    pub schema: String,
    #[serde(flatten)]
    pub reason: ConflictReason,
}

/// Result of scanning one merged document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConflictSet {
    namespace: Option<String>,
    conflicts: Vec<Conflict>,
}

impl ConflictSet {
    /// Scan every component schema name of `document`.
    pub fn scan(
        document: &OpenApiSpec,
        namespace: Option<&str>,
        reserved: &ReservedIdentifiers,
    ) -> Self {
        let segments: Vec<&str> = namespace
            .map(|ns| ns.split('.').filter(|s| !s.is_empty()).collect())
            .unwrap_or_default();
        let schema_names = document
            .components
            .iter()
            .flat_map(|c| c.schemas.keys());

        let mut conflicts = Vec::new();
        for name in schema_names {
            let pascal = name.to_upper_camel_case();
            let reason = if reserved.contains(name) {
                Some(ConflictReason::Reserved(name.clone()))
            } else if reserved.contains(&pascal) {
                Some(ConflictReason::Reserved(pascal.clone()))
            } else {
                segments
                    .iter()
                    .find(|seg| **seg == name.as_str() || **seg == pascal.as_str())
                    .map(|seg| ConflictReason::NamespaceSegment(seg.to_string()))
            };
            if let Some(reason) = reason {
                log::debug!("schema '{name}' conflicts: {reason:?}");
                conflicts.push(Conflict {
                    schema: name.clone(),
                    reason,
                });
            }
        }

        Self {
            namespace: namespace.map(str::to_string),
            conflicts,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.conflicts.iter().any(|c| c.schema == name)
    }

    pub fn conflicts(&self) -> &[Conflict] {
        &self.conflicts
    }

    pub fn is_empty(&self) -> bool {
        self.conflicts.is_empty()
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// The name to use in generated code.
    pub fn qualify(&self, name: &str) -> String {
        self.qualify_in(None, name)
    }

    /// View that qualifies names into the models of one segment.
    pub fn for_segment<'a>(&'a self, segment: &'a str) -> SegmentRegistry<'a> {
        SegmentRegistry {
            set: self,
            segment,
        }
    }

    fn qualify_in(&self, segment: Option<&str>, name: &str) -> String {
        if !self.contains(name) {
            return name.to_string();
        }
        let mut qualified = String::new();
        if let Some(ns) = &self.namespace {
            qualified.push_str(ns);
            qualified.push('.');
        }
        qualified.push_str("Generated.");
        if let Some(segment) = segment {
            qualified.push_str(segment);
            qualified.push('.');
        }
        qualified.push_str("Models.");
        qualified.push_str(name);
        qualified
    }
}

/// A [`ConflictSet`] scoped to one segment.
#[derive(Debug, Clone, Copy)]
pub struct SegmentRegistry<'a> {
    set: &'a ConflictSet,
    segment: &'a str,
}

impl SegmentRegistry<'_> {
    pub fn segment(&self) -> &str {
        self.segment
    }

    pub fn contains(&self, name: &str) -> bool {
        self.set.contains(name)
    }

    pub fn qualify(&self, name: &str) -> String {
        self.set.qualify_in(Some(self.segment), name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::components::Components;
    use crate::parse::schema::SchemaOrRef;

    fn doc(names: &[&str]) -> OpenApiSpec {
        let mut components = Components::default();
        for name in names {
            components.schemas.insert(
                name.to_string(),
                SchemaOrRef::Schema(Box::default()),
            );
        }
        OpenApiSpec {
            components: Some(components),
            ..OpenApiSpec::default()
        }
    }

    #[test]
    fn test_reserved_name_is_qualified() {
        let set = ConflictSet::scan(
            &doc(&["Task", "Pet"]),
            Some("My.App"),
            &ReservedIdentifiers::default(),
        );
        assert_eq!(set.qualify("Task"), "My.App.Generated.Models.Task");
        assert_eq!(set.qualify("Pet"), "Pet");
    }

    #[test]
    fn test_lowercase_name_matches_in_pascal_case() {
        let set = ConflictSet::scan(&doc(&["task"]), None, &ReservedIdentifiers::default());
        assert!(set.contains("task"));
        assert_eq!(set.qualify("task"), "Generated.Models.task");
    }

    #[test]
    fn test_namespace_segment_conflict() {
        let set = ConflictSet::scan(
            &doc(&["App", "Store"]),
            Some("My.App"),
            &ReservedIdentifiers::default(),
        );
        assert_eq!(
            set.conflicts(),
            &[Conflict {
                schema: "App".to_string(),
                reason: ConflictReason::NamespaceSegment("App".to_string()),
            }]
        );
    }

    #[test]
    fn test_extra_reserved_names() {
        let reserved = ReservedIdentifiers::with_extra(["Widget"]);
        let set = ConflictSet::scan(&doc(&["Widget"]), None, &reserved);
        assert!(set.contains("Widget"));
        assert!(!ConflictSet::scan(&doc(&["Widget"]), None, &ReservedIdentifiers::builtin())
            .contains("Widget"));
    }

    #[test]
    fn test_segment_view() {
        let set = ConflictSet::scan(
            &doc(&["Object"]),
            Some("Acme"),
            &ReservedIdentifiers::default(),
        );
        let users = set.for_segment("Users");
        assert_eq!(users.qualify("Object"), "Acme.Generated.Users.Models.Object");
        assert_eq!(users.qualify("User"), "User");
        // Stable across calls
        assert_eq!(set.qualify("Object"), set.qualify("Object"));
    }
}
