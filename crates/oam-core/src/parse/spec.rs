use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::components::Components;
use super::extensions::{Extension, RateLimit};
use super::operation::{HttpMethod, Operation, PathItem};
use super::security::SecurityRequirement;

/// `info`. Contact, license and terms are carried in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Info {
    pub title: String,

    #[serde(deserialize_with = "super::scalar::text")]
    pub version: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Server {
    pub url: String,

    /// `description` and templated `variables`.
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

/// Tag declaration; parts may add tags the base does not know.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Top-level OpenAPI 3.x document.
///
/// `openapi` and `info` are optional so that part files, which usually carry
/// only paths and components, deserialize with the same model as the base.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OpenApiSpec {
    #[serde(
        default,
        deserialize_with = "super::scalar::optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub openapi: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub info: Option<Info>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub servers: Vec<Server>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub paths: IndexMap<String, PathItem>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub components: Option<Components>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub security: Option<Vec<SecurityRequirement>>,

    /// Document-wide rate limit applied to every operation without its own.
    #[serde(rename = "x-rate-limit", skip_serializing_if = "Option::is_none")]
    pub rate_limit: Option<Extension<RateLimit>>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub webhooks: IndexMap<String, PathItem>,

    /// `externalDocs`, `jsonSchemaDialect` and other `x-*` keys.
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

impl OpenApiSpec {
    /// Iterate over every operation in path order, then method order.
    pub fn operations(&self) -> impl Iterator<Item = (&str, HttpMethod, &Operation)> {
        self.paths.iter().flat_map(|(path, item)| {
            item.operations()
                .map(move |(method, op)| (path.as_str(), method, op))
        })
    }

    /// Number of operations across all paths.
    pub fn operation_count(&self) -> usize {
        self.paths.values().map(|item| item.operations().count()).sum()
    }

    /// Number of component schemas.
    pub fn schema_count(&self) -> usize {
        self.components.as_ref().map_or(0, |c| c.schemas.len())
    }

    /// Whether a security requirement applies anywhere in the document.
    pub fn has_global_security(&self) -> bool {
        self.security
            .as_ref()
            .is_some_and(|reqs| reqs.iter().any(|r| !r.is_empty()))
    }
}
