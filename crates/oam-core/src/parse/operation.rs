use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::components::Components;
use super::content::{RequestBodyOrRef, ResponseOrRef};
use super::extensions::{CachePolicy, Extension, RateLimit, RetryPolicy};
use super::parameter::{Parameter, ParameterOrRef};
use super::security::SecurityRequirement;

/// HTTP method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Options,
    Head,
    Trace,
}

impl HttpMethod {
    pub const ALL: [HttpMethod; 8] = [
        HttpMethod::Get,
        HttpMethod::Post,
        HttpMethod::Put,
        HttpMethod::Delete,
        HttpMethod::Patch,
        HttpMethod::Options,
        HttpMethod::Head,
        HttpMethod::Trace,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Head => "HEAD",
            HttpMethod::Trace => "TRACE",
        }
    }

    /// Key used for this method inside a path item.
    pub fn key(&self) -> &'static str {
        match self {
            HttpMethod::Get => "get",
            HttpMethod::Post => "post",
            HttpMethod::Put => "put",
            HttpMethod::Delete => "delete",
            HttpMethod::Patch => "patch",
            HttpMethod::Options => "options",
            HttpMethod::Head => "head",
            HttpMethod::Trace => "trace",
        }
    }

    /// GET, HEAD, OPTIONS and TRACE do not modify server state.
    pub fn is_safe(&self) -> bool {
        matches!(
            self,
            HttpMethod::Get | HttpMethod::Head | HttpMethod::Options | HttpMethod::Trace
        )
    }

    /// POST and PATCH are the only non-idempotent methods.
    pub fn is_idempotent(&self) -> bool {
        !matches!(self, HttpMethod::Post | HttpMethod::Patch)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An API operation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Operation {
    #[serde(rename = "operationId", skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<ParameterOrRef>,

    #[serde(rename = "requestBody", skip_serializing_if = "Option::is_none")]
    pub request_body: Option<RequestBodyOrRef>,

    #[serde(
        default,
        deserialize_with = "super::scalar::text_keyed",
        skip_serializing_if = "IndexMap::is_empty"
    )]
    pub responses: IndexMap<String, ResponseOrRef>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub security: Option<Vec<SecurityRequirement>>,

    #[serde(rename = "x-rate-limit", skip_serializing_if = "Option::is_none")]
    pub rate_limit: Option<Extension<RateLimit>>,

    #[serde(rename = "x-cache", skip_serializing_if = "Option::is_none")]
    pub cache: Option<Extension<CachePolicy>>,

    #[serde(rename = "x-retry", skip_serializing_if = "Option::is_none")]
    pub retry: Option<Extension<RetryPolicy>>,

    /// `callbacks`, `externalDocs`, `servers` and other `x-*` keys.
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

impl Operation {
    pub fn is_deprecated(&self) -> bool {
        self.deprecated.unwrap_or(false)
    }
}

/// A path item, containing operations keyed by HTTP method.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PathItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<ParameterOrRef>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub get: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub put: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub head: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace: Option<Operation>,

    /// `servers` and `x-*` keys.
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

impl PathItem {
    pub fn operation(&self, method: HttpMethod) -> Option<&Operation> {
        match method {
            HttpMethod::Get => self.get.as_ref(),
            HttpMethod::Post => self.post.as_ref(),
            HttpMethod::Put => self.put.as_ref(),
            HttpMethod::Delete => self.delete.as_ref(),
            HttpMethod::Patch => self.patch.as_ref(),
            HttpMethod::Options => self.options.as_ref(),
            HttpMethod::Head => self.head.as_ref(),
            HttpMethod::Trace => self.trace.as_ref(),
        }
    }

    /// Operations present on this path, in method declaration order.
    pub fn operations(&self) -> impl Iterator<Item = (HttpMethod, &Operation)> {
        HttpMethod::ALL
            .into_iter()
            .filter_map(|method| self.operation(method).map(|op| (method, op)))
    }

    /// Parameters that apply to `op`: path-level ones overridden by
    /// operation-level ones with the same name and location. References
    /// that do not resolve are skipped.
    pub fn effective_parameters<'a>(
        &'a self,
        op: &'a Operation,
        components: Option<&'a Components>,
    ) -> Vec<&'a Parameter> {
        let resolve = |item: &'a ParameterOrRef| match item {
            ParameterOrRef::Parameter(p) => Some(p),
            ParameterOrRef::Ref { .. } => components?.parameter(item),
        };
        let mut params: Vec<&'a Parameter> = Vec::new();
        for param in self.parameters.iter().chain(&op.parameters).filter_map(resolve) {
            match params.iter_mut().find(|p| p.key() == param.key()) {
                Some(slot) => *slot = param,
                None => params.push(param),
            }
        }
        params
    }

    /// Mutable access to every present operation.
    pub fn operations_mut(&mut self) -> Vec<(HttpMethod, &mut Operation)> {
        let mut out = Vec::new();
        macro_rules! push_op {
            ($method:expr, $op:expr) => {
                if let Some(ref mut op) = $op {
                    out.push(($method, op));
                }
            };
        }
        push_op!(HttpMethod::Get, self.get);
        push_op!(HttpMethod::Post, self.post);
        push_op!(HttpMethod::Put, self.put);
        push_op!(HttpMethod::Delete, self.delete);
        push_op!(HttpMethod::Patch, self.patch);
        push_op!(HttpMethod::Options, self.options);
        push_op!(HttpMethod::Head, self.head);
        push_op!(HttpMethod::Trace, self.trace);
        out
    }
}
