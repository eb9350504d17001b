use std::fmt;

use serde::Serialize;

use super::descriptor::TypeDescriptor;
use crate::parse::operation::HttpMethod;
use crate::parse::parameter::ParameterLocation;

/// Resolved types of one operation, ready for the emission layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationDescriptor {
    /// `operationId`, or a name derived from method and path.
    pub name: NormalizedName,
    pub method: HttpMethod,
    pub path: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    pub parameters: Vec<ParameterDescriptor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_body: Option<BodyDescriptor>,
    pub responses: Vec<ResponseDescriptor>,
    pub deprecated: bool,
}

/// A path/query/header/cookie parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterDescriptor {
    pub name: String,
    pub location: ParameterLocation,
    pub required: bool,
    #[serde(rename = "type")]
    pub descriptor: TypeDescriptor,
}

/// A request body in its preferred content type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BodyDescriptor {
    pub content_type: String,
    pub required: bool,
    #[serde(rename = "type")]
    pub descriptor: TypeDescriptor,
}

/// One declared response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseDescriptor {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    /// `None` when the response has no body.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub descriptor: Option<TypeDescriptor>,
}

/// An identifier and every casing a consumer may want for it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct NormalizedName {
    pub original: String,
    pub pascal_case: String,
    pub camel_case: String,
    pub snake_case: String,
    pub kebab_case: String,
    pub screaming_snake: String,
}

impl fmt::Display for NormalizedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.original)
    }
}
