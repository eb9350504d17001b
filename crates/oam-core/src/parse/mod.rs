pub mod components;
pub mod content;
pub mod extensions;
pub mod operation;
pub mod parameter;
pub mod ref_resolve;
mod scalar;
pub mod schema;
pub mod security;
pub mod spec;

use crate::error::ParseError;
use spec::OpenApiSpec;

/// Text encoding of a source document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Yaml,
    Json,
}

impl SourceFormat {
    /// Pick the format from a file name, falling back to sniffing the content.
    pub fn detect(file_name: &str, content: &str) -> Self {
        match file_name.rsplit_once('.').map(|(_, ext)| ext) {
            Some("json") => SourceFormat::Json,
            Some("yaml" | "yml") => SourceFormat::Yaml,
            _ if content.trim_start().starts_with('{') => SourceFormat::Json,
            _ => SourceFormat::Yaml,
        }
    }
}

/// Parse a complete OpenAPI document from YAML.
pub fn from_yaml(input: &str) -> Result<OpenApiSpec, ParseError> {
    let spec: OpenApiSpec = serde_yaml_ng::from_str(input)?;
    validate_complete(&spec)?;
    Ok(spec)
}

/// Parse a complete OpenAPI document from JSON.
pub fn from_json(input: &str) -> Result<OpenApiSpec, ParseError> {
    let spec: OpenApiSpec = serde_json::from_str(input)?;
    validate_complete(&spec)?;
    Ok(spec)
}

/// Parse a document that may omit `openapi` and `info`, as part files and
/// split base files do. A declared version must still be 3.x.
pub fn fragment(input: &str, format: SourceFormat) -> Result<OpenApiSpec, ParseError> {
    let spec: OpenApiSpec = match format {
        SourceFormat::Yaml => serde_yaml_ng::from_str(input)?,
        SourceFormat::Json => serde_json::from_str(input)?,
    };
    if let Some(ref version) = spec.openapi {
        validate_version(version)?;
    }
    Ok(spec)
}

fn validate_complete(spec: &OpenApiSpec) -> Result<(), ParseError> {
    let version = spec
        .openapi
        .as_deref()
        .ok_or_else(|| ParseError::MissingField("openapi".to_string()))?;
    validate_version(version)?;
    if spec.info.is_none() {
        return Err(ParseError::MissingField("info".to_string()));
    }
    Ok(())
}

fn validate_version(version: &str) -> Result<(), ParseError> {
    if !version.starts_with("3.") {
        return Err(ParseError::UnsupportedVersion(version.to_string()));
    }
    Ok(())
}
