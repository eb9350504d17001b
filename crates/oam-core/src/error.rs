use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported OpenAPI version: {0}")]
    UnsupportedVersion(String),

    #[error("missing required field: {0}")]
    MissingField(String),
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("invalid reference format: {0}")]
    InvalidRefFormat(String),

    #[error("unsupported reference target: {0}")]
    UnsupportedRef(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse config: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    #[error("invalid target namespace '{0}': segments must be non-empty identifiers")]
    InvalidNamespace(String),
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to parse {file}: {source}")]
    Parse {
        file: String,
        #[source]
        source: ParseError,
    },

    #[error("no base document supplied")]
    MissingBase,

    #[error("more than one base document supplied: {0} and {1}")]
    MultipleBases(String, String),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}
