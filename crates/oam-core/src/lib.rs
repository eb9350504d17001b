//! Multi-file OpenAPI merging, validation and type resolution.
//!
//! [`analyze`] runs the whole pipeline over a base document and its parts.
//! The individual stages are exposed for callers that need only one of them.

pub mod config;
pub mod conflict;
pub mod diagnostics;
pub mod error;
pub mod ir;
pub mod merge;
pub mod parse;
pub mod transform;
pub mod validate;

pub use config::OamConfig;
pub use conflict::{ConflictSet, ReservedIdentifiers};
pub use diagnostics::{Diagnostic, Location, RuleId, Severity};
pub use error::{ConfigError, ParseError, PipelineError};
pub use merge::{MergeResult, MergeStrategy, SourceDocument, merge};
pub use transform::{Analysis, SourceFile, SourceRole, analyze};
pub use validate::Validator;
