pub mod formats;
pub mod name_normalizer;
pub mod pipeline;
pub mod schema_resolver;

pub use pipeline::{Analysis, SourceFile, SourceRole, analyze, parse_source};
pub use schema_resolver::SchemaResolver;
