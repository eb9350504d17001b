use crate::ir::PrimitiveType;
use crate::ir::node::PrimitiveBase;

/// Result of looking up a format hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatLookup {
    Known(PrimitiveType),
    /// The hint is not recognized for this base; carries the base primitive.
    Unknown(PrimitiveType),
}

impl FormatLookup {
    pub fn primitive(self) -> PrimitiveType {
        match self {
            FormatLookup::Known(p) | FormatLookup::Unknown(p) => p,
        }
    }
}

/// Primitive a base type maps to without a format.
pub fn base_primitive(base: PrimitiveBase) -> PrimitiveType {
    match base {
        PrimitiveBase::String => PrimitiveType::String,
        PrimitiveBase::Integer => PrimitiveType::Integer,
        PrimitiveBase::Number => PrimitiveType::Number,
        PrimitiveBase::Boolean => PrimitiveType::Boolean,
    }
}

/// Map a base type and optional format hint to a primitive.
///
/// Total: every input yields a primitive. Hints that make no sense for the
/// base (`int32` on a string, for instance) count as unknown.
pub fn lookup_format(base: PrimitiveBase, format: Option<&str>) -> FormatLookup {
    let Some(format) = format else {
        return FormatLookup::Known(base_primitive(base));
    };
    let known = match (base, format) {
        (PrimitiveBase::String, "date") => Some(PrimitiveType::Date),
        (PrimitiveBase::String, "date-time") => Some(PrimitiveType::DateTime),
        (PrimitiveBase::String, "time") => Some(PrimitiveType::Time),
        (PrimitiveBase::String, "duration") => Some(PrimitiveType::Duration),
        (PrimitiveBase::String, "uuid") => Some(PrimitiveType::Uuid),
        (PrimitiveBase::String, "uri" | "url" | "uri-reference") => Some(PrimitiveType::Uri),
        (PrimitiveBase::String, "email") => Some(PrimitiveType::Email),
        (PrimitiveBase::String, "byte") => Some(PrimitiveType::Byte),
        (PrimitiveBase::String, "binary") => Some(PrimitiveType::Binary),
        (PrimitiveBase::String, "decimal") => Some(PrimitiveType::Decimal),
        (
            PrimitiveBase::String,
            "password" | "hostname" | "ipv4" | "ipv6" | "regex" | "idn-email" | "idn-hostname",
        ) => Some(PrimitiveType::String),
        (PrimitiveBase::Integer, "int32") => Some(PrimitiveType::Int32),
        (PrimitiveBase::Integer, "int64") => Some(PrimitiveType::Int64),
        (PrimitiveBase::Number, "float") => Some(PrimitiveType::Float),
        (PrimitiveBase::Number, "double") => Some(PrimitiveType::Double),
        (PrimitiveBase::Number, "decimal") => Some(PrimitiveType::Decimal),
        (PrimitiveBase::Number, "int32") => Some(PrimitiveType::Int32),
        (PrimitiveBase::Number, "int64") => Some(PrimitiveType::Int64),
        _ => None,
    };
    match known {
        Some(p) => FormatLookup::Known(p),
        None => FormatLookup::Unknown(base_primitive(base)),
    }
}
