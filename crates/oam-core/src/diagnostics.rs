//! Diagnostics and the rule catalog shared by merge, resolution and validation.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::parse::operation::HttpMethod;

/// Severity of a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        })
    }
}

macro_rules! rule_catalog {
    ($($variant:ident => ($code:literal, $severity:ident, $summary:literal),)+) => {
        /// Stable identifier of every rule that can produce a diagnostic.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum RuleId {
            $($variant,)+
        }

        impl RuleId {
            pub const ALL: &'static [RuleId] = &[$(RuleId::$variant,)+];

            /// Short code such as `RSP003`.
            pub fn code(&self) -> &'static str {
                match self {
                    $(RuleId::$variant => $code,)+
                }
            }

            /// Human-readable rule name such as `TooManyRequestsWithoutRateLimit`.
            pub fn name(&self) -> &'static str {
                match self {
                    $(RuleId::$variant => stringify!($variant),)+
                }
            }

            pub fn severity(&self) -> Severity {
                match self {
                    $(RuleId::$variant => Severity::$severity,)+
                }
            }

            pub fn summary(&self) -> &'static str {
                match self {
                    $(RuleId::$variant => $summary,)+
                }
            }

            pub fn from_code(code: &str) -> Option<RuleId> {
                match code {
                    $($code => Some(RuleId::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

rule_catalog! {
    // Multi-part merge
    DuplicatePath => ("MRG001", Error, "path defined in more than one input"),
    DuplicateSchema => ("MRG002", Error, "schema defined in more than one input"),
    DuplicateComponent => ("MRG003", Error, "component defined in more than one input"),
    DuplicateDropped => ("MRG004", Info, "later duplicate dropped"),
    MetadataRedefinition => ("MRG005", Error, "part redefines document-level metadata"),
    UnresolvedReference => ("MRG006", Error, "$ref target does not exist"),

    // Structure
    MissingOpenApiVersion => ("STR001", Error, "document has no openapi version"),
    MissingInfo => ("STR002", Error, "document has no info object"),
    MissingOperationId => ("STR003", Warning, "operation has no operationId"),
    DuplicateOperationId => ("STR004", Error, "operationId used more than once"),
    UndeclaredPathParameter => ("STR005", Error, "path template parameter is not declared"),
    UnusedPathParameter => ("STR006", Error, "declared path parameter is not in the template"),
    OptionalPathParameter => ("STR007", Error, "path parameter is not required"),
    DuplicateParameter => ("STR008", Warning, "parameter declared twice"),
    EmptyResponses => ("STR009", Warning, "operation declares no responses"),
    UndefinedSecurityScheme => ("STR010", Error, "security requirement names an unknown scheme"),
    MissingSuccessResponse => ("STR011", Warning, "operation has no success response"),
    MissingOperationDescription => ("STR012", Info, "operation has no summary or description"),

    // Response codes
    InvalidStatusCode => ("RSP001", Error, "response key is not a valid status code"),
    NotFoundWithoutPathParameter => ("RSP002", Warning, "404 on a POST without path parameters"),
    TooManyRequestsWithoutRateLimit => ("RSP003", Warning, "429 without rate-limit configuration"),
    UnauthorizedWithoutSecurity => ("RSP004", Warning, "401 without declared security"),
    ForbiddenWithoutSecurity => ("RSP005", Warning, "403 without declared security"),
    NoContentWithBody => ("RSP006", Warning, "204 response declares content"),

    // Extensions
    CacheOnUnsafeMethod => ("EXT001", Warning, "x-cache on a state-changing method"),
    RetryOnNonIdempotentMethod => ("EXT002", Warning, "x-retry on a non-idempotent method"),
    InvalidExtension => ("EXT003", Error, "extension value does not have the expected shape"),

    // Naming
    OperationIdCasing => ("NAM001", Warning, "operationId does not follow the casing policy"),
    SchemaNameCasing => ("NAM002", Warning, "schema name does not follow the casing policy"),
    PropertyNameCasing => ("NAM003", Warning, "property name does not follow the casing policy"),
    ParameterNameCasing => ("NAM004", Warning, "parameter name does not follow the casing policy"),
    EnumValueCasing => ("NAM005", Warning, "enum value does not follow the casing policy"),

    // Type resolution
    ReferenceCycle => ("TYP001", Error, "non-nullable reference cycle"),
    DuplicateEnumValue => ("TYP002", Error, "enum lists a value twice"),
    UnknownFormat => ("TYP003", Info, "unrecognized format hint"),
    IgnoredAllOfBranch => ("TYP004", Info, "allOf branch contributes no properties"),
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl Serialize for RuleId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

/// Where in the document a finding applies.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Location {
    Document,
    Path {
        path: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        method: Option<HttpMethod>,
    },
    Schema {
        name: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        property: Option<String>,
    },
    Pointer {
        pointer: String,
    },
}

impl Location {
    pub fn path(path: &str) -> Self {
        Location::Path {
            path: path.to_string(),
            method: None,
        }
    }

    pub fn operation(path: &str, method: HttpMethod) -> Self {
        Location::Path {
            path: path.to_string(),
            method: Some(method),
        }
    }

    pub fn schema(name: &str) -> Self {
        Location::Schema {
            name: name.to_string(),
            property: None,
        }
    }

    pub fn property(schema: &str, property: &str) -> Self {
        Location::Schema {
            name: schema.to_string(),
            property: Some(property.to_string()),
        }
    }

    pub fn pointer(pointer: impl Into<String>) -> Self {
        Location::Pointer {
            pointer: pointer.into(),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Document => f.write_str("<document>"),
            Location::Path { path, method: None } => f.write_str(path),
            Location::Path {
                path,
                method: Some(m),
            } => write!(f, "{m} {path}"),
            Location::Schema {
                name,
                property: None,
            } => write!(f, "schema {name}"),
            Location::Schema {
                name,
                property: Some(p),
            } => write!(f, "schema {name}.{p}"),
            Location::Pointer { pointer } => f.write_str(pointer),
        }
    }
}

/// One finding produced by the merger, resolver or validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub rule: RuleId,
    pub severity: Severity,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    pub location: Location,
}

impl Diagnostic {
    /// Create a diagnostic with the rule's fixed severity.
    pub fn new(rule: RuleId, location: Location, message: impl Into<String>) -> Self {
        Self {
            rule,
            severity: rule.severity(),
            message: message.into(),
            file: None,
            location,
        }
    }

    pub fn in_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}[{}] {}: {}",
            self.severity, self.rule, self.location, self.message
        )?;
        if let Some(ref file) = self.file {
            write!(f, " ({file})")?;
        }
        Ok(())
    }
}

/// Sort diagnostics by rule code, then location, then message.
pub fn sort_diagnostics(diagnostics: &mut [Diagnostic]) {
    diagnostics.sort_by(|a, b| {
        a.rule
            .code()
            .cmp(b.rule.code())
            .then_with(|| a.location.cmp(&b.location))
            .then_with(|| a.message.cmp(&b.message))
            .then_with(|| a.file.cmp(&b.file))
    });
}

pub fn has_errors(diagnostics: &[Diagnostic]) -> bool {
    diagnostics.iter().any(Diagnostic::is_error)
}
