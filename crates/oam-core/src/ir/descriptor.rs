use serde::Serialize;
use serde_json::Value;

/// Concrete primitive a schema resolves to once its format hint is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimitiveType {
    String,
    Integer,
    Int32,
    Int64,
    Number,
    Float,
    Double,
    Decimal,
    Boolean,
    Date,
    DateTime,
    Time,
    Duration,
    Uuid,
    Uri,
    Email,
    Byte,
    Binary,
    Any,
}

/// A resolved, language-agnostic type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeDescriptor {
    /// Component schema this type came from, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub nullable: bool,
    #[serde(flatten)]
    pub kind: TypeKind,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeKind {
    Primitive {
        primitive: PrimitiveType,
    },
    Enum(EnumDescriptor),
    Object(ObjectDescriptor),
    Array {
        element: Box<TypeDescriptor>,
    },
    Tuple(TupleDescriptor),
    Union(UnionDescriptor),
    /// Back-reference to an enclosing named schema.
    Recursive {
        target: String,
    },
    /// Placeholder for a dangling reference.
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnumDescriptor {
    pub base: PrimitiveType,
    pub values: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectDescriptor {
    pub properties: Vec<PropertyDescriptor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<Box<TypeDescriptor>>,
}

impl ObjectDescriptor {
    pub fn property(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.properties.iter().find(|p| p.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyDescriptor {
    pub name: String,
    pub required: bool,
    #[serde(rename = "type")]
    pub descriptor: TypeDescriptor,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub read_only: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub write_only: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TupleDescriptor {
    pub elements: Vec<TypeDescriptor>,
    /// Type of the elements after the positional ones.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rest: Option<Box<TypeDescriptor>>,
    pub is_strict: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnionDescriptor {
    pub variants: Vec<TypeDescriptor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discriminator: Option<DiscriminatorDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiscriminatorDescriptor {
    pub property_name: String,
    /// Discriminator value to schema name.
    pub mapping: Vec<(String, String)>,
}

impl TypeDescriptor {
    pub fn new(kind: TypeKind) -> Self {
        Self {
            name: None,
            nullable: false,
            kind,
        }
    }

    pub fn primitive(primitive: PrimitiveType) -> Self {
        Self::new(TypeKind::Primitive { primitive })
    }

    pub fn any() -> Self {
        Self::primitive(PrimitiveType::Any)
    }

    pub fn unknown() -> Self {
        Self::new(TypeKind::Unknown)
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Make nullable when `nullable` is set; never clears existing nullability.
    pub fn or_nullable(mut self, nullable: bool) -> Self {
        self.nullable |= nullable;
        self
    }

    pub fn as_object(&self) -> Option<&ObjectDescriptor> {
        match &self.kind {
            TypeKind::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_tuple(&self) -> Option<&TupleDescriptor> {
        match &self.kind {
            TypeKind::Tuple(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_union(&self) -> Option<&UnionDescriptor> {
        match &self.kind {
            TypeKind::Union(u) => Some(u),
            _ => None,
        }
    }

    pub fn as_enum(&self) -> Option<&EnumDescriptor> {
        match &self.kind {
            TypeKind::Enum(e) => Some(e),
            _ => None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self.kind, TypeKind::Unknown)
    }

    /// Short kind label used in summaries.
    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            TypeKind::Primitive { .. } => "primitive",
            TypeKind::Enum(_) => "enum",
            TypeKind::Object(_) => "object",
            TypeKind::Array { .. } => "array",
            TypeKind::Tuple(_) => "tuple",
            TypeKind::Union(_) => "union",
            TypeKind::Recursive { .. } => "recursive",
            TypeKind::Unknown => "unknown",
        }
    }
}
