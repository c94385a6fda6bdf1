//! Argument schema tables.
//!
//! A [`Schema`] lists the parameters a resource understands, how each maps to
//! its wire name and how its value is merged and compared. Schemas are plain
//! data built once per resource kind.

use prism_core::case::to_camel;

/// How a field is merged into the request body and compared for idempotency.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    /// Replaced wholesale by the caller value
    Scalar,
    /// Merged key by key
    Object(Schema),
    /// Replaced wholesale; compared element-wise, or as a multiset when unordered
    List {
        /// Kind of each element
        item: Box<FieldKind>,
        /// Compare ignoring element order
        unordered: bool,
    },
    /// Exactly one of several mutually exclusive variants
    OneOf(Vec<Variant>),
    /// Passed through verbatim, optionally wrapped under a reserved key
    Opaque {
        /// Wrapper key, e.g. `$reserved`
        wrap: Option<String>,
    },
}

impl FieldKind {
    /// Opaque value wrapped under `$reserved`.
    #[must_use]
    pub fn reserved() -> Self {
        Self::Opaque {
            wrap: Some("$reserved".to_string()),
        }
    }
}

/// One branch of a [`FieldKind::OneOf`].
#[derive(Debug, Clone, PartialEq)]
pub struct Variant {
    /// Parameter key selecting this variant
    pub key: String,
    /// `$objectType` written for the variant
    pub object_type: String,
    /// Fields of the variant
    pub schema: Schema,
}

impl Variant {
    /// Create a variant.
    pub fn new(key: impl Into<String>, object_type: impl Into<String>, schema: Schema) -> Self {
        Self {
            key: key.into(),
            object_type: object_type.into(),
            schema,
        }
    }
}

/// One parameter of a schema.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// Parameter (snake_case) name
    pub name: String,
    /// Wire (camelCase) name
    pub wire: String,
    /// Merge and comparison behaviour
    pub kind: FieldKind,
    /// Never returned by the server; forces a write when supplied
    pub secret: bool,
}

impl Field {
    /// A field with the camelCase wire name derived from `name`.
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        let name = name.into();
        Self {
            wire: to_camel(&name),
            name,
            kind,
            secret: false,
        }
    }

    /// Scalar field.
    pub fn scalar(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Scalar)
    }

    /// Nested object field.
    pub fn object(name: impl Into<String>, schema: Schema) -> Self {
        Self::new(name, FieldKind::Object(schema))
    }

    /// Ordered list field.
    pub fn list(name: impl Into<String>, item: FieldKind) -> Self {
        Self::new(
            name,
            FieldKind::List {
                item: Box::new(item),
                unordered: false,
            },
        )
    }

    /// List field compared as a multiset.
    pub fn unordered_list(name: impl Into<String>, item: FieldKind) -> Self {
        Self::new(
            name,
            FieldKind::List {
                item: Box::new(item),
                unordered: true,
            },
        )
    }

    /// One-of field.
    pub fn one_of(name: impl Into<String>, variants: Vec<Variant>) -> Self {
        Self::new(name, FieldKind::OneOf(variants))
    }

    /// Opaque passthrough field.
    pub fn opaque(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Opaque { wrap: None })
    }

    /// Override the wire name.
    #[must_use]
    pub fn with_wire(mut self, wire: impl Into<String>) -> Self {
        self.wire = wire.into();
        self
    }

    /// Mark the field as secret.
    #[must_use]
    pub const fn secret(mut self) -> Self {
        self.secret = true;
        self
    }
}

/// Ordered set of fields plus the internal keys that carry meaning for it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    fields: Vec<Field>,
    preserve: Vec<String>,
}

impl Schema {
    /// An empty schema.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field.
    #[must_use]
    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// Keep an internal key (such as `$reserved`) when shaping trees of this schema.
    #[must_use]
    pub fn preserving(mut self, key: impl Into<String>) -> Self {
        self.preserve.push(key.into());
        self
    }

    /// Fields in declaration order.
    #[must_use]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Internal keys preserved for this schema.
    #[must_use]
    pub fn preserved_keys(&self) -> &[String] {
        &self.preserve
    }

    /// Looks up a field by parameter name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Looks up a field by wire name.
    #[must_use]
    pub fn by_wire(&self, wire: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.wire == wire)
    }
}
