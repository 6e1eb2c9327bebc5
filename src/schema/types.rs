//! Typed declaration structs for the resource schema registry.
//!
//! Each resource is declared as a static table of [`FieldRule`]s plus its verb
//! policy, alternate lookup, projection, and cache directive. The registry is
//! pure data; the generic handlers interpret it at request time.

use serde_json::Value;

/// Wire-level type of a declared field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldType {
    String,
    Integer,
    Float,
    Boolean,
    /// RFC 3339 timestamp carried as a JSON string.
    DateTime,
    /// Ordered list of strings.
    StringList,
    /// Document id of a record in another resource.
    Reference {
        resource: &'static str,
        embeddable: bool,
    },
}

/// Default applied when the field is omitted on create.
#[derive(Clone, Copy, Debug)]
pub enum DefaultValue {
    Bool(bool),
    Str(&'static str),
    Float(f64),
}

impl DefaultValue {
    pub fn to_json(self) -> Value {
        match self {
            DefaultValue::Bool(b) => Value::Bool(b),
            DefaultValue::Str(s) => Value::String(s.to_string()),
            DefaultValue::Float(f) => {
                serde_json::Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
            }
        }
    }
}

/// Validation rules for one field of a resource schema.
#[derive(Clone, Copy, Debug)]
pub struct FieldRule {
    pub name: &'static str,
    pub field_type: FieldType,
    pub required: bool,
    /// Length bounds, in characters, for string-typed fields.
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    /// Fixed allowed-value set for string-typed fields.
    pub allowed: Option<&'static [&'static str]>,
    /// Inclusive numeric bounds for integer-typed fields.
    pub minimum: Option<i64>,
    pub maximum: Option<i64>,
    pub default: Option<DefaultValue>,
    /// Value must not collide with any other record of the resource.
    pub unique: bool,
}

impl FieldRule {
    /// Rule with only a name and type; everything else off.
    pub const fn new(name: &'static str, field_type: FieldType) -> Self {
        FieldRule {
            name,
            field_type,
            required: false,
            min_length: None,
            max_length: None,
            allowed: None,
            minimum: None,
            maximum: None,
            default: None,
            unique: false,
        }
    }

    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub const fn length(mut self, min: usize, max: usize) -> Self {
        self.min_length = Some(min);
        self.max_length = Some(max);
        self
    }

    pub const fn max_length(mut self, max: usize) -> Self {
        self.max_length = Some(max);
        self
    }

    pub const fn allowed(mut self, values: &'static [&'static str]) -> Self {
        self.allowed = Some(values);
        self
    }

    pub const fn range(mut self, min: i64, max: i64) -> Self {
        self.minimum = Some(min);
        self.maximum = Some(max);
        self
    }

    pub const fn default_value(mut self, value: DefaultValue) -> Self {
        self.default = Some(value);
        self
    }

    pub const fn unique(mut self) -> Self {
        self.unique = true;
        self
    }
}

/// HTTP verbs a resource admits, split by endpoint level as the engine does.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Patch,
    Delete,
}

/// Alternate item lookup: a URL-safe token field resolving to the same record
/// as the internal id.
#[derive(Clone, Copy, Debug)]
pub struct AlternateLookup {
    pub field: &'static str,
    /// Pattern the path segment must match to be treated as a token.
    pub pattern: &'static str,
}

/// One declared resource: schema, verb policy, and response shaping.
#[derive(Clone, Copy, Debug)]
pub struct Resource {
    /// Path segment and store collection name.
    pub name: &'static str,
    pub schema: &'static [FieldRule],
    /// Collection-level verbs (`/:resource`).
    pub resource_methods: &'static [Method],
    /// Item-level verbs (`/:resource/:id`). Empty means no item endpoint.
    pub item_methods: &'static [Method],
    pub alternate_lookup: Option<AlternateLookup>,
    /// Field names stripped from every read representation.
    pub projection: &'static [&'static str],
    /// `Cache-Control` header value for read responses, if any.
    pub cache_control: Option<&'static str>,
}

impl Resource {
    pub fn field(&self, name: &str) -> Option<&FieldRule> {
        self.schema.iter().find(|f| f.name == name)
    }

    pub fn allows_resource(&self, method: Method) -> bool {
        self.resource_methods.contains(&method)
    }

    pub fn allows_item(&self, method: Method) -> bool {
        self.item_methods.contains(&method)
    }

    /// Reference fields that may be expanded inline on read.
    pub fn embeddable_fields(&self) -> impl Iterator<Item = (&'static str, &'static str)> + '_ {
        self.schema.iter().filter_map(|f| match f.field_type {
            FieldType::Reference { resource, embeddable: true } => Some((f.name, resource)),
            _ => None,
        })
    }
}
