//! Attribute definitions for content types and components
//!
//! Attributes form a closed tagged union so that every consumer of the
//! schema (validator, relation walker, component engine) dispatches
//! exhaustively: adding a new attribute kind is a compile error everywhere
//! it must be handled.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Primitive value kinds a scalar attribute can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScalarKind {
    String,
    Text,
    Email,
    Enumeration,
    Integer,
    BigInteger,
    Float,
    Decimal,
    Boolean,
    Date,
    Datetime,
    Json,
}

impl ScalarKind {
    /// Whether values of this kind are represented as JSON strings
    pub fn is_string_like(&self) -> bool {
        matches!(
            self,
            ScalarKind::String
                | ScalarKind::Text
                | ScalarKind::Email
                | ScalarKind::Enumeration
                | ScalarKind::Date
                | ScalarKind::Datetime
        )
    }

    /// Whether values of this kind are represented as JSON numbers
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            ScalarKind::Integer | ScalarKind::BigInteger | ScalarKind::Float | ScalarKind::Decimal
        )
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarKind::String => write!(f, "string"),
            ScalarKind::Text => write!(f, "text"),
            ScalarKind::Email => write!(f, "email"),
            ScalarKind::Enumeration => write!(f, "enumeration"),
            ScalarKind::Integer => write!(f, "integer"),
            ScalarKind::BigInteger => write!(f, "biginteger"),
            ScalarKind::Float => write!(f, "float"),
            ScalarKind::Decimal => write!(f, "decimal"),
            ScalarKind::Boolean => write!(f, "boolean"),
            ScalarKind::Date => write!(f, "date"),
            ScalarKind::Datetime => write!(f, "datetime"),
            ScalarKind::Json => write!(f, "json"),
        }
    }
}

/// The cardinality/direction of a relation attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RelationKind {
    OneToOne,
    OneToMany,
    ManyToOne,
    ManyToMany,
    /// Polymorphic relations are recognized but never validated for
    /// existence; the relation walker skips them.
    MorphToOne,
    MorphToMany,
}

impl RelationKind {
    /// Polymorphic relations have no single declared target
    pub fn is_polymorphic(&self) -> bool {
        matches!(self, RelationKind::MorphToOne | RelationKind::MorphToMany)
    }
}

/// A scalar attribute: a primitive value with optional constraints
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScalarAttribute {
    /// Primitive kind of the value
    pub kind: ScalarKind,
    /// Whether a non-nil value is mandatory (relaxed for drafts)
    #[serde(default)]
    pub required: bool,
    /// Default applied on creation when the attribute is absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Minimum numeric value (inclusive)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    /// Maximum numeric value (inclusive)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    /// Minimum string length
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    /// Maximum string length
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    /// Allowed values for `enumeration` kinds
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<String>,
    /// Private attributes are stripped before events leave the engine
    #[serde(default)]
    pub private: bool,
}

impl ScalarAttribute {
    /// Create a scalar attribute of the given kind with no constraints
    pub fn new(kind: ScalarKind) -> Self {
        Self {
            kind,
            required: false,
            default: None,
            min: None,
            max: None,
            min_length: None,
            max_length: None,
            values: Vec::new(),
            private: false,
        }
    }

    /// Mark the attribute as required
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Set the creation default
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Set the minimum numeric value (inclusive)
    pub fn min(mut self, value: f64) -> Self {
        self.min = Some(value);
        self
    }

    /// Set the maximum numeric value (inclusive)
    pub fn max(mut self, value: f64) -> Self {
        self.max = Some(value);
        self
    }

    /// Set the minimum string length
    pub fn min_length(mut self, length: usize) -> Self {
        self.min_length = Some(length);
        self
    }

    /// Set the maximum string length
    pub fn max_length(mut self, length: usize) -> Self {
        self.max_length = Some(length);
        self
    }

    /// Set the allowed enumeration values
    pub fn values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.values = values.into_iter().map(Into::into).collect();
        self
    }

    /// Mark the attribute as private
    pub fn private(mut self) -> Self {
        self.private = true;
        self
    }
}

/// A media attribute, always targeting the upload-file content type
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaAttribute {
    /// Whether multiple files can be attached
    #[serde(default)]
    pub multiple: bool,
    #[serde(default)]
    pub required: bool,
}

impl MediaAttribute {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn multiple(mut self) -> Self {
        self.multiple = true;
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// A relation attribute pointing at another content type
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationAttribute {
    /// Cardinality and direction of the relation
    pub relation: RelationKind,
    /// Uid of the target content type; `None` for polymorphic relations
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default)]
    pub required: bool,
}

impl RelationAttribute {
    /// Create a relation of the given kind targeting `target`
    pub fn new(relation: RelationKind, target: impl Into<String>) -> Self {
        Self {
            relation,
            target: Some(target.into()),
            required: false,
        }
    }

    /// Create a polymorphic relation with no declared target
    pub fn polymorphic(relation: RelationKind) -> Self {
        Self {
            relation,
            target: None,
            required: false,
        }
    }

    pub fn one_to_one(target: impl Into<String>) -> Self {
        Self::new(RelationKind::OneToOne, target)
    }

    pub fn one_to_many(target: impl Into<String>) -> Self {
        Self::new(RelationKind::OneToMany, target)
    }

    pub fn many_to_one(target: impl Into<String>) -> Self {
        Self::new(RelationKind::ManyToOne, target)
    }

    pub fn many_to_many(target: impl Into<String>) -> Self {
        Self::new(RelationKind::ManyToMany, target)
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// A component attribute embedding a reusable nested structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentAttribute {
    /// Uid of the referenced component model
    pub component: String,
    /// Repeatable components hold an ordered sequence of values
    #[serde(default)]
    pub repeatable: bool,
    #[serde(default)]
    pub required: bool,
    /// Minimum number of entries (repeatable only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<usize>,
    /// Maximum number of entries (repeatable only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<usize>,
}

impl ComponentAttribute {
    pub fn new(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            repeatable: false,
            required: false,
            min: None,
            max: None,
        }
    }

    pub fn repeatable(mut self) -> Self {
        self.repeatable = true;
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn min(mut self, min: usize) -> Self {
        self.min = Some(min);
        self
    }

    pub fn max(mut self, max: usize) -> Self {
        self.max = Some(max);
        self
    }
}

/// A dynamic zone: an ordered, heterogeneous sequence of component values,
/// each entry tagged with its own component uid under `__component`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DynamicZoneAttribute {
    /// Component uids allowed inside this zone
    pub components: Vec<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<usize>,
}

impl DynamicZoneAttribute {
    pub fn new<I, S>(components: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            components: components.into_iter().map(Into::into).collect(),
            required: false,
            min: None,
            max: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn min(mut self, min: usize) -> Self {
        self.min = Some(min);
        self
    }

    pub fn max(mut self, max: usize) -> Self {
        self.max = Some(max);
        self
    }

    /// Whether `uid` is one of the component types allowed in this zone
    pub fn allows(&self, uid: &str) -> bool {
        self.components.iter().any(|c| c == uid)
    }
}

/// An attribute of a content type or component
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Attribute {
    Scalar(ScalarAttribute),
    Media(MediaAttribute),
    Relation(RelationAttribute),
    Component(ComponentAttribute),
    DynamicZone(DynamicZoneAttribute),
}

impl Attribute {
    /// Shorthand constructor for a string scalar
    pub fn string() -> ScalarAttribute {
        ScalarAttribute::new(ScalarKind::String)
    }

    /// Shorthand constructor for an integer scalar
    pub fn integer() -> ScalarAttribute {
        ScalarAttribute::new(ScalarKind::Integer)
    }

    /// Shorthand constructor for a float scalar
    pub fn float() -> ScalarAttribute {
        ScalarAttribute::new(ScalarKind::Float)
    }

    /// Shorthand constructor for a boolean scalar
    pub fn boolean() -> ScalarAttribute {
        ScalarAttribute::new(ScalarKind::Boolean)
    }

    /// Shorthand constructor for an enumeration scalar
    pub fn enumeration<I, S>(values: I) -> ScalarAttribute
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ScalarAttribute::new(ScalarKind::Enumeration).values(values)
    }

    /// Whether this attribute embeds component data (component or zone)
    pub fn holds_components(&self) -> bool {
        matches!(self, Attribute::Component(_) | Attribute::DynamicZone(_))
    }

    /// Whether a non-nil value is mandatory for published entries
    pub fn is_required(&self) -> bool {
        match self {
            Attribute::Scalar(s) => s.required,
            Attribute::Media(m) => m.required,
            Attribute::Relation(r) => r.required,
            Attribute::Component(c) => c.required,
            Attribute::DynamicZone(z) => z.required,
        }
    }

    /// Whether the attribute must be stripped before event emission
    pub fn is_private(&self) -> bool {
        match self {
            Attribute::Scalar(s) => s.private,
            _ => false,
        }
    }
}

impl From<ScalarAttribute> for Attribute {
    fn from(attr: ScalarAttribute) -> Self {
        Attribute::Scalar(attr)
    }
}

impl From<MediaAttribute> for Attribute {
    fn from(attr: MediaAttribute) -> Self {
        Attribute::Media(attr)
    }
}

impl From<RelationAttribute> for Attribute {
    fn from(attr: RelationAttribute) -> Self {
        Attribute::Relation(attr)
    }
}

impl From<ComponentAttribute> for Attribute {
    fn from(attr: ComponentAttribute) -> Self {
        Attribute::Component(attr)
    }
}

impl From<DynamicZoneAttribute> for Attribute {
    fn from(attr: DynamicZoneAttribute) -> Self {
        Attribute::DynamicZone(attr)
    }
}
