//! Schema descriptors
//!
//! A [`SchemaDescriptor`] enumerates the fields a route expects, where each one is
//! read from, its type, and the constraints it must satisfy. Descriptors are plain
//! values built once when routes are registered; the validation engine walks them
//! instead of discovering structure at runtime.

use super::validators;
use axum::http::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Characters accepted by [`CharClass::Special`]
pub const SPECIAL_CHARACTERS: &str = "!@#$%^&*()";

/// Where a field's value is read from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldSource {
    /// Decided by the request method (query for reads, body for writes)
    Inferred,
    Body,
    Query,
}

/// The concrete source a request is decoded from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeSource {
    Body,
    Query,
}

impl DecodeSource {
    /// Read-style methods decode from the query string, write-style from the body
    pub fn for_method(method: &Method) -> Self {
        match *method {
            Method::GET | Method::DELETE | Method::HEAD | Method::OPTIONS => DecodeSource::Query,
            _ => DecodeSource::Body,
        }
    }
}

impl FieldSource {
    pub fn resolve(self, primary: DecodeSource) -> DecodeSource {
        match self {
            FieldSource::Inferred => primary,
            FieldSource::Body => DecodeSource::Body,
            FieldSource::Query => DecodeSource::Query,
        }
    }
}

/// Expected JSON type of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    Integer,
    Number,
    Boolean,
    Any,
}

impl FieldType {
    pub fn accepts(self, value: &Value) -> bool {
        match self {
            FieldType::String => value.is_string(),
            FieldType::Integer => value.is_i64() || value.is_u64(),
            FieldType::Number => value.is_number(),
            FieldType::Boolean => value.is_boolean(),
            FieldType::Any => true,
        }
    }

    /// Convert a raw query-string value into a JSON value of this type
    pub fn coerce(self, raw: &str) -> Option<Value> {
        match self {
            FieldType::String | FieldType::Any => Some(Value::String(raw.to_string())),
            FieldType::Integer => raw.parse::<i64>().ok().map(Value::from),
            FieldType::Number => raw
                .parse::<f64>()
                .ok()
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number),
            FieldType::Boolean => raw.parse::<bool>().ok().map(Value::Bool),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            FieldType::String => "a string",
            FieldType::Integer => "an integer",
            FieldType::Number => "a number",
            FieldType::Boolean => "a boolean",
            FieldType::Any => "any value",
        }
    }
}

/// Named character classes for "contains at least one of" rules
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharClass {
    Lowercase,
    Uppercase,
    Digit,
    Special,
}

impl CharClass {
    pub fn contains(self, c: char) -> bool {
        match self {
            CharClass::Lowercase => c.is_ascii_lowercase(),
            CharClass::Uppercase => c.is_ascii_uppercase(),
            CharClass::Digit => c.is_ascii_digit(),
            CharClass::Special => SPECIAL_CHARACTERS.contains(c),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            CharClass::Lowercase => "lowercase letter",
            CharClass::Uppercase => "uppercase letter",
            CharClass::Digit => "digit",
            CharClass::Special => "special character (!@#$%^&*())",
        }
    }
}

/// A single rule applied to a present field value
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    MinLength(usize),
    MaxLength(usize),
    Alphanumeric,
    Email,
    ContainsAny(CharClass),
    MinValue(f64),
    MaxValue(f64),
    OneOf(Vec<String>),
    DateFormat(String),
}

impl Constraint {
    /// Short rule name, used in fallback messages
    pub fn tag(&self) -> &'static str {
        match self {
            Constraint::MinLength(_) => "min",
            Constraint::MaxLength(_) => "max",
            Constraint::Alphanumeric => "alphanum",
            Constraint::Email => "email",
            Constraint::ContainsAny(_) => "containsany",
            Constraint::MinValue(_) => "gte",
            Constraint::MaxValue(_) => "lte",
            Constraint::OneOf(_) => "oneof",
            Constraint::DateFormat(_) => "datetime",
        }
    }

    pub fn check(&self, value: &Value) -> bool {
        match self {
            Constraint::MinLength(min) => validators::min_length(value, *min),
            Constraint::MaxLength(max) => validators::max_length(value, *max),
            Constraint::Alphanumeric => validators::alphanumeric(value),
            Constraint::Email => validators::email(value),
            Constraint::ContainsAny(class) => validators::contains_any(value, *class),
            Constraint::MinValue(min) => validators::min_value(value, *min),
            Constraint::MaxValue(max) => validators::max_value(value, *max),
            Constraint::OneOf(allowed) => validators::in_list(value, allowed),
            Constraint::DateFormat(format) => validators::date_format(value, format),
        }
    }
}

/// Description of one expected field
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: String,
    pub source: FieldSource,
    pub field_type: FieldType,
    pub required: bool,
    /// Display label for credential fields; `None` for ordinary fields
    pub credential_label: Option<String>,
    pub constraints: Vec<Constraint>,
}

impl FieldSpec {
    /// A string field read from the method's default source
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: FieldSource::Inferred,
            field_type: FieldType::String,
            required: false,
            credential_label: None,
            constraints: Vec::new(),
        }
    }

    pub fn from_body(mut self) -> Self {
        self.source = FieldSource::Body;
        self
    }

    pub fn from_query(mut self) -> Self {
        self.source = FieldSource::Query;
        self
    }

    pub fn of_type(mut self, field_type: FieldType) -> Self {
        self.field_type = field_type;
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Mark as a credential; its failures get dedicated messages
    pub fn credential(mut self) -> Self {
        self.credential_label = Some(capitalize(&self.name));
        self
    }

    pub fn credential_labelled(mut self, label: impl Into<String>) -> Self {
        self.credential_label = Some(label.into());
        self
    }

    pub fn constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    pub fn min_length(self, min: usize) -> Self {
        self.constraint(Constraint::MinLength(min))
    }

    pub fn max_length(self, max: usize) -> Self {
        self.constraint(Constraint::MaxLength(max))
    }

    pub fn alphanumeric(self) -> Self {
        self.constraint(Constraint::Alphanumeric)
    }

    pub fn email(self) -> Self {
        self.constraint(Constraint::Email)
    }

    pub fn contains_any(self, class: CharClass) -> Self {
        self.constraint(Constraint::ContainsAny(class))
    }

    pub fn min_value(self, min: f64) -> Self {
        self.constraint(Constraint::MinValue(min))
    }

    pub fn max_value(self, max: f64) -> Self {
        self.constraint(Constraint::MaxValue(max))
    }

    pub fn one_of<I, S>(self, allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.constraint(Constraint::OneOf(
            allowed.into_iter().map(Into::into).collect(),
        ))
    }

    pub fn date_format(self, format: impl Into<String>) -> Self {
        self.constraint(Constraint::DateFormat(format.into()))
    }

    pub fn is_credential(&self) -> bool {
        self.credential_label.is_some()
    }
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Structural and constraint description of a route's input
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaDescriptor {
    pub name: String,
    pub fields: Vec<FieldSpec>,
}

impl SchemaDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    pub fn get(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Whether any field resolves to `source` for requests using `primary`
    pub fn reads_from(&self, source: DecodeSource, primary: DecodeSource) -> bool {
        self.fields
            .iter()
            .any(|f| f.source.resolve(primary) == source)
    }
}

/// A request input type with a known descriptor
///
/// ```rust,ignore
/// #[derive(Deserialize)]
/// struct SignIn { username: String, password: String }
///
/// impl Schema for SignIn {
///     fn descriptor() -> SchemaDescriptor {
///         SchemaDescriptor::new("SignIn")
///             .field(FieldSpec::new("username").required())
///             .field(FieldSpec::new("password").required().credential())
///     }
/// }
/// ```
pub trait Schema: DeserializeOwned + Send + Sync + 'static {
    fn descriptor() -> SchemaDescriptor;
}

/// Type-erased decoded input, as stored in the request scope
pub type ValidatedData = Arc<dyn Any + Send + Sync>;

/// Decodes raw input into a schema's concrete type
pub trait SchemaDecoder: Send + Sync {
    fn decode_json(&self, value: Value) -> Result<ValidatedData, String>;
}

struct TypedDecoder<T>(PhantomData<fn() -> T>);

impl<T: Schema> SchemaDecoder for TypedDecoder<T> {
    fn decode_json(&self, value: Value) -> Result<ValidatedData, String> {
        serde_json::from_value::<T>(value)
            .map(|v| Arc::new(v) as ValidatedData)
            .map_err(|e| e.to_string())
    }
}

/// Deserialize a raw query string (without the leading `?`)
pub(crate) fn decode_query_string<T: DeserializeOwned>(query: &str) -> Result<T, String> {
    let uri: axum::http::Uri = format!("/?{}", query).parse().map_err(|e| format!("{}", e))?;
    axum::extract::Query::<T>::try_from_uri(&uri)
        .map(|q| q.0)
        .map_err(|e| e.body_text())
}

/// A descriptor paired with the decoder for its Rust type
#[derive(Clone)]
pub struct RegisteredSchema {
    descriptor: Arc<SchemaDescriptor>,
    decoder: Arc<dyn SchemaDecoder>,
}

impl RegisteredSchema {
    pub fn of<T: Schema>() -> Self {
        Self {
            descriptor: Arc::new(T::descriptor()),
            decoder: Arc::new(TypedDecoder::<T>(PhantomData)),
        }
    }

    pub fn descriptor(&self) -> &SchemaDescriptor {
        &self.descriptor
    }

    pub fn decoder(&self) -> &dyn SchemaDecoder {
        self.decoder.as_ref()
    }
}

impl fmt::Debug for RegisteredSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredSchema")
            .field("name", &self.descriptor.name)
            .field("fields", &self.descriptor.fields.len())
            .finish()
    }
}
