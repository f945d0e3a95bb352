//! The validation engine
//!
//! Turns raw request input into a decoded schema instance, or into the complete,
//! ordered list of what is wrong with it.
//!
//! Processing order:
//! 1. pick the primary source from the method (query for reads, body for writes)
//! 2. structural decoding: body must be a JSON object, query must parse, and every
//!    present value must have its field's declared type. Any failure here is a
//!    single [`GateError::StructuralDecode`]
//! 3. classify each field as absent / null / present and run its rules, collecting
//!    every failure across every field
//! 4. assemble one JSON object from both sources and decode it into the schema's
//!    Rust type

use super::messages;
use super::schema::{
    DecodeSource, FieldSpec, RegisteredSchema, Schema, SchemaDescriptor, ValidatedData,
    decode_query_string,
};
use crate::core::error::{GateError, ValidationErrors};
use crate::core::nullable::NullableField;
use axum::http::Method;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Raw input read from a request
#[derive(Debug, Clone, Copy)]
pub struct RawInput<'a> {
    pub method: &'a Method,
    /// Query string without the leading `?`
    pub query: Option<&'a str>,
    pub body: &'a [u8],
}

impl<'a> RawInput<'a> {
    pub fn new(method: &'a Method) -> Self {
        Self {
            method,
            query: None,
            body: &[],
        }
    }

    pub fn with_query(mut self, query: &'a str) -> Self {
        self.query = Some(query);
        self
    }

    pub fn with_body(mut self, body: &'a [u8]) -> Self {
        self.body = body;
        self
    }
}

/// Field values gathered from both sources, already type-checked
#[derive(Debug, Default)]
struct Sources {
    body: Option<Map<String, Value>>,
    query: Map<String, Value>,
    /// Query parameters no field declares, kept as strings
    undeclared: Map<String, Value>,
}

impl Sources {
    fn slot(&self, source: DecodeSource, name: &str) -> NullableField<&Value> {
        let map = match source {
            DecodeSource::Body => self.body.as_ref(),
            DecodeSource::Query => Some(&self.query),
        };
        NullableField::from_slot(map.and_then(|m| m.get(name)))
    }
}

/// Stateless validator over schema descriptors
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidationEngine;

impl ValidationEngine {
    pub fn new() -> Self {
        Self
    }

    /// Validate against a registered schema and return the type-erased instance
    pub fn validate(
        &self,
        schema: &RegisteredSchema,
        input: &RawInput<'_>,
    ) -> Result<ValidatedData, GateError> {
        let descriptor = schema.descriptor();
        let primary = DecodeSource::for_method(input.method);
        let sources = self.check(descriptor, input)?;

        schema
            .decoder()
            .decode_json(assemble(descriptor, primary, sources))
            .map_err(|e| GateError::structural(format!("Invalid data format: {}", e)))
    }

    /// Validate directly into a concrete schema type
    pub fn validate_as<T: Schema>(&self, input: &RawInput<'_>) -> Result<T, GateError> {
        let descriptor = T::descriptor();
        let primary = DecodeSource::for_method(input.method);
        let sources = self.check(&descriptor, input)?;

        serde_json::from_value::<T>(assemble(&descriptor, primary, sources))
            .map_err(|e| GateError::structural(format!("Invalid data format: {}", e)))
    }

    /// Structural decoding plus constraint checks, without building the instance
    fn check(
        &self,
        descriptor: &SchemaDescriptor,
        input: &RawInput<'_>,
    ) -> Result<Sources, GateError> {
        let primary = DecodeSource::for_method(input.method);
        let sources = decode_sources(descriptor, primary, input)?;

        let errors = evaluate(descriptor, primary, &sources);
        if errors.is_empty() {
            Ok(sources)
        } else {
            tracing::debug!(
                schema = %descriptor.name,
                violations = errors.len(),
                "request input failed validation"
            );
            Err(GateError::Validation(errors))
        }
    }
}

fn decode_sources(
    descriptor: &SchemaDescriptor,
    primary: DecodeSource,
    input: &RawInput<'_>,
) -> Result<Sources, GateError> {
    let mut sources = Sources::default();

    if descriptor.reads_from(DecodeSource::Body, primary) {
        sources.body = Some(parse_body(input.body)?);
    }

    if descriptor.reads_from(DecodeSource::Query, primary) {
        let mut raw = parse_query(input.query.unwrap_or(""))?;
        for field in &descriptor.fields {
            let Some(value) = raw.remove(&field.name) else {
                continue;
            };
            if field.source.resolve(primary) != DecodeSource::Query {
                continue;
            }
            let coerced = field
                .field_type
                .coerce(&value)
                .ok_or_else(|| type_mismatch(field))?;
            sources.query.insert(field.name.clone(), coerced);
        }
        sources.undeclared = raw
            .into_iter()
            .map(|(name, value)| (name, Value::String(value)))
            .collect();
    }

    if let Some(body) = &sources.body {
        for field in &descriptor.fields {
            if field.source.resolve(primary) != DecodeSource::Body {
                continue;
            }
            if let NullableField::Present(value) = NullableField::from_slot(body.get(&field.name))
            {
                if !field.field_type.accepts(value) {
                    return Err(type_mismatch(field));
                }
            }
        }
    }

    Ok(sources)
}

fn parse_body(body: &[u8]) -> Result<Map<String, Value>, GateError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(GateError::structural(
            "Invalid data format: request body is empty",
        ));
    }

    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(GateError::structural(
            "Invalid data format: expected a JSON object",
        )),
        Err(e) => Err(GateError::structural(format!("Invalid data format: {}", e))),
    }
}

fn parse_query(query: &str) -> Result<HashMap<String, String>, GateError> {
    decode_query_string::<HashMap<String, String>>(query)
        .map_err(|_| GateError::structural("Invalid query parameters"))
}

fn type_mismatch(field: &FieldSpec) -> GateError {
    GateError::structural(format!(
        "Invalid data format: field '{}' must be {}",
        field.name,
        field.field_type.name()
    ))
}

/// Run every rule of every field, in declaration order
fn evaluate(
    descriptor: &SchemaDescriptor,
    primary: DecodeSource,
    sources: &Sources,
) -> ValidationErrors {
    let mut errors = ValidationErrors::new();

    for field in &descriptor.fields {
        match sources.slot(field.source.resolve(primary), &field.name) {
            NullableField::Present(value) => {
                for constraint in &field.constraints {
                    if !constraint.check(value) {
                        errors.push(
                            &field.name,
                            constraint.tag(),
                            messages::constraint(field, constraint),
                        );
                    }
                }
            }
            NullableField::Absent | NullableField::Null => {
                if field.required {
                    errors.push(&field.name, "required", messages::required(field));
                }
            }
        }
    }

    errors
}

/// One object holding every field from the source it resolves to
///
/// For body requests the whole body object is the base. For query requests the
/// undeclared query parameters are, so types with extra query fields still decode.
fn assemble(descriptor: &SchemaDescriptor, primary: DecodeSource, sources: Sources) -> Value {
    let Sources {
        body,
        query,
        undeclared,
    } = sources;

    // `other` holds the body only when it is not already the base object
    let (mut object, other) = match primary {
        DecodeSource::Body => (body.unwrap_or_default(), None),
        DecodeSource::Query => (undeclared, body),
    };

    for field in &descriptor.fields {
        let value = match (field.source.resolve(primary), primary) {
            (DecodeSource::Body, DecodeSource::Body) => continue,
            (DecodeSource::Query, _) => query.get(&field.name),
            (DecodeSource::Body, DecodeSource::Query) => {
                other.as_ref().and_then(|b| b.get(&field.name))
            }
        };
        match value {
            Some(value) => {
                object.insert(field.name.clone(), value.clone());
            }
            None => {
                object.remove(&field.name);
            }
        }
    }

    Value::Object(object)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::validation::schema::{CharClass, FieldSpec, FieldType};
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Pair {
        #[allow(dead_code)]
        a: String,
        #[allow(dead_code)]
        b: String,
    }

    impl Schema for Pair {
        fn descriptor() -> SchemaDescriptor {
            SchemaDescriptor::new("Pair")
                .field(FieldSpec::new("a").required().min_length(3))
                .field(FieldSpec::new("b").email())
        }
    }

    #[derive(Debug, Deserialize)]
    struct Update {
        #[serde(default)]
        bio: NullableField<String>,
    }

    impl Schema for Update {
        fn descriptor() -> SchemaDescriptor {
            SchemaDescriptor::new("Update").field(FieldSpec::new("bio").max_length(5))
        }
    }

    #[derive(Debug, Deserialize)]
    struct Listing {
        limit: Option<i64>,
        sort_by: Option<String>,
    }

    impl Schema for Listing {
        fn descriptor() -> SchemaDescriptor {
            SchemaDescriptor::new("Listing")
                .field(
                    FieldSpec::new("limit")
                        .of_type(FieldType::Integer)
                        .min_value(1.0)
                        .max_value(100.0),
                )
                .field(FieldSpec::new("sort_by").one_of(["username_asc", "username_desc"]))
        }
    }

    #[derive(Debug, Deserialize)]
    struct Secret {
        #[allow(dead_code)]
        password: String,
    }

    impl Schema for Secret {
        fn descriptor() -> SchemaDescriptor {
            SchemaDescriptor::new("Secret").field(
                FieldSpec::new("password")
                    .required()
                    .credential()
                    .min_length(8)
                    .contains_any(CharClass::Lowercase)
                    .contains_any(CharClass::Uppercase)
                    .contains_any(CharClass::Digit),
            )
        }
    }

    fn post(body: &Value) -> Vec<u8> {
        serde_json::to_vec(body).unwrap()
    }

    fn validation_messages(err: GateError) -> Vec<String> {
        match err {
            GateError::Validation(errors) => {
                errors.messages().into_iter().map(String::from).collect()
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_accumulates_one_error_per_field_in_order() {
        let body = post(&json!({ "a": "", "b": "not-an-email" }));
        let input = RawInput::new(&Method::POST).with_body(&body);

        let err = ValidationEngine::new().validate_as::<Pair>(&input).unwrap_err();
        assert_eq!(
            validation_messages(err),
            vec![
                "Field 'a': Minimum length: 3",
                "Field 'b': Invalid email address"
            ]
        );
    }

    #[test]
    fn test_required_reported_for_missing_and_null() {
        let engine = ValidationEngine::new();
        for body in [json!({ "b": "x@y.io" }), json!({ "a": null, "b": "x@y.io" })] {
            let bytes = post(&body);
            let input = RawInput::new(&Method::POST).with_body(&bytes);
            let err = engine.validate_as::<Pair>(&input).unwrap_err();
            assert_eq!(
                validation_messages(err),
                vec!["Field 'a': This field is required"]
            );
        }
    }

    #[test]
    fn test_credential_accumulates_every_failed_rule() {
        let body = post(&json!({ "password": "abc" }));
        let input = RawInput::new(&Method::POST).with_body(&body);

        let err = ValidationEngine::new().validate_as::<Secret>(&input).unwrap_err();
        assert_eq!(
            validation_messages(err),
            vec![
                "Password must contain at least 8 characters",
                "Password must contain at least one uppercase letter",
                "Password must contain at least one digit",
            ]
        );
    }

    #[test]
    fn test_nullable_constraints_only_apply_when_present() {
        let engine = ValidationEngine::new();

        let bytes = post(&json!({ "bio": null }));
        let input = RawInput::new(&Method::PATCH).with_body(&bytes);
        let update = engine.validate_as::<Update>(&input).unwrap();
        assert!(update.bio.is_null());

        let bytes = post(&json!({}));
        let input = RawInput::new(&Method::PATCH).with_body(&bytes);
        assert!(engine.validate_as::<Update>(&input).unwrap().bio.is_absent());

        let bytes = post(&json!({ "bio": "far too long" }));
        let input = RawInput::new(&Method::PATCH).with_body(&bytes);
        let err = engine.validate_as::<Update>(&input).unwrap_err();
        assert_eq!(
            validation_messages(err),
            vec!["Field 'bio': Maximum length: 5"]
        );
    }

    #[test]
    fn test_malformed_body_is_structural() {
        let input = RawInput::new(&Method::POST).with_body(b"{ not json");
        let err = ValidationEngine::new().validate_as::<Pair>(&input).unwrap_err();
        assert!(matches!(err, GateError::StructuralDecode { .. }));
        assert!(err.to_string().starts_with("Invalid data format"));
    }

    #[test]
    fn test_non_object_body_is_structural() {
        let input = RawInput::new(&Method::POST).with_body(b"[1, 2]");
        let err = ValidationEngine::new().validate_as::<Pair>(&input).unwrap_err();
        assert_eq!(err.to_string(), "Invalid data format: expected a JSON object");
    }

    #[test]
    fn test_empty_body_is_structural() {
        let input = RawInput::new(&Method::POST);
        let err = ValidationEngine::new().validate_as::<Pair>(&input).unwrap_err();
        assert!(matches!(err, GateError::StructuralDecode { .. }));
    }

    #[test]
    fn test_wrong_type_short_circuits_before_constraints() {
        let body = post(&json!({ "a": 42, "b": "not-an-email" }));
        let input = RawInput::new(&Method::POST).with_body(&body);
        let err = ValidationEngine::new().validate_as::<Pair>(&input).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid data format: field 'a' must be a string"
        );
    }

    #[test]
    fn test_get_reads_query_with_typed_coercion() {
        let engine = ValidationEngine::new();
        let input = RawInput::new(&Method::GET).with_query("limit=20&sort_by=username_asc");
        let listing = engine.validate_as::<Listing>(&input).unwrap();
        assert_eq!(listing.limit, Some(20));
        assert_eq!(listing.sort_by.as_deref(), Some("username_asc"));
    }

    #[test]
    fn test_get_query_constraints() {
        let engine = ValidationEngine::new();
        let input = RawInput::new(&Method::GET).with_query("limit=500&sort_by=email");
        let err = engine.validate_as::<Listing>(&input).unwrap_err();
        assert_eq!(
            validation_messages(err),
            vec![
                "Field 'limit': Maximum value: 100",
                "Field 'sort_by': Must be one of: username_asc, username_desc",
            ]
        );
    }

    #[test]
    fn test_get_query_type_mismatch_is_structural() {
        let input = RawInput::new(&Method::GET).with_query("limit=lots");
        let err = ValidationEngine::new()
            .validate_as::<Listing>(&input)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid data format: field 'limit' must be an integer"
        );
    }

    #[test]
    fn test_get_ignores_body() {
        let input = RawInput::new(&Method::GET).with_body(b"garbage");
        assert!(ValidationEngine::new().validate_as::<Listing>(&input).is_ok());
    }

    #[derive(Debug, Deserialize)]
    struct Revoke {
        token: String,
        reason: Option<String>,
    }

    impl Schema for Revoke {
        fn descriptor() -> SchemaDescriptor {
            SchemaDescriptor::new("Revoke")
                .field(FieldSpec::new("token").from_body().required())
                .field(FieldSpec::new("reason").max_length(20))
        }
    }

    #[derive(Debug, Deserialize)]
    struct Tagged {
        name: String,
        version: Option<i64>,
    }

    impl Schema for Tagged {
        fn descriptor() -> SchemaDescriptor {
            SchemaDescriptor::new("Tagged")
                .field(FieldSpec::new("name").required())
                .field(
                    FieldSpec::new("version")
                        .from_query()
                        .of_type(FieldType::Integer),
                )
        }
    }

    #[test]
    fn test_delete_keeps_body_sourced_field() {
        let body = post(&json!({ "token": "abc" }));
        let input = RawInput::new(&Method::DELETE)
            .with_query("reason=rotated")
            .with_body(&body);

        let revoke = ValidationEngine::new().validate_as::<Revoke>(&input).unwrap();
        assert_eq!(revoke.token, "abc");
        assert_eq!(revoke.reason.as_deref(), Some("rotated"));

        let schema = RegisteredSchema::of::<Revoke>();
        let input = RawInput::new(&Method::GET).with_body(&body);
        let data = ValidationEngine::new().validate(&schema, &input).unwrap();
        assert_eq!(data.downcast_ref::<Revoke>().unwrap().token, "abc");
    }

    #[test]
    fn test_body_sourced_field_on_get_is_required() {
        let input = RawInput::new(&Method::GET).with_body(br#"{ "other": 1 }"#);
        let err = ValidationEngine::new().validate_as::<Revoke>(&input).unwrap_err();
        assert_eq!(
            validation_messages(err),
            vec!["Field 'token': This field is required"]
        );
    }

    #[test]
    fn test_query_sourced_field_wins_over_body_key() {
        let body = post(&json!({ "name": "gate", "version": 1 }));
        let input = RawInput::new(&Method::POST)
            .with_query("version=7")
            .with_body(&body);
        let tagged = ValidationEngine::new().validate_as::<Tagged>(&input).unwrap();
        assert_eq!(tagged.name, "gate");
        assert_eq!(tagged.version, Some(7));

        let input = RawInput::new(&Method::POST).with_body(&body);
        let tagged = ValidationEngine::new().validate_as::<Tagged>(&input).unwrap();
        assert_eq!(tagged.version, None);
    }

    #[test]
    fn test_erased_validation_returns_instance() {
        let schema = RegisteredSchema::of::<Listing>();
        let input = RawInput::new(&Method::GET).with_query("limit=3");
        let data = ValidationEngine::new().validate(&schema, &input).unwrap();
        assert_eq!(data.downcast_ref::<Listing>().unwrap().limit, Some(3));
    }
}
