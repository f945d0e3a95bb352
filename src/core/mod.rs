//! Core module containing the request pipeline's building blocks

pub mod auth;
pub mod error;
pub mod extractors;
pub mod nullable;
pub mod path;
pub mod scope;
pub mod token;
pub mod validation;

pub use auth::{AuthError, AuthResult, Authenticator, CredentialExchange, extract_bearer};
pub use error::{ConfigError, FieldViolation, GateError, ValidationErrors};
pub use extractors::{Authenticated, RouteParams};
pub use nullable::NullableField;
pub use path::{InvalidParam, PathParams, PathTemplate};
pub use scope::RequestScope;
pub use token::{AuthClaims, JwtTokenService, SubjectId, TokenService};
pub use validation::{
    CharClass, Constraint, FieldSpec, FieldType, RawInput, RegisteredSchema, Schema,
    SchemaDescriptor, Validated, ValidationEngine,
};
