//! Request schemas of the users API

use gatehouse::prelude::*;

fn username_field() -> FieldSpec {
    FieldSpec::new("username")
        .min_length(3)
        .max_length(50)
        .alphanumeric()
}

fn password_field() -> FieldSpec {
    FieldSpec::new("password")
        .credential()
        .min_length(8)
        .max_length(72)
        .contains_any(CharClass::Lowercase)
        .contains_any(CharClass::Uppercase)
        .contains_any(CharClass::Digit)
        .contains_any(CharClass::Special)
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignIn {
    pub username: String,
    pub password: String,
}

impl Schema for SignIn {
    fn descriptor() -> SchemaDescriptor {
        SchemaDescriptor::new("SignIn")
            .field(FieldSpec::new("username").required())
            .field(FieldSpec::new("password").required().credential())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateUser {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub full_name: NullableField<String>,
    #[serde(default)]
    pub bio: NullableField<String>,
}

impl Schema for CreateUser {
    fn descriptor() -> SchemaDescriptor {
        SchemaDescriptor::new("CreateUser")
            .field(username_field().required())
            .field(FieldSpec::new("email").required().email())
            .field(password_field().required())
            .field(FieldSpec::new("full_name").max_length(100))
            .field(FieldSpec::new("bio").max_length(500))
    }
}

/// Partial update; absent fields are left alone, `null` clears optional ones
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateUser {
    #[serde(default)]
    pub username: NullableField<String>,
    #[serde(default)]
    pub email: NullableField<String>,
    #[serde(default)]
    pub password: NullableField<String>,
    #[serde(default)]
    pub full_name: NullableField<String>,
    #[serde(default)]
    pub bio: NullableField<String>,
}

impl Schema for UpdateUser {
    fn descriptor() -> SchemaDescriptor {
        SchemaDescriptor::new("UpdateUser")
            .field(username_field())
            .field(FieldSpec::new("email").email())
            .field(password_field())
            .field(FieldSpec::new("full_name").max_length(100))
            .field(FieldSpec::new("bio").max_length(500))
    }
}

pub const SORT_KEYS: [&str; 4] = [
    "username_asc",
    "username_desc",
    "created_at_asc",
    "created_at_desc",
];

pub const DEFAULT_LIMIT: i64 = 100;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListUsersQuery {
    pub username: Option<String>,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub bio: Option<String>,
    pub created_from: Option<String>,
    pub created_to: Option<String>,
    pub sort_by: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl Schema for ListUsersQuery {
    fn descriptor() -> SchemaDescriptor {
        SchemaDescriptor::new("ListUsersQuery")
            .field(FieldSpec::new("username"))
            .field(FieldSpec::new("email"))
            .field(FieldSpec::new("full_name"))
            .field(FieldSpec::new("bio"))
            .field(FieldSpec::new("created_from").date_format("%Y-%m-%d"))
            .field(FieldSpec::new("created_to").date_format("%Y-%m-%d"))
            .field(FieldSpec::new("sort_by").one_of(SORT_KEYS))
            .field(
                FieldSpec::new("limit")
                    .of_type(FieldType::Integer)
                    .min_value(1.0)
                    .max_value(1000.0),
            )
            .field(
                FieldSpec::new("offset")
                    .of_type(FieldType::Integer)
                    .min_value(0.0),
            )
    }
}
