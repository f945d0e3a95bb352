//! Tri-state optional values for request schemas
//!
//! A JSON field can be missing, explicitly `null`, or carry a value. Plain
//! `Option<T>` folds the first two together, which loses the difference between
//! "leave it alone" and "clear it" on partial updates. [`NullableField`] keeps all
//! three apart.
//!
//! Struct fields should be declared with
//! `#[serde(default, skip_serializing_if = "NullableField::is_absent")]` so that a
//! missing key decodes to [`NullableField::Absent`] and an absent value is not
//! written back out.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// A value that is absent, explicitly null, or present
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NullableField<T> {
    /// The key was not in the input
    Absent,
    /// The key was present with a `null` value
    Null,
    /// The key was present with a value
    Present(T),
}

impl<T> Default for NullableField<T> {
    fn default() -> Self {
        NullableField::Absent
    }
}

impl<T> NullableField<T> {
    pub fn is_absent(&self) -> bool {
        matches!(self, NullableField::Absent)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, NullableField::Null)
    }

    /// True only when a value is present (the `Valid` flag of SQL-style nullables)
    pub fn is_valid(&self) -> bool {
        matches!(self, NullableField::Present(_))
    }

    /// True when the key was provided at all, null or not
    pub fn is_provided(&self) -> bool {
        !self.is_absent()
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            NullableField::Present(v) => Some(v),
            _ => None,
        }
    }

    pub fn into_value(self) -> Option<T> {
        match self {
            NullableField::Present(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_ref(&self) -> NullableField<&T> {
        match self {
            NullableField::Absent => NullableField::Absent,
            NullableField::Null => NullableField::Null,
            NullableField::Present(v) => NullableField::Present(v),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> NullableField<U> {
        match self {
            NullableField::Absent => NullableField::Absent,
            NullableField::Null => NullableField::Null,
            NullableField::Present(v) => NullableField::Present(f(v)),
        }
    }
}

impl<'a> NullableField<&'a Value> {
    /// Classify a slot looked up in a JSON object
    pub fn from_slot(slot: Option<&'a Value>) -> Self {
        match slot {
            None => NullableField::Absent,
            Some(Value::Null) => NullableField::Null,
            Some(v) => NullableField::Present(v),
        }
    }
}

impl<T> From<Option<T>> for NullableField<T> {
    /// `None` becomes an explicit null, since the caller did hand over a value
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => NullableField::Present(v),
            None => NullableField::Null,
        }
    }
}

impl<T: Serialize> Serialize for NullableField<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            NullableField::Present(v) => v.serialize(serializer),
            NullableField::Absent | NullableField::Null => serializer.serialize_none(),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for NullableField<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Only reached when the key exists; missing keys go through `Default`
        Option::<T>::deserialize(deserializer).map(NullableField::from)
    }
}
