//! Human-readable messages for failed rules
//!
//! Ordinary fields get `Field '<name>': <detail>`. Credential fields get a sentence
//! of their own per rule, phrased around the field label ("Password must ...").

use super::schema::{Constraint, FieldSpec};

/// Message for a required field that is absent or null
pub fn required(field: &FieldSpec) -> String {
    match &field.credential_label {
        Some(label) => format!("{} is required", label),
        None => format!("Field '{}': This field is required", field.name),
    }
}

/// Message for a failed constraint
pub fn constraint(field: &FieldSpec, constraint: &Constraint) -> String {
    match &field.credential_label {
        Some(label) => credential_detail(label, constraint),
        None => format!("Field '{}': {}", field.name, generic_detail(constraint)),
    }
}

fn generic_detail(constraint: &Constraint) -> String {
    match constraint {
        Constraint::MinLength(min) => format!("Minimum length: {}", min),
        Constraint::MaxLength(max) => format!("Maximum length: {}", max),
        Constraint::Alphanumeric => "Only letters and numbers are allowed".to_string(),
        Constraint::Email => "Invalid email address".to_string(),
        Constraint::ContainsAny(class) => format!("Must contain at least one {}", class.name()),
        Constraint::MinValue(min) => format!("Minimum value: {}", min),
        Constraint::MaxValue(max) => format!("Maximum value: {}", max),
        Constraint::OneOf(allowed) => format!("Must be one of: {}", allowed.join(", ")),
        Constraint::DateFormat(format) => format!("Must match date format {}", format),
    }
}

fn credential_detail(label: &str, constraint: &Constraint) -> String {
    match constraint {
        Constraint::MinLength(min) => {
            format!("{} must contain at least {} characters", label, min)
        }
        Constraint::MaxLength(max) => {
            format!("{} must contain no more than {} characters", label, max)
        }
        Constraint::ContainsAny(class) => {
            format!("{} must contain at least one {}", label, class.name())
        }
        other => format!("{} does not meet requirements: {}", label, other.tag()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::validation::schema::CharClass;

    #[test]
    fn test_generic_messages() {
        let f = FieldSpec::new("email");
        assert_eq!(required(&f), "Field 'email': This field is required");
        assert_eq!(
            constraint(&f, &Constraint::Email),
            "Field 'email': Invalid email address"
        );
        assert_eq!(
            constraint(&f, &Constraint::MinLength(3)),
            "Field 'email': Minimum length: 3"
        );
        assert_eq!(
            constraint(&f, &Constraint::OneOf(vec!["a".into(), "b".into()])),
            "Field 'email': Must be one of: a, b"
        );
    }

    #[test]
    fn test_credential_messages() {
        let f = FieldSpec::new("password").credential();
        assert_eq!(required(&f), "Password is required");
        assert_eq!(
            constraint(&f, &Constraint::MinLength(8)),
            "Password must contain at least 8 characters"
        );
        assert_eq!(
            constraint(&f, &Constraint::MaxLength(64)),
            "Password must contain no more than 64 characters"
        );
        assert_eq!(
            constraint(&f, &Constraint::ContainsAny(CharClass::Uppercase)),
            "Password must contain at least one uppercase letter"
        );
        assert_eq!(
            constraint(&f, &Constraint::ContainsAny(CharClass::Special)),
            "Password must contain at least one special character (!@#$%^&*())"
        );
    }

    #[test]
    fn test_credential_fallback_uses_tag() {
        let f = FieldSpec::new("password").credential();
        assert_eq!(
            constraint(&f, &Constraint::Alphanumeric),
            "Password does not meet requirements: alphanum"
        );
    }

    #[test]
    fn test_custom_credential_label() {
        let f = FieldSpec::new("pin").credential_labelled("PIN code");
        assert_eq!(
            constraint(&f, &Constraint::ContainsAny(CharClass::Digit)),
            "PIN code must contain at least one digit"
        );
    }
}
