//! Input validation for contact submissions.
//!
//! The email rule is deliberately permissive: one `@`, a dot somewhere in
//! the domain part, and no whitespace. No further RFC checks are attempted.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Field, ValidationError};
use crate::model::{ContactForm, NewContactMessage};

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
});

/// Check a posted form and return the trimmed submission.
///
/// Fields are checked in order `name`, `email`, `message`; the first
/// violation wins.
pub fn validate(form: &ContactForm) -> Result<NewContactMessage, ValidationError> {
    let name = required(form.name.as_deref(), Field::Name)?;
    let email = required(form.email.as_deref(), Field::Email)?;
    let message = required(form.message.as_deref(), Field::Message)?;

    if !is_valid_email(email) {
        return Err(ValidationError::InvalidEmail);
    }

    Ok(NewContactMessage {
        name: name.to_string(),
        email: email.to_string(),
        message: message.to_string(),
    })
}

/// Permissive `local@domain.tld` shape check.
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

fn required(value: Option<&str>, field: Field) -> Result<&str, ValidationError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ValidationError::Missing(field)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_valid_form_and_trims() {
        let form = ContactForm::new("  Ada ", " ada@example.com", "hi\n");
        let new = validate(&form).unwrap();
        assert_eq!(new.name, "Ada");
        assert_eq!(new.email, "ada@example.com");
        assert_eq!(new.message, "hi");
    }

    #[test]
    fn missing_fields_reported_in_order() {
        let form = ContactForm::default();
        assert_eq!(validate(&form), Err(ValidationError::Missing(Field::Name)));

        let form = ContactForm {
            name: Some("Ada".into()),
            ..Default::default()
        };
        assert_eq!(validate(&form), Err(ValidationError::Missing(Field::Email)));

        let form = ContactForm::new("Ada", "ada@example.com", "   ");
        assert_eq!(
            validate(&form),
            Err(ValidationError::Missing(Field::Message))
        );
    }

    #[test]
    fn whitespace_only_is_missing() {
        let form = ContactForm::new("\t \n", "ada@example.com", "hi");
        assert_eq!(validate(&form), Err(ValidationError::Missing(Field::Name)));
    }

    #[test]
    fn rejects_bad_email_shapes() {
        for bad in [
            "not-an-email",
            "ada@example",
            "@example.com",
            "ada@.com",
            "ada @example.com",
            "ada@@example.com",
        ] {
            let form = ContactForm::new("Ada", bad, "hi");
            assert_eq!(
                validate(&form),
                Err(ValidationError::InvalidEmail),
                "expected {bad:?} to be rejected"
            );
        }
    }

    #[test]
    fn permissive_rule_accepts_odd_but_shaped_addresses() {
        assert!(is_valid_email("ADA@EXAMPLE.COM"));
        assert!(is_valid_email("a+b@sub.example.co.uk"));
        // Not RFC-valid, but the shape rule allows it.
        assert!(is_valid_email("a..b@x.y"));
    }
}
