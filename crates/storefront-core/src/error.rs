//! Error Types

use thiserror::Error;

use crate::form::FormField;

/// Result type alias for storefront domain operations
pub type Result<T> = std::result::Result<T, StorefrontError>;

/// Domain error types
#[derive(Error, Debug)]
pub enum StorefrontError {
    /// Package id is not part of the catalog
    #[error("Package not found: {0}")]
    PackageNotFound(String),

    /// Form field name not recognised
    #[error("Unknown form field: {0}")]
    UnknownField(String),

    /// Field cannot be written directly
    #[error("Field is not editable: {0}")]
    NotEditable(FormField),

    /// Form is missing required fields or holds invalid values
    #[error("Form incomplete: {}", FormField::join(.0))]
    Validation(Vec<FormField>),

    /// Return location could not be parsed
    #[error("Invalid location: {0}")]
    InvalidLocation(String),
}

impl StorefrontError {
    /// Convert to a user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            Self::PackageNotFound(_) => "This offer is not available.".into(),
            Self::Validation(fields) => {
                format!("Please complete the form: {}.", FormField::join(fields))
            }
            Self::UnknownField(name) => format!("'{name}' is not a form field."),
            Self::NotEditable(field) => format!("'{field}' is set by choosing an offer."),
            Self::InvalidLocation(_) => "This page address could not be read.".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_lists_fields() {
        let err = StorefrontError::Validation(vec![FormField::Email, FormField::Package]);
        assert_eq!(err.to_string(), "Form incomplete: email, package");
        assert!(err.user_message().contains("email, package"));
    }

    #[test]
    fn test_every_error_has_its_own_message() {
        let errors = [
            StorefrontError::PackageNotFound("gold".into()),
            StorefrontError::UnknownField("age".into()),
            StorefrontError::NotEditable(FormField::Package),
            StorefrontError::Validation(vec![FormField::Name]),
            StorefrontError::InvalidLocation("::".into()),
        ];
        let messages: std::collections::HashSet<String> =
            errors.iter().map(StorefrontError::user_message).collect();
        assert_eq!(messages.len(), errors.len());
        assert!(!messages.iter().any(|m| m.contains("unexpected")));
    }
}
