use async_graphql::*;

use crate::errors::{CoreError, CoreErrorKind};

/// Structured error builder; every error carries a `code` extension.
pub struct StructuredError;

impl StructuredError {
    pub fn not_found(resource: &str, id: impl std::fmt::Display) -> Error {
        Error::new(format!("{} with id '{}' not found", resource, id)).extend_with(|_, e| {
            e.set("code", "NOT_FOUND");
            e.set("resource", resource);
        })
    }

    pub fn unauthorized() -> Error {
        Error::new("Unauthorized").extend_with(|_, e| {
            e.set("code", "UNAUTHORIZED");
        })
    }

    pub fn validation(field: &str, message: impl Into<String>) -> Error {
        Error::new(format!(
            "Validation failed for '{}': {}",
            field,
            message.into()
        ))
        .extend_with(|_, e| {
            e.set("code", "VALIDATION_FAILED");
            e.set("field", field);
        })
    }

    pub fn internal(message: impl Into<String>) -> Error {
        Error::new(message.into()).extend_with(|_, e| {
            e.set("code", "INTERNAL_ERROR");
        })
    }

    pub fn from_core_error(err: CoreError) -> Error {
        core_error_to_graphql_error(err)
    }
}

/// Maps a service error onto a GraphQL error with the matching `code` and
/// any structured fields as extensions. Internal errors keep their details
/// in the log only.
pub fn core_error_to_graphql_error(err: CoreError) -> Error {
    let kind = err.kind();
    let message = match kind {
        CoreErrorKind::Internal => {
            tracing::error!("Internal error: {}", err);
            "Internal server error".to_string()
        }
        _ => err.message().to_string(),
    };
    let fields = err.fields().cloned();

    Error::new(message).extend_with(move |_, e| {
        e.set("code", kind.code());
        if let Some(fields) = &fields {
            for (key, value) in fields {
                e.set(key.as_str(), value.as_str());
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(error: &Error) -> Option<String> {
        let extensions = error.extensions.as_ref()?;
        match extensions.get("code")? {
            Value::String(code) => Some(code.clone()),
            _ => None,
        }
    }

    #[test]
    fn test_unauthorized_code() {
        let error = core_error_to_graphql_error(CoreError::unauthorized());
        assert_eq!(error.message, "Unauthorized");
        assert_eq!(code(&error).as_deref(), Some("UNAUTHORIZED"));
    }

    #[test]
    fn test_validation_carries_field() {
        let error = core_error_to_graphql_error(CoreError::invalid_field("orderBy", "nope"));
        assert_eq!(code(&error).as_deref(), Some("VALIDATION_FAILED"));
        assert!(error.message.contains("orderBy"));
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let error = core_error_to_graphql_error(CoreError::internal("disk on fire"));
        assert_eq!(error.message, "Internal server error");
        assert_eq!(code(&error).as_deref(), Some("INTERNAL_ERROR"));
    }

    #[test]
    fn test_not_found_builder() {
        let error = StructuredError::not_found("Group", "abc");
        assert!(error.message.contains("Group"));
        assert_eq!(code(&error).as_deref(), Some("NOT_FOUND"));
    }
}
