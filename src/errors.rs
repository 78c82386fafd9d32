//! Error type shared by the registry services.
//!
//! Services return [`CoreError`]; the GraphQL layer turns it into an
//! `async_graphql::Error` carrying a `code` extension (see
//! `graphql::errors`).

use std::collections::BTreeMap;
use std::error::Error as StdError;
use std::fmt;

use sea_orm::{DbErr, TransactionError};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CoreErrorKind {
    NotFound,
    Validation,
    Conflict,
    Unauthorized,
    Internal,
}

impl CoreErrorKind {
    pub fn code(&self) -> &'static str {
        match self {
            CoreErrorKind::NotFound => "NOT_FOUND",
            CoreErrorKind::Validation => "VALIDATION_FAILED",
            CoreErrorKind::Conflict => "CONFLICT",
            CoreErrorKind::Unauthorized => "UNAUTHORIZED",
            CoreErrorKind::Internal => "INTERNAL_ERROR",
        }
    }
}

#[derive(Debug)]
pub struct CoreError {
    kind: CoreErrorKind,
    message: String,
    fields: Option<BTreeMap<String, String>>,
    source: Option<Box<dyn StdError + Send + Sync>>,
}

pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    pub fn new(kind: CoreErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            fields: None,
            source: None,
        }
    }

    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        let entity = entity.into();
        let id = id.into();
        let message = format!("{} with id '{}' not found", entity, id);

        let mut fields = BTreeMap::new();
        fields.insert("entity".to_string(), entity);
        fields.insert("id".to_string(), id);

        Self::new(CoreErrorKind::NotFound, message).with_fields(fields)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(CoreErrorKind::Validation, message)
    }

    /// Validation failure attributed to a single input field.
    pub fn invalid_field(field: &str, message: impl Into<String>) -> Self {
        let mut fields = BTreeMap::new();
        fields.insert("field".to_string(), field.to_string());
        Self::new(
            CoreErrorKind::Validation,
            format!("Validation failed for '{}': {}", field, message.into()),
        )
        .with_fields(fields)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(CoreErrorKind::Conflict, message)
    }

    pub fn unauthorized() -> Self {
        Self::new(CoreErrorKind::Unauthorized, "Unauthorized")
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(CoreErrorKind::Internal, message)
    }

    pub fn with_fields(mut self, fields: BTreeMap<String, String>) -> Self {
        self.fields = Some(fields);
        self
    }

    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    pub fn kind(&self) -> CoreErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn fields(&self) -> Option<&BTreeMap<String, String>> {
        self.fields.as_ref()
    }

    /// Errors a mutation records in its log instead of raising.
    pub fn is_domain_error(&self) -> bool {
        matches!(
            self.kind,
            CoreErrorKind::NotFound | CoreErrorKind::Validation | CoreErrorKind::Conflict
        )
    }
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl StdError for CoreError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|source| source.as_ref() as &(dyn StdError + 'static))
    }
}

impl From<DbErr> for CoreError {
    fn from(err: DbErr) -> Self {
        tracing::error!("Database error: {}", err);
        CoreError::internal("Internal database error").with_source(err)
    }
}

impl From<TransactionError<CoreError>> for CoreError {
    fn from(err: TransactionError<CoreError>) -> Self {
        match err {
            TransactionError::Connection(db_err) => CoreError::from(db_err),
            TransactionError::Transaction(core_err) => core_err,
        }
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::internal(format!("Serialization error: {}", err)).with_source(err)
    }
}

impl From<anyhow::Error> for CoreError {
    fn from(err: anyhow::Error) -> Self {
        CoreError::internal(format!("Unhandled error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_carries_entity_and_id() {
        let err = CoreError::not_found("Individual", "42");
        assert_eq!(err.kind(), CoreErrorKind::NotFound);
        assert!(err.message().contains("Individual"));
        let fields = err.fields().expect("fields");
        assert_eq!(fields.get("id").map(String::as_str), Some("42"));
    }

    #[test]
    fn test_unauthorized_message() {
        let err = CoreError::unauthorized();
        assert_eq!(err.to_string(), "Unauthorized");
        assert_eq!(err.kind().code(), "UNAUTHORIZED");
        assert!(!err.is_domain_error());
    }

    #[test]
    fn test_domain_error_classification() {
        assert!(CoreError::validation("bad").is_domain_error());
        assert!(CoreError::conflict("dup").is_domain_error());
        assert!(!CoreError::internal("boom").is_domain_error());
    }
}
