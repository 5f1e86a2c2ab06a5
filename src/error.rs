use aws_sdk_dynamodb::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use thiserror::Error;

/// Message DynamoDB returns when the request was signed with a bad or expired key.
pub const INVALID_SECURITY_TOKEN: &str = "The security token included in the request is invalid.";

/// Error code DynamoDB returns for a table (or index) that does not exist.
pub const RESOURCE_NOT_FOUND: &str = "ResourceNotFoundException";

/// Errors surfaced by the table facade and the generic repository.
///
/// Every store-facing call is translated into one of these exactly once, at the
/// facade boundary. The codec and the filter builder never produce errors.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Table [{table}] does not exist or is not active")]
    TableUnavailable { table: String },

    #[error("Invalid AWS credentials while executing {operation} on table {table}")]
    InvalidCredentials { operation: String, table: String },

    #[error("Invalid argument: {message}")]
    Argument { message: String },

    #[error(
        "An error occurred while executing the {operation} operation on the table - {table} with the message - {message}"
    )]
    Store {
        operation: String,
        table: String,
        message: String,
    },
}

impl RepositoryError {
    pub fn argument(message: impl Into<String>) -> Self {
        RepositoryError::Argument {
            message: message.into(),
        }
    }

    /// Translates a raw store failure for `operation` on `table`.
    ///
    /// The credential check matches the store's exact error text.
    pub fn from_store(failure: StoreFailure, operation: &str, table: &str) -> Self {
        if failure.message == INVALID_SECURITY_TOKEN {
            RepositoryError::InvalidCredentials {
                operation: operation.to_string(),
                table: table.to_string(),
            }
        } else {
            RepositoryError::Store {
                operation: operation.to_string(),
                table: table.to_string(),
                message: failure.message,
            }
        }
    }

    pub fn is_table_unavailable(&self) -> bool {
        matches!(self, RepositoryError::TableUnavailable { .. })
    }

    pub fn is_invalid_credentials(&self) -> bool {
        matches!(self, RepositoryError::InvalidCredentials { .. })
    }
}

/// Result type alias for repository operations
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// A failure reported by the underlying store, before translation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct StoreFailure {
    pub code: Option<String>,
    pub message: String,
}

impl StoreFailure {
    pub fn new(code: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            code: code.map(str::to_owned),
            message: message.into(),
        }
    }

    pub fn is_resource_not_found(&self) -> bool {
        self.code.as_deref() == Some(RESOURCE_NOT_FOUND)
    }
}

impl<E, R> From<SdkError<E, R>> for StoreFailure
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    fn from(err: SdkError<E, R>) -> Self {
        let code = err.code().map(str::to_owned);
        let message = match err.message() {
            Some(message) => message.to_string(),
            None => DisplayErrorContext(&err).to_string(),
        };
        Self { code, message }
    }
}

impl From<aws_sdk_dynamodb::error::BuildError> for StoreFailure {
    fn from(err: aws_sdk_dynamodb::error::BuildError) -> Self {
        Self::new(None, format!("request builder error: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_token_becomes_invalid_credentials() {
        let failure = StoreFailure::new(Some("UnrecognizedClientException"), INVALID_SECURITY_TOKEN);
        let err = RepositoryError::from_store(failure, "PutItem", "User");
        assert!(err.is_invalid_credentials());
    }

    #[test]
    fn test_other_failures_keep_diagnostics() {
        let failure = StoreFailure::new(Some("ValidationException"), "One or more parameter values were invalid");
        let err = RepositoryError::from_store(failure, "GetItem", "Course");
        match &err {
            RepositoryError::Store {
                operation,
                table,
                message,
            } => {
                assert_eq!(operation, "GetItem");
                assert_eq!(table, "Course");
                assert!(message.contains("parameter values"));
            }
            other => panic!("Expected Store error, got {other:?}"),
        }
        assert!(err.to_string().contains("GetItem"));
    }

    #[test]
    fn test_resource_not_found_code() {
        let failure = StoreFailure::new(Some(RESOURCE_NOT_FOUND), "Requested resource not found");
        assert!(failure.is_resource_not_found());
        assert!(!StoreFailure::new(None, "boom").is_resource_not_found());
    }
}
