//! Error types for the volleyball store.
//!
//! This module defines all error kinds using `thiserror`. Every failure a
//! repository or service can surface maps to exactly one variant so the
//! HTTP layer can pick a status code without parsing messages.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Validation failed for {entity}.{field}: {reason}")]
    Validation {
        entity: &'static str,
        field: &'static str,
        reason: String,
    },

    #[error("Constraint violated: {constraint}: {detail}")]
    ConstraintViolation { constraint: String, detail: String },

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Cannot delete {entity} {id}: dependent {dependent} rows exist")]
    DependencyExists {
        entity: &'static str,
        id: String,
        dependent: &'static str,
    },

    #[error("Connection pool exhausted after {waited_secs}s")]
    PoolExhausted { waited_secs: u64 },

    #[error("Database connection unhealthy: {detail}")]
    ConnectionUnhealthy { detail: String },

    #[error("Timeout: {operation} exceeded {elapsed_secs}s")]
    Timeout {
        operation: &'static str,
        elapsed_secs: u64,
    },

    #[error("Internal storage error: {message}")]
    Internal { message: String },
}

impl StoreError {
    /// Create a validation error for a single entity field.
    pub fn validation(
        entity: &'static str,
        field: &'static str,
        reason: impl Into<String>,
    ) -> Self {
        Self::Validation {
            entity,
            field,
            reason: reason.into(),
        }
    }

    /// Create a constraint violation error.
    pub fn constraint(constraint: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::ConstraintViolation {
            constraint: constraint.into(),
            detail: detail.into(),
        }
    }

    /// Create a not-found error.
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Create a dependency-exists error (delete blocked by children).
    pub fn dependency_exists(
        entity: &'static str,
        id: impl Into<String>,
        dependent: &'static str,
    ) -> Self {
        Self::DependencyExists {
            entity,
            id: id.into(),
            dependent,
        }
    }

    /// Create a pool-exhausted error.
    pub fn pool_exhausted(waited_secs: u64) -> Self {
        Self::PoolExhausted { waited_secs }
    }

    /// Create a connection-unhealthy error.
    pub fn unhealthy(detail: impl Into<String>) -> Self {
        Self::ConnectionUnhealthy {
            detail: detail.into(),
        }
    }

    /// Create a timeout error.
    pub fn timeout(operation: &'static str, elapsed_secs: u64) -> Self {
        Self::Timeout {
            operation,
            elapsed_secs,
        }
    }

    /// Create an internal error. The message must already be sanitized;
    /// raw driver text belongs in the tracing output, not here.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Check if this error is transient and worth a caller-side retry.
    /// Integrity failures are never retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::PoolExhausted { .. } | Self::ConnectionUnhealthy { .. } | Self::Timeout { .. }
        )
    }
}

/// Convert sqlx errors to StoreError.
///
/// Unique and foreign-key violations become `ConstraintViolation` so the
/// database remains the final arbiter when concurrent writers race past the
/// repository pre-checks. Everything else is sanitized into `Internal`;
/// the raw driver error is logged here and not echoed to callers.
impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        use sqlx::error::ErrorKind;

        match err {
            sqlx::Error::Database(db_err) => {
                let constraint = db_err
                    .constraint()
                    .map(str::to_string)
                    .unwrap_or_else(|| "database constraint".to_string());
                match db_err.kind() {
                    ErrorKind::UniqueViolation => StoreError::constraint(
                        constraint,
                        "a row with the same unique key already exists",
                    ),
                    ErrorKind::ForeignKeyViolation => StoreError::constraint(
                        constraint,
                        "referenced row does not exist or is still referenced",
                    ),
                    ErrorKind::NotNullViolation => {
                        StoreError::constraint(constraint, "required column was null")
                    }
                    ErrorKind::CheckViolation => {
                        StoreError::constraint(constraint, "value rejected by check constraint")
                    }
                    _ => {
                        tracing::error!(error = %db_err, "Database error");
                        StoreError::internal("database rejected the statement")
                    }
                }
            }
            sqlx::Error::PoolTimedOut => StoreError::pool_exhausted(0),
            sqlx::Error::PoolClosed => StoreError::unhealthy("connection pool is closed"),
            sqlx::Error::Io(io_err) => {
                tracing::error!(error = %io_err, "Database I/O error");
                StoreError::unhealthy("I/O error talking to the database")
            }
            sqlx::Error::RowNotFound => {
                // Repositories use fetch_optional and map to NotFound with
                // the entity name; reaching this arm means a query bug.
                StoreError::internal("statement returned no rows")
            }
            other => {
                tracing::error!(error = %other, "Unexpected database error");
                StoreError::internal("unexpected database error")
            }
        }
    }
}

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
