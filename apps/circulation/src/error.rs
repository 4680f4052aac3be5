//! # API Error Type
//!
//! What the desk sees when a command fails.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in libris                                 │
//! │                                                                         │
//! │  libris borrow STU-1 BK-9                                              │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  LendingService                                                  │  │
//! │  │  Result<T, ServiceError>                                         │  │
//! │  │         │                                                        │  │
//! │  │         ├── Rejected(LoanError) ── kind() ──┐                   │  │
//! │  │         │                                   ▼                   │  │
//! │  │         └── Db(DbError) ───────────────► ApiError ─────────────►│  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │                                                                         │
//! │  stderr: { "code": "CONFLICT", "message": "Item BK-9 has no ..." }     │
//! │  exit status: 3                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;

use libris_core::{ErrorKind, LoanError};
use libris_db::{DbError, ServiceError};

/// Error printed as JSON when a command fails.
///
/// ```json
/// {
///   "code": "NOT_FOUND",
///   "message": "Borrower not found: STU-404"
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for scripts
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,
}

/// Error codes for command output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Borrower, item, loan or fine does not exist
    NotFound,

    /// A lending rule refused the request
    Conflict,

    /// Input validation failed
    ValidationError,

    /// Database operation failed
    DatabaseError,

    /// Broken invariant or unexpected failure
    Internal,
}

impl ErrorCode {
    /// Process exit status for this code.
    pub fn exit_status(&self) -> i32 {
        match self {
            ErrorCode::Internal => 1,
            ErrorCode::NotFound => 2,
            ErrorCode::Conflict => 3,
            ErrorCode::ValidationError => 4,
            ErrorCode::DatabaseError => 5,
        }
    }
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }
}

/// Maps lending refusals by category.
impl From<LoanError> for ApiError {
    fn from(err: LoanError) -> Self {
        let code = match err.kind() {
            ErrorKind::NotFound => ErrorCode::NotFound,
            ErrorKind::Conflict => ErrorCode::Conflict,
            ErrorKind::Invalid => ErrorCode::ValidationError,
            ErrorKind::Fatal => ErrorCode::Internal,
        };
        ApiError::new(code, err.to_string())
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } => ApiError::new(
                ErrorCode::Conflict,
                format!("{} '{}' already exists", field, value),
            ),
            DbError::ForeignKeyViolation { message } => {
                tracing::error!("Foreign key violation: {}", message);
                ApiError::new(ErrorCode::ValidationError, "Invalid reference")
            }
            DbError::ConnectionFailed(_) => {
                ApiError::new(ErrorCode::DatabaseError, "Database connection failed")
            }
            DbError::MigrationFailed(_) => {
                ApiError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::QueryFailed(e) => {
                tracing::error!("Database query failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::TransactionFailed(e) => {
                // Lock contention outlasted busy_timeout
                tracing::warn!("Transaction failed: {}", e);
                ApiError::new(
                    ErrorCode::DatabaseError,
                    "Database busy, the request was not applied",
                )
            }
            DbError::PoolExhausted => {
                ApiError::new(ErrorCode::DatabaseError, "Database pool exhausted")
            }
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Rejected(e) => e.into(),
            ServiceError::Db(e) => e.into(),
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

#[cfg(test)]
mod tests {
    use super::*;
    use libris_core::ValidationError;

    #[test]
    fn test_loan_errors_map_by_kind() {
        let cases = [
            (LoanError::BorrowerNotFound("STU-1".into()), ErrorCode::NotFound),
            (LoanError::FineNotFound("F-1".into()), ErrorCode::NotFound),
            (
                LoanError::Unavailable {
                    item_id: "BK-1".into(),
                },
                ErrorCode::Conflict,
            ),
            (LoanError::AlreadyReturned("L-1".into()), ErrorCode::Conflict),
            (
                LoanError::Validation(ValidationError::Required {
                    field: "borrower_id".into(),
                }),
                ErrorCode::ValidationError,
            ),
            (LoanError::invariant("copies above total"), ErrorCode::Internal),
        ];

        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).code, expected);
        }
    }

    #[test]
    fn test_service_error_unwraps() {
        let err = ServiceError::Rejected(LoanError::LimitReached {
            borrower_id: "STU-1".into(),
            active: 3,
            max: 3,
        });
        let api = ApiError::from(err);
        assert_eq!(api.code, ErrorCode::Conflict);
        assert!(api.message.contains("limit of 3"));

        let api = ApiError::from(ServiceError::Db(DbError::PoolExhausted));
        assert_eq!(api.code, ErrorCode::DatabaseError);
    }

    #[test]
    fn test_lock_contention_is_retryable_database_error() {
        let api = ApiError::from(DbError::TransactionFailed("database is locked".into()));
        assert_eq!(api.code, ErrorCode::DatabaseError);
        assert_eq!(api.message, "Database busy, the request was not applied");
        assert_eq!(api.code.exit_status(), 5);
    }

    #[test]
    fn test_serialized_shape() {
        let api = ApiError::not_found("Loan", "L-404");
        let json = serde_json::to_value(&api).unwrap();
        assert_eq!(json["code"], "NOT_FOUND");
        assert_eq!(json["message"], "Loan not found: L-404");
    }

    #[test]
    fn test_exit_status_distinct() {
        let codes = [
            ErrorCode::NotFound,
            ErrorCode::Conflict,
            ErrorCode::ValidationError,
            ErrorCode::DatabaseError,
            ErrorCode::Internal,
        ];
        let mut seen: Vec<i32> = codes.iter().map(|c| c.exit_status()).collect();
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), codes.len());
        assert!(!seen.contains(&0));
    }
}
