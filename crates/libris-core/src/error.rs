//! # Error Types
//!
//! Domain-specific error types for libris-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  libris-core errors (this file)                                        │
//! │  ├── LoanError        - Lending decisions that were refused            │
//! │  └── ValidationError  - Input / configuration validation failures      │
//! │                                                                         │
//! │  libris-db errors (separate crate)                                     │
//! │  ├── DbError          - Database operation failures                    │
//! │  └── ServiceError     - Rejected(LoanError) | Db(DbError)              │
//! │                                                                         │
//! │  CLI errors (in app)                                                   │
//! │  └── ApiError         - { code, message } printed as JSON              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Categories
//! Every `LoanError` belongs to one [`ErrorKind`]. `NotFound`, `Conflict` and
//! `Invalid` are expected business outcomes and are returned to the caller
//! as values. `Fatal` means corrupted state or a bug upstream: surface it,
//! never retry it.

use thiserror::Error;

// =============================================================================
// Error Kind
// =============================================================================

/// Response category of a [`LoanError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Borrower, item, loan or fine does not exist.
    NotFound,
    /// A business rule refused the operation (no copies, limit, double return).
    Conflict,
    /// Input failed validation.
    Invalid,
    /// Broken invariant or programming error.
    Fatal,
}

// =============================================================================
// Loan Error
// =============================================================================

/// Lending decisions that could not be granted.
#[derive(Debug, Error)]
pub enum LoanError {
    #[error("Borrower not found: {0}")]
    BorrowerNotFound(String),

    #[error("Item not found: {0}")]
    ItemNotFound(String),

    #[error("Loan not found: {0}")]
    LoanNotFound(String),

    #[error("Fine not found: {0}")]
    FineNotFound(String),

    /// No copy of the item is on the shelf.
    ///
    /// ## User Workflow
    /// ```text
    /// borrow(B-1, ITEM-9)
    ///      │
    ///      ▼
    /// item.available_copies == 0
    ///      │
    ///      ▼
    /// Unavailable { item_id: "ITEM-9" }
    /// ```
    #[error("Item {item_id} has no available copies")]
    Unavailable { item_id: String },

    /// Borrower already holds as many items as their class allows.
    #[error("Borrower {borrower_id} has reached the limit of {max} active loans")]
    LimitReached {
        borrower_id: String,
        active: u32,
        max: u32,
    },

    #[error("Borrower {0} is not active")]
    InactiveBorrower(String),

    #[error("Loan {0} has already been returned")]
    AlreadyReturned(String),

    /// Only pending fines can be paid or waived.
    #[error("Fine {fine_id} is {status}, only pending fines can be settled")]
    FineNotPending { fine_id: String, status: String },

    /// No policy profile exists for the class tag.
    #[error("Unknown borrower class: {0}")]
    UnknownClass(String),

    /// State that can only arise from corruption or a bug upstream.
    ///
    /// ## When This Occurs
    /// - A return would push availability above total copies
    /// - A stored loan breaks its own date invariants
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl LoanError {
    /// Returns the response category for this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            LoanError::BorrowerNotFound(_)
            | LoanError::ItemNotFound(_)
            | LoanError::LoanNotFound(_)
            | LoanError::FineNotFound(_) => ErrorKind::NotFound,
            LoanError::Unavailable { .. }
            | LoanError::LimitReached { .. }
            | LoanError::InactiveBorrower(_)
            | LoanError::AlreadyReturned(_)
            | LoanError::FineNotPending { .. } => ErrorKind::Conflict,
            LoanError::Validation(_) => ErrorKind::Invalid,
            LoanError::UnknownClass(_) | LoanError::InvariantViolation(_) => ErrorKind::Fatal,
        }
    }

    /// Whether this error signals corrupted state rather than a refusal.
    pub fn is_fatal(&self) -> bool {
        self.kind() == ErrorKind::Fatal
    }

    pub fn invariant(message: impl Into<String>) -> Self {
        LoanError::InvariantViolation(message.into())
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised for malformed ids and for policy profiles (including configuration
/// overrides) whose numbers make no sense.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: String },

    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    #[error("{field} must be positive")]
    MustBePositive { field: String },

    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with LoanError.
pub type CoreResult<T> = Result<T, LoanError>;

// =============================================================================
// Unit Tests
// =============================================================================
