//! # Validation Module
//!
//! Input validation utilities for Libris.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: CLI / config loading                                         │
//! │  ├── Argument parsing (clap), TOML deserialization                     │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── ids, waiver reasons, policy profile numbers                       │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK constraints on copy counts                                  │
//! │  └── UNIQUE(fines.loan_id)                                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest accepted borrower / item identifier.
pub const MAX_ID_LENGTH: usize = 64;

/// Longest accepted waiver reason.
pub const MAX_REASON_LENGTH: usize = 500;

// =============================================================================
// Identifier Validators
// =============================================================================

/// Validates an opaque directory or catalog identifier.
///
/// ## Rules
/// - Must not be empty after trimming
/// - At most 64 characters
/// - Letters, digits, `-`, `_` and `.` only
///
/// ## Example
/// ```rust
/// use libris_core::validation::validate_entity_id;
///
/// assert!(validate_entity_id("borrower_id", "STU2024001").is_ok());
/// assert!(validate_entity_id("borrower_id", "").is_err());
/// assert!(validate_entity_id("item_id", "has space").is_err());
/// ```
pub fn validate_entity_id(field: &str, id: &str) -> ValidationResult<()> {
    let id = id.trim();

    if id.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if id.len() > MAX_ID_LENGTH {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_ID_LENGTH,
        });
    }

    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
    {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must contain only letters, numbers, '-', '_' and '.'".to_string(),
        });
    }

    Ok(())
}

/// Validates a UUID string (loan and fine ids).
///
/// ```rust
/// use libris_core::validation::validate_uuid;
///
/// assert!(validate_uuid("loan_id", "550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("loan_id", "not-a-uuid").is_err());
/// ```
pub fn validate_uuid(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    uuid::Uuid::parse_str(id.trim()).map_err(|_| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

/// Validates the reason given when waiving a fine.
pub fn validate_reason(reason: &str) -> ValidationResult<()> {
    let reason = reason.trim();

    if reason.is_empty() {
        return Err(ValidationError::Required {
            field: "reason".to_string(),
        });
    }

    if reason.len() > MAX_REASON_LENGTH {
        return Err(ValidationError::TooLong {
            field: "reason".to_string(),
            max: MAX_REASON_LENGTH,
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a count or duration that must be strictly positive.
pub fn validate_positive(field: &str, value: u32) -> ValidationResult<()> {
    if value == 0 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Validates a per-day penalty in cents (zero allowed).
pub fn validate_penalty_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: "base_daily_penalty".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }
    Ok(())
}

/// Validates a progressive multiplier in basis points.
///
/// ## Rules
/// - At least 10 000 (1.0×): a "progressive" rate never lowers the penalty
/// - At most 100 000 (10×)
pub fn validate_multiplier_bps(bps: u32) -> ValidationResult<()> {
    if !(10_000..=100_000).contains(&bps) {
        return Err(ValidationError::OutOfRange {
            field: "progressive_multiplier_bps".to_string(),
            min: 10_000,
            max: 100_000,
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
