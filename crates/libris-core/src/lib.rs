//! # libris-core: Borrowing Policy & Loan Lifecycle for Libris
//!
//! This crate holds every lending decision the library makes: who may
//! borrow, for how long, and what a late return costs. Everything here is a
//! pure function of its inputs plus an injected [`clock::Clock`].
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Libris Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 libris (circulation CLI)                        │   │
//! │  │    borrow ──► return ──► overdue ──► assess-fine ──► pay-fine  │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │          libris-db (LendingService, repositories)               │   │
//! │  │   opens a transaction, loads a snapshot, applies the outcome    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              ★ libris-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │  policy   │  │   fine    │  │eligibility│  │ lifecycle │  │   │
//! │  │   │  Profile  │  │ grace +   │  │ limit +   │  │LoanEngine │  │   │
//! │  │   │  Table    │  │progressive│  │ active    │  │ outcomes  │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO WALL CLOCK • PURE FUNCTIONS        │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Borrower, Item, Loan, Fine)
//! - [`money`] - Integer-cent Money and basis-point multipliers
//! - [`policy`] - Policy profiles and the class → profile table
//! - [`fine`] - Fine calculator
//! - [`eligibility`] - Borrow/no-borrow decision
//! - [`lifecycle`] - Loan engine and its collaborator traits
//! - [`clock`] - Injectable time source
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use libris_core::fine::calculate_fine;
//! use libris_core::policy::PolicyTable;
//! use libris_core::types::BorrowerClass;
//!
//! let policies = PolicyTable::default();
//! let privileged = policies.resolve(BorrowerClass::Privileged).unwrap();
//!
//! // 20 days late, 3 days grace: 14 × 10.00 + 3 × 20.00
//! assert_eq!(calculate_fine(20, privileged).to_string(), "200.00");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod clock;
pub mod eligibility;
pub mod error;
pub mod fine;
pub mod lifecycle;
pub mod money;
pub mod policy;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use clock::{Clock, ManualClock, SystemClock};
pub use eligibility::Eligibility;
pub use error::{CoreResult, ErrorKind, LoanError, ValidationError};
pub use lifecycle::{
    BorrowOutcome, BorrowerDirectory, Catalog, FineAssessment, FineQuote, LoanEngine, LoanLedger,
    ReturnOutcome,
};
pub use money::{Money, RateMultiplier};
pub use policy::{PolicyProfile, PolicyTable};
pub use types::*;
