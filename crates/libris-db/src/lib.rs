//! # libris-db: Database Layer for Libris
//!
//! SQLite persistence for the lending engine, and the transaction boundary
//! that applies its decisions.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Libris Data Flow                                 │
//! │                                                                         │
//! │  libris borrow STU2024001 BK-0001                                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     libris-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐  ┌────────────────┐  ┌───────────────┐     │   │
//! │  │   │   Database    │  │ LendingService │  │ Repositories  │     │   │
//! │  │   │   (pool.rs)   │  │  (service.rs)  │  │ item/borrower │     │   │
//! │  │   │  SqlitePool   │─►│ tx + snapshot  │─►│ loan/fine     │     │   │
//! │  │   └───────────────┘  │ + LoanEngine   │  └───────────────┘     │   │
//! │  │                      └────────────────┘                         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite (items, borrowers, loans, fines)                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Item, borrower, loan and fine repositories
//! - [`service`] - Transactional lending operations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use libris_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("./libris.db")).await?;
//! let lending = db.lending(PolicyTable::default(), Arc::new(SystemClock));
//!
//! let outcome = lending.borrow("STU2024001", "BK-0001").await?;
//! let overdue = lending.list_overdue().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod service;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use repository::{
    BorrowerRepository, FineRepository, FineSummary, FineTally, ItemRepository, LoanRepository,
};
pub use service::{LendingService, ServiceError, ServiceResult};
