//! # Repository Module
//!
//! Database repository implementations for Libris.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Two ways into the same SQL                           │
//! │                                                                         │
//! │  Plain reads / admin writes          Inside a LendingService decision  │
//! │  db.loans().for_borrower("STU-1")    LoanRepository::insert_in(&mut tx)│
//! │       │                                   │                             │
//! │       │ acquires from the pool            │ borrows the open tx         │
//! │       ▼                                   ▼                             │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │          associated fns taking &mut SqliteConnection            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                   │                                     │
//! │                                   ▼                                     │
//! │                            SQLite Database                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ItemRepository`] - Catalog items and guarded availability updates
//! - [`BorrowerRepository`] - Borrower directory and active-loan counts
//! - [`LoanRepository`] - Loan facts
//! - [`FineRepository`] - Fines and settlement

pub mod borrower;
pub mod fine;
pub mod item;
pub mod loan;

pub use borrower::BorrowerRepository;
pub use fine::{FineRepository, FineSummary, FineTally};
pub use item::ItemRepository;
pub use loan::LoanRepository;
