//! Command-line surface of the `libris` binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use libris_core::FineStatus;

/// Libris circulation desk
#[derive(Debug, Parser)]
#[command(name = "libris")]
#[command(about = "Libris - library circulation desk", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Configuration file (TOML). Defaults to ./libris.toml when present.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Lend an item to a borrower
    Borrow { borrower_id: String, item_id: String },

    /// Check a loan back in, assessing a fine if it is late
    Return { loan_id: String },

    /// List every overdue loan, oldest due date first
    Overdue,

    /// Show a borrower's loans, newest first
    Loans { borrower_id: String },

    /// Show whether a borrower may take another item
    Eligibility { borrower_id: String },

    /// Preview the fine a loan would carry right now
    QuoteFine { loan_id: String },

    /// Assess the fine for a returned loan (idempotent)
    AssessFine { loan_id: String },

    /// Mark a pending fine as paid
    PayFine { fine_id: String },

    /// Waive a pending fine
    WaiveFine { fine_id: String, reason: String },

    /// List fines with a per-status summary
    Fines {
        /// Only show fines in this status
        #[arg(short, long)]
        status: Option<StatusFilter>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StatusFilter {
    Pending,
    Paid,
    Waived,
}

impl From<StatusFilter> for FineStatus {
    fn from(filter: StatusFilter) -> Self {
        match filter {
            StatusFilter::Pending => FineStatus::Pending,
            StatusFilter::Paid => FineStatus::Paid,
            StatusFilter::Waived => FineStatus::Waived,
        }
    }
}
