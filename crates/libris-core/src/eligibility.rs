//! # Eligibility Checker
//!
//! Decides whether a borrower may take one more item.
//!
//! The active-loan count passed in must be counted fresh inside the same
//! transaction as the borrow. A cached or client-supplied count lets two
//! concurrent requests both claim the borrower's last slot.

use serde::Serialize;

use crate::error::CoreResult;
use crate::policy::{PolicyProfile, PolicyTable};
use crate::types::{Borrower, BorrowerClass};

/// `borrower.is_active AND active_loans < profile.max_active_loans`.
#[inline]
pub fn can_borrow_with(borrower: &Borrower, active_loans: u32, profile: &PolicyProfile) -> bool {
    borrower.is_active && active_loans < profile.max_active_loans()
}

/// Resolves the borrower's profile and applies [`can_borrow_with`].
pub fn can_borrow(
    policies: &PolicyTable,
    borrower: &Borrower,
    active_loans: u32,
) -> CoreResult<bool> {
    let profile = policies.resolve(borrower.class)?;
    Ok(can_borrow_with(borrower, active_loans, profile))
}

/// Snapshot of a borrower's standing, for front-desk display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Eligibility {
    pub borrower_id: String,
    pub class: BorrowerClass,
    pub is_active: bool,
    pub active_loans: u32,
    pub max_active_loans: u32,
    pub can_borrow: bool,
}

impl Eligibility {
    /// Builds the standing report for one borrower.
    pub fn evaluate(
        policies: &PolicyTable,
        borrower: &Borrower,
        active_loans: u32,
    ) -> CoreResult<Self> {
        let profile = policies.resolve(borrower.class)?;
        Ok(Eligibility {
            borrower_id: borrower.id.clone(),
            class: borrower.class,
            is_active: borrower.is_active,
            active_loans,
            max_active_loans: profile.max_active_loans(),
            can_borrow: can_borrow_with(borrower, active_loans, profile),
        })
    }

    /// Slots left before the limit (zero when inactive).
    pub fn remaining_slots(&self) -> u32 {
        if !self.is_active {
            return 0;
        }
        self.max_active_loans.saturating_sub(self.active_loans)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
