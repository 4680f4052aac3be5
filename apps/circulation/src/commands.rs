//! Subcommand handlers.
//!
//! Each handler calls one `LendingService` operation and renders the result
//! as a JSON value; `main` decides where it is printed.

use serde::Serialize;
use serde_json::{json, Value};
use tracing::debug;

use libris_db::{Database, LendingService};

use crate::cli::Command;
use crate::error::ApiError;

fn render<T: Serialize>(value: &T) -> Result<Value, ApiError> {
    serde_json::to_value(value).map_err(|e| ApiError::internal(format!("Failed to render: {e}")))
}

/// Runs one subcommand against the lending service.
pub async fn execute(
    command: Command,
    db: &Database,
    lending: &LendingService,
) -> Result<Value, ApiError> {
    debug!(?command, "Executing command");

    match command {
        Command::Borrow {
            borrower_id,
            item_id,
        } => render(&lending.borrow(&borrower_id, &item_id).await?),

        Command::Return { loan_id } => render(&lending.return_item(&loan_id).await?),

        Command::Overdue => {
            let loans = lending.list_overdue().await?;
            let rows: Vec<Value> = loans
                .iter()
                .map(|loan| {
                    Ok(json!({
                        "loan": render(loan)?,
                        "days_overdue": lending.engine().days_overdue(loan),
                    }))
                })
                .collect::<Result<_, ApiError>>()?;
            Ok(json!({ "count": rows.len(), "loans": rows }))
        }

        Command::Loans { borrower_id } => {
            render(&lending.loans_for_borrower(&borrower_id).await?)
        }

        Command::Eligibility { borrower_id } => {
            let eligibility = lending.eligibility(&borrower_id).await?;
            let mut value = render(&eligibility)?;
            value["remaining_slots"] = json!(eligibility.remaining_slots());
            Ok(value)
        }

        Command::QuoteFine { loan_id } => render(&lending.quote_fine(&loan_id).await?),

        Command::AssessFine { loan_id } => match lending.assess_fine(&loan_id).await? {
            Some(assessment) => render(&assessment),
            None => Ok(json!({ "loan_id": loan_id, "fine": null })),
        },

        Command::PayFine { fine_id } => render(&lending.pay_fine(&fine_id).await?),

        Command::WaiveFine { fine_id, reason } => {
            render(&lending.waive_fine(&fine_id, &reason).await?)
        }

        Command::Fines { status } => {
            let fines = db.fines().list(status.map(Into::into)).await?;
            let summary = lending.fine_summary().await?;
            Ok(json!({
                "summary": render(&summary)?,
                "fines": render(&fines)?,
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::StatusFilter;
    use crate::error::ErrorCode;
    use chrono::{Duration, TimeZone, Utc};
    use libris_core::{Borrower, BorrowerClass, Item, ManualClock, PolicyTable};
    use libris_db::DbConfig;
    use std::sync::Arc;

    struct Desk {
        db: Database,
        lending: LendingService,
        clock: Arc<ManualClock>,
    }

    impl Desk {
        async fn run(&self, command: Command) -> Result<Value, ApiError> {
            execute(command, &self.db, &self.lending).await
        }
    }

    async fn desk() -> Desk {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.borrowers()
            .insert(&Borrower {
                id: "STU-1".to_string(),
                name: "Juan Dela Cruz".to_string(),
                class: BorrowerClass::Standard,
                is_active: true,
            })
            .await
            .unwrap();
        db.items()
            .insert(&Item {
                id: "BK-1".to_string(),
                title: "Clean Code".to_string(),
                available_copies: 2,
                total_copies: 2,
            })
            .await
            .unwrap();

        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2026, 3, 2, 10, 0, 0).unwrap(),
        ));
        let lending = db.lending(PolicyTable::default(), clock.clone());
        Desk { db, lending, clock }
    }

    fn borrow() -> Command {
        Command::Borrow {
            borrower_id: "STU-1".to_string(),
            item_id: "BK-1".to_string(),
        }
    }

    #[tokio::test]
    async fn test_late_return_reports_fine() {
        let desk = desk().await;

        let out = desk.run(borrow()).await.unwrap();
        assert_eq!(out["loan"]["status"], "active");
        let loan_id = out["loan"]["id"].as_str().unwrap().to_string();

        desk.clock.advance(Duration::days(20));

        let overdue = desk.run(Command::Overdue).await.unwrap();
        assert_eq!(overdue["count"], 1);
        assert_eq!(overdue["loans"][0]["days_overdue"], 6);

        let out = desk
            .run(Command::Return {
                loan_id: loan_id.clone(),
            })
            .await
            .unwrap();
        assert_eq!(out["loan"]["status"], "returned");
        assert_eq!(out["fine"]["assessment"], "new");
        assert_eq!(out["fine"]["fine"]["amount"], 3000);

        let again = desk.run(Command::AssessFine { loan_id }).await.unwrap();
        assert_eq!(again["assessment"], "existing");

        let fines = desk
            .run(Command::Fines {
                status: Some(StatusFilter::Pending),
            })
            .await
            .unwrap();
        assert_eq!(fines["summary"]["pending"]["count"], 1);
        assert_eq!(fines["summary"]["pending"]["total"], 3000);
        assert_eq!(fines["fines"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_eligibility_counts_slots() {
        let desk = desk().await;
        desk.run(borrow()).await.unwrap();

        let out = desk
            .run(Command::Eligibility {
                borrower_id: "STU-1".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(out["active_loans"], 1);
        assert_eq!(out["can_borrow"], true);
        assert_eq!(out["remaining_slots"], 2);
    }

    #[tokio::test]
    async fn test_on_time_return_has_no_fine() {
        let desk = desk().await;
        let out = desk.run(borrow()).await.unwrap();
        let loan_id = out["loan"]["id"].as_str().unwrap().to_string();

        let out = desk
            .run(Command::AssessFine {
                loan_id: loan_id.clone(),
            })
            .await
            .unwrap();
        assert!(out["fine"].is_null());

        desk.clock.advance(Duration::days(3));
        let out = desk
            .run(Command::Return {
                loan_id: loan_id.clone(),
            })
            .await
            .unwrap();
        assert!(out["fine"].is_null());

        desk.clock.advance(Duration::days(30));
        let out = desk.run(Command::AssessFine { loan_id }).await.unwrap();
        assert!(out["fine"].is_null());
    }

    #[tokio::test]
    async fn test_rejections_carry_codes() {
        let desk = desk().await;

        let err = desk
            .run(Command::Loans {
                borrower_id: "STU-404".to_string(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);

        let err = desk
            .run(Command::Borrow {
                borrower_id: "".to_string(),
                item_id: "BK-1".to_string(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err = desk
            .run(Command::PayFine {
                fine_id: "F-404".to_string(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }
}
