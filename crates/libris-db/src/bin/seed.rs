//! # Seed Data Generator
//!
//! Populates a development database with a small catalog, one borrower per
//! class, and a handful of backdated loans so that `libris overdue` and
//! `libris fines` have something to show.
//!
//! ## Usage
//! ```bash
//! # Seed ./libris_dev.db
//! cargo run -p libris-db --bin seed
//!
//! # Specify database path
//! cargo run -p libris-db --bin seed -- --db ./data/libris.db
//! ```
//!
//! ## Backdating
//! Loans go through the real `LendingService`, driven by a `ManualClock`
//! that is wound back before each borrow or return. Every row therefore
//! obeys the same rules as production data.

use chrono::{Duration, Utc};
use std::env;
use std::sync::Arc;

use libris_core::{Borrower, BorrowerClass, Item, ManualClock, PolicyTable};
use libris_db::{Database, DbConfig};

/// (id, title, copies)
const ITEMS: &[(&str, &str, u32)] = &[
    ("BK-0001", "The Rust Programming Language", 3),
    ("BK-0002", "Clean Code", 2),
    ("BK-0003", "Design Patterns", 1),
    ("BK-0004", "Introduction to Algorithms", 4),
    ("BK-0005", "The Pragmatic Programmer", 2),
    ("BK-0006", "Structure and Interpretation of Computer Programs", 1),
    ("BK-0007", "Database System Concepts", 2),
    ("BK-0008", "Operating System Concepts", 2),
];

/// (id, name, class)
const BORROWERS: &[(&str, &str, BorrowerClass)] = &[
    ("STU2024001", "Juan Dela Cruz", BorrowerClass::Standard),
    ("STU2024002", "Ana Reyes", BorrowerClass::Standard),
    ("FAC2024001", "Dr. Maria Santos", BorrowerClass::Privileged),
    ("LIB2024001", "Jose Garcia", BorrowerClass::Staff),
];

/// (borrower, item, borrowed N days ago, returned N days ago)
const LOANS: &[(&str, &str, i64, Option<i64>)] = &[
    // Overdue now: 14-day loan taken 25 days ago
    ("STU2024001", "BK-0001", 25, None),
    // Returned 6 days late, leaves a pending fine
    ("STU2024002", "BK-0002", 40, Some(20)),
    // Overdue but still inside the privileged grace period
    ("FAC2024001", "BK-0004", 32, None),
    // Well overdue privileged loan
    ("FAC2024001", "BK-0006", 55, None),
    // On time
    ("STU2024001", "BK-0005", 3, None),
    ("LIB2024001", "BK-0007", 10, None),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./libris_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Libris Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./libris_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Libris Seed Data Generator");
    println!("=============================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.items().list().await?;
    if !existing.is_empty() {
        println!("⚠ Database already has {} items", existing.len());
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    for (id, title, copies) in ITEMS {
        db.items()
            .insert(&Item {
                id: id.to_string(),
                title: title.to_string(),
                available_copies: *copies,
                total_copies: *copies,
            })
            .await?;
    }
    println!("✓ {} items", ITEMS.len());

    for (id, name, class) in BORROWERS {
        db.borrowers()
            .insert(&Borrower {
                id: id.to_string(),
                name: name.to_string(),
                class: *class,
                is_active: true,
            })
            .await?;
    }
    println!("✓ {} borrowers", BORROWERS.len());

    let now = Utc::now();
    let clock = Arc::new(ManualClock::new(now));
    let lending = db.lending(PolicyTable::default(), clock.clone());

    for (borrower_id, item_id, borrowed_days_ago, returned_days_ago) in LOANS {
        clock.set(now - Duration::days(*borrowed_days_ago));
        let loan = lending.borrow(borrower_id, item_id).await?.loan;

        if let Some(days_ago) = returned_days_ago {
            clock.set(now - Duration::days(*days_ago));
            let outcome = lending.return_item(&loan.id).await?;
            if let Some(fine) = outcome.fine {
                println!(
                    "  {} returned {} late, fined {}",
                    borrower_id,
                    item_id,
                    fine.fine().amount
                );
            }
        }
    }
    println!("✓ {} loans", LOANS.len());

    clock.set(now);
    let overdue = lending.list_overdue().await?;
    println!("  {} currently overdue", overdue.len());

    println!();
    println!("✓ Seed complete!");

    Ok(())
}
