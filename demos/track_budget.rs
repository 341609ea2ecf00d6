//! Walk through a month of spending against a food budget.
//!
//! Runs entirely in memory, no server needed.
//!
//! Run: `cargo run --example track_budget --features blocking`

use std::process::ExitCode;

use spendline::backend::InMemoryBackend;
use spendline::clock::FixedClock;
use spendline::currency::{CurrencyFormatter, CurrencyOption};
use spendline::ledger::LedgerBlocking;
use spendline::linking::LinkOutcome;
use spendline::models::{
    BudgetDraft, BudgetPeriod, Decimal, NaiveDate, TransactionDraft, TransactionEdit,
    TransactionType,
};

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn january(day: u32) -> Result<NaiveDate, Box<dyn std::error::Error>> {
    NaiveDate::from_ymd_opt(2025, 1, day).ok_or_else(|| format!("bad day {day}").into())
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let ledger = LedgerBlocking::builder()
        .backend(InMemoryBackend::new())
        .clock(FixedClock(january(10)?))
        .build()?;
    let money = CurrencyFormatter::new(CurrencyOption::default());

    let budget = ledger
        .create_budget(&BudgetDraft::new(
            "Food & Dining",
            Decimal::new(500, 0),
            BudgetPeriod::Monthly,
            january(1)?,
            january(31)?,
        ))?
        .budget;
    println!(
        "Budget {} for {}: {}",
        budget.id,
        budget.category,
        money.format_amount(budget.amount)
    );

    let mut lunch_id = None;
    for (amount, description, day) in [
        (Decimal::new(4599, 2), "Lunch", 5),
        (Decimal::new(470, 0), "Team dinner", 20),
    ] {
        let outcome = ledger.create_transaction(&TransactionDraft::new(
            TransactionType::Expense,
            amount,
            "Food & Dining",
            description,
            january(day)?,
        ))?;
        let linked = matches!(outcome.link, Some(LinkOutcome::Linked(_)));
        println!(
            "  + {description}: {} (linked: {linked})",
            money.format_amount(amount)
        );
        if lunch_id.is_none() {
            lunch_id = Some(outcome.transaction.id);
        }
    }
    report(&ledger, &money)?;

    if let Some(id) = lunch_id {
        println!("Moving lunch to Transport...");
        let _moved = ledger.update_transaction(&id, &TransactionEdit::new().category("Transport"))?;
        report(&ledger, &money)?;
    }

    let deletion = ledger.delete_budget(&budget.id)?;
    println!(
        "Deleted budget {}, unlinked {} transaction(s)",
        deletion.budget_id,
        deletion.unlinked_count()
    );
    Ok(())
}

fn report(
    ledger: &LedgerBlocking<InMemoryBackend>,
    money: &CurrencyFormatter,
) -> Result<(), Box<dyn std::error::Error>> {
    for summary in ledger.list_budgets(None)? {
        println!(
            "  {}: spent {} of {}, {} left ({}, {:?})",
            summary.budget.category,
            money.format_amount(summary.current_spending),
            money.format_amount(summary.budget.amount),
            money.format_amount(summary.remaining_amount()),
            money.format_percentage(summary.utilization_percentage()),
            summary.status()
        );
    }
    Ok(())
}
