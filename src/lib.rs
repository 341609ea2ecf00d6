//! Budget and transaction consistency engine for personal-finance clients.
//!
//! `spendline` keeps income/expense transactions and category budgets
//! consistent on the client side of a REST finance API:
//!
//! - new expenses are linked to the budget covering their category and
//!   date ([`linking`]);
//! - budget spending is re-aggregated after every mutation, preferring the
//!   server's figure and falling back on a local sum ([`aggregate`]);
//! - refreshes are version-stamped so a slow response never overwrites a
//!   newer one ([`cache`]);
//! - deleting a budget unlinks its transactions instead of deleting them.
//!
//! The entry point is [`ledger::Ledger`] (async) or
//! [`ledger::LedgerBlocking`], built over a [`backend`]: the HTTP clients
//! in `client`, or the local [`backend::InMemoryBackend`] and
//! `backend::FileBackend`.
//!
//! ```rust,no_run
//! # #[cfg(feature = "blocking")]
//! # fn demo() -> spendline::error::Result<()> {
//! use spendline::backend::InMemoryBackend;
//! use spendline::ledger::LedgerBlocking;
//! use spendline::models::{BudgetDraft, BudgetPeriod, Decimal, NaiveDate, TransactionDraft, TransactionType};
//!
//! let ledger = LedgerBlocking::builder().backend(InMemoryBackend::new()).build()?;
//! let january = |day| NaiveDate::from_ymd_opt(2025, 1, day).unwrap_or_default();
//! ledger.create_budget(&BudgetDraft::new(
//!     "Food & Dining",
//!     Decimal::new(500, 0),
//!     BudgetPeriod::Monthly,
//!     january(1),
//!     january(31),
//! ))?;
//! ledger.create_transaction(&TransactionDraft::new(
//!     TransactionType::Expense,
//!     Decimal::new(4599, 2),
//!     "Food & Dining",
//!     "Lunch",
//!     january(5),
//! ))?;
//! for summary in ledger.list_budgets(None)? {
//!     println!("{}: {} left", summary.budget.category, summary.remaining_amount());
//! }
//! # Ok(())
//! # }
//! ```

pub mod aggregate;
pub mod backend;
pub mod cache;
#[cfg(any(feature = "async", feature = "blocking"))]
pub mod client;
pub mod clock;
pub mod config;
pub mod currency;
pub mod error;
pub mod events;
pub mod ledger;
pub mod linking;
pub mod models;
#[cfg(feature = "async")]
pub mod poll;
