//! Change notifications published by the ledger.
//!
//! Frontends subscribe through [`crate::ledger::Ledger::subscribe`] and
//! re-render from the ledger's state when an event arrives. Events are
//! fire-and-forget: publishing with no subscriber is not an error.

use crate::models::{BudgetId, ExpenseCategory, TransactionId};

/// Default capacity of the broadcast channel.
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Something observable changed.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LedgerEvent {
    /// A transaction was saved.
    TransactionCreated {
        /// The new transaction.
        id: TransactionId,
    },
    /// A transaction was edited.
    TransactionUpdated {
        /// The edited transaction.
        id: TransactionId,
    },
    /// A transaction was removed.
    TransactionDeleted {
        /// The removed transaction.
        id: TransactionId,
    },
    /// An expense was saved with no budget covering its category and date.
    ///
    /// Advisory: the save itself succeeded.
    BudgetMissing {
        /// Category without a covering budget.
        category: ExpenseCategory,
        /// The transaction that was left unlinked.
        transaction: TransactionId,
    },
    /// A budget was created.
    BudgetCreated {
        /// The new budget.
        id: BudgetId,
    },
    /// A budget was edited.
    BudgetUpdated {
        /// The edited budget.
        id: BudgetId,
    },
    /// A budget was deleted and its transactions unlinked.
    BudgetDeleted {
        /// The deleted budget.
        id: BudgetId,
        /// Transactions whose link was cleared.
        unlinked: Vec<TransactionId>,
    },
    /// Cached budget spending was replaced.
    BudgetsRefreshed {
        /// Cache version now visible.
        version: u64,
    },
    /// Re-aggregation failed; cached spending is unchanged.
    RefreshFailed {
        /// Error description.
        message: String,
    },
}
