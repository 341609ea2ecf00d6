//! Data models for ledger entities.
//!
//! Strongly-typed transactions and budgets, their create/edit payloads,
//! the fixed category vocabulary, newtype ID wrappers, and enumeration
//! types for constrained values.

mod budget;
mod category;
mod dates;
mod enums;
mod filter;
mod ids;
mod transaction;

pub use budget::{
    Budget, BudgetChanges, BudgetDraft, BudgetEdit, BudgetNotifications, DEFAULT_THRESHOLD,
    NewBudget,
};
pub use category::{Category, CategoryInfo, ExpenseCategory, IncomeCategory};
pub use chrono::NaiveDate;
pub use enums::{BudgetPeriod, TransactionType};
pub use filter::{Page, TransactionFilter};
pub use ids::{BudgetId, TransactionId};
pub use rust_decimal::Decimal;
pub use transaction::{
    NewTransaction, Transaction, TransactionChanges, TransactionDraft, TransactionEdit,
};
