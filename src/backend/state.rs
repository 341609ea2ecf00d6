//! Server-side semantics shared by the local backends.
//!
//! [`LedgerState`] behaves like the remote API: it assigns IDs, filters
//! and paginates listings, answers missing IDs with `NotFound`, and
//! computes budget spending on request. It never cascades: deleting a
//! budget leaves its transactions linked, exactly like the server.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::aggregate;
use crate::error::{LedgerError, Result};
use crate::models::{
    Budget, BudgetChanges, BudgetId, BudgetPeriod, NewBudget, NewTransaction, Page, Transaction,
    TransactionChanges, TransactionFilter, TransactionId,
};

/// Knobs controlling how a local backend answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Settings {
    /// Maximum transactions per page (at least 1).
    pub(crate) page_size: usize,
    /// Whether budget reads carry `current_spending`.
    pub(crate) server_spending: bool,
}

/// All stored entities.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct LedgerState {
    /// Stored transactions.
    pub(crate) transactions: Vec<Transaction>,
    /// Stored budgets, without spending.
    pub(crate) budgets: Vec<Budget>,
}

impl LedgerState {
    /// Filters, sorts (newest first, then by id) and pages transactions.
    pub(crate) fn list_transactions(
        &self,
        filter: &TransactionFilter,
        cursor: Option<&str>,
        settings: &Settings,
    ) -> Result<Page<Transaction>> {
        let offset = match cursor {
            None => 0,
            Some(raw) => raw.parse::<usize>().map_err(|err| LedgerError::Api {
                status: 400,
                message: format!("invalid cursor '{raw}': {err}"),
            })?,
        };
        let mut matching: Vec<Transaction> = self
            .transactions
            .iter()
            .filter(|tx| filter.matches(tx))
            .cloned()
            .collect();
        matching.sort_by(|left, right| {
            right
                .date
                .cmp(&left.date)
                .then_with(|| left.id.cmp(&right.id))
        });
        let total = matching.len();
        let items: Vec<Transaction> = matching
            .into_iter()
            .skip(offset)
            .take(settings.page_size.max(1))
            .collect();
        let consumed = offset.saturating_add(items.len());
        let next_cursor = (consumed < total).then(|| consumed.to_string());
        Ok(Page { items, next_cursor })
    }

    /// Looks up one transaction.
    pub(crate) fn transaction(&self, id: &TransactionId) -> Result<Transaction> {
        self.transactions
            .iter()
            .find(|tx| tx.id == *id)
            .cloned()
            .ok_or_else(|| LedgerError::not_found(id))
    }

    /// Stores a new transaction under a fresh ID.
    pub(crate) fn create_transaction(&mut self, payload: &NewTransaction) -> Transaction {
        let id = TransactionId::new(Uuid::new_v4().to_string());
        let tx = payload.clone().into_transaction(id);
        self.transactions.push(tx.clone());
        tx
    }

    /// Applies a partial update.
    pub(crate) fn update_transaction(
        &mut self,
        id: &TransactionId,
        changes: &TransactionChanges,
    ) -> Result<Transaction> {
        let tx = self
            .transactions
            .iter_mut()
            .find(|tx| tx.id == *id)
            .ok_or_else(|| LedgerError::not_found(id))?;
        changes.apply_to(tx);
        Ok(tx.clone())
    }

    /// Removes a transaction.
    pub(crate) fn delete_transaction(&mut self, id: &TransactionId) -> Result<()> {
        let before = self.transactions.len();
        self.transactions.retain(|tx| tx.id != *id);
        if self.transactions.len() == before {
            return Err(LedgerError::not_found(id));
        }
        Ok(())
    }

    /// Lists budgets, optionally by period.
    pub(crate) fn list_budgets(
        &self,
        period: Option<BudgetPeriod>,
        settings: &Settings,
    ) -> Vec<Budget> {
        self.budgets
            .iter()
            .filter(|budget| period.is_none_or(|wanted| budget.period == wanted))
            .map(|budget| self.present(budget, settings))
            .collect()
    }

    /// Looks up one budget.
    pub(crate) fn budget(&self, id: &BudgetId, settings: &Settings) -> Result<Budget> {
        self.budgets
            .iter()
            .find(|budget| budget.id == *id)
            .map(|budget| self.present(budget, settings))
            .ok_or_else(|| LedgerError::not_found(id))
    }

    /// Stores a new budget under a fresh ID.
    pub(crate) fn create_budget(&mut self, payload: &NewBudget, settings: &Settings) -> Budget {
        let id = BudgetId::new(Uuid::new_v4().to_string());
        let budget = payload.clone().into_budget(id);
        let presented = self.present(&budget, settings);
        self.budgets.push(budget);
        presented
    }

    /// Applies a partial update.
    pub(crate) fn update_budget(
        &mut self,
        id: &BudgetId,
        changes: &BudgetChanges,
        settings: &Settings,
    ) -> Result<Budget> {
        let budget = self
            .budgets
            .iter_mut()
            .find(|budget| budget.id == *id)
            .ok_or_else(|| LedgerError::not_found(id))?;
        changes.apply_to(budget);
        let updated = budget.clone();
        Ok(self.present(&updated, settings))
    }

    /// Removes a budget without touching its transactions.
    pub(crate) fn delete_budget(&mut self, id: &BudgetId) -> Result<()> {
        let before = self.budgets.len();
        self.budgets.retain(|budget| budget.id != *id);
        if self.budgets.len() == before {
            return Err(LedgerError::not_found(id));
        }
        Ok(())
    }

    /// Every budget with freshly computed spending.
    pub(crate) fn refresh_spending(&self) -> Vec<Budget> {
        self.budgets
            .iter()
            .map(|budget| self.with_spending(budget))
            .collect()
    }

    /// Renders a stored budget the way the server would return it.
    fn present(&self, budget: &Budget, settings: &Settings) -> Budget {
        if settings.server_spending {
            self.with_spending(budget)
        } else {
            let mut plain = budget.clone();
            plain.current_spending = None;
            plain
        }
    }

    /// Copies `budget` with `current_spending` computed from stored
    /// transactions.
    fn with_spending(&self, budget: &Budget) -> Budget {
        let mut out = budget.clone();
        out.current_spending = Some(aggregate::current_spending(budget, &self.transactions));
        out
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use super::*;
    use crate::models::{BudgetNotifications, Category, ExpenseCategory, TransactionType};

    const SETTINGS: Settings = Settings {
        page_size: 2,
        server_spending: false,
    };

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, d).unwrap()
    }

    fn payload(description: &str, date: NaiveDate, link: Option<&BudgetId>) -> NewTransaction {
        NewTransaction {
            amount: Decimal::new(1000, 2),
            kind: TransactionType::Expense,
            category: Category::Expense(ExpenseCategory::FoodAndDining),
            description: description.to_owned(),
            date,
            payment_method: None,
            linked_budget_id: link.cloned(),
            is_recurring: false,
        }
    }

    fn food_budget() -> NewBudget {
        NewBudget {
            category: ExpenseCategory::FoodAndDining,
            amount: Decimal::new(500, 0),
            period: BudgetPeriod::Monthly,
            start_date: day(1),
            end_date: day(31),
            notifications: BudgetNotifications::default(),
        }
    }

    #[test]
    fn pages_newest_first_until_exhausted() {
        let mut state = LedgerState::default();
        for d in 1..=5 {
            let _tx = state.create_transaction(&payload(&format!("t{d}"), day(d), None));
        }
        let filter = TransactionFilter::new();
        let first = state.list_transactions(&filter, None, &SETTINGS).unwrap();
        assert_eq!(first.items.len(), 2);
        assert_eq!(first.items[0].description, "t5");
        let cursor = first.next_cursor.unwrap();
        let second = state.list_transactions(&filter, Some(&cursor), &SETTINGS).unwrap();
        assert_eq!(second.items[0].description, "t3");
        let third = state
            .list_transactions(&filter, second.next_cursor.as_deref(), &SETTINGS)
            .unwrap();
        assert_eq!(third.items.len(), 1);
        assert!(third.is_last());
    }

    #[test]
    fn invalid_cursor_is_rejected() {
        let state = LedgerState::default();
        let err = state
            .list_transactions(&TransactionFilter::new(), Some("abc"), &SETTINGS)
            .unwrap_err();
        assert!(matches!(err, LedgerError::Api { status: 400, .. }));
    }

    #[test]
    fn missing_ids_are_not_found() {
        let mut state = LedgerState::default();
        let id = TransactionId::from("nope");
        assert!(state.transaction(&id).unwrap_err().is_not_found());
        assert!(state.delete_transaction(&id).unwrap_err().is_not_found());
        assert!(
            state
                .update_transaction(&id, &TransactionChanges::unlink())
                .unwrap_err()
                .is_not_found()
        );
        assert!(state.delete_budget(&BudgetId::from("nope")).unwrap_err().is_not_found());
    }

    #[test]
    fn budget_delete_does_not_cascade() {
        let mut state = LedgerState::default();
        let budget = state.create_budget(&food_budget(), &SETTINGS);
        let tx = state.create_transaction(&payload("Lunch", day(5), Some(&budget.id)));
        state.delete_budget(&budget.id).unwrap();
        assert!(state.transaction(&tx.id).unwrap().is_linked_to(&budget.id));
    }

    #[test]
    fn spending_only_when_requested() {
        let mut state = LedgerState::default();
        let budget = state.create_budget(&food_budget(), &SETTINGS);
        let _tx = state.create_transaction(&payload("Lunch", day(5), Some(&budget.id)));
        assert_eq!(state.budget(&budget.id, &SETTINGS).unwrap().current_spending, None);

        let server = Settings {
            server_spending: true,
            ..SETTINGS
        };
        let listed = state.list_budgets(Some(BudgetPeriod::Monthly), &server);
        assert_eq!(listed[0].current_spending, Some(Decimal::new(1000, 2)));
        assert!(state.list_budgets(Some(BudgetPeriod::Weekly), &server).is_empty());
        assert_eq!(state.refresh_spending()[0].current_spending, Some(Decimal::new(1000, 2)));
        assert_eq!(state.budgets[0].current_spending, None);
    }
}
