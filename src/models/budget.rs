//! Budget model and its create/edit payloads.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{BudgetId, BudgetPeriod, Category, ExpenseCategory, TransactionType};
use crate::error::{LedgerError, Result, ValidationErrors};

/// Default notification threshold, in percent.
pub const DEFAULT_THRESHOLD: u8 = 80;

/// Notification preferences of a budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetNotifications {
    /// Whether the user wants near-limit alerts.
    pub enabled: bool,
    /// Utilization percentage (0–100) at which the budget counts as near
    /// its limit.
    pub threshold: u8,
}

impl Default for BudgetNotifications {
    #[inline]
    fn default() -> Self {
        Self {
            enabled: true,
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

/// A spending ceiling for one expense category over a date window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Budget {
    /// Server-assigned identifier.
    pub id: BudgetId,
    /// Covered expense category.
    pub category: ExpenseCategory,
    /// Positive ceiling.
    pub amount: Decimal,
    /// Informational grouping.
    pub period: BudgetPeriod,
    /// First covered day (inclusive).
    #[serde(deserialize_with = "super::dates::deserialize")]
    pub start_date: NaiveDate,
    /// Last covered day (inclusive), strictly after `start_date`.
    #[serde(deserialize_with = "super::dates::deserialize")]
    pub end_date: NaiveDate,
    /// Notification preferences.
    #[serde(default)]
    pub notifications: BudgetNotifications,
    /// Spending computed by the server, when it sent one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_spending: Option<Decimal>,
}

impl Budget {
    /// Returns `true` if `date` falls inside `[start_date, end_date]`.
    #[inline]
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    /// Returns `true` if the budget is in effect on `today`.
    #[inline]
    #[must_use]
    pub fn is_active_on(&self, today: NaiveDate) -> bool {
        self.contains(today)
    }

    /// Returns `true` if the window shares at least one day with
    /// `[start, end]`.
    #[inline]
    #[must_use]
    pub fn overlaps(&self, start: NaiveDate, end: NaiveDate) -> bool {
        self.start_date <= end && start <= self.end_date
    }
}

/// User input for a new budget, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BudgetDraft {
    /// Category display name; must be an expense category.
    pub category: String,
    /// Ceiling; must be greater than zero.
    pub amount: Decimal,
    /// Informational grouping.
    pub period: BudgetPeriod,
    /// First covered day.
    pub start_date: NaiveDate,
    /// Last covered day; must be after `start_date`.
    pub end_date: NaiveDate,
    /// Notification preferences.
    pub notifications: BudgetNotifications,
}

impl BudgetDraft {
    /// Creates a draft with default notifications.
    #[inline]
    #[must_use]
    pub fn new<C: Into<String>>(
        category: C,
        amount: Decimal,
        period: BudgetPeriod,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Self {
        Self {
            category: category.into(),
            amount,
            period,
            start_date,
            end_date,
            notifications: BudgetNotifications::default(),
        }
    }

    /// Sets notification preferences.
    #[inline]
    #[must_use]
    pub const fn notifications(mut self, notifications: BudgetNotifications) -> Self {
        self.notifications = notifications;
        self
    }

    /// Validates every field and produces the create payload.
    ///
    /// Uniqueness against other budgets is checked by the ledger, which
    /// knows the current budget list.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Validation`] listing every failed field.
    #[inline]
    pub fn validate(&self) -> Result<NewBudget> {
        let mut errors = ValidationErrors::new();
        let category = match Category::parse_for(TransactionType::Expense, &self.category) {
            Ok(category) => category.as_expense(),
            Err(message) => {
                errors.push("category", message);
                None
            }
        };
        check_amount(&mut errors, self.amount);
        check_window(&mut errors, self.start_date, self.end_date);
        check_threshold(&mut errors, self.notifications.threshold);
        match category {
            Some(category) if errors.is_empty() => Ok(NewBudget {
                category,
                amount: self.amount,
                period: self.period,
                start_date: self.start_date,
                end_date: self.end_date,
                notifications: self.notifications,
            }),
            _ => Err(LedgerError::Validation(errors)),
        }
    }
}

/// Validated create payload (`POST /budgets`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBudget {
    /// Covered expense category.
    pub category: ExpenseCategory,
    /// Ceiling.
    pub amount: Decimal,
    /// Informational grouping.
    pub period: BudgetPeriod,
    /// First covered day.
    pub start_date: NaiveDate,
    /// Last covered day.
    pub end_date: NaiveDate,
    /// Notification preferences.
    #[serde(default)]
    pub notifications: BudgetNotifications,
}

impl NewBudget {
    /// Materializes the stored record once the server assigned an ID.
    #[inline]
    #[must_use]
    pub fn into_budget(self, id: BudgetId) -> Budget {
        Budget {
            id,
            category: self.category,
            amount: self.amount,
            period: self.period,
            start_date: self.start_date,
            end_date: self.end_date,
            notifications: self.notifications,
            current_spending: None,
        }
    }
}

/// User input for editing a budget. Category and period are fixed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BudgetEdit {
    /// New ceiling.
    pub amount: Option<Decimal>,
    /// New first covered day.
    pub start_date: Option<NaiveDate>,
    /// New last covered day.
    pub end_date: Option<NaiveDate>,
    /// New notification preferences.
    pub notifications: Option<BudgetNotifications>,
}

impl BudgetEdit {
    /// Creates an empty edit.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Changes the ceiling.
    #[inline]
    #[must_use]
    pub const fn amount(mut self, amount: Decimal) -> Self {
        self.amount = Some(amount);
        self
    }

    /// Changes the window.
    #[inline]
    #[must_use]
    pub const fn window(mut self, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        self.start_date = Some(start_date);
        self.end_date = Some(end_date);
        self
    }

    /// Changes the first covered day.
    #[inline]
    #[must_use]
    pub const fn start_date(mut self, start_date: NaiveDate) -> Self {
        self.start_date = Some(start_date);
        self
    }

    /// Changes the last covered day.
    #[inline]
    #[must_use]
    pub const fn end_date(mut self, end_date: NaiveDate) -> Self {
        self.end_date = Some(end_date);
        self
    }

    /// Changes notification preferences.
    #[inline]
    #[must_use]
    pub const fn notifications(mut self, notifications: BudgetNotifications) -> Self {
        self.notifications = Some(notifications);
        self
    }

    /// Validates the edit merged onto `current`.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Validation`] listing every failed field.
    #[inline]
    pub fn validate(&self, current: &Budget) -> Result<BudgetChanges> {
        let mut errors = ValidationErrors::new();
        if let Some(amount) = self.amount {
            check_amount(&mut errors, amount);
        }
        check_window(
            &mut errors,
            self.start_date.unwrap_or(current.start_date),
            self.end_date.unwrap_or(current.end_date),
        );
        if let Some(notifications) = self.notifications {
            check_threshold(&mut errors, notifications.threshold);
        }
        errors.into_result(BudgetChanges {
            amount: self.amount,
            start_date: self.start_date,
            end_date: self.end_date,
            notifications: self.notifications,
        })
    }
}

/// Partial update payload (`PATCH /budgets/{id}`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetChanges {
    /// New ceiling.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<Decimal>,
    /// New first covered day.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    /// New last covered day.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    /// New notification preferences.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notifications: Option<BudgetNotifications>,
}

impl BudgetChanges {
    /// Returns the window `budget` would have after applying the change.
    #[inline]
    #[must_use]
    pub fn window_for(&self, budget: &Budget) -> (NaiveDate, NaiveDate) {
        (
            self.start_date.unwrap_or(budget.start_date),
            self.end_date.unwrap_or(budget.end_date),
        )
    }

    /// Applies the change to a stored record.
    #[inline]
    pub fn apply_to(&self, budget: &mut Budget) {
        if let Some(amount) = self.amount {
            budget.amount = amount;
        }
        let (start, end) = self.window_for(budget);
        budget.start_date = start;
        budget.end_date = end;
        if let Some(notifications) = self.notifications {
            budget.notifications = notifications;
        }
    }
}

/// Records an error unless `amount` is strictly positive.
fn check_amount(errors: &mut ValidationErrors, amount: Decimal) {
    if amount <= Decimal::ZERO {
        errors.push("amount", "amount must be greater than zero");
    }
}

/// Records an error unless `start < end`.
fn check_window(errors: &mut ValidationErrors, start: NaiveDate, end: NaiveDate) {
    if start >= end {
        errors.push("endDate", "end date must be after start date");
    }
}

/// Records an error if the threshold exceeds 100 percent.
fn check_threshold(errors: &mut ValidationErrors, threshold: u8) {
    if threshold > 100 {
        errors.push("threshold", "threshold must be between 0 and 100");
    }
}
