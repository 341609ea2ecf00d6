//! Deciding which budget an expense counts against.
//!
//! The index is rebuilt wholesale from the newest budget list for every
//! decision; it is never patched in place.

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::models::{Budget, BudgetId, Category, ExpenseCategory, Transaction};

/// One budget window in the index.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Window {
    /// Budget identifier.
    id: BudgetId,
    /// First covered day.
    start: NaiveDate,
    /// Last covered day.
    end: NaiveDate,
}

/// Budget windows grouped by category.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActiveBudgets {
    /// Windows per category.
    by_category: HashMap<ExpenseCategory, Vec<Window>>,
}

impl ActiveBudgets {
    /// Builds the index from a complete budget list.
    #[inline]
    #[must_use]
    pub fn from_budgets(budgets: &[Budget]) -> Self {
        let mut by_category: HashMap<ExpenseCategory, Vec<Window>> = HashMap::new();
        for budget in budgets {
            by_category.entry(budget.category).or_default().push(Window {
                id: budget.id.clone(),
                start: budget.start_date,
                end: budget.end_date,
            });
        }
        Self { by_category }
    }

    /// Returns `true` if no budget is indexed.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_category.is_empty()
    }

    /// The budget covering `category` on `date`.
    ///
    /// Several windows can only cover the same day when the server sent
    /// inconsistent data; the latest start date wins, then the smallest
    /// id.
    #[inline]
    #[must_use]
    pub fn covering(&self, category: ExpenseCategory, date: NaiveDate) -> Option<&BudgetId> {
        self.by_category
            .get(&category)?
            .iter()
            .filter(|window| window.start <= date && date <= window.end)
            .max_by(|left, right| {
                left.start
                    .cmp(&right.start)
                    .then_with(|| right.id.cmp(&left.id))
            })
            .map(|window| &window.id)
    }
}

/// Result of running the linking policy for one transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkOutcome {
    /// The expense counts against this budget.
    Linked(BudgetId),
    /// No budget covers the expense; it is saved unlinked.
    NoBudget {
        /// Category lacking a budget.
        category: ExpenseCategory,
    },
    /// Income never links to a budget.
    NotApplicable,
}

impl LinkOutcome {
    /// Value to store in `linkedBudgetId`.
    #[inline]
    #[must_use]
    pub fn budget_id(&self) -> Option<&BudgetId> {
        match *self {
            Self::Linked(ref id) => Some(id),
            Self::NoBudget { .. } | Self::NotApplicable => None,
        }
    }

    /// Consumes the outcome, returning the link to store.
    #[inline]
    #[must_use]
    pub fn into_budget_id(self) -> Option<BudgetId> {
        match self {
            Self::Linked(id) => Some(id),
            Self::NoBudget { .. } | Self::NotApplicable => None,
        }
    }
}

/// Links a transaction of `category` dated `date`.
#[inline]
#[must_use]
pub fn link_for(category: Category, date: NaiveDate, budgets: &ActiveBudgets) -> LinkOutcome {
    match category {
        Category::Income(_) => LinkOutcome::NotApplicable,
        Category::Expense(expense) => budgets.covering(expense, date).map_or(
            LinkOutcome::NoBudget { category: expense },
            |id| LinkOutcome::Linked(id.clone()),
        ),
    }
}

/// Re-links `tx` after an edit to `new_category`.
///
/// Returns `None` when the category is unchanged, in which case the
/// existing link is kept as is.
#[inline]
#[must_use]
pub fn relink_on_edit(
    tx: &Transaction,
    new_category: Option<Category>,
    budgets: &ActiveBudgets,
) -> Option<LinkOutcome> {
    new_category
        .filter(|category| *category != tx.category)
        .map(|category| link_for(category, tx.date, budgets))
}
