//! Budget spending aggregation.
//!
//! Everything here is a pure function of its inputs: spending is always
//! recomputed wholesale from the transaction list, never adjusted
//! incrementally, so running it twice over the same data gives the same
//! answer.

use core::cmp::Ordering;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::cache::BudgetCache;
use crate::models::{Budget, BudgetId, ExpenseCategory, Transaction};

/// Sum of the amounts of expense transactions linked to `budget` whose
/// date falls inside the budget window. Saturates at [`Decimal::MAX`].
#[inline]
#[must_use]
pub fn current_spending(budget: &Budget, transactions: &[Transaction]) -> Decimal {
    transactions
        .iter()
        .filter(|tx| tx.is_expense() && tx.is_linked_to(&budget.id) && budget.contains(tx.date))
        .map(|tx| tx.amount)
        .fold(Decimal::ZERO, Decimal::saturating_add)
}

/// Where a summary's spending figure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpendingSource {
    /// Computed by the server.
    Server,
    /// Computed locally from linked transactions.
    Client,
    /// Carried over from the last successful refresh.
    Cached,
}

/// Health of a budget relative to its ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BudgetStatus {
    /// Below the notification threshold.
    OnTrack,
    /// At or above the notification threshold but within the ceiling.
    NearLimit,
    /// Spending exceeds the ceiling.
    OverBudget,
}

/// A budget with its derived spending figures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BudgetSummary {
    /// The budget.
    pub budget: Budget,
    /// Spending counted against it.
    pub current_spending: Decimal,
    /// Provenance of `current_spending`.
    pub source: SpendingSource,
}

impl BudgetSummary {
    /// Pairs a budget with its spending.
    #[inline]
    #[must_use]
    pub const fn new(budget: Budget, current_spending: Decimal, source: SpendingSource) -> Self {
        Self {
            budget,
            current_spending,
            source,
        }
    }

    /// `amount - current_spending`; negative when over budget.
    #[inline]
    #[must_use]
    pub fn remaining_amount(&self) -> Decimal {
        self.budget.amount.saturating_sub(self.current_spending)
    }

    /// `current_spending / amount * 100`, uncapped. Zero for a zero
    /// ceiling.
    ///
    /// Figures too large for [`Decimal`] saturate at [`Decimal::MAX`] or
    /// [`Decimal::MIN`] instead of overflowing.
    #[inline]
    #[must_use]
    pub fn utilization_percentage(&self) -> Decimal {
        let amount = self.budget.amount;
        if amount.is_zero() {
            return Decimal::ZERO;
        }
        self.current_spending
            .checked_mul(Decimal::ONE_HUNDRED)
            .and_then(|scaled| scaled.checked_div(amount))
            .or_else(|| {
                self.current_spending
                    .checked_div(amount)
                    .map(|ratio| ratio.saturating_mul(Decimal::ONE_HUNDRED))
            })
            .unwrap_or_else(|| {
                if self.current_spending.is_sign_negative() == amount.is_sign_negative() {
                    Decimal::MAX
                } else {
                    Decimal::MIN
                }
            })
    }

    /// Utilization clamped to `cap` for progress bars.
    #[inline]
    #[must_use]
    pub fn display_percentage(&self, cap: Decimal) -> Decimal {
        self.utilization_percentage().min(cap)
    }

    /// Returns `true` if spending exceeds the ceiling.
    #[inline]
    #[must_use]
    pub fn is_over_budget(&self) -> bool {
        self.current_spending > self.budget.amount
    }

    /// Classifies the budget against its ceiling and notification
    /// threshold.
    #[inline]
    #[must_use]
    pub fn status(&self) -> BudgetStatus {
        if self.is_over_budget() {
            BudgetStatus::OverBudget
        } else if self.utilization_percentage()
            >= Decimal::from(self.budget.notifications.threshold)
        {
            BudgetStatus::NearLimit
        } else {
            BudgetStatus::OnTrack
        }
    }
}

/// Derives the spending of one budget.
///
/// The server value wins; otherwise the budget is aggregated locally when
/// `transactions` is available; otherwise the last cached value is
/// reused. Returns `None` when no source has a figure.
#[inline]
#[must_use]
pub fn summarize_one(
    budget: &Budget,
    transactions: Option<&[Transaction]>,
    cached: &BudgetCache,
) -> Option<BudgetSummary> {
    let (spending, source) = if let Some(server) = budget.current_spending {
        (server, SpendingSource::Server)
    } else if let Some(txs) = transactions {
        (current_spending(budget, txs), SpendingSource::Client)
    } else {
        (cached.spending_for(&budget.id)?, SpendingSource::Cached)
    };
    Some(BudgetSummary::new(budget.clone(), spending, source))
}

/// Derives the spending of every budget, or `None` if any budget has no
/// available figure.
#[inline]
#[must_use]
pub fn summarize(
    budgets: &[Budget],
    transactions: Option<&[Transaction]>,
    cached: &BudgetCache,
) -> Option<Vec<BudgetSummary>> {
    budgets
        .iter()
        .map(|budget| summarize_one(budget, transactions, cached))
        .collect()
}

/// Orders summaries for display: over-budget first, then by descending
/// utilization, then by category name, then by id.
#[inline]
pub fn sort_for_display(summaries: &mut [BudgetSummary]) {
    summaries.sort_by(display_order);
}

/// Comparison used by [`sort_for_display`].
fn display_order(left: &BudgetSummary, right: &BudgetSummary) -> Ordering {
    right
        .is_over_budget()
        .cmp(&left.is_over_budget())
        .then_with(|| {
            right
                .utilization_percentage()
                .cmp(&left.utilization_percentage())
        })
        .then_with(|| left.budget.category.name().cmp(right.budget.category.name()))
        .then_with(|| left.budget.id.cmp(&right.budget.id))
}

/// Dashboard totals across several budgets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BudgetTotals {
    /// Sum of ceilings.
    pub allocated: Decimal,
    /// Sum of spending.
    pub spent: Decimal,
    /// `allocated - spent`.
    pub remaining: Decimal,
    /// Number of budgets over their ceiling.
    pub over_budget: usize,
}

/// Sums ceilings and spending across `summaries`.
#[inline]
#[must_use]
pub fn totals(summaries: &[BudgetSummary]) -> BudgetTotals {
    let allocated = summaries
        .iter()
        .map(|s| s.budget.amount)
        .fold(Decimal::ZERO, Decimal::saturating_add);
    let spent = summaries
        .iter()
        .map(|s| s.current_spending)
        .fold(Decimal::ZERO, Decimal::saturating_add);
    BudgetTotals {
        allocated,
        spent,
        remaining: allocated.saturating_sub(spent),
        over_budget: summaries.iter().filter(|s| s.is_over_budget()).count(),
    }
}

/// Finds a budget that blocks a `category` budget over `[start, end]`.
///
/// A budget conflicts when it has the same category and is either active
/// on `today` or overlaps the requested window. `exclude` skips the
/// budget being edited.
#[inline]
#[must_use]
pub fn find_conflict<'budgets>(
    budgets: &'budgets [Budget],
    category: ExpenseCategory,
    (start, end): (NaiveDate, NaiveDate),
    today: NaiveDate,
    exclude: Option<&BudgetId>,
) -> Option<&'budgets Budget> {
    budgets.iter().find(|budget| {
        budget.category == category
            && exclude.is_none_or(|id| budget.id != *id)
            && (budget.is_active_on(today) || budget.overlaps(start, end))
    })
}
