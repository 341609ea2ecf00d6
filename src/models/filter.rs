//! Transaction query filter and cursor pages.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{BudgetId, Category, Transaction, TransactionType};

/// Composable filter for listing transactions.
///
/// All set criteria must hold for a transaction to match.
///
/// # Examples
///
/// ```
/// use spendline::models::{ExpenseCategory, NaiveDate, TransactionFilter};
///
/// let filter = TransactionFilter::new()
///     .date_range(
///         NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
///         NaiveDate::from_ymd_opt(2025, 1, 31).unwrap(),
///     )
///     .category(ExpenseCategory::FoodAndDining)
///     .search("lunch");
/// ```
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TransactionFilter {
    /// Start date (inclusive).
    pub date_from: Option<NaiveDate>,
    /// End date (inclusive).
    pub date_to: Option<NaiveDate>,
    /// Exact category.
    pub category: Option<Category>,
    /// Income or expense only.
    pub kind: Option<TransactionType>,
    /// Linked budget.
    pub linked_budget: Option<BudgetId>,
    /// Description substring (case-insensitive).
    pub search: Option<String>,
}

impl TransactionFilter {
    /// Creates an empty filter that matches all transactions.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts to transactions within the given date range (inclusive).
    #[inline]
    #[must_use]
    pub const fn date_range(mut self, from: NaiveDate, to: NaiveDate) -> Self {
        self.date_from = Some(from);
        self.date_to = Some(to);
        self
    }

    /// Restricts to one category.
    #[inline]
    #[must_use]
    pub fn category<C: Into<Category>>(mut self, category: C) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Restricts to income or expense.
    #[inline]
    #[must_use]
    pub const fn kind(mut self, kind: TransactionType) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Restricts to transactions linked to `budget`.
    #[inline]
    #[must_use]
    pub fn linked_budget(mut self, budget: BudgetId) -> Self {
        self.linked_budget = Some(budget);
        self
    }

    /// Restricts to descriptions containing `text` (case-insensitive).
    #[inline]
    #[must_use]
    pub fn search<T: Into<String>>(mut self, text: T) -> Self {
        self.search = Some(text.into());
        self
    }

    /// Returns `true` if the transaction satisfies all set criteria.
    #[inline]
    #[must_use]
    pub fn matches(&self, tx: &Transaction) -> bool {
        self.matches_date(tx)
            && self.category.is_none_or(|category| tx.category == category)
            && self.kind.is_none_or(|kind| tx.kind == kind)
            && self
                .linked_budget
                .as_ref()
                .is_none_or(|budget| tx.is_linked_to(budget))
            && self.matches_search(tx)
    }

    /// Checks date range criteria.
    fn matches_date(&self, tx: &Transaction) -> bool {
        self.date_from.is_none_or(|from| tx.date >= from)
            && self.date_to.is_none_or(|to| tx.date <= to)
    }

    /// Checks the description search.
    fn matches_search(&self, tx: &Transaction) -> bool {
        self.search.as_ref().is_none_or(|needle| {
            tx.description
                .to_lowercase()
                .contains(&needle.trim().to_lowercase())
        })
    }

    /// Query-string pairs understood by `GET /transactions`.
    #[inline]
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(from) = self.date_from {
            pairs.push(("from", from.to_string()));
        }
        if let Some(to) = self.date_to {
            pairs.push(("to", to.to_string()));
        }
        if let Some(category) = self.category {
            pairs.push(("category", category.name().to_owned()));
        }
        if let Some(kind) = self.kind {
            pairs.push(("type", kind.as_str().to_owned()));
        }
        if let Some(budget) = self.linked_budget.as_ref() {
            pairs.push(("budgetId", budget.to_string()));
        }
        if let Some(search) = self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            pairs.push(("search", search.to_owned()));
        }
        pairs
    }
}

/// One page of a cursor-paginated listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// Items on this page.
    pub items: Vec<T>,
    /// Cursor for the next page; `None` on the last page.
    #[serde(default)]
    pub next_cursor: Option<String>,
}

impl<T> Page<T> {
    /// Returns `true` if no further pages exist.
    #[inline]
    #[must_use]
    pub const fn is_last(&self) -> bool {
        self.next_cursor.is_none()
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::models::{ExpenseCategory, IncomeCategory, TransactionId};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, d).unwrap()
    }

    fn tx(id: &str, category: Category, description: &str, date: NaiveDate) -> Transaction {
        Transaction {
            id: TransactionId::from(id),
            amount: Decimal::TEN,
            kind: category.kind(),
            category,
            description: description.to_owned(),
            date,
            payment_method: None,
            linked_budget_id: None,
            is_recurring: false,
        }
    }

    #[test]
    fn empty_filter_matches_everything() {
        let t = tx("1", ExpenseCategory::Travel.into(), "Train", day(3));
        assert!(TransactionFilter::new().matches(&t));
        assert!(TransactionFilter::new().query_pairs().is_empty());
    }

    #[test]
    fn criteria_combine() {
        let lunch = tx("1", ExpenseCategory::FoodAndDining.into(), "Team Lunch", day(5));
        let salary = tx("2", IncomeCategory::Salary.into(), "Salary", day(31));
        let filter = TransactionFilter::new()
            .date_range(day(1), day(10))
            .kind(TransactionType::Expense)
            .search("LUNCH");
        assert!(filter.matches(&lunch));
        assert!(!filter.matches(&salary));
        let wrong_category = TransactionFilter::new().category(ExpenseCategory::Travel);
        assert!(!wrong_category.matches(&lunch));
    }

    #[test]
    fn linked_budget_filter() {
        let mut t = tx("1", ExpenseCategory::Housing.into(), "Rent", day(1));
        let filter = TransactionFilter::new().linked_budget(BudgetId::from("b-1"));
        assert!(!filter.matches(&t));
        t.linked_budget_id = Some(BudgetId::from("b-1"));
        assert!(filter.matches(&t));
    }

    #[test]
    fn query_pairs_use_wire_names() {
        let pairs = TransactionFilter::new()
            .date_range(day(1), day(31))
            .category(ExpenseCategory::FoodAndDining)
            .kind(TransactionType::Expense)
            .search("  ")
            .query_pairs();
        assert_eq!(
            pairs,
            vec![
                ("from", "2025-01-01".to_owned()),
                ("to", "2025-01-31".to_owned()),
                ("category", "Food & Dining".to_owned()),
                ("type", "expense".to_owned()),
            ]
        );
    }

    #[test]
    fn page_deserializes_without_cursor() {
        let page: Page<u8> = serde_json::from_str(r#"{"items":[1,2]}"#).unwrap();
        assert!(page.is_last());
        let page: Page<u8> = serde_json::from_str(r#"{"items":[],"nextCursor":"c2"}"#).unwrap();
        assert_eq!(page.next_cursor.as_deref(), Some("c2"));
    }
}
