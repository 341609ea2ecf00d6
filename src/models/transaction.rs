//! Transaction model and its create/edit payloads.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{BudgetId, Category, TransactionId, TransactionType};
use crate::error::{Result, ValidationErrors};

/// An income or expense record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Server-assigned identifier.
    pub id: TransactionId,
    /// Non-negative amount in the user's currency.
    pub amount: Decimal,
    /// Income or expense. Immutable after creation.
    #[serde(rename = "type")]
    pub kind: TransactionType,
    /// Category from the vocabulary of `kind`.
    pub category: Category,
    /// User-facing label.
    pub description: String,
    /// Calendar date. Immutable after creation.
    #[serde(deserialize_with = "super::dates::deserialize")]
    pub date: NaiveDate,
    /// Optional payment method label.
    #[serde(default)]
    pub payment_method: Option<String>,
    /// Budget this expense counts against. Never set for income.
    #[serde(default)]
    pub linked_budget_id: Option<BudgetId>,
    /// Informational recurring flag.
    #[serde(default)]
    pub is_recurring: bool,
}

impl Transaction {
    /// Returns `true` for expenses.
    #[inline]
    #[must_use]
    pub fn is_expense(&self) -> bool {
        self.kind == TransactionType::Expense
    }

    /// Returns `true` if the transaction counts against `budget`.
    #[inline]
    #[must_use]
    pub fn is_linked_to(&self, budget: &BudgetId) -> bool {
        self.linked_budget_id.as_ref() == Some(budget)
    }
}

/// User input for a new transaction, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionDraft {
    /// Amount; must be greater than zero.
    pub amount: Decimal,
    /// Income or expense.
    pub kind: TransactionType,
    /// Category display name, matched against the vocabulary for `kind`.
    pub category: String,
    /// Label; must not be blank.
    pub description: String,
    /// Date; must not be in the future.
    pub date: NaiveDate,
    /// Optional payment method.
    pub payment_method: Option<String>,
    /// Informational recurring flag.
    pub is_recurring: bool,
}

impl TransactionDraft {
    /// Creates a draft with no payment method that is not recurring.
    #[inline]
    #[must_use]
    pub fn new<C: Into<String>, D: Into<String>>(
        kind: TransactionType,
        amount: Decimal,
        category: C,
        description: D,
        date: NaiveDate,
    ) -> Self {
        Self {
            amount,
            kind,
            category: category.into(),
            description: description.into(),
            date,
            payment_method: None,
            is_recurring: false,
        }
    }

    /// Sets the payment method.
    #[inline]
    #[must_use]
    pub fn payment_method<T: Into<String>>(mut self, method: T) -> Self {
        self.payment_method = Some(method.into());
        self
    }

    /// Sets the recurring flag.
    #[inline]
    #[must_use]
    pub const fn recurring(mut self, is_recurring: bool) -> Self {
        self.is_recurring = is_recurring;
        self
    }

    /// Validates every field and produces the create payload.
    ///
    /// The returned payload is unlinked; the ledger resolves the budget
    /// link afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::LedgerError::Validation`] listing every
    /// failed field.
    #[inline]
    pub fn validate(&self, today: NaiveDate) -> Result<NewTransaction> {
        let mut errors = ValidationErrors::new();
        check_amount(&mut errors, self.amount);
        let category = match Category::parse_for(self.kind, &self.category) {
            Ok(category) => Some(category),
            Err(message) => {
                errors.push("category", message);
                None
            }
        };
        check_description(&mut errors, &self.description);
        if self.date > today {
            errors.push("date", "date cannot be in the future");
        }
        match category {
            Some(category) if errors.is_empty() => Ok(NewTransaction {
                amount: self.amount,
                kind: self.kind,
                category,
                description: self.description.trim().to_owned(),
                date: self.date,
                payment_method: normalize_optional(self.payment_method.as_deref()),
                linked_budget_id: None,
                is_recurring: self.is_recurring,
            }),
            _ => Err(crate::error::LedgerError::Validation(errors)),
        }
    }
}

/// Validated create payload (`POST /transactions`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTransaction {
    /// Amount.
    pub amount: Decimal,
    /// Income or expense.
    #[serde(rename = "type")]
    pub kind: TransactionType,
    /// Category.
    pub category: Category,
    /// Label.
    pub description: String,
    /// Date.
    pub date: NaiveDate,
    /// Payment method.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
    /// Resolved budget link.
    #[serde(default)]
    pub linked_budget_id: Option<BudgetId>,
    /// Recurring flag.
    #[serde(default)]
    pub is_recurring: bool,
}

impl NewTransaction {
    /// Materializes the stored record once the server assigned an ID.
    #[inline]
    #[must_use]
    pub fn into_transaction(self, id: TransactionId) -> Transaction {
        Transaction {
            id,
            amount: self.amount,
            kind: self.kind,
            category: self.category,
            description: self.description,
            date: self.date,
            payment_method: self.payment_method,
            linked_budget_id: self.linked_budget_id,
            is_recurring: self.is_recurring,
        }
    }
}

/// User input for editing a transaction.
///
/// Type and date cannot be expressed: edits preserve both.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionEdit {
    /// New amount.
    pub amount: Option<Decimal>,
    /// New category display name.
    pub category: Option<String>,
    /// New label.
    pub description: Option<String>,
    /// New payment method.
    pub payment_method: Option<String>,
    /// New recurring flag.
    pub is_recurring: Option<bool>,
}

impl TransactionEdit {
    /// Creates an empty edit.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Changes the amount.
    #[inline]
    #[must_use]
    pub const fn amount(mut self, amount: Decimal) -> Self {
        self.amount = Some(amount);
        self
    }

    /// Changes the category.
    #[inline]
    #[must_use]
    pub fn category<T: Into<String>>(mut self, category: T) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Changes the description.
    #[inline]
    #[must_use]
    pub fn description<T: Into<String>>(mut self, description: T) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Changes the payment method.
    #[inline]
    #[must_use]
    pub fn payment_method<T: Into<String>>(mut self, method: T) -> Self {
        self.payment_method = Some(method.into());
        self
    }

    /// Changes the recurring flag.
    #[inline]
    #[must_use]
    pub const fn recurring(mut self, is_recurring: bool) -> Self {
        self.is_recurring = Some(is_recurring);
        self
    }

    /// Validates the edited fields against the original transaction type.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::LedgerError::Validation`] listing every
    /// failed field.
    #[inline]
    pub fn validate(&self, kind: TransactionType) -> Result<TransactionChanges> {
        let mut errors = ValidationErrors::new();
        if let Some(amount) = self.amount {
            check_amount(&mut errors, amount);
        }
        let category = self
            .category
            .as_deref()
            .and_then(|raw| match Category::parse_for(kind, raw) {
                Ok(category) => Some(category),
                Err(message) => {
                    errors.push("category", message);
                    None
                }
            });
        if let Some(description) = self.description.as_deref() {
            check_description(&mut errors, description);
        }
        let changes = TransactionChanges {
            amount: self.amount,
            category,
            description: self.description.as_deref().map(|text| text.trim().to_owned()),
            payment_method: self
                .payment_method
                .as_deref()
                .map(|method| method.trim().to_owned()),
            linked_budget_id: None,
            is_recurring: self.is_recurring,
        };
        errors.into_result(changes)
    }
}

/// Partial update payload (`PATCH /transactions/{id}`).
///
/// Absent fields are omitted from the JSON body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionChanges {
    /// New amount.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<Decimal>,
    /// New category.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    /// New label.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// New payment method; an empty string clears it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
    /// `Some(Some(id))` links, `Some(None)` unlinks (sent as `null`),
    /// `None` leaves the link untouched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linked_budget_id: Option<Option<BudgetId>>,
    /// New recurring flag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_recurring: Option<bool>,
}

impl TransactionChanges {
    /// A change that only clears the budget link.
    #[inline]
    #[must_use]
    pub const fn unlink() -> Self {
        Self {
            amount: None,
            category: None,
            description: None,
            payment_method: None,
            linked_budget_id: Some(None),
            is_recurring: None,
        }
    }

    /// Returns `true` if the change modifies nothing.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.amount.is_none()
            && self.category.is_none()
            && self.description.is_none()
            && self.payment_method.is_none()
            && self.linked_budget_id.is_none()
            && self.is_recurring.is_none()
    }

    /// Applies the change to a stored record.
    #[inline]
    pub fn apply_to(&self, tx: &mut Transaction) {
        if let Some(amount) = self.amount {
            tx.amount = amount;
        }
        if let Some(category) = self.category {
            tx.category = category;
        }
        if let Some(description) = self.description.as_ref() {
            tx.description.clone_from(description);
        }
        if let Some(method) = self.payment_method.as_deref() {
            tx.payment_method = normalize_optional(Some(method));
        }
        if let Some(link) = self.linked_budget_id.as_ref() {
            tx.linked_budget_id.clone_from(link);
        }
        if let Some(is_recurring) = self.is_recurring {
            tx.is_recurring = is_recurring;
        }
    }
}

/// Records an error unless `amount` is strictly positive.
fn check_amount(errors: &mut ValidationErrors, amount: Decimal) {
    if amount <= Decimal::ZERO {
        errors.push("amount", "amount must be greater than zero");
    }
}

/// Records an error if `description` is blank.
fn check_description(errors: &mut ValidationErrors, description: &str) {
    if description.trim().is_empty() {
        errors.push("description", "description is required");
    }
}

/// Trims an optional label, mapping blank to `None`.
fn normalize_optional(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|text| !text.is_empty())
        .map(ToOwned::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ExpenseCategory, IncomeCategory};

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn deserialize_transaction() {
        let json = r#"{
            "id": "tx-001",
            "amount": 45.99,
            "type": "expense",
            "category": "Food & Dining",
            "description": "Lunch",
            "date": "2025-01-05",
            "paymentMethod": "card",
            "linkedBudgetId": "b-1",
            "isRecurring": false
        }"#;
        let tx: Transaction = serde_json::from_str(json).unwrap();
        assert_eq!(tx.id, TransactionId::from("tx-001"));
        assert_eq!(tx.amount, Decimal::new(4599, 2));
        assert_eq!(tx.kind, TransactionType::Expense);
        assert_eq!(tx.category, Category::Expense(ExpenseCategory::FoodAndDining));
        assert_eq!(tx.date, day(2025, 1, 5));
        assert!(tx.is_linked_to(&BudgetId::from("b-1")));
    }

    #[test]
    fn deserialize_minimal_income() {
        let json = r#"{
            "id": "tx-002",
            "amount": 3000,
            "type": "income",
            "category": "Salary",
            "description": "January pay",
            "date": "2025-01-31T09:00:00Z"
        }"#;
        let tx: Transaction = serde_json::from_str(json).unwrap();
        assert!(!tx.is_expense());
        assert_eq!(tx.linked_budget_id, None);
        assert_eq!(tx.date, day(2025, 1, 31));
        assert!(!tx.is_recurring);
    }

    #[test]
    fn draft_validates_into_payload() {
        let draft = TransactionDraft::new(
            TransactionType::Expense,
            Decimal::new(4599, 2),
            "food & dining",
            "  Lunch ",
            day(2025, 1, 5),
        )
        .payment_method(" card ");
        let payload = draft.validate(day(2025, 1, 10)).unwrap();
        assert_eq!(payload.category, Category::Expense(ExpenseCategory::FoodAndDining));
        assert_eq!(payload.description, "Lunch");
        assert_eq!(payload.payment_method.as_deref(), Some("card"));
        assert_eq!(payload.linked_budget_id, None);
    }

    #[test]
    fn draft_reports_every_field() {
        let draft = TransactionDraft::new(
            TransactionType::Income,
            Decimal::ZERO,
            "Food & Dining",
            "   ",
            day(2025, 2, 1),
        );
        let err = draft.validate(day(2025, 1, 10)).unwrap_err();
        let fields = err.validation().unwrap();
        assert_eq!(fields.fields().len(), 4);
        assert_eq!(fields.message_for("amount"), Some("amount must be greater than zero"));
        assert!(fields.message_for("category").unwrap().contains("expense category"));
        assert_eq!(fields.message_for("description"), Some("description is required"));
        assert_eq!(fields.message_for("date"), Some("date cannot be in the future"));
    }

    #[test]
    fn draft_allows_today() {
        let today = day(2025, 1, 10);
        let draft = TransactionDraft::new(
            TransactionType::Income,
            Decimal::ONE,
            "Gifts",
            "Birthday",
            today,
        );
        assert!(draft.validate(today).is_ok());
    }

    #[test]
    fn edit_checks_category_against_original_type() {
        let edit = TransactionEdit::new().category("Transport");
        let err = edit.validate(TransactionType::Income).unwrap_err();
        assert!(err.validation().unwrap().message_for("category").is_some());

        let changes = edit.validate(TransactionType::Expense).unwrap();
        assert_eq!(changes.category, Some(Category::Expense(ExpenseCategory::Transport)));
        assert_eq!(changes.linked_budget_id, None);
    }

    #[test]
    fn edit_rejects_blank_description_and_zero_amount() {
        let edit = TransactionEdit::new().amount(Decimal::ZERO).description("");
        let err = edit.validate(TransactionType::Expense).unwrap_err();
        assert_eq!(err.validation().unwrap().fields().len(), 2);
    }

    #[test]
    fn changes_serialize_only_present_fields() {
        let changes = TransactionChanges {
            amount: Some(Decimal::new(1250, 2)),
            ..TransactionChanges::default()
        };
        let json = serde_json::to_value(&changes).unwrap();
        assert_eq!(json, serde_json::json!({ "amount": 12.5 }));
    }

    #[test]
    fn unlink_serializes_explicit_null() {
        let json = serde_json::to_value(TransactionChanges::unlink()).unwrap();
        assert_eq!(json, serde_json::json!({ "linkedBudgetId": null }));
        assert!(TransactionChanges::default().is_empty());
        assert!(!TransactionChanges::unlink().is_empty());
    }

    #[test]
    fn apply_changes_to_record() {
        let mut tx = NewTransaction {
            amount: Decimal::TEN,
            kind: TransactionType::Income,
            category: Category::Income(IncomeCategory::Gifts),
            description: "Gift".to_owned(),
            date: day(2025, 1, 1),
            payment_method: Some("cash".to_owned()),
            linked_budget_id: None,
            is_recurring: false,
        }
        .into_transaction(TransactionId::from("tx-9"));
        let changes = TransactionChanges {
            amount: Some(Decimal::ONE_HUNDRED),
            payment_method: Some(String::new()),
            is_recurring: Some(true),
            ..TransactionChanges::default()
        };
        changes.apply_to(&mut tx);
        assert_eq!(tx.amount, Decimal::ONE_HUNDRED);
        assert_eq!(tx.payment_method, None);
        assert!(tx.is_recurring);
        assert_eq!(tx.description, "Gift");
    }
}
