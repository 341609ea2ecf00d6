//! Fixed category vocabulary with display metadata.
//!
//! Expense and income categories are disjoint closed enumerations. User
//! input is matched against them once at the boundary; past that point a
//! misspelt category cannot exist.

use core::fmt;

use serde::{Deserialize, Serialize};

use super::TransactionType;

/// Display metadata attached to every category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct CategoryInfo {
    /// Display name, also used as the wire value.
    pub name: &'static str,
    /// Icon identifier understood by the frontends.
    pub icon: &'static str,
    /// Accent color as `#RRGGBB`.
    pub color: &'static str,
}

/// Defines a category enum whose variants carry name, icon and color.
macro_rules! define_vocabulary {
    (
        $(#[$meta:meta])*
        $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident => ($label:literal, $icon:literal, $color:literal),
            )+
        }
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        pub enum $name {
            $(
                $(#[$variant_meta])*
                #[serde(rename = $label)]
                $variant,
            )+
        }

        impl $name {
            /// Every category of this vocabulary, in display order.
            pub const ALL: &'static [Self] = &[$(Self::$variant,)+];

            /// Display name (also the wire value).
            #[inline]
            #[must_use]
            pub const fn name(self) -> &'static str {
                match self {
                    $(Self::$variant => $label,)+
                }
            }

            /// Icon and color metadata.
            #[inline]
            #[must_use]
            pub const fn info(self) -> CategoryInfo {
                match self {
                    $(Self::$variant => CategoryInfo {
                        name: $label,
                        icon: $icon,
                        color: $color,
                    },)+
                }
            }

            /// Looks up a category by display name, ignoring ASCII case and
            /// surrounding whitespace.
            #[inline]
            #[must_use]
            pub fn from_name(raw: &str) -> Option<Self> {
                let wanted = raw.trim();
                Self::ALL
                    .iter()
                    .copied()
                    .find(|category| category.name().eq_ignore_ascii_case(wanted))
            }
        }

        impl fmt::Display for $name {
            #[inline]
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.name())
            }
        }
    };
}

define_vocabulary! {
    /// Categories available to expense transactions and budgets.
    ExpenseCategory {
        /// Groceries, restaurants, coffee.
        FoodAndDining => ("Food & Dining", "restaurant", "#FF6B6B"),
        /// Fuel, transit, ride hailing.
        Transport => ("Transport", "car", "#4ECDC4"),
        /// General retail.
        Shopping => ("Shopping", "shopping-bag", "#45B7D1"),
        /// Movies, games, events.
        Entertainment => ("Entertainment", "film", "#96CEB4"),
        /// Recurring household bills.
        BillsAndUtilities => ("Bills & Utilities", "receipt", "#FFEAA7"),
        /// Medical costs.
        Healthcare => ("Healthcare", "medkit", "#DDA0DD"),
        /// Tuition, courses, books.
        Education => ("Education", "school", "#98D8C8"),
        /// Trips and lodging.
        Travel => ("Travel", "airplane", "#F7DC6F"),
        /// Rent, mortgage, repairs.
        Housing => ("Housing", "home", "#BB8FCE"),
        /// Grooming and wellness.
        PersonalCare => ("Personal Care", "cut", "#85C1E9"),
        /// Anything else.
        OtherExpenses => ("Other Expenses", "ellipsis-horizontal", "#AEB6BF"),
    }
}

define_vocabulary! {
    /// Categories available to income transactions.
    IncomeCategory {
        /// Regular employment income.
        Salary => ("Salary", "briefcase", "#2ECC71"),
        /// Contract work.
        Freelance => ("Freelance", "laptop", "#27AE60"),
        /// Business revenue.
        Business => ("Business", "business", "#1ABC9C"),
        /// Dividends, interest, capital gains.
        Investments => ("Investments", "trending-up", "#16A085"),
        /// Gifts received.
        Gifts => ("Gifts", "gift", "#F39C12"),
        /// Rent received.
        RentalIncome => ("Rental Income", "key", "#D35400"),
        /// Anything else.
        OtherIncome => ("Other Income", "cash", "#7F8C8D"),
    }
}

/// A category from either vocabulary.
///
/// Serialized as its bare display name; the vocabularies are disjoint so
/// the name alone identifies the variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Category {
    /// An expense category.
    Expense(ExpenseCategory),
    /// An income category.
    Income(IncomeCategory),
}

impl Category {
    /// Transaction type whose vocabulary contains this category.
    #[inline]
    #[must_use]
    pub const fn kind(self) -> TransactionType {
        match self {
            Self::Expense(_) => TransactionType::Expense,
            Self::Income(_) => TransactionType::Income,
        }
    }

    /// Display name.
    #[inline]
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Expense(category) => category.name(),
            Self::Income(category) => category.name(),
        }
    }

    /// Icon and color metadata.
    #[inline]
    #[must_use]
    pub const fn info(self) -> CategoryInfo {
        match self {
            Self::Expense(category) => category.info(),
            Self::Income(category) => category.info(),
        }
    }

    /// Returns the expense category, or `None` for income.
    #[inline]
    #[must_use]
    pub const fn as_expense(self) -> Option<ExpenseCategory> {
        match self {
            Self::Expense(category) => Some(category),
            Self::Income(_) => None,
        }
    }

    /// Looks up a name in both vocabularies.
    #[inline]
    #[must_use]
    pub fn from_name(raw: &str) -> Option<Self> {
        ExpenseCategory::from_name(raw)
            .map(Self::Expense)
            .or_else(|| IncomeCategory::from_name(raw).map(Self::Income))
    }

    /// Parses `raw` against the vocabulary for `kind`.
    ///
    /// # Errors
    ///
    /// Returns a user-facing message when `raw` is blank, unknown, or
    /// belongs to the other vocabulary.
    #[inline]
    pub fn parse_for(kind: TransactionType, raw: &str) -> Result<Self, String> {
        if raw.trim().is_empty() {
            return Err("category is required".to_owned());
        }
        match Self::from_name(raw) {
            Some(category) if category.kind() == kind => Ok(category),
            Some(category) => Err(format!(
                "'{}' is an {} category, not an {kind} category",
                category.name(),
                category.kind()
            )),
            None => Err(format!("'{}' is not a valid {kind} category", raw.trim())),
        }
    }

    /// Every category of the vocabulary for `kind`, in display order.
    #[inline]
    #[must_use]
    pub fn vocabulary(kind: TransactionType) -> Vec<Self> {
        match kind {
            TransactionType::Expense => ExpenseCategory::ALL
                .iter()
                .copied()
                .map(Self::Expense)
                .collect(),
            TransactionType::Income => IncomeCategory::ALL
                .iter()
                .copied()
                .map(Self::Income)
                .collect(),
        }
    }
}

impl From<ExpenseCategory> for Category {
    #[inline]
    fn from(value: ExpenseCategory) -> Self {
        Self::Expense(value)
    }
}

impl From<IncomeCategory> for Category {
    #[inline]
    fn from(value: IncomeCategory) -> Self {
        Self::Income(value)
    }
}

impl fmt::Display for Category {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn vocabularies_are_disjoint() {
        let expense: HashSet<&str> = ExpenseCategory::ALL.iter().map(|c| c.name()).collect();
        for income in IncomeCategory::ALL {
            assert!(!expense.contains(income.name()), "{income} in both");
        }
    }

    #[test]
    fn category_serializes_as_display_name() {
        let json = serde_json::to_string(&Category::Expense(ExpenseCategory::FoodAndDining))
            .unwrap();
        assert_eq!(json, r#""Food & Dining""#);
        let back: Category = serde_json::from_str(r#""Salary""#).unwrap();
        assert_eq!(back, Category::Income(IncomeCategory::Salary));
    }

    #[test]
    fn unknown_category_does_not_deserialize() {
        assert!(serde_json::from_str::<Category>(r#""Food and Dining""#).is_err());
        assert!(serde_json::from_str::<ExpenseCategory>(r#""Salary""#).is_err());
    }

    #[test]
    fn from_name_ignores_case_and_padding() {
        assert_eq!(
            ExpenseCategory::from_name("  food & dining "),
            Some(ExpenseCategory::FoodAndDining)
        );
        assert_eq!(IncomeCategory::from_name("rental income"), Some(IncomeCategory::RentalIncome));
        assert_eq!(ExpenseCategory::from_name("Groceries"), None);
    }

    #[test]
    fn parse_for_checks_vocabulary() {
        assert_eq!(
            Category::parse_for(TransactionType::Expense, "Transport"),
            Ok(Category::Expense(ExpenseCategory::Transport))
        );
        let wrong_kind = Category::parse_for(TransactionType::Expense, "Salary").unwrap_err();
        assert!(wrong_kind.contains("income category"));
        let unknown = Category::parse_for(TransactionType::Income, "Lottery").unwrap_err();
        assert!(unknown.contains("not a valid income category"));
        let blank = Category::parse_for(TransactionType::Income, "  ").unwrap_err();
        assert_eq!(blank, "category is required");
    }

    #[test]
    fn info_carries_metadata() {
        let info = ExpenseCategory::Housing.info();
        assert_eq!(info.name, "Housing");
        assert_eq!(info.icon, "home");
        assert!(info.color.starts_with('#'));
        assert_eq!(Category::from(IncomeCategory::Gifts).info().icon, "gift");
    }

    #[test]
    fn vocabulary_matches_kind() {
        let expenses = Category::vocabulary(TransactionType::Expense);
        assert_eq!(expenses.len(), ExpenseCategory::ALL.len());
        assert!(expenses.iter().all(|c| c.kind() == TransactionType::Expense));
        assert!(expenses.iter().all(|c| c.as_expense().is_some()));
        let incomes = Category::vocabulary(TransactionType::Income);
        assert!(incomes.iter().all(|c| c.as_expense().is_none()));
    }
}
