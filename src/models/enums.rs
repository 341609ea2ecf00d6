//! Enumeration types for constrained API values.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Direction of money flow for a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Money received.
    Income,
    /// Money spent; may count against a budget.
    Expense,
}

impl TransactionType {
    /// Lowercase wire name.
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

impl fmt::Display for TransactionType {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = String;

    #[inline]
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            other => Err(format!("unknown transaction type: {other}")),
        }
    }
}

/// Informational grouping of a budget.
///
/// The period does not affect aggregation: the spending window is always
/// the budget's explicit `[start_date, end_date]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetPeriod {
    /// Weekly budget.
    Weekly,
    /// Monthly budget.
    Monthly,
    /// Yearly budget.
    Yearly,
}

impl BudgetPeriod {
    /// Lowercase wire name.
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
        }
    }
}

impl fmt::Display for BudgetPeriod {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BudgetPeriod {
    type Err = String;

    #[inline]
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            "yearly" => Ok(Self::Yearly),
            other => Err(format!("unknown budget period: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transaction_type_serde() {
        let variants = [
            (TransactionType::Income, r#""income""#),
            (TransactionType::Expense, r#""expense""#),
        ];
        for (variant, expected_json) in variants {
            let json = serde_json::to_string(&variant).unwrap();
            assert_eq!(json, expected_json);
            let deserialized: TransactionType = serde_json::from_str(&json).unwrap();
            assert_eq!(deserialized, variant);
        }
    }

    #[test]
    fn budget_period_serde() {
        let deserialized: BudgetPeriod = serde_json::from_str(r#""monthly""#).unwrap();
        assert_eq!(deserialized, BudgetPeriod::Monthly);
        assert_eq!(
            serde_json::to_string(&BudgetPeriod::Weekly).unwrap(),
            r#""weekly""#
        );
    }

    #[test]
    fn invalid_period_fails() {
        let result = serde_json::from_str::<BudgetPeriod>(r#""daily""#);
        assert!(result.is_err());
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("Expense".parse::<TransactionType>(), Ok(TransactionType::Expense));
        assert_eq!(" YEARLY ".parse::<BudgetPeriod>(), Ok(BudgetPeriod::Yearly));
        assert!("transfer".parse::<TransactionType>().is_err());
    }
}
