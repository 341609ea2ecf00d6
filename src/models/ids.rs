//! Newtype wrappers for entity identifiers.
//!
//! Identifiers are opaque strings assigned by the server. The wrappers
//! keep transaction and budget IDs from being mixed up at compile time.

use serde::{Deserialize, Serialize};

/// Macro to define a newtype ID wrapping a `String` inner type.
macro_rules! define_string_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier from the given string.
            #[inline]
            #[must_use]
            pub const fn new(value: String) -> Self {
                Self(value)
            }

            /// Returns a reference to the inner string.
            #[inline]
            #[must_use]
            pub fn as_inner(&self) -> &str {
                &self.0
            }

            /// Consumes the wrapper and returns the inner string.
            #[inline]
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl core::fmt::Display for $name {
            #[inline]
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<String> for $name {
            #[inline]
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $name {
            #[inline]
            fn from(value: &str) -> Self {
                Self(value.to_owned())
            }
        }
    };
}

define_string_id! {
    /// Unique identifier for an income or expense transaction.
    TransactionId
}

define_string_id! {
    /// Unique identifier for a budget allocation.
    BudgetId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transaction_id_is_transparent_json() {
        let id = TransactionId::new("tx-550e8400".to_owned());
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, r#""tx-550e8400""#);
        let back: TransactionId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn budget_id_display() {
        let id = BudgetId::from("b-42");
        assert_eq!(id.to_string(), "b-42");
        assert_eq!(id.as_inner(), "b-42");
    }

    #[test]
    fn id_into_inner() {
        let id = BudgetId::new("b-7".to_owned());
        assert_eq!(id.into_inner(), "b-7");
    }

    #[test]
    fn ids_order_lexicographically() {
        let first = BudgetId::from("a");
        let second = BudgetId::from("b");
        assert!(first < second);
    }
}
