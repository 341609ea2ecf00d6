//! Pluggable backends holding transactions and budgets.
//!
//! This module defines the [`Backend`] (async) and [`BlockingBackend`]
//! (blocking) traits via a shared macro, mirroring the client generation
//! pattern in [`crate::client`]. The HTTP clients implement them against
//! the remote API; [`InMemoryBackend`] and [`FileBackend`] emulate the
//! server locally.

/// Generates a backend trait (async or blocking) with all entity methods.
///
/// Uses `@methods` to define the method list once, and `@method` to render
/// each method in async (`impl Future + Send`) or blocking (`fn`) style.
macro_rules! define_backend {
    // ── Entry points ────────────────────────────────────────────────
    (
        trait_name: $trait_name:ident,
        trait_doc: $trait_doc:expr,
        mode: async_mode,
    ) => {
        #[doc = $trait_doc]
        pub trait $trait_name: core::fmt::Debug + Send + Sync {
            define_backend!(@methods async_mode);
        }
    };
    (
        trait_name: $trait_name:ident,
        trait_doc: $trait_doc:expr,
        mode: blocking,
    ) => {
        #[doc = $trait_doc]
        pub trait $trait_name: core::fmt::Debug + Send + Sync {
            define_backend!(@methods blocking);
        }
    };

    // ── Single method list (shared between both variants) ───────────
    (@methods $mode:ident) => {
        // Transactions
        define_backend!(@method $mode, list_transactions,
            "Returns one page of transactions matching `filter`, newest first.\n\nPass the previous page's `next_cursor` to continue; `None` starts from the beginning.\n\n# Errors\n\nReturns an error if the backend cannot be reached or rejects the request.",
            filter: &TransactionFilter, cursor: Option<&str>, -> Result<Page<Transaction>>);
        define_backend!(@method $mode, transaction,
            "Returns a single transaction.\n\n# Errors\n\nReturns [`crate::error::LedgerError::NotFound`] if it does not exist.",
            id: &TransactionId, -> Result<Transaction>);
        define_backend!(@method $mode, create_transaction,
            "Persists a new transaction and returns it with its assigned ID.\n\n# Errors\n\nReturns an error if the backend cannot be reached or rejects the request.",
            payload: &NewTransaction, -> Result<Transaction>);
        define_backend!(@method $mode, update_transaction,
            "Applies a partial update and returns the stored result.\n\n# Errors\n\nReturns [`crate::error::LedgerError::NotFound`] if it does not exist.",
            id: &TransactionId, changes: &TransactionChanges, -> Result<Transaction>);
        define_backend!(@method $mode, delete_transaction,
            "Removes a transaction.\n\n# Errors\n\nReturns [`crate::error::LedgerError::NotFound`] if it does not exist.",
            id: &TransactionId, -> Result<()>);

        // Budgets
        define_backend!(@method $mode, list_budgets,
            "Returns all budgets, optionally restricted to one period.\n\n# Errors\n\nReturns an error if the backend cannot be reached or rejects the request.",
            period: Option<BudgetPeriod>, -> Result<Vec<Budget>>);
        define_backend!(@method $mode, budget,
            "Returns a single budget.\n\n# Errors\n\nReturns [`crate::error::LedgerError::NotFound`] if it does not exist.",
            id: &BudgetId, -> Result<Budget>);
        define_backend!(@method $mode, create_budget,
            "Persists a new budget and returns it with its assigned ID.\n\n# Errors\n\nReturns an error if the backend cannot be reached or rejects the request.",
            payload: &NewBudget, -> Result<Budget>);
        define_backend!(@method $mode, update_budget,
            "Applies a partial update and returns the stored result.\n\n# Errors\n\nReturns [`crate::error::LedgerError::NotFound`] if it does not exist.",
            id: &BudgetId, changes: &BudgetChanges, -> Result<Budget>);
        define_backend!(@method $mode, delete_budget,
            "Removes a budget. Linked transactions are left untouched.\n\n# Errors\n\nReturns [`crate::error::LedgerError::NotFound`] if it does not exist.",
            id: &BudgetId, -> Result<()>);
        define_backend!(@method $mode, refresh_spending,
            "Asks the backend to recompute every budget's spending and returns the budgets with `current_spending` populated.\n\n# Errors\n\nReturns an error if the backend cannot be reached or rejects the request.",
            -> Result<Vec<Budget>>);
    };

    // ── Blocking method renderer ────────────────────────────────────
    (@method blocking, $name:ident, $doc:expr,
     $($param:ident: $param_ty:ty,)* -> $ret:ty) => {
        #[doc = $doc]
        fn $name(&self $(, $param: $param_ty)*) -> $ret;
    };

    // ── Async method renderer (returns impl Future + Send) ──────────
    (@method async_mode, $name:ident, $doc:expr,
     $($param:ident: $param_ty:ty,)* -> $ret:ty) => {
        #[doc = $doc]
        fn $name(&self $(, $param: $param_ty)*)
            -> impl core::future::Future<Output = $ret> + Send;
    };
}

/// Implements both backend traits for a local backend.
///
/// The backend must provide `list`, `read` and `write` helpers that run a
/// closure over its [`state::LedgerState`] and [`state::Settings`].
macro_rules! impl_local_backend {
    ($backend:ty) => {
        #[cfg(feature = "blocking")]
        impl $crate::backend::BlockingBackend for $backend {
            impl_local_backend!(@methods blocking);
        }

        #[cfg(feature = "async")]
        impl $crate::backend::Backend for $backend {
            impl_local_backend!(@methods async_mode);
        }
    };

    (@methods $mode:ident) => {
        impl_local_backend!(@method $mode, list_transactions, list,
            filter: &TransactionFilter, cursor: Option<&str>, -> Page<Transaction>,
            |state, settings| state.list_transactions(filter, cursor, settings));
        impl_local_backend!(@method $mode, transaction, read,
            id: &TransactionId, -> Transaction,
            |state, _settings| state.transaction(id));
        impl_local_backend!(@method $mode, create_transaction, write,
            payload: &NewTransaction, -> Transaction,
            |state, _settings| Ok(state.create_transaction(payload)));
        impl_local_backend!(@method $mode, update_transaction, write,
            id: &TransactionId, changes: &TransactionChanges, -> Transaction,
            |state, _settings| state.update_transaction(id, changes));
        impl_local_backend!(@method $mode, delete_transaction, write,
            id: &TransactionId, -> (),
            |state, _settings| state.delete_transaction(id));
        impl_local_backend!(@method $mode, list_budgets, read,
            period: Option<BudgetPeriod>, -> Vec<Budget>,
            |state, settings| Ok(state.list_budgets(period, settings)));
        impl_local_backend!(@method $mode, budget, read,
            id: &BudgetId, -> Budget,
            |state, settings| state.budget(id, settings));
        impl_local_backend!(@method $mode, create_budget, write,
            payload: &NewBudget, -> Budget,
            |state, settings| Ok(state.create_budget(payload, settings)));
        impl_local_backend!(@method $mode, update_budget, write,
            id: &BudgetId, changes: &BudgetChanges, -> Budget,
            |state, settings| state.update_budget(id, changes, settings));
        impl_local_backend!(@method $mode, delete_budget, write,
            id: &BudgetId, -> (),
            |state, _settings| state.delete_budget(id));
        impl_local_backend!(@method $mode, refresh_spending, read,
            -> Vec<Budget>,
            |state, _settings| Ok(state.refresh_spending()));
    };

    (@method blocking, $name:ident, $access:ident,
     $($param:ident: $param_ty:ty,)* -> $ret:ty,
     |$state:ident, $settings:ident| $body:expr) => {
        #[inline]
        fn $name(&self $(, $param: $param_ty)*) -> Result<$ret> {
            self.$access(|$state, $settings| $body)
        }
    };

    (@method async_mode, $name:ident, $access:ident,
     $($param:ident: $param_ty:ty,)* -> $ret:ty,
     |$state:ident, $settings:ident| $body:expr) => {
        #[inline]
        fn $name(&self $(, $param: $param_ty)*)
            -> impl core::future::Future<Output = Result<$ret>> + Send {
            core::future::ready(self.$access(|$state, $settings| $body))
        }
    };
}

#[cfg(feature = "storage-file")]
mod file;
mod memory;
mod state;

#[cfg(feature = "storage-file")]
pub use file::FileBackend;
pub use memory::{DEFAULT_PAGE_SIZE, InMemoryBackend};

#[cfg(feature = "async")]
mod async_backend {
    //! Async backend trait definition.

    use crate::error::Result;
    use crate::models::{
        Budget, BudgetChanges, BudgetId, BudgetPeriod, NewBudget, NewTransaction, Page,
        Transaction, TransactionChanges, TransactionFilter, TransactionId,
    };

    define_backend! {
        trait_name: Backend,
        trait_doc: "Async backend for transactions and budgets.\n\nAll methods take `&self`; implementations use interior mutability\n(e.g. `Mutex`) for thread-safe mutation.",
        mode: async_mode,
    }
}

#[cfg(feature = "blocking")]
mod blocking_backend {
    //! Blocking backend trait definition.

    use crate::error::Result;
    use crate::models::{
        Budget, BudgetChanges, BudgetId, BudgetPeriod, NewBudget, NewTransaction, Page,
        Transaction, TransactionChanges, TransactionFilter, TransactionId,
    };

    define_backend! {
        trait_name: BlockingBackend,
        trait_doc: "Blocking backend for transactions and budgets.\n\nAll methods take `&self`; implementations use interior mutability\n(e.g. `Mutex`) for thread-safe mutation.",
        mode: blocking,
    }
}

#[cfg(feature = "async")]
pub use async_backend::Backend;
#[cfg(feature = "blocking")]
pub use blocking_backend::BlockingBackend;
