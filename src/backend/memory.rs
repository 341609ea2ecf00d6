//! In-memory backend for tests and demos.
//!
//! Provides [`InMemoryBackend`], a thread-safe emulation of the remote API
//! implementing both backend traits. Ideal for unit and integration tests
//! where neither a server nor file I/O is wanted.

use core::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use super::state::{LedgerState, Settings};
use crate::error::{LedgerError, Result};
use crate::models::{
    Budget, BudgetChanges, BudgetId, BudgetPeriod, NewBudget, NewTransaction, Page, Transaction,
    TransactionChanges, TransactionFilter, TransactionId,
};

/// Page size used unless overridden.
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// Thread-safe in-memory backend.
///
/// By default budgets come back without `current_spending`, which makes
/// the ledger aggregate on the client. Call
/// [`InMemoryBackend::with_server_spending`] to emulate a server that
/// computes spending itself.
///
/// # Example
///
/// ```rust
/// use spendline::backend::InMemoryBackend;
///
/// let backend = InMemoryBackend::new().with_page_size(10);
/// // Use with the Ledger or LedgerBlocking builders:
/// // LedgerBlocking::builder().backend(backend).build()
/// ```
#[derive(Debug)]
pub struct InMemoryBackend {
    /// All state behind a single mutex for thread-safe interior mutability.
    inner: Mutex<LedgerState>,
    /// Answering behavior.
    settings: Settings,
    /// When set, transaction listings fail as if the server were down.
    listing_unavailable: AtomicBool,
}

impl Default for InMemoryBackend {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBackend {
    /// Creates a new empty backend.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(LedgerState::default()),
            settings: Settings {
                page_size: DEFAULT_PAGE_SIZE,
                server_spending: false,
            },
            listing_unavailable: AtomicBool::new(false),
        }
    }

    /// Sets the number of transactions per listing page.
    #[inline]
    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.settings.page_size = page_size.max(1);
        self
    }

    /// Makes budget reads carry server-computed `current_spending`.
    #[inline]
    #[must_use]
    pub const fn with_server_spending(mut self, enabled: bool) -> Self {
        self.settings.server_spending = enabled;
        self
    }

    /// Seeds the backend with existing records.
    #[inline]
    #[must_use]
    pub fn with_data(self, transactions: Vec<Transaction>, budgets: Vec<Budget>) -> Self {
        Self {
            inner: Mutex::new(LedgerState {
                transactions,
                budgets,
            }),
            ..self
        }
    }

    /// Makes transaction listings fail with HTTP 503 until reset.
    #[inline]
    pub fn set_listing_unavailable(&self, unavailable: bool) {
        self.listing_unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Snapshot of every stored transaction, bypassing pagination.
    ///
    /// # Errors
    ///
    /// Returns an error if the internal lock is poisoned.
    #[inline]
    pub fn stored_transactions(&self) -> Result<Vec<Transaction>> {
        self.read(|state, _settings| Ok(state.transactions.clone()))
    }

    /// Snapshot of every stored budget.
    ///
    /// # Errors
    ///
    /// Returns an error if the internal lock is poisoned.
    #[inline]
    pub fn stored_budgets(&self) -> Result<Vec<Budget>> {
        self.read(|state, _settings| Ok(state.budgets.clone()))
    }

    /// Runs a listing operation, honoring the unavailability switch.
    fn list<R, F>(&self, op: F) -> Result<R>
    where
        F: FnOnce(&LedgerState, &Settings) -> Result<R>,
    {
        if self.listing_unavailable.load(Ordering::SeqCst) {
            return Err(LedgerError::Api {
                status: 503,
                message: "transaction listing unavailable".to_owned(),
            });
        }
        self.read(op)
    }

    /// Acquires the inner lock and runs a read-only operation.
    fn read<R, F>(&self, op: F) -> Result<R>
    where
        F: FnOnce(&LedgerState, &Settings) -> Result<R>,
    {
        let state = self.inner.lock().map_err(|err| lock_error(&err))?;
        op(&state, &self.settings)
    }

    /// Acquires the inner lock and runs a mutating operation.
    fn write<R, F>(&self, op: F) -> Result<R>
    where
        F: FnOnce(&mut LedgerState, &Settings) -> Result<R>,
    {
        let mut state = self.inner.lock().map_err(|err| lock_error(&err))?;
        op(&mut state, &self.settings)
    }
}

/// Wraps a mutex poison error.
fn lock_error<T>(err: &PoisonError<T>) -> LedgerError {
    LedgerError::Storage(err.to_string().into())
}

impl_local_backend!(InMemoryBackend);
