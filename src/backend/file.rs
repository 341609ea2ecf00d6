//! JSON-file-based backend.
//!
//! Stores transactions and budgets in separate JSON files under a
//! configurable directory (default: `$XDG_DATA_HOME/spendline/`), answering
//! every request the way the remote API would.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use serde::de::DeserializeOwned;

use super::DEFAULT_PAGE_SIZE;
use super::state::{LedgerState, Settings};
use crate::error::{LedgerError, Result};
use crate::models::{
    Budget, BudgetChanges, BudgetId, BudgetPeriod, NewBudget, NewTransaction, Page, Transaction,
    TransactionChanges, TransactionFilter, TransactionId,
};

/// Application name used for the XDG data directory.
const APP_NAME: &str = "spendline";

/// File name for transactions.
const TRANSACTIONS_FILE: &str = "transactions.json";
/// File name for budgets.
const BUDGETS_FILE: &str = "budgets.json";
/// Sentinel file used for cross-process file locking.
const LOCK_FILE: &str = "ledger.lock";

/// File-backed ledger emulating the remote API on disk.
///
/// # Concurrency
///
/// An in-process [`Mutex`] serializes access within one process, and an
/// advisory lock on `ledger.lock` (via [`std::fs::File::lock`] /
/// [`std::fs::File::lock_shared`]) protects against other processes such
/// as a second CLI invocation. Reads take a shared lock, mutations an
/// exclusive one held across the whole load-modify-save cycle.
///
/// # File layout
///
/// ```text
/// <dir>/
///   ledger.lock           (cross-process lock sentinel)
///   transactions.json
///   budgets.json
/// ```
#[derive(Debug)]
pub struct FileBackend {
    /// Root directory containing the JSON files.
    dir: PathBuf,
    /// Mutex serializing concurrent in-process access.
    lock: Mutex<()>,
    /// Sentinel file for cross-process advisory locking.
    lock_file: fs::File,
    /// Answering behavior.
    settings: Settings,
}

impl FileBackend {
    /// Opens (or creates) a ledger rooted at `dir`.
    ///
    /// Budget reads carry server-computed spending by default, matching a
    /// real server.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the lock
    /// file cannot be opened.
    #[inline]
    pub fn new(dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&dir).map_err(storage_io_error)?;
        let lock_file = fs::OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(dir.join(LOCK_FILE))
            .map_err(storage_io_error)?;
        Ok(Self {
            dir,
            lock: Mutex::new(()),
            lock_file,
            settings: Settings {
                page_size: DEFAULT_PAGE_SIZE,
                server_spending: true,
            },
        })
    }

    /// Returns the default XDG-compliant data directory.
    ///
    /// On Linux: `$XDG_DATA_HOME/spendline/` (typically
    /// `~/.local/share/spendline/`).
    ///
    /// # Errors
    ///
    /// Returns an error if the platform data directory cannot be determined.
    #[inline]
    pub fn default_dir() -> Result<PathBuf> {
        dirs::data_dir()
            .map(|data_path| data_path.join(APP_NAME))
            .ok_or_else(|| {
                LedgerError::Storage("could not determine platform data directory".into())
            })
    }

    /// Sets the number of transactions per listing page.
    #[inline]
    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.settings.page_size = page_size.max(1);
        self
    }

    /// Controls whether budget reads carry `current_spending`.
    #[inline]
    #[must_use]
    pub const fn with_server_spending(mut self, enabled: bool) -> Self {
        self.settings.server_spending = enabled;
        self
    }

    /// Directory holding the ledger files.
    #[inline]
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    // ── Private helpers ─────────────────────────────────────────────

    /// Returns the full path for a given file name.
    fn path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    /// Listings share the read path.
    fn list<R, F>(&self, op: F) -> Result<R>
    where
        F: FnOnce(&LedgerState, &Settings) -> Result<R>,
    {
        self.read(op)
    }

    /// Loads the ledger under a shared lock and runs `op` on it.
    fn read<R, F>(&self, op: F) -> Result<R>
    where
        F: FnOnce(&LedgerState, &Settings) -> Result<R>,
    {
        self.with_shared_lock(|| {
            let state = self.load()?;
            op(&state, &self.settings)
        })
    }

    /// Loads the ledger under an exclusive lock, runs `op` and saves the
    /// result if `op` succeeded.
    fn write<R, F>(&self, op: F) -> Result<R>
    where
        F: FnOnce(&mut LedgerState, &Settings) -> Result<R>,
    {
        self.with_exclusive_lock(|| {
            let mut state = self.load()?;
            let output = op(&mut state, &self.settings)?;
            self.save(&state)?;
            Ok(output)
        })
    }

    /// Acquires the in-process guard and a shared file lock around `op`.
    fn with_shared_lock<R, F: FnOnce() -> Result<R>>(&self, op: F) -> Result<R> {
        let _guard: MutexGuard<'_, ()> = self.lock.lock().map_err(|err| lock_poison_error(&err))?;
        self.lock_file.lock_shared().map_err(storage_io_error)?;
        let result = op();
        // The operation's own error wins over an unlock failure.
        if let Err(err) = self.lock_file.unlock()
            && result.is_ok()
        {
            return Err(storage_io_error(err));
        }
        result
    }

    /// Acquires the in-process guard and an exclusive file lock around `op`.
    fn with_exclusive_lock<R, F: FnOnce() -> Result<R>>(&self, op: F) -> Result<R> {
        let _guard: MutexGuard<'_, ()> = self.lock.lock().map_err(|err| lock_poison_error(&err))?;
        self.lock_file.lock().map_err(storage_io_error)?;
        let result = op();
        if let Err(err) = self.lock_file.unlock()
            && result.is_ok()
        {
            return Err(storage_io_error(err));
        }
        result
    }

    /// Reads both entity files.
    fn load(&self) -> Result<LedgerState> {
        Ok(LedgerState {
            transactions: self.read_entities(TRANSACTIONS_FILE)?,
            budgets: self.read_entities(BUDGETS_FILE)?,
        })
    }

    /// Writes both entity files.
    fn save(&self, state: &LedgerState) -> Result<()> {
        self.write_entities(TRANSACTIONS_FILE, &state.transactions)?;
        self.write_entities(BUDGETS_FILE, &state.budgets)
    }

    /// Reads and deserializes a JSON array. A missing file is empty.
    fn read_entities<T: DeserializeOwned>(&self, name: &str) -> Result<Vec<T>> {
        match fs::read_to_string(self.path(name)) {
            Ok(contents) => serde_json::from_str(&contents).map_err(LedgerError::from),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(err) => Err(storage_io_error(err)),
        }
    }

    /// Atomically writes a JSON array (write-to-tmp then rename).
    fn write_entities<T: Serialize>(&self, name: &str, items: &[T]) -> Result<()> {
        let tmp_path = self.path(&format!("{name}.tmp"));
        let json = serde_json::to_string_pretty(items)?;
        fs::write(&tmp_path, json).map_err(storage_io_error)?;
        fs::rename(&tmp_path, self.path(name)).map_err(storage_io_error)
    }
}

/// Wraps an I/O error into a [`LedgerError::Storage`].
fn storage_io_error(err: std::io::Error) -> LedgerError {
    LedgerError::Storage(Box::new(err))
}

/// Wraps a mutex poison error into a [`LedgerError::Storage`].
fn lock_poison_error<T>(err: &PoisonError<T>) -> LedgerError {
    LedgerError::Storage(err.to_string().into())
}

impl_local_backend!(FileBackend);

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use super::*;
    use crate::models::{BudgetNotifications, Category, ExpenseCategory, TransactionType};

    /// Helper to create a [`FileBackend`] in a temporary directory.
    fn temp_backend() -> (FileBackend, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::new(dir.path().to_path_buf()).unwrap();
        (backend, dir)
    }

    fn groceries(budget: Option<&BudgetId>) -> NewTransaction {
        NewTransaction {
            amount: Decimal::new(12_050, 2),
            kind: TransactionType::Expense,
            category: Category::Expense(ExpenseCategory::FoodAndDining),
            description: "Groceries".to_owned(),
            date: NaiveDate::from_ymd_opt(2025, 1, 12).unwrap(),
            payment_method: Some("Card".to_owned()),
            linked_budget_id: budget.cloned(),
            is_recurring: false,
        }
    }

    fn food_budget() -> NewBudget {
        NewBudget {
            category: ExpenseCategory::FoodAndDining,
            amount: Decimal::new(500, 0),
            period: BudgetPeriod::Monthly,
            start_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 1, 31).unwrap(),
            notifications: BudgetNotifications::default(),
        }
    }

    #[test]
    fn lockfile_created_on_construction() {
        let (backend, _dir) = temp_backend();
        assert!(backend.path(LOCK_FILE).exists());
    }

    #[test]
    fn default_dir_ends_with_app_name() {
        if let Ok(dir) = FileBackend::default_dir() {
            assert!(dir.ends_with(APP_NAME));
        }
    }

    #[test]
    fn failed_mutation_writes_nothing() {
        let (backend, _dir) = temp_backend();
        let err = backend
            .write(|state, _settings| state.delete_transaction(&TransactionId::from("nope")))
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(!backend.path(TRANSACTIONS_FILE).exists());
    }

    #[test]
    fn corrupt_file_is_a_serialization_error() {
        let (backend, _dir) = temp_backend();
        fs::write(backend.path(BUDGETS_FILE), "{ not json").unwrap();
        let err = backend.read(|state, _settings| Ok(state.budgets.len())).unwrap_err();
        assert!(matches!(err, LedgerError::Serialization(_)));
    }

    #[cfg(feature = "blocking")]
    mod blocking {
        use super::*;
        use crate::backend::BlockingBackend;

        #[test]
        fn empty_directory_lists_nothing() {
            let (backend, _dir) = temp_backend();
            let page = backend
                .list_transactions(&TransactionFilter::new(), None)
                .unwrap();
            assert!(page.items.is_empty());
            assert!(page.is_last());
            assert!(backend.list_budgets(None).unwrap().is_empty());
        }

        #[test]
        fn data_survives_reopening() {
            let dir = tempfile::tempdir().unwrap();
            let (tx, budget) = {
                let backend = FileBackend::new(dir.path().to_path_buf()).unwrap();
                let budget = backend.create_budget(&food_budget()).unwrap();
                let tx = backend.create_transaction(&groceries(Some(&budget.id))).unwrap();
                (tx, budget)
            };
            let reopened = FileBackend::new(dir.path().to_path_buf()).unwrap();
            assert_eq!(reopened.transaction(&tx.id).unwrap(), tx);
            let stored = reopened.budget(&budget.id).unwrap();
            assert_eq!(stored.current_spending, Some(Decimal::new(12_050, 2)));
        }

        #[test]
        fn spending_is_not_persisted() {
            let (backend, _dir) = temp_backend();
            let _budget = backend.create_budget(&food_budget()).unwrap();
            let raw = fs::read_to_string(backend.path(BUDGETS_FILE)).unwrap();
            assert!(!raw.contains("currentSpending"));
        }

        #[test]
        fn update_and_unlink() {
            let (backend, _dir) = temp_backend();
            let budget = backend.create_budget(&food_budget()).unwrap();
            let tx = backend.create_transaction(&groceries(Some(&budget.id))).unwrap();
            let updated = backend
                .update_transaction(&tx.id, &TransactionChanges::unlink())
                .unwrap();
            assert_eq!(updated.linked_budget_id, None);
            assert_eq!(
                backend.budget(&budget.id).unwrap().current_spending,
                Some(Decimal::ZERO)
            );
        }

        #[test]
        fn without_server_spending() {
            let dir = tempfile::tempdir().unwrap();
            let backend = FileBackend::new(dir.path().to_path_buf())
                .unwrap()
                .with_server_spending(false)
                .with_page_size(1);
            let budget = backend.create_budget(&food_budget()).unwrap();
            assert_eq!(budget.current_spending, None);
            assert_eq!(backend.refresh_spending().unwrap().len(), 1);
        }
    }

    #[cfg(feature = "blocking")]
    #[test]
    fn concurrent_creates_are_safe() {
        use std::sync::Arc;
        use std::thread;

        use crate::backend::BlockingBackend;

        let (backend, _dir) = temp_backend();
        let backend = Arc::new(backend);
        let num_threads: usize = 4;
        let per_thread: usize = 10;

        let handles: Vec<_> = (0..num_threads)
            .map(|_| {
                let backend = Arc::clone(&backend);
                thread::spawn(move || {
                    for _ in 0..per_thread {
                        let _tx = backend.create_transaction(&groceries(None)).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let count = backend.read(|state, _settings| Ok(state.transactions.len())).unwrap();
        assert_eq!(count, num_threads * per_thread);
    }

    #[cfg(feature = "async")]
    mod async_tests {
        use super::*;
        use crate::backend::Backend;

        #[tokio::test]
        async fn create_then_delete() {
            let (backend, _dir) = temp_backend();
            let tx = backend.create_transaction(&groceries(None)).await.unwrap();
            backend.delete_transaction(&tx.id).await.unwrap();
            let err = backend.transaction(&tx.id).await.unwrap_err();
            assert!(err.is_not_found());
        }

        #[tokio::test]
        async fn budget_delete_keeps_links() {
            let (backend, _dir) = temp_backend();
            let budget = backend.create_budget(&food_budget()).await.unwrap();
            let tx = backend
                .create_transaction(&groceries(Some(&budget.id)))
                .await
                .unwrap();
            backend.delete_budget(&budget.id).await.unwrap();
            let stored = backend.transaction(&tx.id).await.unwrap();
            assert!(stored.is_linked_to(&budget.id));
        }
    }
}
