//! High-level ledger: validation, budget linking and spending refresh.
//!
//! Combines a [`Backend`](crate::backend::Backend) /
//! [`BlockingBackend`](crate::backend::BlockingBackend) with the linking
//! policy, the spending aggregator and a version-stamped cache. Every
//! mutation completes before the follow-up refresh starts, and every
//! observable change is published on a broadcast channel.

use crate::aggregate::BudgetSummary;
use crate::error::LedgerError;
use crate::linking::LinkOutcome;
use crate::models::{Budget, BudgetId, Transaction, TransactionId};

/// Result of saving a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionOutcome {
    /// The transaction as stored by the backend.
    pub transaction: Transaction,
    /// Budget-linking decision. Always present after a create; after an
    /// edit only when the category changed.
    pub link: Option<LinkOutcome>,
    /// Whether budget spending was re-aggregated afterwards.
    pub refreshed: bool,
}

/// Result of saving a budget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BudgetOutcome {
    /// The budget as stored by the backend.
    pub budget: Budget,
    /// Whether budget spending was re-aggregated afterwards.
    pub refreshed: bool,
}

/// Result of deleting a budget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BudgetDeletion {
    /// The deleted budget.
    pub budget_id: BudgetId,
    /// Transactions whose link to the budget was cleared.
    pub unlinked: Vec<TransactionId>,
    /// Whether budget spending was re-aggregated afterwards.
    pub refreshed: bool,
}

impl BudgetDeletion {
    /// Number of transactions that lost their link.
    #[inline]
    #[must_use]
    pub fn unlinked_count(&self) -> usize {
        self.unlinked.len()
    }
}

/// Summaries to display for a budget list, in display order.
pub type BudgetBoard = Vec<BudgetSummary>;

/// Generates a ledger service (async or blocking) with builder and pager.
macro_rules! define_ledger {
    (
        ledger_name: $ledger:ident,
        builder_name: $builder:ident,
        pager_name: $pager:ident,
        backend_trait: $backend_trait:ident,
        ledger_doc: $ledger_doc:expr,
        builder_doc: $builder_doc:expr,
        pager_doc: $pager_doc:expr,
        $(async_kw: $async_kw:tt,)?
        $(await_kw: $await_ext:tt,)?
    ) => {
        #[doc = $builder_doc]
        #[derive(Debug)]
        pub struct $builder<B: $backend_trait> {
            /// Backend holding transactions and budgets.
            backend: Option<B>,
            /// Source of "today".
            clock: Option<Arc<dyn Clock>>,
            /// Capacity of the event channel.
            event_capacity: usize,
        }

        impl<B: $backend_trait> $builder<B> {
            /// Sets the backend (required).
            #[inline]
            #[must_use]
            pub fn backend(mut self, backend: B) -> Self {
                self.backend = Some(backend);
                self
            }

            /// Overrides the clock (defaults to [`SystemClock`]).
            #[inline]
            #[must_use]
            pub fn clock<C: Clock + 'static>(mut self, clock: C) -> Self {
                self.clock = Some(Arc::new(clock));
                self
            }

            /// Sets how many unread events a slow subscriber may lag behind.
            #[inline]
            #[must_use]
            pub const fn event_capacity(mut self, capacity: usize) -> Self {
                self.event_capacity = capacity;
                self
            }

            /// Builds the ledger.
            ///
            /// # Errors
            ///
            /// Returns [`LedgerError::Config`] if no backend was provided.
            #[inline]
            pub fn build(self) -> Result<$ledger<B>> {
                let backend = self
                    .backend
                    .ok_or_else(|| LedgerError::Config("a backend is required".to_owned()))?;
                let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
                let (events, _receiver) = broadcast::channel(self.event_capacity.max(1));
                Ok($ledger {
                    backend,
                    clock,
                    events,
                    cache: Mutex::new(BudgetCache::new()),
                })
            }
        }

        #[doc = $ledger_doc]
        #[derive(Debug)]
        pub struct $ledger<B: $backend_trait> {
            /// Backend holding transactions and budgets.
            backend: B,
            /// Source of "today".
            clock: Arc<dyn Clock>,
            /// Change notifications.
            events: broadcast::Sender<LedgerEvent>,
            /// Last applied budget summaries. Never locked across a backend call.
            cache: Mutex<BudgetCache>,
        }

        impl<B: $backend_trait> $ledger<B> {
            /// Creates a new builder for configuring the ledger.
            #[inline]
            #[must_use]
            pub const fn builder() -> $builder<B> {
                $builder {
                    backend: None,
                    clock: None,
                    event_capacity: DEFAULT_EVENT_CAPACITY,
                }
            }

            /// Returns a reference to the backend.
            #[inline]
            #[must_use]
            pub const fn backend(&self) -> &B {
                &self.backend
            }

            /// Today's date according to the configured clock.
            #[inline]
            #[must_use]
            pub fn today(&self) -> NaiveDate {
                self.clock.today()
            }

            /// Subscribes to change notifications.
            #[inline]
            #[must_use]
            pub fn subscribe(&self) -> broadcast::Receiver<LedgerEvent> {
                self.events.subscribe()
            }

            // ── Transactions ─────────────────────────────────────────

            /// Validates and saves a new transaction, linking expenses to the
            /// budget covering their category and date.
            ///
            /// An expense without a covering budget is still saved; the
            /// outcome carries [`LinkOutcome::NoBudget`] and a
            /// [`LedgerEvent::BudgetMissing`] is published.
            ///
            /// # Errors
            ///
            /// Returns [`LedgerError::Validation`] without contacting the
            /// backend if any field is invalid, or the backend's error if
            /// the budget lookup or the save fails.
            #[tracing::instrument(skip_all)]
            pub $($async_kw)? fn create_transaction(
                &self,
                draft: &TransactionDraft,
            ) -> Result<TransactionOutcome> {
                let mut payload = draft.validate(self.clock.today())?;
                let budgets = self.backend.list_budgets(None) $( .$await_ext )? ?;
                let link = linking::link_for(
                    payload.category,
                    payload.date,
                    &ActiveBudgets::from_budgets(&budgets),
                );
                payload.linked_budget_id = link.budget_id().cloned();
                let transaction = self.backend.create_transaction(&payload) $( .$await_ext )? ?;
                tracing::debug!(id = %transaction.id, link = ?link, "transaction created");
                self.publish(LedgerEvent::TransactionCreated {
                    id: transaction.id.clone(),
                });
                self.report_missing_budget(&link, &transaction.id);
                let refreshed = self.refresh_after_mutation() $( .$await_ext )?;
                Ok(TransactionOutcome {
                    transaction,
                    link: Some(link),
                    refreshed,
                })
            }

            /// Applies an edit to a transaction.
            ///
            /// Changing the category drops the old budget link and looks up
            /// the budget covering the new category; any other edit keeps
            /// the link untouched.
            ///
            /// # Errors
            ///
            /// Returns [`LedgerError::NotFound`] if the transaction does not
            /// exist, [`LedgerError::Validation`] if a field is invalid, or
            /// the backend's error.
            #[tracing::instrument(skip_all, fields(id = %id))]
            pub $($async_kw)? fn update_transaction(
                &self,
                id: &TransactionId,
                edit: &TransactionEdit,
            ) -> Result<TransactionOutcome> {
                let current = self.backend.transaction(id) $( .$await_ext )? ?;
                let mut changes = edit.validate(current.kind)?;
                let mut link = None;
                if changes.category.is_some_and(|category| category != current.category) {
                    let budgets = self.backend.list_budgets(None) $( .$await_ext )? ?;
                    let index = ActiveBudgets::from_budgets(&budgets);
                    if let Some(outcome) = linking::relink_on_edit(&current, changes.category, &index) {
                        changes.linked_budget_id = Some(outcome.budget_id().cloned());
                        link = Some(outcome);
                    }
                }
                if changes.is_empty() {
                    tracing::debug!("edit changes nothing");
                    return Ok(TransactionOutcome {
                        transaction: current,
                        link: None,
                        refreshed: false,
                    });
                }
                let transaction = self.backend.update_transaction(id, &changes) $( .$await_ext )? ?;
                self.publish(LedgerEvent::TransactionUpdated { id: id.clone() });
                if let Some(outcome) = link.as_ref() {
                    self.report_missing_budget(outcome, id);
                }
                let refreshed = self.refresh_after_mutation() $( .$await_ext )?;
                Ok(TransactionOutcome {
                    transaction,
                    link,
                    refreshed,
                })
            }

            /// Deletes a transaction and re-aggregates budget spending.
            ///
            /// Returns `false` if the transaction was deleted but spending
            /// could not be re-aggregated.
            ///
            /// # Errors
            ///
            /// Returns [`LedgerError::NotFound`] if the transaction does not
            /// exist (callers may treat this as already done), or the
            /// backend's error.
            #[tracing::instrument(skip_all, fields(id = %id))]
            pub $($async_kw)? fn delete_transaction(&self, id: &TransactionId) -> Result<bool> {
                self.backend.delete_transaction(id) $( .$await_ext )? ?;
                self.publish(LedgerEvent::TransactionDeleted { id: id.clone() });
                Ok(self.refresh_after_mutation() $( .$await_ext )?)
            }

            /// Looks up a single transaction.
            ///
            /// # Errors
            ///
            /// Returns [`LedgerError::NotFound`] if it does not exist, or the
            /// backend's error.
            #[inline]
            pub $($async_kw)? fn transaction(&self, id: &TransactionId) -> Result<Transaction> {
                self.backend.transaction(id) $( .$await_ext )?
            }

            /// Returns every transaction matching `filter`, newest first,
            /// following cursors until the last page.
            ///
            /// # Errors
            ///
            /// Returns the backend's error if any page fails to load.
            #[tracing::instrument(skip_all)]
            pub $($async_kw)? fn list_transactions(
                &self,
                filter: &TransactionFilter,
            ) -> Result<Vec<Transaction>> {
                let mut pager = self.transaction_pages(filter.clone());
                let mut items = Vec::new();
                while let Some(page) = pager.next_page() $( .$await_ext )? ? {
                    items.extend(page);
                }
                tracing::debug!(count = items.len(), "transactions listed");
                Ok(items)
            }

            /// Returns a lazy pager over the transactions matching `filter`.
            #[inline]
            #[must_use]
            pub const fn transaction_pages(&self, filter: TransactionFilter) -> $pager<'_, B> {
                $pager {
                    ledger: self,
                    filter,
                    cursor: None,
                    exhausted: false,
                }
            }

            // ── Budgets ──────────────────────────────────────────────

            /// Validates and saves a new budget.
            ///
            /// Existing transactions are not linked to it retroactively;
            /// only transactions saved afterwards count against it.
            ///
            /// # Errors
            ///
            /// Returns [`LedgerError::Validation`] if a field is invalid,
            /// [`LedgerError::DuplicateCategory`] if a budget for the category
            /// is active today or overlaps the new window, or the backend's
            /// error.
            #[tracing::instrument(skip_all)]
            pub $($async_kw)? fn create_budget(&self, draft: &BudgetDraft) -> Result<BudgetOutcome> {
                let payload = draft.validate()?;
                let budgets = self.backend.list_budgets(None) $( .$await_ext )? ?;
                if let Some(existing) = aggregate::find_conflict(
                    &budgets,
                    payload.category,
                    (payload.start_date, payload.end_date),
                    self.clock.today(),
                    None,
                ) {
                    return Err(duplicate(existing));
                }
                let budget = self.backend.create_budget(&payload) $( .$await_ext )? ?;
                tracing::debug!(id = %budget.id, category = %budget.category, "budget created");
                self.publish(LedgerEvent::BudgetCreated {
                    id: budget.id.clone(),
                });
                let refreshed = self.refresh_after_mutation() $( .$await_ext )?;
                Ok(BudgetOutcome { budget, refreshed })
            }

            /// Applies an edit to a budget and re-aggregates spending.
            ///
            /// Narrowing the window does not touch transactions: those now
            /// outside it keep their `linked_budget_id` but no longer count
            /// toward the budget's spending. Widening it does not adopt
            /// unlinked transactions either.
            ///
            /// # Errors
            ///
            /// Returns [`LedgerError::NotFound`] if the budget does not exist,
            /// [`LedgerError::Validation`] if the merged window or a field
            /// is invalid, [`LedgerError::DuplicateCategory`] if the new
            /// window collides with another budget of the category, or the
            /// backend's error.
            #[tracing::instrument(skip_all, fields(id = %id))]
            pub $($async_kw)? fn update_budget(
                &self,
                id: &BudgetId,
                edit: &BudgetEdit,
            ) -> Result<BudgetOutcome> {
                let budgets = self.backend.list_budgets(None) $( .$await_ext )? ?;
                let current = budgets
                    .iter()
                    .find(|budget| budget.id == *id)
                    .ok_or_else(|| LedgerError::not_found(id))?;
                let changes = edit.validate(current)?;
                if let Some(existing) = aggregate::find_conflict(
                    &budgets,
                    current.category,
                    changes.window_for(current),
                    self.clock.today(),
                    Some(id),
                ) {
                    return Err(duplicate(existing));
                }
                let budget = self.backend.update_budget(id, &changes) $( .$await_ext )? ?;
                self.publish(LedgerEvent::BudgetUpdated { id: id.clone() });
                let refreshed = self.refresh_after_mutation() $( .$await_ext )?;
                Ok(BudgetOutcome { budget, refreshed })
            }

            /// Deletes a budget, then clears the link of every transaction
            /// that referenced it. Transactions themselves are kept.
            ///
            /// # Errors
            ///
            /// Returns [`LedgerError::NotFound`] if the budget does not exist,
            /// or the backend's error if listing or unlinking fails. In the
            /// latter case the budget is already gone; repeating the call
            /// reports `NotFound`, so callers should re-run the unlinking
            /// through [`Self::update_transaction`] or a later delete.
            #[tracing::instrument(skip_all, fields(id = %id))]
            pub $($async_kw)? fn delete_budget(&self, id: &BudgetId) -> Result<BudgetDeletion> {
                self.backend.delete_budget(id) $( .$await_ext )? ?;
                let filter = TransactionFilter::new().linked_budget(id.clone());
                let linked = self.list_transactions(&filter) $( .$await_ext )? ?;
                let unlink = TransactionChanges::unlink();
                let mut unlinked = Vec::with_capacity(linked.len());
                for tx in linked {
                    match self.backend.update_transaction(&tx.id, &unlink) $( .$await_ext )? {
                        Ok(_) => unlinked.push(tx.id),
                        Err(err) if err.is_not_found() => {
                            tracing::debug!(id = %tx.id, "transaction vanished before unlinking");
                        }
                        Err(err) => return Err(err),
                    }
                }
                tracing::debug!(unlinked = unlinked.len(), "budget deleted");
                self.publish(LedgerEvent::BudgetDeleted {
                    id: id.clone(),
                    unlinked: unlinked.clone(),
                });
                let refreshed = self.refresh_after_mutation() $( .$await_ext )?;
                Ok(BudgetDeletion {
                    budget_id: id.clone(),
                    unlinked,
                    refreshed,
                })
            }

            /// Looks up a single budget with its spending.
            ///
            /// # Errors
            ///
            /// Returns [`LedgerError::NotFound`] if it does not exist, or the
            /// backend's error when no spending figure is available.
            #[tracing::instrument(skip_all, fields(id = %id))]
            pub $($async_kw)? fn budget(&self, id: &BudgetId) -> Result<BudgetSummary> {
                let budget = self.backend.budget(id) $( .$await_ext )? ?;
                let summaries = self.derive_summaries(&[budget], true) $( .$await_ext )? ?;
                summaries
                    .into_iter()
                    .next()
                    .ok_or_else(|| LedgerError::not_found(id))
            }

            /// Lists budgets (optionally of one period) with populated
            /// spending, in display order.
            ///
            /// Spending comes from the server when it provides it, from a
            /// local aggregation otherwise, and from the last cached value
            /// if transactions cannot be listed.
            ///
            /// # Errors
            ///
            /// Returns the backend's error if budgets cannot be listed, or if
            /// some budget has no spending figure from any source.
            #[tracing::instrument(skip_all)]
            pub $($async_kw)? fn list_budgets(&self, period: Option<BudgetPeriod>) -> Result<BudgetBoard> {
                let budgets = self.backend.list_budgets(period) $( .$await_ext )? ?;
                let mut summaries = self.derive_summaries(&budgets, true) $( .$await_ext )? ?;
                aggregate::sort_for_display(&mut summaries);
                Ok(summaries)
            }

            /// Re-aggregates every budget and replaces the cached summaries,
            /// unless a newer refresh finished first.
            ///
            /// # Errors
            ///
            /// Returns the backend's error; the cache is left untouched and a
            /// [`LedgerEvent::RefreshFailed`] is published.
            #[tracing::instrument(skip_all)]
            pub $($async_kw)? fn refresh_budgets(&self) -> Result<BudgetBoard> {
                let ticket = self.with_cache(BudgetCache::begin_refresh)?;
                let result = match self.backend.list_budgets(None) $( .$await_ext )? {
                    Ok(budgets) => self.derive_summaries(&budgets, false) $( .$await_ext )?,
                    Err(err) => Err(err),
                };
                self.settle(ticket, result)
            }

            /// Asks the backend to recompute spending server-side, then
            /// caches the result like [`Self::refresh_budgets`].
            ///
            /// # Errors
            ///
            /// Returns the backend's error; the cache is left untouched.
            #[tracing::instrument(skip_all)]
            pub $($async_kw)? fn refresh_spending(&self) -> Result<BudgetBoard> {
                let ticket = self.with_cache(BudgetCache::begin_refresh)?;
                let result = match self.backend.refresh_spending() $( .$await_ext )? {
                    Ok(budgets) => self.derive_summaries(&budgets, false) $( .$await_ext )?,
                    Err(err) => Err(err),
                };
                self.settle(ticket, result)
            }

            /// Summaries from the newest applied refresh, in display order.
            ///
            /// # Errors
            ///
            /// Returns [`LedgerError::Storage`] if the cache lock is poisoned.
            #[inline]
            pub fn cached_budgets(&self) -> Result<BudgetBoard> {
                self.with_cache(|cache| cache.summaries().to_vec())
            }

            /// Version of the cached summaries; `0` before the first refresh.
            ///
            /// # Errors
            ///
            /// Returns [`LedgerError::Storage`] if the cache lock is poisoned.
            #[inline]
            pub fn cache_version(&self) -> Result<u64> {
                self.with_cache(|cache| cache.version())
            }

            // ── Private helpers ──────────────────────────────────────

            /// Derives spending for `budgets`.
            ///
            /// Transactions are only listed when some budget lacks a server
            /// figure. With `allow_cached`, a failed listing falls back on
            /// cached figures instead of failing outright.
            $($async_kw)? fn derive_summaries(
                &self,
                budgets: &[Budget],
                allow_cached: bool,
            ) -> Result<Vec<BudgetSummary>> {
                let mut listing_error = None;
                let transactions = if budgets.iter().any(|budget| budget.current_spending.is_none()) {
                    let expenses = TransactionFilter::new().kind(TransactionType::Expense);
                    match self.list_transactions(&expenses) $( .$await_ext )? {
                        Ok(transactions) => Some(transactions),
                        Err(err) if allow_cached => {
                            tracing::warn!(error = %err, "transaction listing failed; using cached spending");
                            listing_error = Some(err);
                            None
                        }
                        Err(err) => return Err(err),
                    }
                } else {
                    None
                };
                let summaries = self.with_cache(|cache| {
                    aggregate::summarize(budgets, transactions.as_deref(), cache)
                })?;
                match (summaries, listing_error) {
                    (Some(summaries), _) => Ok(summaries),
                    (None, Some(err)) => Err(err),
                    (None, None) => Err(LedgerError::Storage(
                        "no spending figure available".into(),
                    )),
                }
            }

            /// Refreshes after a mutation, reporting instead of failing.
            $($async_kw)? fn refresh_after_mutation(&self) -> bool {
                self.refresh_budgets() $( .$await_ext )? .is_ok()
            }

            /// Applies a finished refresh to the cache or reports its failure.
            fn settle(&self, ticket: RefreshTicket, result: Result<Vec<BudgetSummary>>) -> Result<BudgetBoard> {
                match result {
                    Ok(mut summaries) => {
                        aggregate::sort_for_display(&mut summaries);
                        let applied = self.with_cache(|cache| cache.apply(ticket, summaries.clone()))?;
                        if applied {
                            self.publish(LedgerEvent::BudgetsRefreshed {
                                version: ticket.version(),
                            });
                        }
                        Ok(summaries)
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "budget refresh failed; keeping cached spending");
                        self.publish(LedgerEvent::RefreshFailed {
                            message: err.to_string(),
                        });
                        Err(err)
                    }
                }
            }

            /// Publishes [`LedgerEvent::BudgetMissing`] for an unlinked expense.
            fn report_missing_budget(&self, link: &LinkOutcome, transaction: &TransactionId) {
                if let LinkOutcome::NoBudget { category } = *link {
                    tracing::info!(category = %category, "no budget covers this expense");
                    self.publish(LedgerEvent::BudgetMissing {
                        category,
                        transaction: transaction.clone(),
                    });
                }
            }

            /// Sends an event to current subscribers.
            fn publish(&self, event: LedgerEvent) {
                if self.events.send(event).is_err() {
                    tracing::trace!("event dropped: no subscribers");
                }
            }

            /// Runs `op` with the cache locked.
            fn with_cache<R, F: FnOnce(&mut BudgetCache) -> R>(&self, op: F) -> Result<R> {
                let mut cache = self
                    .cache
                    .lock()
                    .map_err(|err| LedgerError::Storage(err.to_string().into()))?;
                Ok(op(&mut cache))
            }
        }

        #[doc = $pager_doc]
        #[derive(Debug)]
        pub struct $pager<'ledger, B: $backend_trait> {
            /// Ledger whose backend is paged.
            ledger: &'ledger $ledger<B>,
            /// Criteria sent with every page request.
            filter: TransactionFilter,
            /// Cursor of the next page; `None` before the first page.
            cursor: Option<String>,
            /// Set once the last page was returned.
            exhausted: bool,
        }

        impl<B: $backend_trait> $pager<'_, B> {
            /// Fetches the next page, or `None` after the last one.
            ///
            /// # Errors
            ///
            /// Returns the backend's error, or [`LedgerError::Api`] if the
            /// backend hands back the cursor it was given.
            #[tracing::instrument(skip_all)]
            pub $($async_kw)? fn next_page(&mut self) -> Result<Option<Vec<Transaction>>> {
                if self.exhausted {
                    return Ok(None);
                }
                let page = self
                    .ledger
                    .backend
                    .list_transactions(&self.filter, self.cursor.as_deref())
                    $( .$await_ext )? ?;
                if page.next_cursor.is_some() && page.next_cursor == self.cursor {
                    return Err(LedgerError::Api {
                        status: 200,
                        message: "pagination cursor did not advance".to_owned(),
                    });
                }
                tracing::trace!(items = page.items.len(), last = page.is_last(), "page fetched");
                self.exhausted = page.is_last();
                self.cursor = page.next_cursor;
                Ok(Some(page.items))
            }

            /// Starts over from the first page.
            #[inline]
            pub fn restart(&mut self) {
                self.cursor = None;
                self.exhausted = false;
            }

            /// Returns `true` once the last page was returned.
            #[inline]
            #[must_use]
            pub const fn is_exhausted(&self) -> bool {
                self.exhausted
            }
        }
    };
}

/// Builds the duplicate-category error for `existing`.
#[cfg(any(feature = "async", feature = "blocking"))]
fn duplicate(existing: &Budget) -> LedgerError {
    LedgerError::DuplicateCategory {
        category: existing.category.name().to_owned(),
        existing: existing.id.to_string(),
    }
}

// ── Async variant ───────────────────────────────────────────────────────

#[cfg(feature = "async")]
mod async_ledger {
    //! Async ledger.

    use std::sync::{Arc, Mutex};

    use chrono::NaiveDate;
    use tokio::sync::broadcast;

    use super::{BudgetBoard, BudgetDeletion, BudgetOutcome, TransactionOutcome, duplicate};
    use crate::aggregate::{self, BudgetSummary};
    use crate::backend::Backend;
    use crate::cache::{BudgetCache, RefreshTicket};
    use crate::clock::{Clock, SystemClock};
    use crate::error::{LedgerError, Result};
    use crate::events::{DEFAULT_EVENT_CAPACITY, LedgerEvent};
    use crate::linking::{self, ActiveBudgets, LinkOutcome};
    use crate::models::{
        Budget, BudgetDraft, BudgetEdit, BudgetId, BudgetPeriod, Transaction, TransactionChanges,
        TransactionDraft, TransactionEdit, TransactionFilter, TransactionId, TransactionType,
    };

    define_ledger! {
        ledger_name: Ledger,
        builder_name: LedgerBuilder,
        pager_name: TransactionPager,
        backend_trait: Backend,
        ledger_doc: "Async budget and transaction service.\n\nUse [`Ledger::builder()`] to construct an instance.",
        builder_doc: "Builder for constructing a [`Ledger`].",
        pager_doc: "Lazy, restartable pager over a transaction listing of a [`Ledger`].",
        async_kw: async,
        await_kw: await,
    }
}

// ── Blocking variant ────────────────────────────────────────────────────

#[cfg(feature = "blocking")]
mod blocking_ledger {
    //! Blocking ledger.

    use std::sync::{Arc, Mutex};

    use chrono::NaiveDate;
    use tokio::sync::broadcast;

    use super::{BudgetBoard, BudgetDeletion, BudgetOutcome, TransactionOutcome, duplicate};
    use crate::aggregate::{self, BudgetSummary};
    use crate::backend::BlockingBackend;
    use crate::cache::{BudgetCache, RefreshTicket};
    use crate::clock::{Clock, SystemClock};
    use crate::error::{LedgerError, Result};
    use crate::events::{DEFAULT_EVENT_CAPACITY, LedgerEvent};
    use crate::linking::{self, ActiveBudgets, LinkOutcome};
    use crate::models::{
        Budget, BudgetDraft, BudgetEdit, BudgetId, BudgetPeriod, Transaction, TransactionChanges,
        TransactionDraft, TransactionEdit, TransactionFilter, TransactionId, TransactionType,
    };

    define_ledger! {
        ledger_name: LedgerBlocking,
        builder_name: LedgerBlockingBuilder,
        pager_name: BlockingTransactionPager,
        backend_trait: BlockingBackend,
        ledger_doc: "Blocking budget and transaction service.\n\nUse [`LedgerBlocking::builder()`] to construct an instance.",
        builder_doc: "Builder for constructing a [`LedgerBlocking`].",
        pager_doc: "Lazy, restartable pager over a transaction listing of a [`LedgerBlocking`].",
    }
}

#[cfg(feature = "async")]
pub use async_ledger::{Ledger, LedgerBuilder, TransactionPager};
#[cfg(feature = "blocking")]
pub use blocking_ledger::{BlockingTransactionPager, LedgerBlocking, LedgerBlockingBuilder};

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use super::*;
    use crate::aggregate::{BudgetStatus, SpendingSource};
    use crate::backend::InMemoryBackend;
    use crate::clock::FixedClock;
    use crate::events::LedgerEvent;
    use crate::models::{
        BudgetDraft, BudgetEdit, BudgetPeriod, ExpenseCategory, TransactionDraft, TransactionEdit,
        TransactionFilter, TransactionType,
    };

    fn day(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, m, d).unwrap()
    }

    fn clock() -> FixedClock {
        FixedClock(day(1, 31))
    }

    fn food_budget() -> BudgetDraft {
        BudgetDraft::new(
            "Food & Dining",
            Decimal::new(500, 0),
            BudgetPeriod::Monthly,
            day(1, 1),
            day(1, 31),
        )
    }

    fn expense(category: &str, amount: Decimal, date: NaiveDate) -> TransactionDraft {
        TransactionDraft::new(TransactionType::Expense, amount, category, "Meal", date)
    }

    #[cfg(feature = "blocking")]
    mod blocking {
        use super::*;
        use crate::backend::BlockingBackend;

        fn ledger() -> LedgerBlocking<InMemoryBackend> {
            LedgerBlocking::builder()
                .backend(InMemoryBackend::new())
                .clock(clock())
                .build()
                .unwrap()
        }

        fn only_summary(ledger: &LedgerBlocking<InMemoryBackend>) -> BudgetSummary {
            let board = ledger.list_budgets(None).unwrap();
            assert_eq!(board.len(), 1);
            board.into_iter().next().unwrap()
        }

        #[test]
        fn builder_requires_backend() {
            let err = LedgerBlocking::<InMemoryBackend>::builder()
                .build()
                .unwrap_err();
            assert!(matches!(err, LedgerError::Config(_)));
        }

        #[test]
        fn first_expense_links_and_reduces_remaining() {
            let ledger = ledger();
            let budget = ledger.create_budget(&food_budget()).unwrap().budget;
            let outcome = ledger
                .create_transaction(&expense("Food & Dining", Decimal::new(4599, 2), day(1, 5)))
                .unwrap();
            assert_eq!(outcome.link, Some(LinkOutcome::Linked(budget.id.clone())));
            assert_eq!(outcome.transaction.linked_budget_id, Some(budget.id));
            assert!(outcome.refreshed);

            let summary = only_summary(&ledger);
            assert_eq!(summary.current_spending, Decimal::new(4599, 2));
            assert_eq!(summary.remaining_amount(), Decimal::new(45_401, 2));
            assert_eq!(summary.source, SpendingSource::Client);
        }

        #[test]
        fn spending_past_ceiling_is_over_budget() {
            let ledger = ledger();
            let _budget = ledger.create_budget(&food_budget()).unwrap();
            let _lunch = ledger
                .create_transaction(&expense("Food & Dining", Decimal::new(4599, 2), day(1, 5)))
                .unwrap();
            let _feast = ledger
                .create_transaction(&expense("Food & Dining", Decimal::new(470, 0), day(1, 20)))
                .unwrap();

            let summary = only_summary(&ledger);
            assert_eq!(summary.current_spending, Decimal::new(51_599, 2));
            assert_eq!(summary.utilization_percentage().round_dp(1), Decimal::new(1032, 1));
            assert!(summary.is_over_budget());
            assert_eq!(summary.status(), BudgetStatus::OverBudget);
        }

        #[test]
        fn recategorize_to_unbudgeted_category_unlinks() {
            let ledger = ledger();
            let _budget = ledger.create_budget(&food_budget()).unwrap();
            let lunch = ledger
                .create_transaction(&expense("Food & Dining", Decimal::new(4599, 2), day(1, 5)))
                .unwrap()
                .transaction;
            let _feast = ledger
                .create_transaction(&expense("Food & Dining", Decimal::new(470, 0), day(1, 20)))
                .unwrap();

            let mut events = ledger.subscribe();
            let outcome = ledger
                .update_transaction(&lunch.id, &TransactionEdit::new().category("Transport"))
                .unwrap();
            assert_eq!(outcome.transaction.linked_budget_id, None);
            assert_eq!(
                outcome.link,
                Some(LinkOutcome::NoBudget {
                    category: ExpenseCategory::Transport
                })
            );
            assert_eq!(only_summary(&ledger).current_spending, Decimal::new(470, 0));

            assert_eq!(
                events.try_recv().unwrap(),
                LedgerEvent::TransactionUpdated {
                    id: lunch.id.clone()
                }
            );
            assert_eq!(
                events.try_recv().unwrap(),
                LedgerEvent::BudgetMissing {
                    category: ExpenseCategory::Transport,
                    transaction: lunch.id,
                }
            );
        }

        #[test]
        fn overlapping_budget_for_category_rejected() {
            let ledger = ledger();
            let first = ledger.create_budget(&food_budget()).unwrap().budget;
            let overlapping = BudgetDraft::new(
                "Food & Dining",
                Decimal::new(900, 0),
                BudgetPeriod::Monthly,
                day(1, 15),
                day(2, 15),
            );
            let err = ledger.create_budget(&overlapping).unwrap_err();
            assert!(matches!(
                err,
                LedgerError::DuplicateCategory { category, existing }
                    if category == "Food & Dining" && existing == first.id.to_string()
            ));
            assert_eq!(ledger.backend().stored_budgets().unwrap().len(), 1);
        }

        #[test]
        fn duplicate_rejected_regardless_of_window() {
            let ledger = ledger();
            let _first = ledger.create_budget(&food_budget()).unwrap();
            let later = BudgetDraft::new(
                "Food & Dining",
                Decimal::new(100, 0),
                BudgetPeriod::Weekly,
                day(3, 1),
                day(3, 7),
            );
            let err = ledger.create_budget(&later).unwrap_err();
            assert!(matches!(err, LedgerError::DuplicateCategory { .. }));
        }

        #[test]
        fn delete_budget_keeps_transactions_unlinked() {
            let ledger = ledger();
            let budget = ledger.create_budget(&food_budget()).unwrap().budget;
            let lunch = ledger
                .create_transaction(&expense("Food & Dining", Decimal::new(4599, 2), day(1, 5)))
                .unwrap()
                .transaction;
            let feast = ledger
                .create_transaction(&expense("Food & Dining", Decimal::new(470, 0), day(1, 20)))
                .unwrap()
                .transaction;
            let _moved = ledger
                .update_transaction(&lunch.id, &TransactionEdit::new().category("Transport"))
                .unwrap();

            let deletion = ledger.delete_budget(&budget.id).unwrap();
            assert_eq!(deletion.unlinked, vec![feast.id.clone()]);
            assert_eq!(deletion.unlinked_count(), 1);

            let remaining = ledger.transaction(&feast.id).unwrap();
            assert_eq!(remaining.amount, Decimal::new(470, 0));
            assert_eq!(remaining.linked_budget_id, None);
            assert_eq!(ledger.backend().stored_transactions().unwrap().len(), 2);
            assert!(ledger.list_budgets(None).unwrap().is_empty());
        }

        #[test]
        fn delete_unlinks_every_linked_transaction() {
            let backend = InMemoryBackend::new().with_page_size(2);
            let ledger = LedgerBlocking::builder()
                .backend(backend)
                .clock(clock())
                .build()
                .unwrap();
            let budget = ledger.create_budget(&food_budget()).unwrap().budget;
            for d in 1..=5 {
                let _tx = ledger
                    .create_transaction(&expense("Food & Dining", Decimal::new(10, 0), day(1, d)))
                    .unwrap();
            }
            let deletion = ledger.delete_budget(&budget.id).unwrap();
            assert_eq!(deletion.unlinked_count(), 5);
            let stored = ledger.backend().stored_transactions().unwrap();
            assert_eq!(stored.len(), 5);
            assert!(stored.iter().all(|tx| tx.linked_budget_id.is_none()));
        }

        #[test]
        fn validation_errors_skip_the_backend() {
            let ledger = ledger();
            let draft = TransactionDraft::new(
                TransactionType::Expense,
                Decimal::ZERO,
                "Salary",
                "  ",
                day(2, 1),
            );
            let err = ledger.create_transaction(&draft).unwrap_err();
            let fields = err.validation().unwrap();
            assert!(fields.message_for("amount").is_some());
            assert!(fields.message_for("category").is_some());
            assert!(fields.message_for("description").is_some());
            assert!(fields.message_for("date").is_some());
            assert!(ledger.backend().stored_transactions().unwrap().is_empty());
        }

        #[test]
        fn income_never_links() {
            let ledger = ledger();
            let _budget = ledger.create_budget(&food_budget()).unwrap();
            let salary = TransactionDraft::new(
                TransactionType::Income,
                Decimal::new(3000, 0),
                "Salary",
                "January pay",
                day(1, 25),
            );
            let outcome = ledger.create_transaction(&salary).unwrap();
            assert_eq!(outcome.link, Some(LinkOutcome::NotApplicable));
            assert_eq!(outcome.transaction.linked_budget_id, None);
            assert_eq!(only_summary(&ledger).current_spending, Decimal::ZERO);
        }

        #[test]
        fn missing_budget_is_advisory() {
            let ledger = ledger();
            let mut events = ledger.subscribe();
            let outcome = ledger
                .create_transaction(&expense("Travel", Decimal::new(120, 0), day(1, 10)))
                .unwrap();
            assert_eq!(outcome.transaction.linked_budget_id, None);
            let _created = events.try_recv().unwrap();
            assert_eq!(
                events.try_recv().unwrap(),
                LedgerEvent::BudgetMissing {
                    category: ExpenseCategory::Travel,
                    transaction: outcome.transaction.id,
                }
            );
        }

        #[test]
        fn recategorize_links_to_one_budget() {
            let ledger = ledger();
            let _food = ledger.create_budget(&food_budget()).unwrap();
            let transport = ledger
                .create_budget(&BudgetDraft::new(
                    "Transport",
                    Decimal::new(200, 0),
                    BudgetPeriod::Monthly,
                    day(1, 1),
                    day(1, 31),
                ))
                .unwrap()
                .budget;
            let lunch = ledger
                .create_transaction(&expense("Food & Dining", Decimal::new(4599, 2), day(1, 5)))
                .unwrap()
                .transaction;
            let outcome = ledger
                .update_transaction(&lunch.id, &TransactionEdit::new().category("Transport"))
                .unwrap();
            assert_eq!(outcome.transaction.linked_budget_id, Some(transport.id));
        }

        #[test]
        fn edit_without_category_change_keeps_link() {
            let ledger = ledger();
            let budget = ledger.create_budget(&food_budget()).unwrap().budget;
            let lunch = ledger
                .create_transaction(&expense("Food & Dining", Decimal::new(4599, 2), day(1, 5)))
                .unwrap()
                .transaction;
            let outcome = ledger
                .update_transaction(
                    &lunch.id,
                    &TransactionEdit::new()
                        .category("Food & Dining")
                        .amount(Decimal::new(50, 0)),
                )
                .unwrap();
            assert_eq!(outcome.link, None);
            assert_eq!(outcome.transaction.linked_budget_id, Some(budget.id));
            assert_eq!(only_summary(&ledger).current_spending, Decimal::new(50, 0));
        }

        #[test]
        fn delete_transaction_reaggregates() {
            let ledger = ledger();
            let _budget = ledger.create_budget(&food_budget()).unwrap();
            let lunch = ledger
                .create_transaction(&expense("Food & Dining", Decimal::new(4599, 2), day(1, 5)))
                .unwrap()
                .transaction;
            assert!(ledger.delete_transaction(&lunch.id).unwrap());
            let cached = ledger.cached_budgets().unwrap();
            assert_eq!(cached[0].current_spending, Decimal::ZERO);
            let err = ledger.delete_transaction(&lunch.id).unwrap_err();
            assert!(err.is_not_found());
        }

        #[test]
        fn update_budget_checks_merged_window() {
            let ledger = ledger();
            let budget = ledger.create_budget(&food_budget()).unwrap().budget;
            let err = ledger
                .update_budget(&budget.id, &BudgetEdit::new().end_date(day(1, 1)))
                .unwrap_err();
            assert!(err.validation().unwrap().message_for("endDate").is_some());

            let outcome = ledger
                .update_budget(&budget.id, &BudgetEdit::new().amount(Decimal::new(600, 0)))
                .unwrap();
            assert_eq!(outcome.budget.amount, Decimal::new(600, 0));
            assert!(outcome.refreshed);

            let missing = ledger
                .update_budget(&BudgetId::from("nope"), &BudgetEdit::new())
                .unwrap_err();
            assert!(missing.is_not_found());
        }

        #[test]
        fn narrowing_window_reaggregates_spending() {
            let ledger = ledger();
            let budget = ledger.create_budget(&food_budget()).unwrap().budget;
            let _lunch = ledger
                .create_transaction(&expense("Food & Dining", Decimal::new(4599, 2), day(1, 5)))
                .unwrap();
            let feast = ledger
                .create_transaction(&expense("Food & Dining", Decimal::new(470, 0), day(1, 20)))
                .unwrap()
                .transaction;
            assert_eq!(only_summary(&ledger).current_spending, Decimal::new(51_599, 2));

            let outcome = ledger
                .update_budget(&budget.id, &BudgetEdit::new().end_date(day(1, 10)))
                .unwrap();
            assert_eq!(outcome.budget.end_date, day(1, 10));
            assert!(outcome.refreshed);

            let cached = ledger.cached_budgets().unwrap();
            assert_eq!(cached.len(), 1);
            assert_eq!(cached[0].current_spending, Decimal::new(4599, 2));
            let summary = only_summary(&ledger);
            assert_eq!(summary.current_spending, Decimal::new(4599, 2));
            assert!(!summary.is_over_budget());

            let kept = ledger.transaction(&feast.id).unwrap();
            assert_eq!(kept.amount, Decimal::new(470, 0));
            assert_eq!(kept.linked_budget_id, Some(budget.id));
        }

        #[test]
        fn update_budget_rejects_collision() {
            let ledger = LedgerBlocking::builder()
                .backend(InMemoryBackend::new())
                .clock(FixedClock(day(6, 1)))
                .build()
                .unwrap();
            let january = ledger.create_budget(&food_budget()).unwrap().budget;
            let march = ledger
                .create_budget(&BudgetDraft::new(
                    "Food & Dining",
                    Decimal::new(500, 0),
                    BudgetPeriod::Monthly,
                    day(3, 1),
                    day(3, 31),
                ))
                .unwrap()
                .budget;
            let err = ledger
                .update_budget(&march.id, &BudgetEdit::new().start_date(day(1, 20)))
                .unwrap_err();
            assert!(matches!(
                err,
                LedgerError::DuplicateCategory { existing, .. } if existing == january.id.to_string()
            ));
        }

        #[test]
        fn server_spending_wins() {
            let ledger = LedgerBlocking::builder()
                .backend(InMemoryBackend::new().with_server_spending(true))
                .clock(clock())
                .build()
                .unwrap();
            let _budget = ledger.create_budget(&food_budget()).unwrap();
            let _lunch = ledger
                .create_transaction(&expense("Food & Dining", Decimal::new(4599, 2), day(1, 5)))
                .unwrap();
            let summary = only_summary(&ledger);
            assert_eq!(summary.source, SpendingSource::Server);
            assert_eq!(summary.current_spending, Decimal::new(4599, 2));
            let refreshed = ledger.refresh_spending().unwrap();
            assert_eq!(refreshed[0].current_spending, Decimal::new(4599, 2));
        }

        #[test]
        fn failed_refresh_keeps_cache_and_reports() {
            let ledger = ledger();
            let budget = ledger.create_budget(&food_budget()).unwrap().budget;
            let _lunch = ledger
                .create_transaction(&expense("Food & Dining", Decimal::new(4599, 2), day(1, 5)))
                .unwrap();
            let version = ledger.cache_version().unwrap();

            ledger.backend().set_listing_unavailable(true);
            let mut events = ledger.subscribe();
            assert!(ledger.refresh_budgets().is_err());
            assert!(matches!(
                events.try_recv().unwrap(),
                LedgerEvent::RefreshFailed { .. }
            ));
            assert_eq!(ledger.cache_version().unwrap(), version);

            let summary = ledger.budget(&budget.id).unwrap();
            assert_eq!(summary.source, SpendingSource::Cached);
            assert_eq!(summary.current_spending, Decimal::new(4599, 2));

            let outcome = ledger
                .create_transaction(&expense("Food & Dining", Decimal::new(10, 0), day(1, 6)))
                .unwrap();
            assert!(!outcome.refreshed);
        }

        #[test]
        fn no_fabricated_zero_without_any_source() {
            let ledger = ledger();
            let _budget = ledger.create_budget(&food_budget()).unwrap();
            let fresh = LedgerBlocking::builder()
                .backend(InMemoryBackend::new().with_data(
                    Vec::new(),
                    ledger.backend().stored_budgets().unwrap(),
                ))
                .clock(clock())
                .build()
                .unwrap();
            fresh.backend().set_listing_unavailable(true);
            assert!(fresh.list_budgets(None).is_err());
        }

        #[test]
        fn refresh_versions_increase() {
            let ledger = ledger();
            let _budget = ledger.create_budget(&food_budget()).unwrap();
            let before = ledger.cache_version().unwrap();
            let _board = ledger.refresh_budgets().unwrap();
            assert!(ledger.cache_version().unwrap() > before);
        }

        #[test]
        fn pager_is_lazy_and_restartable() {
            let ledger = LedgerBlocking::builder()
                .backend(InMemoryBackend::new().with_page_size(2))
                .clock(clock())
                .build()
                .unwrap();
            for d in 1..=3 {
                let _tx = ledger
                    .create_transaction(&expense("Travel", Decimal::new(5, 0), day(1, d)))
                    .unwrap();
            }
            let mut pager = ledger.transaction_pages(TransactionFilter::new());
            assert_eq!(pager.next_page().unwrap().unwrap().len(), 2);
            assert_eq!(pager.next_page().unwrap().unwrap().len(), 1);
            assert!(pager.is_exhausted());
            assert!(pager.next_page().unwrap().is_none());
            pager.restart();
            assert_eq!(pager.next_page().unwrap().unwrap().len(), 2);

            let all = ledger
                .list_transactions(&TransactionFilter::new().search("meal"))
                .unwrap();
            assert_eq!(all.len(), 3);
            assert!(all.windows(2).all(|pair| pair[0].date >= pair[1].date));
        }

        #[test]
        fn budgets_listed_by_period() {
            let ledger = ledger();
            let _food = ledger.create_budget(&food_budget()).unwrap();
            assert_eq!(ledger.list_budgets(Some(BudgetPeriod::Monthly)).unwrap().len(), 1);
            assert!(ledger.list_budgets(Some(BudgetPeriod::Yearly)).unwrap().is_empty());
        }

        #[test]
        fn new_budget_does_not_adopt_old_expenses() {
            let ledger = ledger();
            let _early = ledger
                .create_transaction(&expense("Food & Dining", Decimal::new(30, 0), day(1, 3)))
                .unwrap();
            let budget = ledger.create_budget(&food_budget()).unwrap().budget;
            assert_eq!(ledger.budget(&budget.id).unwrap().current_spending, Decimal::ZERO);
            let direct = ledger.backend().list_budgets(None).unwrap();
            assert_eq!(direct[0].current_spending, None);
        }
    }

    #[cfg(feature = "async")]
    mod async_tests {
        use super::*;

        fn ledger() -> Ledger<InMemoryBackend> {
            Ledger::builder()
                .backend(InMemoryBackend::new())
                .clock(clock())
                .build()
                .unwrap()
        }

        #[tokio::test]
        async fn budget_lifecycle_over_async_ledger() {
            let ledger = ledger();
            let budget = ledger.create_budget(&food_budget()).await.unwrap().budget;
            let lunch = ledger
                .create_transaction(&expense("Food & Dining", Decimal::new(4599, 2), day(1, 5)))
                .await
                .unwrap()
                .transaction;
            let board = ledger.list_budgets(None).await.unwrap();
            assert_eq!(board[0].remaining_amount(), Decimal::new(45_401, 2));

            let feast = ledger
                .create_transaction(&expense("Food & Dining", Decimal::new(470, 0), day(1, 20)))
                .await
                .unwrap()
                .transaction;
            let over = ledger.budget(&budget.id).await.unwrap();
            assert!(over.is_over_budget());

            let _moved = ledger
                .update_transaction(&lunch.id, &TransactionEdit::new().category("Transport"))
                .await
                .unwrap();
            let after_move = ledger.budget(&budget.id).await.unwrap();
            assert_eq!(after_move.current_spending, Decimal::new(470, 0));

            let err = ledger.create_budget(&food_budget()).await.unwrap_err();
            assert!(matches!(err, LedgerError::DuplicateCategory { .. }));

            let deletion = ledger.delete_budget(&budget.id).await.unwrap();
            assert_eq!(deletion.unlinked, vec![feast.id.clone()]);
            let remaining = ledger.transaction(&feast.id).await.unwrap();
            assert_eq!(remaining.linked_budget_id, None);
        }

        #[tokio::test]
        async fn events_follow_mutations() {
            let ledger = ledger();
            let mut events = ledger.subscribe();
            let budget = ledger.create_budget(&food_budget()).await.unwrap().budget;
            assert_eq!(
                events.recv().await.unwrap(),
                LedgerEvent::BudgetCreated {
                    id: budget.id.clone()
                }
            );
            assert!(matches!(
                events.recv().await.unwrap(),
                LedgerEvent::BudgetsRefreshed { version: 1 }
            ));
            let cached = ledger.cached_budgets().unwrap();
            assert_eq!(cached[0].budget.id, budget.id);
        }

        #[tokio::test]
        async fn async_pager_drains() {
            let ledger = Ledger::builder()
                .backend(InMemoryBackend::new().with_page_size(1))
                .clock(clock())
                .build()
                .unwrap();
            for d in 1..=3 {
                let _tx = ledger
                    .create_transaction(&expense("Travel", Decimal::new(5, 0), day(1, d)))
                    .await
                    .unwrap();
            }
            let mut pager = ledger.transaction_pages(TransactionFilter::new());
            let mut seen = 0;
            while let Some(page) = pager.next_page().await.unwrap() {
                seen += page.len();
            }
            assert_eq!(seen, 3);
        }
    }
}
