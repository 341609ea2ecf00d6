//! Version-stamped budget spending cache.
//!
//! Every refresh takes a [`RefreshTicket`] before it starts fetching.
//! Tickets are strictly increasing, and a result is only applied if its
//! ticket is newer than the last applied one, so a slow response can
//! never overwrite a fresher one.

use rust_decimal::Decimal;

use crate::aggregate::BudgetSummary;
use crate::models::BudgetId;

/// Proof that a refresh was started at a given version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RefreshTicket(u64);

impl RefreshTicket {
    /// Version this ticket will publish.
    #[inline]
    #[must_use]
    pub const fn version(self) -> u64 {
        self.0
    }
}

/// Last known budget summaries.
#[derive(Debug, Clone, Default)]
pub struct BudgetCache {
    /// Highest ticket handed out.
    issued: u64,
    /// Version of `summaries`; `0` before the first refresh.
    applied: u64,
    /// Summaries from the newest applied refresh.
    summaries: Vec<BudgetSummary>,
}

impl BudgetCache {
    /// Creates an empty cache.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            issued: 0,
            applied: 0,
            summaries: Vec::new(),
        }
    }

    /// Reserves the next version for a refresh about to start.
    #[inline]
    pub const fn begin_refresh(&mut self) -> RefreshTicket {
        self.issued = self.issued.saturating_add(1);
        RefreshTicket(self.issued)
    }

    /// Replaces the cached summaries unless a newer refresh was already
    /// applied. Returns `true` if the summaries were stored.
    #[inline]
    pub fn apply(&mut self, ticket: RefreshTicket, summaries: Vec<BudgetSummary>) -> bool {
        if ticket.0 <= self.applied {
            tracing::warn!(
                ticket = ticket.0,
                applied = self.applied,
                "discarding stale budget refresh"
            );
            return false;
        }
        self.applied = ticket.0;
        self.summaries = summaries;
        true
    }

    /// Version of the visible summaries.
    #[inline]
    #[must_use]
    pub const fn version(&self) -> u64 {
        self.applied
    }

    /// Summaries from the newest applied refresh.
    #[inline]
    #[must_use]
    pub fn summaries(&self) -> &[BudgetSummary] {
        &self.summaries
    }

    /// Last known spending of `budget`.
    #[inline]
    #[must_use]
    pub fn spending_for(&self, budget: &BudgetId) -> Option<Decimal> {
        self.summaries
            .iter()
            .find(|summary| summary.budget.id == *budget)
            .map(|summary| summary.current_spending)
    }
}
