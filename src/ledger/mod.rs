//! Read-only access to the transaction collection shared by the engines.
//!
//! The collection itself is owned by a collaborator; engines see it through
//! [`LedgerProvider`] and tolerate it being absent, which reads as an empty
//! ledger rather than an error.

pub mod book;

pub use book::{LedgerSummary, TransactionBook};

use chrono::NaiveDate;

use crate::domain::transaction::{Transaction, TransactionKind};

/// Supplies a snapshot of the transaction collection, most recent first.
pub trait LedgerProvider: Send + Sync {
    fn transactions(&self) -> Vec<Transaction>;
}

/// Inclusive calendar-date window used for ledger filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

/// Sums amounts of transactions matching `kind`, optionally within `range`.
pub fn total_by_kind(
    provider: Option<&dyn LedgerProvider>,
    kind: TransactionKind,
    range: Option<DateRange>,
) -> f64 {
    transactions_matching(provider, |txn| {
        txn.kind == kind && range.map_or(true, |r| r.contains(txn.date))
    })
    .iter()
    .map(|txn| txn.amount)
    .sum()
}

/// Collects the transactions satisfying `predicate`; empty when the provider
/// is absent.
pub fn transactions_matching(
    provider: Option<&dyn LedgerProvider>,
    predicate: impl Fn(&Transaction) -> bool,
) -> Vec<Transaction> {
    match provider {
        Some(provider) => provider
            .transactions()
            .into_iter()
            .filter(|txn| predicate(txn))
            .collect(),
        None => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn absent_provider_reads_as_empty() {
        assert_eq!(total_by_kind(None, TransactionKind::Expense, None), 0.0);
        assert!(transactions_matching(None, |_| true).is_empty());
    }

    #[test]
    fn range_endpoints_are_inclusive() {
        let range = DateRange::new(date(2025, 1, 1), date(2025, 1, 31));
        assert!(range.contains(date(2025, 1, 1)));
        assert!(range.contains(date(2025, 1, 31)));
        assert!(!range.contains(date(2024, 12, 31)));
        assert!(!range.contains(date(2025, 2, 1)));
    }
}
