use std::sync::Mutex;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::transaction::{Transaction, TransactionKind};
use crate::errors::{FinanceError, Result};
use crate::ledger::LedgerProvider;

/// Headline totals over the whole book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerSummary {
    pub total_income: f64,
    pub total_expense: f64,
    pub balance: f64,
    /// Share of income not spent, as a percentage. Zero without income.
    pub savings_rate: f64,
    pub transaction_count: usize,
}

/// In-memory transaction collection, most recent first.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct TransactionBook {
    transactions: Vec<Transaction>,
}

impl TransactionBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates and records a transaction at the front of the book.
    pub fn add(
        &mut self,
        description: impl Into<String>,
        amount: f64,
        date: NaiveDate,
        kind: TransactionKind,
        category: impl Into<String>,
    ) -> Result<Uuid> {
        let description = description.into();
        let category = category.into();
        if description.trim().is_empty() {
            return Err(FinanceError::Validation(
                "transaction description is required".into(),
            ));
        }
        if !amount.is_finite() || amount <= 0.0 {
            return Err(FinanceError::Validation(
                "transaction amount must be a positive number".into(),
            ));
        }
        if category.trim().is_empty() {
            return Err(FinanceError::Validation(
                "transaction category is required".into(),
            ));
        }
        let transaction = Transaction::new(description, amount, date, kind, category);
        let id = transaction.id;
        self.transactions.insert(0, transaction);
        tracing::debug!(%id, "transaction recorded");
        Ok(id)
    }

    /// Applies an edit to an existing transaction.
    pub fn update(&mut self, id: Uuid, apply: impl FnOnce(&mut Transaction)) -> Result<()> {
        let transaction = self
            .transactions
            .iter_mut()
            .find(|txn| txn.id == id)
            .ok_or(FinanceError::TransactionNotFound(id))?;
        apply(transaction);
        Ok(())
    }

    pub fn remove(&mut self, id: Uuid) -> Result<Transaction> {
        let index = self
            .transactions
            .iter()
            .position(|txn| txn.id == id)
            .ok_or(FinanceError::TransactionNotFound(id))?;
        Ok(self.transactions.remove(index))
    }

    pub fn get(&self, id: Uuid) -> Option<&Transaction> {
        self.transactions.iter().find(|txn| txn.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Transaction> {
        self.transactions.iter()
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// Case-insensitive search over description and category.
    pub fn search(&self, term: &str) -> Vec<&Transaction> {
        let term = term.to_lowercase();
        self.transactions
            .iter()
            .filter(|txn| {
                txn.description.to_lowercase().contains(&term)
                    || txn.category.to_lowercase().contains(&term)
            })
            .collect()
    }

    pub fn total(&self, kind: TransactionKind) -> f64 {
        self.transactions
            .iter()
            .filter(|txn| txn.kind == kind)
            .map(|txn| txn.amount)
            .sum()
    }

    pub fn summary(&self) -> LedgerSummary {
        let total_income = self.total(TransactionKind::Income);
        let total_expense = self.total(TransactionKind::Expense);
        let savings_rate = if total_income > 0.0 {
            (total_income - total_expense) / total_income * 100.0
        } else {
            0.0
        };
        LedgerSummary {
            total_income,
            total_expense,
            balance: total_income - total_expense,
            savings_rate,
            transaction_count: self.transactions.len(),
        }
    }
}

impl LedgerProvider for TransactionBook {
    fn transactions(&self) -> Vec<Transaction> {
        self.transactions.clone()
    }
}

// Lets a host share one mutable book with the engines via `Arc<Mutex<_>>`.
impl LedgerProvider for Mutex<TransactionBook> {
    fn transactions(&self) -> Vec<Transaction> {
        self.lock().map(|book| book.transactions.clone()).unwrap_or_default()
    }
}
