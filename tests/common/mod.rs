#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use finance_core::clock::ManualClock;
use finance_core::domain::transaction::TransactionKind;
use finance_core::ledger::TransactionBook;
use finance_core::notify::{Notification, NotificationKind, NotificationSink};

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn noon(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
}

pub fn clock_at(y: i32, m: u32, d: u32) -> Arc<ManualClock> {
    Arc::new(ManualClock::new(noon(y, m, d)))
}

/// Captures everything the engines notify so tests can assert on it.
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<Notification>>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn kinds(&self) -> Vec<NotificationKind> {
        self.events.lock().unwrap().iter().map(|n| n.kind).collect()
    }

    pub fn count_of(&self, kind: NotificationKind) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|n| n.kind == kind)
            .count()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }
}

impl NotificationSink for RecordingSink {
    fn notify(&self, notification: Notification) {
        self.events.lock().unwrap().push(notification);
    }
}

/// A shared ledger the engines can watch while tests mutate it.
pub fn shared_book() -> Arc<Mutex<TransactionBook>> {
    Arc::new(Mutex::new(TransactionBook::new()))
}

pub fn add_expense(
    book: &Arc<Mutex<TransactionBook>>,
    description: &str,
    amount: f64,
    on: NaiveDate,
    category: &str,
) {
    book.lock()
        .unwrap()
        .add(description, amount, on, TransactionKind::Expense, category)
        .expect("add expense");
}

pub fn add_income(
    book: &Arc<Mutex<TransactionBook>>,
    description: &str,
    amount: f64,
    on: NaiveDate,
    category: &str,
) {
    book.lock()
        .unwrap()
        .add(description, amount, on, TransactionKind::Income, category)
        .expect("add income");
}
