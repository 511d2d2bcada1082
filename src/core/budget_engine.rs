use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::clock::Clock;
use crate::domain::budget::{
    Budget, BudgetAlert, BudgetAlertKind, BudgetDraft, BudgetPatch, BudgetStatus,
};
use crate::domain::period::{self, BudgetPeriod};
use crate::domain::transaction::{Transaction, TransactionKind};
use crate::errors::{FinanceError, Result};
use crate::ledger::{DateRange, LedgerProvider};
use crate::notify::{Notification, NotificationKind, NotificationSink, Severity};
use crate::storage::StateStore;

const STORE_KEY: &str = "budgets";
const MAX_AMOUNT: f64 = 1_000_000.0;
const SPENDING_FAST_FACTOR: f64 = 1.5;
const PERIOD_ENDING_DAYS: i64 = 3;

/// Owns the budget collection and keeps its derived fields consistent with
/// the ledger. Collaborators are injected; every one of them is optional
/// except the clock.
pub struct BudgetEngine {
    budgets: Vec<Budget>,
    clock: Arc<dyn Clock>,
    ledger: Option<Arc<dyn LedgerProvider>>,
    store: Option<Arc<dyn StateStore>>,
    sink: Option<Arc<dyn NotificationSink>>,
}

impl BudgetEngine {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            budgets: Vec::new(),
            clock,
            ledger: None,
            store: None,
            sink: None,
        }
    }

    pub fn with_ledger(mut self, ledger: Arc<dyn LedgerProvider>) -> Self {
        self.ledger = Some(ledger);
        self
    }

    pub fn with_store(mut self, store: Arc<dyn StateStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn NotificationSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Restores the persisted collection and brings it up to date.
    ///
    /// A blob that fails to parse is discarded with a warning; the engine
    /// continues from an empty collection.
    pub fn load(&mut self) {
        let Some(store) = self.store.clone() else {
            return;
        };
        match store.load(STORE_KEY) {
            Ok(Some(blob)) => match serde_json::from_str::<Vec<Budget>>(&blob) {
                Ok(budgets) => {
                    self.budgets = budgets;
                    self.recompute_all();
                }
                Err(err) => {
                    tracing::warn!("discarding corrupt budget state: {err}");
                    self.budgets.clear();
                }
            },
            Ok(None) => {}
            Err(err) => tracing::warn!("budget state unavailable: {err}"),
        }
    }

    /// Validates the draft, registers the budget, persists, and announces it.
    pub fn create(&mut self, draft: BudgetDraft) -> Result<Budget> {
        validate_draft(&draft)?;
        let now = self.clock.now();
        let period = draft.period.unwrap_or(BudgetPeriod::Monthly);
        let start_date = draft.start_date.unwrap_or_else(|| now.date_naive());
        let end_date = period.end_date(start_date);
        let days_elapsed = period::days_elapsed(start_date, now);
        let days_remaining = period::days_remaining(end_date, now);
        let window = (days_elapsed + days_remaining).max(1);

        let mut budget = Budget {
            id: Uuid::new_v4(),
            name: draft.name.trim().to_string(),
            amount: draft.amount,
            period,
            categories: draft.categories,
            start_date,
            end_date,
            description: draft.description.unwrap_or_default(),
            actual_spent: 0.0,
            remaining: draft.amount,
            days_elapsed,
            days_remaining,
            daily_budget: draft.amount / window as f64,
            daily_average: 0.0,
            projected_spend: 0.0,
            variance: 0.0,
            status: BudgetStatus::Excellent,
            alerts: Vec::new(),
            created_at: now,
            updated_at: now,
            version: 1,
        };
        refresh(&mut budget, &self.ledger_snapshot(), now);
        let created = budget.clone();
        self.budgets.push(budget);
        self.persist();
        self.send(
            NotificationKind::BudgetCreated,
            "Budgets",
            format!("Created budget {}", created.name),
            Severity::Normal,
        );
        tracing::info!(budget = %created.id, "budget created");
        Ok(created)
    }

    /// Re-derives every tracked field of one budget from the ledger.
    pub fn recompute(&mut self, id: Uuid) -> Result<Budget> {
        let transactions = self.ledger_snapshot();
        let now = self.clock.now();
        let budget = self.budget_mut(id)?;
        refresh(budget, &transactions, now);
        Ok(budget.clone())
    }

    /// Refreshes every budget, persists, and forwards active alerts to the
    /// notification sink.
    pub fn recompute_all(&mut self) {
        let transactions = self.ledger_snapshot();
        let now = self.clock.now();
        for budget in &mut self.budgets {
            refresh(budget, &transactions, now);
        }
        self.persist();
        self.forward_alerts();
    }

    /// Merges the patch, bumps the version, recomputes, and persists.
    pub fn update(&mut self, id: Uuid, patch: BudgetPatch) -> Result<Budget> {
        validate_patch(&patch)?;
        let transactions = self.ledger_snapshot();
        let now = self.clock.now();
        let budget = self.budget_mut(id)?;
        if let Some(name) = patch.name {
            budget.name = name.trim().to_string();
        }
        if let Some(amount) = patch.amount {
            budget.amount = amount;
        }
        if let Some(categories) = patch.categories {
            budget.categories = categories;
        }
        if let Some(description) = patch.description {
            budget.description = description;
        }
        let window_changed = patch.period.is_some() || patch.start_date.is_some();
        if let Some(period) = patch.period {
            budget.period = period;
        }
        if let Some(start_date) = patch.start_date {
            budget.start_date = start_date;
        }
        if window_changed {
            budget.end_date = budget.period.end_date(budget.start_date);
        }
        budget.version += 1;
        refresh(budget, &transactions, now);
        let updated = budget.clone();
        self.persist();
        self.send(
            NotificationKind::BudgetUpdated,
            "Budgets",
            format!("Updated budget {}", updated.name),
            Severity::Normal,
        );
        Ok(updated)
    }

    /// Removes the budget permanently.
    pub fn delete(&mut self, id: Uuid) -> Result<Budget> {
        let index = self
            .budgets
            .iter()
            .position(|b| b.id == id)
            .ok_or(FinanceError::BudgetNotFound(id))?;
        let removed = self.budgets.remove(index);
        self.persist();
        tracing::info!(budget = %removed.id, "budget deleted");
        Ok(removed)
    }

    /// Clones a budget under a fresh identity with tracking reset.
    pub fn duplicate(&mut self, id: Uuid) -> Result<Budget> {
        let source = self
            .get(id)
            .ok_or(FinanceError::BudgetNotFound(id))?
            .clone();
        let now = self.clock.now();
        let mut copy = source.clone();
        copy.id = Uuid::new_v4();
        copy.name = format!("{} (copy)", source.name);
        copy.actual_spent = 0.0;
        copy.remaining = copy.amount;
        copy.alerts.clear();
        copy.created_at = now;
        copy.updated_at = now;
        copy.version = 1;
        self.budgets.push(copy.clone());
        self.persist();
        Ok(copy)
    }

    /// Periodic sweep: closes out budgets whose window has ended.
    ///
    /// Idempotent. Exceeded budgets keep their status; everything else past
    /// its end date is marked expired after a final stats pass.
    pub fn check_expired_budgets(&mut self) {
        let transactions = self.ledger_snapshot();
        let now = self.clock.now();
        let today = now.date_naive();
        for budget in &mut self.budgets {
            if budget.end_date < today {
                refresh(budget, &transactions, now);
                if budget.status != BudgetStatus::Exceeded {
                    budget.status = BudgetStatus::Expired;
                }
            }
        }
        self.persist();
    }

    pub fn get(&self, id: Uuid) -> Option<&Budget> {
        self.budgets.iter().find(|b| b.id == id)
    }

    pub fn budgets(&self) -> &[Budget] {
        &self.budgets
    }

    pub fn len(&self) -> usize {
        self.budgets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.budgets.is_empty()
    }

    fn budget_mut(&mut self, id: Uuid) -> Result<&mut Budget> {
        self.budgets
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or(FinanceError::BudgetNotFound(id))
    }

    fn ledger_snapshot(&self) -> Vec<Transaction> {
        self.ledger
            .as_ref()
            .map(|ledger| ledger.transactions())
            .unwrap_or_default()
    }

    fn persist(&self) {
        let Some(store) = self.store.as_ref() else {
            return;
        };
        match serde_json::to_string_pretty(&self.budgets) {
            Ok(blob) => {
                if let Err(err) = store.save(STORE_KEY, &blob) {
                    tracing::warn!("failed to persist budgets: {err}");
                }
            }
            Err(err) => tracing::warn!("failed to encode budgets: {err}"),
        }
    }

    fn forward_alerts(&self) {
        let Some(sink) = self.sink.as_ref() else {
            return;
        };
        for budget in &self.budgets {
            for alert in &budget.alerts {
                sink.notify(Notification {
                    kind: NotificationKind::BudgetAlert,
                    title: format!("Budget alert: {}", budget.name),
                    message: alert.message.clone(),
                    severity: alert.severity,
                });
            }
        }
    }

    fn send(&self, kind: NotificationKind, title: &str, message: String, severity: Severity) {
        if let Some(sink) = self.sink.as_ref() {
            sink.notify(Notification {
                kind,
                title: title.to_string(),
                message,
                severity,
            });
        }
    }
}

fn validate_draft(draft: &BudgetDraft) -> Result<()> {
    if draft.name.trim().chars().count() < 2 {
        return Err(FinanceError::Validation(
            "budget name must be at least 2 characters".into(),
        ));
    }
    validate_amount(draft.amount)?;
    if draft.categories.is_empty() {
        return Err(FinanceError::Validation(
            "budget needs at least one category".into(),
        ));
    }
    Ok(())
}

fn validate_patch(patch: &BudgetPatch) -> Result<()> {
    if let Some(name) = patch.name.as_deref() {
        if name.trim().chars().count() < 2 {
            return Err(FinanceError::Validation(
                "budget name must be at least 2 characters".into(),
            ));
        }
    }
    if let Some(amount) = patch.amount {
        validate_amount(amount)?;
    }
    if let Some(categories) = patch.categories.as_ref() {
        if categories.is_empty() {
            return Err(FinanceError::Validation(
                "budget needs at least one category".into(),
            ));
        }
    }
    Ok(())
}

fn validate_amount(amount: f64) -> Result<()> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(FinanceError::Validation(
            "budget amount must be a positive number".into(),
        ));
    }
    if amount > MAX_AMOUNT {
        return Err(FinanceError::Validation("budget amount is too large".into()));
    }
    Ok(())
}

/// One stats pass: spend, day counts, projections, status, alerts.
fn refresh(budget: &mut Budget, transactions: &[Transaction], now: DateTime<Utc>) {
    let range = DateRange::new(budget.start_date, budget.end_date);
    let spent: f64 = transactions
        .iter()
        .filter(|txn| {
            txn.kind == TransactionKind::Expense
                && budget.covers_category(&txn.category)
                && range.contains(txn.date)
        })
        .map(|txn| txn.amount)
        .sum();

    budget.actual_spent = spent;
    budget.remaining = (budget.amount - spent).max(0.0);
    budget.days_elapsed = period::days_elapsed(budget.start_date, now);
    budget.days_remaining = period::days_remaining(budget.end_date, now);
    budget.daily_average = if budget.days_elapsed > 0 {
        spent / budget.days_elapsed as f64
    } else {
        0.0
    };
    budget.projected_spend = budget.daily_average * budget.days_remaining as f64;
    budget.variance = budget.remaining - budget.projected_spend;
    budget.status = BudgetStatus::classify(budget.spent_pct(), budget.days_pct());
    budget.alerts = build_alerts(budget, now);
    budget.updated_at = now;
}

/// Alert conditions are evaluated independently; several can hold at once.
fn build_alerts(budget: &Budget, now: DateTime<Utc>) -> Vec<BudgetAlert> {
    let mut alerts = Vec::new();
    let percentage = budget.spent_pct();

    if percentage >= 100.0 {
        alerts.push(BudgetAlert {
            kind: BudgetAlertKind::Exceeded,
            message: format!("Budget {} is fully spent", budget.name),
            severity: Severity::High,
            raised_at: now,
        });
    }
    if (80.0..100.0).contains(&percentage) {
        alerts.push(BudgetAlert {
            kind: BudgetAlertKind::Warning,
            message: format!("Budget {} is at {:.1}% of its cap", budget.name, percentage),
            severity: Severity::Medium,
            raised_at: now,
        });
    }
    if budget.daily_average > budget.daily_budget * SPENDING_FAST_FACTOR {
        alerts.push(BudgetAlert {
            kind: BudgetAlertKind::SpendingFast,
            message: format!("Spending on {} is outpacing the plan", budget.name),
            severity: Severity::Medium,
            raised_at: now,
        });
    }
    if budget.days_remaining <= PERIOD_ENDING_DAYS {
        alerts.push(BudgetAlert {
            kind: BudgetAlertKind::PeriodEnding,
            message: format!(
                "Budget {} ends in {} days",
                budget.name, budget.days_remaining
            ),
            severity: Severity::Low,
            raised_at: now,
        });
    }
    alerts
}
