use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::clock::Clock;
use crate::domain::goal::{
    Contribution, ContributionOrigin, Goal, GoalDraft, GoalPatch, GoalStatus, Milestone,
};
use crate::domain::period;
use crate::errors::{FinanceError, Result};
use crate::ledger::{self, LedgerProvider};
use crate::notify::{Notification, NotificationKind, NotificationSink, Severity};
use crate::storage::StateStore;

const STORE_KEY: &str = "goals";
const REMINDER_PROGRESS_CUTOFF: f64 = 50.0;

/// What one stats pass changed; drives the one-shot notifications.
struct RefreshDelta {
    old_status: GoalStatus,
    new_status: GoalStatus,
    milestones_reached: Vec<u8>,
}

impl RefreshDelta {
    fn has_news(&self) -> bool {
        !self.milestones_reached.is_empty() || self.old_status != self.new_status
    }
}

/// Owns the goal collection: contributions, streaks, milestone achievement,
/// and status notifications. Collaborators are injected; every one of them is
/// optional except the clock.
pub struct GoalEngine {
    goals: Vec<Goal>,
    clock: Arc<dyn Clock>,
    ledger: Option<Arc<dyn LedgerProvider>>,
    store: Option<Arc<dyn StateStore>>,
    sink: Option<Arc<dyn NotificationSink>>,
}

impl GoalEngine {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            goals: Vec::new(),
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
            Ok(Some(blob)) => match serde_json::from_str::<Vec<Goal>>(&blob) {
                Ok(goals) => {
                    self.goals = goals;
                    self.recompute_all();
                }
                Err(err) => {
                    tracing::warn!("discarding corrupt goal state: {err}");
                    self.goals.clear();
                }
            },
            Ok(None) => {}
            Err(err) => tracing::warn!("goal state unavailable: {err}"),
        }
    }

    /// Validates the draft, registers the goal with its milestone ladder,
    /// persists, and announces it.
    pub fn create(&mut self, draft: GoalDraft) -> Result<Goal> {
        let now = self.clock.now();
        validate_draft(&draft, now)?;
        let start_date = draft.start_date.unwrap_or_else(|| now.date_naive());
        let initial = draft.initial_amount.unwrap_or(0.0);

        let mut goal = Goal {
            id: Uuid::new_v4(),
            title: draft.title.trim().to_string(),
            description: draft.description.unwrap_or_default(),
            target_amount: draft.target_amount,
            current_amount: initial,
            category: draft.category.unwrap_or_else(|| "other".into()),
            start_date,
            deadline: draft.deadline,
            progress: 0.0,
            days_elapsed: 0,
            days_remaining: 0,
            daily_required: 0.0,
            status: GoalStatus::New,
            milestones: Milestone::ladder(draft.target_amount),
            contributions: Vec::new(),
            last_contribution: None,
            streak: 0,
            created_at: now,
            updated_at: now,
            version: 1,
        };
        let delta = refresh(&mut goal, now);
        let created = goal.clone();
        self.goals.push(goal);
        self.persist();
        self.announce(&created, &delta);
        self.send(
            NotificationKind::GoalCreated,
            "Savings goals",
            format!("Created goal \"{}\"", created.title),
            Severity::Normal,
        );
        tracing::info!(goal = %created.id, "goal created");
        Ok(created)
    }

    /// Re-derives progress, day counts, status, and milestones for one goal.
    pub fn recompute(&mut self, id: Uuid) -> Result<Goal> {
        let now = self.clock.now();
        let (snapshot, delta) = {
            let goal = self.goal_mut(id)?;
            let delta = refresh(goal, now);
            (goal.clone(), delta)
        };
        self.persist();
        self.announce(&snapshot, &delta);
        Ok(snapshot)
    }

    /// Refreshes every goal, persists, and emits the one-shot notifications
    /// for status transitions and newly reached milestones.
    pub fn recompute_all(&mut self) {
        let now = self.clock.now();
        let mut news = Vec::new();
        for goal in &mut self.goals {
            let delta = refresh(goal, now);
            if delta.has_news() {
                news.push((goal.clone(), delta));
            }
        }
        self.persist();
        for (goal, delta) in news {
            self.announce(&goal, &delta);
        }
    }

    /// Appends a manual contribution, updates the streak, and recomputes.
    ///
    /// The streak compares calendar days: a second contribution on the same
    /// day leaves it alone, a contribution on the day after the previous one
    /// extends it, anything else restarts it at 1.
    pub fn add_contribution(
        &mut self,
        id: Uuid,
        amount: f64,
        description: impl Into<String>,
    ) -> Result<Contribution> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(FinanceError::Validation(
                "contribution amount must be a positive number".into(),
            ));
        }
        let now = self.clock.now();
        let (contribution, snapshot, delta) = {
            let goal = self.goal_mut(id)?;
            let contribution = Contribution {
                id: Uuid::new_v4(),
                amount,
                description: description.into(),
                date: now,
                origin: ContributionOrigin::Manual,
                transaction_id: None,
            };
            let today = now.date_naive();
            let yesterday = today - Duration::days(1);
            match goal.last_contribution.map(|d| d.date_naive()) {
                Some(last) if last == today => {}
                Some(last) if last == yesterday => goal.streak += 1,
                _ => goal.streak = 1,
            }
            goal.current_amount += amount;
            goal.contributions.insert(0, contribution.clone());
            goal.last_contribution = Some(now);
            let delta = refresh(goal, now);
            (contribution, goal.clone(), delta)
        };
        self.persist();
        self.announce(&snapshot, &delta);
        self.send(
            NotificationKind::ContributionAdded,
            "Savings goals",
            format!(
                "Added {:.2} to goal \"{}\"",
                contribution.amount, snapshot.title
            ),
            Severity::Low,
        );
        Ok(contribution)
    }

    /// Counts an existing ledger transaction towards the goal.
    ///
    /// The transaction itself is left untouched; unlike a manual
    /// contribution this does not feed the streak.
    pub fn link_transaction(&mut self, id: Uuid, transaction_id: Uuid) -> Result<Contribution> {
        let transaction =
            ledger::transactions_matching(self.ledger.as_deref(), |t| t.id == transaction_id)
                .into_iter()
                .next()
                .ok_or(FinanceError::TransactionNotFound(transaction_id))?;
        let now = self.clock.now();
        let (contribution, snapshot, delta) = {
            let goal = self.goal_mut(id)?;
            let contribution = Contribution {
                id: transaction.id,
                amount: transaction.amount,
                description: transaction.description.clone(),
                date: transaction
                    .date
                    .and_hms_opt(0, 0, 0)
                    .unwrap()
                    .and_utc(),
                origin: ContributionOrigin::LinkedTransaction,
                transaction_id: Some(transaction.id),
            };
            goal.current_amount += contribution.amount;
            goal.contributions.insert(0, contribution.clone());
            let delta = refresh(goal, now);
            (contribution, goal.clone(), delta)
        };
        self.persist();
        self.announce(&snapshot, &delta);
        Ok(contribution)
    }

    /// Merges the patch, bumps the version, recomputes, and persists.
    ///
    /// Corrective edits may lower `current_amount`; milestones that were
    /// already reached stay reached.
    pub fn update(&mut self, id: Uuid, patch: GoalPatch) -> Result<Goal> {
        validate_patch(&patch)?;
        let now = self.clock.now();
        let (snapshot, delta) = {
            let goal = self.goal_mut(id)?;
            if let Some(title) = patch.title {
                goal.title = title.trim().to_string();
            }
            if let Some(target_amount) = patch.target_amount {
                goal.target_amount = target_amount;
            }
            if let Some(current_amount) = patch.current_amount {
                goal.current_amount = current_amount;
            }
            if let Some(category) = patch.category {
                goal.category = category;
            }
            if let Some(deadline) = patch.deadline {
                goal.deadline = deadline;
            }
            if let Some(description) = patch.description {
                goal.description = description;
            }
            goal.version += 1;
            let delta = refresh(goal, now);
            (goal.clone(), delta)
        };
        self.persist();
        self.announce(&snapshot, &delta);
        Ok(snapshot)
    }

    /// Removes the goal permanently.
    pub fn delete(&mut self, id: Uuid) -> Result<Goal> {
        let index = self
            .goals
            .iter()
            .position(|g| g.id == id)
            .ok_or(FinanceError::GoalNotFound(id))?;
        let removed = self.goals.remove(index);
        self.persist();
        tracing::info!(goal = %removed.id, "goal deleted");
        Ok(removed)
    }

    /// Daily sweep: nudges unfinished goals that are under half way and
    /// still need saving. Idempotent; emits one reminder per qualifying goal
    /// per invocation.
    pub fn check_daily_reminders(&self) {
        let Some(sink) = self.sink.as_ref() else {
            return;
        };
        for goal in &self.goals {
            if matches!(goal.status, GoalStatus::Achieved | GoalStatus::Expired) {
                continue;
            }
            if goal.daily_required > 0.0 && goal.progress < REMINDER_PROGRESS_CUTOFF {
                sink.notify(Notification {
                    kind: NotificationKind::GoalReminder,
                    title: "Savings goals".into(),
                    message: format!(
                        "Goal \"{}\" needs {:.2} per day to stay on track",
                        goal.title, goal.daily_required
                    ),
                    severity: Severity::Low,
                });
            }
        }
    }

    pub fn get(&self, id: Uuid) -> Option<&Goal> {
        self.goals.iter().find(|g| g.id == id)
    }

    pub fn goals(&self) -> &[Goal] {
        &self.goals
    }

    pub fn len(&self) -> usize {
        self.goals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.goals.is_empty()
    }

    fn goal_mut(&mut self, id: Uuid) -> Result<&mut Goal> {
        self.goals
            .iter_mut()
            .find(|g| g.id == id)
            .ok_or(FinanceError::GoalNotFound(id))
    }

    fn persist(&self) {
        let Some(store) = self.store.as_ref() else {
            return;
        };
        match serde_json::to_string_pretty(&self.goals) {
            Ok(blob) => {
                if let Err(err) = store.save(STORE_KEY, &blob) {
                    tracing::warn!("failed to persist goals: {err}");
                }
            }
            Err(err) => tracing::warn!("failed to encode goals: {err}"),
        }
    }

    /// One-shot notifications: milestone achievements fire exactly once per
    /// milestone, status notifications only on an actual transition.
    fn announce(&self, goal: &Goal, delta: &RefreshDelta) {
        let Some(sink) = self.sink.as_ref() else {
            return;
        };
        for percentage in &delta.milestones_reached {
            sink.notify(Notification {
                kind: NotificationKind::MilestoneAchieved,
                title: "Savings goals".into(),
                message: format!("Reached {}% of goal \"{}\"", percentage, goal.title),
                severity: Severity::Medium,
            });
        }
        if delta.old_status != delta.new_status {
            match delta.new_status {
                GoalStatus::Achieved => sink.notify(Notification {
                    kind: NotificationKind::GoalAchieved,
                    title: "Savings goals".into(),
                    message: format!("Goal \"{}\" is fully funded", goal.title),
                    severity: Severity::High,
                }),
                GoalStatus::Urgent => sink.notify(Notification {
                    kind: NotificationKind::GoalUrgent,
                    title: "Savings goals".into(),
                    message: format!("Goal \"{}\" needs urgent attention", goal.title),
                    severity: Severity::Urgent,
                }),
                _ => {}
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

fn validate_draft(draft: &GoalDraft, now: DateTime<Utc>) -> Result<()> {
    if draft.title.trim().chars().count() < 2 {
        return Err(FinanceError::Validation(
            "goal title must be at least 2 characters".into(),
        ));
    }
    if !draft.target_amount.is_finite() || draft.target_amount <= 0.0 {
        return Err(FinanceError::Validation(
            "goal target must be a positive number".into(),
        ));
    }
    if draft.deadline <= now.date_naive() {
        return Err(FinanceError::Validation(
            "goal deadline must be in the future".into(),
        ));
    }
    if let Some(initial) = draft.initial_amount {
        if !initial.is_finite() || initial < 0.0 {
            return Err(FinanceError::Validation(
                "initial amount must not be negative".into(),
            ));
        }
        if initial > draft.target_amount {
            return Err(FinanceError::Validation(
                "initial amount cannot exceed the target".into(),
            ));
        }
    }
    Ok(())
}

fn validate_patch(patch: &GoalPatch) -> Result<()> {
    if let Some(title) = patch.title.as_deref() {
        if title.trim().chars().count() < 2 {
            return Err(FinanceError::Validation(
                "goal title must be at least 2 characters".into(),
            ));
        }
    }
    if let Some(target_amount) = patch.target_amount {
        if !target_amount.is_finite() || target_amount <= 0.0 {
            return Err(FinanceError::Validation(
                "goal target must be a positive number".into(),
            ));
        }
    }
    if let Some(current_amount) = patch.current_amount {
        if !current_amount.is_finite() || current_amount < 0.0 {
            return Err(FinanceError::Validation(
                "current amount must not be negative".into(),
            ));
        }
    }
    Ok(())
}

/// One stats pass: progress, day counts, required pace, status, milestones.
///
/// Milestones are monotonic: a pass never clears `achieved`, even when a
/// corrective edit lowered the saved amount below the checkpoint.
fn refresh(goal: &mut Goal, now: DateTime<Utc>) -> RefreshDelta {
    let old_status = goal.status;

    goal.progress = if goal.target_amount > 0.0 {
        goal.current_amount / goal.target_amount * 100.0
    } else {
        0.0
    };
    goal.days_elapsed = period::days_elapsed(goal.start_date, now);
    goal.days_remaining = period::days_remaining(goal.deadline, now);
    goal.daily_required = if goal.days_remaining > 0 {
        goal.outstanding() / goal.days_remaining as f64
    } else {
        goal.outstanding()
    };

    let deadline_passed = goal.deadline < now.date_naive();
    goal.status = GoalStatus::classify(
        goal.progress,
        deadline_passed,
        goal.days_pct(),
        goal.days_remaining,
    );

    let mut milestones_reached = Vec::new();
    for milestone in &mut goal.milestones {
        if !milestone.achieved && goal.progress >= milestone.percentage as f64 {
            milestone.achieved = true;
            milestone.achieved_at = Some(now);
            milestones_reached.push(milestone.percentage);
        }
    }
    goal.updated_at = now;

    RefreshDelta {
        old_status,
        new_status: goal.status,
        milestones_reached,
    }
}
