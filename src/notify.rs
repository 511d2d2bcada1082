use serde::{Deserialize, Serialize};

/// Urgency attached to a notification; the sink decides presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Normal,
    Medium,
    High,
    Urgent,
}

/// What happened, independent of any display text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    BudgetCreated,
    BudgetUpdated,
    BudgetAlert,
    GoalCreated,
    ContributionAdded,
    MilestoneAchieved,
    GoalAchieved,
    GoalUrgent,
    GoalReminder,
}

/// Payload handed to the notification sink.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub severity: Severity,
}

/// Receives engine notifications. Engines treat an absent sink as a no-op.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notification: Notification);
}
