use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::common::Identifiable;

/// Fixed milestone checkpoints, as percentages of the target.
pub const MILESTONE_STEPS: [u8; 4] = [25, 50, 75, 100];

/// Progress classification of a savings goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalStatus {
    New,
    Started,
    GoodProgress,
    NearCompletion,
    Ahead,
    Behind,
    Urgent,
    Achieved,
    Expired,
}

impl GoalStatus {
    /// Classifies progress against schedule. Evaluated top down, first match
    /// wins: a finished goal is `Achieved` even when the deadline has passed.
    pub fn classify(
        progress: f64,
        deadline_passed: bool,
        days_pct: f64,
        days_remaining: i64,
    ) -> Self {
        if progress >= 100.0 {
            GoalStatus::Achieved
        } else if deadline_passed {
            GoalStatus::Expired
        } else if progress < days_pct - 20.0 {
            GoalStatus::Behind
        } else if progress > days_pct + 20.0 {
            GoalStatus::Ahead
        } else if days_remaining <= 7 {
            GoalStatus::Urgent
        } else if progress >= 80.0 {
            GoalStatus::NearCompletion
        } else if progress >= 50.0 {
            GoalStatus::GoodProgress
        } else if progress >= 25.0 {
            GoalStatus::Started
        } else {
            GoalStatus::New
        }
    }
}

/// A fixed percentage checkpoint of a goal's target.
///
/// `achieved` is monotonic: once set it is never cleared, and `achieved_at`
/// is written exactly once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Milestone {
    pub percentage: u8,
    pub amount: f64,
    pub achieved: bool,
    pub achieved_at: Option<DateTime<Utc>>,
}

impl Milestone {
    /// The 25/50/75/100% ladder for a target amount.
    pub fn ladder(target_amount: f64) -> Vec<Milestone> {
        MILESTONE_STEPS
            .iter()
            .map(|&percentage| Milestone {
                percentage,
                amount: target_amount * percentage as f64 / 100.0,
                achieved: false,
                achieved_at: None,
            })
            .collect()
    }
}

/// Where a contribution came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContributionOrigin {
    Manual,
    LinkedTransaction,
}

/// A single deposit towards a goal; appended, never removed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contribution {
    pub id: Uuid,
    pub amount: f64,
    pub description: String,
    pub date: DateTime<Utc>,
    pub origin: ContributionOrigin,
    pub transaction_id: Option<Uuid>,
}

/// A savings target with a deadline and milestone checkpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Goal {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub target_amount: f64,
    pub current_amount: f64,
    pub category: String,
    pub start_date: NaiveDate,
    pub deadline: NaiveDate,

    // Tracking, recomputed on every refresh.
    pub progress: f64,
    pub days_elapsed: i64,
    pub days_remaining: i64,
    pub daily_required: f64,
    pub status: GoalStatus,

    pub milestones: Vec<Milestone>,
    pub contributions: Vec<Contribution>,
    pub last_contribution: Option<DateTime<Utc>>,
    /// Consecutive calendar days with at least one manual contribution.
    pub streak: u32,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: u32,
}

impl Goal {
    /// Share of the schedule already behind us, as a percentage.
    pub fn days_pct(&self) -> f64 {
        let window = self.days_elapsed + self.days_remaining;
        if window > 0 {
            self.days_elapsed as f64 / window as f64 * 100.0
        } else {
            0.0
        }
    }

    pub fn outstanding(&self) -> f64 {
        self.target_amount - self.current_amount
    }
}

impl Identifiable for Goal {
    fn id(&self) -> Uuid {
        self.id
    }
}

/// Input accepted by `GoalEngine::create`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoalDraft {
    pub title: String,
    pub target_amount: f64,
    pub initial_amount: Option<f64>,
    pub category: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub deadline: NaiveDate,
    pub description: Option<String>,
}

/// Field-wise patch applied by `GoalEngine::update`.
#[derive(Debug, Clone, Default)]
pub struct GoalPatch {
    pub title: Option<String>,
    pub target_amount: Option<f64>,
    pub current_amount: Option<f64>,
    pub category: Option<String>,
    pub deadline: Option<NaiveDate>,
    pub description: Option<String>,
}
