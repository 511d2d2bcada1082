use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::common::Identifiable;
use crate::domain::period::BudgetPeriod;
use crate::notify::Severity;

/// Health classification of a budget, derived from spend and elapsed time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetStatus {
    Excellent,
    Good,
    Moderate,
    Warning,
    Critical,
    Exceeded,
    Expired,
}

impl BudgetStatus {
    /// Classifies spend percentage against elapsed-time percentage.
    ///
    /// Pure: the same `(percentage, days_pct)` always yields the same status.
    /// Evaluated top down, first match wins.
    pub fn classify(percentage: f64, days_pct: f64) -> Self {
        if percentage >= 100.0 {
            BudgetStatus::Exceeded
        } else if percentage >= 90.0 {
            BudgetStatus::Critical
        } else if percentage >= 80.0 || percentage > days_pct + 10.0 {
            BudgetStatus::Warning
        } else if percentage >= 50.0 {
            BudgetStatus::Moderate
        } else if percentage >= 30.0 {
            BudgetStatus::Good
        } else {
            BudgetStatus::Excellent
        }
    }
}

/// Why a budget alert was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetAlertKind {
    Exceeded,
    Warning,
    SpendingFast,
    PeriodEnding,
}

/// Alert raised by a budget refresh; the set is replaced wholesale each pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetAlert {
    pub kind: BudgetAlertKind,
    pub message: String,
    pub severity: Severity,
    pub raised_at: DateTime<Utc>,
}

/// A capped spending allowance over a category set and time window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Budget {
    pub id: Uuid,
    pub name: String,
    pub amount: f64,
    pub period: BudgetPeriod,
    pub categories: Vec<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub description: String,

    // Tracking, recomputed on every refresh.
    pub actual_spent: f64,
    pub remaining: f64,
    pub days_elapsed: i64,
    pub days_remaining: i64,
    /// Planned spend per day, fixed when the budget is created.
    pub daily_budget: f64,
    pub daily_average: f64,
    pub projected_spend: f64,
    pub variance: f64,
    pub status: BudgetStatus,
    pub alerts: Vec<BudgetAlert>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: u32,
}

impl Budget {
    /// Share of the cap consumed, as a percentage.
    pub fn spent_pct(&self) -> f64 {
        if self.amount > 0.0 {
            self.actual_spent / self.amount * 100.0
        } else {
            0.0
        }
    }

    /// Share of the window already behind us, as a percentage.
    pub fn days_pct(&self) -> f64 {
        let window = self.days_elapsed + self.days_remaining;
        if window > 0 {
            self.days_elapsed as f64 / window as f64 * 100.0
        } else {
            0.0
        }
    }

    pub fn covers_category(&self, category: &str) -> bool {
        self.categories.iter().any(|c| c == category)
    }
}

impl Identifiable for Budget {
    fn id(&self) -> Uuid {
        self.id
    }
}

/// Input accepted by `BudgetEngine::create`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BudgetDraft {
    pub name: String,
    pub amount: f64,
    pub period: Option<BudgetPeriod>,
    pub categories: Vec<String>,
    pub start_date: Option<NaiveDate>,
    pub description: Option<String>,
}

/// Field-wise patch applied by `BudgetEngine::update`.
#[derive(Debug, Clone, Default)]
pub struct BudgetPatch {
    pub name: Option<String>,
    pub amount: Option<f64>,
    pub period: Option<BudgetPeriod>,
    pub categories: Option<Vec<String>>,
    pub start_date: Option<NaiveDate>,
    pub description: Option<String>,
}
