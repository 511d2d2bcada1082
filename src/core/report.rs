//! Computed report payloads for the presentation layer.
//!
//! Everything here is plain data derived from the engines and the ledger;
//! rendering and export belong to the consumer.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::budget::{Budget, BudgetStatus};
use crate::domain::goal::{Goal, GoalStatus};
use crate::domain::transaction::TransactionKind;
use crate::ledger::{total_by_kind, LedgerProvider};

const FAST_SPENDING_FACTOR: f64 = 1.3;
const LOW_UTILIZATION_CUTOFF: f64 = 30.0;
const LOW_ACHIEVEMENT_CUTOFF: f64 = 30.0;
const HIGHLIGHT_LIMIT: usize = 5;
const CONTRIBUTION_MONTHS: usize = 6;

/// Headline ledger totals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverviewReport {
    pub total_income: f64,
    pub total_expense: f64,
    pub balance: f64,
    /// Share of income not spent, as a percentage. Zero without income.
    pub savings_rate: f64,
}

/// Actionable observation attached to a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recommendation {
    pub kind: RecommendationKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationKind {
    UnderUtilization,
    ExceededBudgets,
    FastSpending,
    LowAchievement,
    NeedsAttention,
    NoContributions,
}

/// Aggregate budget posture plus per-budget performance.
#[derive(Debug, Clone, Serialize)]
pub struct BudgetReport {
    pub total_budgets: usize,
    pub active_budgets: usize,
    pub total_amount: f64,
    pub total_spent: f64,
    pub total_remaining: f64,
    /// Spend over cap across all budgets, as a percentage.
    pub utilization_rate: f64,
    pub by_category: Vec<CategoryBudgetUsage>,
    /// Budgets ranked by spend percentage, heaviest first.
    pub performance: Vec<BudgetPerformance>,
    pub recommendations: Vec<Recommendation>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryBudgetUsage {
    pub category: String,
    pub total_amount: f64,
    pub total_spent: f64,
    pub budget_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetPerformance {
    pub id: Uuid,
    pub name: String,
    pub percentage: f64,
    pub status: BudgetStatus,
    pub variance: f64,
}

/// Aggregate goal posture plus highlights and the contribution series.
#[derive(Debug, Clone, Serialize)]
pub struct GoalReport {
    pub total_goals: usize,
    pub achieved_goals: usize,
    pub active_goals: usize,
    pub total_target: f64,
    pub total_current: f64,
    pub total_progress: f64,
    pub achievement_rate: f64,
    pub by_category: Vec<CategoryGoalUsage>,
    /// Unfinished goals with the most progress, up to five.
    pub top_performing: Vec<GoalHighlight>,
    /// Behind or urgent goals with the least progress, up to five.
    pub needs_attention: Vec<GoalHighlight>,
    /// Contribution totals for the last six calendar months, oldest first.
    pub monthly_contributions: Vec<MonthlyContribution>,
    pub recommendations: Vec<Recommendation>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryGoalUsage {
    pub category: String,
    pub goal_count: usize,
    pub total_target: f64,
    pub total_current: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoalHighlight {
    pub id: Uuid,
    pub title: String,
    pub progress: f64,
    pub status: GoalStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyContribution {
    /// `YYYY-MM` key of the month.
    pub month: String,
    pub amount: f64,
}

/// Headline totals straight from the ledger provider.
pub fn overview(provider: Option<&dyn LedgerProvider>) -> OverviewReport {
    let total_income = total_by_kind(provider, TransactionKind::Income, None);
    let total_expense = total_by_kind(provider, TransactionKind::Expense, None);
    let savings_rate = if total_income > 0.0 {
        (total_income - total_expense) / total_income * 100.0
    } else {
        0.0
    };
    OverviewReport {
        total_income,
        total_expense,
        balance: total_income - total_expense,
        savings_rate,
    }
}

pub fn budget_report(budgets: &[Budget]) -> BudgetReport {
    let total_amount: f64 = budgets.iter().map(|b| b.amount).sum();
    let total_spent: f64 = budgets.iter().map(|b| b.actual_spent).sum();
    let total_remaining: f64 = budgets.iter().map(|b| b.remaining).sum();
    let utilization_rate = if total_amount > 0.0 {
        total_spent / total_amount * 100.0
    } else {
        0.0
    };

    let mut by_category: BTreeMap<&str, CategoryBudgetUsage> = BTreeMap::new();
    for budget in budgets {
        for category in &budget.categories {
            let entry = by_category
                .entry(category)
                .or_insert_with(|| CategoryBudgetUsage {
                    category: category.clone(),
                    total_amount: 0.0,
                    total_spent: 0.0,
                    budget_count: 0,
                });
            entry.total_amount += budget.amount;
            entry.total_spent += budget.actual_spent;
            entry.budget_count += 1;
        }
    }

    let mut performance: Vec<BudgetPerformance> = budgets
        .iter()
        .map(|budget| BudgetPerformance {
            id: budget.id,
            name: budget.name.clone(),
            percentage: budget.spent_pct(),
            status: budget.status,
            variance: budget.variance,
        })
        .collect();
    performance.sort_by(|a, b| b.percentage.total_cmp(&a.percentage));

    let mut recommendations = Vec::new();
    if !budgets.is_empty() && utilization_rate < LOW_UTILIZATION_CUTOFF {
        recommendations.push(Recommendation {
            kind: RecommendationKind::UnderUtilization,
            message: "Budgets are largely unused; consider lowering or reallocating them".into(),
        });
    }
    let exceeded = budgets
        .iter()
        .filter(|b| b.status == BudgetStatus::Exceeded)
        .count();
    if exceeded > 0 {
        recommendations.push(Recommendation {
            kind: RecommendationKind::ExceededBudgets,
            message: format!("{exceeded} budget(s) are over their cap"),
        });
    }
    let fast = budgets
        .iter()
        .filter(|b| b.daily_average > b.daily_budget * FAST_SPENDING_FACTOR)
        .count();
    if fast > 0 {
        recommendations.push(Recommendation {
            kind: RecommendationKind::FastSpending,
            message: format!("{fast} budget(s) are spending faster than planned"),
        });
    }

    BudgetReport {
        total_budgets: budgets.len(),
        active_budgets: budgets
            .iter()
            .filter(|b| b.status != BudgetStatus::Exceeded)
            .count(),
        total_amount,
        total_spent,
        total_remaining,
        utilization_rate,
        by_category: by_category.into_values().collect(),
        performance,
        recommendations,
    }
}

pub fn goal_report(goals: &[Goal], now: DateTime<Utc>) -> GoalReport {
    let total_target: f64 = goals.iter().map(|g| g.target_amount).sum();
    let total_current: f64 = goals.iter().map(|g| g.current_amount).sum();
    let total_progress = if total_target > 0.0 {
        total_current / total_target * 100.0
    } else {
        0.0
    };
    let achieved_goals = goals
        .iter()
        .filter(|g| g.status == GoalStatus::Achieved)
        .count();
    let achievement_rate = if goals.is_empty() {
        0.0
    } else {
        achieved_goals as f64 / goals.len() as f64 * 100.0
    };

    let mut by_category: BTreeMap<&str, CategoryGoalUsage> = BTreeMap::new();
    for goal in goals {
        let entry = by_category
            .entry(goal.category.as_str())
            .or_insert_with(|| CategoryGoalUsage {
                category: goal.category.clone(),
                goal_count: 0,
                total_target: 0.0,
                total_current: 0.0,
            });
        entry.goal_count += 1;
        entry.total_target += goal.target_amount;
        entry.total_current += goal.current_amount;
    }

    let mut top_performing: Vec<GoalHighlight> = goals
        .iter()
        .filter(|g| g.status != GoalStatus::Achieved)
        .map(highlight)
        .collect();
    top_performing.sort_by(|a, b| b.progress.total_cmp(&a.progress));
    top_performing.truncate(HIGHLIGHT_LIMIT);

    let mut needs_attention: Vec<GoalHighlight> = goals
        .iter()
        .filter(|g| matches!(g.status, GoalStatus::Behind | GoalStatus::Urgent))
        .map(highlight)
        .collect();
    needs_attention.sort_by(|a, b| a.progress.total_cmp(&b.progress));
    needs_attention.truncate(HIGHLIGHT_LIMIT);

    let monthly_contributions = monthly_contributions(goals, now);

    let mut recommendations = Vec::new();
    if !goals.is_empty() && achievement_rate < LOW_ACHIEVEMENT_CUTOFF {
        recommendations.push(Recommendation {
            kind: RecommendationKind::LowAchievement,
            message: "Few goals have been reached; consider more realistic targets".into(),
        });
    }
    if !needs_attention.is_empty() {
        recommendations.push(Recommendation {
            kind: RecommendationKind::NeedsAttention,
            message: format!("{} goal(s) are behind schedule", needs_attention.len()),
        });
    }
    if goals.iter().all(|g| g.contributions.is_empty()) && !goals.is_empty() {
        recommendations.push(Recommendation {
            kind: RecommendationKind::NoContributions,
            message: "No contributions recorded yet; start small but start".into(),
        });
    }

    GoalReport {
        total_goals: goals.len(),
        achieved_goals,
        active_goals: goals
            .iter()
            .filter(|g| !matches!(g.status, GoalStatus::Achieved | GoalStatus::Expired))
            .count(),
        total_target,
        total_current,
        total_progress,
        achievement_rate,
        by_category: by_category.into_values().collect(),
        top_performing,
        needs_attention,
        monthly_contributions,
        recommendations,
    }
}

fn highlight(goal: &Goal) -> GoalHighlight {
    GoalHighlight {
        id: goal.id,
        title: goal.title.clone(),
        progress: goal.progress,
        status: goal.status,
    }
}

/// Sums contributions per calendar month over the trailing window, padding
/// empty months with zero so the series always has six points.
fn monthly_contributions(goals: &[Goal], now: DateTime<Utc>) -> Vec<MonthlyContribution> {
    let mut totals: BTreeMap<String, f64> = BTreeMap::new();
    for goal in goals {
        for contribution in &goal.contributions {
            let date = contribution.date.date_naive();
            *totals.entry(month_key(date)).or_insert(0.0) += contribution.amount;
        }
    }

    let today = now.date_naive();
    let mut series = Vec::with_capacity(CONTRIBUTION_MONTHS);
    for offset in (0..CONTRIBUTION_MONTHS as i32).rev() {
        let month = shift_month_start(today, -offset);
        let key = month_key(month);
        let amount = totals.get(&key).copied().unwrap_or(0.0);
        series.push(MonthlyContribution { month: key, amount });
    }
    series
}

fn month_key(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

fn shift_month_start(date: NaiveDate, months: i32) -> NaiveDate {
    let mut year = date.year();
    let mut month = date.month() as i32 + months;
    while month > 12 {
        month -= 12;
        year += 1;
    }
    while month < 1 {
        month += 12;
        year -= 1;
    }
    NaiveDate::from_ymd_opt(year, month as u32, 1).unwrap()
}
