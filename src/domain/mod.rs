pub mod budget;
pub mod common;
pub mod goal;
pub mod period;
pub mod transaction;

pub use budget::{Budget, BudgetAlert, BudgetAlertKind, BudgetDraft, BudgetPatch, BudgetStatus};
pub use goal::{Contribution, ContributionOrigin, Goal, GoalDraft, GoalPatch, GoalStatus, Milestone};
pub use period::BudgetPeriod;
pub use transaction::{Transaction, TransactionKind};
