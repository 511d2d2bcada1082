//! Stand-alone finance calculators, independent of the engines.

use serde::Serialize;

/// Saving projections cap out at fifty years.
const MAX_PROJECTION_MONTHS: u32 = 600;

/// Fixed-rate amortized loan quote.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoanQuote {
    pub loan_amount: f64,
    pub term_months: u32,
    pub annual_rate: f64,
    pub monthly_payment: f64,
    pub total_payment: f64,
    pub total_interest: f64,
    /// Total interest relative to principal, as a percentage.
    pub interest_percentage: f64,
}

/// One row of an amortization schedule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduleEntry {
    pub month: u32,
    pub payment: f64,
    pub principal: f64,
    pub interest: f64,
    pub remaining_balance: f64,
    pub total_interest_paid: f64,
}

/// Outcome of a months-to-goal projection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoalProjection {
    pub months: u32,
    pub years: f64,
    pub final_amount: f64,
}

/// Debt-service load relative to income.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AffordabilityBand {
    Comfortable,
    Moderate,
    Elevated,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Affordability {
    /// Obligations over income, as a percentage.
    pub ratio: f64,
    pub band: AffordabilityBand,
}

fn monthly_rate(annual_rate: f64) -> f64 {
    annual_rate / 100.0 / 12.0
}

fn amortized_payment(amount: f64, months: u32, annual_rate: f64) -> f64 {
    let rate = monthly_rate(annual_rate);
    if rate == 0.0 {
        return amount / months as f64;
    }
    let growth = (1.0 + rate).powi(months as i32);
    amount * rate * growth / (growth - 1.0)
}

/// Quotes a fixed-rate loan paid in equal monthly installments.
pub fn loan_quote(amount: f64, months: u32, annual_rate: f64) -> LoanQuote {
    let monthly_payment = amortized_payment(amount, months, annual_rate);
    let total_payment = monthly_payment * months as f64;
    let total_interest = total_payment - amount;
    LoanQuote {
        loan_amount: amount,
        term_months: months,
        annual_rate,
        monthly_payment,
        total_payment,
        total_interest,
        interest_percentage: if amount > 0.0 {
            total_interest / amount * 100.0
        } else {
            0.0
        },
    }
}

/// Month-by-month amortization of a fixed-rate loan.
pub fn payment_schedule(amount: f64, months: u32, annual_rate: f64) -> Vec<ScheduleEntry> {
    let rate = monthly_rate(annual_rate);
    let payment = amortized_payment(amount, months, annual_rate);
    let mut schedule = Vec::with_capacity(months as usize);
    let mut remaining = amount;
    let mut total_interest = 0.0;

    for month in 1..=months {
        let interest = remaining * rate;
        let principal = payment - interest;
        remaining -= principal;
        total_interest += interest;
        schedule.push(ScheduleEntry {
            month,
            payment,
            principal,
            interest,
            remaining_balance: remaining.max(0.0),
            total_interest_paid: total_interest,
        });
        if remaining <= 0.0 {
            break;
        }
    }
    schedule
}

/// Monthly payment as a share of monthly income; zero without income.
pub fn payment_to_income_ratio(monthly_payment: f64, monthly_income: f64) -> f64 {
    if monthly_income <= 0.0 {
        return 0.0;
    }
    monthly_payment / monthly_income * 100.0
}

/// Months of compounded monthly saving needed to reach `target`, capped at
/// fifty years. `None` when nothing is being saved.
pub fn months_to_goal(
    current: f64,
    target: f64,
    monthly_saving: f64,
    annual_rate: f64,
) -> Option<GoalProjection> {
    if monthly_saving <= 0.0 {
        return None;
    }
    let rate = monthly_rate(annual_rate);
    let mut amount = current;
    let mut months = 0u32;
    while amount < target && months < MAX_PROJECTION_MONTHS {
        amount = amount * (1.0 + rate) + monthly_saving;
        months += 1;
    }
    Some(GoalProjection {
        months,
        years: months as f64 / 12.0,
        final_amount: amount,
    })
}

/// Bands the debt-service ratio: above 50% critical, above 40% elevated,
/// above 30% moderate, otherwise comfortable.
pub fn analyze_affordability(
    monthly_payment: f64,
    monthly_income: f64,
    other_obligations: f64,
) -> Affordability {
    let ratio = payment_to_income_ratio(monthly_payment + other_obligations, monthly_income);
    let band = if ratio > 50.0 {
        AffordabilityBand::Critical
    } else if ratio > 40.0 {
        AffordabilityBand::Elevated
    } else if ratio > 30.0 {
        AffordabilityBand::Moderate
    } else {
        AffordabilityBand::Comfortable
    };
    Affordability { ratio, band }
}
