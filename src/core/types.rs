use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpenseRecord {
    pub date: NaiveDate,
    pub category: String,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Contribution {
    pub user_id: u64,
    pub date: NaiveDate,
    pub amount: f64,
}

/// Tukey fence derived from one set of amounts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OutlierBounds {
    pub q1: f64,
    pub q3: f64,
    pub iqr: f64,
    pub lower: f64,
    pub upper: f64,
}

impl OutlierBounds {
    pub fn contains(&self, amount: f64) -> bool {
        amount >= self.lower && amount <= self.upper
    }
}

#[derive(Debug, Clone)]
pub struct Detection {
    pub bounds: OutlierBounds,
    pub normal: Vec<ExpenseRecord>,
    pub flagged: Vec<ExpenseRecord>,
}

/// Cumulative wealth per month. Index 0 is the initial investment.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct WealthTrajectory(Vec<f64>);

impl WealthTrajectory {
    pub(crate) fn starting_at(initial: f64, months: usize) -> Self {
        let mut values = Vec::with_capacity(months + 1);
        values.push(initial);
        Self(values)
    }

    pub(crate) fn push(&mut self, value: f64) {
        self.0.push(value);
    }

    pub fn values(&self) -> &[f64] {
        &self.0
    }

    /// Latest cumulative value; the initial investment when nothing was simulated.
    pub fn final_value(&self) -> f64 {
        // never empty: constructed with the initial value
        self.0[self.0.len() - 1]
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationParams {
    pub initial: f64,
    pub fixed_monthly_rate: f64,
    pub market_monthly_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Simulation {
    pub fixed: WealthTrajectory,
    pub market: WealthTrajectory,
}

impl Simulation {
    pub fn final_fixed(&self) -> f64 {
        self.fixed.final_value()
    }

    pub fn final_market(&self) -> f64 {
        self.market.final_value()
    }
}
