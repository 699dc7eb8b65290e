use super::types::{Contribution, Simulation, SimulationParams, WealthTrajectory};

/// Invest-then-compound, one contribution per month, on two independent paths.
///
/// Contributions are consumed in the order given; selecting the user and
/// horizon is the caller's job. Amounts are not validated.
pub fn simulate(contributions: &[Contribution], params: &SimulationParams) -> Simulation {
    let mut fixed = WealthTrajectory::starting_at(params.initial, contributions.len());
    let mut market = WealthTrajectory::starting_at(params.initial, contributions.len());

    for contribution in contributions {
        let next_fixed = compound_month(
            fixed.final_value(),
            contribution.amount,
            params.fixed_monthly_rate,
        );
        let next_market = compound_month(
            market.final_value(),
            contribution.amount,
            params.market_monthly_rate,
        );
        fixed.push(next_fixed);
        market.push(next_market);
    }

    Simulation { fixed, market }
}

fn compound_month(balance: f64, contribution: f64, monthly_rate: f64) -> f64 {
    (balance + contribution) * (1.0 + monthly_rate)
}
