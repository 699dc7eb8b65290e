use tracing::{debug, info, warn};

use crate::core::{
    Contribution, CoreError, Detection, Simulation, SimulationParams, detect, simulate,
};
use crate::ledger::{LedgerEntry, LedgerError, expense_records, select_contributions};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalysisConfig {
    pub user_id: u64,
    pub horizon_months: usize,
    pub simulation: SimulationParams,
}

#[derive(Debug, Clone)]
pub struct Analysis {
    pub detection: Detection,
    pub contributions: Vec<Contribution>,
    pub simulation: Simulation,
}

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// Flags anomalous expense totals across the whole ledger, then simulates the
/// configured user's savings over the horizon.
pub fn run_analysis(
    entries: &[LedgerEntry],
    config: &AnalysisConfig,
) -> Result<Analysis, AnalysisError> {
    let detection = detect(&expense_records(entries))?;
    debug!(
        lower = detection.bounds.lower,
        upper = detection.bounds.upper,
        iqr = detection.bounds.iqr,
        "expense fence"
    );
    if !detection.flagged.is_empty() {
        warn!(
            flagged = detection.flagged.len(),
            "expense records outside the normal range"
        );
    }

    let contributions = select_contributions(entries, config.user_id, config.horizon_months)?;
    if contributions.len() < config.horizon_months {
        warn!(
            user_id = config.user_id,
            months = contributions.len(),
            horizon = config.horizon_months,
            "fewer savings months than the horizon"
        );
    }

    let simulation = simulate(&contributions, &config.simulation);
    info!(
        user_id = config.user_id,
        months = contributions.len(),
        fixed = simulation.final_fixed(),
        market = simulation.final_market(),
        "simulation complete"
    );

    Ok(Analysis {
        detection,
        contributions,
        simulation,
    })
}
