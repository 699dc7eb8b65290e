use std::fmt::Write as _;
use std::path::Path;

use serde::Serialize;

use crate::core::{ExpenseRecord, Simulation};
use crate::ledger::CleaningSummary;
use crate::pipeline::Analysis;

const FLAGGED_PREVIEW_ROWS: usize = 5;

#[derive(Debug, Serialize)]
struct TrajectoryRow {
    month: usize,
    fixed_deposit: f64,
    market: f64,
}

pub fn render_summary(summary: &CleaningSummary, analysis: &Analysis) -> String {
    let mut out = String::new();
    let bounds = &analysis.detection.bounds;
    let flagged = &analysis.detection.flagged;

    let _ = writeln!(
        out,
        "Ledger rows: {} ({} missing expense totals{}, {} missing savings)",
        summary.rows,
        summary.missing_expense_totals,
        summary
            .fill_value
            .map(|v| format!(", filled with {v:.2}"))
            .unwrap_or_default(),
        summary.missing_savings
    );
    let _ = writeln!(
        out,
        "Normal range: {:.2} to {:.2} (Q1 {:.2}, Q3 {:.2}, IQR {:.2})",
        bounds.lower, bounds.upper, bounds.q1, bounds.q3, bounds.iqr
    );
    let _ = writeln!(out, "Detected {} suspicious expense records!", flagged.len());
    if !flagged.is_empty() {
        out.push_str(&flagged_preview(flagged));
    }
    let _ = writeln!(
        out,
        "Simulated {} months of savings",
        analysis.contributions.len()
    );
    let _ = writeln!(
        out,
        "Final FD Wealth: {:.2}",
        analysis.simulation.final_fixed()
    );
    let _ = writeln!(
        out,
        "Final Market Wealth: {:.2}",
        analysis.simulation.final_market()
    );
    out
}

fn flagged_preview(flagged: &[ExpenseRecord]) -> String {
    let mut out = format!("{:<12} {:<16} {:>14}\n", "date", "category", "amount");
    for record in flagged.iter().take(FLAGGED_PREVIEW_ROWS) {
        let _ = writeln!(
            out,
            "{:<12} {:<16} {:>14.2}",
            record.date.format("%Y-%m-%d"),
            record.category,
            record.amount
        );
    }
    if flagged.len() > FLAGGED_PREVIEW_ROWS {
        let _ = writeln!(out, "... {} more", flagged.len() - FLAGGED_PREVIEW_ROWS);
    }
    out
}

/// Month-by-month wealth for both paths, for plotting elsewhere.
pub fn write_trajectories(path: &Path, simulation: &Simulation) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_path(path)?;
    let rows = simulation
        .fixed
        .values()
        .iter()
        .zip(simulation.market.values())
        .enumerate();
    for (month, (&fixed_deposit, &market)) in rows {
        writer.serialize(TrajectoryRow {
            month,
            fixed_deposit,
            market,
        })?;
    }
    writer.flush()?;
    Ok(())
}
