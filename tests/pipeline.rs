use std::path::Path;

use spendcheck::core::SimulationParams;
use spendcheck::ledger::{clean_ledger, load_ledger, write_ledger};
use spendcheck::pipeline::{AnalysisConfig, run_analysis};
use spendcheck::report::write_trajectories;

fn fixture(name: &str) -> std::path::PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn fd_vs_market(user_id: u64) -> AnalysisConfig {
    AnalysisConfig {
        user_id,
        horizon_months: 12,
        simulation: SimulationParams {
            initial: 0.0,
            fixed_monthly_rate: 0.07 / 12.0,
            market_monthly_rate: 0.01,
        },
    }
}

#[test]
fn ledger_to_trajectories_end_to_end() {
    let rows = load_ledger(&fixture("my_spending.csv")).expect("fixture readable");
    let ledger = clean_ledger(rows).expect("fixture cleans");

    // mean of the 8 present totals: (12+10+12+12+11+14+13+100)/8
    assert_eq!(ledger.summary.missing_expense_totals, 1);
    assert_eq!(ledger.summary.fill_value, Some(23.0));

    let analysis = run_analysis(&ledger.entries, &fd_vs_market(1001)).expect("valid analysis");

    let flagged: Vec<f64> = analysis
        .detection
        .flagged
        .iter()
        .map(|r| r.amount)
        .collect();
    assert!(flagged.contains(&100.0));
    assert_eq!(
        analysis.detection.normal.len() + analysis.detection.flagged.len(),
        ledger.entries.len()
    );

    let dates: Vec<String> = analysis
        .contributions
        .iter()
        .map(|c| c.date.to_string())
        .collect();
    assert_eq!(dates, vec!["2024-01-01", "2024-02-01", "2024-03-01"]);
    assert!((analysis.simulation.final_fixed() - 3035.136309606).abs() < 1e-6);
    assert!((analysis.simulation.final_market() - 3060.401).abs() < 1e-6);

    let dir = tempfile::tempdir().expect("temp dir");
    let cleaned = dir.path().join("cleaned_spending.csv");
    write_ledger(&cleaned, &ledger.entries).expect("writable");
    let saved = std::fs::read_to_string(&cleaned).expect("read back");
    // flagged rows stay in the persisted ledger
    assert_eq!(saved.lines().count(), 1 + ledger.entries.len());
    assert!(saved.contains("2002,2024-06-01,shopping,100.0,400.0"));

    let wealth = dir.path().join("wealth.csv");
    write_trajectories(&wealth, &analysis.simulation).expect("writable");
    let text = std::fs::read_to_string(&wealth).expect("read back");
    assert_eq!(text.lines().count(), 1 + analysis.simulation.fixed.values().len());
}

#[test]
fn unknown_user_keeps_initial_investment() {
    let rows = load_ledger(&fixture("my_spending.csv")).expect("fixture readable");
    let ledger = clean_ledger(rows).expect("fixture cleans");
    let mut config = fd_vs_market(9999);
    config.simulation.initial = 5000.0;

    let analysis = run_analysis(&ledger.entries, &config).expect("valid analysis");
    assert!(analysis.contributions.is_empty());
    assert_eq!(analysis.simulation.fixed.values(), &[5000.0]);
    assert_eq!(analysis.simulation.market.values(), &[5000.0]);
}
