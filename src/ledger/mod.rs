//! Spending ledger I/O and cleaning.
//!
//! Turns raw ledger rows into the typed inputs the detector and simulator
//! expect: dates parsed, missing expense totals mean-imputed, categories
//! normalized. Nothing here decides whether a record is anomalous.
//!
//! Dates are year-first: `YYYY-MM-DD` or `YYYY/MM/DD`, optionally followed by
//! a time part that is ignored. Day-first and month-first forms such as
//! `05/01/2024` are ambiguous and rejected. Whitespace around every field is
//! trimmed.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::core::{Contribution, ExpenseRecord};

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("failed to read ledger {path}: {source}")]
    Read { path: PathBuf, source: csv::Error },

    #[error("failed to write ledger {path}: {source}")]
    Write { path: PathBuf, source: csv::Error },

    #[error("row {row}: invalid date {value:?}, expected YYYY-MM-DD or YYYY/MM/DD")]
    InvalidDate { row: usize, value: String },

    #[error("ledger has missing expense totals but no values to impute them from")]
    NoExpenseValues,

    #[error("user {user_id} has no savings amount on {date}")]
    MissingSavings { user_id: u64, date: NaiveDate },
}

/// One ledger row as it appears on disk or in an API payload.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawLedgerRow {
    #[serde(alias = "userId")]
    pub user_id: u64,
    pub date: String,
    #[serde(default)]
    pub category: String,
    #[serde(default, alias = "monthlyExpenseTotal")]
    pub monthly_expense_total: Option<f64>,
    #[serde(default, alias = "actualSavings")]
    pub actual_savings: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerEntry {
    pub user_id: u64,
    pub date: NaiveDate,
    pub category: String,
    pub monthly_expense_total: f64,
    pub actual_savings: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleaningSummary {
    pub rows: usize,
    pub missing_expense_totals: usize,
    pub missing_savings: usize,
    pub fill_value: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct CleanLedger {
    pub entries: Vec<LedgerEntry>,
    pub summary: CleaningSummary,
}

pub fn load_ledger(path: &Path) -> Result<Vec<RawLedgerRow>, LedgerError> {
    let read_err = |source| LedgerError::Read {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(read_err)?;

    let rows = reader
        .deserialize()
        .collect::<Result<Vec<RawLedgerRow>, _>>()
        .map_err(read_err)?;

    info!(path = %path.display(), rows = rows.len(), "loaded ledger");
    Ok(rows)
}

pub fn clean_ledger(rows: Vec<RawLedgerRow>) -> Result<CleanLedger, LedgerError> {
    let present: Vec<f64> = rows
        .iter()
        .filter_map(|r| r.monthly_expense_total)
        .filter(|v| v.is_finite())
        .collect();
    let missing = rows.len() - present.len();

    let fill_value = if missing == 0 {
        None
    } else if present.is_empty() {
        return Err(LedgerError::NoExpenseValues);
    } else {
        Some(present.iter().sum::<f64>() / present.len() as f64)
    };

    if let Some(fill) = fill_value {
        warn!(missing, fill, "imputed missing expense totals with the mean");
    }

    let missing_savings = rows
        .iter()
        .filter(|r| !r.actual_savings.is_some_and(f64::is_finite))
        .count();
    if missing_savings > 0 {
        warn!(missing_savings, "ledger rows without a savings amount");
    }

    let summary = CleaningSummary {
        rows: rows.len(),
        missing_expense_totals: missing,
        missing_savings,
        fill_value,
    };

    let entries = rows
        .into_iter()
        .enumerate()
        .map(|(idx, row)| {
            let date = parse_date(&row.date).ok_or_else(|| LedgerError::InvalidDate {
                row: idx + 1,
                value: row.date.clone(),
            })?;
            // fill_value is always set when a total is missing
            let monthly_expense_total = row
                .monthly_expense_total
                .filter(|v| v.is_finite())
                .or(fill_value)
                .unwrap_or(f64::NAN);
            Ok(LedgerEntry {
                user_id: row.user_id,
                date,
                category: normalize_category(&row.category),
                monthly_expense_total,
                actual_savings: row.actual_savings,
            })
        })
        .collect::<Result<Vec<_>, LedgerError>>()?;

    Ok(CleanLedger { entries, summary })
}

pub fn expense_records(entries: &[LedgerEntry]) -> Vec<ExpenseRecord> {
    entries
        .iter()
        .map(|e| ExpenseRecord {
            date: e.date,
            category: e.category.clone(),
            amount: e.monthly_expense_total,
        })
        .collect()
}

/// First `horizon` savings entries for one user, oldest first.
pub fn select_contributions(
    entries: &[LedgerEntry],
    user_id: u64,
    horizon: usize,
) -> Result<Vec<Contribution>, LedgerError> {
    let mut selected: Vec<&LedgerEntry> =
        entries.iter().filter(|e| e.user_id == user_id).collect();
    selected.sort_by_key(|e| e.date);

    selected
        .into_iter()
        .take(horizon)
        .map(|e| {
            let amount = e
                .actual_savings
                .filter(|v| v.is_finite())
                .ok_or(LedgerError::MissingSavings {
                    user_id,
                    date: e.date,
                })?;
            Ok(Contribution {
                user_id,
                date: e.date,
                amount,
            })
        })
        .collect()
}

/// Persists every cleaned row, flagged or not.
pub fn write_ledger(path: &Path, entries: &[LedgerEntry]) -> Result<(), LedgerError> {
    let write_err = |source| LedgerError::Write {
        path: path.to_path_buf(),
        source,
    };
    let mut writer = csv::Writer::from_path(path).map_err(write_err)?;
    for entry in entries {
        writer.serialize(entry).map_err(write_err)?;
    }
    writer
        .flush()
        .map_err(|e| write_err(csv::Error::from(e)))?;

    info!(path = %path.display(), rows = entries.len(), "saved cleaned ledger");
    Ok(())
}

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let day = raw.get(..10).unwrap_or(raw);
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(day, format).ok())
}

fn normalize_category(raw: &str) -> String {
    raw.trim().to_lowercase()
}
