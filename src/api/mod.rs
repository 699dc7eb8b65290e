use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use axum::{
    Router,
    extract::{Json, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use clap::{Args, Parser, Subcommand};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tracing::info;

use crate::core::{Contribution, ExpenseRecord, OutlierBounds, SimulationParams};
use crate::ledger::{CleaningSummary, RawLedgerRow, clean_ledger, load_ledger, write_ledger};
use crate::pipeline::{Analysis, AnalysisConfig, run_analysis};
use crate::report::{render_summary, write_trajectories};

const INDEX_HTML: &str = include_str!("../../web/index.html");
const STYLES_CSS: &str = include_str!("../../web/styles.css");
const APP_JS: &str = include_str!("../../web/app.js");

const MONTHS_PER_YEAR: f64 = 12.0;

#[derive(Parser, Debug)]
#[command(
    name = "spendcheck",
    about = "Spending anomaly check and fixed deposit vs market savings comparison"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Clean a ledger CSV, flag anomalous expenses and simulate one user's savings
    Analyze(AnalyzeArgs),
    /// Serve the JSON API and chart page
    Serve {
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
}

#[derive(Args, Debug, Clone)]
pub struct AnalyzeArgs {
    #[arg(long, help = "Spending ledger CSV")]
    ledger: PathBuf,
    #[arg(
        long,
        default_value = "cleaned_spending.csv",
        help = "Where to save the cleaned ledger (flagged rows included)"
    )]
    cleaned_out: PathBuf,
    #[arg(long, help = "Optional CSV of month-by-month wealth for both paths")]
    trajectory_out: Option<PathBuf>,
    #[arg(long, help = "Print the analysis as JSON instead of a text summary")]
    json: bool,
    #[command(flatten)]
    simulation: SimulationArgs,
}

#[derive(Args, Debug, Clone)]
struct SimulationArgs {
    #[arg(long, default_value_t = 1001, help = "User whose savings are simulated")]
    user_id: u64,
    #[arg(long, default_value_t = 12, help = "Number of months to simulate")]
    horizon: usize,
    #[arg(long, default_value_t = 0.0, help = "Initial investment")]
    initial: f64,
    #[arg(
        long,
        default_value_t = 7.0,
        help = "Fixed deposit annual rate in percent, compounded monthly"
    )]
    fixed_annual_rate: f64,
    #[arg(
        long,
        default_value_t = 1.0,
        help = "Flat market growth per month in percent"
    )]
    market_monthly_rate: f64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct AnalyzePayload {
    rows: Vec<RawLedgerRow>,
    user_id: Option<u64>,
    horizon: Option<usize>,
    initial_investment: Option<f64>,
    fixed_annual_rate: Option<f64>,
    market_monthly_rate: Option<f64>,
}

#[derive(Debug)]
struct ApiRequest {
    rows: Vec<RawLedgerRow>,
    config: AnalysisConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeResponse {
    cleaning: CleaningSummary,
    bounds: OutlierBounds,
    normal_count: usize,
    flagged_count: usize,
    flagged: Vec<ExpenseRecord>,
    user_id: u64,
    contributions: Vec<Contribution>,
    fixed_path: Vec<f64>,
    market_path: Vec<f64>,
    final_fixed: f64,
    final_market: f64,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn build_config(args: &SimulationArgs) -> Result<AnalysisConfig, String> {
    if args.horizon == 0 {
        return Err("--horizon must be > 0".to_string());
    }

    if !args.initial.is_finite() {
        return Err("--initial must be a finite number".to_string());
    }

    for (name, rate) in [
        ("--fixed-annual-rate", args.fixed_annual_rate),
        ("--market-monthly-rate", args.market_monthly_rate),
    ] {
        if !rate.is_finite() || rate <= -100.0 {
            return Err(format!("{name} must be > -100"));
        }
    }

    Ok(AnalysisConfig {
        user_id: args.user_id,
        horizon_months: args.horizon,
        simulation: SimulationParams {
            initial: args.initial,
            fixed_monthly_rate: args.fixed_annual_rate / 100.0 / MONTHS_PER_YEAR,
            market_monthly_rate: args.market_monthly_rate / 100.0,
        },
    })
}

fn build_response(summary: CleaningSummary, user_id: u64, analysis: Analysis) -> AnalyzeResponse {
    let final_fixed = analysis.simulation.final_fixed();
    let final_market = analysis.simulation.final_market();
    AnalyzeResponse {
        cleaning: summary,
        bounds: analysis.detection.bounds,
        normal_count: analysis.detection.normal.len(),
        flagged_count: analysis.detection.flagged.len(),
        flagged: analysis.detection.flagged,
        user_id,
        contributions: analysis.contributions,
        fixed_path: analysis.simulation.fixed.values().to_vec(),
        market_path: analysis.simulation.market.values().to_vec(),
        final_fixed,
        final_market,
    }
}

pub fn run_analyze(args: AnalyzeArgs) -> anyhow::Result<()> {
    let config = build_config(&args.simulation).map_err(anyhow::Error::msg)?;

    let rows = load_ledger(&args.ledger)?;
    let ledger = clean_ledger(rows)?;
    write_ledger(&args.cleaned_out, &ledger.entries)?;

    let analysis = run_analysis(&ledger.entries, &config)?;

    if let Some(path) = &args.trajectory_out {
        write_trajectories(path, &analysis.simulation)
            .with_context(|| format!("failed to write trajectories to {}", path.display()))?;
        info!(path = %path.display(), "saved wealth trajectories");
    }

    if args.json {
        let response = build_response(ledger.summary, config.user_id, analysis);
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        print!("{}", render_summary(&ledger.summary, &analysis));
    }
    Ok(())
}

pub fn app() -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/index.html", get(index_handler))
        .route("/styles.css", get(styles_handler))
        .route("/app.js", get(app_js_handler))
        .route("/api/analyze", post(analyze_handler))
        .fallback(not_found_handler)
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "spendcheck HTTP API listening");
    println!("Local access: http://127.0.0.1:{port}/");

    axum::serve(listener, app()).await
}

async fn index_handler() -> impl IntoResponse {
    with_cache_control(Html(INDEX_HTML))
}

async fn styles_handler() -> impl IntoResponse {
    with_cache_control((
        [(header::CONTENT_TYPE, "text/css; charset=utf-8")],
        STYLES_CSS,
    ))
}

async fn app_js_handler() -> impl IntoResponse {
    with_cache_control((
        [(
            header::CONTENT_TYPE,
            "application/javascript; charset=utf-8",
        )],
        APP_JS,
    ))
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn analyze_handler(payload: Result<Json<AnalyzePayload>, JsonRejection>) -> Response {
    let payload = match payload {
        Ok(Json(payload)) => payload,
        Err(rejection) => {
            let msg = format!("Invalid API JSON payload: {}", rejection.body_text());
            return error_response(StatusCode::BAD_REQUEST, &msg);
        }
    };
    let request = match api_request_from_payload(payload) {
        Ok(request) => request,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };

    match analyze_rows(request) {
        Ok(response) => json_response(StatusCode::OK, response),
        Err(msg) => error_response(StatusCode::BAD_REQUEST, &msg),
    }
}

fn analyze_rows(request: ApiRequest) -> Result<AnalyzeResponse, String> {
    let ledger = clean_ledger(request.rows).map_err(|e| e.to_string())?;
    let analysis = run_analysis(&ledger.entries, &request.config).map_err(|e| e.to_string())?;
    Ok(build_response(
        ledger.summary,
        request.config.user_id,
        analysis,
    ))
}

fn with_cache_control<R: IntoResponse>(response: R) -> Response {
    let mut response = response.into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    with_cache_control((status, Json(body)))
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

#[cfg(test)]
fn api_request_from_json(json: &str) -> Result<ApiRequest, String> {
    let payload = serde_json::from_str::<AnalyzePayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    api_request_from_payload(payload)
}

fn api_request_from_payload(payload: AnalyzePayload) -> Result<ApiRequest, String> {
    let mut args = default_simulation_args();

    if let Some(v) = payload.user_id {
        args.user_id = v;
    }
    if let Some(v) = payload.horizon {
        args.horizon = v;
    }
    if let Some(v) = payload.initial_investment {
        args.initial = v;
    }
    if let Some(v) = payload.fixed_annual_rate {
        args.fixed_annual_rate = v;
    }
    if let Some(v) = payload.market_monthly_rate {
        args.market_monthly_rate = v;
    }

    let config = build_config(&args)?;
    Ok(ApiRequest {
        rows: payload.rows,
        config,
    })
}

fn default_simulation_args() -> SimulationArgs {
    SimulationArgs {
        user_id: 1001,
        horizon: 12,
        initial: 0.0,
        fixed_annual_rate: 7.0,
        market_monthly_rate: 1.0,
    }
}
