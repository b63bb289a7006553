//! HARVESTCAST — Crop-Yield Feature Pipeline
//!
//! Entry point. Loads configuration, initialises structured logging, reads
//! one yield request from a TOML file, runs it through the
//! resolve→reconcile→assemble→score pipeline and prints the outcome.

use anyhow::{Context, Result};
use chrono::Utc;
use std::fs;
use std::time::Duration;
use tracing::{error, info, warn};

use harvestcast::config;
use harvestcast::engine::YieldEngine;
use harvestcast::predict::HttpYieldPredictor;
use harvestcast::types::{PredictionOutcome, YieldRequest};
use harvestcast::weather::{OpenWeatherClient, WeatherReconciler};

const BANNER: &str = r#"
 _   _     _     ____  __     __ _____  ____   _____
| | | |   / \   |  _ \ \ \   / /| ____|/ ___| |_   _|
| |_| |  / _ \  | |_) | \ \ / / |  _|  \___ \   | |
|  _  | / ___ \ |  _ <   \ V /  | |___  ___) |  | |
|_| |_|/_/   \_\|_| \_\   \_/   |_____||____/   |_|

  Crop-Yield Feature Pipeline
  v0.1.0 — Resolve, Reconcile, Predict
"#;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    // Usage: harvestcast [request.toml] [config.toml]
    let args: Vec<String> = std::env::args().collect();
    let config_path = args.get(2).map(String::as_str).unwrap_or("config.toml");

    // Load configuration from TOML
    let cfg = config::AppConfig::load(config_path)?;

    // Initialise structured logging
    init_logging(&cfg);

    // Print startup banner
    println!("{BANNER}");
    info!(
        service = %cfg.service.name,
        predictor_endpoint = %cfg.predictor.endpoint,
        "HARVESTCAST starting up"
    );

    // -- Load the request -------------------------------------------------

    let request_path = args
        .get(1)
        .map(String::as_str)
        .unwrap_or(&cfg.service.request_file);
    let request = load_request(request_path)?;
    info!(
        area = %request.area,
        item = %request.item,
        year = request.year,
        use_weather = request.use_weather,
        "Request loaded"
    );

    // -- Initialise components -------------------------------------------

    let api_key = std::env::var(&cfg.weather.api_key_env).unwrap_or_default();
    if api_key.is_empty() {
        warn!(
            env = %cfg.weather.api_key_env,
            "No weather API key configured — lookups will fail over to manual figures"
        );
    }

    let weather = OpenWeatherClient::new(api_key, Duration::from_secs(cfg.weather.timeout_secs))?;
    let predictor = HttpYieldPredictor::new(
        cfg.predictor.endpoint.clone(),
        Duration::from_secs(cfg.predictor.timeout_secs),
    )?;
    let engine = YieldEngine::new(WeatherReconciler::new(weather), predictor);

    // -- Run one prediction ----------------------------------------------

    let today = Utc::now().date_naive();
    match engine.run(&request, today).await {
        Ok(outcome) => {
            report_outcome(&outcome);
            Ok(())
        }
        Err(e) => {
            error!(error = format!("{e:#}"), "Prediction failed");
            Err(e)
        }
    }
}

/// Read one yield request from a TOML file.
fn load_request(path: &str) -> Result<YieldRequest> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read request file: {path}"))?;
    let request: YieldRequest = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse request file: {path}"))?;
    Ok(request)
}

/// Print a human-readable outcome summary.
fn report_outcome(outcome: &PredictionOutcome) {
    println!("=== Prediction ===");
    println!("Yield estimate : {}", outcome.formatted_yield());
    println!("Area           : {}", outcome.resolution);
    println!("Features       : {}", outcome.record);
    if let Some(weather) = &outcome.weather {
        println!("Weather        : {weather}");
    }
    for warning in &outcome.warnings {
        println!("Note           : {warning}");
    }
}

/// Initialise the `tracing` subscriber.
fn init_logging(cfg: &config::AppConfig) {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("harvestcast=info"));

    let json_logging = std::env::var("HARVESTCAST_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }

    let _ = cfg;
}
