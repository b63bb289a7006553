//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! Secrets (the weather API key) are referenced by env-var name in the
//! config and resolved at runtime via `std::env::var`.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub service: ServiceConfig,
    pub weather: WeatherConfig,
    pub predictor: PredictorConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServiceConfig {
    pub name: String,
    /// Request file read when the CLI is given no path argument.
    #[serde(default = "default_request_file")]
    pub request_file: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WeatherConfig {
    /// Env var holding the OpenWeatherMap API key.
    pub api_key_env: String,
    #[serde(default = "default_weather_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PredictorConfig {
    /// Full URL of the deployed model's scoring endpoint.
    pub endpoint: String,
    #[serde(default = "default_predictor_timeout")]
    pub timeout_secs: u64,
}

fn default_request_file() -> String {
    "request.toml".to_string()
}

fn default_weather_timeout() -> u64 {
    15
}

fn default_predictor_timeout() -> u64 {
    10
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let config: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))?;
        Ok(config)
    }

    /// Resolve an environment variable name to its value.
    /// Useful for loading secrets referenced in the config.
    pub fn resolve_env(env_name: &str) -> Result<String> {
        std::env::var(env_name)
            .with_context(|| format!("Environment variable not set: {env_name}"))
    }
}
