//! HTTP client for the deployed yield model.
//!
//! The model sits behind a single POST endpoint that takes one feature
//! record as a JSON object and answers `{"prediction": <float>}`. No
//! authentication, no batching, no retries: one request per prediction.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::YieldPredictor;
use crate::types::{HarvestError, YieldFeatureRecord};

const PREDICTOR_NAME: &str = "yield-model";

/// Wire shape of the model's answer.
#[derive(Debug, Deserialize)]
struct PredictionResponse {
    prediction: f64,
}

/// [`YieldPredictor`] backed by an HTTP model endpoint.
#[derive(Debug)]
pub struct HttpYieldPredictor {
    http: reqwest::Client,
    endpoint: String,
}

impl HttpYieldPredictor {
    /// Build a client for the given endpoint URL. The endpoint must be
    /// configured; there is no sensible default for a deployed model.
    pub fn new(endpoint: String, timeout: Duration) -> Result<Self> {
        if endpoint.trim().is_empty() {
            return Err(
                HarvestError::Config("predictor endpoint must not be empty".to_string()).into(),
            );
        }

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent("HARVESTCAST/0.1.0")
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { http, endpoint })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl YieldPredictor for HttpYieldPredictor {
    async fn predict(&self, record: &YieldFeatureRecord) -> Result<f64> {
        debug!(
            area = %record.area,
            item = %record.item,
            year = record.year,
            "Scoring feature record"
        );

        let resp = self
            .http
            .post(&self.endpoint)
            .json(record)
            .send()
            .await
            .with_context(|| format!("Yield model request to {} failed", self.endpoint))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(HarvestError::Predictor {
                endpoint: self.endpoint.clone(),
                message: format!("{status}: {body}"),
            }
            .into());
        }

        let parsed: PredictionResponse = resp
            .json()
            .await
            .context("Failed to parse yield model response")?;

        if !parsed.prediction.is_finite() {
            return Err(HarvestError::Predictor {
                endpoint: self.endpoint.clone(),
                message: format!("model returned a non-finite value: {}", parsed.prediction),
            }
            .into());
        }

        Ok(parsed.prediction)
    }

    fn name(&self) -> &str {
        PREDICTOR_NAME
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
