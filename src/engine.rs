//! End-to-end prediction pipeline.
//!
//! One request flows through four stages: country resolution, weather
//! reconciliation, feature assembly, model scoring. The weather stage is
//! best-effort — when it was requested but cannot be served, the pipeline
//! falls back to the caller's manually entered figures and records why,
//! failing only when those are missing too. Every substitution, degradation
//! and fallback surfaces in the outcome's warning list.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::predict::YieldPredictor;
use crate::resolver;
use crate::types::{
    CountryResolution, HarvestError, PredictionOutcome, WeatherQuery, WeatherSummary,
    YieldFeatureRecord, YieldRequest,
};
use crate::weather::{WeatherApi, WeatherReconciler};

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Stateless pipeline: resolve, reconcile, assemble, score.
pub struct YieldEngine<A: WeatherApi, P: YieldPredictor> {
    reconciler: WeatherReconciler<A>,
    predictor: P,
}

impl<A: WeatherApi, P: YieldPredictor> YieldEngine<A, P> {
    pub fn new(reconciler: WeatherReconciler<A>, predictor: P) -> Self {
        Self {
            reconciler,
            predictor,
        }
    }

    /// Run one prediction. `reference_date` anchors the weather window
    /// arithmetic (pass today's date outside of replays).
    pub async fn run(
        &self,
        request: &YieldRequest,
        reference_date: NaiveDate,
    ) -> Result<PredictionOutcome> {
        let mut warnings = Vec::new();

        let resolution = resolver::resolve(&request.area);
        if let Some(substitute) = &resolution.fallback_used {
            info!(original = %request.area, substitute = %substitute, "Substituting model-known country");
            warnings.push(format!(
                "'{}' is not in the model's training set: using {} as a proxy",
                resolution.original, substitute
            ));
        }

        let location = request
            .location
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty());

        let weather = match location {
            Some(loc) if request.use_weather => {
                self.reconcile_weather(loc, request.planting_date, reference_date, &mut warnings)
                    .await
            }
            _ => None,
        };

        let record = match &weather {
            Some(summary) => YieldFeatureRecord::assemble(
                &resolution,
                summary,
                &request.item,
                request.year,
                request.pesticides_tonnes,
            ),
            None => self.manual_record(request, &resolution)?,
        };

        debug!(record = %record, "Assembled feature record");

        let predicted_yield = self
            .predictor
            .predict(&record)
            .await
            .context("Yield prediction failed")?;

        info!(
            model = self.predictor.name(),
            yield_hg_ha = predicted_yield,
            area = %record.area,
            "Prediction complete"
        );

        Ok(PredictionOutcome {
            predicted_yield,
            record,
            resolution,
            weather,
            warnings,
        })
    }

    /// Fetch and reconcile weather, converting a failure into a warning and
    /// a `None` so the caller's manual figures can take over.
    async fn reconcile_weather(
        &self,
        location: &str,
        planting_date: Option<NaiveDate>,
        reference_date: NaiveDate,
        warnings: &mut Vec<String>,
    ) -> Option<WeatherSummary> {
        let query = WeatherQuery::pinned(location, planting_date, reference_date);
        match self.reconciler.get_weather(&query).await {
            Ok(summary) => {
                info!(%summary, "Weather reconciled");
                if let Some(note) = &summary.note {
                    warnings.push(note.clone());
                }
                Some(summary)
            }
            Err(err) => {
                warn!(location = %location, error = %err, "Weather lookup failed, falling back to manual figures");
                warnings.push(format!(
                    "Could not fetch weather for '{location}': {err:#}. Using manually entered figures."
                ));
                self.push_suggestions(location, warnings).await;
                None
            }
        }
    }

    /// Advisory geocoding matches appended after a weather failure. A failed
    /// suggestion lookup is logged and dropped; it must not mask the
    /// original failure.
    async fn push_suggestions(&self, location: &str, warnings: &mut Vec<String>) {
        match self.reconciler.suggest_locations(location).await {
            Ok(suggestions) if !suggestions.is_empty() => {
                let names: Vec<String> =
                    suggestions.iter().map(|s| s.full_name.clone()).collect();
                warnings.push(format!("Location matches: {}", names.join("; ")));
            }
            Ok(_) => {}
            Err(err) => {
                debug!(location = %location, error = %err, "Suggestion lookup failed");
            }
        }
    }

    fn manual_record(
        &self,
        request: &YieldRequest,
        resolution: &CountryResolution,
    ) -> Result<YieldFeatureRecord> {
        let rainfall = request.rainfall_mm.ok_or_else(|| {
            HarvestError::InvalidRequest(
                "rainfall_mm is required when weather data is unavailable".to_string(),
            )
        })?;
        let temperature = request.temperature_c.ok_or_else(|| {
            HarvestError::InvalidRequest(
                "temperature_c is required when weather data is unavailable".to_string(),
            )
        })?;

        Ok(YieldFeatureRecord::manual(
            resolution,
            &request.item,
            request.year,
            request.pesticides_tonnes,
            rainfall,
            temperature,
        ))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
