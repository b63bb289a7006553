//! Weather reconciliation — one (temperature, rainfall) pair per request.
//!
//! Three data-source strategies are tried in strict priority order decided
//! by date arithmetic alone: live current weather when no planting date is
//! given, a short-horizon historical lookup when the planting date sits
//! inside the provider's 5-day window, and fixed seasonal constants when it
//! is older than that. There are no retries across strategies and a single
//! HTTP call per provider endpoint within one.
//!
//! Degradation is never silent: whenever the returned figures are not what
//! the strategy nominally promises (declined time series, missing forecast,
//! seasonal constants), the summary carries a `note` and keeps its `source`
//! honest so the caller can show a caveat.

use anyhow::Result;
use chrono::{Datelike, NaiveDate, NaiveTime};
use std::fmt;
use tracing::{debug, warn};

use super::{
    CurrentConditions, ForecastSample, HistoricalLookup, HistoricalSample, LocationSuggestion,
    WeatherApi,
};
use crate::types::{HarvestError, WeatherQuery, WeatherSource, WeatherSummary};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Longest lookback the provider's time-series endpoint serves on the free
/// plan. Planting dates at or inside this window are eligible for the
/// historical strategy; anything older falls to seasonal estimates.
pub const HISTORICAL_WINDOW_DAYS: i64 = 5;

/// 3-hour forecast buckets that cover the next 24 hours.
const FORECAST_SAMPLES_24H: usize = 8;

/// Geocoding matches requested for an autocomplete suggestion query.
const SUGGESTION_LIMIT: u8 = 5;

// ---------------------------------------------------------------------------
// Strategy selection
// ---------------------------------------------------------------------------

/// The closed set of data-source strategies, chosen once per query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStrategy {
    /// Current conditions plus the next-24h forecast.
    Live,
    /// Time-series lookup at the planting date (inside the provider window).
    HistoricalLimited(NaiveDate),
    /// Offline seasonal constants for the planting month.
    SeasonalEstimate(NaiveDate),
}

/// Pick the strategy from date arithmetic alone.
///
/// A future planting date still counts as inside the window: the provider
/// window only cuts off the past.
pub fn choose_strategy(planting_date: Option<NaiveDate>, reference_date: NaiveDate) -> FetchStrategy {
    match planting_date {
        None => FetchStrategy::Live,
        Some(d) => {
            let days_back = reference_date.signed_duration_since(d).num_days();
            if days_back <= HISTORICAL_WINDOW_DAYS {
                FetchStrategy::HistoricalLimited(d)
            } else {
                FetchStrategy::SeasonalEstimate(d)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Seasonal buckets
// ---------------------------------------------------------------------------

/// Calendar-month climate buckets used for offline estimates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Season {
    /// November–February.
    Dry,
    /// March–April.
    PreRain,
    /// May–October.
    Rainy,
}

impl Season {
    pub fn from_month(month: u32) -> Season {
        match month {
            11 | 12 | 1 | 2 => Season::Dry,
            3 | 4 => Season::PreRain,
            _ => Season::Rainy,
        }
    }

    /// Bucket average temperature in °C.
    pub fn avg_temperature(self) -> f64 {
        match self {
            Season::Dry => 32.0,
            Season::PreRain => 34.0,
            Season::Rainy => 27.0,
        }
    }

    /// Bucket average rainfall in mm.
    pub fn avg_rainfall(self) -> f64 {
        match self {
            Season::Dry => 5.0,
            Season::PreRain => 15.0,
            Season::Rainy => 180.0,
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Season::Dry => write!(f, "dry season (Nov-Feb)"),
            Season::PreRain => write!(f, "pre-rain transition (Mar-Apr)"),
            Season::Rainy => write!(f, "rainy season (May-Oct)"),
        }
    }
}

// ---------------------------------------------------------------------------
// Merging helpers
// ---------------------------------------------------------------------------

/// Round to one decimal place (display precision of the upstream figures).
fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Average the current reading with the next-24h forecast window and sum
/// its rainfall. Buckets lacking a rain field contribute 0; an empty
/// forecast degrades to the current reading alone, with a note.
fn merge_live(current: &CurrentConditions, samples: &[ForecastSample]) -> WeatherSummary {
    let window = &samples[..samples.len().min(FORECAST_SAMPLES_24H)];

    let mut temp_sum = current.temperature;
    let mut count = 1usize;
    let mut rain_total = 0.0;
    for sample in window {
        temp_sum += sample.temperature;
        count += 1;
        rain_total += sample.rain_mm_3h.unwrap_or(0.0);
    }

    let note = window
        .is_empty()
        .then(|| "Forecast unavailable: figures reflect current conditions only".to_string());

    WeatherSummary {
        location: current.location_name.clone(),
        avg_temperature: round1(temp_sum / count as f64),
        avg_rainfall: round1(rain_total),
        source: WeatherSource::Live,
        note,
    }
}

/// Average hourly time-series readings into a daily figure. Hourly rain is
/// scaled ×24 to approximate the day's total.
fn merge_historical(live: WeatherSummary, samples: &[HistoricalSample]) -> WeatherSummary {
    let count = samples.len() as f64;
    let avg_temp = samples.iter().map(|s| s.temperature).sum::<f64>() / count;
    let hourly_rain = samples
        .iter()
        .map(|s| s.rain_mm_1h.unwrap_or(0.0))
        .sum::<f64>()
        / count;

    WeatherSummary {
        location: live.location,
        avg_temperature: round1(avg_temp),
        avg_rainfall: round1(hourly_rain * 24.0),
        source: WeatherSource::HistoricalLimited,
        note: None,
    }
}

/// Keep the live figures but mark the summary as a degraded historical
/// answer. The source stays `historical_limited` — that is what was asked
/// for — and the note says what was actually served.
fn degrade_to_live(live: WeatherSummary, reason: &str) -> WeatherSummary {
    WeatherSummary {
        source: WeatherSource::HistoricalLimited,
        note: Some(format!(
            "Historical lookup unavailable ({reason}): using current conditions as an approximation for the planting period"
        )),
        ..live
    }
}

/// Offline seasonal constants for the planting month. No network involved;
/// the location is echoed from the query text.
fn seasonal_estimate(location_text: &str, planting_date: NaiveDate) -> WeatherSummary {
    let season = Season::from_month(planting_date.month());
    let display = location_text
        .split(',')
        .next()
        .unwrap_or(location_text)
        .trim();

    WeatherSummary {
        location: display.to_string(),
        avg_temperature: season.avg_temperature(),
        avg_rainfall: season.avg_rainfall(),
        source: WeatherSource::SeasonalEstimate,
        note: Some(format!(
            "Seasonal estimate for the {season}: planting date is outside the {HISTORICAL_WINDOW_DAYS}-day historical window, values are not measured"
        )),
    }
}

// ---------------------------------------------------------------------------
// Reconciler
// ---------------------------------------------------------------------------

/// Turns one [`WeatherQuery`] into one [`WeatherSummary`] using the
/// strategy the date arithmetic selects. Stateless apart from the provider
/// client it owns; build one per pipeline.
pub struct WeatherReconciler<A: WeatherApi> {
    api: A,
}

impl<A: WeatherApi> WeatherReconciler<A> {
    pub fn new(api: A) -> Self {
        Self { api }
    }

    /// Reconcile weather for a query. Fails only on transport errors and
    /// unresolvable locations; provider-plan refusals degrade with a note
    /// instead.
    pub async fn get_weather(&self, query: &WeatherQuery) -> Result<WeatherSummary> {
        let strategy = choose_strategy(query.planting_date, query.reference_date);
        debug!(location = %query.location, strategy = ?strategy, "Reconciling weather");

        match strategy {
            FetchStrategy::Live => self.fetch_live(&query.location).await,
            FetchStrategy::HistoricalLimited(planting) => {
                self.fetch_historical(&query.location, planting).await
            }
            FetchStrategy::SeasonalEstimate(planting) => {
                Ok(seasonal_estimate(&query.location, planting))
            }
        }
    }

    /// Autocomplete-style geocoding matches for a free-text query, used by
    /// callers to help the user fix a location that failed to resolve.
    pub async fn suggest_locations(&self, query: &str) -> Result<Vec<LocationSuggestion>> {
        let matches = self.api.geocode(query, SUGGESTION_LIMIT).await?;
        Ok(matches
            .into_iter()
            .map(|m| {
                let full_name = match &m.state {
                    Some(state) => format!("{}, {}, {}", m.name, state, m.country),
                    None => format!("{}, {}", m.name, m.country),
                };
                LocationSuggestion {
                    name: m.name,
                    country: m.country,
                    full_name,
                }
            })
            .collect())
    }

    async fn fetch_live(&self, location: &str) -> Result<WeatherSummary> {
        debug!(provider = self.api.name(), location = %location, "Fetching live weather");
        let current = self.api.current_conditions(location).await?;
        let samples = self.api.forecast_samples(location).await?;
        Ok(merge_live(&current, &samples))
    }

    async fn fetch_historical(
        &self,
        location: &str,
        planting_date: NaiveDate,
    ) -> Result<WeatherSummary> {
        // Live figures first: they are the degradation target if the
        // time series cannot be served.
        let live = self.fetch_live(location).await?;

        let matches = self.api.geocode(location, 1).await?;
        let point = matches
            .first()
            .ok_or_else(|| HarvestError::LocationNotFound(location.to_string()))?;

        let timestamp = planting_date
            .and_time(NaiveTime::MIN)
            .and_utc()
            .timestamp();

        match self
            .api
            .historical_samples(point.lat, point.lon, timestamp)
            .await?
        {
            HistoricalLookup::Samples(samples) if !samples.is_empty() => {
                Ok(merge_historical(live, &samples))
            }
            HistoricalLookup::Samples(_) => {
                warn!(location = %location, "Time series returned no samples, degrading to current conditions");
                Ok(degrade_to_live(live, "no samples returned"))
            }
            HistoricalLookup::Unavailable { reason } => {
                warn!(location = %location, reason = %reason, "Time series unavailable, degrading to current conditions");
                Ok(degrade_to_live(live, &reason))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
