//! Shared types for the HARVESTCAST pipeline.
//!
//! These types form the data model used across all modules.
//! They are designed to be stable so that resolver, weather,
//! predictor, and engine modules can depend on them without
//! circular references.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Country resolution
// ---------------------------------------------------------------------------

/// Outcome of resolving a user-supplied country name against the set the
/// yield model was trained on.
///
/// Resolution never fails: unknown names are substituted with a curated
/// proxy or the default area, and the substitution is recorded here so the
/// caller can surface it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryResolution {
    /// Country fed to the predictor. Always one the model was trained on.
    pub area: String,
    /// What the user originally entered.
    pub original: String,
    /// Set when `area` differs from the raw input (proxy or default).
    pub fallback_used: Option<String>,
}

impl CountryResolution {
    /// Whether the input matched the training set without substitution.
    pub fn is_exact(&self) -> bool {
        self.fallback_used.is_none()
    }
}

impl fmt::Display for CountryResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.fallback_used {
            Some(fb) => write!(f, "{} -> {} (substitute)", self.original, fb),
            None => write!(f, "{} (exact)", self.area),
        }
    }
}

// ---------------------------------------------------------------------------
// Weather
// ---------------------------------------------------------------------------

/// Which data-source strategy produced a weather summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherSource {
    /// Current conditions plus the next-24h forecast.
    Live,
    /// Short-horizon historical lookup (provider window: last 5 days).
    HistoricalLimited,
    /// Fixed seasonal constants; no measured data involved.
    SeasonalEstimate,
}

impl WeatherSource {
    /// All sources (useful for iteration).
    pub const ALL: &'static [WeatherSource] = &[
        WeatherSource::Live,
        WeatherSource::HistoricalLimited,
        WeatherSource::SeasonalEstimate,
    ];
}

impl fmt::Display for WeatherSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WeatherSource::Live => write!(f, "live"),
            WeatherSource::HistoricalLimited => write!(f, "historical (limited window)"),
            WeatherSource::SeasonalEstimate => write!(f, "seasonal estimate"),
        }
    }
}

/// A single weather request: where, and optionally for when.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherQuery {
    /// Free-text location, e.g. `"Lagos, NG"`.
    pub location: String,
    /// Planting date, when the caller wants growing-period weather.
    pub planting_date: Option<NaiveDate>,
    /// The "today" used for window arithmetic. Injected so strategy
    /// selection is reproducible.
    pub reference_date: NaiveDate,
}

impl WeatherQuery {
    /// Query anchored at today's date.
    pub fn new(location: &str, planting_date: Option<NaiveDate>) -> Self {
        Self::pinned(location, planting_date, Utc::now().date_naive())
    }

    /// Query with an explicit reference date (tests, replays).
    pub fn pinned(
        location: &str,
        planting_date: Option<NaiveDate>,
        reference_date: NaiveDate,
    ) -> Self {
        Self {
            location: location.to_string(),
            planting_date,
            reference_date,
        }
    }
}

/// Reconciled weather for one request: a single (temperature, rainfall)
/// pair plus provenance.
///
/// A summary only exists for successful reconciliation; failures travel as
/// errors. `note` is present exactly when the figures carry a caveat the
/// end user should see (degraded lookup, seasonal constants, missing
/// forecast).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSummary {
    /// Display name of the resolved location.
    pub location: String,
    /// Average temperature in °C, rounded to one decimal.
    pub avg_temperature: f64,
    /// Rainfall in mm over the summarised window, rounded to one decimal.
    pub avg_rainfall: f64,
    pub source: WeatherSource,
    #[serde(default)]
    pub note: Option<String>,
}

impl WeatherSummary {
    /// Whether the caller should show a caveat alongside the figures.
    pub fn has_caveat(&self) -> bool {
        self.note.is_some()
    }

    /// Helper to build a test/sample summary.
    #[cfg(test)]
    pub fn sample() -> Self {
        WeatherSummary {
            location: "Lagos".to_string(),
            avg_temperature: 27.4,
            avg_rainfall: 12.5,
            source: WeatherSource::Live,
            note: None,
        }
    }
}

impl fmt::Display for WeatherSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {:.1}°C, {:.1}mm [{}]",
            self.location, self.avg_temperature, self.avg_rainfall, self.source
        )
    }
}

// ---------------------------------------------------------------------------
// Requests and features
// ---------------------------------------------------------------------------

/// Raw caller fields for one yield prediction.
///
/// Mirrors the upstream form: the manual `rainfall_mm`/`temperature_c`
/// figures are the fallback when weather lookup is disabled or fails.
#[derive(Debug, Clone, Deserialize)]
pub struct YieldRequest {
    pub area: String,
    pub item: String,
    pub year: i32,
    pub pesticides_tonnes: f64,
    /// Fetch weather for `location` instead of using the manual values.
    #[serde(default)]
    pub use_weather: bool,
    #[serde(default)]
    pub location: Option<String>,
    /// Quoted ISO date (`"2026-04-03"`).
    #[serde(default)]
    pub planting_date: Option<NaiveDate>,
    /// Manually entered rainfall in mm.
    #[serde(default)]
    pub rainfall_mm: Option<f64>,
    /// Manually entered average temperature in °C.
    #[serde(default)]
    pub temperature_c: Option<f64>,
}

impl YieldRequest {
    /// Helper to build a test/sample request with sensible defaults.
    #[cfg(test)]
    pub fn sample() -> Self {
        YieldRequest {
            area: "Nigeria".to_string(),
            item: "Maize".to_string(),
            year: 2026,
            pesticides_tonnes: 120.5,
            use_weather: false,
            location: None,
            planting_date: None,
            rainfall_mm: Some(1150.0),
            temperature_c: Some(26.5),
        }
    }
}

/// The flat record the external regression model consumes.
///
/// The serialised field names are the model's training-schema column names;
/// do not rename them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YieldFeatureRecord {
    #[serde(rename = "Area")]
    pub area: String,
    #[serde(rename = "Item")]
    pub item: String,
    #[serde(rename = "Year")]
    pub year: i32,
    /// Rainfall feature, with the column name the dataset was trained under.
    pub average_rain_fall_mm_per_year: f64,
    pub pesticides_tonnes: f64,
    pub avg_temp: f64,
}

impl YieldFeatureRecord {
    /// Merge a resolution and a successful weather summary into the record.
    pub fn assemble(
        resolved: &CountryResolution,
        weather: &WeatherSummary,
        item: &str,
        year: i32,
        pesticides_tonnes: f64,
    ) -> Self {
        Self {
            area: resolved.area.clone(),
            item: item.to_string(),
            year,
            average_rain_fall_mm_per_year: weather.avg_rainfall,
            pesticides_tonnes,
            avg_temp: weather.avg_temperature,
        }
    }

    /// Build the record from manually entered figures (weather disabled or
    /// failed; the caller supplies its own rainfall/temperature).
    pub fn manual(
        resolved: &CountryResolution,
        item: &str,
        year: i32,
        pesticides_tonnes: f64,
        rainfall_mm: f64,
        temperature_c: f64,
    ) -> Self {
        Self {
            area: resolved.area.clone(),
            item: item.to_string(),
            year,
            average_rain_fall_mm_per_year: rainfall_mm,
            pesticides_tonnes,
            avg_temp: temperature_c,
        }
    }

    /// Helper to build a test/sample record.
    #[cfg(test)]
    pub fn sample() -> Self {
        Self {
            area: "Ghana".to_string(),
            item: "Maize".to_string(),
            year: 2026,
            average_rain_fall_mm_per_year: 1200.0,
            pesticides_tonnes: 120.5,
            avg_temp: 27.4,
        }
    }
}

impl fmt::Display for YieldFeatureRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} / {} / {} (rain: {:.1}mm, pesticides: {:.1}t, temp: {:.1}°C)",
            self.area,
            self.item,
            self.year,
            self.average_rain_fall_mm_per_year,
            self.pesticides_tonnes,
            self.avg_temp
        )
    }
}

/// Everything the caller needs to display one prediction.
#[derive(Debug, Clone, Serialize)]
pub struct PredictionOutcome {
    /// Model output in hg/ha.
    pub predicted_yield: f64,
    pub record: YieldFeatureRecord,
    pub resolution: CountryResolution,
    /// Present when reconciled weather fed the record.
    pub weather: Option<WeatherSummary>,
    /// Human-readable caveats: substitutions, degradations, fallbacks.
    pub warnings: Vec<String>,
}

impl PredictionOutcome {
    /// Yield formatted in the unit the model was trained on.
    pub fn formatted_yield(&self) -> String {
        format!("{:.2} hg/ha", self.predicted_yield)
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Domain error categories surfaced across module boundaries.
#[derive(Debug, thiserror::Error)]
pub enum HarvestError {
    #[error("Weather provider error ({endpoint}): {message}")]
    WeatherProvider { endpoint: String, message: String },

    #[error("Location not found: {0}")]
    LocationNotFound(String),

    #[error("Predictor error ({endpoint}): {message}")]
    Predictor { endpoint: String, message: String },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
