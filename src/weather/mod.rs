//! Weather data acquisition.
//!
//! Defines the `WeatherApi` trait over the external provider's REST surface
//! and the value types its endpoints produce. The concrete client lives in
//! [`openweather`]; the three-tier reconciliation that turns raw readings
//! into a single summary lives in [`reconcile`].

pub mod openweather;
pub mod reconcile;

pub use openweather::OpenWeatherClient;
pub use reconcile::WeatherReconciler;

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;

#[cfg(test)]
use mockall::automock;

// ---------------------------------------------------------------------------
// Provider readings
// ---------------------------------------------------------------------------

/// Current conditions at a location.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentConditions {
    /// Temperature in °C.
    pub temperature: f64,
    /// Provider's resolved place name (e.g. `"Lagos"`).
    pub location_name: String,
    /// ISO country code reported by the provider.
    pub country_code: String,
    /// Short text like `"light rain"`.
    pub conditions: String,
}

/// One 3-hour forecast bucket.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForecastSample {
    /// Temperature in °C.
    pub temperature: f64,
    /// Rain over the bucket in mm; `None` when the provider omits the field.
    pub rain_mm_3h: Option<f64>,
}

/// A geocoding match for a free-text location.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoMatch {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub country: String,
    pub state: Option<String>,
}

/// One hourly reading from the time-series endpoint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistoricalSample {
    /// Temperature in °C.
    pub temperature: f64,
    /// Rain over the hour in mm; `None` when the provider omits the field.
    pub rain_mm_1h: Option<f64>,
}

/// Result of a time-series lookup.
///
/// The provider declining the call (typically a plan restriction) is not a
/// transport failure — it is a normal outcome the reconciler degrades
/// around, so it is modelled here rather than as an error.
#[derive(Debug, Clone, PartialEq)]
pub enum HistoricalLookup {
    /// Hourly readings for the requested day.
    Samples(Vec<HistoricalSample>),
    /// The provider refused the request.
    Unavailable { reason: String },
}

/// An autocomplete-style suggestion for a location query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationSuggestion {
    pub name: String,
    pub country: String,
    /// `"name, state, country"` (state omitted when absent).
    pub full_name: String,
}

// ---------------------------------------------------------------------------
// Provider trait
// ---------------------------------------------------------------------------

/// Abstraction over the external weather provider's REST surface.
///
/// One method per endpoint; implementors make exactly one HTTP call per
/// invocation with no retries. All readings are metric.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait WeatherApi: Send + Sync {
    /// Current conditions for a free-text location.
    async fn current_conditions(&self, location: &str) -> Result<CurrentConditions>;

    /// Upcoming 3-hour forecast buckets for a free-text location, in
    /// chronological order. The provider returns up to five days' worth.
    async fn forecast_samples(&self, location: &str) -> Result<Vec<ForecastSample>>;

    /// Geocoding matches for a free-text location, best first.
    async fn geocode(&self, location: &str, limit: u8) -> Result<Vec<GeoMatch>>;

    /// Hourly readings around a Unix timestamp at a coordinate.
    async fn historical_samples(
        &self,
        lat: f64,
        lon: f64,
        timestamp: i64,
    ) -> Result<HistoricalLookup>;

    /// Provider name for logging and identification.
    fn name(&self) -> &str;
}
