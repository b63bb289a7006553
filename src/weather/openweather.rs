//! OpenWeather REST client.
//!
//! Speaks four endpoints: current weather, 5-day/3-hour forecast, direct
//! geocoding, and the One Call "timemachine" time series. Only the fields
//! the reconciler needs are deserialised.
//!
//! API docs: https://openweathermap.org/api
//! Auth: `appid` query parameter on every call.
//! Units: metric on every weather endpoint.
//! Note: the timemachine endpoint is plan-gated; a refusal there is a
//! normal outcome (`HistoricalLookup::Unavailable`), not an error.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::{
    CurrentConditions, ForecastSample, GeoMatch, HistoricalLookup, HistoricalSample, WeatherApi,
};
use crate::types::HarvestError;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

const DATA_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";
const GEO_BASE_URL: &str = "https://api.openweathermap.org/geo/1.0";
const ONECALL_BASE_URL: &str = "https://api.openweathermap.org/data/3.0";
const PROVIDER_NAME: &str = "openweather";

// ---------------------------------------------------------------------------
// API response types (OpenWeather JSON → Rust)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct OwmCurrentResponse {
    main: OwmMain,
    #[serde(default)]
    weather: Vec<OwmConditions>,
    /// Resolved place name, e.g. `"Lagos"`.
    #[serde(default)]
    name: String,
    #[serde(default)]
    sys: OwmSys,
}

#[derive(Debug, Deserialize)]
struct OwmMain {
    temp: f64,
}

#[derive(Debug, Deserialize, Default)]
struct OwmSys {
    #[serde(default)]
    country: String,
}

#[derive(Debug, Deserialize)]
struct OwmConditions {
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct OwmForecastResponse {
    #[serde(default)]
    list: Vec<OwmForecastItem>,
}

#[derive(Debug, Deserialize)]
struct OwmForecastItem {
    main: OwmMain,
    /// Present only for buckets with precipitation.
    #[serde(default)]
    rain: Option<OwmRain>,
}

/// Rain volumes keyed by window length: `"3h"` in forecasts, `"1h"` in
/// the time series.
#[derive(Debug, Deserialize, Default)]
struct OwmRain {
    #[serde(rename = "3h", default)]
    three_hour: Option<f64>,
    #[serde(rename = "1h", default)]
    one_hour: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwmGeoEntry {
    name: String,
    lat: f64,
    lon: f64,
    #[serde(default)]
    country: String,
    #[serde(default)]
    state: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OwmTimemachineResponse {
    #[serde(default)]
    data: Vec<OwmHourly>,
}

#[derive(Debug, Deserialize)]
struct OwmHourly {
    temp: f64,
    #[serde(default)]
    rain: Option<OwmRain>,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// OpenWeather client. One shared HTTP connection pool, one construction-time
/// timeout, single attempt per call.
pub struct OpenWeatherClient {
    http: Client,
    api_key: String,
}

impl OpenWeatherClient {
    /// Create a new OpenWeather client.
    ///
    /// An empty `api_key` is accepted — calls will then fail at the provider
    /// and the caller's manual-value fallback takes over.
    pub fn new(api_key: String, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent("HARVESTCAST/0.1.0")
            .build()
            .context("Failed to build HTTP client for OpenWeather")?;

        Ok(Self { http, api_key })
    }

    // -- URL builders ----------------------------------------------------

    fn current_url(&self, location: &str) -> String {
        format!(
            "{DATA_BASE_URL}/weather?q={}&appid={}&units=metric",
            urlencoding::encode(location),
            self.api_key,
        )
    }

    fn forecast_url(&self, location: &str) -> String {
        format!(
            "{DATA_BASE_URL}/forecast?q={}&appid={}&units=metric",
            urlencoding::encode(location),
            self.api_key,
        )
    }

    fn geocode_url(&self, location: &str, limit: u8) -> String {
        format!(
            "{GEO_BASE_URL}/direct?q={}&limit={limit}&appid={}",
            urlencoding::encode(location),
            self.api_key,
        )
    }

    fn timemachine_url(&self, lat: f64, lon: f64, timestamp: i64) -> String {
        format!(
            "{ONECALL_BASE_URL}/onecall/timemachine?lat={lat}&lon={lon}&dt={timestamp}&appid={}&units=metric",
            self.api_key,
        )
    }

    // -- Response mapping ------------------------------------------------

    fn to_current(resp: OwmCurrentResponse) -> CurrentConditions {
        let conditions = resp
            .weather
            .first()
            .map(|w| w.description.clone())
            .unwrap_or_default();
        CurrentConditions {
            temperature: resp.main.temp,
            location_name: resp.name,
            country_code: resp.sys.country,
            conditions,
        }
    }

    fn to_forecast(resp: OwmForecastResponse) -> Vec<ForecastSample> {
        resp.list
            .into_iter()
            .map(|item| ForecastSample {
                temperature: item.main.temp,
                rain_mm_3h: item.rain.and_then(|r| r.three_hour),
            })
            .collect()
    }

    fn to_geo(entries: Vec<OwmGeoEntry>) -> Vec<GeoMatch> {
        entries
            .into_iter()
            .map(|e| GeoMatch {
                name: e.name,
                lat: e.lat,
                lon: e.lon,
                country: e.country,
                state: e.state,
            })
            .collect()
    }

    fn to_historical(resp: OwmTimemachineResponse) -> HistoricalLookup {
        let samples = resp
            .data
            .into_iter()
            .map(|h| HistoricalSample {
                temperature: h.temp,
                rain_mm_1h: h.rain.and_then(|r| r.one_hour),
            })
            .collect();
        HistoricalLookup::Samples(samples)
    }
}

// ---------------------------------------------------------------------------
// WeatherApi trait implementation
// ---------------------------------------------------------------------------

#[async_trait]
impl WeatherApi for OpenWeatherClient {
    async fn current_conditions(&self, location: &str) -> Result<CurrentConditions> {
        debug!(location = %location, "Fetching current conditions");

        let resp = self
            .http
            .get(self.current_url(location))
            .send()
            .await
            .context("OpenWeather current-weather request failed")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(HarvestError::WeatherProvider {
                endpoint: "current".to_string(),
                message: format!("{status}: {body}"),
            }
            .into());
        }

        let data: OwmCurrentResponse = resp
            .json()
            .await
            .context("Failed to parse OpenWeather current-weather response")?;

        Ok(Self::to_current(data))
    }

    async fn forecast_samples(&self, location: &str) -> Result<Vec<ForecastSample>> {
        debug!(location = %location, "Fetching forecast");

        let resp = self
            .http
            .get(self.forecast_url(location))
            .send()
            .await
            .context("OpenWeather forecast request failed")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(HarvestError::WeatherProvider {
                endpoint: "forecast".to_string(),
                message: format!("{status}: {body}"),
            }
            .into());
        }

        let data: OwmForecastResponse = resp
            .json()
            .await
            .context("Failed to parse OpenWeather forecast response")?;

        Ok(Self::to_forecast(data))
    }

    async fn geocode(&self, location: &str, limit: u8) -> Result<Vec<GeoMatch>> {
        debug!(location = %location, limit, "Geocoding location");

        let resp = self
            .http
            .get(self.geocode_url(location, limit))
            .send()
            .await
            .context("OpenWeather geocoding request failed")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(HarvestError::WeatherProvider {
                endpoint: "geocode".to_string(),
                message: format!("{status}: {body}"),
            }
            .into());
        }

        let entries: Vec<OwmGeoEntry> = resp
            .json()
            .await
            .context("Failed to parse OpenWeather geocoding response")?;

        debug!(matches = entries.len(), "Geocoding complete");
        Ok(Self::to_geo(entries))
    }

    async fn historical_samples(
        &self,
        lat: f64,
        lon: f64,
        timestamp: i64,
    ) -> Result<HistoricalLookup> {
        debug!(lat, lon, timestamp, "Fetching timemachine readings");

        let resp = self
            .http
            .get(self.timemachine_url(lat, lon, timestamp))
            .send()
            .await
            .context("OpenWeather timemachine request failed")?;

        if !resp.status().is_success() {
            let status = resp.status();
            debug!(status = %status, "Timemachine declined the request");
            return Ok(HistoricalLookup::Unavailable {
                reason: format!("endpoint returned {status}"),
            });
        }

        let data: OwmTimemachineResponse = resp
            .json()
            .await
            .context("Failed to parse OpenWeather timemachine response")?;

        Ok(Self::to_historical(data))
    }

    fn name(&self) -> &str {
        PROVIDER_NAME
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
