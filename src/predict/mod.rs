//! Yield model integration.
//!
//! The model itself is a black box: one flat feature record in, one
//! predicted yield (hg/ha) out. Everything about how the number is produced
//! lives on the other side of [`YieldPredictor`]; this crate only prepares
//! features and relays the score.

pub mod http;

pub use http::HttpYieldPredictor;

use anyhow::Result;
use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

use crate::types::YieldFeatureRecord;

/// A yield model that scores one feature record at a time.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait YieldPredictor: Send + Sync {
    /// Score a single record. Returns the predicted yield in hg/ha.
    async fn predict(&self, record: &YieldFeatureRecord) -> Result<f64>;

    /// Short model name for logs.
    fn name(&self) -> &str;
}
