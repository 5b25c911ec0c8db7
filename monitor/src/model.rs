use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::classify::{Comfort, Presentation};

/// A single temperature/humidity sample from the nursery sensor
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Degrees Celsius
    pub temperature: f64,
    /// Relative humidity, percent
    pub humidity: f64,
}

/// A reading stamped with its arrival time, kept for charting
#[derive(Debug, Clone, Serialize)]
pub struct Sample {
    #[serde(flatten)]
    pub reading: Reading,
    pub received_at: DateTime<Utc>,
}

/// Response body for `/api/v1/status`
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub reading: Reading,
    pub has_data: bool,
    pub comfort: Comfort,
    pub presentation: &'static Presentation,
    pub alerts: Vec<String>,
}

/// Response body for `/api/v1/history`
#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub data: Vec<Sample>,
    /// Samples currently stored, regardless of `limit`
    pub total: usize,
    pub limit: usize,
}
