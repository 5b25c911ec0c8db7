use rand::Rng;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Wire payload expected by the monitor: temperature `t` in °C, humidity `h` in %
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Telemetry {
    pub t: f64,
    pub h: f64,
}

/// Draws a uniform reading from the given ranges, rounded to one decimal
pub fn generate(rng: &mut impl Rng, temperature: &Range<f64>, humidity: &Range<f64>) -> Telemetry {
    Telemetry {
        t: round1(rng.gen_range(temperature.clone())),
        h: round1(rng.gen_range(humidity.clone())),
    }
}

/// A range `gen_range` can sample from: finite bounds, start strictly below end
pub fn is_sampleable(range: &Range<f64>) -> bool {
    range.start.is_finite() && range.end.is_finite() && range.start < range.end
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
