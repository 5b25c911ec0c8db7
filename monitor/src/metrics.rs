use lazy_static::lazy_static;
use prometheus::{Counter, Encoder, Gauge, IntGauge, Opts, Registry, TextEncoder};
use tracing::error;

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();
    pub static ref MESSAGES_TOTAL: Counter = Counter::with_opts(Opts::new(
        "bae_messages_total",
        "Total messages received from MQTT"
    ))
    .unwrap();
    pub static ref READINGS_APPLIED_TOTAL: Counter = Counter::with_opts(Opts::new(
        "bae_readings_applied_total",
        "Total readings stored in the latest-reading slot"
    ))
    .unwrap();
    pub static ref MALFORMED_MESSAGES_TOTAL: Counter = Counter::with_opts(Opts::new(
        "bae_malformed_messages_total",
        "Total payloads that could not be decoded"
    ))
    .unwrap();
    pub static ref DROPPED_READINGS_TOTAL: Counter = Counter::with_opts(Opts::new(
        "bae_dropped_readings_total",
        "Total readings dropped because the recorder channel was full"
    ))
    .unwrap();
    pub static ref TEMPERATURE_CELSIUS: Gauge = Gauge::with_opts(Opts::new(
        "bae_temperature_celsius",
        "Last reported room temperature"
    ))
    .unwrap();
    pub static ref HUMIDITY_PERCENT: Gauge = Gauge::with_opts(Opts::new(
        "bae_humidity_percent",
        "Last reported relative humidity"
    ))
    .unwrap();
    pub static ref COMFORT_CLASS: IntGauge = IntGauge::with_opts(Opts::new(
        "bae_comfort_class",
        "Comfort class of the last reading (-1 cold, 0 comfortable, 1 hot)"
    ))
    .unwrap();
}

pub fn init_metrics() {
    REGISTRY.register(Box::new(MESSAGES_TOTAL.clone())).unwrap();
    REGISTRY
        .register(Box::new(READINGS_APPLIED_TOTAL.clone()))
        .unwrap();
    REGISTRY
        .register(Box::new(MALFORMED_MESSAGES_TOTAL.clone()))
        .unwrap();
    REGISTRY
        .register(Box::new(DROPPED_READINGS_TOTAL.clone()))
        .unwrap();
    REGISTRY
        .register(Box::new(TEMPERATURE_CELSIUS.clone()))
        .unwrap();
    REGISTRY.register(Box::new(HUMIDITY_PERCENT.clone())).unwrap();
    REGISTRY.register(Box::new(COMFORT_CLASS.clone())).unwrap();
}

pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        error!("Failed to encode metrics: {}", e);
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}
