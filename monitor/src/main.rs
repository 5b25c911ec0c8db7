use axum::{routing::get, Router};
use bae_monitor::config::{self, Config};
use bae_monitor::state::{History, LatestReading};
use bae_monitor::{metrics, mqtt, recorder, rest};
use clap::Parser;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let config = Config::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting BAE monitor");
    info!("MQTT broker: {}:{}", config.mqtt_broker, config.mqtt_port);
    info!("MQTT topic: {}", config.mqtt_topic);

    // Generate client ID
    let client_id = format!("bae-monitor-{}", uuid::Uuid::new_v4());
    let settings = match config.mqtt_settings(client_id) {
        Ok(settings) => settings,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(2);
        }
    };

    if config.once {
        run_once(settings, &config).await;
        return;
    }

    // Initialize metrics
    metrics::init_metrics();

    let latest = LatestReading::new();
    let history = History::new(config.history_capacity);

    info!("Channel capacity: {}", config.channel_capacity);
    let (tx, rx) = mpsc::channel(config.channel_capacity);

    let mqtt_handle = tokio::spawn(async move {
        if let Err(e) = mqtt::run_mqtt(settings, tx).await {
            error!("MQTT task failed: {}", e);
        }
    });

    let recorder_handle = tokio::spawn(recorder::run_recorder(
        rx,
        latest.clone(),
        history.clone(),
        config.summary_interval_secs,
    ));

    // Build HTTP app with REST API and metrics endpoint
    let app = Router::new()
        .route("/metrics", get(metrics_handler))
        .merge(rest::create_router(latest, history));

    // Start HTTP server
    let listener = tokio::net::TcpListener::bind(&config.http_addr)
        .await
        .unwrap_or_else(|e| {
            error!("Failed to bind to {}: {}", config.http_addr, e);
            std::process::exit(1);
        });

    info!("HTTP server listening on {}", config.http_addr);

    let server_handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap_or_else(|e| {
            error!("HTTP server error: {}", e);
        });
    });

    tokio::select! {
        _ = mqtt_handle => {
            error!("MQTT task terminated");
        }
        _ = recorder_handle => {
            error!("Recorder task terminated");
        }
        _ = server_handle => {
            error!("HTTP server terminated");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal");
        }
    }

    info!("Shutting down");
}

/// Waits for one reading, prints its status as JSON and exits.
///
/// Without a reading before the deadline the zero reading is reported, as the
/// dashboard would show it.
async fn run_once(settings: config::MqttSettings, config: &Config) {
    let reading = match mqtt::wait_for_reading(settings, config.wait_timeout()).await {
        Ok(Some(reading)) => Some(reading),
        Ok(None) => {
            warn!("No data from the sensor, showing defaults");
            None
        }
        Err(e) => {
            error!("Could not read from the broker: {}", e);
            std::process::exit(1);
        }
    };

    let status = rest::build_status(reading.unwrap_or_default(), reading.is_some());
    match serde_json::to_string_pretty(&status) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            error!("Failed to serialize status: {}", e);
            std::process::exit(1);
        }
    }
}

async fn metrics_handler() -> String {
    metrics::gather_metrics()
}
