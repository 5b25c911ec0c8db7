use crate::classify::{classify, Comfort};
use crate::metrics::{COMFORT_CLASS, HUMIDITY_PERCENT, READINGS_APPLIED_TOTAL, TEMPERATURE_CELSIUS};
use crate::model::Reading;
use crate::state::{History, LatestReading};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::interval;
use tracing::{debug, info, warn};

pub async fn run_recorder(
    mut rx: mpsc::Receiver<Reading>,
    latest: LatestReading,
    history: History,
    summary_interval_secs: u64,
) {
    info!(
        "Starting recorder with summary_interval_secs={}",
        summary_interval_secs
    );

    let mut ticker = interval(Duration::from_secs(summary_interval_secs.max(1)));
    let mut last_class: Option<Comfort> = None;
    let mut received: u64 = 0;

    loop {
        tokio::select! {
            reading = rx.recv() => {
                match reading {
                    Some(r) => {
                        received += 1;
                        let class = apply_reading(&latest, &history, r).await;
                        if last_class != Some(class) {
                            log_transition(last_class, class, &r);
                            last_class = Some(class);
                        }
                    }
                    None => {
                        info!("Channel closed, recorder exiting");
                        break;
                    }
                }
            }

            _ = ticker.tick() => {
                let samples = history.len().await;
                match last_class {
                    Some(class) => info!(
                        "Readings received: {}, history: {} samples, current class: {}",
                        received, samples, class
                    ),
                    None => debug!("No readings received yet"),
                }
            }
        }
    }

    info!("Recorder stopped");
}

/// Stores a reading and updates the gauges, returning its comfort class
async fn apply_reading(latest: &LatestReading, history: &History, reading: Reading) -> Comfort {
    latest.set(reading).await;
    history.push(reading).await;

    let class = classify(reading.temperature);
    READINGS_APPLIED_TOTAL.inc();
    TEMPERATURE_CELSIUS.set(reading.temperature);
    HUMIDITY_PERCENT.set(reading.humidity);
    COMFORT_CLASS.set(class.code());

    debug!(
        "Applied reading t={} h={} ({})",
        reading.temperature, reading.humidity, class
    );
    class
}

fn log_transition(previous: Option<Comfort>, current: Comfort, reading: &Reading) {
    match (previous, current) {
        (None, _) => info!(
            "First reading: {:.1} °C, {:.0}% ({})",
            reading.temperature, reading.humidity, current
        ),
        (Some(_), Comfort::Comfortable) => info!(
            "Room back to comfortable at {:.1} °C",
            reading.temperature
        ),
        (Some(prev), _) => warn!(
            "Room changed from {} to {} at {:.1} °C: {}",
            prev,
            current,
            reading.temperature,
            current.presentation().status
        ),
    }
}
