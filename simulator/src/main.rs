mod actuator;
mod telemetry;

use actuator::Switch;
use clap::{Parser, Subcommand};
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS};
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Publishes simulated nursery temperature/humidity readings, or a single
/// actuator command
#[derive(Debug, Parser)]
#[command(name = "bae-simulator", version)]
struct Args {
    #[arg(long, env = "MQTT_BROKER", default_value = "broker.hivemq.com", global = true)]
    mqtt_broker: String,

    #[arg(long, env = "MQTT_PORT", default_value_t = 1883, global = true)]
    mqtt_port: u16,

    #[arg(long, env = "MQTT_TOPIC", default_value = "bae", global = true)]
    mqtt_topic: String,

    /// Milliseconds between readings
    #[arg(long, env = "RATE_MS", default_value_t = 2000)]
    rate_ms: u64,

    /// Stop after this many readings, 0 runs forever
    #[arg(long, env = "COUNT", default_value_t = 0)]
    count: u64,

    #[arg(long, env = "TEMP_MIN", default_value_t = 15.0)]
    temp_min: f64,

    #[arg(long, env = "TEMP_MAX", default_value_t = 32.0)]
    temp_max: f64,

    #[arg(long, env = "HUM_MIN", default_value_t = 25.0)]
    hum_min: f64,

    #[arg(long, env = "HUM_MAX", default_value_t = 70.0)]
    hum_max: f64,

    #[command(subcommand)]
    mode: Option<Mode>,
}

#[derive(Debug, Subcommand)]
enum Mode {
    /// Publish one actuator command and exit
    Command {
        #[command(subcommand)]
        action: Action,
    },
}

#[derive(Debug, Subcommand)]
enum Action {
    /// Turn actuator 1 on or off
    Switch {
        #[arg(value_enum)]
        state: Switch,
    },
    /// Send an analog level between 0 and 100
    Analog {
        #[arg(value_parser = actuator::parse_analog)]
        value: f64,
    },
}

impl Action {
    fn into_command(self) -> actuator::Command {
        match self {
            Action::Switch { state } => actuator::Command::Switch { state },
            Action::Analog { value } => actuator::Command::Analog { value },
        }
    }
}

const COMMAND_ACK_TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() {
    let mut args = Args::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!(
        "Broker: {}:{}, topic: {}",
        args.mqtt_broker, args.mqtt_port, args.mqtt_topic
    );

    let (client, eventloop) = connect(&args);

    match args.mode.take() {
        Some(Mode::Command { action }) => {
            let command = action.into_command();
            if let Err(e) = send_command(&client, eventloop, &args.mqtt_topic, command).await {
                error!("Failed to send {}: {}", command.describe(), e);
                std::process::exit(1);
            }
        }
        None => run_stream(&args, client, eventloop).await,
    }
}

fn connect(args: &Args) -> (AsyncClient, EventLoop) {
    let client_id = format!("bae-sim-{}", uuid::Uuid::new_v4());

    let mut mqtt_options = MqttOptions::new(&client_id, &args.mqtt_broker, args.mqtt_port);
    mqtt_options.set_keep_alive(Duration::from_secs(30));
    mqtt_options.set_clean_session(true);

    AsyncClient::new(mqtt_options, 100)
}

/// Publishes one command with QoS 1 and waits for the broker's PUBACK
async fn send_command(
    client: &AsyncClient,
    mut eventloop: EventLoop,
    topic: &str,
    command: actuator::Command,
) -> Result<(), String> {
    let payload = serde_json::to_string(&command).map_err(|e| e.to_string())?;
    client
        .publish(topic, QoS::AtLeastOnce, false, payload.clone())
        .await
        .map_err(|e| e.to_string())?;

    let acked = async {
        loop {
            match eventloop.poll().await {
                Ok(Event::Incoming(Packet::PubAck(_))) => return Ok(()),
                Ok(_) => {}
                Err(e) => return Err(e.to_string()),
            }
        }
    };

    match tokio::time::timeout(COMMAND_ACK_TIMEOUT, acked).await {
        Ok(result) => result?,
        Err(_) => return Err(format!("no PUBACK within {:?}", COMMAND_ACK_TIMEOUT)),
    }

    info!("Sent {} as {}", command.describe(), payload);
    if let Err(e) = client.disconnect().await {
        warn!("Disconnect failed: {}", e);
    }
    Ok(())
}

async fn run_stream(args: &Args, client: AsyncClient, mut eventloop: EventLoop) {
    let temperature = args.temp_min..args.temp_max;
    let humidity = args.hum_min..args.hum_max;
    if !telemetry::is_sampleable(&temperature) || !telemetry::is_sampleable(&humidity) {
        error!("Invalid range: bounds must be finite and min below max for temperature and humidity");
        std::process::exit(2);
    }

    info!("Starting BAE simulator, one reading every {} ms", args.rate_ms);

    // Spawn eventloop handler
    tokio::spawn(async move {
        loop {
            match eventloop.poll().await {
                Ok(_) => {}
                Err(e) => {
                    error!("MQTT eventloop error: {}", e);
                    tokio::time::sleep(Duration::from_secs(1)).await;
                }
            }
        }
    });

    let mut ticker = tokio::time::interval(Duration::from_millis(args.rate_ms.max(1)));
    let mut published = 0u64;

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                info!("Received shutdown signal");
                break;
            }
        }

        let reading = telemetry::generate(&mut rand::thread_rng(), &temperature, &humidity);
        let payload = match serde_json::to_string(&reading) {
            Ok(p) => p,
            Err(e) => {
                error!("Failed to serialize telemetry: {}", e);
                continue;
            }
        };

        match client
            .publish(args.mqtt_topic.as_str(), QoS::AtMostOnce, false, payload)
            .await
        {
            Ok(_) => {
                published += 1;
                info!("Published t={} h={}", reading.t, reading.h);
            }
            Err(e) => {
                warn!("Failed to publish: {}", e);
            }
        }

        if args.count > 0 && published >= args.count {
            info!("Published {} readings, stopping", published);
            break;
        }
    }

    // Let the eventloop flush the last publish
    tokio::time::sleep(Duration::from_millis(500)).await;
    if let Err(e) = client.disconnect().await {
        warn!("Disconnect failed: {}", e);
    }
}
