use crate::errors::{Error, Result};
use clap::Parser;
use rumqttc::QoS;
use std::time::Duration;

/// Nursery monitor: reads room telemetry from MQTT and serves its status
#[derive(Debug, Clone, Parser)]
#[command(name = "bae-monitor", version)]
pub struct Config {
    #[arg(long, env = "MQTT_BROKER", default_value = "broker.hivemq.com")]
    pub mqtt_broker: String,

    #[arg(long, env = "MQTT_PORT", default_value_t = 1883)]
    pub mqtt_port: u16,

    #[arg(long, env = "MQTT_TOPIC", default_value = "bae")]
    pub mqtt_topic: String,

    /// Subscription QoS, 0 or 1
    #[arg(long, env = "MQTT_QOS", default_value_t = 0)]
    pub mqtt_qos: u8,

    #[arg(long, env = "HTTP_ADDR", default_value = "0.0.0.0:8080")]
    pub http_addr: String,

    /// Samples kept for charting, 0 disables the history
    #[arg(long, env = "HISTORY_CAPACITY", default_value_t = 500)]
    pub history_capacity: usize,

    #[arg(long, env = "CHANNEL_CAPACITY", default_value_t = 1024)]
    pub channel_capacity: usize,

    #[arg(long, env = "SUMMARY_INTERVAL_SECS", default_value_t = 60)]
    pub summary_interval_secs: u64,

    /// Deadline for `--once`
    #[arg(long, env = "WAIT_TIMEOUT_SECS", default_value_t = 10)]
    pub wait_timeout_secs: u64,

    /// Wait for a single reading, print its status and exit
    #[arg(long)]
    pub once: bool,
}

/// Connection settings shared by the subscriber and the one-shot probe
#[derive(Debug, Clone)]
pub struct MqttSettings {
    pub broker: String,
    pub port: u16,
    pub topic: String,
    pub qos: QoS,
    pub client_id: String,
}

impl Config {
    pub fn mqtt_settings(&self, client_id: String) -> Result<MqttSettings> {
        if self.mqtt_topic.is_empty() {
            return Err(Error::Config("MQTT topic cannot be empty".to_string()));
        }
        if self.channel_capacity == 0 {
            return Err(Error::Config("channel capacity must be at least 1".to_string()));
        }

        let qos = match self.mqtt_qos {
            0 => QoS::AtMostOnce,
            1 => QoS::AtLeastOnce,
            other => {
                return Err(Error::Config(format!("unsupported QoS {}, use 0 or 1", other)));
            }
        };

        Ok(MqttSettings {
            broker: self.mqtt_broker.clone(),
            port: self.mqtt_port,
            topic: self.mqtt_topic.clone(),
            qos,
            client_id,
        })
    }

    pub fn wait_timeout(&self) -> Duration {
        Duration::from_secs(self.wait_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::try_parse_from(["bae-monitor"]).unwrap();
        assert_eq!(config.mqtt_port, 1883);
        assert!(!config.once);

        let settings = config.mqtt_settings("test".to_string()).unwrap();
        assert_eq!(settings.qos, QoS::AtMostOnce);
        assert_eq!(settings.client_id, "test");
    }

    #[test]
    fn test_flags_override() {
        let config = Config::try_parse_from([
            "bae-monitor",
            "--mqtt-topic",
            "sensor/temperatura",
            "--mqtt-qos",
            "1",
            "--once",
        ])
        .unwrap();

        assert!(config.once);
        let settings = config.mqtt_settings("test".to_string()).unwrap();
        assert_eq!(settings.topic, "sensor/temperatura");
        assert_eq!(settings.qos, QoS::AtLeastOnce);
    }

    #[test]
    fn test_invalid_qos() {
        let config = Config::try_parse_from(["bae-monitor", "--mqtt-qos", "2"]).unwrap();
        assert!(matches!(
            config.mqtt_settings("test".to_string()),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_empty_topic() {
        let config = Config::try_parse_from(["bae-monitor", "--mqtt-topic", ""]).unwrap();
        assert!(config.mqtt_settings("test".to_string()).is_err());
    }
}
