use crate::config::MqttSettings;
use crate::decode::decode;
use crate::errors::{Error, Result};
use crate::metrics::{DROPPED_READINGS_TOTAL, MALFORMED_MESSAGES_TOTAL, MESSAGES_TOTAL};
use crate::model::Reading;
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, error, info, warn};

fn connect(settings: &MqttSettings) -> (AsyncClient, EventLoop) {
    info!(
        "Connecting to MQTT broker at {}:{}",
        settings.broker, settings.port
    );

    let mut mqtt_options =
        MqttOptions::new(settings.client_id.clone(), settings.broker.clone(), settings.port);
    mqtt_options.set_keep_alive(Duration::from_secs(30));
    mqtt_options.set_clean_session(true);

    AsyncClient::new(mqtt_options, 100)
}

pub async fn run_mqtt(settings: MqttSettings, tx: mpsc::Sender<Reading>) -> Result<()> {
    let (client, mut eventloop) = connect(&settings);

    loop {
        match eventloop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(_))) => {
                // A clean session loses the subscription on every reconnect
                client
                    .subscribe(settings.topic.as_str(), settings.qos)
                    .await
                    .map_err(Error::Mqtt)?;
                info!("Subscribed to {} with {:?}", settings.topic, settings.qos);
            }
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                MESSAGES_TOTAL.inc();

                debug!(
                    "Received message on topic {}, size: {} bytes",
                    publish.topic,
                    publish.payload.len()
                );

                process_message(&publish.payload, &tx)?;
            }
            Ok(_) => {}
            Err(e) => {
                error!("MQTT error: {}", e);
                // rumqttc reconnects on the next poll
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
        }
    }
}

/// Decodes a payload and hands the reading to the recorder.
///
/// Malformed payloads and readings that do not fit in a full channel are
/// dropped; only a closed channel is an error.
fn process_message(payload: &[u8], tx: &mpsc::Sender<Reading>) -> Result<()> {
    let Some(reading) = decode(payload) else {
        MALFORMED_MESSAGES_TOTAL.inc();
        debug!("Ignoring malformed payload ({} bytes)", payload.len());
        return Ok(());
    };

    match tx.try_send(reading) {
        Ok(()) => Ok(()),
        Err(TrySendError::Full(_)) => {
            DROPPED_READINGS_TOTAL.inc();
            warn!("Recorder channel full, dropping reading");
            Ok(())
        }
        Err(TrySendError::Closed(_)) => {
            error!("Channel closed, cannot forward reading");
            Err(Error::ChannelSend)
        }
    }
}

/// Waits for the first decodable reading on the topic.
///
/// Returns `Ok(None)` when nothing arrives before the deadline.
pub async fn wait_for_reading(settings: MqttSettings, deadline: Duration) -> Result<Option<Reading>> {
    let (client, mut eventloop) = connect(&settings);
    client
        .subscribe(settings.topic.as_str(), settings.qos)
        .await
        .map_err(Error::Mqtt)?;

    info!(
        "Waiting up to {:?} for a reading on {}",
        deadline, settings.topic
    );

    let outcome = match tokio::time::timeout(deadline, next_reading(&mut eventloop)).await {
        Ok(result) => result.map(Some),
        Err(_) => {
            warn!("No reading received within {:?}", deadline);
            Ok(None)
        }
    };

    if let Err(e) = client.disconnect().await {
        debug!("Disconnect failed: {}", e);
    }

    outcome
}

async fn next_reading(eventloop: &mut EventLoop) -> Result<Reading> {
    loop {
        if let Event::Incoming(Packet::Publish(publish)) = eventloop.poll().await? {
            MESSAGES_TOTAL.inc();
            match decode(&publish.payload) {
                Some(reading) => return Ok(reading),
                None => {
                    MALFORMED_MESSAGES_TOTAL.inc();
                    debug!("Ignoring malformed payload on {}", publish.topic);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rumqttc::QoS;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;

    const CONNACK: [u8; 4] = [0x20, 0x02, 0x00, 0x00];

    fn settings(port: u16) -> MqttSettings {
        MqttSettings {
            broker: "127.0.0.1".to_string(),
            port,
            topic: "bae".to_string(),
            qos: QoS::AtMostOnce,
            client_id: "bae-test".to_string(),
        }
    }

    /// QoS 0 PUBLISH packet, small enough for a one-byte remaining length
    fn publish_frame(topic: &str, payload: &[u8]) -> Vec<u8> {
        let mut frame = vec![0x30, (2 + topic.len() + payload.len()) as u8];
        frame.extend_from_slice(&(topic.len() as u16).to_be_bytes());
        frame.extend_from_slice(topic.as_bytes());
        frame.extend_from_slice(payload);
        frame
    }

    async fn local_listener() -> (TcpListener, u16) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        (listener, port)
    }

    #[tokio::test]
    async fn test_wait_for_reading_times_out_on_silent_broker() {
        let (listener, port) = local_listener().await;
        tokio::spawn(async move {
            let mut open = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                open.push(socket);
            }
        });

        let outcome = wait_for_reading(settings(port), Duration::from_millis(200)).await;
        assert!(matches!(outcome, Ok(None)));
    }

    #[tokio::test]
    async fn test_wait_for_reading_unreachable_broker_is_error() {
        let (listener, port) = local_listener().await;
        drop(listener);

        let outcome = wait_for_reading(settings(port), Duration::from_secs(5)).await;
        assert!(matches!(outcome, Err(Error::Connection(_))));
    }

    #[tokio::test]
    async fn test_wait_for_reading_skips_undecodable_publishes() {
        let (listener, port) = local_listener().await;
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 256];
            socket.read(&mut buf).await.unwrap();
            socket.write_all(&CONNACK).await.unwrap();
            tokio::time::sleep(Duration::from_millis(50)).await;

            for payload in [
                &b"not json"[..],
                &br#"{"Act1": "ON"}"#[..],
                &br#"{"t": 21.5, "h": 44.0}"#[..],
            ] {
                socket.write_all(&publish_frame("bae", payload)).await.unwrap();
            }
            tokio::time::sleep(Duration::from_secs(5)).await;
        });

        let outcome = wait_for_reading(settings(port), Duration::from_secs(5)).await;
        let reading = match outcome {
            Ok(Some(reading)) => reading,
            other => panic!("expected a reading, got {:?}", other),
        };
        assert_eq!(reading.temperature, 21.5);
        assert_eq!(reading.humidity, 44.0);
    }

    #[tokio::test]
    async fn test_run_mqtt_subscribes_on_connack_and_forwards() {
        let (listener, port) = local_listener().await;
        let (seen_tx, seen_rx) = oneshot::channel();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 256];
            socket.read(&mut buf).await.unwrap();
            socket.write_all(&CONNACK).await.unwrap();

            let n = socket.read(&mut buf).await.unwrap();
            let _ = seen_tx.send(buf[..n].to_vec());

            socket
                .write_all(&publish_frame("bae", br#"{"t": 29.0, "h": 35.0}"#))
                .await
                .unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
        });

        let (tx, mut rx) = mpsc::channel(4);
        let task = tokio::spawn(run_mqtt(settings(port), tx));

        let subscribe = tokio::time::timeout(Duration::from_secs(5), seen_rx)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(subscribe[0], 0x82, "expected SUBSCRIBE after CONNACK");

        let reading = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reading.temperature, 29.0);

        task.abort();
    }

    #[test]
    fn test_process_message_valid() {
        tokio_test::block_on(async {
            let (tx, mut rx) = mpsc::channel(10);

            assert!(process_message(br#"{"t": 24.5, "h": 52}"#, &tx).is_ok());

            let received = rx.recv().await.unwrap();
            assert_eq!(received.temperature, 24.5);
            assert_eq!(received.humidity, 52.0);
        });
    }

    #[test]
    fn test_process_message_malformed_is_swallowed() {
        let (tx, mut rx) = mpsc::channel(10);

        assert!(process_message(b"invalid json", &tx).is_ok());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_process_message_full_channel_drops() {
        let (tx, mut rx) = mpsc::channel(1);

        assert!(process_message(br#"{"t": 20.0, "h": 40.0}"#, &tx).is_ok());
        assert!(process_message(br#"{"t": 30.0, "h": 40.0}"#, &tx).is_ok());

        assert_eq!(rx.try_recv().unwrap().temperature, 20.0);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_process_message_closed_channel() {
        let (tx, rx) = mpsc::channel::<Reading>(1);
        drop(rx);

        assert!(matches!(
            process_message(br#"{"t": 20.0, "h": 40.0}"#, &tx),
            Err(Error::ChannelSend)
        ));
    }
}
