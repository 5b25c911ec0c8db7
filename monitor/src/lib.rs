//! Nursery room monitor.
//!
//! Reads `{"t", "h"}` telemetry from an MQTT topic, keeps the latest reading
//! and a short history, classifies the room temperature and answers a few
//! keyword intents. `main.rs` wires these into the `bae-monitor` binary.

pub mod classify;
pub mod config;
pub mod decode;
pub mod errors;
pub mod intent;
pub mod metrics;
pub mod model;
pub mod mqtt;
pub mod recorder;
pub mod rest;
pub mod state;
