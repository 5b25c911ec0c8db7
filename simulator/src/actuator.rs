use clap::ValueEnum;
use serde::Serialize;

pub const ANALOG_MIN: f64 = 0.0;
pub const ANALOG_MAX: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ValueEnum)]
#[serde(rename_all = "UPPERCASE")]
pub enum Switch {
    On,
    Off,
}

/// Actuator command published on the same topic as the readings
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Command {
    Switch {
        #[serde(rename = "Act1")]
        state: Switch,
    },
    Analog {
        #[serde(rename = "Analog")]
        value: f64,
    },
}

impl Command {
    pub fn describe(&self) -> String {
        match self {
            Command::Switch { state: Switch::On } => "switch ON".to_string(),
            Command::Switch { state: Switch::Off } => "switch OFF".to_string(),
            Command::Analog { value } => format!("analog {}", value),
        }
    }
}

/// clap value parser for the analog level, 0 to 100 inclusive
pub fn parse_analog(raw: &str) -> Result<f64, String> {
    let value: f64 = raw
        .parse()
        .map_err(|_| format!("`{}` is not a number", raw))?;
    if (ANALOG_MIN..=ANALOG_MAX).contains(&value) {
        Ok(value)
    } else {
        Err(format!(
            "analog value must be within {}..={}",
            ANALOG_MIN, ANALOG_MAX
        ))
    }
}
