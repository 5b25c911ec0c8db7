use crate::classify::{classify, Comfort};
use crate::model::Reading;
use serde::Serialize;

/// Relative humidity below which the air is considered too dry
pub const DRY_BELOW: f64 = 30.0;

const TEMPERATURE_WORDS: &[&str] = &[
    "temperatura",
    "caliente",
    "frío",
    "frio",
    "fiebre",
    "calor",
    "humedad",
    "cómo está",
    "como esta",
];

const MUSIC_WORDS: &[&str] = &[
    "música",
    "musica",
    "suena",
    "canción",
    "cancion",
    "relajante",
    "nana",
];

const STORY_WORDS: &[&str] = &["cuento", "cuéntame", "cuentame", "narrar", "historia"];

const MUSIC_REPLY: &str = "Listo, reproduzco música suave para el bebé.";

const STORY_REPLY: &str = "Había una vez un osito curioso llamado Luno que vivía en una nube. \
Cada noche, Luno bajaba a la tierra a abrazar a los niños con su luz cálida. \
Y así, todos dormían tranquilos.";

const HELP_REPLY: &str =
    "Puedo consultar la temperatura, reproducir música o contar un cuento. ¿Qué quieres que haga?";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    Temperature,
    Music,
    Story,
    Unknown,
}

#[derive(Debug, Serialize)]
pub struct Response {
    pub intent: Intent,
    pub text: String,
}

/// Picks the intent for a transcript by keyword membership.
///
/// Categories are checked in order temperature, music, story; the first hit
/// wins.
pub fn detect(text: &str) -> Intent {
    let text = text.trim().to_lowercase();
    if text.is_empty() {
        return Intent::Unknown;
    }

    let mentions = |words: &[&str]| words.iter().any(|w| text.contains(*w));

    if mentions(TEMPERATURE_WORDS) {
        Intent::Temperature
    } else if mentions(MUSIC_WORDS) {
        Intent::Music
    } else if mentions(STORY_WORDS) {
        Intent::Story
    } else {
        Intent::Unknown
    }
}

/// Alerts worth speaking for the given reading, most important first
pub fn alerts(reading: &Reading) -> Vec<String> {
    let mut alerts = Vec::new();

    match classify(reading.temperature) {
        Comfort::Cold => alerts.push("Temperatura baja, revisa el abrigo del bebé.".to_string()),
        Comfort::Hot => alerts.push("Temperatura alta, ventila la habitación.".to_string()),
        Comfort::Comfortable => {}
    }

    if reading.humidity < DRY_BELOW {
        alerts.push("Humedad baja, el ambiente está reseco.".to_string());
    }

    alerts
}

pub fn respond(intent: Intent, reading: &Reading) -> Response {
    let text = match intent {
        Intent::Temperature => {
            let mut text = format!(
                "La temperatura actual es {:.1} °C y la humedad {:.0}%.",
                reading.temperature, reading.humidity
            );
            if let Some(first) = alerts(reading).first() {
                text.push_str(" Atención: ");
                text.push_str(first);
            }
            text
        }
        Intent::Music => MUSIC_REPLY.to_string(),
        Intent::Story => STORY_REPLY.to_string(),
        Intent::Unknown => HELP_REPLY.to_string(),
    };

    Response { intent, text }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(temperature: f64, humidity: f64) -> Reading {
        Reading {
            temperature,
            humidity,
        }
    }

    #[test]
    fn test_detect_temperature() {
        assert_eq!(detect("¿Cuál es la TEMPERATURA?"), Intent::Temperature);
        assert_eq!(detect("¿Cómo está mi bebé?"), Intent::Temperature);
        assert_eq!(detect("tiene fiebre"), Intent::Temperature);
    }

    #[test]
    fn test_detect_music_and_story() {
        assert_eq!(detect("Pon música"), Intent::Music);
        assert_eq!(detect("una canción relajante"), Intent::Music);
        assert_eq!(detect("Cuéntame un cuento"), Intent::Story);
    }

    #[test]
    fn test_detect_order_prefers_temperature() {
        assert_eq!(detect("pon música y dime la temperatura"), Intent::Temperature);
        assert_eq!(detect("una canción y un cuento"), Intent::Music);
    }

    #[test]
    fn test_detect_unknown() {
        assert_eq!(detect(""), Intent::Unknown);
        assert_eq!(detect("   "), Intent::Unknown);
        assert_eq!(detect("apaga la luz"), Intent::Unknown);
    }

    #[test]
    fn test_alerts() {
        assert!(alerts(&reading(22.0, 45.0)).is_empty());
        assert_eq!(alerts(&reading(15.0, 45.0)).len(), 1);
        assert_eq!(alerts(&reading(31.0, 20.0)).len(), 2);
        assert!(alerts(&reading(31.0, 20.0))[0].starts_with("Temperatura alta"));
    }

    #[test]
    fn test_respond_temperature_with_alert() {
        let response = respond(Intent::Temperature, &reading(16.04, 40.0));
        assert_eq!(response.intent, Intent::Temperature);
        assert!(response.text.contains("16.0 °C"));
        assert!(response.text.contains("40%"));
        assert!(response.text.contains("Atención: Temperatura baja"));
    }

    #[test]
    fn test_respond_temperature_without_alert() {
        let response = respond(Intent::Temperature, &reading(22.0, 50.0));
        assert!(!response.text.contains("Atención"));
    }

    #[test]
    fn test_respond_canned() {
        let r = reading(22.0, 50.0);
        assert_eq!(respond(Intent::Music, &r).text, MUSIC_REPLY);
        assert!(respond(Intent::Story, &r).text.contains("Luno"));
        assert!(respond(Intent::Unknown, &r).text.starts_with("Puedo consultar"));
    }
}
