use serde::Serialize;

/// Below this the room is too cold for the baby
pub const COLD_BELOW: f64 = 18.0;
/// Above this the room is too warm
pub const HOT_ABOVE: f64 = 28.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Comfort {
    Cold,
    Comfortable,
    Hot,
}

/// Fixed display bundle bound to a comfort class
#[derive(Debug, Serialize)]
pub struct Presentation {
    pub status: &'static str,
    pub color: &'static str,
    pub image: &'static str,
    pub audio: &'static str,
    pub speech: &'static str,
}

const COLD: Presentation = Presentation {
    status: "Hace frío en la habitación",
    color: "#C6E2E3",
    image: "img/bebe_frio.png",
    audio: "audio/frio.mp3",
    speech: "La habitación está fría. Abriga un poco más al bebé.",
};

const COMFORTABLE: Presentation = Presentation {
    status: "Condiciones estables",
    color: "#FFF2C3",
    image: "img/bebe_feliz.png",
    audio: "audio/estable.mp3",
    speech: "La temperatura es agradable. El bebé está cómodo.",
};

const HOT: Presentation = Presentation {
    status: "Hace calor en la habitación",
    color: "#DD8E6B",
    image: "img/bebe_calor.png",
    audio: "audio/calor.mp3",
    speech: "La habitación está caliente. Ventila el cuarto y revisa la ropa del bebé.",
};

/// Maps a temperature in °C to its comfort class.
///
/// Both thresholds are strict, so 18 and 28 are comfortable. NaN fails both
/// comparisons and lands in `Comfortable` as well.
pub fn classify(temperature: f64) -> Comfort {
    if temperature < COLD_BELOW {
        Comfort::Cold
    } else if temperature > HOT_ABOVE {
        Comfort::Hot
    } else {
        Comfort::Comfortable
    }
}

impl Comfort {
    pub fn presentation(self) -> &'static Presentation {
        match self {
            Comfort::Cold => &COLD,
            Comfort::Comfortable => &COMFORTABLE,
            Comfort::Hot => &HOT,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Comfort::Cold => "cold",
            Comfort::Comfortable => "comfortable",
            Comfort::Hot => "hot",
        }
    }

    /// Numeric code exported on the comfort gauge
    pub fn code(self) -> i64 {
        match self {
            Comfort::Cold => -1,
            Comfort::Comfortable => 0,
            Comfort::Hot => 1,
        }
    }
}

impl std::fmt::Display for Comfort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
