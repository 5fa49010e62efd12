use chrono::NaiveDateTime;
use std::fmt;

/// Geographic position of a city: degrees and metres above sea level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
    pub elevation: f64,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2},{:.2},{:.0}", self.latitude, self.longitude, self.elevation)
    }
}

/// Randomly rolled sensor values for one observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reading {
    pub temperature_c: i32,
    pub pressure_hpa: i32,
    pub humidity_pct: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    Rain,
    Sunny,
    Snow,
    Unforeseen,
}

impl Condition {
    /// Derive the condition label from temperature and humidity.
    ///
    /// Rules are checked top to bottom and the first match wins. The last two
    /// `temp == 0` arms and the `Unforeseen` fallback can never be reached:
    /// the arms above already cover every input. Likely a latent bug in the
    /// rule table; left as-is.
    #[allow(clippy::if_same_then_else)]
    pub fn derive(temperature_c: i32, humidity_pct: i32) -> Self {
        if temperature_c > 0 && humidity_pct >= 100 {
            Condition::Rain
        } else if temperature_c > 0 && humidity_pct < 100 {
            Condition::Sunny
        } else if temperature_c < 0 && humidity_pct < 100 {
            Condition::Snow
        } else if temperature_c <= 0 && humidity_pct >= 100 {
            Condition::Snow
        } else if temperature_c == 0 && humidity_pct < 100 {
            Condition::Sunny
        } else if temperature_c == 0 && humidity_pct > 100 {
            // unreachable
            Condition::Rain
        } else {
            // unreachable
            Condition::Unforeseen
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Condition::Rain => "Rain",
            Condition::Sunny => "Sunny",
            Condition::Snow => "Snow",
            Condition::Unforeseen => "Unforeseen",
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One synthetic weather record. `Display` renders the pipe-delimited line
/// `Name|lat,lon,elev|timestamp|Condition|Temp|Pressure|Humidity`.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub city: String,
    pub position: Position,
    pub local_time: NaiveDateTime,
    pub condition: Condition,
    pub reading: Reading,
}

impl Observation {
    pub fn new(
        city: impl Into<String>,
        position: Position,
        local_time: NaiveDateTime,
        reading: Reading,
    ) -> Self {
        Self {
            city: city.into(),
            position,
            local_time,
            condition: Condition::derive(reading.temperature_c, reading.humidity_pct),
            reading,
        }
    }
}

impl fmt::Display for Observation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}|{}|{}|{}|{}|{}|{}",
            self.city,
            self.position,
            self.local_time.format("%Y-%m-%dT%H:%M:%S"),
            self.condition,
            self.reading.temperature_c,
            self.reading.pressure_hpa,
            self.reading.humidity_pct,
        )
    }
}
