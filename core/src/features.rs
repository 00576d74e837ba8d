use crate::types::{present, RawSession};

pub const DEFAULT_TEMPERATURE_F: f64 = 55.0;
pub const DEFAULT_HUMIDITY_PCT: f64 = 50.0;
pub const DEFAULT_WIND_MPH: f64 = 0.0;
/// Brukes når tidsstempel mangler (referansetimen i baseline-modellen)
pub const DEFAULT_HOUR: u32 = 8;
pub const DEFAULT_HEART_RATE: f64 = 140.0;
pub const REFERENCE_PACE: f64 = 6.5;

/// [temperature, humidity, hourOfDay, heartRate, pace]
pub type FeatureVector = [f64; 5];

pub const FEATURE_DIM: usize = 5;

/// Verdiene baseline og features deler, med standardverdier fylt inn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Conditions {
    pub temperature: f64,
    pub humidity: f64,
    pub wind: f64,
    pub hour: u32,
    pub heart_rate: f64,
    pub pace: f64,
}

impl Conditions {
    pub fn of(s: &RawSession) -> Self {
        Self {
            temperature: present(s.weather.temperature).unwrap_or(DEFAULT_TEMPERATURE_F),
            humidity: present(s.weather.humidity).unwrap_or(DEFAULT_HUMIDITY_PCT),
            wind: present(s.weather.wind).unwrap_or(DEFAULT_WIND_MPH),
            hour: s.start_hour().unwrap_or(DEFAULT_HOUR),
            heart_rate: present(s.heart_rate).unwrap_or(DEFAULT_HEART_RATE),
            pace: present(s.pace).unwrap_or(REFERENCE_PACE),
        }
    }
}

pub fn extract_features(s: &RawSession) -> FeatureVector {
    let c = Conditions::of(s);
    [c.temperature, c.humidity, c.hour as f64, c.heart_rate, c.pace]
}

pub fn feature_matrix(sessions: &[RawSession]) -> Vec<FeatureVector> {
    sessions.iter().map(extract_features).collect()
}
