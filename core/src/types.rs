use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate, Timelike};
use serde::{Deserialize, Serialize};

pub type SessionId = u64;
pub type ClusterId = usize;

/// Værtilstand slik datakilden rapporterer den. Ukjente verdier → `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeatherCondition {
    Clear,
    Cloudy,
    Fog,
    Drizzle,
    Rain,
    Snow,
    Storm,
    #[serde(other)]
    Unknown,
}

impl fmt::Display for WeatherCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WeatherCondition::Clear => "Clear",
            WeatherCondition::Cloudy => "Cloudy",
            WeatherCondition::Fog => "Fog",
            WeatherCondition::Drizzle => "Drizzle",
            WeatherCondition::Rain => "Rain",
            WeatherCondition::Snow => "Snow",
            WeatherCondition::Storm => "Storm",
            WeatherCondition::Unknown => "Unknown",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionWeather {
    #[serde(default)]
    pub temperature: Option<f64>, // °F
    #[serde(default)]
    pub humidity: Option<f64>,    // %
    #[serde(default)]
    pub wind: Option<f64>,        // mph, negativ = medvind
    #[serde(default)]
    pub condition: Option<WeatherCondition>,
}

/// Rå økt fra datakilden. Alle måleverdier kan mangle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSession {
    pub id: SessionId,
    #[serde(default)]
    pub pace: Option<f64>,         // min/mi
    #[serde(default)]
    pub duration: Option<f64>,     // min
    #[serde(default, alias = "heartRate")]
    pub heart_rate: Option<f64>,   // bpm
    pub date: NaiveDate,
    #[serde(default, alias = "startTimestamp")]
    pub start: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
    #[serde(default)]
    pub weather: SessionWeather,
}

/// `Some(v)` kun når verdien faktisk finnes (NaN regnes som manglende).
#[inline]
pub fn present(v: Option<f64>) -> Option<f64> {
    v.filter(|x| !x.is_nan())
}

impl RawSession {
    /// Starttime (0–23) i øktens egen tidssone, `None` uten tidsstempel.
    pub fn start_hour(&self) -> Option<u32> {
        self.start.map(|t| t.hour())
    }
}

/// Brukerredigerbar metadata per økt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionMeta {
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, alias = "isFalsePositive")]
    pub is_false_positive: bool,
    #[serde(default, alias = "feltHarder")]
    pub felt_harder: bool,
}

/// Delvis oppdatering av metadata (felt som er `None` beholdes).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionMetaPatch {
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default, alias = "isFalsePositive")]
    pub is_false_positive: Option<bool>,
    #[serde(default, alias = "feltHarder")]
    pub felt_harder: Option<bool>,
}

impl SessionMeta {
    pub fn merged(&self, patch: &SessionMetaPatch) -> SessionMeta {
        SessionMeta {
            tags: patch.tags.clone().unwrap_or_else(|| self.tags.clone()),
            is_false_positive: patch.is_false_positive.unwrap_or(self.is_false_positive),
            felt_harder: patch.felt_harder.unwrap_or(self.felt_harder),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Factor {
    pub label: String,
    /// Positiv = hjalp (raskere enn referanse)
    pub impact: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpectedPerformance {
    pub expected_pace: f64,
    pub factors: Vec<Factor>,
}

/// Hovedutdata per økt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionPoint {
    pub id: SessionId,
    pub date: NaiveDate,
    pub start: Option<DateTime<FixedOffset>>,
    pub start_hour: u32,
    pub temperature: f64,
    pub pace: f64,
    pub x: f64,
    pub y: f64,
    pub cluster: ClusterId,
    pub distance_to_centroid: f64,
    pub descriptor: String,
    pub expected_pace: f64,
    pub pace_delta: f64,
    pub good: bool,
    pub confidence: f64,
    pub factors: Vec<Factor>,

    // Overlay fra metadata-lageret
    pub tags: Vec<String>,
    pub is_false_positive: bool,
    pub felt_harder: bool,
}

impl SessionPoint {
    pub fn apply_meta(&mut self, meta: &SessionMeta) {
        self.tags = meta.tags.clone();
        self.is_false_positive = meta.is_false_positive;
        self.felt_harder = meta.felt_harder;
    }
}

#[cfg(test)]
impl SessionPoint {
    /// Nøytralt punkt for enhetstester (referanseforhold, delta 0).
    pub(crate) fn for_test(id: SessionId, date: &str, cluster: ClusterId) -> Self {
        SessionPoint {
            id,
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            start: None,
            start_hour: 8,
            temperature: 55.0,
            pace: 6.5,
            x: 0.0,
            y: 0.0,
            cluster,
            distance_to_centroid: 0.0,
            descriptor: String::new(),
            expected_pace: 6.5,
            pace_delta: 0.0,
            good: false,
            confidence: 1.0,
            factors: Vec::new(),
            tags: Vec::new(),
            is_false_positive: false,
            felt_harder: false,
        }
    }

    pub(crate) fn with_delta(mut self, delta: f64) -> Self {
        self.pace_delta = delta;
        self.pace = self.expected_pace - delta;
        self.good = delta > 0.0;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClusterMetrics {
    pub runs: usize,
    pub good_runs: usize,
    pub mean_pace_delta: f64,
    pub variance: f64,
    pub boundary_breaches: usize,
    pub flagged_runs: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub ratio: f64,
    pub lower: f64,
    pub upper: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeatureName {
    Temperature,
    Humidity,
    Hour,
    HeartRate,
    Pace,
}

impl FeatureName {
    pub const ALL: [FeatureName; 5] = [
        FeatureName::Temperature,
        FeatureName::Humidity,
        FeatureName::Hour,
        FeatureName::HeartRate,
        FeatureName::Pace,
    ];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisHint {
    pub feature: FeatureName,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GoodDayStats {
    pub last_date: Option<NaiveDate>,
    pub current_streak: u32,
    pub best_streak: u32,
    pub personal_best: f64,
}

/// Samlet resultat eksponert til UI. `None` = ikke beregnet ennå.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AnalysisOutput {
    pub sessions: Option<Vec<SessionPoint>>,
    pub trend: Option<Vec<TrendPoint>>,
    pub cluster_metrics: Option<BTreeMap<ClusterId, ClusterMetrics>>,
    pub axis_hints: Option<Vec<AxisHint>>,
    pub centroids: Option<Vec<[f64; 2]>>,
    pub stability: Option<BTreeMap<ClusterId, f64>>,
    pub insights: Option<Vec<String>>,
    pub narrative: Option<String>,
    pub good_day_stats: Option<GoodDayStats>,
    /// Siste fulle omberegning feilet (forrige gyldige resultat beholdes)
    #[serde(serialize_with = "serialize_error")]
    pub error: Option<crate::error::AnalysisError>,
}

fn serialize_error<S>(
    err: &Option<crate::error::AnalysisError>,
    s: S,
) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    match err {
        Some(e) => s.serialize_some(&e.to_string()),
        None => s.serialize_none(),
    }
}
