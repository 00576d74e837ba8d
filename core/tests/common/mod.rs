// Felles testhjelpere: leser økt-fixture fra CSV.
#![allow(dead_code)]

use runmap_core::RawSession;
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
struct Row {
    id: u64,
    date: String,
    start: Option<String>,
    pace: Option<f64>,
    duration: Option<f64>,
    heart_rate: Option<f64>,
    lat: Option<f64>,
    lon: Option<f64>,
    temperature: Option<f64>,
    humidity: Option<f64>,
    wind: Option<f64>,
    condition: Option<String>,
}

/// 24 økter over tre vær-/tidsgrupper, noen felt mangler med vilje.
pub fn fixture_sessions() -> Vec<RawSession> {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/data/sessions.csv");
    let mut rdr = csv::Reader::from_path(path).expect("fant ikke sessions.csv");
    rdr.deserialize::<Row>()
        .map(|r| to_session(r.expect("ugyldig rad i sessions.csv")))
        .collect()
}

fn to_session(r: Row) -> RawSession {
    let v = json!({
        "id": r.id,
        "date": r.date,
        "startTimestamp": r.start,
        "pace": r.pace,
        "duration": r.duration,
        "heartRate": r.heart_rate,
        "lat": r.lat,
        "lon": r.lon,
        "weather": {
            "temperature": r.temperature,
            "humidity": r.humidity,
            "wind": r.wind,
            "condition": r.condition,
        }
    });
    serde_json::from_value(v).expect("rad → RawSession")
}

/// Økt under referanseforhold (forventet pace 6.5) med gitt pace og dato.
pub fn reference_session(id: u64, date: &str, pace: f64) -> RawSession {
    serde_json::from_value(json!({ "id": id, "date": date, "pace": pace }))
        .expect("referanseøkt")
}
