use crate::stats::RoundTo;
use crate::types::{present, RawSession};

/// Andel tilstedeværende kjernefelt: pace, duration, heartRate, timestamp, lat, lon.
pub fn completeness(s: &RawSession) -> f64 {
    let present_count = [
        present(s.pace).is_some(),
        present(s.duration).is_some(),
        present(s.heart_rate).is_some(),
        s.start.is_some(),
        present(s.lat).is_some(),
        present(s.lon).is_some(),
    ]
    .iter()
    .filter(|p| **p)
    .count();
    present_count as f64 / 6.0
}

/// Andel tilstedeværende værfelt: temperature, humidity, wind.
pub fn weather_accuracy(s: &RawSession) -> f64 {
    let w = &s.weather;
    let present_count = [w.temperature, w.humidity, w.wind]
        .into_iter()
        .filter(|v| present(*v).is_some())
        .count();
    present_count as f64 / 3.0
}

/// confidence = round(0.5·completeness + 0.5·weatherAccuracy, 2), alltid i [0, 1]
pub fn confidence_score(s: &RawSession) -> f64 {
    (0.5 * completeness(s) + 0.5 * weather_accuracy(s)).round_to(2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SessionWeather;
    use chrono::{DateTime, NaiveDate};

    fn bare(id: u64) -> RawSession {
        RawSession {
            id,
            pace: None,
            duration: None,
            heart_rate: None,
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            start: None,
            lat: None,
            lon: None,
            weather: SessionWeather::default(),
        }
    }

    #[test]
    fn complete_session_scores_one() {
        let mut s = bare(1);
        s.pace = Some(6.2);
        s.duration = Some(40.0);
        s.heart_rate = Some(150.0);
        s.start = Some(DateTime::parse_from_rfc3339("2024-01-01T06:00:00Z").unwrap());
        s.lat = Some(59.9);
        s.lon = Some(10.7);
        s.weather = SessionWeather {
            temperature: Some(40.0),
            humidity: Some(70.0),
            wind: Some(3.0),
            condition: None,
        };
        assert_eq!(confidence_score(&s), 1.0);
    }

    #[test]
    fn empty_session_scores_zero() {
        assert_eq!(confidence_score(&bare(2)), 0.0);
    }

    #[test]
    fn partial_session_is_rounded() {
        let mut s = bare(3);
        s.pace = Some(6.0);
        s.weather.temperature = Some(60.0);
        s.weather.wind = Some(f64::NAN);
        // 0.5·(1/6) + 0.5·(1/3) = 0.25
        assert_eq!(confidence_score(&s), 0.25);
        s.duration = Some(30.0);
        // 0.5·(2/6) + 0.5·(1/3) = 0.3333 → 0.33
        assert_eq!(confidence_score(&s), 0.33);
    }
}
