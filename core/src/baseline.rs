use std::cmp::Reverse;

use ordered_float::OrderedFloat;

use crate::features::{Conditions, REFERENCE_PACE};
use crate::types::{ExpectedPerformance, Factor, RawSession, WeatherCondition};

const TEMP_PER_DEG: f64 = 0.02;
const HUMIDITY_PER_PCT: f64 = 0.01;
const WIND_PER_MPH: f64 = 0.01;
const TIME_PER_HOUR: f64 = 0.03;
const HR_PER_BPM: f64 = 0.015;
const REFERENCE_HOUR: f64 = 8.0;
const REFERENCE_HR: f64 = 140.0;

/// Tillegg (min/mi) per værtilstand. Ukjent/manglende → 0.
pub fn condition_adjustment(c: Option<WeatherCondition>) -> f64 {
    match c {
        Some(WeatherCondition::Clear) => -0.05,
        Some(WeatherCondition::Cloudy) => 0.02,
        Some(WeatherCondition::Fog) => 0.05,
        Some(WeatherCondition::Drizzle) => 0.07,
        Some(WeatherCondition::Rain) => 0.10,
        Some(WeatherCondition::Snow) => 0.15,
        Some(WeatherCondition::Storm) => 0.20,
        Some(WeatherCondition::Unknown) | None => 0.0,
    }
}

/// Legg til faktor hvis justeringen ikke er null. Label velges etter fortegn.
fn push_factor(out: &mut Vec<Factor>, adj: f64, helped: &str, hurt: &str) {
    if adj == 0.0 {
        return;
    }
    let label = if adj < 0.0 { helped } else { hurt };
    out.push(Factor { label: label.to_string(), impact: -adj });
}

/// Forventet tempo ut fra forholdene (referanse 6.5 min/mi + additive justeringer).
pub fn compute_expected(s: &RawSession) -> ExpectedPerformance {
    let c = Conditions::of(s);

    let temperature_adj = (c.temperature - 55.0) * TEMP_PER_DEG;
    let humidity_adj = (c.humidity - 50.0) * HUMIDITY_PER_PCT;
    let wind_adj = c.wind * WIND_PER_MPH;
    let condition = s.weather.condition;
    let condition_adj = condition_adjustment(condition);
    let time_adj = (c.hour as f64 - REFERENCE_HOUR).abs() * TIME_PER_HOUR;
    let hr_adj = (c.heart_rate - REFERENCE_HR) * HR_PER_BPM;

    let mut factors = Vec::new();
    push_factor(&mut factors, temperature_adj, "Cool temps", "Heat");
    push_factor(&mut factors, humidity_adj, "Low humidity", "Humidity");
    push_factor(&mut factors, wind_adj, "Tailwind", "Headwind");
    if condition_adj != 0.0 {
        let hurt = format!("{} conditions", condition.unwrap_or(WeatherCondition::Unknown));
        push_factor(&mut factors, condition_adj, "Clear skies", &hurt);
    }
    // timeAdj >= 0, kan aldri hjelpe
    push_factor(&mut factors, time_adj, "Off-peak hour", "Off-peak hour");
    push_factor(&mut factors, hr_adj, "Stable HR", "High HR");

    // Størst effekt først; sort_by er stabil ved like verdier
    factors.sort_by_key(|f| Reverse(OrderedFloat(f.impact.abs())));

    let expected_pace = REFERENCE_PACE
        + temperature_adj
        + humidity_adj
        + wind_adj
        + condition_adj
        + time_adj
        + hr_adj;

    ExpectedPerformance { expected_pace, factors }
}

/// paceDelta = expected − actual (positiv = bedre enn baseline)
pub fn pace_delta(expected_pace: f64, actual_pace: f64) -> f64 {
    expected_pace - actual_pace
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SessionWeather;
    use chrono::{DateTime, NaiveDate};

    fn session(weather: SessionWeather, start: &str, hr: f64) -> RawSession {
        RawSession {
            id: 1,
            pace: Some(6.0),
            duration: Some(30.0),
            heart_rate: Some(hr),
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            start: Some(DateTime::parse_from_rfc3339(start).unwrap()),
            lat: Some(0.0),
            lon: Some(0.0),
            weather,
        }
    }

    #[test]
    fn reference_conditions_give_reference_pace() {
        let w = SessionWeather {
            temperature: Some(55.0),
            humidity: Some(50.0),
            wind: Some(0.0),
            condition: None,
        };
        let out = compute_expected(&session(w, "2024-01-01T08:00:00Z", 140.0));
        assert_eq!(out.expected_pace, 6.5);
        assert!(out.factors.is_empty(), "faktorer: {:?}", out.factors);
    }

    #[test]
    fn tailwind_and_stable_hr_are_reported() {
        let w = SessionWeather {
            temperature: Some(50.0),
            humidity: Some(40.0),
            wind: Some(-5.0),
            condition: Some(WeatherCondition::Clear),
        };
        let out = compute_expected(&session(w, "2024-01-01T08:00:00Z", 130.0));
        let labels: Vec<&str> = out.factors.iter().map(|f| f.label.as_str()).collect();
        assert!(labels.contains(&"Tailwind"));
        assert!(labels.contains(&"Stable HR"));
        assert!(labels.contains(&"Cool temps"));
        assert!(labels.contains(&"Clear skies"));
        assert!(out.factors.iter().all(|f| f.impact > 0.0));
    }

    #[test]
    fn storm_evening_heat_is_slower() {
        let w = SessionWeather {
            temperature: Some(85.0),
            humidity: Some(80.0),
            wind: Some(10.0),
            condition: Some(WeatherCondition::Storm),
        };
        let out = compute_expected(&session(w, "2024-07-01T20:00:00Z", 160.0));
        // 0.6 + 0.3 + 0.1 + 0.2 + 0.36 + 0.3
        assert!((out.expected_pace - (6.5 + 1.86)).abs() < 1e-9);
        assert_eq!(out.factors[0].label, "Heat");
        assert!(out.factors.iter().any(|f| f.label == "Storm conditions"));
        assert!(out.factors.iter().all(|f| f.impact < 0.0));
    }

    #[test]
    fn unknown_condition_adds_nothing() {
        assert_eq!(condition_adjustment(Some(WeatherCondition::Unknown)), 0.0);
        assert_eq!(condition_adjustment(None), 0.0);
    }
}
