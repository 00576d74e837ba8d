use std::collections::BTreeMap;

use crate::error::Result;
use crate::kmeans::session_weight;
use crate::stats::weighted_mean;
use crate::store::ClusterLabelStore;
use crate::types::{ClusterId, SessionPoint};

pub fn temperature_bucket(temp_f: f64) -> &'static str {
    if temp_f < 45.0 {
        "Cold"
    } else if temp_f < 60.0 {
        "Cool"
    } else if temp_f < 75.0 {
        "Warm"
    } else {
        "Hot"
    }
}

pub fn hour_bucket(hour: f64) -> &'static str {
    if hour < 6.0 {
        "Early"
    } else if hour < 12.0 {
        "Morning"
    } else if hour < 18.0 {
        "Afternoon"
    } else {
        "Evening"
    }
}

pub fn delta_bucket(delta: f64) -> &'static str {
    if delta > 0.3 {
        "High Δ"
    } else if delta < -0.3 {
        "Low Δ"
    } else {
        "Mid Δ"
    }
}

/// "{Temp} {Hour} {Delta}", f.eks. "Cool Morning Mid Δ"
pub fn describe(avg_temp: f64, avg_hour: f64, avg_delta: f64) -> String {
    format!(
        "{} {} {}",
        temperature_bucket(avg_temp),
        hour_bucket(avg_hour),
        delta_bucket(avg_delta)
    )
}

/// Beregnet (ikke lagret) etikett for én klynge, vektet med feltHarder-vekt.
pub fn compute_label(members: &[&SessionPoint], felt_harder_weight: f64) -> String {
    let weights: Vec<f64> = members
        .iter()
        .map(|p| session_weight(p.felt_harder, felt_harder_weight))
        .collect();
    let temps: Vec<f64> = members.iter().map(|p| p.temperature).collect();
    let hours: Vec<f64> = members.iter().map(|p| p.start_hour as f64).collect();
    let deltas: Vec<f64> = members.iter().map(|p| p.pace_delta).collect();
    describe(
        weighted_mean(&temps, &weights),
        weighted_mean(&hours, &weights),
        weighted_mean(&deltas, &weights),
    )
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DescriptorOutcome {
    pub labels: BTreeMap<ClusterId, String>,
    /// Etiketter hentet uendret fra lageret
    pub reused: usize,
    /// Nye etiketter skrevet til lageret
    pub written: usize,
}

/// Etikett per klynge-id i kjøringen. Første skriving vinner: finnes det en
/// lagret etikett brukes den uendret, ellers beregnes og lagres en ny.
///
/// Kalleren må serialisere kall mot samme lager (les-så-skriv).
pub fn assign_descriptors(
    points: &[SessionPoint],
    store: &dyn ClusterLabelStore,
    felt_harder_weight: f64,
) -> Result<DescriptorOutcome> {
    let mut members: BTreeMap<ClusterId, Vec<&SessionPoint>> = BTreeMap::new();
    for p in points {
        members.entry(p.cluster).or_default().push(p);
    }

    let mut out = DescriptorOutcome::default();
    for (cluster, pts) in members {
        let label = match store.get(cluster)? {
            Some(stored) => {
                out.reused += 1;
                stored
            }
            None => {
                let fresh = compute_label(&pts, felt_harder_weight);
                store.set(cluster, &fresh)?;
                log::info!("descriptor: klynge {cluster} fikk etiketten \"{fresh}\"");
                out.written += 1;
                fresh
            }
        };
        out.labels.insert(cluster, label);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buckets_follow_thresholds() {
        assert_eq!(temperature_bucket(44.9), "Cold");
        assert_eq!(temperature_bucket(45.0), "Cool");
        assert_eq!(temperature_bucket(74.9), "Warm");
        assert_eq!(temperature_bucket(75.0), "Hot");
        assert_eq!(hour_bucket(5.9), "Early");
        assert_eq!(hour_bucket(6.0), "Morning");
        assert_eq!(hour_bucket(12.0), "Afternoon");
        assert_eq!(hour_bucket(18.0), "Evening");
        assert_eq!(delta_bucket(0.31), "High Δ");
        assert_eq!(delta_bucket(0.3), "Mid Δ");
        assert_eq!(delta_bucket(-0.3), "Mid Δ");
        assert_eq!(delta_bucket(-0.31), "Low Δ");
    }

    fn member(id: u64, temp: f64, felt_harder: bool) -> SessionPoint {
        let mut p = SessionPoint::for_test(id, "2024-01-01", 0);
        p.temperature = temp;
        p.felt_harder = felt_harder;
        p
    }

    #[test]
    fn felt_harder_weight_can_flip_a_bucket() {
        let (a, b, c) = (member(1, 40.0, false), member(2, 40.0, false), member(3, 54.0, true));
        let members = [&a, &b, &c];
        // 134 / 3 ≈ 44.7 → Cold; (80 + 1.5·54) / 3.5 = 46 → Cool
        assert_eq!(compute_label(&members, 1.0), "Cold Morning Mid Δ");
        assert_eq!(compute_label(&members, 1.5), "Cool Morning Mid Δ");
    }

    #[test]
    fn stored_labels_win_over_fresh_ones() {
        use crate::store::InMemoryLabelStore;

        let store = InMemoryLabelStore::new();
        store.set(0, "Kept Label").unwrap();
        let mut other = member(2, 90.0, false);
        other.cluster = 1;
        let points = vec![member(1, 40.0, false), other];

        let out = assign_descriptors(&points, &store, 1.5).unwrap();
        assert_eq!(out.labels[&0], "Kept Label");
        assert_eq!(out.labels[&1], "Hot Morning Mid Δ");
        assert_eq!((out.reused, out.written), (1, 1));
        assert_eq!(store.get(1).unwrap().as_deref(), Some("Hot Morning Mid Δ"));
    }

    #[test]
    fn describe_concatenates_buckets() {
        assert_eq!(describe(55.0, 8.0, 0.0), "Cool Morning Mid Δ");
        assert_eq!(describe(80.0, 19.0, -1.0), "Hot Evening Low Δ");
    }
}
