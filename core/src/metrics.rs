use std::cmp::Reverse;
use std::collections::BTreeMap;

use ordered_float::OrderedFloat;

use crate::stats::{mean, variance};
use crate::types::{ClusterId, ClusterMetrics, SessionPoint};

/// Avvik større enn så mange standardavvik regnes som grensebrudd.
const BREACH_SIGMAS: f64 = 2.0;
const STEADY_THRESHOLD: f64 = 0.7;

/// "Cluster A" … "Cluster Z" for id 0–25; større id-er vises som tall ("Cluster 26").
pub fn cluster_name(id: ClusterId) -> String {
    match u8::try_from(id) {
        Ok(n) if n < 26 => format!("Cluster {}", (b'A' + n) as char),
        _ => format!("Cluster {id}"),
    }
}

fn group_by_cluster(points: &[SessionPoint]) -> BTreeMap<ClusterId, Vec<&SessionPoint>> {
    let mut out: BTreeMap<ClusterId, Vec<&SessionPoint>> = BTreeMap::new();
    for p in points {
        out.entry(p.cluster).or_default().push(p);
    }
    out
}

/// Per klynge: gode økter, snitt/varians av paceDelta, grensebrudd og flaggede økter.
pub fn cluster_metrics(points: &[SessionPoint]) -> BTreeMap<ClusterId, ClusterMetrics> {
    group_by_cluster(points)
        .into_iter()
        .map(|(cluster, members)| {
            let deltas: Vec<f64> = members.iter().map(|p| p.pace_delta).collect();
            let m = mean(&deltas);
            let var = variance(&deltas);
            let sd = var.sqrt();
            let metrics = ClusterMetrics {
                runs: members.len(),
                good_runs: members.iter().filter(|p| p.good).count(),
                mean_pace_delta: m,
                variance: var,
                boundary_breaches: deltas
                    .iter()
                    .filter(|d| (*d - m).abs() > BREACH_SIGMAS * sd)
                    .count(),
                flagged_runs: members.iter().filter(|p| p.felt_harder).count(),
            };
            (cluster, metrics)
        })
        .collect()
}

/// Første klynge med størst verdi (likhet → første i iterasjonsrekkefølge).
fn argmax_by<F>(stats: &BTreeMap<ClusterId, ClusterMetrics>, key: F) -> Option<ClusterId>
where
    F: Fn(&ClusterMetrics) -> f64,
{
    let mut best: Option<(ClusterId, f64)> = None;
    for (id, m) in stats {
        let v = key(m);
        if best.map_or(true, |(_, b)| v > b) {
            best = Some((*id, v));
        }
    }
    best.map(|(id, _)| id)
}

/// Opptil tre setninger: flest gode økter, høyest varians, flest grensebrudd.
pub fn cluster_insights(stats: &BTreeMap<ClusterId, ClusterMetrics>) -> Vec<String> {
    let mut out = Vec::new();
    if let Some(id) = argmax_by(stats, |m| m.good_runs as f64) {
        out.push(format!("{} yields most good runs.", cluster_name(id)));
    }
    if let Some(id) = argmax_by(stats, |m| m.variance) {
        out.push(format!("{} shows highest variance.", cluster_name(id)));
    }
    if let Some(id) = argmax_by(stats, |m| m.boundary_breaches as f64) {
        out.push(format!("{} has most boundary breaches.", cluster_name(id)));
    }
    out
}

/// Stabilitet per klynge: rullerende sentroider (siste `window` økter etter
/// starttid), variansen rundt deres snitt, score = 1 / (1 + varians).
pub fn cluster_stability(points: &[SessionPoint], window: usize) -> BTreeMap<ClusterId, f64> {
    let window = window.max(1);
    group_by_cluster(points)
        .into_iter()
        .map(|(cluster, mut members)| {
            members.sort_by_key(|p| (p.start, p.date));
            let centroids: Vec<[f64; 2]> = (0..members.len())
                .map(|i| {
                    let subset = &members[(i + 1).saturating_sub(window)..=i];
                    let n = subset.len() as f64;
                    let (sx, sy) = subset.iter().fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
                    [sx / n, sy / n]
                })
                .collect();
            let n = centroids.len() as f64;
            let (mx, my) = centroids.iter().fold((0.0, 0.0), |(sx, sy), c| (sx + c[0], sy + c[1]));
            let (mx, my) = (mx / n, my / n);
            let var = centroids
                .iter()
                .map(|c| (c[0] - mx).powi(2) + (c[1] - my).powi(2))
                .sum::<f64>()
                / n;
            (cluster, 1.0 / (1.0 + var))
        })
        .collect()
}

/// "You drifted from {mest stabil} {Steady|High Δ} to {minst stabil} {…}".
/// Krever minst to klynger.
pub fn drift_narrative(
    stability: &BTreeMap<ClusterId, f64>,
    names: &BTreeMap<ClusterId, String>,
) -> Option<String> {
    if stability.len() < 2 {
        return None;
    }
    let mut sorted: Vec<(ClusterId, f64)> = stability.iter().map(|(k, v)| (*k, *v)).collect();
    sorted.sort_by_key(|e| Reverse(OrderedFloat(e.1)));
    let first = sorted.first()?;
    let last = sorted.last()?;
    let label = |s: f64| if s > STEADY_THRESHOLD { "Steady" } else { "High Δ" };
    let name = |id: ClusterId| names.get(&id).cloned().unwrap_or_else(|| cluster_name(id));
    Some(format!(
        "You drifted from {} {} to {} {}",
        name(first.0),
        label(first.1),
        name(last.0),
        label(last.1)
    ))
}
