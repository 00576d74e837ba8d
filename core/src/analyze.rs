use std::collections::BTreeMap;

use crate::baseline::{compute_expected, pace_delta};
use crate::config::AnalysisConfig;
use crate::confidence::confidence_score;
use crate::descriptor::{assign_descriptors, DescriptorOutcome};
use crate::error::{AnalysisError, Result};
use crate::features::{feature_matrix, Conditions};
use crate::kmeans::{session_weight, weighted_kmeans};
use crate::metrics::{cluster_insights, cluster_metrics, cluster_stability, drift_narrative};
use crate::pca::axis_hints;
use crate::reducer::{reduce, MIN_SESSIONS};
use crate::store::ClusterLabelStore;
use crate::trend::{good_day_stats, good_day_trend};
use crate::types::{AnalysisOutput, AxisHint, RawSession, SessionId, SessionMeta, SessionPoint};

/// Embedding + klynger + per-økt-scoring, før etiketter er satt.
#[derive(Debug, Clone)]
pub struct ClusteredRun {
    pub points: Vec<SessionPoint>,
    pub centroids: Vec<[f64; 2]>,
    pub axis_hints: Vec<AxisHint>,
}

fn meta_for(metadata: &BTreeMap<SessionId, SessionMeta>, id: SessionId) -> SessionMeta {
    metadata.get(&id).cloned().unwrap_or_default()
}

/// Trinn 1 av full omberegning: features → embedding → vektet k-means.
/// Feiler lukket ved for få økter (ingen klemming av k).
pub fn cluster_sessions(
    sessions: &[RawSession],
    metadata: &BTreeMap<SessionId, SessionMeta>,
    cfg: &AnalysisConfig,
) -> Result<ClusteredRun> {
    cfg.validate()?;
    if sessions.len() < MIN_SESSIONS {
        return Err(AnalysisError::degenerate("embedding", sessions.len(), MIN_SESSIONS));
    }
    if sessions.len() < cfg.k {
        return Err(AnalysisError::degenerate("clustering", sessions.len(), cfg.k));
    }

    let features = feature_matrix(sessions);
    let embedding = reduce(&features, cfg)?;
    let hints = axis_hints(&features, cfg.pca_iterations);

    let metas: Vec<SessionMeta> = sessions.iter().map(|s| meta_for(metadata, s.id)).collect();
    let weights: Vec<f64> = metas
        .iter()
        .map(|m| session_weight(m.felt_harder, cfg.felt_harder_weight))
        .collect();
    let clusters = weighted_kmeans(&embedding, &weights, cfg.k, cfg.kmeans_iterations)?;

    let points = sessions
        .iter()
        .zip(metas.iter())
        .enumerate()
        .map(|(i, (s, meta))| {
            let cond = Conditions::of(s);
            let expected = compute_expected(s);
            let delta = pace_delta(expected.expected_pace, cond.pace);
            let mut p = SessionPoint {
                id: s.id,
                date: s.date,
                start: s.start,
                start_hour: cond.hour,
                temperature: cond.temperature,
                pace: cond.pace,
                x: embedding[i][0],
                y: embedding[i][1],
                cluster: clusters.assignments[i],
                distance_to_centroid: clusters.distances[i],
                descriptor: String::new(),
                expected_pace: expected.expected_pace,
                pace_delta: delta,
                good: delta > 0.0,
                confidence: confidence_score(s),
                factors: expected.factors,
                tags: Vec::new(),
                is_false_positive: false,
                felt_harder: false,
            };
            p.apply_meta(meta);
            p
        })
        .collect();

    Ok(ClusteredRun {
        points,
        centroids: clusters.centroids,
        axis_hints: hints,
    })
}

/// Aggregater som avhenger av metadata: metrikk, trend, innsikt, stabilitet, rekker.
pub fn derive_aggregates(points: &[SessionPoint], cfg: &AnalysisConfig, out: &mut AnalysisOutput) {
    let metrics = cluster_metrics(points);
    let stability = cluster_stability(points, cfg.stability_window);
    let mut names = BTreeMap::new();
    for p in points.iter().filter(|p| !p.descriptor.is_empty()) {
        names.entry(p.cluster).or_insert_with(|| p.descriptor.clone());
    }

    out.insights = Some(cluster_insights(&metrics));
    out.narrative = drift_narrative(&stability, &names);
    out.cluster_metrics = Some(metrics);
    out.stability = Some(stability);
    out.trend = Some(good_day_trend(points, cfg.trend_window_days));
    out.good_day_stats = Some(good_day_stats(points));
}

/// Trinn 3: sett etiketter og bygg komplett resultat.
pub fn finish(run: ClusteredRun, labels: &DescriptorOutcome, cfg: &AnalysisConfig) -> AnalysisOutput {
    let ClusteredRun { mut points, centroids, axis_hints } = run;
    for p in points.iter_mut() {
        if let Some(label) = labels.labels.get(&p.cluster) {
            p.descriptor = label.clone();
        }
    }

    let mut out = AnalysisOutput {
        axis_hints: Some(axis_hints),
        centroids: Some(centroids),
        ..Default::default()
    };
    derive_aggregates(&points, cfg, &mut out);
    out.sessions = Some(points);
    out
}

/// Lett omberegning: ny metadata flettes inn, embedding og klynger røres ikke.
pub fn remerge_metadata(
    previous: &AnalysisOutput,
    metadata: &BTreeMap<SessionId, SessionMeta>,
    cfg: &AnalysisConfig,
) -> Option<AnalysisOutput> {
    let mut points = previous.sessions.clone()?;
    for p in points.iter_mut() {
        p.apply_meta(&meta_for(metadata, p.id));
    }
    let mut out = previous.clone();
    derive_aggregates(&points, cfg, &mut out);
    out.sessions = Some(points);
    Some(out)
}

/// Hele kjeden i ett kall (ingen serialisering av etikett-lageret).
pub fn analyze_sessions(
    sessions: &[RawSession],
    metadata: &BTreeMap<SessionId, SessionMeta>,
    labels: &dyn ClusterLabelStore,
    cfg: &AnalysisConfig,
) -> Result<AnalysisOutput> {
    let run = cluster_sessions(sessions, metadata, cfg)?;
    let outcome = assign_descriptors(&run.points, labels, cfg.felt_harder_weight)?;
    Ok(finish(run, &outcome, cfg))
}
