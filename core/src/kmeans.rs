use crate::error::{AnalysisError, Result};
use crate::stats::euclidean;
use crate::types::ClusterId;

#[derive(Debug, Clone, PartialEq)]
pub struct KMeansResult {
    pub assignments: Vec<ClusterId>,
    pub centroids: Vec<[f64; 2]>,
    /// Avstand fra hvert punkt til sin sentroide
    pub distances: Vec<f64>,
}

/// Punktvekt: 1.5 (konfigurerbar) for økter som føltes tyngre, ellers 1.0.
pub fn session_weight(felt_harder: bool, felt_harder_weight: f64) -> f64 {
    if felt_harder { felt_harder_weight } else { 1.0 }
}

fn nearest(p: &[f64; 2], centroids: &[[f64; 2]]) -> (ClusterId, f64) {
    let mut best = 0;
    let mut best_dist = f64::INFINITY;
    for (idx, c) in centroids.iter().enumerate() {
        let d = euclidean(p, c);
        if d < best_dist {
            best_dist = d;
            best = idx;
        }
    }
    (best, best_dist)
}

/// Vektet k-means i 2D.
///
/// Start: de k første punktene. Nøyaktig `iterations` runder (ingen konvergenssjekk).
/// Tom klynge beholder forrige sentroide. Feiler hvis punktene er færre enn k.
pub fn weighted_kmeans(
    points: &[[f64; 2]],
    weights: &[f64],
    k: usize,
    iterations: usize,
) -> Result<KMeansResult> {
    if k == 0 {
        return Err(AnalysisError::Config("k must be at least 1".into()));
    }
    if points.len() < k {
        return Err(AnalysisError::degenerate("clustering", points.len(), k));
    }
    if weights.len() != points.len() {
        return Err(AnalysisError::Config(format!(
            "weights length {} does not match points length {}",
            weights.len(),
            points.len()
        )));
    }

    let mut centroids: Vec<[f64; 2]> = points[..k].to_vec();
    let mut assignments = vec![0; points.len()];

    for _ in 0..iterations {
        // (a) tilordning
        for (i, p) in points.iter().enumerate() {
            assignments[i] = nearest(p, &centroids).0;
        }

        // (b) vektet snitt per klynge
        let mut sums = vec![[0.0f64; 2]; k];
        let mut wsum = vec![0.0f64; k];
        for (i, p) in points.iter().enumerate() {
            let a = assignments[i];
            sums[a][0] += p[0] * weights[i];
            sums[a][1] += p[1] * weights[i];
            wsum[a] += weights[i];
        }
        for c in 0..k {
            if wsum[c] > 0.0 {
                centroids[c] = [sums[c][0] / wsum[c], sums[c][1] / wsum[c]];
            }
        }
    }

    fill_empty_clusters(points, &mut assignments, &mut centroids);

    let distances = points
        .iter()
        .zip(assignments.iter())
        .map(|(p, &a)| euclidean(p, &centroids[a]))
        .collect();

    Ok(KMeansResult { assignments, centroids, distances })
}

/// Sørger for at id-ene dekker 0..k når n ≥ k: en tom klynge overtar punktet
/// lengst fra sin sentroide blant klynger med mer enn ett medlem.
fn fill_empty_clusters(
    points: &[[f64; 2]],
    assignments: &mut [ClusterId],
    centroids: &mut [[f64; 2]],
) {
    let k = centroids.len();
    let mut counts = vec![0usize; k];
    for &a in assignments.iter() {
        counts[a] += 1;
    }

    for empty in 0..k {
        if counts[empty] > 0 {
            continue;
        }
        let mut donor: Option<(usize, f64)> = None;
        for (i, p) in points.iter().enumerate() {
            let a = assignments[i];
            if counts[a] < 2 {
                continue;
            }
            let d = euclidean(p, &centroids[a]);
            if donor.map_or(true, |(_, best)| d > best) {
                donor = Some((i, d));
            }
        }
        if let Some((i, _)) = donor {
            log::debug!("kmeans: klynge {empty} tom etter siste runde, flytter punkt {i}");
            counts[assignments[i]] -= 1;
            assignments[i] = empty;
            counts[empty] = 1;
            centroids[empty] = points[i];
        }
    }
}
