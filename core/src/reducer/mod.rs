//! 2D-projeksjon av feature-matrisen.
//!
//! To utskiftbare strategier (`ReducerKind`): t-SNE (nabo-embedding) og en
//! UMAP-variant (manifold-approksimasjon) der hver akse skaleres til [-1, 1].
//! Begge beholder radrekkefølgen og feiler ved færre enn 2 økter.

mod tsne;
mod umap;

use crate::config::{AnalysisConfig, ReducerKind};
use crate::error::{AnalysisError, Result};
use crate::features::{FeatureVector, FEATURE_DIM};

pub use tsne::tsne;
pub use umap::{fit_ab, umap};

pub type Embedding = Vec<[f64; 2]>;

pub const MIN_SESSIONS: usize = 2;

/// Kjør valgt reduksjon. Samme antall rader inn og ut, samme rekkefølge.
pub fn reduce(features: &[FeatureVector], cfg: &AnalysisConfig) -> Result<Embedding> {
    if features.len() < MIN_SESSIONS {
        return Err(AnalysisError::degenerate("embedding", features.len(), MIN_SESSIONS));
    }
    let data = standardize(features);
    let out = match cfg.reducer {
        ReducerKind::Tsne => tsne(&data, &cfg.tsne, cfg.seed),
        ReducerKind::Umap => rescale_axes(umap(&data, &cfg.umap, cfg.seed)),
    };
    log::debug!("reduce: {:?} → {} punkter", cfg.reducer, out.len());
    Ok(out)
}

/// z-score per kolonne; kolonner uten spredning blir 0.
pub fn standardize(features: &[FeatureVector]) -> Vec<FeatureVector> {
    let n = features.len().max(1) as f64;
    let mut mean = [0.0; FEATURE_DIM];
    for f in features {
        for d in 0..FEATURE_DIM {
            mean[d] += f[d] / n;
        }
    }
    let mut sd = [0.0; FEATURE_DIM];
    for f in features {
        for d in 0..FEATURE_DIM {
            sd[d] += (f[d] - mean[d]).powi(2) / n;
        }
    }
    for s in sd.iter_mut() {
        *s = s.sqrt();
    }
    features
        .iter()
        .map(|f| {
            let mut z = [0.0; FEATURE_DIM];
            for d in 0..FEATURE_DIM {
                z[d] = if sd[d] > 1e-12 { (f[d] - mean[d]) / sd[d] } else { 0.0 };
            }
            z
        })
        .collect()
}

/// Lineær skalering av hver akse til [-1, 1] med aksens egen min/maks.
pub fn rescale_axes(mut points: Embedding) -> Embedding {
    for axis in 0..2 {
        let (lo, hi) = points.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
            (lo.min(p[axis]), hi.max(p[axis]))
        });
        let span = hi - lo;
        for p in points.iter_mut() {
            p[axis] = if span > 1e-12 { 2.0 * (p[axis] - lo) / span - 1.0 } else { 0.0 };
        }
    }
    points
}
