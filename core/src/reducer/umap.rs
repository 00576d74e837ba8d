use ordered_float::OrderedFloat;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::config::UmapParams;
use crate::features::FeatureVector;
use crate::stats::{euclidean, sq_dist};

const SPREAD: f64 = 1.0;
const GRAD_CLIP: f64 = 4.0;
const INIT_RANGE: f64 = 10.0;

/// Tilpass a, b slik at 1/(1 + a·d^(2b)) følger min_dist-kurven (grovt rutenett).
pub fn fit_ab(min_dist: f64) -> (f64, f64) {
    let xs: Vec<f64> = (0..300).map(|i| i as f64 * 3.0 * SPREAD / 299.0).collect();
    let target: Vec<f64> = xs
        .iter()
        .map(|&x| if x < min_dist { 1.0 } else { (-(x - min_dist) / SPREAD).exp() })
        .collect();

    let mut best = (1.577, 0.895);
    let mut best_err = f64::INFINITY;
    for ai in 1..=100 {
        let a = ai as f64 * 0.05;
        for bi in 30..=200 {
            let b = bi as f64 * 0.01;
            let err: f64 = xs
                .iter()
                .zip(target.iter())
                .map(|(&x, &t)| (1.0 / (1.0 + a * x.powf(2.0 * b)) - t).powi(2))
                .sum();
            if err < best_err {
                best_err = err;
                best = (a, b);
            }
        }
    }
    best
}

/// Vektet, symmetrisk kNN-graf (fuzzy union) som kantliste.
fn fuzzy_graph(data: &[FeatureVector], n_neighbors: usize) -> Vec<(usize, usize, f64)> {
    let n = data.len();
    let k = n_neighbors.min(n - 1).max(1);
    let target = (k as f64).log2().max(1e-3);

    let mut weights = vec![0.0f64; n * n];
    for i in 0..n {
        let mut nbrs: Vec<(usize, f64)> = (0..n)
            .filter(|&j| j != i)
            .map(|j| (j, euclidean(&data[i], &data[j])))
            .collect();
        nbrs.sort_by_key(|nb| OrderedFloat(nb.1));
        nbrs.truncate(k);

        let rho = nbrs.first().map(|nb| nb.1).unwrap_or(0.0);
        let mut lo = 0.0f64;
        let mut hi = f64::INFINITY;
        let mut sigma = 1.0f64;
        for _ in 0..64 {
            let s: f64 = nbrs.iter().map(|&(_, d)| (-(d - rho).max(0.0) / sigma).exp()).sum();
            if (s - target).abs() < 1e-5 {
                break;
            }
            if s > target {
                hi = sigma;
                sigma = (lo + hi) / 2.0;
            } else {
                lo = sigma;
                sigma = if hi.is_finite() { (lo + hi) / 2.0 } else { sigma * 2.0 };
            }
        }
        let sigma = sigma.max(1e-6);
        for &(j, d) in &nbrs {
            weights[i * n + j] = (-(d - rho).max(0.0) / sigma).exp();
        }
    }

    let mut edges = Vec::new();
    for i in 0..n {
        for j in (i + 1)..n {
            let a = weights[i * n + j];
            let b = weights[j * n + i];
            let w = a + b - a * b;
            if w > 0.0 {
                edges.push((i, j, w));
            }
        }
    }
    edges
}

#[inline]
fn clip(v: f64) -> f64 {
    v.clamp(-GRAD_CLIP, GRAD_CLIP)
}

/// UMAP-variant: kNN-graf + SGD med negativ sampling. Uskalert utdata.
pub fn umap(data: &[FeatureVector], params: &UmapParams, seed: u64) -> Vec<[f64; 2]> {
    let n = data.len();
    let edges = fuzzy_graph(data, params.n_neighbors);
    let (a, b) = fit_ab(params.min_dist);
    let max_w = edges.iter().map(|e| e.2).fold(0.0f64, f64::max).max(1e-12);

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut y: Vec<[f64; 2]> = (0..n)
        .map(|_| {
            [
                rng.gen_range(-INIT_RANGE..INIT_RANGE),
                rng.gen_range(-INIT_RANGE..INIT_RANGE),
            ]
        })
        .collect();

    let epochs = params.epochs.max(1);
    for epoch in 0..epochs {
        let alpha = params.learning_rate * (1.0 - epoch as f64 / epochs as f64);
        for &(i, j, w) in &edges {
            // Kanter samples proporsjonalt med vekt
            if rng.gen::<f64>() > w / max_w {
                continue;
            }

            let d2 = sq_dist(&y[i], &y[j]);
            if d2 > 0.0 {
                let coeff = -2.0 * a * b * d2.powf(b - 1.0) / (1.0 + a * d2.powf(b));
                for d in 0..2 {
                    let g = clip(coeff * (y[i][d] - y[j][d])) * alpha;
                    y[i][d] += g;
                    y[j][d] -= g;
                }
            }

            for _ in 0..params.negative_samples {
                let k = rng.gen_range(0..n);
                if k == i {
                    continue;
                }
                let d2 = sq_dist(&y[i], &y[k]);
                let coeff = 2.0 * b / ((0.001 + d2) * (1.0 + a * d2.powf(b)));
                for d in 0..2 {
                    y[i][d] += clip(coeff * (y[i][d] - y[k][d])) * alpha;
                }
            }
        }
    }
    y
}
