use crate::features::{FeatureVector, FEATURE_DIM};
use crate::types::{AxisHint, FeatureName};

type Matrix = [[f64; FEATURE_DIM]; FEATURE_DIM];

/// Kovariansmatrise for midtstilt feature-matrise (deler på n−1).
pub fn covariance(features: &[FeatureVector]) -> Matrix {
    let n = features.len();
    let mut cov = [[0.0; FEATURE_DIM]; FEATURE_DIM];
    if n == 0 {
        return cov;
    }
    let mut mean = [0.0; FEATURE_DIM];
    for f in features {
        for d in 0..FEATURE_DIM {
            mean[d] += f[d] / n as f64;
        }
    }
    let denom = (n.saturating_sub(1)).max(1) as f64;
    for f in features {
        for a in 0..FEATURE_DIM {
            for b in 0..FEATURE_DIM {
                cov[a][b] += (f[a] - mean[a]) * (f[b] - mean[b]) / denom;
            }
        }
    }
    cov
}

fn mat_vec(m: &Matrix, v: &[f64; FEATURE_DIM]) -> [f64; FEATURE_DIM] {
    let mut out = [0.0; FEATURE_DIM];
    for (r, row) in m.iter().enumerate() {
        out[r] = row.iter().zip(v.iter()).map(|(a, b)| a * b).sum();
    }
    out
}

fn norm(v: &[f64; FEATURE_DIM]) -> f64 {
    v.iter().map(|x| x * x).sum::<f64>().sqrt()
}

/// Dominerende egenvektor og egenverdi via potensiterasjon.
/// Nullmatrise gir nullvektor og egenverdi 0.
pub fn power_iteration(m: &Matrix, iterations: usize) -> ([f64; FEATURE_DIM], f64) {
    let start = 1.0 / (FEATURE_DIM as f64).sqrt();
    let mut v = [start; FEATURE_DIM];
    for _ in 0..iterations {
        let w = mat_vec(m, &v);
        let len = norm(&w);
        if len < 1e-12 {
            return ([0.0; FEATURE_DIM], 0.0);
        }
        for d in 0..FEATURE_DIM {
            v[d] = w[d] / len;
        }
    }
    let mv = mat_vec(m, &v);
    let eigenvalue = v.iter().zip(mv.iter()).map(|(a, b)| a * b).sum();
    (v, eigenvalue)
}

/// Trekk fra λ·v·vᵀ slik at neste potensiterasjon finner komponent 2.
pub fn deflate(m: &Matrix, v: &[f64; FEATURE_DIM], eigenvalue: f64) -> Matrix {
    let mut out = *m;
    for a in 0..FEATURE_DIM {
        for b in 0..FEATURE_DIM {
            out[a][b] -= eigenvalue * v[a] * v[b];
        }
    }
    out
}

/// Ladning per feature på de to første hovedkomponentene, delt på største
/// absoluttverdi slik at alt ligger i [-1, 1].
pub fn axis_hints(features: &[FeatureVector], iterations: usize) -> Vec<AxisHint> {
    let cov = covariance(features);
    let (pc1, l1) = power_iteration(&cov, iterations);
    let (pc2, _) = power_iteration(&deflate(&cov, &pc1, l1), iterations);

    let max_abs = pc1
        .iter()
        .chain(pc2.iter())
        .fold(0.0f64, |m, v| m.max(v.abs()));
    let scale = if max_abs > 1e-12 { 1.0 / max_abs } else { 0.0 };

    FeatureName::ALL
        .iter()
        .enumerate()
        .map(|(i, &feature)| AxisHint {
            feature,
            x: pc1[i] * scale,
            y: pc2[i] * scale,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dominant_feature_gets_full_loading() {
        // Bare temperatur varierer mye; humidity litt
        let features: Vec<FeatureVector> = (0..10)
            .map(|i| {
                let t = i as f64;
                [40.0 + 5.0 * t, 50.0 + 0.5 * ((i % 3) as f64), 8.0, 140.0, 6.5]
            })
            .collect();
        let hints = axis_hints(&features, 50);
        assert_eq!(hints.len(), 5);
        assert_eq!(hints[0].feature, FeatureName::Temperature);
        assert!((hints[0].x.abs() - 1.0).abs() < 1e-3, "temp x = {}", hints[0].x);
        for h in &hints {
            assert!(h.x.abs() <= 1.0 + 1e-12 && h.y.abs() <= 1.0 + 1e-12);
        }
        // Konstante features har null ladning
        assert!(hints[2].x.abs() < 1e-9 && hints[2].y.abs() < 1e-9);
    }

    #[test]
    fn constant_matrix_gives_zero_hints() {
        let features = vec![[55.0, 50.0, 8.0, 140.0, 6.5]; 4];
        let hints = axis_hints(&features, 50);
        assert!(hints.iter().all(|h| h.x == 0.0 && h.y == 0.0));
    }

    #[test]
    fn second_component_is_orthogonal() {
        let features: Vec<FeatureVector> = (0..12)
            .map(|i| {
                let t = i as f64;
                [t * 3.0, (t * 1.7).sin() * 4.0, (i % 5) as f64, 130.0 + t, 6.0 + 0.1 * t]
            })
            .collect();
        let cov = covariance(&features);
        let (v1, l1) = power_iteration(&cov, 200);
        let (v2, _) = power_iteration(&deflate(&cov, &v1, l1), 200);
        let dot: f64 = v1.iter().zip(v2.iter()).map(|(a, b)| a * b).sum();
        assert!(dot.abs() < 1e-3, "v1·v2 = {dot}");
    }
}
