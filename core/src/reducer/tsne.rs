use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::config::TsneParams;
use crate::features::FeatureVector;
use crate::stats::sq_dist;

const MOMENTUM_SWITCH_ITER: usize = 250;
const EXAGGERATION_ITERS: usize = 100;
const MIN_GAIN: f64 = 0.01;
const P_FLOOR: f64 = 1e-12;

/// Eksakt t-SNE (O(n²) per iterasjon). Ingen skalering av utdata.
pub fn tsne(data: &[FeatureVector], params: &TsneParams, seed: u64) -> Vec<[f64; 2]> {
    let n = data.len();
    let p = joint_probabilities(data, params.perplexity);

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut y: Vec<[f64; 2]> = (0..n)
        .map(|_| [rng.gen_range(-1e-2..1e-2), rng.gen_range(-1e-2..1e-2)])
        .collect();
    let mut velocity = vec![[0.0f64; 2]; n];
    let mut gains = vec![[1.0f64; 2]; n];
    let mut num = vec![0.0f64; n * n];
    let mut grad = vec![[0.0f64; 2]; n];

    for iter in 0..params.iterations {
        let exaggeration = if iter < EXAGGERATION_ITERS { params.early_exaggeration } else { 1.0 };
        let momentum = if iter < MOMENTUM_SWITCH_ITER { 0.5 } else { 0.8 };

        // Student-t kjerne (1 + d²)⁻¹
        let mut sum_num = 0.0;
        for i in 0..n {
            for j in (i + 1)..n {
                let q = 1.0 / (1.0 + sq_dist(&y[i], &y[j]));
                num[i * n + j] = q;
                num[j * n + i] = q;
                sum_num += 2.0 * q;
            }
        }
        let sum_num = sum_num.max(P_FLOOR);

        for i in 0..n {
            let mut g = [0.0; 2];
            for j in 0..n {
                if i == j {
                    continue;
                }
                let q_ij = (num[i * n + j] / sum_num).max(P_FLOOR);
                let mult = (exaggeration * p[i * n + j] - q_ij) * num[i * n + j];
                g[0] += 4.0 * mult * (y[i][0] - y[j][0]);
                g[1] += 4.0 * mult * (y[i][1] - y[j][1]);
            }
            grad[i] = g;
        }

        for i in 0..n {
            for d in 0..2 {
                let same_sign = (grad[i][d] > 0.0) == (velocity[i][d] > 0.0);
                gains[i][d] = if same_sign {
                    (gains[i][d] * 0.8).max(MIN_GAIN)
                } else {
                    gains[i][d] + 0.2
                };
                velocity[i][d] = momentum * velocity[i][d]
                    - params.learning_rate * gains[i][d] * grad[i][d];
                y[i][d] += velocity[i][d];
            }
        }

        // Sentrer rundt origo
        let (cx, cy) = y.iter().fold((0.0, 0.0), |(sx, sy), p| (sx + p[0], sy + p[1]));
        let (cx, cy) = (cx / n as f64, cy / n as f64);
        for p in y.iter_mut() {
            p[0] -= cx;
            p[1] -= cy;
        }
    }

    y
}

/// Symmetrisk P-matrise (rad-major, n×n) med binærsøk på presisjon per punkt.
fn joint_probabilities(data: &[FeatureVector], perplexity: f64) -> Vec<f64> {
    let n = data.len();
    // Perpleksitet kan ikke overstige antall naboer
    let perplexity = perplexity.min((n - 1) as f64 / 3.0).max(1.0);
    let target_entropy = perplexity.ln();

    let mut dist = vec![0.0f64; n * n];
    for i in 0..n {
        for j in (i + 1)..n {
            let d = sq_dist(&data[i], &data[j]);
            dist[i * n + j] = d;
            dist[j * n + i] = d;
        }
    }

    let mut cond = vec![0.0f64; n * n];
    let mut row = vec![0.0f64; n];
    for i in 0..n {
        let mut beta = 1.0f64;
        let mut beta_lo = f64::NEG_INFINITY;
        let mut beta_hi = f64::INFINITY;

        for _ in 0..64 {
            let mut sum = 0.0;
            for j in 0..n {
                row[j] = if i == j { 0.0 } else { (-dist[i * n + j] * beta).exp() };
                sum += row[j];
            }
            let sum = sum.max(P_FLOOR);
            let mut h = 0.0;
            for j in 0..n {
                if i != j {
                    h += beta * dist[i * n + j] * row[j];
                }
            }
            let entropy = sum.ln() + h / sum;
            for v in row.iter_mut() {
                *v /= sum;
            }

            let diff = entropy - target_entropy;
            if diff.abs() < 1e-5 {
                break;
            }
            if diff > 0.0 {
                beta_lo = beta;
                beta = if beta_hi.is_finite() { (beta + beta_hi) / 2.0 } else { beta * 2.0 };
            } else {
                beta_hi = beta;
                beta = if beta_lo.is_finite() { (beta + beta_lo) / 2.0 } else { beta / 2.0 };
            }
        }
        cond[i * n..(i + 1) * n].copy_from_slice(&row);
    }

    let mut p = vec![0.0f64; n * n];
    let denom = 2.0 * n as f64;
    for i in 0..n {
        for j in 0..n {
            if i != j {
                p[i * n + j] = ((cond[i * n + j] + cond[j * n + i]) / denom).max(P_FLOOR);
            }
        }
    }
    p
}
