use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};

/// Hvilken 2D-projeksjon som brukes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReducerKind {
    #[default]
    Tsne,
    Umap,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TsneParams {
    pub perplexity: f64,
    pub early_exaggeration: f64,
    pub iterations: usize,
    pub learning_rate: f64,
}

impl Default for TsneParams {
    fn default() -> Self {
        Self {
            perplexity: 30.0,
            early_exaggeration: 4.0,
            iterations: 500,
            learning_rate: 100.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UmapParams {
    pub n_neighbors: usize,
    pub min_dist: f64,
    pub epochs: usize,
    pub learning_rate: f64,
    pub negative_samples: usize,
}

impl Default for UmapParams {
    fn default() -> Self {
        Self {
            n_neighbors: 15,
            min_dist: 0.1,
            epochs: 200,
            learning_rate: 1.0,
            negative_samples: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    #[serde(alias = "method")]
    pub reducer: ReducerKind,
    pub k: usize,
    pub kmeans_iterations: usize,
    pub trend_window_days: usize,
    pub felt_harder_weight: f64,
    pub seed: u64,
    pub tsne: TsneParams,
    pub umap: UmapParams,
    pub pca_iterations: usize,
    pub stability_window: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            reducer: ReducerKind::Tsne,
            k: 3,
            kmeans_iterations: 10,
            trend_window_days: 7,
            felt_harder_weight: 1.5,
            seed: 42,
            tsne: TsneParams::default(),
            umap: UmapParams::default(),
            pca_iterations: 50,
            stability_window: 5,
        }
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<()> {
        if self.k == 0 {
            return Err(AnalysisError::Config("k must be at least 1".into()));
        }
        if self.trend_window_days == 0 {
            return Err(AnalysisError::Config("trend_window_days must be at least 1".into()));
        }
        if self.stability_window == 0 {
            return Err(AnalysisError::Config("stability_window must be at least 1".into()));
        }
        if !self.felt_harder_weight.is_finite() || self.felt_harder_weight <= 0.0 {
            return Err(AnalysisError::Config(format!(
                "felt_harder_weight must be finite and > 0, got {}",
                self.felt_harder_weight
            )));
        }
        if !(self.tsne.perplexity > 0.0) || !(self.tsne.learning_rate > 0.0) {
            return Err(AnalysisError::Config("tsne perplexity/learning_rate must be > 0".into()));
        }
        if self.umap.n_neighbors < 2 {
            return Err(AnalysisError::Config("umap n_neighbors must be at least 2".into()));
        }
        if !(self.umap.min_dist >= 0.0) || !(self.umap.learning_rate > 0.0) {
            return Err(AnalysisError::Config("umap min_dist must be >= 0 and learning_rate > 0".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let cfg = AnalysisConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.k, 3);
        assert_eq!(cfg.trend_window_days, 7);
        assert_eq!(cfg.reducer, ReducerKind::Tsne);
    }

    #[test]
    fn zero_k_is_rejected() {
        let cfg = AnalysisConfig { k: 0, ..Default::default() };
        assert!(matches!(cfg.validate(), Err(AnalysisError::Config(_))));
    }

    #[test]
    fn partial_json_fills_defaults() {
        let cfg: AnalysisConfig = serde_json::from_str(r#"{"method":"umap","k":4}"#).unwrap();
        assert_eq!(cfg.reducer, ReducerKind::Umap);
        assert_eq!(cfg.k, 4);
        assert_eq!(cfg.kmeans_iterations, 10);
        assert_eq!(cfg.umap.n_neighbors, 15);
    }
}
