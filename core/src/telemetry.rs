use prometheus::{Encoder, IntCounter, IntGauge, Registry, TextEncoder};

use crate::error::{AnalysisError, Result};

/// Tellere for orkestratoren, i eget register (ingen global tilstand).
#[derive(Clone)]
pub struct Telemetry {
    registry: Registry,
    pub recompute_total: IntCounter,
    pub recompute_failed_total: IntCounter,
    pub recompute_superseded_total: IntCounter,
    pub partial_recompute_total: IntCounter,
    pub label_store_hit_total: IntCounter,
    pub label_store_miss_total: IntCounter,
    pub sessions: IntGauge,
}

fn counter(registry: &Registry, name: &str, help: &str) -> Result<IntCounter> {
    let c = IntCounter::new(name, help).map_err(|e| AnalysisError::Config(e.to_string()))?;
    registry
        .register(Box::new(c.clone()))
        .map_err(|e| AnalysisError::Config(e.to_string()))?;
    Ok(c)
}

impl Telemetry {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();
        let sessions = IntGauge::new("runmap_sessions", "Sessions in the last successful recompute")
            .map_err(|e| AnalysisError::Config(e.to_string()))?;
        registry
            .register(Box::new(sessions.clone()))
            .map_err(|e| AnalysisError::Config(e.to_string()))?;

        Ok(Self {
            recompute_total: counter(&registry, "runmap_recompute_total", "Full recomputes started")?,
            recompute_failed_total: counter(&registry, "runmap_recompute_failed_total", "Full recomputes that failed")?,
            recompute_superseded_total: counter(
                &registry,
                "runmap_recompute_superseded_total",
                "Full recomputes discarded because a newer trigger arrived",
            )?,
            partial_recompute_total: counter(
                &registry,
                "runmap_partial_recompute_total",
                "Metadata-only recomputes applied",
            )?,
            label_store_hit_total: counter(&registry, "runmap_label_store_hit_total", "Cluster labels reused from the store")?,
            label_store_miss_total: counter(&registry, "runmap_label_store_miss_total", "Cluster labels computed and persisted")?,
            sessions,
            registry,
        })
    }

    /// Tekstformatet for scraping.
    pub fn gather_text(&self) -> Result<String> {
        let mut buf = Vec::new();
        TextEncoder::new()
            .encode(&self.registry.gather(), &mut buf)
            .map_err(|e| AnalysisError::Storage(e.to_string()))?;
        String::from_utf8(buf).map_err(|e| AnalysisError::Storage(e.to_string()))
    }
}
