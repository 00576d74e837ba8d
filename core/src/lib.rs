pub mod analyze;
pub mod baseline;
pub mod cli;
pub mod confidence;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod features;
pub mod kmeans;
pub mod metrics;
pub mod orchestrator;
pub mod pca;
pub mod reducer;
pub mod source;
pub mod source_http;
pub mod stats;
pub mod storage;
pub mod store;
pub mod telemetry;
pub mod trend;
pub mod types;

#[cfg(feature = "python")]
mod py;

use std::collections::BTreeMap;

use anyhow::Context;

pub use analyze::analyze_sessions;
pub use config::{AnalysisConfig, ReducerKind, TsneParams, UmapParams};
pub use error::{AnalysisError, Result};
pub use orchestrator::{Orchestrator, SessionEvent};
pub use source::{JsonFileSessionSource, SessionSource, StaticSessionSource};
pub use source_http::HttpSessionSource;
pub use storage::{JsonFileLabelStore, JsonFileMetadataStore};
pub use store::{ClusterLabelStore, InMemoryLabelStore, InMemoryMetadataStore, MetadataStore};
pub use telemetry::Telemetry;
pub use types::{AnalysisOutput, RawSession, SessionId, SessionMeta, SessionPoint};

/// JSON inn → full analyse med minnelagre → JSON ut.
///
/// `metadata_json` er et objekt `{ "<id>": {tags, isFalsePositive, feltHarder} }`,
/// `config_json` et (delvis) `AnalysisConfig`-objekt.
pub fn analyze_sessions_json(
    sessions_json: &str,
    metadata_json: Option<&str>,
    config_json: Option<&str>,
) -> anyhow::Result<String> {
    let sessions = source::parse_sessions_json(sessions_json).context("sessions")?;

    let metadata: BTreeMap<SessionId, SessionMeta> = match metadata_json {
        Some(j) => {
            let mut de = serde_json::Deserializer::from_str(j);
            serde_path_to_error::deserialize(&mut de)
                .map_err(|e| AnalysisError::Parse(format!("metadata parse at {}: {}", e.path(), e)))?
        }
        None => BTreeMap::new(),
    };

    let cfg: AnalysisConfig = match config_json {
        Some(j) => {
            let mut de = serde_json::Deserializer::from_str(j);
            serde_path_to_error::deserialize(&mut de)
                .map_err(|e| AnalysisError::Config(format!("config parse at {}: {}", e.path(), e)))?
        }
        None => AnalysisConfig::default(),
    };

    let labels = InMemoryLabelStore::new();
    let output = analyze_sessions(&sessions, &metadata, &labels, &cfg)
        .with_context(|| format!("analyse av {} økter", sessions.len()))?;
    Ok(serde_json::to_string(&output)?)
}
