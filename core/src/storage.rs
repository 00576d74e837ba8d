use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::AnalysisConfig;
use crate::error::{AnalysisError, Result};
use crate::store::{ClusterLabelStore, MetadataStore};
use crate::types::{ClusterId, SessionId, SessionMeta};

/// Leser inn konfig fra disk (JSON).
/// Hvis filen ikke finnes, returneres default-konfig.
pub fn load_config(path: &str) -> Result<AnalysisConfig> {
    if Path::new(path).exists() {
        let contents = std::fs::read_to_string(path)?;
        let mut de = serde_json::Deserializer::from_str(&contents);
        let cfg: AnalysisConfig = serde_path_to_error::deserialize(&mut de)
            .map_err(|e| AnalysisError::Config(format!("{} at {}: {}", path, e.path(), e)))?;
        cfg.validate()?;
        log::info!("📂 Konfig lastet fra {} (reducer={:?}, k={})", path, cfg.reducer, cfg.k);
        Ok(cfg)
    } else {
        log::warn!("⚠️ Fant ikke konfig på {}, bruker default", path);
        Ok(AnalysisConfig::default())
    }
}

/// Lagrer konfig til disk som JSON (pretty-print).
pub fn save_config(cfg: &AnalysisConfig, path: &str) -> Result<()> {
    let json = serde_json::to_string_pretty(cfg)?;
    std::fs::write(path, json)?;
    log::info!("✅ Konfig lagret til {}", path);
    Ok(())
}

fn read_map<K, V>(path: &Path) -> Result<BTreeMap<K, V>>
where
    K: Ord + DeserializeOwned,
    V: DeserializeOwned,
{
    if !path.exists() {
        return Ok(BTreeMap::new());
    }
    let contents = std::fs::read_to_string(path)?;
    if contents.trim().is_empty() {
        return Ok(BTreeMap::new());
    }
    serde_json::from_str(&contents)
        .map_err(|e| AnalysisError::Storage(format!("{}: {}", path.display(), e)))
}

fn write_map<K, V>(path: &Path, map: &BTreeMap<K, V>) -> Result<()>
where
    K: Ord + Serialize,
    V: Serialize,
{
    let json = serde_json::to_string_pretty(map)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Klyngeetiketter i én JSON-fil (`{"0": "Cool Morning Mid Δ", ...}`).
#[derive(Debug)]
pub struct JsonFileLabelStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileLabelStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), lock: Mutex::new(()) }
    }
}

impl ClusterLabelStore for JsonFileLabelStore {
    fn get(&self, id: ClusterId) -> Result<Option<String>> {
        let _guard = self.lock.lock().map_err(|_| AnalysisError::Storage("label file lock poisoned".into()))?;
        let all: BTreeMap<ClusterId, String> = read_map(&self.path)?;
        Ok(all.get(&id).cloned())
    }

    fn set(&self, id: ClusterId, label: &str) -> Result<()> {
        let _guard = self.lock.lock().map_err(|_| AnalysisError::Storage("label file lock poisoned".into()))?;
        let mut all: BTreeMap<ClusterId, String> = read_map(&self.path)?;
        all.insert(id, label.to_string());
        write_map(&self.path, &all)
    }
}

/// Metadata per økt i én JSON-fil.
#[derive(Debug)]
pub struct JsonFileMetadataStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileMetadataStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), lock: Mutex::new(()) }
    }
}

impl MetadataStore for JsonFileMetadataStore {
    fn get(&self, id: SessionId) -> Result<SessionMeta> {
        Ok(self.all()?.remove(&id).unwrap_or_default())
    }

    fn set(&self, id: SessionId, meta: SessionMeta) -> Result<()> {
        let _guard = self.lock.lock().map_err(|_| AnalysisError::Storage("metadata file lock poisoned".into()))?;
        let mut all: BTreeMap<SessionId, SessionMeta> = read_map(&self.path)?;
        all.insert(id, meta);
        write_map(&self.path, &all)
    }

    fn all(&self) -> Result<BTreeMap<SessionId, SessionMeta>> {
        let _guard = self.lock.lock().map_err(|_| AnalysisError::Storage("metadata file lock poisoned".into()))?;
        read_map(&self.path)
    }
}
