//! Nøkkel/verdi-grensesnitt mot eksterne lagre: metadata per økt og
//! klyngeetiketter. Minneversjonene brukes i tester og JSON-inngangen;
//! filversjonene ligger i `storage`.

use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::error::{AnalysisError, Result};
use crate::types::{ClusterId, SessionId, SessionMeta, SessionMetaPatch};

pub trait MetadataStore: Send + Sync {
    /// Metadata for økten, eller tom standard når ingenting er lagret.
    fn get(&self, id: SessionId) -> Result<SessionMeta>;
    fn set(&self, id: SessionId, meta: SessionMeta) -> Result<()>;
    fn all(&self) -> Result<BTreeMap<SessionId, SessionMeta>>;

    /// Slå sammen en delvis oppdatering med eksisterende verdi.
    fn update(&self, id: SessionId, patch: &SessionMetaPatch) -> Result<SessionMeta> {
        let next = self.get(id)?.merged(patch);
        self.set(id, next.clone())?;
        Ok(next)
    }
}

pub trait ClusterLabelStore: Send + Sync {
    fn get(&self, id: ClusterId) -> Result<Option<String>>;
    fn set(&self, id: ClusterId, label: &str) -> Result<()>;
}

fn poisoned<T>(_: T) -> AnalysisError {
    AnalysisError::Storage("store lock poisoned".into())
}

#[derive(Debug, Default)]
pub struct InMemoryMetadataStore {
    inner: Mutex<BTreeMap<SessionId, SessionMeta>>,
}

impl InMemoryMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries(entries: BTreeMap<SessionId, SessionMeta>) -> Self {
        Self { inner: Mutex::new(entries) }
    }
}

impl MetadataStore for InMemoryMetadataStore {
    fn get(&self, id: SessionId) -> Result<SessionMeta> {
        let map = self.inner.lock().map_err(poisoned)?;
        Ok(map.get(&id).cloned().unwrap_or_default())
    }

    fn set(&self, id: SessionId, meta: SessionMeta) -> Result<()> {
        self.inner.lock().map_err(poisoned)?.insert(id, meta);
        Ok(())
    }

    fn all(&self) -> Result<BTreeMap<SessionId, SessionMeta>> {
        Ok(self.inner.lock().map_err(poisoned)?.clone())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryLabelStore {
    inner: Mutex<BTreeMap<ClusterId, String>>,
}

impl InMemoryLabelStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Result<BTreeMap<ClusterId, String>> {
        Ok(self.inner.lock().map_err(poisoned)?.clone())
    }
}

impl ClusterLabelStore for InMemoryLabelStore {
    fn get(&self, id: ClusterId) -> Result<Option<String>> {
        Ok(self.inner.lock().map_err(poisoned)?.get(&id).cloned())
    }

    fn set(&self, id: ClusterId, label: &str) -> Result<()> {
        self.inner.lock().map_err(poisoned)?.insert(id, label.to_string());
        Ok(())
    }
}
