use std::path::PathBuf;
use std::sync::Mutex;

use crate::error::{AnalysisError, Result};
use crate::types::RawSession;

/// Henter rå økter. Ingen retry her – det hører hjemme hos datakilden.
pub trait SessionSource: Send + Sync {
    fn fetch_sessions(&self) -> Result<Vec<RawSession>>;
}

/// Fast liste i minnet (tester, JSON-inngang). Kan byttes ut mellom kall.
#[derive(Debug, Default)]
pub struct StaticSessionSource {
    sessions: Mutex<Vec<RawSession>>,
}

impl StaticSessionSource {
    pub fn new(sessions: Vec<RawSession>) -> Self {
        Self { sessions: Mutex::new(sessions) }
    }

    pub fn replace(&self, sessions: Vec<RawSession>) -> Result<()> {
        let mut guard = self
            .sessions
            .lock()
            .map_err(|_| AnalysisError::Fetch("session source lock poisoned".into()))?;
        *guard = sessions;
        Ok(())
    }
}

impl SessionSource for StaticSessionSource {
    fn fetch_sessions(&self) -> Result<Vec<RawSession>> {
        self.sessions
            .lock()
            .map(|s| s.clone())
            .map_err(|_| AnalysisError::Fetch("session source lock poisoned".into()))
    }
}

/// Leser en JSON-array av økter fra disk ved hvert kall.
#[derive(Debug, Clone)]
pub struct JsonFileSessionSource {
    path: PathBuf,
}

impl JsonFileSessionSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SessionSource for JsonFileSessionSource {
    fn fetch_sessions(&self) -> Result<Vec<RawSession>> {
        let contents = std::fs::read_to_string(&self.path)
            .map_err(|e| AnalysisError::Fetch(format!("{}: {}", self.path.display(), e)))?;
        parse_sessions_json(&contents).map_err(|e| AnalysisError::Fetch(e.to_string()))
    }
}

/// Parse økter med sti til feilen (serde_path_to_error).
pub fn parse_sessions_json(json_in: &str) -> Result<Vec<RawSession>> {
    let mut de = serde_json::Deserializer::from_str(json_in);
    serde_path_to_error::deserialize(&mut de)
        .map_err(|e| AnalysisError::Parse(format!("sessions parse at {}: {}", e.path(), e)))
}
