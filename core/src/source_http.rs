// core/src/source_http.rs
use std::time::Duration;

use ureq::Agent;

use crate::error::{AnalysisError, Result};
use crate::source::{parse_sessions_json, SessionSource};
use crate::types::RawSession;

/// HTTP-kilde – enkel blocking-versjon (ureq). GET mot `url` som svarer med
/// en JSON-array av økter.
pub struct HttpSessionSource {
    agent: Agent,
    url: String,
}

impl HttpSessionSource {
    pub fn new(url: impl Into<String>) -> Self {
        // En enkel agent; ureq bruker rustls når "tls" er aktivert
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(10))
            .build();
        Self { agent, url: url.into() }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl SessionSource for HttpSessionSource {
    fn fetch_sessions(&self) -> Result<Vec<RawSession>> {
        let resp = self
            .agent
            .get(&self.url)
            .call()
            .map_err(|e| AnalysisError::Fetch(format!("GET {}: {}", self.url, e)))?;
        let body = resp
            .into_string()
            .map_err(|e| AnalysisError::Fetch(format!("read body {}: {}", self.url, e)))?;
        let sessions = parse_sessions_json(&body).map_err(|e| AnalysisError::Fetch(e.to_string()))?;
        log::debug!("[HttpSessionSource] {} => {} økter", self.url, sessions.len());
        Ok(sessions)
    }
}
