use thiserror::Error;

/// Feiltaksonomi for hele analysekjeden.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("failed to fetch sessions: {0}")]
    Fetch(String),
    #[error("degenerate input at {stage}: got {sessions} sessions, need at least {required}")]
    DegenerateInput {
        sessions: usize,
        required: usize,
        stage: &'static str,
    },
    #[error("storage error: {0}")]
    Storage(String),
    #[error("invalid config: {0}")]
    Config(String),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("recompute superseded (generation {generation})")]
    Superseded { generation: u64 },
}

impl AnalysisError {
    pub fn degenerate(stage: &'static str, sessions: usize, required: usize) -> Self {
        AnalysisError::DegenerateInput {
            sessions,
            required,
            stage,
        }
    }
}

impl From<serde_json::Error> for AnalysisError {
    fn from(e: serde_json::Error) -> Self {
        AnalysisError::Parse(e.to_string())
    }
}

impl From<std::io::Error> for AnalysisError {
    fn from(e: std::io::Error) -> Self {
        AnalysisError::Storage(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
