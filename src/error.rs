/// Failure taxonomy for one analysis attempt
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const GENERIC_SERVER_MESSAGE: &str = "Error analyzing product. Please try again.";
pub const INVALID_URL_MESSAGE: &str = "Please provide a valid Amazon URL";

#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum AnalyzeError {
    /// Empty or ineligible URL; no request was sent
    #[error("{0}")]
    Validation(String),
    /// Network unreachable, timeout, aborted fetch
    #[error("{0}")]
    Transport(String),
    /// Non-2xx response
    #[error("{0}")]
    Server(String),
    /// 2xx response whose body is not an analysis
    #[error("{0}")]
    Parse(String),
}

impl AnalyzeError {
    /// Shown inline next to the URL input rather than in the result area
    pub fn is_validation(&self) -> bool {
        matches!(self, AnalyzeError::Validation(_))
    }

    pub fn message(&self) -> &str {
        match self {
            AnalyzeError::Validation(msg)
            | AnalyzeError::Transport(msg)
            | AnalyzeError::Server(msg)
            | AnalyzeError::Parse(msg) => msg,
        }
    }
}

impl From<reqwest::Error> for AnalyzeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            AnalyzeError::Parse(err.to_string())
        } else {
            AnalyzeError::Transport(err.to_string())
        }
    }
}
