use thiserror::Error;

use crate::stages::Stage;

/// Failure at an external HTTP collaborator (search or generator).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ServiceError {
    #[error("request failed: {0}")]
    Http(String),

    #[error("service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("could not decode response: {0}")]
    Decode(String),

    #[error("missing credentials: {0}")]
    MissingCredentials(&'static str),
}

impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ServiceError::Decode(err.to_string())
        } else if err.is_timeout() {
            ServiceError::Http(format!("timeout: {err}"))
        } else {
            ServiceError::Http(err.to_string())
        }
    }
}

/// Why a stage's raw output could not be turned into a record.
/// All variants are recoverable: callers fall back to showing the raw text.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("no JSON object found in stage output")]
    NoJsonFound,

    #[error("malformed JSON in stage output: {0}")]
    MalformedJson(String),

    #[error("stage output was not text (got {0})")]
    UnexpectedShape(&'static str),
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error("topic cannot be empty")]
    InvalidTopic,

    #[error("search service error: {0}")]
    Search(#[source] ServiceError),

    #[error("{stage} stage generation failed: {source}")]
    Generation {
        stage: Stage,
        #[source]
        source: ServiceError,
    },

    #[error("run failed: {0}")]
    Internal(String),
}

pub type RunResult<T> = Result<T, RunError>;

#[test]
fn test_run_error_keeps_underlying_message() {
    let err = RunError::Search(ServiceError::Http("timeout".to_string()));
    assert!(err.to_string().contains("timeout"));

    let err = RunError::Generation {
        stage: Stage::Summarize,
        source: ServiceError::Status {
            status: 429,
            body: "quota".to_string(),
        },
    };
    assert_eq!(
        err.to_string(),
        "summarize stage generation failed: service returned 429: quota"
    );
}
