use thiserror::Error;

/// Errors produced by the pipeline and its components.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Low-level HTTP transport failure (connection refused, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// JSON encoding or decoding failed at the serde level.
    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP error with status code and response body.
    ///
    /// Returned by [`Backend`](crate::backend::Backend) implementations when
    /// the provider answers with a non-success status code.
    #[error("HTTP {status}: {body}")]
    HttpError {
        /// HTTP status code (e.g. 401, 429, 500).
        status: u16,
        /// Response body text.
        body: String,
    },

    /// A prompt template references a placeholder with no value.
    #[error("Prompt template is missing a value for '{{{name}}}'")]
    MissingVariable { name: String },

    /// A pipeline stage failed with a descriptive message.
    #[error("Stage '{stage}' failed: {message}")]
    StageFailed { stage: String, message: String },

    /// Invalid configuration detected at build time.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Required runtime configuration (credentials) is absent.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_variable_message() {
        let err = PipelineError::MissingVariable {
            name: "product".into(),
        };
        assert_eq!(
            err.to_string(),
            "Prompt template is missing a value for '{product}'"
        );
    }

    #[test]
    fn test_stage_failed_message() {
        let err = PipelineError::StageFailed {
            stage: "search".into(),
            message: "HTTP 401: invalid key".into(),
        };
        assert_eq!(err.to_string(), "Stage 'search' failed: HTTP 401: invalid key");
    }
}
