use thiserror::Error;

/// Error taxonomy for the pipeline.
///
/// Every external-service failure is caught at the boundary of the component
/// that made the call and converted into one of these variants. Only
/// `Configuration` is allowed to halt startup; the composer and orchestrator
/// additionally degrade their own variants into displayable answer text so
/// interactive front ends always receive something renderable.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("indexing failed: {0}")]
    Indexing(String),
    #[error("retrieval failed: {0}")]
    Retrieval(String),
    #[error("composition failed: {0}")]
    Composer(String),
    #[error("tool `{name}` failed: {message}")]
    ToolExecution { name: String, message: String },
    #[error("provider error: {0}")]
    Provider(String),
}

impl PipelineError {
    pub fn provider<E: std::fmt::Display>(err: E) -> Self {
        PipelineError::Provider(err.to_string())
    }

    pub fn tool<E: std::fmt::Display>(name: &str, err: E) -> Self {
        PipelineError::ToolExecution {
            name: name.to_string(),
            message: err.to_string(),
        }
    }
}
