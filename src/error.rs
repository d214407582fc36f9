use thiserror::Error;

/// Fatal failures of the report pipeline.
///
/// Undefined metrics (division by zero) are not errors; they travel through the
/// report rows as `None`.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("format error: {message} (offending value: {value:?})")]
    Format { message: String, value: String },

    #[error("ambiguous join on {key:?}: {context}")]
    JoinAmbiguity { key: String, context: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PipelineError {
    pub fn format(message: impl Into<String>, value: impl ToString) -> Self {
        PipelineError::Format {
            message: message.into(),
            value: value.to_string(),
        }
    }

    pub fn ambiguity(key: impl Into<String>, context: impl Into<String>) -> Self {
        PipelineError::JoinAmbiguity {
            key: key.into(),
            context: context.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
