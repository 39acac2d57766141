use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid configuration: {reason}")]
    Config { reason: String },

    /// The generator produced a record that breaks an output invariant.
    /// This is a generator defect, never a data condition.
    #[error("Invariant '{kind}' violated: {detail}")]
    InvariantViolation { kind: &'static str, detail: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SimError {
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config { reason: reason.into() }
    }

    pub fn invariant(kind: &'static str, detail: impl Into<String>) -> Self {
        Self::InvariantViolation { kind, detail: detail.into() }
    }
}

pub type SimResult<T> = Result<T, SimError>;
