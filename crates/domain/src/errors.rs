use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Invalid ARN {arn}: {reason}")]
    InvalidArn { arn: String, reason: String },

    #[error("Invalid column type {input:?}: {reason}")]
    InvalidColumnType { input: String, reason: String },

    #[error("Duplicate resource: {id}")]
    DuplicateResource { id: String },

    #[error("Protocol error: {message}")]
    Protocol { message: String },

    #[error("Response delivery failed: {message}")]
    Delivery { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}
