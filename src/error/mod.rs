use thiserror::Error;

/// Application-level errors
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Flow error: {0}")]
    Flow(#[from] FlowError),

    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Storage layer errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store connection failed: {message}")]
    Connection { message: String },

    #[error("Catalog corrupted: {message}")]
    Corruption { message: String },

    #[error("Question not found: {question_id}")]
    QuestionNotFound { question_id: String },

    #[error("SQLx error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Flow coordination errors
#[derive(Debug, Error)]
pub enum FlowError {
    #[error("Answer is empty after trimming whitespace")]
    EmptyAnswer,

    #[error("No active question to answer")]
    NoActiveQuestion,

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;

/// Result type alias for storage operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type alias for flow operations
pub type FlowResult<T> = Result<T, FlowError>;
