use student_core::{ApiError, FormError};

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Form(#[from] FormError),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("no screen at {0}")]
    UnknownRoute(String),

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}
