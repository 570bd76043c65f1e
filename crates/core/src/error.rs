#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Missing required resource property: {0}")]
    MissingProperty(&'static str),

    #[error("Validation failed: {0}")]
    Validation(String),
}
