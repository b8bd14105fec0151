#[derive(Debug, thiserror::Error)]
pub enum MessageStoreError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("validation: {0}")]
    Validation(String),
    #[error("storage: {0}")]
    Storage(String),
}

impl From<tokio_rusqlite::Error> for MessageStoreError {
    fn from(err: tokio_rusqlite::Error) -> Self {
        MessageStoreError::Storage(err.to_string())
    }
}
