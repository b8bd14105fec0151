#[derive(Debug, thiserror::Error)]
pub enum ProjectsError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("validation: {0}")]
    Validation(String),
    #[error("storage: {0}")]
    Storage(String),
}

impl From<adjutant_core::json_store::JsonFileError> for ProjectsError {
    fn from(err: adjutant_core::json_store::JsonFileError) -> Self {
        ProjectsError::Storage(err.to_string())
    }
}

impl From<std::io::Error> for ProjectsError {
    fn from(err: std::io::Error) -> Self {
        ProjectsError::Storage(err.to_string())
    }
}
