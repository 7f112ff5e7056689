use models::record::RecordError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("database error: {0}")]
    Db(String),
    #[error("model error: {0}")]
    Model(#[from] models::errors::ModelError),
    #[error("unsupported file: {0}")]
    UnsupportedFile(String),
    #[error("unreadable file: {0}")]
    UnreadableFile(String),
    #[error("row {row}: {source}")]
    ImportRow {
        row: usize,
        #[source]
        source: RecordError,
    },
    #[error("export error: {0}")]
    Export(String),
}

impl ServiceError {
    /// True for errors caused by the caller's input rather than the store.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ServiceError::Validation(_)
                | ServiceError::UnsupportedFile(_)
                | ServiceError::UnreadableFile(_)
                | ServiceError::ImportRow { .. }
        )
    }
}

impl From<RecordError> for ServiceError {
    fn from(e: RecordError) -> Self { Self::Validation(e.to_string()) }
}

impl From<sea_orm::DbErr> for ServiceError {
    fn from(e: sea_orm::DbErr) -> Self { Self::Db(e.to_string()) }
}
