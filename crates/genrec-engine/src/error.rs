use genrec_db::DbError;
use thiserror::Error;

use crate::validation::ValidationErrors;

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("Form is incomplete: {0}")]
    Invalid(ValidationErrors),

    #[error("Store read failed: {0}")]
    Fetch(#[from] DbError),

    #[error("A report is already being generated")]
    Busy,
}

impl From<ValidationErrors> for GenerateError {
    fn from(errors: ValidationErrors) -> Self {
        GenerateError::Invalid(errors)
    }
}

pub type Result<T> = std::result::Result<T, GenerateError>;
