use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum PlanError {
    #[error("invalid loan terms: {message}")]
    InvalidTerms { message: String },

    #[error("persistence failure: {message}")]
    Persistence { message: String },

    #[error("installment not found: {id}")]
    InstallmentNotFound { id: Uuid },
}

impl PlanError {
    pub fn invalid_terms(message: impl Into<String>) -> Self {
        PlanError::InvalidTerms {
            message: message.into(),
        }
    }

    pub fn persistence(message: impl Into<String>) -> Self {
        PlanError::Persistence {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PlanError>;
