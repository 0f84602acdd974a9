use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("File exceeds {limit_bytes} byte limit ({size_bytes} bytes)")]
    FileTooLarge { size_bytes: usize, limit_bytes: usize },

    #[error("Too many files ({count}, max {limit})")]
    TooManyFiles { count: usize, limit: usize },

    #[error("Too many keywords ({count}, max {limit})")]
    TooManyKeywords { count: usize, limit: usize },

    #[error("Invalid or corrupted document: {0}")]
    InvalidDocument(String),

    #[error("Dictionary is locked by another process (waited {0:?})")]
    LockTimeout(Duration),

    #[error("Could not save dictionary: {0}")]
    Persistence(String),

    #[error("No keywords provided and no anonymization options enabled")]
    NoWorkSpecified,

    #[error("Invalid keyword: {0}")]
    KeywordValidation(String),

    #[error("Invalid placeholder template: {0}")]
    InvalidTemplate(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Stable taxonomy name, safe to show when the message itself is not
    pub fn category(&self) -> &'static str {
        match self {
            Error::FileTooLarge { .. } => "FileTooLargeError",
            Error::TooManyFiles { .. } => "TooManyFilesError",
            Error::TooManyKeywords { .. } => "TooManyKeywordsError",
            Error::InvalidDocument(_) => "InvalidDocumentError",
            Error::LockTimeout(_) => "LockTimeoutError",
            Error::Persistence(_) => "PersistenceError",
            Error::NoWorkSpecified => "NoWorkSpecified",
            Error::KeywordValidation(_) => "KeywordValidationError",
            Error::InvalidTemplate(_) => "InvalidTemplateError",
            Error::Io(_) => "IoError",
            Error::Serialization(_) => "SerializationError",
            Error::Other(_) => "UnexpectedError",
        }
    }

    /// Whether retrying the same call later can succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::LockTimeout(_))
    }

    /// Validation failures are the caller's fault, not a system fault
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::FileTooLarge { .. }
                | Error::TooManyFiles { .. }
                | Error::TooManyKeywords { .. }
                | Error::NoWorkSpecified
                | Error::KeywordValidation(_)
                | Error::InvalidTemplate(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
