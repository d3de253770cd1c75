use thiserror::Error;

/// Failure talking to the commerce platform collaborator.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SourceError {
    #[error("catalog source unavailable: {0}")]
    Unavailable(String),
    #[error("catalog source returned status {status}")]
    UpstreamStatus { status: u16 },
    #[error("catalog payload could not be decoded: {0}")]
    Decode(String),
}

/// Failure in a key-value cache tier.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("storage quota exceeded: need {needed} bytes, {available} available")]
    QuotaExceeded { needed: usize, available: usize },
    #[error("storage backend failure: {0}")]
    Backend(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("configuration failure: {0}")]
    Configuration(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl ApplicationError {
    /// Stable machine-readable class for command payloads.
    pub fn error_class(&self) -> &'static str {
        match self {
            Self::Source(_) => "catalog_source",
            Self::Store(_) => "cache_store",
            Self::Configuration(_) => "config_validation",
            Self::InvalidInput(_) => "invalid_input",
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Configuration(_) => 2,
            Self::InvalidInput(_) => 3,
            Self::Source(_) => 4,
            Self::Store(_) => 5,
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Source(_) => "The catalog is temporarily unavailable. Please retry shortly.",
            Self::Store(_) => "The cache store could not be updated.",
            Self::Configuration(_) => "The service configuration is invalid.",
            Self::InvalidInput(_) => {
                "The request could not be processed. Check inputs and try again."
            }
        }
    }
}
