use thiserror::Error;

/// The one failure kind surfaced by every operation.
///
/// Network failures and platform-reported failures are not told apart: the
/// description carries whatever diagnostic the failing path composed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{description}")]
pub struct ApiError {
    pub description: String,
}

impl ApiError {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
