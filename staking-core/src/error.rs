use crate::dto::{ChainFamily, TransactionStatus};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, StakingError>;

#[derive(Debug, Error)]
pub enum StakingError {
    #[error("network not found: {0}")]
    NetworkNotFound(String),

    #[error("no encoder registered for chain family {0}")]
    UnsupportedChainFamily(ChainFamily),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("broadcast failed: {0}")]
    Broadcast(String),

    #[error("status fetch failed: {0}")]
    StatusFetch(String),

    #[error("transaction {id} is already {from}, cannot move to {to}")]
    InvalidTransition {
        id: String,
        from: TransactionStatus,
        to: TransactionStatus,
    },

    #[error("transaction {id} is already recorded as {status}")]
    AlreadyRecorded {
        id: String,
        status: TransactionStatus,
    },

    #[error("config error: {0}")]
    Config(#[from] figment::Error),

    #[error("http client error: {0}")]
    HttpClient(#[from] reqwest::Error),
}

impl StakingError {
    pub fn validation(message: impl Into<String>) -> Self {
        StakingError::Validation(message.into())
    }

    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        StakingError::NotFound {
            kind,
            id: id.into(),
        }
    }
}

/// Failures reported by the transaction service collaborator.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("bad status {status}: {body}")]
    BadStatus { status: u16, body: String },

    #[error("rejected by transaction service: {0}")]
    Rejected(String),

    #[error("{0}")]
    Other(String),
}
