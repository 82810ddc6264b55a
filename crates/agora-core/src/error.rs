use agora_crypto::CryptoError;
use chrono::{DateTime, Utc};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, BoardError>;

/// Everything that can go wrong while editing, sharing or opening a board.
///
/// `ExpiredLink` and `Crypto` are deliberately separate: the first means
/// "ask for a fresh link", the second "re-enter the passphrase".
#[derive(Error, Debug)]
pub enum BoardError {
    #[error("invalid input: {0}")]
    Validation(String),

    #[error("cannot decrypt: {0}")]
    Crypto(#[from] CryptoError),

    #[error("link expired at {expires_at}; ask for a new link")]
    ExpiredLink { expires_at: DateTime<Utc> },

    #[error(
        "board too large to share: link would be {length} characters (limit {limit}); \
         shorten agenda content"
    )]
    SizeLimit { length: usize, limit: usize },

    #[error("board not found: {0}")]
    NotFound(String),

    #[error("passphrase prompt cancelled")]
    Cancelled,

    #[error("storage error: {0}")]
    Storage(#[from] anyhow::Error),

    #[error("background crypto task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Coarse classification used by callers that only care about the kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Crypto,
    ExpiredLink,
    SizeLimit,
    NotFound,
    Cancelled,
    Internal,
}

impl BoardError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Crypto(_) => ErrorKind::Crypto,
            Self::ExpiredLink { .. } => ErrorKind::ExpiredLink,
            Self::SizeLimit { .. } => ErrorKind::SizeLimit,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::Storage(_) | Self::Task(_) => ErrorKind::Internal,
        }
    }
}
