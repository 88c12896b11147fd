use std::io;

use thiserror::Error;

use crate::utils;

/// Which phase of a transaction failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactErrorKind {
    /// The pipe stayed busy for the whole retry budget.
    ConnectExhausted,
    /// The pipe could not be opened for a reason other than being busy.
    ConnectRejected,
    /// The read failed or the server closed the pipe without sending anything.
    ReadFailed,
    /// The write failed or did not take the whole message.
    WriteFailed,
    /// The caller passed something unusable.
    InvalidArgument,
    /// No I/O driver could be started, so nothing was attempted.
    Unavailable,
}

impl TransactErrorKind {
    /// Phase tag that prefixes every error message of this kind.
    pub fn phase(self) -> &'static str {
        match self {
            Self::ConnectExhausted | Self::ConnectRejected => "connect",
            Self::ReadFailed => "read",
            Self::WriteFailed => "write",
            Self::InvalidArgument => "invalid argument",
            Self::Unavailable => "setup",
        }
    }
}

#[derive(Error, Debug)]
pub enum TransactError {
    #[error("connect: pipe {target} still busy after {attempts} attempts: {source}")]
    ConnectExhausted {
        target: String,
        attempts: u32,
        #[source]
        source: io::Error,
    },

    #[error("connect: cannot open pipe {target}: {source}")]
    ConnectRejected {
        target: String,
        #[source]
        source: io::Error,
    },

    #[error("read: {0}")]
    ReadFailed(#[source] io::Error),

    #[error("write: {0}")]
    WriteFailed(#[source] io::Error),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("setup: cannot start the I/O driver: {0}")]
    Unavailable(#[source] io::Error),
}

impl TransactError {
    pub fn kind(&self) -> TransactErrorKind {
        match self {
            Self::ConnectExhausted { .. } => TransactErrorKind::ConnectExhausted,
            Self::ConnectRejected { .. } => TransactErrorKind::ConnectRejected,
            Self::ReadFailed(_) => TransactErrorKind::ReadFailed,
            Self::WriteFailed(_) => TransactErrorKind::WriteFailed,
            Self::InvalidArgument(_) => TransactErrorKind::InvalidArgument,
            Self::Unavailable(_) => TransactErrorKind::Unavailable,
        }
    }

    /// Native OS error code captured where the failure happened. Never 0.
    pub fn code(&self) -> u32 {
        match self {
            Self::ConnectExhausted { source, .. } | Self::ConnectRejected { source, .. } => {
                utils::native_code(source)
            }
            Self::ReadFailed(source) | Self::WriteFailed(source) | Self::Unavailable(source) => {
                utils::native_code(source)
            }
            Self::InvalidArgument(_) => utils::INVALID_PARAMETER,
        }
    }
}

/// Configuration that cannot be parsed or would make every transaction fail.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl From<ConfigError> for TransactError {
    fn from(err: ConfigError) -> Self {
        TransactError::InvalidArgument(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, TransactError>;
