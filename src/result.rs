use std::borrow::Cow;

use crate::error::{Result, TransactError, TransactErrorKind};

/// What a finished transaction hands back to the caller.
///
/// `success`, a zero `error_code`, an empty `error_message` and a `None`
/// `error_kind` always go together.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionResult {
    pub success: bool,
    /// Bytes taken by the read phase. Empty unless the read succeeded.
    pub received: Vec<u8>,
    pub error_kind: Option<TransactErrorKind>,
    pub error_message: String,
    pub error_code: u32,
    /// Connect attempts made, including the one that succeeded.
    pub attempts: u32,
    pub peer_pid: Option<u32>,
}

impl TransactionResult {
    pub(crate) fn from_parts(progress: Progress, outcome: Result<()>) -> Self {
        let Progress {
            received,
            attempts,
            peer_pid,
        } = progress;

        match outcome {
            Ok(()) => Self {
                success: true,
                received,
                error_kind: None,
                error_message: String::new(),
                error_code: 0,
                attempts,
                peer_pid,
            },
            Err(err) => Self::failure(err, received, attempts, peer_pid),
        }
    }

    fn failure(
        err: TransactError,
        received: Vec<u8>,
        attempts: u32,
        peer_pid: Option<u32>,
    ) -> Self {
        Self {
            success: false,
            received,
            error_kind: Some(err.kind()),
            error_message: err.to_string(),
            error_code: err.code(),
            attempts,
            peer_pid,
        }
    }

    /// Received bytes as text, replacing invalid UTF-8.
    pub fn received_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.received)
    }
}

impl From<TransactError> for TransactionResult {
    fn from(err: TransactError) -> Self {
        Self::failure(err, Vec::new(), 0, None)
    }
}

/// A completed exchange, for callers that prefer `Result`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchange {
    pub received: Vec<u8>,
    pub attempts: u32,
    pub peer_pid: Option<u32>,
}

/// Facts gathered while a transaction runs, kept whether or not it finishes.
#[derive(Debug, Default)]
pub(crate) struct Progress {
    pub(crate) received: Vec<u8>,
    pub(crate) attempts: u32,
    pub(crate) peer_pid: Option<u32>,
}
