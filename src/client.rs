use std::future::Future;
use std::io;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::{debug, trace};

use crate::config::TransactConfig;
use crate::connector::{Connector, PipeConnector};
use crate::error::{Result, TransactError};
use crate::result::{Exchange, Progress, TransactionResult};
use crate::utils::{format_pipe_name, is_busy};

/// Runs one connect, read, write, close cycle against a named pipe.
///
/// The server speaks first: the transactor reads one message, then writes one
/// reply. The channel is owned by a single call and closed before it returns.
pub struct PipeTransactor<C = PipeConnector> {
    config: TransactConfig,
    connector: C,
}

impl PipeTransactor<PipeConnector> {
    /// Create a transactor for the platform's named pipes
    pub fn new(config: TransactConfig) -> Self {
        Self::with_connector(config, PipeConnector)
    }
}

impl Default for PipeTransactor<PipeConnector> {
    fn default() -> Self {
        Self::new(TransactConfig::default())
    }
}

impl<C: Connector> PipeTransactor<C> {
    /// Create a transactor that opens channels through `connector`
    pub fn with_connector(config: TransactConfig, connector: C) -> Self {
        Self { config, connector }
    }

    pub fn config(&self) -> &TransactConfig {
        &self.config
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Run one transaction and describe the outcome.
    ///
    /// `None` or an empty value for `target` or `outgoing` selects the configured
    /// default. Never panics on I/O failure; every failure lands in the result.
    pub async fn transact(
        &self,
        target: Option<&str>,
        outgoing: Option<&[u8]>,
    ) -> TransactionResult {
        let mut progress = Progress::default();
        let outcome = self.run(target, outgoing, &mut progress).await;
        TransactionResult::from_parts(progress, outcome)
    }

    /// Run one transaction, returning the first failure as an error
    pub async fn try_transact(
        &self,
        target: Option<&str>,
        outgoing: Option<&[u8]>,
    ) -> Result<Exchange> {
        let mut progress = Progress::default();
        self.run(target, outgoing, &mut progress).await?;
        Ok(Exchange {
            received: progress.received,
            attempts: progress.attempts,
            peer_pid: progress.peer_pid,
        })
    }

    /// Run one transaction to completion on the calling thread.
    ///
    /// Drives [`transact`](Self::transact) on a current-thread runtime built for
    /// this call, so no thread is spawned. Called from inside a Tokio runtime it
    /// returns an `InvalidArgument` result without connecting; use
    /// [`transact`](Self::transact) there instead.
    pub fn transact_blocking(
        &self,
        target: Option<&str>,
        outgoing: Option<&[u8]>,
    ) -> TransactionResult {
        if tokio::runtime::Handle::try_current().is_ok() {
            return TransactionResult::from(TransactError::InvalidArgument(
                "transact_blocking called from inside a Tokio runtime; use transact".into(),
            ));
        }

        match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime.block_on(self.transact(target, outgoing)),
            Err(source) => TransactionResult::from(TransactError::Unavailable(source)),
        }
    }

    async fn run(
        &self,
        target: Option<&str>,
        outgoing: Option<&[u8]>,
        progress: &mut Progress,
    ) -> Result<()> {
        self.config.validate()?;
        let outgoing = self.resolve_message(outgoing)?;
        let target = self.resolve_target(target);

        let mut stream = self.connect(&target, progress).await?;
        let outcome = self.exchange(&mut stream, outgoing, progress).await;

        if outcome.is_ok() {
            if let Err(e) = stream.shutdown().await {
                trace!(pipe = %target, error = %e, "shutdown after exchange failed");
            }
        }
        drop(stream);
        trace!(pipe = %target, "channel closed");

        outcome
    }

    async fn connect(&self, target: &str, progress: &mut Progress) -> Result<C::Stream> {
        let max_attempts = self.config.max_attempts;
        let mut attempt = 0;

        loop {
            attempt += 1;
            progress.attempts = attempt;

            match self.connector.connect(target).await {
                Ok(stream) => {
                    progress.peer_pid = self.connector.peer_pid(&stream);
                    debug!(pipe = %target, attempt, peer_pid = ?progress.peer_pid, "connected");
                    return Ok(stream);
                }
                Err(source) if is_busy(&source) => {
                    if attempt >= max_attempts {
                        return Err(TransactError::ConnectExhausted {
                            target: target.to_string(),
                            attempts: attempt,
                            source,
                        });
                    }
                    let delay = self.config.backoff_delay(attempt);
                    debug!(pipe = %target, attempt, ?delay, "pipe busy, waiting to retry");
                    tokio::time::sleep(delay).await;
                }
                Err(source) => {
                    return Err(TransactError::ConnectRejected {
                        target: target.to_string(),
                        source,
                    });
                }
            }
        }
    }

    async fn exchange(
        &self,
        stream: &mut C::Stream,
        outgoing: &[u8],
        progress: &mut Progress,
    ) -> Result<()> {
        let mut buffer = vec![0u8; self.config.receive_capacity];
        let read = with_timeout(self.config.read_timeout(), stream.read(&mut buffer))
            .await
            .map_err(TransactError::ReadFailed)?;
        if read == 0 {
            return Err(TransactError::ReadFailed(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "server closed the pipe before sending any data",
            )));
        }
        buffer.truncate(read);
        debug!(bytes = read, "received message");
        progress.received = buffer;

        let write_timeout = self.config.write_timeout();
        let written = with_timeout(write_timeout, stream.write(outgoing))
            .await
            .map_err(TransactError::WriteFailed)?;
        if written != outgoing.len() {
            return Err(TransactError::WriteFailed(io::Error::new(
                io::ErrorKind::WriteZero,
                format!("short write: {} of {} bytes", written, outgoing.len()),
            )));
        }
        with_timeout(write_timeout, stream.flush())
            .await
            .map_err(TransactError::WriteFailed)?;
        debug!(bytes = written, "sent reply");

        Ok(())
    }

    fn resolve_target(&self, target: Option<&str>) -> String {
        match target {
            Some(name) if !name.is_empty() => format_pipe_name(name),
            _ => format_pipe_name(&self.config.pipe_name),
        }
    }

    fn resolve_message<'a>(&'a self, outgoing: Option<&'a [u8]>) -> Result<&'a [u8]> {
        let message = match outgoing {
            Some(message) if !message.is_empty() => message,
            _ => self.config.default_message.as_bytes(),
        };
        if message.len() > self.config.send_capacity {
            return Err(TransactError::InvalidArgument(format!(
                "outgoing message is {} bytes, send capacity is {}",
                message.len(),
                self.config.send_capacity
            )));
        }
        Ok(message)
    }
}

async fn with_timeout<T>(
    limit: Option<Duration>,
    op: impl Future<Output = io::Result<T>>,
) -> io::Result<T> {
    match limit {
        Some(limit) => tokio::time::timeout(limit, op).await.map_err(|_| {
            io::Error::new(
                io::ErrorKind::TimedOut,
                format!("no progress within {:?}", limit),
            )
        })?,
        None => op.await,
    }
}
