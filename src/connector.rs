use std::io;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};

#[cfg(windows)]
use tokio::net::windows::named_pipe::{ClientOptions, NamedPipeClient};

#[cfg(unix)]
use tokio::net::UnixStream;

use crate::utils::get_server_pid;

/// Opens the channel for one transaction.
///
/// A failed open must surface the raw OS error so the retry loop can tell a busy
/// pipe from a missing one.
#[async_trait]
pub trait Connector: Send + Sync {
    type Stream: AsyncRead + AsyncWrite + Unpin + Send;

    async fn connect(&self, target: &str) -> io::Result<Self::Stream>;

    /// PID of the process serving the other end, when the platform reports it.
    fn peer_pid(&self, _stream: &Self::Stream) -> Option<u32> {
        None
    }
}

/// Connector for the platform's local pipe: a named pipe on Windows, a Unix domain
/// socket elsewhere.
#[derive(Debug, Clone, Copy, Default)]
pub struct PipeConnector;

#[cfg(windows)]
#[async_trait]
impl Connector for PipeConnector {
    type Stream = NamedPipeClient;

    async fn connect(&self, target: &str) -> io::Result<NamedPipeClient> {
        ClientOptions::new().open(target)
    }

    fn peer_pid(&self, stream: &NamedPipeClient) -> Option<u32> {
        get_server_pid(stream).ok()
    }
}

#[cfg(unix)]
#[async_trait]
impl Connector for PipeConnector {
    type Stream = UnixStream;

    async fn connect(&self, target: &str) -> io::Result<UnixStream> {
        UnixStream::connect(target).await
    }

    fn peer_pid(&self, stream: &UnixStream) -> Option<u32> {
        get_server_pid(stream).ok()
    }
}
