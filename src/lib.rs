//! Named Pipe Transaction Client
//!
//! This library connects to a local named pipe server, exchanges exactly one
//! message pair and reports what happened in a structured result, so that a host
//! process never has to manage pipe handles, retries or OS error codes itself.
//!
//! # Protocol
//!
//! - The client opens the pipe, retrying with a bounded backoff while the server
//!   reports that every pipe instance is busy. Any other open failure is final.
//! - The server speaks first: the client reads one message, then writes one reply.
//! - The channel is closed before the call returns, whatever happened.
//!
//! On Windows the pipe is a named pipe (`\\.\pipe\<name>`); on Unix it is a Unix
//! domain socket, by default under the temp directory.
//!
//! # Examples
//!
//! ## From Rust
//!
//! ```rust,no_run
//! use pipe_transactor::{PipeTransactor, TransactConfig};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let transactor = PipeTransactor::new(TransactConfig::default());
//!     let result = transactor.transact(Some("coop_pipe"), Some(b"game_saved")).await;
//!
//!     if result.success {
//!         println!("Server said: {}", result.received_lossy());
//!     } else {
//!         eprintln!("{} (code {})", result.error_message, result.error_code);
//!     }
//! }
//! ```
//!
//! ## From C
//!
//! ```c
//! PipeResult result;
//! pipe_client_init("{\"max_attempts\": 10}");
//! if (ConnectToPipe("\\\\.\\pipe\\coop_pipe", "game_saved", &result)) {
//!     printf("%s\n", result.received_message);
//! }
//! pipe_client_shutdown();
//! ```

pub mod client;
pub mod config;
pub mod connector;
pub mod error;
pub mod ffi;
pub mod result;
pub mod utils;


pub use client::PipeTransactor;
pub use config::{Backoff, TransactConfig};
pub use connector::{Connector, PipeConnector};
pub use error::{ConfigError, Result, TransactError, TransactErrorKind};
pub use result::{Exchange, TransactionResult};
