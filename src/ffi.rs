//! C entry points.
//!
//! The layout of [`PipeResult`] and the exported function names are part of the
//! ABI described by `include/pipe_client.h`.

use std::ffi::{c_char, c_int, CStr};
use std::sync::{PoisonError, RwLock};

use tracing::{debug, warn};

use crate::client::PipeTransactor;
use crate::config::TransactConfig;
use crate::error::ConfigError;
use crate::result::TransactionResult;

pub const RECEIVED_MESSAGE_LEN: usize = 1024;
pub const ERROR_MESSAGE_LEN: usize = 256;

/// Library-wide configuration installed by `pipe_client_init`. `None` means defaults.
static SETTINGS: RwLock<Option<TransactConfig>> = RwLock::new(None);

#[repr(C)]
pub struct PipeResult {
    pub success: c_int,
    pub received_message: [c_char; RECEIVED_MESSAGE_LEN],
    pub error_message: [c_char; ERROR_MESSAGE_LEN],
    pub error_code: u32,
}

impl PipeResult {
    pub fn zeroed() -> Self {
        Self {
            success: 0,
            received_message: [0; RECEIVED_MESSAGE_LEN],
            error_message: [0; ERROR_MESSAGE_LEN],
            error_code: 0,
        }
    }

    fn fill(&mut self, outcome: &TransactionResult) {
        self.success = c_int::from(outcome.success);
        self.error_code = outcome.error_code;
        copy_bounded(&mut self.received_message, &outcome.received);
        let text = truncate_at_char_boundary(&outcome.error_message, ERROR_MESSAGE_LEN - 1);
        copy_bounded(&mut self.error_message, text.as_bytes());
    }

    /// Received bytes up to the first NUL.
    ///
    /// The struct carries no length, so a payload with embedded NUL bytes reads
    /// as ending at its first one, here and in C alike.
    pub fn received_bytes(&self) -> &[u8] {
        until_nul(&self.received_message)
    }

    pub fn error_text(&self) -> String {
        String::from_utf8_lossy(until_nul(&self.error_message)).into_owned()
    }
}

impl Default for PipeResult {
    fn default() -> Self {
        Self::zeroed()
    }
}

/// Configuration for the next `ConnectToPipe` call.
///
/// The read is capped one byte short of the C buffer so the terminator always fits.
pub fn installed_config() -> TransactConfig {
    let mut config = SETTINGS
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
        .unwrap_or_default();
    config.receive_capacity = config.receive_capacity.min(RECEIVED_MESSAGE_LEN - 1);
    config
}

/// Connect to a named pipe, read one message, send one message.
///
/// Returns 1 when the whole exchange succeeded, 0 otherwise. `pipe_name` and
/// `message` may be null to select the defaults.
///
/// # Safety
///
/// Non-null `pipe_name` and `message` must point to NUL-terminated strings. A
/// non-null `result` must point to writable memory for one `PipeResult`.
#[no_mangle]
#[allow(non_snake_case)]
pub unsafe extern "C" fn ConnectToPipe(
    pipe_name: *const c_char,
    message: *const c_char,
    result: *mut PipeResult,
) -> c_int {
    if result.is_null() {
        debug!("ConnectToPipe called without a result destination");
        return 0;
    }

    let out = unsafe {
        result.write(PipeResult::zeroed());
        &mut *result
    };
    let target = unsafe { c_str(pipe_name) }.map(CStr::to_string_lossy);
    let message = unsafe { c_str(message) }.map(CStr::to_bytes);

    let transactor = PipeTransactor::new(installed_config());
    let outcome = transactor.transact_blocking(target.as_deref(), message);
    out.fill(&outcome);
    out.success
}

/// Install the configuration used by later `ConnectToPipe` calls.
///
/// `config_json` is a JSON object whose fields override the defaults; null
/// installs the defaults. Returns 1 on success. On failure returns 0 and keeps
/// the previous configuration.
///
/// # Safety
///
/// A non-null `config_json` must point to a NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn pipe_client_init(config_json: *const c_char) -> c_int {
    let config = match unsafe { c_str(config_json) } {
        None => Ok(TransactConfig::default()),
        Some(raw) => raw
            .to_str()
            .map_err(|e| ConfigError::Invalid(e.to_string()))
            .and_then(TransactConfig::from_json),
    };

    match config {
        Ok(config) => {
            debug!(?config, "pipe client configured");
            *SETTINGS.write().unwrap_or_else(PoisonError::into_inner) = Some(config);
            1
        }
        Err(e) => {
            warn!(error = %e, "rejected pipe client configuration");
            0
        }
    }
}

/// Drop the installed configuration; later calls use the defaults.
#[no_mangle]
pub extern "C" fn pipe_client_shutdown() {
    *SETTINGS.write().unwrap_or_else(PoisonError::into_inner) = None;
}

unsafe fn c_str<'a>(ptr: *const c_char) -> Option<&'a CStr> {
    if ptr.is_null() {
        None
    } else {
        Some(unsafe { CStr::from_ptr(ptr) })
    }
}

/// Copy as much of `src` as fits while leaving room for the terminating NUL.
fn copy_bounded(dst: &mut [c_char], src: &[u8]) -> usize {
    let Some(room) = dst.len().checked_sub(1) else {
        return 0;
    };
    let len = src.len().min(room);
    for (slot, byte) in dst.iter_mut().zip(&src[..len]) {
        *slot = *byte as c_char;
    }
    dst[len] = 0;
    len
}

fn truncate_at_char_boundary(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

fn until_nul(buf: &[c_char]) -> &[u8] {
    let len = buf.iter().position(|&c| c == 0).unwrap_or(buf.len());
    // c_char and u8 have the same size and alignment.
    unsafe { std::slice::from_raw_parts(buf.as_ptr().cast::<u8>(), len) }
}
