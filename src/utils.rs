use std::io;

#[cfg(windows)]
use std::os::windows::io::AsRawHandle;
#[cfg(windows)]
use windows::Win32::Foundation::HANDLE;
#[cfg(windows)]
use windows::Win32::System::Pipes::GetNamedPipeServerProcessId;

#[cfg(windows)]
mod codes {
    use windows::Win32::Foundation::{
        ERROR_ACCESS_DENIED, ERROR_BROKEN_PIPE, ERROR_FILE_NOT_FOUND, ERROR_GEN_FAILURE,
        ERROR_INVALID_PARAMETER, ERROR_PIPE_BUSY, ERROR_SEM_TIMEOUT,
    };

    pub const PIPE_BUSY: u32 = ERROR_PIPE_BUSY.0;
    pub const BROKEN_PIPE: u32 = ERROR_BROKEN_PIPE.0;
    pub const TIMED_OUT: u32 = ERROR_SEM_TIMEOUT.0;
    pub const INVALID_PARAMETER: u32 = ERROR_INVALID_PARAMETER.0;
    pub const ACCESS_DENIED: u32 = ERROR_ACCESS_DENIED.0;
    pub const NOT_FOUND: u32 = ERROR_FILE_NOT_FOUND.0;
    pub const GENERAL_FAILURE: u32 = ERROR_GEN_FAILURE.0;
}

// A listening socket with a full backlog refuses non-blocking connects with EAGAIN,
// which is the Unix counterpart of a pipe with no free instance.
#[cfg(unix)]
mod codes {
    pub const PIPE_BUSY: u32 = libc::EAGAIN as u32;
    pub const BROKEN_PIPE: u32 = libc::EPIPE as u32;
    pub const TIMED_OUT: u32 = libc::ETIMEDOUT as u32;
    pub const INVALID_PARAMETER: u32 = libc::EINVAL as u32;
    pub const ACCESS_DENIED: u32 = libc::EACCES as u32;
    pub const NOT_FOUND: u32 = libc::ENOENT as u32;
    pub const GENERAL_FAILURE: u32 = libc::EIO as u32;
}

pub use codes::{
    ACCESS_DENIED, BROKEN_PIPE, GENERAL_FAILURE, INVALID_PARAMETER, NOT_FOUND, PIPE_BUSY, TIMED_OUT,
};

/// Whether an open failure means the pipe exists but has no free instance.
pub fn is_busy(err: &io::Error) -> bool {
    err.raw_os_error() == Some(PIPE_BUSY as i32)
}

/// Native error code for an I/O error. Never returns 0.
///
/// Errors raised by the OS keep their raw code. Errors synthesized in Rust (end of
/// stream, short writes, elapsed timeouts) map to the closest platform code.
pub fn native_code(err: &io::Error) -> u32 {
    match err.raw_os_error() {
        Some(code) if code != 0 => code as u32,
        _ => match err.kind() {
            io::ErrorKind::UnexpectedEof
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::WriteZero
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted => BROKEN_PIPE,
            io::ErrorKind::TimedOut => TIMED_OUT,
            io::ErrorKind::InvalidInput => INVALID_PARAMETER,
            _ => GENERAL_FAILURE,
        },
    }
}

/// Get the PID of the server process from a client handle
#[cfg(windows)]
pub fn get_server_pid<H: AsRawHandle>(handle: &H) -> io::Result<u32> {
    let mut server_pid: u32 = 0;
    unsafe {
        if GetNamedPipeServerProcessId(
            HANDLE(handle.as_raw_handle() as *mut std::ffi::c_void),
            &mut server_pid,
        )
        .is_err()
        {
            return Err(io::Error::last_os_error());
        }
    }
    Ok(server_pid)
}

/// Get the PID of the server process from a connected socket
#[cfg(unix)]
pub fn get_server_pid(stream: &tokio::net::UnixStream) -> io::Result<u32> {
    let cred = stream.peer_cred()?;
    cred.pid().map(|pid| pid as u32).ok_or_else(|| {
        io::Error::new(io::ErrorKind::Unsupported, "Peer PID not reported by the OS")
    })
}

/// Format pipe name to Windows named pipe format
#[cfg(windows)]
pub fn format_pipe_name(name: &str) -> String {
    if name.starts_with("\\\\") {
        name.to_string()
    } else {
        format!("\\\\.\\pipe\\{}", name)
    }
}

/// Format pipe name to a socket path in the temp directory
#[cfg(unix)]
pub fn format_pipe_name(name: &str) -> String {
    if name.contains('/') {
        name.to_string()
    } else {
        std::env::temp_dir()
            .join(format!("{}.sock", name))
            .to_string_lossy()
            .into_owned()
    }
}
