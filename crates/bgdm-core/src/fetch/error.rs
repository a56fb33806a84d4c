//! Fetch attempt error type for retry decisions.

use std::fmt;

/// Error from one fetch attempt. Everything except a placeholder hit is
/// transient and goes back through the retry policy; a placeholder body is
/// the remote's deterministic "missing asset" marker and is terminal on
/// first sight.
#[derive(Debug)]
pub enum FetchError {
    /// curl reported a transport error (timeout, connection, TLS, ...).
    Curl(curl::Error),
    /// HTTP response had a non-200 status.
    Http(u32),
    /// Body shorter than the configured minimum plausible length
    /// (truncated transfer or malformed response).
    Undersized(usize),
    /// Body matched the configured placeholder filter.
    Placeholder { size: usize },
    /// Destination directory creation or file write failed.
    Storage(std::io::Error),
}

impl FetchError {
    /// Terminal errors are recorded as failures without further attempts.
    pub fn is_terminal(&self) -> bool {
        matches!(self, FetchError::Placeholder { .. })
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Curl(e) => write!(f, "{}", e),
            FetchError::Http(code) => write!(f, "HTTP {}", code),
            FetchError::Undersized(len) => write!(f, "body too small ({} bytes)", len),
            FetchError::Placeholder { size } => {
                write!(f, "placeholder response ({} bytes)", size)
            }
            FetchError::Storage(e) => write!(f, "storage: {}", e),
        }
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FetchError::Curl(e) => Some(e),
            FetchError::Storage(e) => Some(e),
            FetchError::Http(_) | FetchError::Undersized(_) | FetchError::Placeholder { .. } => {
                None
            }
        }
    }
}
